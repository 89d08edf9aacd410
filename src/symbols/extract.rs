//! Symbol extraction using tree-sitter.
//!
//! Parses one file version with the Python grammar and walks the syntax tree
//! once, filling a [`SymbolTable`]. Each node is classified into a closed
//! [`NodeKind`] before dispatch, so handling is a single exhaustive `match`.
//!
//! # What counts as what
//!
//! - Imports bind the alias if present, otherwise the first segment of the
//!   dotted name (`import os.path` binds `os`). From-imports record their
//!   source as `module.symbol`.
//! - Function, class, and plain-name assignment targets are definitions.
//!   Other binding positions (parameters, loop targets, `as` aliases,
//!   walrus names, tuple-unpacking targets, `case` keyword-pattern names)
//!   are neither definitions nor usages.
//! - Every other identifier in a load position is a usage, including names
//!   in annotations, defaults, and decorators.
//! - Calls are recorded by callee name: `f()` as `f`, `obj.m()` as `m`.
//!
//! Any syntax error makes the whole version unanalysable. So do Python 2
//! `print`/`exec` statements, which the grammar still accepts, and nesting
//! deeper than the walker will recurse.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::config::DetectConfig;
use crate::error::ExtractError;

use super::{DefinitionKind, Scope, SymbolTable};

// ---------------------------------------------------------------------------
// Language detection
// ---------------------------------------------------------------------------

/// Grammars the extractor can parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceLanguage {
    Python,
}

impl SourceLanguage {
    fn tree_sitter_language(self) -> Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SymbolExtractor
// ---------------------------------------------------------------------------

/// Builds symbol tables for files the configuration accepts.
#[derive(Clone, Debug, Default)]
pub struct SymbolExtractor {
    config: DetectConfig,
}

impl SymbolExtractor {
    /// Create an extractor honouring `config.extensions`.
    #[must_use]
    pub fn new(config: &DetectConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// The grammar used for `path`, or `None` if its extension is not
    /// configured.
    #[must_use]
    pub fn language_for(&self, path: &Path) -> Option<SourceLanguage> {
        self.config
            .supports_path(path)
            .then_some(SourceLanguage::Python)
    }

    /// Build the symbol table for one file version.
    ///
    /// # Errors
    /// Returns [`ExtractError`] if the file type is unsupported, the grammar
    /// cannot be loaded, or the source contains a syntax error.
    pub fn try_extract(&self, path: &Path, content: &str) -> Result<SymbolTable, ExtractError> {
        let lang = self
            .language_for(path)
            .ok_or_else(|| ExtractError::UnsupportedLanguage {
                path: path.display().to_string(),
            })?;

        let mut parser = Parser::new();
        parser
            .set_language(&lang.tree_sitter_language())
            .map_err(|e| ExtractError::ParserSetup {
                message: format!("{e}"),
            })?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ExtractError::ParseFailed {
                path: path.display().to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ExtractError::Syntax {
                path: path.display().to_string(),
                line: first_error_line(root),
            });
        }
        check_tree(root, path)?;

        let mut walker = Walker::new(content.as_bytes());
        walker.visit(root);
        Ok(walker.table)
    }

    /// Like [`try_extract`](Self::try_extract), but logs the failure and
    /// returns `None`.
    #[must_use]
    pub fn extract(&self, path: &Path, content: &str) -> Option<SymbolTable> {
        match self.try_extract(path, content) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no symbol table");
                None
            }
        }
    }
}

/// Build a symbol table with the default configuration.
///
/// Returns `None` for unsupported file types and unparseable source.
#[must_use]
pub fn build_symbol_table(path: impl AsRef<Path>, content: &str) -> Option<SymbolTable> {
    SymbolExtractor::default().extract(path.as_ref(), content)
}

fn first_error_line(root: Node<'_>) -> u32 {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return line_of(node);
        }
        if !node.has_error() {
            continue;
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    line_of(root)
}

/// Deepest node nesting the walker descends into.
const MAX_DEPTH: usize = 400;

/// Reject trees the grammar accepts but Python 3 does not: nesting past
/// [`MAX_DEPTH`], and Python 2 `print`/`exec` statements.
///
/// Iterative, so it is safe on trees the recursive walker could not handle.
fn check_tree(root: Node<'_>, path: &Path) -> Result<(), ExtractError> {
    let mut cursor = root.walk();
    let mut depth = 0usize;
    loop {
        let node = cursor.node();
        if depth > MAX_DEPTH {
            return Err(ExtractError::TooDeep {
                path: path.display().to_string(),
                line: line_of(node),
            });
        }
        if matches!(node.kind(), "print_statement" | "exec_statement") {
            return Err(ExtractError::Syntax {
                path: path.display().to_string(),
                line: line_of(node),
            });
        }
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return Ok(());
            }
            depth = depth.saturating_sub(1);
        }
    }
}

fn line_of(node: Node<'_>) -> u32 {
    narrow_u32(node.start_position().row.saturating_add(1))
}

fn narrow_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Collapse whitespace in an annotation the way it would be written on one
/// line: no padding inside brackets or before commas.
fn normalize_annotation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space && !out.ends_with(['[', '(']) && !matches!(ch, ']' | ')' | ',') {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Node classification
// ---------------------------------------------------------------------------

/// The node kinds the walker treats specially.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    Import,
    ImportFrom,
    FutureImport,
    FunctionDef,
    ClassDef,
    Assignment,
    AugmentedAssignment,
    Call,
    Identifier,
    Attribute,
    KeywordArgument,
    KeywordPattern,
    Parameters,
    ForLoop,
    AsPattern,
    ExceptClause,
    NamedExpression,
    Declaration,
    Delete,
    Other,
}

impl NodeKind {
    fn classify(kind: &str) -> Self {
        match kind {
            "import_statement" => Self::Import,
            "import_from_statement" => Self::ImportFrom,
            "future_import_statement" => Self::FutureImport,
            "function_definition" => Self::FunctionDef,
            "class_definition" => Self::ClassDef,
            "assignment" => Self::Assignment,
            "augmented_assignment" => Self::AugmentedAssignment,
            "call" => Self::Call,
            "identifier" => Self::Identifier,
            "attribute" => Self::Attribute,
            "keyword_argument" => Self::KeywordArgument,
            "keyword_pattern" => Self::KeywordPattern,
            "parameters" | "lambda_parameters" => Self::Parameters,
            "for_statement" | "for_in_clause" => Self::ForLoop,
            "as_pattern" => Self::AsPattern,
            "except_clause" => Self::ExceptClause,
            "named_expression" => Self::NamedExpression,
            "global_statement" | "nonlocal_statement" => Self::Declaration,
            "delete_statement" => Self::Delete,
            _ => Self::Other,
        }
    }
}

/// Containers whose elements are binding targets when they appear on the
/// left of an assignment, loop, or `as`.
fn is_target_container(kind: &str) -> bool {
    matches!(
        kind,
        "pattern_list"
            | "tuple_pattern"
            | "list_pattern"
            | "tuple"
            | "list"
            | "parenthesized_expression"
            | "list_splat_pattern"
            | "list_splat"
            | "expression_list"
            | "as_pattern_target"
    )
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

struct Walker<'src> {
    source: &'src [u8],
    scopes: Vec<Scope>,
    table: SymbolTable,
}

impl<'src> Walker<'src> {
    fn new(source: &'src [u8]) -> Self {
        Self {
            source,
            scopes: vec![Scope::Module],
            table: SymbolTable::default(),
        }
    }

    fn scope(&self) -> Scope {
        self.scopes.last().cloned().unwrap_or(Scope::Module)
    }

    fn text(&self, node: Node<'_>) -> Option<&'src str> {
        node.utf8_text(self.source).ok()
    }

    fn visit(&mut self, node: Node<'_>) {
        match NodeKind::classify(node.kind()) {
            NodeKind::Import => self.visit_import(node),
            NodeKind::ImportFrom => {
                let module = node
                    .child_by_field_name("module_name")
                    .and_then(|m| self.text(m))
                    .unwrap_or("");
                self.visit_from_import(node, module);
            }
            NodeKind::FutureImport => self.visit_from_import(node, "__future__"),
            NodeKind::FunctionDef => self.visit_function(node),
            NodeKind::ClassDef => self.visit_class(node),
            NodeKind::Assignment => self.visit_assignment(node),
            NodeKind::AugmentedAssignment => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.visit_target(left);
                }
                self.visit_field(node, "right");
            }
            NodeKind::Call => {
                self.record_call(node);
                self.visit_children(node);
            }
            NodeKind::Identifier => {
                if let Some(name) = self.text(node) {
                    self.table.add_usage(name, line_of(node));
                }
            }
            NodeKind::Attribute => self.visit_field(node, "object"),
            NodeKind::KeywordArgument => self.visit_field(node, "value"),
            NodeKind::KeywordPattern => {
                let name = node.child(0).filter(|n| n.kind() == "identifier");
                self.visit_children_except(node, name);
            }
            NodeKind::Parameters => {
                for i in 0..node.child_count() {
                    if let Some(param) = node.child(i) {
                        self.visit_field(param, "type");
                        self.visit_field(param, "value");
                    }
                }
            }
            NodeKind::ForLoop => {
                let left = node.child_by_field_name("left");
                if let Some(left) = left {
                    self.visit_target(left);
                }
                self.visit_children_except(node, left);
            }
            NodeKind::AsPattern => {
                let alias = node.child_by_field_name("alias");
                if let Some(alias) = alias {
                    self.visit_target(alias);
                }
                self.visit_children_except(node, alias);
            }
            NodeKind::ExceptClause => self.visit_except(node),
            NodeKind::NamedExpression => self.visit_field(node, "value"),
            NodeKind::Declaration => {}
            NodeKind::Delete => {
                for i in 0..node.child_count() {
                    if let Some(child) = node.child(i) {
                        self.visit_target(child);
                    }
                }
            }
            NodeKind::Other => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) {
        self.visit_children_except(node, None);
    }

    fn visit_children_except(&mut self, node: Node<'_>, skip: Option<Node<'_>>) {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if skip.is_some_and(|s| s.id() == child.id()) {
                continue;
            }
            self.visit(child);
        }
    }

    fn visit_field(&mut self, node: Node<'_>, field: &str) {
        if let Some(child) = node.child_by_field_name(field) {
            self.visit(child);
        }
    }

    /// Walk a binding target: bare names bind, anything else (attribute
    /// bases, subscripts) is read.
    fn visit_target(&mut self, node: Node<'_>) {
        let kind = node.kind();
        if kind == "identifier" {
            return;
        }
        if is_target_container(kind) {
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    self.visit_target(child);
                }
            }
            return;
        }
        if node.is_named() {
            self.visit(node);
        }
    }

    // -- imports ------------------------------------------------------------

    fn visit_import(&mut self, node: Node<'_>) {
        let line = line_of(node);
        let scope = self.scope();
        let mut cursor = node.walk();
        let names: Vec<_> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            let (module, bound) = match name_node.kind() {
                "aliased_import" => {
                    let module = name_node
                        .child_by_field_name("name")
                        .and_then(|n| self.text(n));
                    let alias = name_node
                        .child_by_field_name("alias")
                        .and_then(|n| self.text(n));
                    (module, alias)
                }
                _ => {
                    let module = self.text(name_node);
                    (module, module.and_then(|m| m.split('.').next()))
                }
            };
            let (Some(module), Some(bound)) = (module, bound) else {
                continue;
            };
            self.table.add_import(bound, module.to_owned());
            self.table
                .add_definition(bound, DefinitionKind::Import, line, scope.clone());
        }
    }

    fn visit_from_import(&mut self, node: Node<'_>, module: &str) {
        let line = line_of(node);
        let scope = self.scope();
        let mut cursor = node.walk();
        let names: Vec<_> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            let (symbol, bound) = match name_node.kind() {
                "aliased_import" => (
                    name_node
                        .child_by_field_name("name")
                        .and_then(|n| self.text(n)),
                    name_node
                        .child_by_field_name("alias")
                        .and_then(|n| self.text(n)),
                ),
                _ => {
                    let symbol = self.text(name_node);
                    (symbol, symbol)
                }
            };
            let (Some(symbol), Some(bound)) = (symbol, bound) else {
                continue;
            };
            let source = if module.is_empty() || module.ends_with('.') {
                format!("{module}{symbol}")
            } else {
                format!("{module}.{symbol}")
            };
            self.table.add_import(bound, source);
            self.table
                .add_definition(bound, DefinitionKind::Import, line, scope.clone());
        }
    }

    // -- definitions --------------------------------------------------------

    fn visit_function(&mut self, node: Node<'_>) {
        let name_node = node.child_by_field_name("name");
        let Some(name) = name_node.and_then(|n| self.text(n)) else {
            self.visit_children(node);
            return;
        };

        let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
        let kind = if is_async {
            DefinitionKind::AsyncFunction
        } else {
            DefinitionKind::Function
        };
        let return_type = node
            .child_by_field_name("return_type")
            .and_then(|t| self.text(t))
            .map(normalize_annotation);

        let scope = self.scope();
        self.table.add_definition(name, kind, line_of(node), scope);
        self.table.add_function_signature(name, return_type);

        self.scopes.push(Scope::Function(name.to_owned()));
        self.visit_children_except(node, name_node);
        self.scopes.pop();
    }

    fn visit_class(&mut self, node: Node<'_>) {
        let name_node = node.child_by_field_name("name");
        let Some(name) = name_node.and_then(|n| self.text(n)) else {
            self.visit_children(node);
            return;
        };

        let scope = self.scope();
        self.table
            .add_definition(name, DefinitionKind::Class, line_of(node), scope);

        self.scopes.push(Scope::Class(name.to_owned()));
        self.visit_children_except(node, name_node);
        self.scopes.pop();
    }

    fn visit_assignment(&mut self, node: Node<'_>) {
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind() == "identifier" {
                if let Some(name) = self.text(left) {
                    let scope = self.scope();
                    self.table
                        .add_definition(name, DefinitionKind::Variable, line_of(node), scope);
                }
            } else {
                self.visit_target(left);
            }
        }
        self.visit_field(node, "type");
        self.visit_field(node, "right");
    }

    // -- expressions --------------------------------------------------------

    fn record_call(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = match function.kind() {
            "identifier" => self.text(function),
            "attribute" => function
                .child_by_field_name("attribute")
                .and_then(|a| self.text(a)),
            _ => None,
        };
        if let Some(callee) = callee {
            self.table.add_function_call(callee, line_of(node));
        }
    }

    fn visit_except(&mut self, node: Node<'_>) {
        let mut after_as = false;
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if child.kind() == "as" {
                after_as = true;
                continue;
            }
            if after_as {
                self.visit_target(child);
                after_as = false;
            } else {
                self.visit(child);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
