//! Per-file-version symbol tables.
//!
//! A [`SymbolTable`] is the semantic snapshot of one version of one file for
//! one task: what it defines, what names it reads, what it imports, which
//! functions it calls, and which return types its functions declare. Tables
//! are built by [`extract`] and are read-only afterwards; the mutators are
//! crate-private and only the extractor calls them.
//!
//! All maps are keyed by bare symbol name. Scope is recorded on definitions
//! as provenance only; lookups never resolve by scope, so a usage inside a
//! nested function is indistinguishable from a module-level one.

pub mod extract;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub use extract::{SourceLanguage, SymbolExtractor, build_symbol_table};

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// The lexical scope a definition occurred in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Top level of the file.
    Module,
    /// Directly inside `class <name>`.
    Class(String),
    /// Directly inside `def <name>` (sync or async).
    Function(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Class(name) => write!(f, "class:{name}"),
            Self::Function(name) => write!(f, "function:{name}"),
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// What kind of binding a definition introduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Import,
    Function,
    AsyncFunction,
    Class,
    Variable,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Function => write!(f, "function"),
            Self::AsyncFunction => write!(f, "async_function"),
            Self::Class => write!(f, "class"),
            Self::Variable => write!(f, "variable"),
        }
    }
}

/// A name binding: kind, 1-indexed line, and enclosing scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub line: u32,
    pub scope: Scope,
}

// ---------------------------------------------------------------------------
// SymbolTable
// ---------------------------------------------------------------------------

/// Semantic snapshot of one file version.
///
/// When a name is defined more than once, the last definition in source order
/// wins, as does the last signature for a re-defined function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    definitions: BTreeMap<String, Definition>,
    usages: BTreeMap<String, Vec<u32>>,
    imports: BTreeMap<String, String>,
    function_calls: BTreeMap<String, Vec<u32>>,
    function_signatures: BTreeMap<String, Option<String>>,
}

impl SymbolTable {
    pub(crate) fn add_definition(&mut self, name: &str, kind: DefinitionKind, line: u32, scope: Scope) {
        self.definitions
            .insert(name.to_owned(), Definition { kind, line, scope });
    }

    pub(crate) fn add_usage(&mut self, name: &str, line: u32) {
        self.usages.entry(name.to_owned()).or_default().push(line);
    }

    pub(crate) fn add_import(&mut self, name: &str, module: String) {
        self.imports.insert(name.to_owned(), module);
    }

    pub(crate) fn add_function_call(&mut self, name: &str, line: u32) {
        self.function_calls
            .entry(name.to_owned())
            .or_default()
            .push(line);
    }

    pub(crate) fn add_function_signature(&mut self, name: &str, return_type: Option<String>) {
        self.function_signatures
            .insert(name.to_owned(), return_type);
    }

    /// The definition bound to `name`, if any.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// All definitions, ordered by name.
    #[must_use]
    pub const fn definitions(&self) -> &BTreeMap<String, Definition> {
        &self.definitions
    }

    /// Lines where `name` is read, in source order.
    #[must_use]
    pub fn usages_of(&self, name: &str) -> Option<&[u32]> {
        self.usages.get(name).map(Vec::as_slice)
    }

    /// All read usages, ordered by name.
    #[must_use]
    pub const fn usages(&self) -> &BTreeMap<String, Vec<u32>> {
        &self.usages
    }

    /// The module `name` was imported from (`module.symbol` for from-imports).
    #[must_use]
    pub fn import_source(&self, name: &str) -> Option<&str> {
        self.imports.get(name).map(String::as_str)
    }

    /// Whether this version imports `name` itself.
    #[must_use]
    pub fn imports_symbol(&self, name: &str) -> bool {
        self.imports.contains_key(name)
    }

    /// All imports (bound name → source), ordered by name.
    #[must_use]
    pub const fn imports(&self) -> &BTreeMap<String, String> {
        &self.imports
    }

    /// Lines of calls to `name`, in source order.
    ///
    /// Method calls are recorded under the method name, so `obj.run()` and a
    /// free `run()` share an entry.
    #[must_use]
    pub fn calls_to(&self, name: &str) -> Option<&[u32]> {
        self.function_calls.get(name).map(Vec::as_slice)
    }

    /// All call sites, ordered by callee name.
    #[must_use]
    pub const fn function_calls(&self) -> &BTreeMap<String, Vec<u32>> {
        &self.function_calls
    }

    /// The declared return annotation of `function`.
    ///
    /// `None` if the function is unknown; `Some(None)` if it is defined
    /// without a return annotation.
    #[must_use]
    pub fn return_type(&self, function: &str) -> Option<Option<&str>> {
        self.function_signatures
            .get(function)
            .map(|ty| ty.as_deref())
    }

    /// All function signatures, ordered by function name.
    #[must_use]
    pub const fn function_signatures(&self) -> &BTreeMap<String, Option<String>> {
        &self.function_signatures
    }

    /// Whether the table recorded nothing at all (e.g. an empty file).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
            && self.usages.is_empty()
            && self.imports.is_empty()
            && self.function_calls.is_empty()
            && self.function_signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display() {
        assert_eq!(Scope::Module.to_string(), "module");
        assert_eq!(Scope::Class("User".into()).to_string(), "class:User");
        assert_eq!(Scope::Function("run".into()).to_string(), "function:run");
    }

    #[test]
    fn later_definition_wins() {
        let mut table = SymbolTable::default();
        table.add_definition("x", DefinitionKind::Variable, 1, Scope::Module);
        table.add_definition("x", DefinitionKind::Function, 4, Scope::Module);
        let def = table.definition("x").unwrap();
        assert_eq!(def.kind, DefinitionKind::Function);
        assert_eq!(def.line, 4);
    }

    #[test]
    fn usages_and_calls_accumulate_in_order() {
        let mut table = SymbolTable::default();
        table.add_usage("x", 3);
        table.add_usage("x", 1);
        table.add_function_call("run", 5);
        table.add_function_call("run", 9);
        assert_eq!(table.usages_of("x"), Some(&[3, 1][..]));
        assert_eq!(table.calls_to("run"), Some(&[5, 9][..]));
        assert_eq!(table.calls_to("walk"), None);
    }

    #[test]
    fn return_type_distinguishes_unknown_from_unannotated() {
        let mut table = SymbolTable::default();
        table.add_function_signature("plain", None);
        table.add_function_signature("typed", Some("int".to_owned()));
        assert_eq!(table.return_type("plain"), Some(None));
        assert_eq!(table.return_type("typed"), Some(Some("int")));
        assert_eq!(table.return_type("missing"), None);
    }

    #[test]
    fn empty_table() {
        let mut table = SymbolTable::default();
        assert!(table.is_empty());
        table.add_import("os", "os".to_owned());
        assert!(!table.is_empty());
        assert!(table.imports_symbol("os"));
        assert_eq!(table.import_source("os"), Some("os"));
    }

    #[test]
    fn serializes_scope_as_string() {
        let mut table = SymbolTable::default();
        table.add_definition("helper", DefinitionKind::Function, 2, Scope::Class("A".into()));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["definitions"]["helper"]["scope"], "class:A");
        assert_eq!(json["definitions"]["helper"]["kind"], "function");
    }
}
