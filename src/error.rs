//! Symbol-extraction error types.
//!
//! [`ExtractError`] explains why a file version produced no symbol table.
//! It never crosses the public detection API: callers of
//! [`build_symbol_table`](crate::symbols::build_symbol_table) see `None`, and
//! the detectors skip that task/version. The variants exist so the skip can be
//! logged with a useful message.

use thiserror::Error;

/// Why a file version could not be turned into a symbol table.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file extension does not belong to a supported grammar.
    #[error("unsupported file type: {path}")]
    UnsupportedLanguage {
        /// The file path that was checked.
        path: String,
    },

    /// The tree-sitter parser rejected the grammar (ABI mismatch).
    #[error("parser setup failed: {message}")]
    ParserSetup {
        /// Message from tree-sitter.
        message: String,
    },

    /// tree-sitter returned no tree at all.
    #[error("tree-sitter failed to parse {path}")]
    ParseFailed {
        /// The file path being parsed.
        path: String,
    },

    /// The source contains a syntax error.
    #[error("syntax error in {path} at line {line}")]
    Syntax {
        /// The file path being parsed.
        path: String,
        /// 1-indexed line of the first error node.
        line: u32,
    },

    /// The syntax tree nests deeper than the walker will descend.
    #[error("nesting too deep in {path} at line {line}")]
    TooDeep {
        /// The file path being parsed.
        path: String,
        /// 1-indexed line of the first node past the limit.
        line: u32,
    },
}
