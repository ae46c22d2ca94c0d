//! A C99 parser front-end.
//!
//! Takes the ordered token stream of one preprocessed translation unit and
//! produces an owned syntax tree plus a list of diagnostics. Parsing is
//! predictive recursive descent with a typedef-aware scope stack; errors
//! resynchronise at statement/declaration boundaries instead of aborting.
//!
//! ```
//! use selasih::{DiagnosticEngine, Lexer, Parser, SourceManager};
//!
//! let mut sources = SourceManager::new();
//! let id = sources.add_buffer("demo.c", "int main(void) { return 0; }");
//! let tokens = Lexer::new(sources.get_buffer(id), id).tokenize_all();
//!
//! let mut diag = DiagnosticEngine::new();
//! let unit = Parser::new(&tokens, &mut diag).parse_translation_unit();
//! assert!(!diag.has_errors());
//! assert_eq!(unit.decls.len(), 1);
//! ```

pub mod ast;
pub mod diagnostic;
pub mod dumper;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod source_manager;
pub mod token;

pub use diagnostic::{Diagnostic, DiagnosticEngine, ParseError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use scope::Scope;
pub use source_manager::{SourceId, SourceLoc, SourceManager, SourceSpan};
pub use token::{Token, TokenKind};
