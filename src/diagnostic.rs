use crate::source_manager::{SourceManager, SourceSpan};
use crate::token::TokenKind;

/// Parse errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected}, got {found:?}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: SourceSpan,
    },

    #[error("unexpected end of file")]
    UnexpectedEof { span: SourceSpan },

    #[error("{message}")]
    SyntaxError { message: String, span: SourceSpan },
}

impl ParseError {
    pub fn span(&self) -> SourceSpan {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span } => *span,
            ParseError::SyntaxError { span, .. } => *span,
        }
    }
}

/// A collected syntax error. Severity is single-level; a nonzero count means
/// the returned tree may be partial and semantic analysis should not run.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    /// 1-based line and column of the diagnostic's start.
    pub fn line_col(&self, source_manager: &SourceManager) -> (u32, u32) {
        source_manager.line_col(self.span.start())
    }
}

/// Collects diagnostics during a parse. Rendering is the caller's concern;
/// this engine only stores `{span, message}` records.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine {
            diagnostics: Vec::new(),
        }
    }

    pub fn report_parse_error(&mut self, error: ParseError) {
        self.diagnostics.push(Diagnostic {
            message: error.to_string(),
            span: error.span(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
