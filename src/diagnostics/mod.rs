use crate::span::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("State error: {msg}")]
    State { msg: String, span: Span },
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn state(msg: impl Into<String>, span: Span) -> Self {
        Self::State { msg: msg.into(), span }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Syntax { span, .. } | Self::State { span, .. } => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { msg, .. } | Self::State { msg, .. } => msg,
        }
    }
}

/// A soft diagnostic: parsing continued, but the script author should know.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub msg: String,
    pub span: Span,
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, _filename: &str, err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    let kind_str = match err {
        CompileError::Syntax { .. } => "syntax",
        CompileError::State { .. } => "state",
    };
    let span = err.span();
    Report::build(ReportKind::Error, (), span.start)
        .with_message(format!("{kind_str} error"))
        .with_label(
            Label::new(span.start..span.end)
                .with_message(err.message()),
        )
        .finish()
        .eprint(Source::from(source))
        .unwrap();
}

/// Render a soft diagnostic at Warning severity.
pub fn render_warning(source: &str, _filename: &str, warning: &Warning) {
    use ariadne::{Label, Report, ReportKind, Source};

    Report::build(ReportKind::Warning, (), warning.span.start)
        .with_message("warning")
        .with_label(
            Label::new(warning.span.start..warning.span.end)
                .with_message(&warning.msg),
        )
        .finish()
        .eprint(Source::from(source))
        .unwrap();
}
