use crate::span::Pos;
use thiserror::Error;

/// A fatal front-end error. The first one raised aborts the parse; no
/// recovery or resynchronization is attempted.
///
/// `length` is the span to underline when rendering; zero means a single
/// caret at `pos`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("SyntaxError: {msg}")]
    Syntax { msg: String, pos: Pos, length: usize },

    #[error("SemanticError: {msg}")]
    Semantic { msg: String, pos: Pos, length: usize },

    #[error("TypeError: cannot convert '{from}' object to '{to}'.")]
    Type {
        from: String,
        to: String,
        pos: Pos,
        length: usize,
    },

    #[error("CompileError: {msg}")]
    Compile { msg: String, pos: Pos, length: usize },

    /// Reserved for a later evaluation stage; the front end never raises it.
    #[error("RuntimeError: {msg}")]
    Runtime { msg: String, pos: Pos },
}

impl Error {
    pub fn syntax(msg: impl Into<String>, pos: Pos, length: usize) -> Self {
        Self::Syntax { msg: msg.into(), pos, length }
    }

    pub fn semantic(msg: impl Into<String>, pos: Pos, length: usize) -> Self {
        Self::Semantic { msg: msg.into(), pos, length }
    }

    pub fn type_err(from: impl Into<String>, to: impl Into<String>, pos: Pos, length: usize) -> Self {
        Self::Type { from: from.into(), to: to.into(), pos, length }
    }

    pub fn compile(msg: impl Into<String>, pos: Pos, length: usize) -> Self {
        Self::Compile { msg: msg.into(), pos, length }
    }

    pub fn runtime(msg: impl Into<String>, pos: Pos) -> Self {
        Self::Runtime { msg: msg.into(), pos }
    }

    /// Stray-token error. `point_at` chooses a caret at the position over
    /// underlining the token text.
    pub fn unexpected(unexpected: impl AsRef<str>, pos: Pos, point_at: bool) -> Self {
        let unexpected = unexpected.as_ref();
        let length = if point_at { 0 } else { unexpected.chars().count() };
        Self::syntax(
            format!("encountered unexpected '{unexpected}' while parsing."),
            pos,
            length,
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "SyntaxError",
            Self::Semantic { .. } => "SemanticError",
            Self::Type { .. } => "TypeError",
            Self::Compile { .. } => "CompileError",
            Self::Runtime { .. } => "RuntimeError",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Syntax { msg, .. }
            | Self::Semantic { msg, .. }
            | Self::Compile { msg, .. }
            | Self::Runtime { msg, .. } => msg.clone(),
            Self::Type { from, to, .. } => {
                format!("cannot convert '{from}' object to '{to}'.")
            }
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            Self::Syntax { pos, .. }
            | Self::Semantic { pos, .. }
            | Self::Type { pos, .. }
            | Self::Compile { pos, .. }
            | Self::Runtime { pos, .. } => *pos,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Self::Syntax { length, .. }
            | Self::Semantic { length, .. }
            | Self::Type { length, .. }
            | Self::Compile { length, .. } => *length,
            Self::Runtime { .. } => 0,
        }
    }
}

/// Render an error against its source for terminal output.
pub fn render_error(source: &str, _filename: &str, err: &Error) {
    use ariadne::{Label, Report, ReportKind, Source};

    let start = err.pos().index;
    let end = start + err.length().max(1);

    Report::build(ReportKind::Error, (), start)
        .with_message(format!("{} (line {})", err.name(), err.pos().line + 1))
        .with_label(Label::new(start..end).with_message(err.message()))
        .finish()
        .eprint(Source::from(source))
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_underlines_token_text() {
        let err = Error::unexpected("<<=", Pos::new(2, 14), false);
        assert_eq!(err.name(), "SyntaxError");
        assert_eq!(err.length(), 3);
        assert_eq!(err.pos(), Pos::new(2, 14));
        assert_eq!(
            err.message(),
            "encountered unexpected '<<=' while parsing."
        );
    }

    #[test]
    fn unexpected_point_at_has_no_span() {
        let err = Error::unexpected(";", Pos::new(0, 4), true);
        assert_eq!(err.length(), 0);
    }

    #[test]
    fn type_error_formats_both_types() {
        let err = Error::type_err("int", "bool[]", Pos::new(1, 2), 0);
        assert_eq!(
            err.to_string(),
            "TypeError: cannot convert 'int' object to 'bool[]'."
        );
    }
}
