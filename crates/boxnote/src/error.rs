use core::fmt;
use std::{borrow::Cow, ops::Deref};

/// The class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not a well-formed BoxNote document.
    Parse,
    /// The renderer met a tree the parser should never have produced.
    Render,
    /// No usable credential for an image-exporting run.
    Authentication,
    /// Reading the input or writing the output failed.
    Io,
    /// Anything else.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse error",
            ErrorKind::Render => "render error",
            ErrorKind::Authentication => "authentication error",
            ErrorKind::Io => "io error",
            ErrorKind::Other => "error",
        };
        f.write_str(name)
    }
}

/// An error that can occur during the conversion process.
#[derive(Clone)]
pub struct Error(Box<Repr>);

#[derive(Clone)]
struct Repr {
    kind: ErrorKind,
    msg: Cow<'static, str>,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<Cow<'static, str>>) -> Self {
        Error(Box::new(Repr {
            kind,
            msg: msg.into(),
        }))
    }

    /// Creates a [`ErrorKind::Parse`] error.
    pub fn parse(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Parse, msg)
    }

    /// Creates a [`ErrorKind::Render`] error.
    pub fn render(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Render, msg)
    }

    /// Creates a [`ErrorKind::Authentication`] error.
    pub fn auth(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Authentication, msg)
    }

    /// The class of this error.
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    /// The bare message, without the kind prefix.
    pub fn message(&self) -> &str {
        &self.0.msg
    }

    /// Prefixes the message with some context, keeping the kind.
    pub fn context(self, ctx: impl fmt::Display) -> Self {
        let Repr { kind, msg } = *self.0;
        Self::new(kind, format!("{ctx}: {msg}"))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.deref().kind {
            ErrorKind::Other => write!(f, "{}", self.0.msg),
            kind => write!(f, "{kind}: {}", self.0.msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            return Self::new(ErrorKind::Io, e.to_string());
        }
        Self::parse(format!("malformed JSON: {e}"))
    }
}

impl From<fmt::Error> for Error {
    fn from(e: fmt::Error) -> Self {
        Self::new(ErrorKind::Other, e.to_string())
    }
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Self::new(ErrorKind::Other, s)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::new(ErrorKind::Other, s)
    }
}

impl From<Cow<'static, str>> for Error {
    fn from(s: Cow<'static, str>) -> Self {
        Self::new(ErrorKind::Other, s)
    }
}
