use std::borrow::Cow;

/// All possible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or unusable configuration.
    Config,
}

impl ErrorKind {
    const fn description(self) -> &'static str {
        match self {
            Self::Config => "configuration",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.description().fmt(f)
    }
}

/// Device runtime error.
#[derive(Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    info: Cow<'static, str>,
}

impl Error {
    /// Creates an [`Error`] from an [`ErrorKind`] and a description.
    #[must_use]
    pub fn new(kind: ErrorKind, info: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            info: info.into(),
        }
    }

    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.info)
    }
}

impl std::error::Error for Error {}

/// A specialized `Result` type for device operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn display_contains_kind_and_info() {
        let error = Error::new(ErrorKind::Config, "floor must be below ceiling");

        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(
            error.to_string(),
            "configuration error: floor must be below ceiling"
        );
    }
}
