use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditErrorCode {
    NotFound,
    Parse,
    Format,
    Usage,
    Io,
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditError {
    pub code: EditErrorCode,
    pub message: String,
}

impl EditErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::Parse => "ParseError",
            Self::Format => "FormatError",
            Self::Usage => "UsageError",
            Self::Io => "IoError",
            Self::Archive => "ArchiveError",
        }
    }
}

impl fmt::Display for EditErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EditError {
    pub fn new(code: EditErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for EditError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_error_kind_names() {
        let err = EditError::new(EditErrorCode::Format, "invalid format in modification: bad");
        assert_eq!(err.to_string(), "FormatError: invalid format in modification: bad");
        assert_eq!(EditErrorCode::NotFound.to_string(), "NotFound");
        assert_eq!(EditErrorCode::Parse.to_string(), "ParseError");
        assert_eq!(EditErrorCode::Usage.to_string(), "UsageError");
        assert_eq!(EditErrorCode::Io.to_string(), "IoError");
        assert_eq!(EditErrorCode::Archive.to_string(), "ArchiveError");
    }
}
