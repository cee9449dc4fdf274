// error.rs - Error taxonomy shared by props, strings, builders and the XML codec

use crate::ws::WsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TsError {
    #[error("Index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("Invalid range [{min}, {lim}) for length {len}")]
    Range { min: usize, lim: usize, len: usize },
    #[error("Invalid writing system handle: {0}")]
    InvalidWritingSystem(i32),
    #[error("Missing required argument: {0}")]
    NullArgument(&'static str),
    #[error("Malformed string XML: {0}")]
    Format(String),
    #[error("Unknown writing system '{id}'")]
    UnknownWritingSystem {
        id: String,
        #[source]
        source: WsError,
    },
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TsError {
    /// Offset, length and index violations.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            TsError::IndexOutOfRange { .. }
                | TsError::Range { .. }
                | TsError::InvalidWritingSystem(_)
        )
    }

    /// Problems with wire-format input. Only ever produced while decoding.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            TsError::Format(_) | TsError::UnknownWritingSystem { .. }
        )
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        TsError::Format(msg.into())
    }
}

pub type TsResult<T> = Result<T, TsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(TsError::Range { min: 3, lim: 1, len: 2 }.is_range_error());
        assert!(TsError::IndexOutOfRange { index: 1, count: 1 }.is_range_error());
        assert!(TsError::format("bad root").is_format_error());
        assert!(!TsError::NullArgument("props").is_range_error());
        assert!(!TsError::NullArgument("props").is_format_error());
    }

    #[test]
    fn test_display() {
        let err = TsError::Range { min: 4, lim: 2, len: 10 };
        assert_eq!(err.to_string(), "Invalid range [4, 2) for length 10");
    }
}
