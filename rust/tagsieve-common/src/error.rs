use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_corpus(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidCorpus {
                message: message.into(),
            }
            .into(),
        )
    }

    /// A write into a packed bit array landed outside its word storage.
    pub fn bit_out_of_range(position: usize, word_count: usize) -> Error {
        Error(
            ErrorKind::BitOutOfRange {
                position,
                word_count,
            }
            .into(),
        )
    }

    /// Enumerated positions disagree with the population count of the same bitmap.
    pub fn enumeration_mismatch(enumerated: u64, cardinality: u64) -> Error {
        Error(
            ErrorKind::EnumerationMismatch {
                enumerated,
                cardinality,
            }
            .into(),
        )
    }

    pub fn pad_below_length(requested: u64, current: u64) -> Error {
        Error(ErrorKind::PadBelowLength { requested, current }.into())
    }

    pub fn bit_order_violation(position: u64, next_allowed: u64) -> Error {
        Error(
            ErrorKind::BitOrderViolation {
                position,
                next_allowed,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid corpus: {message}")]
    InvalidCorpus { message: String },

    #[error(
        "bit position {position} is out of range: word index must be less than {word_count}, \
         but was {}",
        position / 32
    )]
    BitOutOfRange { position: usize, word_count: usize },

    #[error("enumerated {enumerated} positions, but cardinality is {cardinality}")]
    EnumerationMismatch { enumerated: u64, cardinality: u64 },

    #[error("cannot pad bitmap to {requested} bits, it already spans {current} bits")]
    PadBelowLength { requested: u64, current: u64 },

    #[error("unable to set bit {position}: positions must be set in ascending order (next allowed is {next_allowed})")]
    BitOrderViolation { position: u64, next_allowed: u64 },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
