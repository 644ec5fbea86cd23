use thiserror::Error;

/// Errors that can occur while decoding a byte stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Attempted to read past the end of the input buffer
    #[error("Read of {requested} byte(s) overruns buffer ({remaining} remaining)")]
    BufferUnderflow { requested: usize, remaining: usize },

    /// A length-prefixed string payload was not valid UTF-8
    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    /// An enum tag byte did not match any known variant
    #[error("Unknown tag {tag} for {type_name}")]
    UnknownTag { type_name: &'static str, tag: u8 },

    /// A variable-length integer ran past its maximum width
    #[error("Variable-length integer exceeds 64 bits")]
    VarIntOverflow,
}
