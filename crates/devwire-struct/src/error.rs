use crate::value::ValueTypeError;

/// Errors that can occur during struct serialization and schema handling.
#[derive(Debug, thiserror::Error)]
pub enum StructError {
    /// The payload ended before a field could be fully decoded.
    #[error("malformed payload: field `{field}` needs {needed} bytes, {available} available")]
    MalformedPayload {
        field: String,
        needed: usize,
        available: usize,
    },

    /// A field holds a value of a different type than its wire encoding.
    #[error("field `{field}` expects a {expected} value, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A value could not be converted into the requested Rust type.
    #[error(transparent)]
    ValueType(#[from] ValueTypeError),

    /// A string field is not valid UTF-8.
    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: String },

    /// A length-prefixed value does not fit its 16-bit prefix.
    #[error("field `{field}` is too long to encode ({len} > 65535)")]
    LengthOverflow { field: String, len: usize },

    /// An attribute name is not declared by the message type.
    #[error("unknown attribute `{name}` for message type `{message_type}`")]
    UnknownAttribute { message_type: String, name: String },

    /// Two parameters of one command share a name.
    #[error("duplicate field `{field}` in `{message_type}`")]
    DuplicateField { message_type: String, field: String },

    /// A data type code or name has no scalar wire encoding.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// No message type registered for the given intent.
    #[error("no message type registered for intent {0}")]
    NoSchema(u16),

    /// The intent is already registered and replacement is disabled.
    #[error("intent {0} is already registered")]
    DuplicateIntent(u16),

    /// Command metadata is structurally invalid.
    #[error("invalid command metadata: {0}")]
    InvalidMetadata(String),

    /// Metadata files could not be loaded.
    #[error("failed to load command metadata: {0}")]
    LoadFailed(String),

    /// Metadata is not valid JSON.
    #[error("metadata is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StructError>;
