use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MessageError {
    /// The classifier input matched none of the known shapes.
    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),

    /// A known container carried a sub-kind that is not converted.
    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// A strict message kind was constructed without its required fields.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unsupported message type for {target}: {kind}")]
    UnsupportedMessageType { target: &'static str, kind: String },

    #[error("Unsupported content part for {target}: {part}")]
    UnsupportedContentPart { target: &'static str, part: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MessageResult<T> = Result<T, MessageError>;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Missing environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings path to the environment variable that sets it
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "STR_MESSAGE_{}",
        field_path.replace('.', "__").to_uppercase()
    )
}
