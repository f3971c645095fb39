use thiserror::Error;

/// Errors raised by the transformation subsystem.
///
/// Every variant is surfaced synchronously to the immediate caller. The
/// subsystem performs no internal retries and never downgrades a malformed
/// result to "no content", which would conceal operator script bugs.
#[derive(Debug, Error)]
pub enum TransformationError {
    /// `validate`/`execute` was called before the engine finished
    /// initializing. Fatal precondition violation, not a recoverable error.
    #[error("script engine is not initialized")]
    EngineNotReady,

    /// The V8 platform failed to come up.
    #[error("failed to initialize script engine: {0}")]
    Initialize(String),

    /// The script failed to compile, threw, or was interrupted by the
    /// execution deadline. The message carries the interpreter diagnostic.
    #[error("transformation failed to run: {message}")]
    Execution { message: String },

    /// A value could not cross the sandbox boundary in either direction.
    #[error("failed to move a value across the sandbox boundary: {0}")]
    Serialization(String),

    /// An object result did not declare `version: "v2"`.
    #[error("result returned from transformation didn't specify version = v2 (got {found})")]
    VersionMismatch { found: String },

    /// A non-empty v2 result did not provide a string `plain` field.
    #[error("result returned from transformation didn't provide a string value for plain")]
    MissingPlainField,

    /// An optional content field was present with the wrong type.
    #[error("result returned from transformation didn't provide a string value for {field}")]
    InvalidFieldType { field: &'static str },

    /// `mentions` did not match the allow-listed shape.
    #[error("result returned from transformation provided an invalid {field}")]
    InvalidMentions { field: &'static str },

    /// `webhookResponse` did not match the contract.
    #[error(
        "result returned from transformation didn't provide a valid value for webhookResponse.{field}"
    )]
    InvalidWebhookResponse { field: &'static str },
}
