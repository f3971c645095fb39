//! Sandboxed execution of operator-supplied webhook transformation scripts.
//!
//! A transformation script is untrusted JavaScript that maps an inbound
//! webhook payload to chat-message content and, optionally, to the HTTP
//! response the webhook endpoint should reply with. Scripts run in a
//! disposable V8 isolate with no I/O bindings, a hard 500 ms execution
//! deadline, and exactly three points of contact with the host:
//!
//! - `data`: the parsed webhook payload
//! - `HookshotApiVersion`: the literal string `"v2"`
//! - `result`: the value the script must assign before it finishes
//!
//! The `result` value is validated against the versioned v2 contract by
//! [`interpret`] before anything downstream trusts a single field.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hookbridge_transformer::{ScriptEngine, WebhookTransformer};
//!
//! # async fn example() -> hookbridge_transformer::Result<()> {
//! let engine = Arc::new(ScriptEngine::new());
//! engine.initialize().await?;
//!
//! let transformer = WebhookTransformer::new(
//!     Arc::clone(&engine),
//!     r#"result = { version: "v2", plain: `got ${data.count} events` };"#,
//! );
//! let outcome = transformer.execute(&serde_json::json!({ "count": 3 })).await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod interpret;
mod outcome;
mod transformer;

#[cfg(test)]
mod tests;

pub use engine::ScriptEngine;
pub use error::TransformationError;
pub use interpret::{
    API_VERSION, ExecuteResult, MessageContent, Mentions, WebhookResponse, interpret,
};
pub use outcome::{TRANSFORMATION_FAILED_NOTICE, WebhookEventResult};
pub use transformer::{TRANSFORMATION_TIMEOUT, WebhookTransformer, validate_script};

pub type Result<T> = std::result::Result<T, TransformationError>;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
