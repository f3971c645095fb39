use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use deno_core::{JsRuntime, RuntimeOptions, serde_v8, v8};
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::ScriptEngine;
use crate::interpret::{API_VERSION, ExecuteResult, interpret};
use crate::{Result, TransformationError};

/// Wall-clock budget for a single script evaluation. The watchdog forcibly
/// terminates V8 once it elapses; there is no cooperative yield point.
pub const TRANSFORMATION_TIMEOUT: Duration = Duration::from_millis(500);

/// Global binding the script must assign its outcome to.
const RESULT_BINDING: &str = "result";

/// Compile-only validation of an operator script.
///
/// The script body is wrapped in a synthetic single-argument function so
/// that top-level `return` statements and `data` references parse, then
/// compiled without ever being evaluated: no payload is in scope and no
/// side effects can occur. Used at authoring time, when an operator saves
/// a transformation, never on the delivery hot path.
///
/// Returns `Ok(None)` when the script compiles, or `Ok(Some(diagnostic))`
/// with the V8 compile diagnostic rendered as a display-safe string.
///
/// # Errors
///
/// Returns [`TransformationError::EngineNotReady`] if the engine has not
/// been initialized.
pub fn validate_script(engine: &ScriptEngine, script_src: &str) -> Result<Option<String>> {
    engine.check_ready()?;

    let wrapped = format!("function webhookTransform(data) {{{script_src}}}");
    let mut runtime = JsRuntime::new(RuntimeOptions::default());
    deno_core::scope!(scope, &mut runtime);

    let Some(source) = v8::String::new(scope, &wrapped) else {
        return Err(TransformationError::Serialization(
            "script source is too large for V8".into(),
        ));
    };

    let tc = &mut v8::TryCatch::new(scope);
    if v8::Script::compile(tc, source, None).is_none() {
        let diagnostic = tc
            .message()
            .map_or_else(|| "unknown compile error".to_string(), |m| {
                let text = m.get(tc).to_rust_string_lossy(tc);
                let line = m.get_line_number(tc).unwrap_or_default();
                format!("{text} (line {line})")
            });
        debug!(diagnostic, "script failed compile-only validation");
        return Ok(Some(diagnostic));
    }
    Ok(None)
}

/// A webhook transformation bound to one immutable operator script.
///
/// Constructed once per configured hook and reused across many inbound
/// deliveries. Each [`WebhookTransformer::execute`] call runs in its own
/// disposable isolate; concurrent executions share nothing but the
/// read-only engine handle.
pub struct WebhookTransformer {
    engine: Arc<ScriptEngine>,
    script_src: String,
}

impl WebhookTransformer {
    pub fn new(engine: Arc<ScriptEngine>, script_src: impl Into<String>) -> Self {
        Self {
            engine,
            script_src: script_src.into(),
        }
    }

    /// Run the script against a webhook payload and validate the result
    /// against the v2 contract.
    ///
    /// # Errors
    ///
    /// [`TransformationError::EngineNotReady`] if the engine is not
    /// initialized; [`TransformationError::Execution`] if the script fails
    /// to compile, throws, or exceeds the deadline; any of the contract
    /// validation errors from [`interpret`] for malformed v2 results.
    #[tracing::instrument(skip_all, fields(script_len = self.script_src.len()))]
    pub async fn execute(&self, data: &Value) -> Result<ExecuteResult> {
        let raw = self.execute_raw(data).await?;
        interpret(raw)
    }

    /// Run the script and return the raw, unvalidated value it left in the
    /// `result` global. An unassigned binding comes back as `Value::Null`.
    pub async fn execute_raw(&self, data: &Value) -> Result<Value> {
        self.engine.check_ready()?;

        let script_src = self.script_src.clone();
        let payload_json = serde_json::to_string(data)
            .map_err(|e| TransformationError::Serialization(e.to_string()))?;

        // V8 isolates are !Send, so the whole evaluation runs on a
        // dedicated thread and the result comes back over a oneshot.
        let (tx, rx) = tokio::sync::oneshot::channel();
        std::thread::spawn(move || {
            let result = run_in_sandbox(&script_src, &payload_json);
            if tx.send(result).is_err() {
                warn!("transformation result receiver dropped");
            }
        });

        rx.await.map_err(|_| TransformationError::Execution {
            message: "sandbox thread panicked".into(),
        })?
    }
}

/// Evaluate one script against one payload in a fresh isolate.
///
/// The isolate, its watchdog, and every V8 handle are torn down on all
/// exit paths: normal return, script error, and deadline interrupt.
fn run_in_sandbox(script_src: &str, payload_json: &str) -> Result<Value> {
    let mut runtime = JsRuntime::new(RuntimeOptions::default());

    // Watchdog: terminate V8 once the deadline elapses, regardless of what
    // the script is doing. Termination surfaces as an evaluation error.
    let isolate_handle = runtime.v8_isolate().thread_safe_handle();
    let timed_out = Arc::new(AtomicBool::new(false));
    let watchdog_timed_out = Arc::clone(&timed_out);
    let (cancel_tx, cancel_rx) = std::sync::mpsc::channel::<()>();
    let watchdog = std::thread::spawn(move || {
        if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(TRANSFORMATION_TIMEOUT) {
            watchdog_timed_out.store(true, Ordering::SeqCst);
            isolate_handle.terminate_execution();
        }
    });

    // The operator script body runs inside an IIFE so its top-level
    // statements see `data` without polluting it, and assigns its outcome
    // to the global `result` binding. `Deno.core` must not leak into the
    // sandbox; the payload and version marker are the only host contact.
    let wrapped = format!(
        "delete globalThis.Deno;\n\
         globalThis.HookshotApiVersion = \"{API_VERSION}\";\n\
         const data = {payload_json};\n\
         (() => {{ {script_src} }})();"
    );
    let eval_error = runtime.execute_script("[hookbridge:transform]", wrapped).err();

    // The watchdog holds the isolate handle; it must be joined before the
    // runtime is dropped.
    let _ = cancel_tx.send(());
    let _ = watchdog.join();

    if timed_out.load(Ordering::SeqCst) {
        return Err(TransformationError::Execution {
            message: format!(
                "script exceeded the {}ms execution deadline",
                TRANSFORMATION_TIMEOUT.as_millis()
            ),
        });
    }
    if let Some(e) = eval_error {
        return Err(TransformationError::Execution {
            message: e.to_string(),
        });
    }

    extract_result(&mut runtime)
}

/// Deep-copy the script's `result` global out of the sandbox.
fn extract_result(runtime: &mut JsRuntime) -> Result<Value> {
    deno_core::scope!(scope, runtime);
    let context = scope.get_current_context();
    let global = context.global(scope);

    let Some(key) = v8::String::new(scope, RESULT_BINDING) else {
        return Err(TransformationError::Serialization(
            "could not allocate V8 string".into(),
        ));
    };
    let Some(value) = global.get(scope, key.into()) else {
        return Ok(Value::Null);
    };
    if value.is_undefined() {
        return Ok(Value::Null);
    }

    serde_v8::from_v8(scope, value)
        .map_err(|e| TransformationError::Serialization(e.to_string()))
}
