use std::sync::atomic::{AtomicBool, Ordering};

use deno_core::{JsRuntime, RuntimeOptions};
use tracing::debug;

use crate::{Result, TransformationError};

/// Process-wide handle to the V8 scripting runtime.
///
/// The engine owns no isolates itself; it tracks whether the shared V8
/// platform has been brought up, so that validate/execute calls can spawn
/// disposable execution contexts cheaply. It is passed around by `Arc`
/// rather than living in a global, so tests substitute their own instance
/// and multiple engines can coexist.
///
/// Consumers must gate on [`ScriptEngine::is_ready`]; calls against an
/// uninitialized engine fail with [`TransformationError::EngineNotReady`].
#[derive(Debug, Default)]
pub struct ScriptEngine {
    ready: AtomicBool,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring up the V8 platform and warm a throwaway isolate.
    ///
    /// Must complete once, at process startup, before any validate or
    /// execute call. Calling it again after success is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`TransformationError::Initialize`] if the platform could
    /// not be brought up. No retry is attempted here; the hosting
    /// application decides whether to retry process-wide initialization.
    pub async fn initialize(&self) -> Result<()> {
        debug!("initializing script engine");
        tokio::task::spawn_blocking(|| {
            JsRuntime::init_platform(None, false);
            // Creating and dropping an isolate forces V8 to finish
            // loading before the first real execution pays for it.
            drop(JsRuntime::new(RuntimeOptions::default()));
        })
        .await
        .map_err(|e| TransformationError::Initialize(e.to_string()))?;
        self.ready.store(true, Ordering::SeqCst);
        debug!("script engine ready");
        Ok(())
    }

    /// Whether [`ScriptEngine::initialize`] has completed successfully.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub(crate) fn check_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(TransformationError::EngineNotReady)
        }
    }
}
