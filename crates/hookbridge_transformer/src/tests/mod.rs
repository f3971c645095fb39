use std::sync::Arc;

pub(crate) use serial_test::serial;

use crate::ScriptEngine;

mod validation;

async fn ready_engine() -> Arc<ScriptEngine> {
    let engine = Arc::new(ScriptEngine::new());
    engine
        .initialize()
        .await
        .expect("engine initialization failed");
    engine
}
