use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Args;
use serde_json::Value;
use tracing::{info, warn};

use hookbridge_config::Config;
use hookbridge_transformer::{
    ScriptEngine, TRANSFORMATION_FAILED_NOTICE, WebhookEventResult, WebhookTransformer,
    validate_script,
};

#[derive(Debug, Args)]
pub(crate) struct ValidateCmd {
    /// Path to the transformation script
    script: Utf8PathBuf,
}

impl ValidateCmd {
    pub(crate) async fn handle(&self) -> Result<()> {
        let src = read_script(&self.script)?;

        let engine = ScriptEngine::new();
        engine.initialize().await?;

        match validate_script(&engine, &src)? {
            None => {
                info!("{} compiles", self.script);
                Ok(())
            }
            Some(diagnostic) => {
                anyhow::bail!("Could not compile transformation function:\n{diagnostic}")
            }
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct RunCmd {
    /// Path to the transformation script
    script: Utf8PathBuf,

    /// JSON payload file; defaults to an empty object
    #[arg(long, short = 'p')]
    payload: Option<Utf8PathBuf>,

    /// Print the delivery envelope the HTTP layer would answer with,
    /// instead of the interpreted result
    #[arg(long)]
    reply: bool,
}

impl RunCmd {
    pub(crate) async fn handle(&self, config: Option<&Utf8PathBuf>) -> Result<()> {
        // A provided config supplies the same gates the hosting bridge
        // checks before it ever constructs a transformer.
        if let Some(path) = config {
            let cfg = Config::load(path)?;
            if !cfg.generic.enabled {
                anyhow::bail!("Generic webhooks are disabled in {path}");
            }
            if !cfg.generic.allow_js_transformation_functions {
                anyhow::bail!("JS transformation functions are not allowed by {path}");
            }
        }

        let src = read_script(&self.script)?;
        let payload: Value = match &self.payload {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .context(format!("Failed reading payload: {path}"))?;
                serde_json::from_str(&raw)
                    .context(format!("Payload is not valid JSON: {path}"))?
            }
            None => Value::Object(serde_json::Map::new()),
        };

        let engine = Arc::new(ScriptEngine::new());
        engine.initialize().await?;
        let transformer = WebhookTransformer::new(engine, src);

        match transformer.execute(&payload).await {
            Ok(result) => {
                if self.reply {
                    let envelope = WebhookEventResult::success(&result);
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                } else {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                Ok(())
            }
            Err(e) => {
                warn!("{TRANSFORMATION_FAILED_NOTICE}");
                let envelope = WebhookEventResult::failure(e.to_string());
                println!("{}", serde_json::to_string_pretty(&envelope)?);
                Err(e.into())
            }
        }
    }
}

fn read_script(path: &Utf8PathBuf) -> Result<String> {
    std::fs::read_to_string(path).context(format!("Failed reading script: {path}"))
}
