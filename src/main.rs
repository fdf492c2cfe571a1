use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::Read;

use session_chat::config::HandlerConfig;
use session_chat::core::HandlerError;
use session_chat::handler::{ChatHandler, HandlerResponse, InvocationContext};
use session_chat::logging;

/// Bucket used for local runs when none is configured
const LOCAL_BUCKET: &str = "your-bucket-name";

fn sample_event() -> Value {
    json!({
        "arguments": {
            "message": "Hello! What can you help me with?",
            "sessionId": "test_session_123"
        },
        "identity": {
            "sub": "test-user-id"
        }
    })
}

/// Event from the path in the first argument (`-` for stdin), else the sample
fn load_event() -> Result<Value> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(sample_event());
    };

    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read event file {}", path))?
    };

    serde_json::from_str(&raw).context("Event is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = HandlerConfig::from_env()?;
    if config.bucket_name.is_none() {
        config.bucket_name = Some(LOCAL_BUCKET.to_string());
    }

    let _guard = logging::init_logging(config.log_format)?;
    config.validate()?;

    tracing::info!("=== Chat Handler Starting ===");

    let event = load_event()?;

    println!("Testing handler locally...");
    println!("Event: {}", serde_json::to_string_pretty(&event)?);

    let result = match ChatHandler::from_config(config) {
        Ok(handler) => handler.handle(event, &InvocationContext::new()).await,
        Err(e) => {
            tracing::error!("Failed to build handler: {:#}", e);
            HandlerResponse::from(HandlerError::AgentInit(e))
        }
    };
    println!("Result: {}", serde_json::to_string_pretty(&result)?);

    tracing::info!("=== Chat Handler Done ===");

    Ok(())
}
