use std::path::Path;

use wt_engine::OpenAiEngine;
use wt_story::InferenceEngine;

/// List the models served at the configured server.
pub fn run(base_url: Option<&str>, config: Option<&Path>) -> Result<(), String> {
    let config = super::engine_config(config, base_url)?;
    let base = config.base_url.clone();
    let engine = OpenAiEngine::new(config).map_err(|e| e.to_string())?;

    let models = super::block_on(engine.available_models())?
        .map_err(|e| format!("failed to list models: {e}"))?;

    if models.is_empty() {
        println!("  No models served at {base}");
    }
    for model in models {
        println!("  {model}");
    }
    Ok(())
}
