pub mod genres;
pub mod models;
pub mod parse;
pub mod play;
pub mod tui;

use std::future::Future;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use wt_engine::{EngineConfig, OpenAiEngine};
use wt_story::{DEFAULT_MODEL, InferenceEngine, SCRIPTED_MODEL, ScriptedEngine, StoryConfig};

/// Which inference engine tells the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// A local OpenAI-compatible server (llama-server, LM Studio, Ollama).
    Openai,
    /// Canned Ork replies, no model needed.
    Scripted,
}

/// Engine selection flags shared by `play` and `tui`.
#[derive(Debug, Clone, Args)]
pub struct EngineArgs {
    /// Engine to use
    #[arg(short, long, value_enum, default_value = "openai")]
    pub engine: EngineKind,

    /// Model identifier to load
    #[arg(short, long)]
    pub model: Option<String>,

    /// Server root (default: http://127.0.0.1:8080)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Bearer token for the server
    #[arg(long)]
    pub api_key: Option<String>,

    /// Engine config file (JSON); flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replies for the scripted engine, separated by `---` lines
    #[arg(long)]
    pub script: Option<PathBuf>,
}

/// An engine ready to hand to the controller, plus the model to load.
pub struct EngineSetup {
    pub engine: Box<dyn InferenceEngine>,
    pub story: StoryConfig,
}

/// Build the engine and story configuration described by the flags.
pub fn build_engine(args: &EngineArgs) -> Result<EngineSetup, String> {
    match args.engine {
        EngineKind::Scripted => {
            let engine = match &args.script {
                Some(path) => {
                    let script = std::fs::read_to_string(path)
                        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                    ScriptedEngine::from_script(&script)
                }
                None => ScriptedEngine::new(),
            };
            let model = args.model.clone().unwrap_or_else(|| SCRIPTED_MODEL.into());
            Ok(EngineSetup {
                engine: Box::new(engine),
                story: StoryConfig::default().with_model(model),
            })
        }
        EngineKind::Openai => {
            let config = engine_config(args.config.as_deref(), args.base_url.as_deref())?;
            let config = match &args.api_key {
                Some(key) => config.with_api_key(key),
                None => config,
            };
            let model = args
                .model
                .clone()
                .or_else(|| config.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.into());
            let engine = OpenAiEngine::new(config).map_err(|e| e.to_string())?;
            Ok(EngineSetup {
                engine: Box::new(engine),
                story: StoryConfig::default().with_model(model),
            })
        }
    }
}

/// Load the engine config file, if any, and apply a base URL override.
pub fn engine_config(path: Option<&Path>, base_url: Option<&str>) -> Result<EngineConfig, String> {
    let config = match path {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    Ok(match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    })
}

/// Run a future to completion on a fresh single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    Ok(runtime.block_on(future))
}
