//! Streaming chat-completions client.

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wt_story::{
    CompletionChunk, CompletionStream, EngineError, InferenceEngine, Message, SamplingOptions,
};

use crate::config::EngineConfig;
use crate::error::{HttpError, HttpResult};
use crate::sse::{SseDecoder, SseEvent};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Engine backed by an OpenAI-compatible HTTP server.
#[derive(Debug, Clone)]
pub struct OpenAiEngine {
    client: Client,
    config: EngineConfig,
    model: Option<String>,
    sampling: SamplingOptions,
}

impl OpenAiEngine {
    /// Build an engine. No network traffic happens until `initialize`.
    pub fn new(config: EngineConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeout())
            .build()
            .map_err(HttpError::Client)?;
        Ok(Self {
            client,
            config,
            model: None,
            sampling: SamplingOptions::default(),
        })
    }

    /// Connection settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Model resolved by the last successful `initialize`.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Ask the server which models it serves.
    pub async fn list_models(&self) -> HttpResult<Vec<String>> {
        let url = self.config.endpoint("/v1/models");
        let response = self
            .authorized(self.client.get(&url))
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|source| HttpError::Connect {
                url: url.clone(),
                source,
            })?;
        let response = check_status(response).await?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn start_completion(&self, history: &[Message]) -> HttpResult<CompletionStream> {
        let model = self.model.as_deref().ok_or(HttpError::NotLoaded)?;
        let url = self.config.endpoint("/v1/chat/completions");
        let body = ChatRequest {
            model,
            messages: history,
            stream: true,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
        };
        debug!(%url, %model, messages = history.len(), "posting chat completion");

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|source| HttpError::Connect {
                url: url.clone(),
                source,
            })?;
        let response = check_status(response).await?;
        Ok(completion_stream(response.bytes_stream()))
    }
}

async fn check_status(response: reqwest::Response) -> HttpResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

/// Pick the served model to request. A server with a single model accepts
/// any identifier.
fn resolve_model(requested: &str, served: &[String]) -> Option<String> {
    if served.iter().any(|m| m == requested) {
        return Some(requested.to_string());
    }
    match served {
        [only] => Some(only.clone()),
        _ => None,
    }
}

#[async_trait]
impl InferenceEngine for OpenAiEngine {
    async fn initialize(
        &mut self,
        model: &str,
        options: SamplingOptions,
        progress: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), EngineError> {
        progress(format!("Connecting to {}...", self.config.base_url));
        let served = self
            .list_models()
            .await
            .map_err(HttpError::into_load_error)?;
        progress(format!("Server offers {} model(s)", served.len()));

        let resolved = resolve_model(model, &served).ok_or_else(|| {
            HttpError::UnknownModel {
                model: model.to_string(),
                available: served.join(", "),
            }
            .into_load_error()
        })?;
        if resolved != model {
            warn!(requested = %model, using = %resolved, "server serves a single model");
        }
        progress(format!("Loading {resolved}..."));

        self.model = Some(resolved);
        self.sampling = options;
        progress("Model ready!".to_string());
        Ok(())
    }

    async fn complete(&mut self, history: &[Message]) -> Result<CompletionStream, EngineError> {
        Ok(self.start_completion(history).await?)
    }

    async fn available_models(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.list_models().await?)
    }
}

struct StreamState {
    body: BoxStream<'static, Result<Vec<u8>, String>>,
    decoder: SseDecoder,
    text: String,
    pending: VecDeque<Result<CompletionChunk, EngineError>>,
    finished: bool,
}

impl StreamState {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.finished {
                return;
            }
            match event {
                SseEvent::Done => self.finish(),
                SseEvent::Data(data) => self.absorb_data(&data),
            }
        }
    }

    fn absorb_data(&mut self, data: &str) {
        let payload: ChunkPayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, "skipping undecodable event");
                return;
            }
        };
        if let Some(error) = payload.error {
            self.finished = true;
            self.pending
                .push_back(Err(EngineError::Stream(error.message)));
            return;
        }
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .unwrap_or_default();
        if !content.is_empty() {
            self.text.push_str(&content);
            self.pending.push_back(Ok(CompletionChunk::Delta(content)));
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.pending
            .push_back(Ok(CompletionChunk::Done(std::mem::take(&mut self.text))));
    }
}

/// Turn a raw SSE body into completion chunks.
fn completion_stream<S, B, E>(body: S) -> CompletionStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let state = StreamState {
        body: body
            .map(|item| item.map(|b| b.as_ref().to_vec()).map_err(|e| e.to_string()))
            .boxed(),
        decoder: SseDecoder::new(),
        text: String::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(&bytes);
                    state.absorb(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.pending.push_back(Err(EngineError::Stream(err)));
                }
                None => {
                    let events = state.decoder.finish();
                    state.absorb(events);
                    if !state.finished {
                        state.finish();
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(chunks: Vec<String>) -> Vec<Result<CompletionChunk, EngineError>> {
        let body = stream::iter(chunks.into_iter().map(Ok::<_, String>));
        completion_stream(body).collect().await
    }

    fn event(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::to_string(content).unwrap()
        )
    }

    #[test]
    fn request_body_shape() {
        let history = vec![Message::system("be orky"), Message::user("go")];
        let body = ChatRequest {
            model: "orkz",
            messages: &history,
            stream: true,
            temperature: 0.5,
            top_p: 0.25,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "orkz");
        assert_eq!(json["stream"], true);
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["top_p"], 0.25);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "go");
    }

    #[test]
    fn model_resolution() {
        let served = vec!["a".to_string(), "b".to_string()];
        assert_eq!(resolve_model("b", &served), Some("b".to_string()));
        assert_eq!(resolve_model("c", &served), None);
        assert_eq!(
            resolve_model("anything", &["only".to_string()]),
            Some("only".to_string())
        );
        assert_eq!(resolve_model("x", &[]), None);
    }

    #[tokio::test]
    async fn deltas_then_done() {
        let first = event("STORY: Waaagh");
        let second = event("!");
        let chunks = collect(vec![format!("{first}{second}data: [DONE]\n\n")]).await;
        assert_eq!(
            chunks,
            vec![
                Ok(CompletionChunk::Delta("STORY: Waaagh".to_string())),
                Ok(CompletionChunk::Delta("!".to_string())),
                Ok(CompletionChunk::Done("STORY: Waaagh!".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn event_split_across_network_chunks() {
        let raw = event("Dakka");
        let (head, tail) = raw.split_at(20);
        let chunks = collect(vec![head.to_string(), tail.to_string()]).await;
        assert_eq!(
            chunks,
            vec![
                Ok(CompletionChunk::Delta("Dakka".to_string())),
                Ok(CompletionChunk::Done("Dakka".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn missing_done_still_finalizes() {
        let chunks = collect(vec![event("Grot")]).await;
        assert_eq!(
            chunks.last(),
            Some(&Ok(CompletionChunk::Done("Grot".to_string())))
        );
    }

    #[tokio::test]
    async fn role_only_and_garbage_events_are_skipped() {
        let chunks = collect(vec![
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n".to_string(),
            "data: not json\n\n".to_string(),
            "data: [DONE]\n\n".to_string(),
        ])
        .await;
        assert_eq!(chunks, vec![Ok(CompletionChunk::Done(String::new()))]);
    }

    #[tokio::test]
    async fn server_error_event_breaks_stream() {
        let chunks = collect(vec![
            "data: {\"error\":{\"message\":\"context full\"}}\n\n".to_string(),
            "data: [DONE]\n\n".to_string(),
        ])
        .await;
        assert_eq!(
            chunks,
            vec![Err(EngineError::Stream("context full".to_string()))]
        );
    }

    #[tokio::test]
    async fn transport_error_breaks_stream() {
        let body = stream::iter(vec![
            Ok(event("Boom").into_bytes()),
            Err("connection reset".to_string()),
        ]);
        let chunks: Vec<_> = completion_stream(body).collect().await;
        assert_eq!(
            chunks,
            vec![
                Ok(CompletionChunk::Delta("Boom".to_string())),
                Err(EngineError::Stream("connection reset".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn complete_before_initialize_fails() {
        let mut engine = OpenAiEngine::new(EngineConfig::default()).unwrap();
        let err = engine.complete(&[]).await.err();
        assert_eq!(
            err,
            Some(EngineError::Request("no model loaded".to_string()))
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_load_error() {
        let mut engine = OpenAiEngine::new(
            EngineConfig::default()
                .with_base_url("http://127.0.0.1:1")
                .with_timeout_secs(2),
        )
        .unwrap();
        let mut progress = Vec::new();
        let err = engine
            .initialize("m", SamplingOptions::default(), &mut |p: String| progress.push(p))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Load(_)));
        assert_eq!(progress, vec!["Connecting to http://127.0.0.1:1...".to_string()]);
        assert!(engine.model().is_none());
    }
}
