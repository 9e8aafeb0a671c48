//! Generative session client
//!
//! Binds conversations to a persona and model, streams replies as text
//! fragments and generates world-book illustrations.
//!
//! Context management:
//! - Each `ChatSession` keeps its own history; a turn is recorded only after
//!   its stream completes successfully
//! - Turns carrying an image bypass the session entirely (one-shot multi-part
//!   request, no persona, not recorded)

use crate::gemini::types::{Content, Part, ROLE_USER};
use crate::gemini::{FragmentStream, GeminiApiRequest, GenerationError, GenerativeApi};
use crate::session::media::DataUrl;
use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// A conversation context bound to a persona and model
#[derive(Debug)]
pub struct ChatSession {
    persona: String,
    model: String,
    history: Arc<Mutex<Vec<Content>>>,
}

impl ChatSession {
    fn new(persona: &str, model: &str) -> Self {
        Self {
            persona: persona.to_string(),
            model: model.to_string(),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The system persona of this session
    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// The model id of this session
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Snapshot of the recorded turns
    pub async fn history(&self) -> Vec<Content> {
        self.history.lock().await.clone()
    }
}

/// Client for session-bound streaming and one-shot image generation
#[derive(Clone)]
pub struct SessionClient {
    api: Arc<dyn GenerativeApi>,
    image_model: String,
}

impl SessionClient {
    /// Create a session client over any generative API
    pub fn new(api: Arc<dyn GenerativeApi>, image_model: impl Into<String>) -> Self {
        Self {
            api,
            image_model: image_model.into(),
        }
    }

    /// Bind a fresh conversation context to a persona and model
    pub fn create_session(&self, persona: &str, model: &str) -> ChatSession {
        debug!(model = %model, persona_len = persona.len(), "Creating chat session");
        ChatSession::new(persona, model)
    }

    /// Stream the agent's reply to `prompt`
    ///
    /// With `image` (a data URL or bare base64) the request is a single
    /// multi-part call that does not touch the session history.
    pub fn stream_reply(
        &self,
        session: &ChatSession,
        prompt: &str,
        image: Option<&str>,
    ) -> FragmentStream {
        match image {
            Some(image) => {
                let inline = DataUrl::parse(image);
                debug!(
                    model = %session.model,
                    mime_type = %inline.mime_type,
                    "Streaming one-shot multimodal reply"
                );
                let request = GeminiApiRequest::new(
                    vec![Content {
                        role: Some(ROLE_USER.to_string()),
                        parts: vec![
                            Part::inline(inline.mime_type, inline.data),
                            Part::text(prompt),
                        ],
                    }],
                    None,
                );
                self.api.stream_generate(&session.model, request)
            }
            None => Box::pin(session_reply(
                self.api.clone(),
                session.model.clone(),
                session.persona.clone(),
                session.history.clone(),
                prompt.to_string(),
            )),
        }
    }

    /// Generate an illustration for `prompt`
    ///
    /// Never fails: any error (or a response without image data) degrades to
    /// a placeholder URL seeded from the prompt.
    pub async fn generate_image(&self, prompt: &str) -> String {
        let request = GeminiApiRequest::new(
            vec![Content::user_text(format!(
                "A beautiful digital art illustration of: {}. High quality, detailed.",
                prompt
            ))],
            None,
        );

        match self.api.generate(&self.image_model, &request).await {
            Ok(response) => match response.inline_data() {
                Some(inline) => DataUrl {
                    mime_type: inline.mime_type.clone(),
                    data: inline.data.clone(),
                }
                .to_uri(),
                None => {
                    warn!(model = %self.image_model, "Image response carried no inline data");
                    placeholder_image_url(prompt)
                }
            },
            Err(e) => {
                error!(model = %self.image_model, error = %e, "Image generation failed");
                placeholder_image_url(prompt)
            }
        }
    }
}

fn session_reply(
    api: Arc<dyn GenerativeApi>,
    model: String,
    persona: String,
    history: Arc<Mutex<Vec<Content>>>,
    prompt: String,
) -> impl Stream<Item = Result<String, GenerationError>> {
    try_stream! {
        let user_turn = Content::user_text(prompt);
        let mut contents = history.lock().await.clone();
        contents.push(user_turn.clone());

        let request = GeminiApiRequest::new(contents, Some(persona.as_str()));
        let mut upstream = api.stream_generate(&model, request);

        let mut reply = String::new();
        while let Some(fragment) = upstream.next().await {
            let fragment = fragment?;
            reply.push_str(&fragment);
            yield fragment;
        }

        let mut history = history.lock().await;
        history.push(user_turn);
        history.push(Content::model_text(reply));
    }
}

/// Compute a short hash for a prompt
///
/// Returns the first 8 hex characters of its SHA-256, stable across builds.
pub fn hash_prompt(prompt: &str) -> String {
    Sha256::digest(prompt.as_bytes())
        .iter()
        .take(4)
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Stock-photo URL used when image generation is unavailable
pub fn placeholder_image_url(prompt: &str) -> String {
    format!("https://picsum.photos/seed/{}/400/300", hash_prompt(prompt))
}
