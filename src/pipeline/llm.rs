//! Remote structured extraction: image → vision model → [`OrderRecord`].
//!
//! The request is a single non-streaming chat completion. The system turn
//! carries the example order from [`crate::prompts`]; the user turn carries
//! the instruction and the image as a data-URI. There is no retry here:
//! [`RecognizeError::is_retryable`] tells the caller whether one makes sense.
//!
//! ## Failure mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | no token configured | `Auth { status: None }` |
//! | timeout | `Timeout` |
//! | connect/transport failure | `Network` |
//! | HTTP 401 / 403 | `Auth { status: Some(..) }` |
//! | other non-2xx | `Network` |
//! | body is not a chat envelope | `MalformedResponse` |
//! | reply text is not JSON | `MalformedJson` |
//! | JSON is not an order | `SchemaValidation` |

use crate::config::{RecognizeConfig, SamplingParams};
use crate::error::RecognizeError;
use crate::output::OrderRecord;
use crate::pipeline::normalize::excerpt;
use crate::pipeline::{encode, normalize, schema};
use crate::prompts::{system_prompt, USER_INSTRUCTION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    max_tokens: u32,
    stop: Option<Vec<String>>,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    frequency_penalty: f32,
    n: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ── Extractor ────────────────────────────────────────────────────────────

/// Client for the chat-completion endpoint. Reusable across calls.
#[derive(Debug, Clone)]
pub struct RemoteExtractor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_token: Option<String>,
    timeout_secs: u64,
    sampling: SamplingParams,
    image_detail: String,
    system_prompt: String,
}

impl RemoteExtractor {
    pub fn from_config(config: &RecognizeConfig) -> Result<Self, RecognizeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| RecognizeError::Internal(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_token: config.api_token.clone(),
            timeout_secs: config.api_timeout_secs,
            sampling: config.sampling.clone(),
            image_detail: config.image_detail.clone(),
            system_prompt: system_prompt(&config.catalog_names),
        })
    }

    /// Send the image at `image_path` to the model and parse the order.
    pub async fn extract(&self, image_path: &Path) -> Result<OrderRecord, RecognizeError> {
        let token = self
            .api_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RecognizeError::Auth {
                status: None,
                detail: "no API token. Pass --token or set ORDERSCAN_API_TOKEN.".into(),
            })?;

        let image_uri = encode::encode_file(image_path).await?;
        let request = self.build_request(&image_uri);

        let start = Instant::now();
        info!("Sending {} to {} ({})", image_path.display(), self.endpoint, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(
            "Endpoint answered {} with {} bytes in {:?}",
            status,
            body.len(),
            start.elapsed()
        );

        let content = parse_envelope(status, &body)?;
        let value = normalize::normalize(&content)?;
        let order = schema::parse_order(value)?;
        info!(
            "Extracted order for '{}' with {} items",
            order.customer_name,
            order.items.len()
        );
        Ok(order)
    }

    pub(crate) fn build_request<'a>(&'a self, image_uri: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: vec![ContentPart::Text {
                        text: &self.system_prompt,
                    }],
                },
                ChatMessage {
                    role: "user",
                    content: vec![
                        ContentPart::Text {
                            text: USER_INSTRUCTION,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image_uri,
                                detail: &self.image_detail,
                            },
                        },
                    ],
                },
            ],
            stream: false,
            max_tokens: self.sampling.max_tokens,
            stop: None,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            top_k: self.sampling.top_k,
            frequency_penalty: self.sampling.frequency_penalty,
            n: self.sampling.n,
            response_format: ResponseFormat { kind: "text" },
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> RecognizeError {
        if e.is_timeout() {
            RecognizeError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            RecognizeError::Network {
                detail: e.to_string(),
            }
        }
    }
}

/// Check the HTTP status and pull `choices[0].message.content` out of the body.
fn parse_envelope(status: StatusCode, body: &str) -> Result<String, RecognizeError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RecognizeError::Auth {
            status: Some(status.as_u16()),
            detail: excerpt(body.trim()),
        });
    }
    if !status.is_success() {
        return Err(RecognizeError::Network {
            detail: format!("HTTP {}: {}", status, excerpt(body.trim())),
        });
    }

    let envelope: ChatResponse =
        serde_json::from_str(body).map_err(|e| RecognizeError::MalformedResponse {
            detail: e.to_string(),
        })?;

    let choice = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RecognizeError::MalformedResponse {
            detail: "response has no choices".into(),
        })?;

    choice
        .message
        .content
        .ok_or_else(|| RecognizeError::MalformedResponse {
            detail: "first choice has no message content".into(),
        })
}
