use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{endpoints, messages, models, transport};
use crate::error::ChatError;
use crate::llm::traits::*;

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new() -> Result<Self, ChatError> {
        // reqwest has no separate write budget; it is folded into the total.
        let client = reqwest::Client::builder()
            .connect_timeout(transport::CONNECT_TIMEOUT)
            .read_timeout(transport::READ_TIMEOUT)
            .timeout(transport::WRITE_TIMEOUT + transport::READ_TIMEOUT)
            .build()?;
        info!("Gemini client initialized");
        Ok(Self {
            client,
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    fn generate_url(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model_id)
    }
}

/// Falls back to the default model for an empty or blank id.
pub(crate) fn effective_model_id(model_id: &str) -> &str {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        models::DEFAULT_MODEL_ID
    } else {
        trimmed
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest<'a> {
    pub contents: Vec<&'a Turn>,
}

// ── Wire responses ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModelEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ── Interpretation ───────────────────────────────────────────────────────────

/// `error.message` from an error body. Any parse failure yields `None`.
fn extract_error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope
            .error
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty()),
        Err(e) => {
            debug!("Could not parse error response body as JSON: {e}");
            None
        }
    }
}

fn remote_error(status: u16, body: &str, fallback: &str) -> ChatError {
    let message = extract_error_message(body).unwrap_or_else(|| fallback.to_string());
    let raw_body = (!body.is_empty()).then(|| body.to_string());
    ChatError::remote(status, message, raw_body)
}

pub(crate) fn interpret_models_page(
    status: u16,
    success: bool,
    body: &str,
) -> Result<ListModelsResponse, ChatError> {
    if !success || body.is_empty() {
        warn!("{} ({status}): {body}", messages::LIST_FAILED);
        return Err(remote_error(status, body, messages::LIST_FAILED));
    }
    Ok(serde_json::from_str(body)?)
}

/// Keeps models that support content generation, stripped of their prefix.
pub(crate) fn usable_model_ids(entries: &[ModelEntry]) -> impl Iterator<Item = String> + '_ {
    entries
        .iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == models::GENERATE_CONTENT_METHOD)
        })
        .filter_map(|m| m.name.strip_prefix(models::MODEL_NAME_PREFIX))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub(crate) fn interpret_generate_response(
    status: u16,
    success: bool,
    body: &str,
) -> Result<Reply, ChatError> {
    if !success || body.is_empty() {
        warn!("{}: {status} - Body: {body}", messages::GENERATE_FAILED);
        return Err(remote_error(status, body, messages::GENERATE_FAILED));
    }

    // Valid JSON of the wrong shape is a malformed reply, not a parse failure.
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        if e.is_data() {
            warn!("Unexpected response shape: {e}. Body: {body}");
            ChatError::malformed(e.to_string(), body)
        } else {
            ChatError::from(e)
        }
    })?;

    if let Some(candidate) = response.candidates.into_iter().next() {
        let parts = match candidate.content.and_then(|c| c.parts) {
            Some(parts) => parts,
            None => {
                warn!("API Error: {} Body: {body}", messages::NO_CONTENT);
                return Err(ChatError::malformed(messages::NO_CONTENT, body));
            }
        };

        let text = match parts.first().and_then(|p| p.text.clone()) {
            Some(text) => text,
            None => {
                warn!("API Error: {} Body: {body}", messages::NO_TEXT_PART);
                return Err(ChatError::malformed(messages::NO_TEXT_PART, body));
            }
        };

        let turn = Turn {
            role: Role::Model,
            parts: parts
                .into_iter()
                .filter_map(|p| p.text)
                .map(|text| Part { text })
                .collect(),
        };
        return Ok(Reply { text, turn });
    }

    if let Some(feedback) = response.prompt_feedback {
        let reason = feedback
            .block_reason
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| messages::UNKNOWN_BLOCK_REASON.to_string());
        warn!("Request blocked by API: {reason}");
        return Err(ChatError::Blocked { reason });
    }

    warn!("API Error: no candidates in response. Body: {body}");
    Err(ChatError::EmptyReply)
}

#[async_trait::async_trait]
impl ChatTransport for GeminiClient {
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ChatError> {
        if api_key.trim().is_empty() {
            warn!("list_models called without API key");
            return Err(ChatError::MissingCredential);
        }
        info!("Listing models from Gemini API");

        let mut ids = BTreeSet::new();
        let mut page_token: Option<String> = None;

        for page in 0..transport::MAX_CATALOG_PAGES {
            let mut request = self
                .client
                .get(self.models_url())
                .query(&[(endpoints::API_KEY_PARAM, api_key)]);
            if let Some(ref token) = page_token {
                request = request.query(&[(endpoints::PAGE_TOKEN_PARAM, token.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;

            let listing = interpret_models_page(status.as_u16(), status.is_success(), &body)?;
            ids.extend(usable_model_ids(&listing.models));

            match listing.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    if page + 1 == transport::MAX_CATALOG_PAGES {
                        warn!("Model listing truncated after {} pages", transport::MAX_CATALOG_PAGES);
                    }
                    page_token = Some(token);
                }
                None => break,
            }
        }

        let ids: Vec<String> = ids.into_iter().collect();
        info!("Found {} usable models: {:?}", ids.len(), ids);
        Ok(ids)
    }

    async fn generate_content(
        &self,
        api_key: &str,
        model_id: &str,
        user_text: &str,
        history: &[Turn],
    ) -> Result<Reply, ChatError> {
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingCredential);
        }
        let model_id = effective_model_id(model_id);
        info!("Generating content with model: {model_id}");

        let user_turn = Turn::user(user_text);
        let body = GenerateContentRequest {
            contents: history.iter().chain(std::iter::once(&user_turn)).collect(),
        };

        let response = self
            .client
            .post(self.generate_url(model_id))
            .query(&[(endpoints::API_KEY_PARAM, api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let reply = interpret_generate_response(status.as_u16(), status.is_success(), &text)?;
        debug!("Successfully received content generation response");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen_ok(body: &str) -> Result<Reply, ChatError> {
        interpret_generate_response(200, true, body)
    }

    #[test]
    fn first_candidate_first_part_is_reply_text() {
        let reply = gen_ok(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"hi"},{"text":"there"}]}}]}"#)
            .unwrap();
        assert_eq!(reply.text, "hi");
        assert_eq!(reply.turn.role, Role::Model);
        assert_eq!(reply.turn.parts.len(), 2);
        assert_eq!(reply.turn.parts[1].text, "there");
    }

    #[test]
    fn blocked_prompt_without_candidates() {
        let err = gen_ok(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, ChatError::Blocked { ref reason } if reason == "SAFETY"));
    }

    #[test]
    fn empty_candidates_falls_through_to_feedback() {
        let err = gen_ok(r#"{"candidates":[],"promptFeedback":{"blockReason":"OTHER"}}"#).unwrap_err();
        assert!(matches!(err, ChatError::Blocked { ref reason } if reason == "OTHER"));
    }

    #[test]
    fn no_candidates_no_feedback_is_empty_reply() {
        assert!(matches!(gen_ok("{}").unwrap_err(), ChatError::EmptyReply));
        assert!(matches!(gen_ok(r#"{"candidates":[]}"#).unwrap_err(), ChatError::EmptyReply));
    }

    #[test]
    fn feedback_without_reason_is_blocked_for_unknown_reason() {
        for body in [r#"{"promptFeedback":{}}"#, r#"{"promptFeedback":{"safetyRatings":[]}}"#] {
            let err = gen_ok(body).unwrap_err();
            assert!(
                matches!(err, ChatError::Blocked { ref reason } if reason == messages::UNKNOWN_BLOCK_REASON),
                "{body}: {err:?}"
            );
        }
        assert_eq!(
            gen_ok(r#"{"promptFeedback":{}}"#).unwrap_err().to_string(),
            "Request Blocked by API: Unknown reason"
        );
    }

    #[test]
    fn candidate_without_content_is_malformed() {
        let err = gen_ok(r#"{"candidates":[{"finishReason":"STOP"}]}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedReply { ref reason, .. } if reason == messages::NO_CONTENT));
    }

    #[test]
    fn part_without_text_is_malformed() {
        let err = gen_ok(r#"{"candidates":[{"content":{"parts":[{"inlineData":{}}]}}]}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedReply { ref reason, .. } if reason == messages::NO_TEXT_PART));

        let err = gen_ok(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedReply { .. }));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(gen_ok("not json").unwrap_err(), ChatError::Parse(_)));
        assert!(matches!(gen_ok(r#"{"candidates":["#).unwrap_err(), ChatError::Parse(_)));
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        for body in [
            r#"{"candidates":{}}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":5}]}}]}"#,
        ] {
            match gen_ok(body).unwrap_err() {
                ChatError::MalformedReply { raw_body, .. } => assert_eq!(raw_body, body),
                other => panic!("{body}: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn error_body_message_is_extracted() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        let err = interpret_generate_response(400, false, body).unwrap_err();
        match err {
            ChatError::Remote {
                status,
                ref message,
                ref raw_body,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid.");
                assert_eq!(raw_body.as_deref(), Some(body));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_error_body_falls_back_to_generic_message() {
        let err = interpret_generate_response(502, false, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ChatError::Remote { status: 502, ref message, .. } if message == messages::GENERATE_FAILED));
        assert_eq!(err.details(), Some("<html>Bad Gateway</html>"));
    }

    #[test]
    fn empty_success_body_is_remote_error() {
        let err = interpret_generate_response(200, true, "").unwrap_err();
        assert!(matches!(err, ChatError::Remote { status: 200, raw_body: None, .. }));
    }

    #[test]
    fn catalog_keeps_generate_content_models_only() {
        let listing = interpret_models_page(
            200,
            true,
            r#"{"models":[
                {"name":"models/a","supportedGenerationMethods":["generateContent"]},
                {"name":"models/b","supportedGenerationMethods":["embedContent"]},
                {"name":"tunedModels/c","supportedGenerationMethods":["generateContent"]},
                {"name":"models/d"}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<String> = usable_model_ids(&listing.models).collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn blank_model_id_uses_default() {
        assert_eq!(effective_model_id(""), models::DEFAULT_MODEL_ID);
        assert_eq!(effective_model_id("   "), models::DEFAULT_MODEL_ID);
        assert_eq!(effective_model_id("gemini-pro"), "gemini-pro");
    }

    #[test]
    fn request_body_appends_new_user_turn() {
        let history = vec![Turn::user("q1"), Turn::model("a1")];
        let user_turn = Turn::user("q2");
        let body = GenerateContentRequest {
            contents: history.iter().chain(std::iter::once(&user_turn)).collect(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [
                {"role": "user", "parts": [{"text": "q1"}]},
                {"role": "model", "parts": [{"text": "a1"}]},
                {"role": "user", "parts": [{"text": "q2"}]}
            ]})
        );
    }
}
