//! Gemini `generateContent` client.
//!
//! Everything that turns a body into a result is a plain function so it can be
//! tested without a network.

use crate::{
    config::app::GatewayConfig,
    core::{
        insight::{
            GroundingLink, InsightProvider, InventorySnapshot, LocationInsight, location_prompt,
            summary_prompt,
        },
        location::Coordinates,
    },
    errors::GatewayError,
};
use async_trait::async_trait;
use tracing::{debug, instrument};
use wire::{
    Content, ErrorEnvelope, GenerateRequest, GenerateResponse, GoogleMaps, LatLng, Part,
    RetrievalConfig, Tool, ToolConfig,
};

/// Wire format of `generateContent`, limited to the fields read or written.
pub mod wire {
    #![allow(missing_docs)]

    use serde::{Deserialize, Serialize};

    /// Request body of `models/{model}:generateContent`.
    #[derive(Debug, Clone, Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct GenerateRequest {
        pub contents: Vec<Content>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub tools: Vec<Tool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub tool_config: Option<ToolConfig>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
    pub struct Content {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub role: Option<String>,
        #[serde(default)]
        pub parts: Vec<Part>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
    pub struct Part {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub text: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    pub struct Tool {
        pub google_maps: GoogleMaps,
    }

    #[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
    pub struct GoogleMaps {}

    #[derive(Debug, Clone, Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct ToolConfig {
        pub retrieval_config: RetrievalConfig,
    }

    #[derive(Debug, Clone, Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct RetrievalConfig {
        pub lat_lng: LatLng,
    }

    #[derive(Debug, Clone, Copy, Serialize, PartialEq)]
    pub struct LatLng {
        pub latitude: f64,
        pub longitude: f64,
    }

    /// Response body; only the parts that are read.
    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct GenerateResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct Candidate {
        #[serde(default)]
        pub content: Option<Content>,
        #[serde(default)]
        pub grounding_metadata: Option<GroundingMetadata>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct GroundingMetadata {
        #[serde(default)]
        pub grounding_chunks: Vec<GroundingChunk>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct GroundingChunk {
        #[serde(default)]
        pub maps: Option<ChunkSource>,
        #[serde(default)]
        pub web: Option<ChunkSource>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct ChunkSource {
        #[serde(default)]
        pub uri: Option<String>,
        #[serde(default)]
        pub title: Option<String>,
        #[serde(default)]
        pub place_answer_sources: Option<PlaceAnswerSources>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct PlaceAnswerSources {
        #[serde(default)]
        pub review_snippets: Vec<ReviewSnippet>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct ReviewSnippet {
        #[serde(default)]
        pub snippet: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorEnvelope {
        pub error: ErrorBody,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub status: String,
        #[serde(default)]
        pub details: Vec<serde_json::Value>,
    }
}

fn user_text(text: String) -> Content {
    Content {
        role: Some("user".to_string()),
        parts: vec![Part { text: Some(text) }],
    }
}

/// Summary request: the prompt alone, no tools.
#[must_use]
pub fn build_summary_request(snapshot: &InventorySnapshot) -> GenerateRequest {
    GenerateRequest {
        contents: vec![user_text(summary_prompt(snapshot))],
        tools: Vec::new(),
        tool_config: None,
    }
}

/// Location request: maps grounding enabled, position attached when known.
#[must_use]
pub fn build_location_request(query: &str, coordinates: Option<Coordinates>) -> GenerateRequest {
    GenerateRequest {
        contents: vec![user_text(location_prompt(query, coordinates))],
        tools: vec![Tool {
            google_maps: GoogleMaps::default(),
        }],
        tool_config: coordinates.map(|c| ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: c.latitude,
                    longitude: c.longitude,
                },
            },
        }),
    }
}

/// Concatenated text parts of the first candidate; empty when there is none.
#[must_use]
pub fn parse_response_text(response: &GenerateResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Citations of the first candidate. Chunks without a URI are skipped.
#[must_use]
pub fn parse_grounding_links(response: &GenerateResponse) -> Vec<GroundingLink> {
    let Some(metadata) = response
        .candidates
        .first()
        .and_then(|candidate| candidate.grounding_metadata.as_ref())
    else {
        return Vec::new();
    };

    metadata
        .grounding_chunks
        .iter()
        .filter_map(|chunk| chunk.maps.as_ref().or(chunk.web.as_ref()))
        .filter_map(|source| {
            let uri = source.uri.clone()?;
            let snippet = source
                .place_answer_sources
                .as_ref()
                .and_then(|sources| sources.review_snippets.first())
                .and_then(|review| review.snippet.clone());
            Some(GroundingLink {
                uri,
                title: source.title.clone(),
                snippet,
            })
        })
        .collect()
}

/// Maps a failed HTTP exchange onto a [`GatewayError`].
///
/// Rejected keys, missing permissions and billing problems mean the user has
/// to pick a different key, so they become
/// [`GatewayError::AuthorizationRequired`]. Everything else is reported as
/// [`GatewayError::Http`].
#[must_use]
pub fn classify_error(status: u16, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|envelope| envelope.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    let needs_key = matches!(status, 401 | 403)
        || parsed.as_ref().is_some_and(|envelope| {
            envelope.error.status == "PERMISSION_DENIED"
                || envelope.error.status == "UNAUTHENTICATED"
                || envelope
                    .error
                    .details
                    .iter()
                    .any(|d| d.to_string().contains("API_KEY_INVALID"))
        })
        || message.contains("API key not valid")
        || message.to_lowercase().contains("billing");

    if needs_key {
        GatewayError::AuthorizationRequired { message }
    } else {
        GatewayError::Http { status, message }
    }
}

/// HTTP client for the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Transport failure without the request URL.
fn transport_error(error: reqwest::Error) -> GatewayError {
    GatewayError::Transport(error.without_url().to_string())
}

impl GeminiClient {
    /// Client for `config` authenticated with `api_key`
    #[must_use]
    pub fn new(api_key: String, config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Client using `GEMINI_API_KEY` (or `API_KEY`), `None` when neither is set
    #[must_use]
    pub fn from_env(config: &GatewayConfig) -> Option<Self> {
        std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::new(key, config))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GatewayError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(transport_error)?;
        debug!("generateContent answered {status}");

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl InsightProvider for GeminiClient {
    async fn inventory_summary(
        &self,
        snapshot: &InventorySnapshot,
    ) -> Result<String, GatewayError> {
        let response = self.generate(&build_summary_request(snapshot)).await?;
        Ok(parse_response_text(&response))
    }

    async fn location_insights(
        &self,
        query: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<LocationInsight, GatewayError> {
        let response = self
            .generate(&build_location_request(query, coordinates))
            .await?;
        Ok(LocationInsight {
            text: parse_response_text(&response),
            links: parse_grounding_links(&response),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_location_request_shape() {
        let request = build_location_request(
            "lojas de ração",
            Some(Coordinates {
                latitude: -15.0,
                longitude: -47.5,
            }),
        );
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["tools"], json!([{ "googleMaps": {} }]));
        assert_eq!(
            body["toolConfig"]["retrievalConfig"]["latLng"],
            json!({ "latitude": -15.0, "longitude": -47.5 })
        );
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn test_location_request_without_position() {
        let body = serde_json::to_value(build_location_request("x", None)).unwrap();
        assert!(body.get("toolConfig").is_none());
        assert!(body.get("tools").is_some());
    }

    #[test]
    fn test_summary_request_has_no_tools() {
        let snapshot = InventorySnapshot {
            farm_name: "Sítio".to_string(),
            categories: Vec::new(),
            items: Vec::new(),
        };
        let body = serde_json::to_value(build_summary_request(&snapshot)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .contains("Sítio")
        );
    }

    #[test]
    fn test_parse_text_and_links() {
        let response = response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Há duas " }, { "text": "lojas." }] },
                "groundingMetadata": { "groundingChunks": [
                    { "maps": {
                        "uri": "https://maps.google.com/?cid=1",
                        "title": "Agropecuária Central",
                        "placeAnswerSources": { "reviewSnippets": [{ "snippet": "Ótimo atendimento" }] }
                    } },
                    { "web": { "uri": "https://example.com", "title": "Guia" } },
                    { "maps": { "title": "sem link" } }
                ] }
            }]
        }));

        assert_eq!(parse_response_text(&response), "Há duas lojas.");
        let links = parse_grounding_links(&response);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title.as_deref(), Some("Agropecuária Central"));
        assert_eq!(links[0].snippet.as_deref(), Some("Ótimo atendimento"));
        assert_eq!(links[1].uri, "https://example.com");
        assert!(links[1].snippet.is_none());
    }

    #[test]
    fn test_empty_response_is_empty_text() {
        let empty = response(json!({}));
        assert_eq!(parse_response_text(&empty), "");
        assert!(parse_grounding_links(&empty).is_empty());
    }

    #[test]
    fn test_classify_invalid_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(
            classify_error(400, body),
            GatewayError::AuthorizationRequired {
                message: "API key not valid. Please pass a valid API key.".to_string()
            }
        );
        assert!(matches!(
            classify_error(403, "forbidden"),
            GatewayError::AuthorizationRequired { .. }
        ));
    }

    #[test]
    fn test_classify_other_errors() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        assert_eq!(
            classify_error(503, body),
            GatewayError::Http {
                status: 503,
                message: "The model is overloaded.".to_string()
            }
        );
        assert_eq!(
            classify_error(500, " oops "),
            GatewayError::Http {
                status: 500,
                message: "oops".to_string()
            }
        );
    }

    #[test]
    fn test_endpoint_format() {
        let client = GeminiClient::new(
            "k".to_string(),
            &GatewayConfig {
                model: "gemini-2.5-flash".to_string(),
                base_url: "https://example.test/v1beta/".to_string(),
            },
        );
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_reveal_the_key() {
        let client = GeminiClient::new(
            "SECRET-KEY-123".to_string(),
            &GatewayConfig {
                model: "m".to_string(),
                base_url: "http://127.0.0.1:1".to_string(),
            },
        );
        let snapshot = InventorySnapshot {
            farm_name: "Sítio".to_string(),
            categories: Vec::new(),
            items: Vec::new(),
        };

        let error = client.inventory_summary(&snapshot).await.unwrap_err();

        assert!(matches!(error, GatewayError::Transport(_)));
        assert!(!error.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{client:?}").contains("SECRET-KEY-123"));
    }
}
