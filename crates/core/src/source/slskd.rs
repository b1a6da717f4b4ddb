//! slskd source network backend implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::SourceConfig;

use super::{PeerFile, PeerResponse, SearchStatus, SourceError, SourceNetwork, TransferFile};

/// slskd REST API client.
pub struct SlskdClient {
    client: Client,
    config: SourceConfig,
}

impl SlskdClient {
    /// Create a new SlskdClient with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self { client, config })
    }

    /// Build an API URL under `/api/v0`.
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.config.api_key.is_empty() {
            request
        } else {
            request.header("X-API-Key", &self.config.api_key)
        }
    }

    async fn check(&self, response: Response, search_id: Option<&str>) -> Result<Response, SourceError> {
        let status = response.status();
        if status == 404 {
            if let Some(id) = search_id {
                return Err(SourceError::SearchNotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl SourceNetwork for SlskdClient {
    fn name(&self) -> &str {
        "slskd"
    }

    async fn start_search(&self, text: &str) -> Result<String, SourceError> {
        let id = Uuid::new_v4().to_string();
        debug!(search_id = %id, text = text, "Starting slskd search");

        let body = SlskdSearchRequest {
            id: id.clone(),
            search_text: text.to_string(),
        };
        let response = self
            .authorized(self.client.post(self.api_url("searches")))
            .json(&body)
            .send()
            .await?;
        self.check(response, None).await?;

        Ok(id)
    }

    async fn search_status(&self, search_id: &str) -> Result<SearchStatus, SourceError> {
        let url = self.api_url(&format!("searches/{}", urlencoding::encode(search_id)));
        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = self.check(response, Some(search_id)).await?;

        let search: SlskdSearch = response
            .json()
            .await
            .map_err(|e| SourceError::ApiError(format!("Failed to parse search: {}", e)))?;

        Ok(SearchStatus {
            is_complete: search.is_complete,
            state: search.state,
            response_count: search.response_count,
        })
    }

    async fn search_responses(&self, search_id: &str) -> Result<Vec<PeerResponse>, SourceError> {
        let url = self.api_url(&format!(
            "searches/{}/responses",
            urlencoding::encode(search_id)
        ));
        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = self.check(response, Some(search_id)).await?;

        let responses: Vec<SlskdResponse> = response
            .json()
            .await
            .map_err(|e| SourceError::ApiError(format!("Failed to parse responses: {}", e)))?;

        debug!(
            search_id = search_id,
            responses = responses.len(),
            "Fetched slskd responses"
        );

        Ok(responses.into_iter().map(PeerResponse::from).collect())
    }

    async fn queue_transfer(
        &self,
        username: &str,
        files: &[TransferFile],
    ) -> Result<(), SourceError> {
        let url = self.api_url(&format!(
            "transfers/downloads/{}",
            urlencoding::encode(username)
        ));
        debug!(username = username, files = files.len(), "Queueing slskd transfer");

        let response = self
            .authorized(self.client.post(&url))
            .json(files)
            .send()
            .await?;
        self.check(response, None).await?;

        Ok(())
    }
}

// slskd API types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlskdSearchRequest {
    id: String,
    search_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlskdSearch {
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    state: String,
    #[serde(default)]
    response_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlskdResponse {
    username: String,
    #[serde(default)]
    has_free_upload_slot: bool,
    #[serde(default)]
    upload_speed: u64,
    #[serde(default)]
    queue_length: u64,
    #[serde(default)]
    files: Vec<SlskdFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlskdFile {
    filename: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    bit_rate: Option<u32>,
    #[serde(default)]
    extension: Option<String>,
}

impl From<SlskdResponse> for PeerResponse {
    fn from(r: SlskdResponse) -> Self {
        PeerResponse {
            username: r.username,
            has_free_upload_slot: r.has_free_upload_slot,
            upload_speed: r.upload_speed,
            queue_length: r.queue_length,
            files: r
                .files
                .into_iter()
                .map(|f| PeerFile {
                    filename: f.filename,
                    size: f.size,
                    bit_rate: f.bit_rate,
                    extension: f.extension.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> SlskdClient {
        SlskdClient::new(SourceConfig {
            url: url.to_string(),
            api_key: "key".to_string(),
            timeout_secs: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let client = client("http://localhost:5030/");
        assert_eq!(
            client.api_url("searches"),
            "http://localhost:5030/api/v0/searches"
        );
    }

    #[test]
    fn test_search_request_serialization() {
        let body = SlskdSearchRequest {
            id: "abc".to_string(),
            search_text: "The Beatles Abbey Road".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"searchText\":\"The Beatles Abbey Road\""));
    }

    #[test]
    fn test_search_status_parsing() {
        let json = r#"{"id":"abc","isComplete":true,"state":"Completed, TimedOut",
                       "responseCount":12,"fileCount":340}"#;
        let search: SlskdSearch = serde_json::from_str(json).unwrap();
        assert!(search.is_complete);
        assert_eq!(search.state, "Completed, TimedOut");
        assert_eq!(search.response_count, 12);
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"[{
            "username": "peer1",
            "hasFreeUploadSlot": true,
            "uploadSpeed": 1048576,
            "queueLength": 0,
            "files": [
                {"filename": "Music\\Beatles\\Abbey Road\\01 Come Together.flac",
                 "size": 30000000, "bitRate": 1000, "extension": "flac"},
                {"filename": "Music\\Beatles\\Abbey Road\\cover.jpg", "size": 200000}
            ]
        }]"#;
        let parsed: Vec<SlskdResponse> = serde_json::from_str(json).unwrap();
        let responses: Vec<PeerResponse> = parsed.into_iter().map(PeerResponse::from).collect();

        assert_eq!(responses[0].username, "peer1");
        assert!(responses[0].has_free_upload_slot);
        assert_eq!(responses[0].upload_speed, 1048576);
        assert_eq!(responses[0].files.len(), 2);
        assert_eq!(responses[0].files[0].bit_rate, Some(1000));
        assert_eq!(responses[0].files[1].extension, "");
    }
}
