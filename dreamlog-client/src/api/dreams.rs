//! `/dreams` endpoints.

use async_trait::async_trait;
use chrono::NaiveDate;
use dreamlog_core::{
    Dream, DreamRequest, DreamStatistics, DreamType, FavoriteToggle, GenerationTicket,
    PageResponse, SummaryStatus,
};
use tracing::instrument;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::poller::{JobSource, JobStatus};
use crate::request::ApiRequest;

/// Default page size of list calls.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// ============================================================================
// List Query
// ============================================================================

/// Filters for `GET /dreams`.
///
/// `page` is 0-based here; the backend counts from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// 0-based page index.
    pub page: u32,
    /// Items per page.
    pub size: u32,
    /// Full-text filter.
    pub keyword: Option<String>,
    /// Earliest dream date.
    pub start_date: Option<NaiveDate>,
    /// Latest dream date.
    pub end_date: Option<NaiveDate>,
    /// Kind of dream.
    pub dream_type: Option<DreamType>,
    /// Only favorites (or only non-favorites).
    pub is_favorite: Option<bool>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            keyword: None,
            start_date: None,
            end_date: None,
            dream_type: None,
            is_favorite: None,
        }
    }
}

impl ListQuery {
    /// Builds the request for this query.
    pub fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::get("/dreams")
            .with_query("page", self.page + 1)
            .with_query("size", self.size);

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            request = request.with_query("keyword", keyword);
        }
        if let Some(start) = self.start_date {
            request = request.with_query("startDate", start.format("%Y-%m-%d"));
        }
        if let Some(end) = self.end_date {
            request = request.with_query("endDate", end.format("%Y-%m-%d"));
        }
        if let Some(kind) = self.dream_type {
            request = request.with_query("dreamType", kind.as_str());
        }
        if let Some(favorite) = self.is_favorite {
            request = request.with_query("isFavorite", favorite);
        }
        request
    }
}

// ============================================================================
// Dream Api
// ============================================================================

/// Typed access to the dream journal endpoints.
#[derive(Debug, Clone)]
pub struct DreamApi {
    client: ApiClient,
}

impl DreamApi {
    /// Wraps `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /dreams`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn list(&self, query: &ListQuery) -> Result<PageResponse<Dream>, ApiError> {
        self.client.send(query.to_request()).await
    }

    /// `GET /dreams/{id}`, including the analysis if any.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Dream, ApiError> {
        self.client.get(&format!("/dreams/{id}")).await
    }

    /// `POST /dreams`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self, dream), fields(title = %dream.title))]
    pub async fn create(&self, dream: &DreamRequest) -> Result<Dream, ApiError> {
        self.client.post("/dreams", dream).await
    }

    /// `PUT /dreams/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self, dream))]
    pub async fn update(&self, id: i64, dream: &DreamRequest) -> Result<Dream, ApiError> {
        self.client.put(&format!("/dreams/{id}"), dream).await
    }

    /// `DELETE /dreams/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .send_empty(ApiRequest::delete(format!("/dreams/{id}")))
            .await
    }

    /// `PUT /dreams/{id}/favorite`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&self, id: i64) -> Result<FavoriteToggle, ApiError> {
        self.client
            .send(ApiRequest::put(format!("/dreams/{id}/favorite")))
            .await
    }

    /// `GET /dreams/favorites`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn favorites(&self) -> Result<Vec<Dream>, ApiError> {
        self.client.get("/dreams/favorites").await
    }

    /// `POST /dreams/{id}/ai-summary/regenerate`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn regenerate_summary(&self, id: i64) -> Result<GenerationTicket, ApiError> {
        self.client
            .send(ApiRequest::post(format!("/dreams/{id}/ai-summary/regenerate")))
            .await
    }

    /// `GET /dreams/statistics`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<DreamStatistics, ApiError> {
        self.client.get("/dreams/statistics").await
    }

    /// `GET /dreams/search?keyword=`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<Dream>, ApiError> {
        self.client
            .send(ApiRequest::get("/dreams/search").with_query("keyword", keyword))
            .await
    }
}

// ============================================================================
// Analysis Jobs
// ============================================================================

/// A dream's analysis is a pollable job: regenerate starts it, reading the
/// dream reports on it.
#[async_trait]
impl JobSource for DreamApi {
    type Resource = Dream;

    async fn start(&self, id: i64) -> Result<(), ApiError> {
        self.regenerate_summary(id).await.map(drop)
    }

    async fn fetch(&self, id: i64) -> Result<Dream, ApiError> {
        self.get(id).await
    }

    fn status(&self, dream: &Dream) -> JobStatus {
        let Some(summary) = &dream.ai_summary else {
            return JobStatus::Pending;
        };
        match summary.status {
            SummaryStatus::Pending => JobStatus::Pending,
            SummaryStatus::Completed => JobStatus::Completed,
            SummaryStatus::Failed => JobStatus::Failed(summary.error_message.clone()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JOB_FAILED_MESSAGE;
    use crate::host::{Credential, CredentialStore, MemoryCredentialStore};
    use crate::poller::{JobPoller, PollOptions};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dream_json(summary: serde_json::Value) -> serde_json::Value {
        json!({
            "code": 200,
            "data": {
                "id": 42,
                "title": "Falling",
                "content": "Down a well",
                "dreamDate": "2024-03-01",
                "dreamType": "NIGHTMARE",
                "aiSummary": summary
            }
        })
    }

    fn fast() -> PollOptions {
        PollOptions::default()
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(3)
    }

    async fn api(server: &MockServer) -> DreamApi {
        DreamApi::new(
            ApiClient::builder(format!("{}/api", server.uri()))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_list_query_maps_page_to_one_based() {
        let query = ListQuery {
            page: 2,
            keyword: Some("sea".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            dream_type: Some(DreamType::Lucid),
            is_favorite: Some(true),
            ..ListQuery::default()
        };
        let request = query.to_request();
        let params: Vec<(&str, &str)> = request
            .query()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        assert_eq!(
            params,
            vec![
                ("page", "3"),
                ("size", "10"),
                ("keyword", "sea"),
                ("startDate", "2024-01-05"),
                ("dreamType", "LUCID"),
                ("isFavorite", "true"),
            ]
        );
    }

    #[test]
    fn test_empty_keyword_is_omitted() {
        let query = ListQuery {
            keyword: Some(String::new()),
            ..ListQuery::default()
        };
        assert!(query.to_request().query().iter().all(|(k, _)| k != "keyword"));
    }

    #[tokio::test]
    async fn test_list_sends_wire_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dreams"))
            .and(query_param("page", "1"))
            .and(query_param("size", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "data": {
                    "content": [],
                    "totalElements": 0,
                    "totalPages": 0,
                    "currentPage": 1,
                    "pageSize": 10,
                    "hasNext": false,
                    "hasPrevious": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = api(&server).await.list(&ListQuery::default()).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.page_index(), 0);
    }

    #[test]
    fn test_status_of_missing_summary_is_pending() {
        let api = DreamApi::new(ApiClient::builder("http://localhost/api").build().unwrap());
        let dream: Dream = serde_json::from_value(json!({
            "id": 1, "title": "t", "dreamDate": "2024-03-01"
        }))
        .unwrap();
        assert_eq!(api.status(&dream), JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_analysis_completes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/dreams/42/ai-summary/regenerate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 200, "data": {"status": "PENDING", "estimatedTime": 10}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dreams/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dream_json(json!({"status": "PENDING"}))))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dreams/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dream_json(json!({
                "status": "COMPLETED",
                "summary": "A fear of losing control"
            }))))
            .mount(&server)
            .await;

        let poller = JobPoller::new(api(&server).await, fast());
        let dream = poller
            .poll_until_terminal(42, &CancellationToken::new())
            .await
            .unwrap();

        let summary = dream.ai_summary.unwrap();
        assert_eq!(summary.status, SummaryStatus::Completed);
        assert_eq!(summary.summary.as_deref(), Some("A fear of losing control"));
    }

    #[tokio::test]
    async fn test_expired_token_mid_analysis_refreshes_and_keeps_polling() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential {
            access_token: Some("old".to_string()),
            refresh_token: Some("r1".to_string()),
            identity: None,
        }));
        let client = ApiClient::builder(format!("{}/api", server.uri()))
            .credentials(store.clone())
            .build()
            .unwrap();

        Mock::given(method("POST"))
            .and(path("/api/dreams/42/ai-summary/regenerate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 200, "data": {"status": "PENDING"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dreams/42"))
            .and(header("authorization", "Bearer old"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"accessToken": "new", "refreshToken": "r2"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dreams/42"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dream_json(json!({"status": "PENDING"}))))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dreams/42"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dream_json(json!({
                "status": "COMPLETED",
                "summary": "Searching for a way out"
            }))))
            .mount(&server)
            .await;

        let options = PollOptions::default()
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(5);
        let poller = JobPoller::new(DreamApi::new(client.clone()), options);
        let dream = poller
            .poll_until_terminal(42, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(dream.ai_summary.unwrap().status, SummaryStatus::Completed);
        assert_eq!(client.refresh_exchanges(), 1);
        assert_eq!(store.access_token().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_analysis_failure_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dreams/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dream_json(json!({
                "status": "FAILED"
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let poller = JobPoller::new(api(&server).await, fast());
        let err = poller
            .wait_until_terminal(42, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(&err, ApiError::JobFailed(m) if m == JOB_FAILED_MESSAGE));
    }
}
