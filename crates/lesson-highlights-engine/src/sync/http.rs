use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::models::LessonId;
use crate::sync::wire::ReplaceRequest;
use crate::sync::{HighlightStore, StoredHighlights, SyncError};

/// Highlight backend over HTTP.
///
/// `GET {base}/highlights?lesson_id=..` loads, `POST {base}/highlights`
/// replaces. The bearer token identifies the user.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2).min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/highlights", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn check_status(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}

impl HighlightStore for HttpStore {
    fn load(&self, lesson: &LessonId) -> Result<StoredHighlights, SyncError> {
        let request = self
            .client
            .get(self.endpoint())
            .query(&[("lesson_id", lesson.as_str())]);
        let response = check_status(self.authorized(request).send()?)?;
        let text = response.text()?;
        if text.trim().is_empty() || text.trim() == "null" {
            return Ok(StoredHighlights::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn replace(&self, lesson: &LessonId, document: &StoredHighlights) -> Result<(), SyncError> {
        let body = ReplaceRequest {
            lesson_id: lesson,
            payload: document,
        };
        let request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body);
        check_status(self.authorized(request).send()?)?;
        Ok(())
    }
}
