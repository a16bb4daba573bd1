use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::task::{NewTask, TaskPatch};

use super::{StoreError, TaskRow, TaskStore};

const TABLE: &str = "todos";
const SELECT_COLUMNS: &str = "id,title,is_done,category,created_at,order_index";

/// Client for the hosted Postgres REST endpoint, scoped to the task table.
///
/// Every request carries the project's public key plus the signed-in user's
/// access token; row-level security on the service side limits rows to that
/// user.
pub struct SupabaseStore {
    base_url: String,
    anon_key: String,
    access_token: String,
    http: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(base_url: &str, anon_key: &str, access_token: &str) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: access_token.to_string(),
            http,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn select_url(&self) -> String {
        format!(
            "{}?select={}&order=order_index.asc",
            self.table_url(),
            SELECT_COLUMNS
        )
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
    }
}

/// Error body the REST endpoint sends alongside a non-2xx status.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn parse_error_body(status: u16, text: &str) -> StoreError {
    match serde_json::from_str::<ApiError>(text) {
        Ok(body) => {
            log::debug!(
                "{} error {}: code={:?} details={:?} hint={:?}",
                TABLE,
                status,
                body.code,
                body.details,
                body.hint
            );
            StoreError::Http {
                status,
                message: body.message,
                code: body.code,
            }
        }
        Err(_) => StoreError::Http {
            status,
            message: text.to_string(),
            code: None,
        },
    }
}

async fn error_from_response(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    parse_error_body(status, &text)
}

#[async_trait]
impl TaskStore for SupabaseStore {
    async fn select_all(&self) -> Result<Vec<TaskRow>, StoreError> {
        let resp = self
            .request(Method::GET, &self.select_url())
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Fetch failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        resp.json::<Vec<TaskRow>>()
            .await
            .map_err(|e| StoreError::Decode(format!("Failed to parse rows: {}", e)))
    }

    async fn insert(&self, task: &NewTask) -> Result<(), StoreError> {
        let resp = self
            .request(Method::POST, &self.table_url())
            .header("Prefer", "return=minimal")
            .json(task)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Insert failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<(), StoreError> {
        let url = format!("{}?id=eq.{}", self.table_url(), id);
        let resp = self
            .request(Method::PATCH, &url)
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Update failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let url = format!("{}?id=eq.{}", self.table_url(), id);
        let resp = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Delete failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }
}
