use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("directory API request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Client for the user/post directory REST service: `GET`/`POST /users`
/// and `GET`/`POST /posts`. Record ids are minted client-side, matching
/// what the service expects on create.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct NewUser<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    id: String,
    title: &'a str,
    content: &'a str,
    author_id: &'a str,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{trimmed}/{path}")
    }

    pub async fn list_users(&self) -> Result<Value, ApiError> {
        let url = self.endpoint("/users");
        debug!(%url, "Fetching user directory");
        let users = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(users)
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Result<Value, ApiError> {
        let url = self.endpoint("/users");
        info!(%url, name, "Creating user");
        let created = self
            .http
            .post(url)
            .json(&NewUser {
                id: Uuid::new_v4().to_string(),
                name,
                email,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created)
    }

    pub async fn list_posts(&self) -> Result<Value, ApiError> {
        let url = self.endpoint("/posts");
        debug!(%url, "Fetching posts");
        let posts = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(posts)
    }

    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        author_id: &str,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint("/posts");
        info!(%url, title, "Creating post");
        let created = self
            .http
            .post(url)
            .json(&NewPost {
                id: Uuid::new_v4().to_string(),
                title,
                content,
                author_id,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created)
    }
}
