use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::auth::responses::{
    AccountView, AuthResponse, LoginRequest, ProfileResponse, RegisterRequest,
};
use crate::client::{ClientError, ClientResult};
use crate::error::ErrorEnvelope;

/// The three calls a client can make against the auth API.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, payload: &RegisterRequest) -> ClientResult<AuthResponse>;

    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse>;

    async fn profile(&self, token: &str) -> ClientResult<AccountView>;
}

/// `reqwest`-backed binding. Every call is made once; failures are not retried.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    base_url: String,
    http: Client,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url: base,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn register(&self, payload: &RegisterRequest) -> ClientResult<AuthResponse> {
        let response = self.http.post(self.url("register")).json(payload).send().await?;
        decode(response).await
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.http.post(self.url("login")).json(&payload).send().await?;
        decode(response).await
    }

    async fn profile(&self, token: &str) -> ClientResult<AccountView> {
        let response = self
            .http
            .get(self.url("profile"))
            .bearer_auth(token)
            .send()
            .await?;
        let body: ProfileResponse = decode(response).await?;
        Ok(body.user)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    log::debug!("auth api returned {}: {}", status.as_u16(), message);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
