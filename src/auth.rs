use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::HttpCatalogClient;
use crate::error::{ApiError, ApiResult};
use crate::models::Credentials;

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token and persists it for later requests.
    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<String>;
    async fn sign_up(&self, credentials: &Credentials) -> ApiResult<Value>;
    fn sign_out(&self) -> ApiResult<()>;
    fn is_signed_in(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

fn validate(credentials: &Credentials) -> ApiResult<()> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }
    Ok(())
}

#[async_trait]
impl AuthApi for HttpCatalogClient {
    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<String> {
        validate(credentials)?;
        let req = self.request(Method::POST, "/signin").json(credentials);
        let res: SignInResponse = self.send_json(req, "sign in").await?;
        let token = res.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ApiError::validation(
                res.msg
                    .unwrap_or_else(|| "Sign-in response carried no token".to_string()),
            )
        })?;
        self.tokens()
            .save(&token)
            .map_err(|e| ApiError::validation(format!("Failed to store token: {e:#}")))?;
        info!("Signed in as {}", credentials.username);
        Ok(token)
    }

    async fn sign_up(&self, credentials: &Credentials) -> ApiResult<Value> {
        validate(credentials)?;
        let req = self.request(Method::POST, "/signup").json(credentials);
        let res: Value = self.send_json(req, "sign up").await?;
        info!("Registered {}", credentials.username);
        Ok(res)
    }

    fn sign_out(&self) -> ApiResult<()> {
        self.tokens().clear().map_err(|e| {
            warn!("Failed to clear token: {:#}", e);
            ApiError::validation(format!("Failed to clear token: {e:#}"))
        })
    }

    fn is_signed_in(&self) -> bool {
        self.tokens().load().is_some_and(|t| !t.trim().is_empty())
    }
}
