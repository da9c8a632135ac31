use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AuthBackend, AuthError, AuthUser, Session, SignUpResult};

const AUTH_PATH: &str = "/auth/v1";

/// The auth service reports failures under several different keys.
#[derive(Debug, Deserialize)]
struct GoTrueErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Client for the hosted auth service (GoTrue API).
#[derive(Clone)]
pub struct GoTrueAuth {
    client: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
}

impl GoTrueAuth {
    pub fn new(base_url: Option<String>, anon_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            anon_key,
        }
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, AuthError> {
        let (base_url, anon_key) = self.endpoint()?;
        Ok(self
            .client
            .post(format!("{base_url}{AUTH_PATH}{path}"))
            .header("apikey", anon_key))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, AuthError> {
        let (base_url, anon_key) = self.endpoint()?;
        Ok(self
            .client
            .get(format!("{base_url}{AUTH_PATH}{path}"))
            .header("apikey", anon_key))
    }

    fn endpoint(&self) -> Result<(&str, &str), AuthError> {
        match (&self.base_url, &self.anon_key) {
            (Some(url), Some(key)) => Ok((url.as_str(), key.as_str())),
            _ => Err(AuthError::NotConfigured),
        }
    }
}

async fn check(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("Auth service returned {}: {}", status, body);
    let message = serde_json::from_str::<GoTrueErrorBody>(&body)
        .ok()
        .and_then(GoTrueErrorBody::into_message)
        .unwrap_or(body);
    Err(AuthError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let body = check(response).await?.text().await?;
    serde_json::from_str(&body).map_err(AuthError::Parse)
}

/// Sign-up answers with a session when confirmation is disabled and with a
/// bare user object otherwise.
fn parse_sign_up(body: Value) -> Result<SignUpResult, AuthError> {
    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body)?;
        return Ok(SignUpResult {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }
    if let Some(user) = body.get("user").filter(|u| !u.is_null()) {
        return Ok(SignUpResult {
            user: Some(serde_json::from_value(user.clone())?),
            session: None,
        });
    }
    let user = body
        .get("id")
        .map(|_| serde_json::from_value::<AuthUser>(body.clone()))
        .transpose()?;
    Ok(SignUpResult {
        user,
        session: None,
    })
}

#[async_trait]
impl AuthBackend for GoTrueAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_data: Option<Value>,
    ) -> Result<SignUpResult, AuthError> {
        debug!("sign-up for {email}");
        let body = json!({
            "email": email,
            "password": password,
            "data": user_data.unwrap_or_else(|| json!({})),
        });
        let response = self.post("/signup")?.json(&body).send().await?;
        parse_sign_up(decode(response).await?)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!("password sign-in for {email}");
        let response = self
            .post("/token?grant_type=password")?
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        decode(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .post("/logout")?
            .bearer_auth(access_token)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        debug!("password reset requested for {email}");
        let response = self
            .post("/recover")?
            .json(&json!({ "email": email }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let response = self.get("/user")?.bearer_auth(access_token).send().await?;
        decode(response).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .post("/token?grant_type=refresh_token")?
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        decode(response).await
    }
}
