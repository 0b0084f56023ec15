//! HTTP client for the console backend

use crate::{ApiResponse, ClientConfig, ClientError, ClientResult, LoginResponse, MenuListResponse};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::client::LoginRequest;

/// Login endpoint
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Logout endpoint
pub const LOGOUT_PATH: &str = "/api/auth/logout";
/// "List my granted menus" endpoint
pub const MENU_LIST_PATH: &str = "/api/menu/list";

/// HTTP client for making network requests to the console backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Build authorization header value
    fn auth_header(&self, token: Option<&str>) -> Option<String> {
        token
            .or(self.token.as_deref())
            .map(|t| format!("Bearer {}", t))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Make a GET request, optionally overriding the bearer token
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<T> {
        let mut request = self.client.get(self.url(path));

        if let Some(auth) = self.auth_header(token) {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);

        if let Some(auth) = self.auth_header(None) {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path));

        if let Some(auth) = self.auth_header(None) {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(text)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Auth API ==========

    /// Login with username and password
    ///
    /// A 401 here means bad credentials rather than a bad token.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let envelope = self
            .post::<ApiResponse<LoginResponse>, _>(LOGIN_PATH, &request)
            .await
            .map_err(|e| match e {
                ClientError::Unauthorized => ClientError::InvalidCredentials,
                other => other,
            })?;
        into_data(envelope, "login")
    }

    /// Logout
    pub async fn logout(&mut self) -> ClientResult<()> {
        let envelope = self.post_empty::<ApiResponse<()>>(LOGOUT_PATH).await?;
        if !envelope.is_success() {
            return Err(api_error(&envelope));
        }
        self.token = None;
        Ok(())
    }

    // ========== Menu API ==========

    /// Fetch the menu tree granted to the principal holding `token`
    pub async fn granted_menus(&self, token: &str) -> ClientResult<MenuListResponse> {
        let envelope = self
            .get::<ApiResponse<MenuListResponse>>(MENU_LIST_PATH, Some(token))
            .await?;
        let menus = into_data(envelope, "menu list")?;
        tracing::debug!(roots = menus.len(), "Granted menus fetched");
        Ok(menus)
    }
}

fn api_error<T>(envelope: &ApiResponse<T>) -> ClientError {
    ClientError::Api {
        code: envelope.code.unwrap_or(1),
        message: envelope.message.clone(),
    }
}

/// Unwrap the payload of a successful envelope
fn into_data<T>(envelope: ApiResponse<T>, what: &str) -> ClientResult<T> {
    if !envelope.is_success() {
        return Err(api_error(&envelope));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::InvalidResponse(format!("Missing {} data", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AppError, ErrorCode, MenuNode};

    #[test]
    fn test_url_joining() {
        let client = ClientConfig::new("http://localhost:8080/")
            .build_http_client()
            .unwrap();
        assert_eq!(client.url(MENU_LIST_PATH), "http://localhost:8080/api/menu/list");
    }

    #[test]
    fn test_auth_header_prefers_explicit_token() {
        let client = ClientConfig::new("http://localhost:8080")
            .with_token("config-token")
            .build_http_client()
            .unwrap();
        assert_eq!(
            client.auth_header(Some("session-token")).as_deref(),
            Some("Bearer session-token")
        );
        assert_eq!(
            client.auth_header(None).as_deref(),
            Some("Bearer config-token")
        );
    }

    #[test]
    fn test_into_data_success() {
        let envelope = ApiResponse::success(vec![MenuNode::new(1, "home")]);
        let menus = into_data(envelope, "menu list").unwrap();
        assert_eq!(menus.len(), 1);
    }

    #[test]
    fn test_into_data_error_envelope() {
        let envelope: ApiResponse<MenuListResponse> =
            AppError::new(ErrorCode::TokenExpired).into();
        match into_data(envelope, "menu list") {
            Err(ClientError::Api { code, .. }) => assert_eq!(code, 1003),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_into_data_missing_payload() {
        let envelope: ApiResponse<MenuListResponse> = serde_json::from_str(
            r#"{"code":0,"message":"OK"}"#,
        )
        .unwrap();
        assert!(matches!(
            into_data(envelope, "menu list"),
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
