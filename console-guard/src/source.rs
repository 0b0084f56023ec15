//! Backend seams: granted menus and the auth exchange

use async_trait::async_trait;
use console_client::{HttpClient, LoginResponse};
use shared::{AppResult, MenuNode};

/// The "list my granted menus" query
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn granted_menus(&self, token: &str) -> AppResult<Vec<MenuNode>>;
}

#[async_trait]
impl MenuSource for HttpClient {
    async fn granted_menus(&self, token: &str) -> AppResult<Vec<MenuNode>> {
        HttpClient::granted_menus(self, token)
            .await
            .map_err(Into::into)
    }
}

/// Login and logout against the backend
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse>;

    /// Invalidate `token` on the backend
    async fn logout(&self, token: &str) -> AppResult<()>;
}

#[async_trait]
impl AuthBackend for HttpClient {
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        HttpClient::login(self, username, password)
            .await
            .map_err(Into::into)
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        let mut client = self.clone().with_token(token);
        HttpClient::logout(&mut client).await.map_err(Into::into)
    }
}
