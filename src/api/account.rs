// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, registration, logout and account deletion.
//!
//! These are the only flows besides the pipeline's refresh step that write
//! to the token store.

use tracing::info;

use super::{user_path, ApiClient, ApiRequest, TOKEN_PATH, USERS_PATH};
use crate::error::ClientError;
use crate::models::{Credentials, Registration, SessionPatch, TokenPair, UserProfile};

impl ApiClient {
    /// Exchange credentials for a token pair and store it.
    ///
    /// Bad credentials surface as `Unauthorized`; stored tokens are left
    /// untouched in that case.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .pipeline()
            .send_public(ApiRequest::post(TOKEN_PATH, &credentials)?)
            .await?;
        let pair: TokenPair = response.json()?;

        self.tokens().set(SessionPatch::pair(pair));
        info!(username = %username, "Logged in");
        Ok(())
    }

    /// Create an account and log straight into it.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let registration = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .pipeline()
            .send_public(ApiRequest::post(USERS_PATH, &registration)?)
            .await?;
        let profile: UserProfile = response.json()?;
        info!(user_id = profile.id, username = %profile.username, "Registered account");

        self.login(username, password).await?;
        Ok(profile)
    }

    /// Forget the local session. No network call is made.
    pub fn logout(&self) {
        self.tokens().clear();
        info!("Logged out");
    }

    /// Delete the account server-side, then forget the local session.
    pub async fn delete_account(&self, user_id: i64) -> Result<(), ClientError> {
        self.pipeline()
            .send(ApiRequest::delete(user_path(user_id)))
            .await?;
        self.tokens().clear();
        info!(user_id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestPipeline;
    use crate::models::Session;
    use crate::storage::TokenStore;
    use crate::test_support::{FakeJournalApi, MockTransport, TEST_PASSWORD, TEST_USERNAME};
    use reqwest::Method;
    use std::sync::Arc;

    fn client(api: &Arc<FakeJournalApi>) -> (ApiClient, Arc<MockTransport>) {
        let transport = Arc::new(api.transport());
        let tokens = Arc::new(TokenStore::in_memory());
        let pipeline = Arc::new(RequestPipeline::new(transport.clone(), tokens));
        (ApiClient::new(pipeline), transport)
    }

    #[tokio::test]
    async fn login_stores_token_pair() {
        let api = FakeJournalApi::new();
        let (client, transport) = client(&api);

        client.login(TEST_USERNAME, TEST_PASSWORD).await.unwrap();
        assert_eq!(client.tokens().get(), Session::new("access-1", "refresh-1"));
        assert!(transport.calls()[0].bearer.is_none());
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized_and_keep_session() {
        let api = FakeJournalApi::new();
        let (client, _) = client(&api);
        client.tokens().set(SessionPatch::access("previous"));

        let err = client.login(TEST_USERNAME, "wrong").await.unwrap_err();
        assert_eq!(err, ClientError::Unauthorized);
        assert_eq!(client.tokens().get().access_token.as_deref(), Some("previous"));
    }

    #[tokio::test]
    async fn register_then_login() {
        let api = FakeJournalApi::new();
        let (client, transport) = client(&api);

        let profile = client
            .register("bob", "bob@example.com", "Hunter22!")
            .await
            .unwrap();
        assert_eq!(profile.username, "bob");
        assert_eq!(profile.email, "bob@example.com");
        assert_eq!(client.tokens().get(), Session::new("access-1", "refresh-1"));
        assert_eq!(transport.count(Method::POST, USERS_PATH), 1);
        assert_eq!(transport.count(Method::POST, TOKEN_PATH), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_is_validation_error() {
        let api = FakeJournalApi::new();
        let (client, transport) = client(&api);

        let err = client
            .register(TEST_USERNAME, "alice@example.com", TEST_PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation { status: 400, .. }));
        assert_eq!(transport.count(Method::POST, TOKEN_PATH), 0);
    }

    #[tokio::test]
    async fn logout_is_local() {
        let api = FakeJournalApi::new();
        let (client, transport) = client(&api);
        client.login(TEST_USERNAME, TEST_PASSWORD).await.unwrap();

        client.logout();
        assert!(client.tokens().get().is_logged_out());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn delete_account_clears_session() {
        let api = FakeJournalApi::new();
        let (client, transport) = client(&api);
        client.login(TEST_USERNAME, TEST_PASSWORD).await.unwrap();

        client.delete_account(1).await.unwrap();
        assert!(client.tokens().get().is_logged_out());
        assert_eq!(transport.count(Method::DELETE, "users/1/"), 1);
    }
}
