// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Journal entry CRUD and emotion analysis.

use tracing::debug;

use super::{journal_path, ApiClient, ApiRequest, JOURNALS_PATH};
use crate::error::ClientError;
use crate::models::{EmotionAnalysis, EntryId, JournalEntry, JournalPayload};

impl ApiClient {
    /// All entries owned by the logged-in user.
    pub async fn list_journals(&self) -> Result<Vec<JournalEntry>, ClientError> {
        let entries: Vec<JournalEntry> = self
            .pipeline()
            .send(ApiRequest::get(JOURNALS_PATH))
            .await?
            .json()?;
        debug!(count = entries.len(), "Fetched journal index");
        Ok(entries)
    }

    pub async fn get_journal(&self, id: EntryId) -> Result<JournalEntry, ClientError> {
        self.pipeline()
            .send(ApiRequest::get(journal_path(id)))
            .await?
            .json()
    }

    /// Create an entry. The server assigns the id.
    pub async fn create_journal(&self, payload: &JournalPayload) -> Result<JournalEntry, ClientError> {
        self.pipeline()
            .send(ApiRequest::post(JOURNALS_PATH, payload)?)
            .await?
            .json()
    }

    pub async fn update_journal(
        &self,
        id: EntryId,
        payload: &JournalPayload,
    ) -> Result<JournalEntry, ClientError> {
        self.pipeline()
            .send(ApiRequest::put(journal_path(id), payload)?)
            .await?
            .json()
    }

    pub async fn delete_journal(&self, id: EntryId) -> Result<(), ClientError> {
        self.pipeline()
            .send(ApiRequest::delete(journal_path(id)))
            .await?;
        Ok(())
    }

    /// Ask the server to analyze the stored content of an entry.
    ///
    /// The analysis runs on what the server has, not on unsaved edits.
    pub async fn process_emotions(&self, id: EntryId) -> Result<EmotionAnalysis, ClientError> {
        self.pipeline()
            .send(ApiRequest::post_empty(format!(
                "{}process_emotions/",
                journal_path(id)
            )))
            .await?
            .json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestPipeline;
    use crate::storage::TokenStore;
    use crate::test_support::{FakeJournalApi, MockTransport};
    use reqwest::{Method, StatusCode};
    use std::sync::Arc;

    fn client(api: &Arc<FakeJournalApi>) -> (ApiClient, Arc<MockTransport>) {
        let transport = Arc::new(api.transport());
        let pipeline = Arc::new(RequestPipeline::new(
            transport.clone(),
            Arc::new(TokenStore::in_memory()),
        ));
        (ApiClient::new(pipeline), transport)
    }

    fn payload(title: &str, content: &str) -> JournalPayload {
        JournalPayload {
            title: title.to_string(),
            date: "2025-06-01".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_list() {
        let api = FakeJournalApi::new().with_next_id(42);
        let (client, transport) = client(&api);

        let created = client.create_journal(&payload("", "Hello")).await.unwrap();
        assert_eq!(created.id, EntryId(42));

        let all = client.list_journals().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "Hello");
        assert_eq!(transport.count(Method::POST, "journals/"), 1);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let api = FakeJournalApi::new();
        api.insert(7, "Old", "Old body", "2025-05-01");
        let (client, transport) = client(&api);

        let updated = client
            .update_journal(EntryId(7), &payload("New", "New body"))
            .await
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(api.entry(7).unwrap().content, "New body");
        assert_eq!(transport.count(Method::PUT, "journals/7/"), 1);
    }

    #[tokio::test]
    async fn blank_create_is_validation_error() {
        let api = FakeJournalApi::new();
        let (client, _) = client(&api);

        let err = client.create_journal(&payload("", "")).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Validation {
                status: 400,
                message: "Either title or content must be provided.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn get_and_delete() {
        let api = FakeJournalApi::new();
        api.insert(3, "Walk", "Went outside", "2025-06-02");
        let (client, _) = client(&api);

        assert_eq!(client.get_journal(EntryId(3)).await.unwrap().title, "Walk");
        client.delete_journal(EntryId(3)).await.unwrap();
        assert!(api.entry(3).is_none());

        let err = client.get_journal(EntryId(3)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::ConflictOrUnknown { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn emotions_are_decoded() {
        let api = FakeJournalApi::new();
        api.insert(5, "Day", "A good day", "2025-06-03");
        let (client, transport) = client(&api);

        let analysis = client.process_emotions(EntryId(5)).await.unwrap();
        assert_eq!(analysis.mood_stats.dominant_mood, "Happy");
        assert_eq!(analysis.insights.unwrap().insight_content, "Keep writing.");
        assert_eq!(transport.count(Method::POST, "journals/5/process_emotions/"), 1);
    }

    #[tokio::test]
    async fn server_error_surfaces() {
        let api = FakeJournalApi::new();
        api.fail_next(Method::GET, "journals/", StatusCode::INTERNAL_SERVER_ERROR);
        let (client, _) = client(&api);

        let err = client.list_journals().await.unwrap_err();
        assert_eq!(
            err,
            ClientError::ConflictOrUnknown {
                status: 500,
                message: "injected failure".to_string(),
            }
        );
    }
}
