// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Thin typed wrapper over the REST resources.
//!
//! Every call goes through [`ApiClient::send`]: a non-2xx status becomes
//! [`ApiError::Status`] carrying the body's `message` (or `API Error:
//! <status>` when there is none), and `204 No Content` is an empty success.

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use common::wire::{
    CreateDeadline, CreateItem, CreateNote, CreateSession, CreateSubject, DeadlineQuery,
    DeadlineRecord, ErrorBody, HealthStatus, ItemQuery, ItemRecord, NoteQuery, NoteRecord,
    ProgressStats, SessionQuery, SessionRecord, SubjectRecord, UpdateDeadline, UpdateItem,
    UpdateNote, UpdateSession,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.api_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());

        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => format!("API Error: {}", status.as_u16()),
            };
            warn!("Request failed with {}: {}", status.as_u16(), message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json::<T>().await?))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request).await?.ok_or(ApiError::EmptyBody)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<()> {
        self.send::<IgnoredAny>(request).await.map(|_| ())
    }

    // Sessions

    pub async fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>> {
        self.fetch(self.client.get(self.url("/sessions")).query(query)).await
    }

    pub async fn get_session(&self, id: i64) -> Result<SessionRecord> {
        self.fetch(self.client.get(self.url(&format!("/sessions/{id}")))).await
    }

    pub async fn create_session(&self, payload: &CreateSession) -> Result<SessionRecord> {
        self.fetch(self.client.post(self.url("/sessions")).json(payload)).await
    }

    pub async fn update_session(&self, id: i64, payload: &UpdateSession) -> Result<SessionRecord> {
        self.fetch(self.client.put(self.url(&format!("/sessions/{id}"))).json(payload))
            .await
    }

    pub async fn delete_session(&self, id: i64) -> Result<()> {
        self.execute(self.client.delete(self.url(&format!("/sessions/{id}")))).await
    }

    // Deadlines

    pub async fn list_deadlines(&self, query: &DeadlineQuery) -> Result<Vec<DeadlineRecord>> {
        self.fetch(self.client.get(self.url("/deadlines")).query(query)).await
    }

    pub async fn get_deadline(&self, id: i64) -> Result<DeadlineRecord> {
        self.fetch(self.client.get(self.url(&format!("/deadlines/{id}")))).await
    }

    pub async fn create_deadline(&self, payload: &CreateDeadline) -> Result<DeadlineRecord> {
        self.fetch(self.client.post(self.url("/deadlines")).json(payload)).await
    }

    pub async fn update_deadline(
        &self,
        id: i64,
        payload: &UpdateDeadline,
    ) -> Result<DeadlineRecord> {
        self.fetch(self.client.put(self.url(&format!("/deadlines/{id}"))).json(payload))
            .await
    }

    pub async fn delete_deadline(&self, id: i64) -> Result<()> {
        self.execute(self.client.delete(self.url(&format!("/deadlines/{id}")))).await
    }

    // Items

    pub async fn list_items(&self, query: &ItemQuery) -> Result<Vec<ItemRecord>> {
        self.fetch(self.client.get(self.url("/items")).query(query)).await
    }

    pub async fn create_item(&self, payload: &CreateItem) -> Result<ItemRecord> {
        self.fetch(self.client.post(self.url("/items")).json(payload)).await
    }

    pub async fn update_item(&self, id: i64, payload: &UpdateItem) -> Result<ItemRecord> {
        self.fetch(self.client.put(self.url(&format!("/items/{id}"))).json(payload))
            .await
    }

    pub async fn set_item_completed(&self, id: i64, completed: bool) -> Result<ItemRecord> {
        let payload = UpdateItem {
            is_completed: Some(completed),
            ..Default::default()
        };
        self.update_item(id, &payload).await
    }

    pub async fn delete_item(&self, id: i64) -> Result<()> {
        self.execute(self.client.delete(self.url(&format!("/items/{id}")))).await
    }

    pub async fn item_progress(&self) -> Result<ProgressStats> {
        self.fetch(self.client.get(self.url("/items/progress"))).await
    }

    // Notes

    pub async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<NoteRecord>> {
        self.fetch(self.client.get(self.url("/notes")).query(query)).await
    }

    pub async fn create_note(&self, payload: &CreateNote) -> Result<NoteRecord> {
        self.fetch(self.client.post(self.url("/notes")).json(payload)).await
    }

    pub async fn update_note(&self, id: i64, payload: &UpdateNote) -> Result<NoteRecord> {
        self.fetch(self.client.put(self.url(&format!("/notes/{id}"))).json(payload))
            .await
    }

    pub async fn delete_note(&self, id: i64) -> Result<()> {
        self.execute(self.client.delete(self.url(&format!("/notes/{id}")))).await
    }

    // Subjects

    pub async fn list_subjects(&self) -> Result<Vec<SubjectRecord>> {
        self.fetch(self.client.get(self.url("/subjects"))).await
    }

    pub async fn create_subject(&self, payload: &CreateSubject) -> Result<SubjectRecord> {
        self.fetch(self.client.post(self.url("/subjects")).json(payload)).await
    }

    pub async fn delete_subject(&self, id: i64) -> Result<()> {
        self.execute(self.client.delete(self.url(&format!("/subjects/{id}")))).await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.fetch(self.client.get(self.url("/health"))).await
    }
}
