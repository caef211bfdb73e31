// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::Backend;
use crate::api::ApiClient;
use crate::clock::SharedClock;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use common::convert::{
    block_to_session_update, class_payload, classes_from_records, deadline_from_record,
    draft_to_create_deadline, new_block_to_session, note_from_record, note_payload,
    session_to_time_block, task_payload,
};
use common::wire::{DeadlineQuery, ItemQuery, NoteQuery, SessionQuery, UpdateSession};
use common::{
    ClassSubject, Deadline, DeadlineDraft, NewClass, NewTask, NewTimeBlock, Note, TimeBlock,
};
use tracing::{debug, info};

/// Persists every collection through the REST service.
///
/// Slot fields are anchored to the clock's "now" on every write, so a block
/// saved on Tuesday for day 1 lands on the following Monday.
pub struct RemoteBackend {
    api: ApiClient,
    clock: SharedClock,
}

impl RemoteBackend {
    pub fn new(api: ApiClient, clock: SharedClock) -> Self {
        Self { api, clock }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

/// Service ids are integers; anything else cannot exist remotely.
fn parse_id(id: &str) -> Result<i64> {
    id.parse().map_err(|_| ApiError::InvalidId(id.to_string()))
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn time_blocks(&self) -> Result<Vec<TimeBlock>> {
        let sessions = self.api.list_sessions(&SessionQuery::default()).await?;
        Ok(sessions.iter().map(session_to_time_block).collect())
    }

    async fn time_block(&self, id: &str) -> Result<Option<TimeBlock>> {
        let Ok(id) = id.parse::<i64>() else {
            return Ok(None);
        };
        match self.api.get_session(id).await {
            Ok(session) => Ok(Some(session_to_time_block(&session))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_time_block(&self, block: NewTimeBlock) -> Result<TimeBlock> {
        let payload = new_block_to_session(&block, self.clock.now());
        let session = self.api.create_session(&payload).await?;
        info!("Created session {} for time block {:?}", session.id, session.title);
        Ok(session_to_time_block(&session))
    }

    async fn update_time_block(&self, block: &TimeBlock) -> Result<()> {
        let payload = block_to_session_update(block, self.clock.now());
        self.api.update_session(parse_id(&block.id)?, &payload).await?;
        Ok(())
    }

    async fn set_time_block_completed(&self, id: &str, completed: bool) -> Result<()> {
        let payload = UpdateSession {
            is_completed: Some(completed),
            ..Default::default()
        };
        self.api.update_session(parse_id(id)?, &payload).await?;
        Ok(())
    }

    async fn delete_time_block(&self, id: &str) -> Result<()> {
        self.api.delete_session(parse_id(id)?).await
    }

    async fn deadlines(&self) -> Result<Vec<Deadline>> {
        let records = self.api.list_deadlines(&DeadlineQuery::default()).await?;
        Ok(records.iter().map(deadline_from_record).collect())
    }

    async fn create_deadline(&self, draft: DeadlineDraft) -> Result<Deadline> {
        let record = self.api.create_deadline(&draft_to_create_deadline(&draft)).await?;
        Ok(deadline_from_record(&record))
    }

    async fn delete_deadline(&self, id: &str) -> Result<()> {
        self.api.delete_deadline(parse_id(id)?).await
    }

    async fn classes(&self) -> Result<Vec<ClassSubject>> {
        let query = ItemQuery::default();
        let (subjects, items) =
            tokio::try_join!(self.api.list_subjects(), self.api.list_items(&query))?;
        Ok(classes_from_records(&subjects, &items))
    }

    async fn create_class(&self, class: NewClass) -> Result<ClassSubject> {
        let subject = self.api.create_subject(&class_payload(&class)).await?;
        Ok(ClassSubject {
            id: subject.id.to_string(),
            name: subject.name,
            color: class.color,
            tasks: Vec::new(),
        })
    }

    async fn delete_class(&self, class: &ClassSubject) -> Result<()> {
        let id = parse_id(&class.id)?;
        // Items reference their subject by name; drop them first so a later
        // class with the same name starts empty.
        let query = ItemQuery {
            subject: Some(class.name.clone()),
            ..Default::default()
        };
        for item in self.api.list_items(&query).await? {
            self.api.delete_item(item.id).await?;
        }
        self.api.delete_subject(id).await?;
        debug!("Deleted class {} with its tasks", class.name);
        Ok(())
    }

    async fn create_task(&self, class: &ClassSubject, task: NewTask) -> Result<()> {
        let payload = task_payload(class, &task.title, task.completed);
        self.api.create_item(&payload).await?;
        Ok(())
    }

    async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<()> {
        self.api.set_item_completed(parse_id(task_id)?, completed).await?;
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.api.delete_item(parse_id(task_id)?).await
    }

    async fn notes(&self) -> Result<Vec<Note>> {
        let records = self.api.list_notes(&NoteQuery::default()).await?;
        Ok(records.iter().map(note_from_record).collect())
    }

    async fn create_note(&self, content: String) -> Result<Note> {
        let record = self.api.create_note(&note_payload(&content)).await?;
        Ok(note_from_record(&record))
    }

    async fn delete_note(&self, id: &str) -> Result<()> {
        self.api.delete_note(parse_id(id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("17").unwrap(), 17);
        assert!(matches!(parse_id("temp-3"), Err(ApiError::InvalidId(id)) if id == "temp-3"));
    }
}
