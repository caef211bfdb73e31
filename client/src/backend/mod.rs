// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Where the store's collections live.
//!
//! Both implementations expose the same operations with the same
//! observable results, so the store never needs to know which one it has.

mod memory;
mod remote;

pub use memory::MemoryBackend;
pub use remote::RemoteBackend;

use crate::error::Result;
use async_trait::async_trait;
use common::{
    ClassSubject, Deadline, DeadlineDraft, NewClass, NewTask, NewTimeBlock, Note, TimeBlock,
};

#[async_trait]
pub trait Backend: Send + Sync {
    async fn time_blocks(&self) -> Result<Vec<TimeBlock>>;

    /// `Ok(None)` when no block has this id.
    async fn time_block(&self, id: &str) -> Result<Option<TimeBlock>>;

    async fn create_time_block(&self, block: NewTimeBlock) -> Result<TimeBlock>;

    async fn update_time_block(&self, block: &TimeBlock) -> Result<()>;

    async fn set_time_block_completed(&self, id: &str, completed: bool) -> Result<()>;

    async fn delete_time_block(&self, id: &str) -> Result<()>;

    async fn deadlines(&self) -> Result<Vec<Deadline>>;

    async fn create_deadline(&self, draft: DeadlineDraft) -> Result<Deadline>;

    async fn delete_deadline(&self, id: &str) -> Result<()>;

    /// Classes with their tasks attached.
    async fn classes(&self) -> Result<Vec<ClassSubject>>;

    async fn create_class(&self, class: NewClass) -> Result<ClassSubject>;

    /// Removes the class and its tasks. Deadlines naming the class stay.
    ///
    /// Not atomic on every backend: when a task delete fails part way, the
    /// class is kept with only the remaining tasks and the error is returned.
    async fn delete_class(&self, class: &ClassSubject) -> Result<()>;

    async fn create_task(&self, class: &ClassSubject, task: NewTask) -> Result<()>;

    async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<()>;

    async fn delete_task(&self, task_id: &str) -> Result<()>;

    /// Most recent first.
    async fn notes(&self) -> Result<Vec<Note>>;

    async fn create_note(&self, content: String) -> Result<Note>;

    async fn delete_note(&self, id: &str) -> Result<()>;
}
