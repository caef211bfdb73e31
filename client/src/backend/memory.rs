// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::Backend;
use crate::clock::SharedClock;
use crate::error::Result;
use crate::seed::InitialState;
use async_trait::async_trait;
use common::{
    ClassSubject, Deadline, DeadlineDraft, NewClass, NewTask, NewTimeBlock, Note, Task,
    TimeBlock,
};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Keeps every collection in process memory. Nothing survives a restart.
pub struct MemoryBackend {
    state: Mutex<InitialState>,
    clock: SharedClock,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl MemoryBackend {
    pub fn new(initial: InitialState, clock: SharedClock) -> Self {
        Self {
            state: Mutex::new(initial),
            clock,
        }
    }

    pub fn empty(clock: SharedClock) -> Self {
        Self::new(InitialState::default(), clock)
    }

    /// Starts from [`InitialState::sample`] anchored at the clock's now.
    pub fn with_sample_data(clock: SharedClock) -> Self {
        let initial = InitialState::sample(clock.now());
        Self::new(initial, clock)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn time_blocks(&self) -> Result<Vec<TimeBlock>> {
        Ok(self.state.lock().time_blocks.clone())
    }

    async fn time_block(&self, id: &str) -> Result<Option<TimeBlock>> {
        Ok(self.state.lock().time_blocks.iter().find(|b| b.id == id).cloned())
    }

    async fn create_time_block(&self, block: NewTimeBlock) -> Result<TimeBlock> {
        let block = block.into_block(new_id());
        debug!("Storing time block {} in memory", block.id);
        self.state.lock().time_blocks.push(block.clone());
        Ok(block)
    }

    async fn update_time_block(&self, block: &TimeBlock) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(existing) = state.time_blocks.iter_mut().find(|b| b.id == block.id) {
            *existing = block.clone();
        }
        Ok(())
    }

    async fn set_time_block_completed(&self, id: &str, completed: bool) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(block) = state.time_blocks.iter_mut().find(|b| b.id == id) {
            block.completed = completed;
        }
        Ok(())
    }

    async fn delete_time_block(&self, id: &str) -> Result<()> {
        self.state.lock().time_blocks.retain(|b| b.id != id);
        Ok(())
    }

    async fn deadlines(&self) -> Result<Vec<Deadline>> {
        Ok(self.state.lock().deadlines.clone())
    }

    async fn create_deadline(&self, draft: DeadlineDraft) -> Result<Deadline> {
        let deadline = draft.into_deadline(new_id());
        self.state.lock().deadlines.push(deadline.clone());
        Ok(deadline)
    }

    async fn delete_deadline(&self, id: &str) -> Result<()> {
        self.state.lock().deadlines.retain(|d| d.id != id);
        Ok(())
    }

    async fn classes(&self) -> Result<Vec<ClassSubject>> {
        Ok(self.state.lock().classes.clone())
    }

    async fn create_class(&self, class: NewClass) -> Result<ClassSubject> {
        let class = ClassSubject {
            id: new_id(),
            name: class.name,
            color: class.color,
            tasks: Vec::new(),
        };
        self.state.lock().classes.push(class.clone());
        Ok(class)
    }

    async fn delete_class(&self, class: &ClassSubject) -> Result<()> {
        self.state.lock().classes.retain(|c| c.id != class.id);
        Ok(())
    }

    async fn create_task(&self, class: &ClassSubject, task: NewTask) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(class) = state.classes.iter_mut().find(|c| c.id == class.id) {
            class.tasks.push(Task {
                id: new_id(),
                title: task.title,
                completed: task.completed,
            });
        }
        Ok(())
    }

    async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<()> {
        let mut state = self.state.lock();
        let task = state
            .classes
            .iter_mut()
            .flat_map(|c| c.tasks.iter_mut())
            .find(|t| t.id == task_id);
        if let Some(task) = task {
            task.completed = completed;
        }
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        for class in self.state.lock().classes.iter_mut() {
            class.tasks.retain(|t| t.id != task_id);
        }
        Ok(())
    }

    async fn notes(&self) -> Result<Vec<Note>> {
        Ok(self.state.lock().notes.clone())
    }

    async fn create_note(&self, content: String) -> Result<Note> {
        let note = Note {
            id: new_id(),
            content,
            created_at: self.clock.now(),
        };
        self.state.lock().notes.insert(0, note.clone());
        Ok(note)
    }

    async fn delete_note(&self, id: &str) -> Result<()> {
        self.state.lock().notes.retain(|n| n.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, NaiveDate};
    use common::Color;
    use std::sync::Arc;

    fn clock() -> ManualClock {
        ManualClock::new(NaiveDate::from_ymd_opt(2025, 7, 9).unwrap().and_hms_opt(9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_notes_are_prepended_with_clock_time() {
        let clock = clock();
        let backend = MemoryBackend::empty(Arc::new(clock.clone()));

        let first = backend.create_note("first".into()).await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = backend.create_note("second".into()).await.unwrap();

        let notes = backend.notes().await.unwrap();
        assert_eq!(notes, vec![second.clone(), first]);
        assert_eq!(second.created_at.to_string(), "2025-07-09 09:05:00");
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let backend = MemoryBackend::empty(Arc::new(clock()));
        let art = NewClass {
            name: "Art".into(),
            color: Color::Pink,
        };
        let music = NewClass {
            name: "Music".into(),
            color: Color::Cyan,
        };

        let a = backend.create_class(art).await.unwrap();
        let b = backend.create_class(music).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.tasks.is_empty());
        assert_eq!(backend.classes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_task_writes_on_unknown_ids_are_ignored() {
        let backend = MemoryBackend::with_sample_data(Arc::new(clock()));
        let before = backend.classes().await.unwrap();

        backend.set_task_completed("missing", true).await.unwrap();
        backend.delete_task("missing").await.unwrap();

        assert_eq!(backend.classes().await.unwrap(), before);
    }
}
