// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! The collection store the presentation layer reads from.
//!
//! Readers subscribe to a [`Snapshot`] through a `watch` channel. Writers
//! call the operations below (or send a [`Command`] through
//! [`Store::dispatch`]). Each write validates its input, forwards it to the
//! backend and then refetches the affected collection; nothing is patched
//! locally. A failed write returns the error and leaves the snapshot as it
//! was. No lock is held across a backend call, so independent writes can
//! run concurrently and the last refetch to land wins.

use crate::backend::Backend;
use crate::error::Result;
use crate::reconcile::{diff_tasks, TaskOp};
use common::{
    blocks_in_slot, move_block, overall_completion, ClassSubject, Deadline, NewClass,
    NewDeadline, NewTimeBlock, Note, Task, TimeBlock,
};
use tokio::sync::watch;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub time_blocks: Vec<TimeBlock>,
    pub deadlines: Vec<Deadline>,
    pub classes: Vec<ClassSubject>,
    pub notes: Vec<Note>,
    /// True until the first [`Store::load`] completes.
    pub loading: bool,
}

impl Snapshot {
    pub fn time_block(&self, id: &str) -> Option<&TimeBlock> {
        self.time_blocks.iter().find(|b| b.id == id)
    }

    pub fn class(&self, id: &str) -> Option<&ClassSubject> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn blocks_in_slot(&self, day: u32, hour: u32) -> Vec<&TimeBlock> {
        blocks_in_slot(&self.time_blocks, day, hour)
    }

    pub fn completed_tasks(&self) -> usize {
        self.classes.iter().map(ClassSubject::completed_count).sum()
    }

    pub fn total_tasks(&self) -> usize {
        self.classes.iter().map(|c| c.tasks.len()).sum()
    }

    /// Completion across all classes, truncated to a whole percentage.
    pub fn overall_completion(&self) -> u32 {
        overall_completion(&self.classes)
    }
}

/// A store operation expressed as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddTimeBlock(NewTimeBlock),
    UpdateTimeBlock(TimeBlock),
    MoveTimeBlock { id: String, day: u32, hour: u32 },
    ToggleTimeBlockComplete(String),
    DeleteTimeBlock(String),
    AddDeadline(NewDeadline),
    RemoveDeadline(String),
    AddClass(NewClass),
    DeleteClass(String),
    ReconcileTasks { class_id: String, tasks: Vec<Task> },
    AddNote(String),
    RemoveNote(String),
}

pub struct Store<B> {
    backend: B,
    state: watch::Sender<Snapshot>,
}

impl<B: Backend> Store<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(Snapshot {
            loading: true,
            ..Default::default()
        });
        Self { backend, state }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Fetches every collection. `loading` is cleared whether or not the
    /// fetch succeeds.
    pub async fn load(&self) -> Result<()> {
        let fetched = tokio::try_join!(
            self.backend.time_blocks(),
            self.backend.deadlines(),
            self.backend.classes(),
            self.backend.notes(),
        );
        match fetched {
            Ok((time_blocks, deadlines, classes, notes)) => {
                info!(
                    "Loaded {} time blocks, {} deadlines, {} classes, {} notes.",
                    time_blocks.len(),
                    deadlines.len(),
                    classes.len(),
                    notes.len()
                );
                self.state.send_replace(Snapshot {
                    time_blocks,
                    deadlines,
                    classes,
                    notes,
                    loading: false,
                });
                Ok(())
            }
            Err(err) => {
                error!("Initial load failed: {}", err);
                self.state.send_modify(|s| s.loading = false);
                Err(err)
            }
        }
    }

    pub async fn dispatch(&self, command: Command) -> Result<()> {
        debug!("Dispatching {:?}", command);
        match command {
            Command::AddTimeBlock(data) => self.add_time_block(data).await.map(drop),
            Command::UpdateTimeBlock(block) => self.update_time_block(block).await,
            Command::MoveTimeBlock { id, day, hour } => self.move_time_block(&id, day, hour).await,
            Command::ToggleTimeBlockComplete(id) => self.toggle_time_block_complete(&id).await,
            Command::DeleteTimeBlock(id) => self.delete_time_block(&id).await,
            Command::AddDeadline(data) => self.add_deadline(data).await.map(drop),
            Command::RemoveDeadline(id) => self.remove_deadline(&id).await,
            Command::AddClass(data) => self.add_class(data).await.map(drop),
            Command::DeleteClass(id) => self.delete_class(&id).await,
            Command::ReconcileTasks { class_id, tasks } => {
                self.reconcile_tasks(&class_id, tasks).await.map(drop)
            }
            Command::AddNote(content) => self.add_note(&content).await.map(drop),
            Command::RemoveNote(id) => self.remove_note(&id).await,
        }
    }

    // --- Time blocks ---

    /// Returns `None` when the title is blank; nothing is written then.
    pub async fn add_time_block(&self, data: NewTimeBlock) -> Result<Option<TimeBlock>> {
        let Some(data) = data.validated() else {
            debug!("Refusing time block without a title");
            return Ok(None);
        };
        let block = self.backend.create_time_block(data).await?;
        info!("Time block {} added on day {} at {}h.", block.id, block.day, block.start_hour);
        self.refresh_time_blocks().await?;
        Ok(Some(block))
    }

    pub async fn update_time_block(&self, block: TimeBlock) -> Result<()> {
        let id = block.id.clone();
        let Some(block) = block.validated() else {
            debug!("Refusing update of time block {} with a blank title", id);
            return Ok(());
        };
        if self.state.borrow().time_block(&block.id).is_none() {
            debug!("Time block {} not found, ignoring update", block.id);
            return Ok(());
        }
        self.backend.update_time_block(&block).await?;
        info!("Time block {} updated.", block.id);
        self.refresh_time_blocks().await
    }

    /// Changes only the slot; everything else about the block is kept.
    pub async fn move_time_block(&self, id: &str, day: u32, hour: u32) -> Result<()> {
        let Some(block) = self.backend.time_block(id).await? else {
            debug!("Time block {} not found, ignoring move", id);
            return Ok(());
        };
        let moved = move_block(&block, day, hour);
        self.backend.update_time_block(&moved).await?;
        info!("Time block {} moved to day {} at {}h.", id, moved.day, moved.start_hour);
        self.refresh_time_blocks().await
    }

    pub async fn toggle_time_block_complete(&self, id: &str) -> Result<()> {
        let completed = match self.state.borrow().time_block(id) {
            Some(block) => block.completed,
            None => return Ok(()),
        };
        self.backend.set_time_block_completed(id, !completed).await?;
        info!("Time block {} marked completed: {}.", id, !completed);
        self.refresh_time_blocks().await
    }

    pub async fn delete_time_block(&self, id: &str) -> Result<()> {
        if self.state.borrow().time_block(id).is_none() {
            return Ok(());
        }
        self.backend.delete_time_block(id).await?;
        info!("Time block {} deleted.", id);
        self.refresh_time_blocks().await
    }

    // --- Deadlines ---

    /// Returns `None` when the title, class name or due date is missing.
    pub async fn add_deadline(&self, data: NewDeadline) -> Result<Option<Deadline>> {
        let Some(draft) = data.validated() else {
            debug!("Refusing incomplete deadline");
            return Ok(None);
        };
        let deadline = self.backend.create_deadline(draft).await?;
        info!("Deadline {} added for {}.", deadline.id, deadline.class_name);
        self.refresh_deadlines().await?;
        Ok(Some(deadline))
    }

    pub async fn remove_deadline(&self, id: &str) -> Result<()> {
        if !self.state.borrow().deadlines.iter().any(|d| d.id == id) {
            return Ok(());
        }
        self.backend.delete_deadline(id).await?;
        info!("Deadline {} removed.", id);
        self.refresh_deadlines().await
    }

    // --- Classes and tasks ---

    /// Returns `None` when the name is blank or already taken by a loaded
    /// class; nothing is written then.
    pub async fn add_class(&self, data: NewClass) -> Result<Option<ClassSubject>> {
        let Some(data) = data.validated() else {
            debug!("Refusing class without a name");
            return Ok(None);
        };
        if self.state.borrow().classes.iter().any(|c| c.name == data.name) {
            debug!("Class {} already exists, ignoring", data.name);
            return Ok(None);
        }
        let class = self.backend.create_class(data).await?;
        info!("Class {} added.", class.name);
        self.refresh_classes().await?;
        Ok(Some(class))
    }

    /// Deletes the class and its tasks. Deadlines that name the class are
    /// left alone.
    pub async fn delete_class(&self, id: &str) -> Result<()> {
        let Some(class) = self.state.borrow().class(id).cloned() else {
            return Ok(());
        };
        self.backend.delete_class(&class).await?;
        info!("Class {} deleted.", class.name);
        self.refresh_classes().await
    }

    /// Brings the class's stored tasks in line with `desired` and returns
    /// the writes that were issued. Unsaved tasks with a blank title are
    /// skipped.
    ///
    /// The writes are not atomic: if one fails, the ones before it are
    /// already persisted while the snapshot keeps the old list.
    pub async fn reconcile_tasks(
        &self,
        class_id: &str,
        desired: Vec<Task>,
    ) -> Result<Vec<TaskOp>> {
        let Some(class) = self.state.borrow().class(class_id).cloned() else {
            debug!("Class {} not found, ignoring task changes", class_id);
            return Ok(Vec::new());
        };

        let mut applied = Vec::new();
        for op in diff_tasks(&class.tasks, &desired) {
            match &op {
                TaskOp::Toggle { id, completed } => {
                    self.backend.set_task_completed(id, *completed).await?;
                }
                TaskOp::Create(task) => {
                    let Some(task) = task.clone().validated() else {
                        continue;
                    };
                    self.backend.create_task(&class, task).await?;
                }
                TaskOp::Delete { id } => {
                    self.backend.delete_task(id).await?;
                }
            }
            applied.push(op);
        }

        if !applied.is_empty() {
            info!("Applied {} task changes to class {}.", applied.len(), class.name);
            self.refresh_classes().await?;
        }
        Ok(applied)
    }

    /// Appends an unsaved task and reconciles.
    pub async fn add_task(&self, class_id: &str, title: &str) -> Result<()> {
        let Some(mut tasks) = self.tasks_of(class_id) else {
            return Ok(());
        };
        let suffix = uuid::Uuid::new_v4().simple();
        tasks.push(Task::unsaved(suffix, title));
        self.reconcile_tasks(class_id, tasks).await.map(drop)
    }

    pub async fn toggle_task(&self, class_id: &str, task_id: &str) -> Result<()> {
        let Some(mut tasks) = self.tasks_of(class_id) else {
            return Ok(());
        };
        for task in tasks.iter_mut().filter(|t| t.id == task_id) {
            task.completed = !task.completed;
        }
        self.reconcile_tasks(class_id, tasks).await.map(drop)
    }

    pub async fn remove_task(&self, class_id: &str, task_id: &str) -> Result<()> {
        let Some(mut tasks) = self.tasks_of(class_id) else {
            return Ok(());
        };
        tasks.retain(|t| t.id != task_id);
        self.reconcile_tasks(class_id, tasks).await.map(drop)
    }

    fn tasks_of(&self, class_id: &str) -> Option<Vec<Task>> {
        self.state.borrow().class(class_id).map(|c| c.tasks.clone())
    }

    // --- Notes ---

    /// Returns `None` when the content is blank after trimming.
    pub async fn add_note(&self, content: &str) -> Result<Option<Note>> {
        let content = content.trim();
        if content.is_empty() {
            debug!("Refusing empty note");
            return Ok(None);
        }
        let note = self.backend.create_note(content.to_string()).await?;
        info!("Note {} added.", note.id);
        self.refresh_notes().await?;
        Ok(Some(note))
    }

    pub async fn remove_note(&self, id: &str) -> Result<()> {
        if !self.state.borrow().notes.iter().any(|n| n.id == id) {
            return Ok(());
        }
        self.backend.delete_note(id).await?;
        info!("Note {} removed.", id);
        self.refresh_notes().await
    }

    // --- Refetch ---

    async fn refresh_time_blocks(&self) -> Result<()> {
        let time_blocks = self.backend.time_blocks().await?;
        self.state.send_modify(|s| s.time_blocks = time_blocks);
        Ok(())
    }

    async fn refresh_deadlines(&self) -> Result<()> {
        let deadlines = self.backend.deadlines().await?;
        self.state.send_modify(|s| s.deadlines = deadlines);
        Ok(())
    }

    async fn refresh_classes(&self) -> Result<()> {
        let classes = self.backend.classes().await?;
        self.state.send_modify(|s| s.classes = classes);
        Ok(())
    }

    async fn refresh_notes(&self) -> Result<()> {
        let notes = self.backend.notes().await?;
        self.state.send_modify(|s| s.notes = notes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::clock::ManualClock;
    use crate::seed::InitialState;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use common::Color;
    use std::sync::Arc;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 9).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    async fn loaded(initial: InitialState) -> Store<MemoryBackend> {
        let clock = Arc::new(ManualClock::new(now()));
        let store = Store::new(MemoryBackend::new(initial, clock));
        store.load().await.unwrap();
        store
    }

    fn task(id: &str, title: &str, completed: bool) -> Task {
        Task {
            id: id.into(),
            title: title.into(),
            completed,
        }
    }

    fn new_block(title: &str, duration_minutes: i64) -> NewTimeBlock {
        NewTimeBlock {
            title: title.into(),
            description: String::new(),
            duration_minutes,
            day: 2,
            start_hour: 9,
            color: Color::Cyan,
            completed: false,
        }
    }

    #[tokio::test]
    async fn test_loading_flag_clears_after_load() {
        let clock = Arc::new(ManualClock::new(now()));
        let store = Store::new(MemoryBackend::with_sample_data(clock));
        assert!(store.snapshot().loading);

        store.load().await.unwrap();

        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.classes.len(), 3);
        assert_eq!(snapshot.total_tasks(), 8);
        assert_eq!(snapshot.overall_completion(), 37);
    }

    #[tokio::test]
    async fn test_add_time_block_validates_and_clamps() {
        let store = loaded(InitialState::default()).await;

        let refused = store.add_time_block(new_block("   ", 60)).await.unwrap();
        assert!(refused.is_none());
        assert!(store.snapshot().time_blocks.is_empty());

        let short = store.add_time_block(new_block("Flashcards", 5)).await.unwrap().unwrap();
        let long = store.add_time_block(new_block("Thesis", 600)).await.unwrap().unwrap();

        assert_eq!(short.duration_minutes, 15);
        assert_eq!(long.duration_minutes, 480);
        assert!(!short.completed);
        assert_ne!(short.id, long.id);
        assert_eq!(store.snapshot().blocks_in_slot(2, 9).len(), 2);
    }

    #[tokio::test]
    async fn test_update_clamps_duration() {
        let store = loaded(InitialState::default()).await;
        let block = store.add_time_block(new_block("Revision", 60)).await.unwrap().unwrap();

        for (requested, stored) in [(10, 15), (45, 45), (1000, 480)] {
            let mut edited = block.clone();
            edited.duration_minutes = requested;
            store.update_time_block(edited).await.unwrap();
            assert_eq!(store.snapshot().time_block(&block.id).unwrap().duration_minutes, stored);
        }

        let mut blank = block.clone();
        blank.title = " ".into();
        store.update_time_block(blank).await.unwrap();
        assert_eq!(store.snapshot().time_block(&block.id).unwrap().title, "Revision");
    }

    #[tokio::test]
    async fn test_move_keeps_everything_but_the_slot() {
        let store = loaded(InitialState::default()).await;
        let mut data = new_block("Essay outline", 90);
        data.description = "Three sections".into();
        data.completed = true;
        let block = store.add_time_block(data).await.unwrap().unwrap();

        store.move_time_block(&block.id, 5, 14).await.unwrap();

        let moved = store.snapshot().time_block(&block.id).cloned().unwrap();
        assert_eq!((moved.day, moved.start_hour), (5, 14));
        assert_eq!(moved.title, "Essay outline");
        assert_eq!(moved.description, "Three sections");
        assert_eq!(moved.duration_minutes, 90);
        assert_eq!(moved.color, Color::Cyan);
        assert!(moved.completed);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_noops() {
        let store = loaded(InitialState::sample(now())).await;
        let before = store.snapshot();

        store.toggle_time_block_complete("nope").await.unwrap();
        store.delete_time_block("nope").await.unwrap();
        store.move_time_block("nope", 1, 8).await.unwrap();
        store.remove_deadline("nope").await.unwrap();
        store.delete_class("nope").await.unwrap();
        store.remove_note("nope").await.unwrap();
        let ops = store.reconcile_tasks("nope", Vec::new()).await.unwrap();

        assert!(ops.is_empty());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_completed() {
        let store = loaded(InitialState::default()).await;
        let block = store.add_time_block(new_block("Reading", 30)).await.unwrap().unwrap();

        store.toggle_time_block_complete(&block.id).await.unwrap();
        assert!(store.snapshot().time_block(&block.id).unwrap().completed);

        store.toggle_time_block_complete(&block.id).await.unwrap();
        assert!(!store.snapshot().time_block(&block.id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_reconcile_toggles_existing_and_creates_unsaved() {
        let initial = InitialState {
            classes: vec![ClassSubject {
                id: "c1".into(),
                name: "Chemistry".into(),
                color: Color::Orange,
                tasks: vec![task("1", "Balance equations", false)],
            }],
            ..Default::default()
        };
        let store = loaded(initial).await;

        let desired = vec![
            task("1", "Balance equations", true),
            Task::unsaved(2, "Titration lab"),
        ];
        let ops = store.reconcile_tasks("c1", desired).await.unwrap();

        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], TaskOp::Toggle { id, completed: true } if id == "1"));
        assert!(matches!(&ops[1], TaskOp::Create(task) if task.title == "Titration lab"));

        let class = store.snapshot().class("c1").cloned().unwrap();
        assert_eq!(class.tasks.len(), 2);
        assert!(class.tasks[0].completed);
        assert!(!class.tasks[1].is_unsaved());
        assert_eq!(class.completion_percentage(), 50);
    }

    #[tokio::test]
    async fn test_task_helpers() {
        let store = loaded(InitialState::sample(now())).await;

        store.add_task("3", "Read chapter 9").await.unwrap();
        let physics = store.snapshot().class("3").cloned().unwrap();
        assert_eq!(physics.tasks.len(), 3);
        let added = physics.tasks[2].clone();
        assert_eq!(added.title, "Read chapter 9");

        store.toggle_task("3", &added.id).await.unwrap();
        assert_eq!(store.snapshot().class("3").unwrap().completed_count(), 1);

        store.remove_task("3", "t7").await.unwrap();
        let snapshot = store.snapshot();
        let ids: Vec<_> = snapshot.class("3").unwrap().tasks.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["t8".to_string(), added.id]);
    }

    #[tokio::test]
    async fn test_deleting_a_class_keeps_its_deadlines() {
        let store = loaded(InitialState::default()).await;
        let class = store
            .add_class(NewClass {
                name: "Biology".into(),
                color: Color::Pink,
            })
            .await
            .unwrap()
            .unwrap();
        store
            .add_deadline(NewDeadline {
                title: "Midterm".into(),
                class_name: "Biology".into(),
                due: Some(now() + Duration::days(3)),
                color: Color::Pink,
            })
            .await
            .unwrap();

        store.delete_class(&class.id).await.unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.classes.is_empty());
        assert_eq!(snapshot.deadlines.len(), 1);
        assert_eq!(snapshot.deadlines[0].class_name, "Biology");
    }

    #[tokio::test]
    async fn test_duplicate_class_name_is_refused() {
        let store = loaded(InitialState::sample(now())).await;
        let before = store.snapshot();
        let taken = before.classes[0].name.clone();

        let duplicate = NewClass {
            name: format!("  {}  ", taken),
            color: Color::Orange,
        };
        assert!(store.add_class(duplicate).await.unwrap().is_none());
        assert_eq!(store.snapshot(), before);

        let other = NewClass {
            name: format!("{} II", taken),
            color: Color::Orange,
        };
        assert!(store.add_class(other).await.unwrap().is_some());
        assert_eq!(store.snapshot().classes.len(), before.classes.len() + 1);
    }

    #[tokio::test]
    async fn test_incomplete_deadline_is_refused() {
        let store = loaded(InitialState::default()).await;
        let missing_due = NewDeadline {
            title: "Quiz".into(),
            class_name: "Art".into(),
            due: None,
            color: Color::Orange,
        };

        assert!(store.add_deadline(missing_due).await.unwrap().is_none());
        assert!(store.snapshot().deadlines.is_empty());
    }

    #[tokio::test]
    async fn test_notes_trim_and_prepend() {
        let store = loaded(InitialState::sample(now())).await;

        assert!(store.add_note("   ").await.unwrap().is_none());
        let note = store.add_note("  Buy index cards ").await.unwrap().unwrap();

        let notes = store.snapshot().notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, note.id);
        assert_eq!(notes[0].content, "Buy index cards");
        assert_eq!(notes[0].created_at, now());
    }

    #[tokio::test]
    async fn test_dispatch_and_subscribe() {
        let store = loaded(InitialState::default()).await;
        let mut updates = store.subscribe();
        updates.borrow_and_update();

        store
            .dispatch(Command::AddClass(NewClass {
                name: "History".into(),
                color: Color::Purple,
            }))
            .await
            .unwrap();

        assert!(updates.has_changed().unwrap());
        let class_id = updates.borrow_and_update().classes[0].id.clone();

        store.dispatch(Command::DeleteClass(class_id)).await.unwrap();
        assert!(updates.borrow().classes.is_empty());
    }
}
