// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Turns "here is the task list I want" into the individual writes that
//! get a class from its stored list to that list.

use common::{NewTask, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOp {
    Toggle { id: String, completed: bool },
    Create(NewTask),
    Delete { id: String },
}

/// Compares tasks by id.
///
/// * present in both with a different `completed`: one toggle
/// * only in `desired` with a temporary id: one create
/// * only in `current`: one delete
///
/// A desired task with a non-temporary id that is not stored is ignored.
/// Title edits are not detected. Ops come out as toggles, then creates,
/// then deletes, each group in list order.
pub fn diff_tasks(current: &[Task], desired: &[Task]) -> Vec<TaskOp> {
    let mut toggles = Vec::new();
    let mut creates = Vec::new();

    for task in desired {
        match current.iter().find(|c| c.id == task.id) {
            Some(stored) if stored.completed != task.completed => toggles.push(TaskOp::Toggle {
                id: task.id.clone(),
                completed: task.completed,
            }),
            Some(_) => {}
            None if task.is_unsaved() => creates.push(TaskOp::Create(NewTask {
                title: task.title.clone(),
                completed: task.completed,
            })),
            None => {}
        }
    }

    let deletes = current
        .iter()
        .filter(|stored| !desired.iter().any(|t| t.id == stored.id))
        .map(|stored| TaskOp::Delete {
            id: stored.id.clone(),
        });

    toggles.into_iter().chain(creates).chain(deletes).collect()
}
