// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::schedule::normalize_slot;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 480;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Identifiers starting with this prefix belong to tasks that only exist
/// on the client and have not been created on the server yet.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// The four accent colors available for blocks, deadlines and classes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Purple,
    Orange,
    Cyan,
    Pink,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Purple, Color::Orange, Color::Cyan, Color::Pink];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Purple => "purple",
            Color::Orange => "orange",
            Color::Cyan => "cyan",
            Color::Pink => "pink",
        }
    }

    /// Parses a color coming from the wire. The server stores free text, so
    /// anything unknown (or missing) falls back to the entity's default color.
    pub fn parse_or(value: Option<&str>, fallback: Color) -> Color {
        value
            .and_then(|v| {
                Color::ALL
                    .into_iter()
                    .find(|c| c.as_str().eq_ignore_ascii_case(v.trim()))
            })
            .unwrap_or(fallback)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deadline priority as understood by the server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Clamps a block duration into `[15, 480]` minutes.
/// Out-of-range durations are never rejected, only clamped.
pub fn clamp_duration(minutes: i64) -> i64 {
    minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)
}

/// Trims a description and keeps at most 500 characters of it.
pub fn truncate_description(description: &str) -> String {
    description.trim().chars().take(MAX_DESCRIPTION_CHARS).collect()
}

/// A task pinned to a weekday and hour of the repeating weekly grid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimeBlock {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_minutes: i64,
    // 0 = Sunday .. 6 = Saturday
    pub day: u32,
    pub start_hour: u32,
    pub color: Color,
    pub completed: bool,
}

impl TimeBlock {
    /// Applies the write-boundary rules used on update: the title must not
    /// be blank, the description is truncated, the duration clamped and the
    /// slot normalized.
    pub fn validated(mut self) -> Option<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        self.title = title.to_string();
        self.description = truncate_description(&self.description);
        self.duration_minutes = clamp_duration(self.duration_minutes);
        (self.day, self.start_hour) = normalize_slot(self.day, self.start_hour);
        Some(self)
    }
}

/// Data captured by the "new time block" form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewTimeBlock {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: i64,
    pub day: u32,
    pub start_hour: u32,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub completed: bool,
}

impl NewTimeBlock {
    /// Same rules as [`TimeBlock::validated`]. Returns `None` when the
    /// title is blank, which callers treat as a silent refusal.
    pub fn validated(mut self) -> Option<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        self.title = title.to_string();
        self.description = truncate_description(&self.description);
        self.duration_minutes = clamp_duration(self.duration_minutes);
        (self.day, self.start_hour) = normalize_slot(self.day, self.start_hour);
        Some(self)
    }

    pub fn into_block(self, id: String) -> TimeBlock {
        TimeBlock {
            id,
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            day: self.day,
            start_hour: self.start_hour,
            color: self.color,
            completed: self.completed,
        }
    }
}

/// A one-time due date tied to a class by name.
///
/// `class_name` is not a foreign key: the class it names may have been
/// deleted, in which case the deadline simply keeps the orphaned name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Deadline {
    pub id: String,
    pub title: String,
    pub class_name: String,
    pub due: NaiveDateTime,
    pub color: Color,
}

/// Data captured by the "new deadline" form. The due date is optional here
/// because the form may be submitted without one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewDeadline {
    pub title: String,
    pub class_name: String,
    pub due: Option<NaiveDateTime>,
    #[serde(default)]
    pub color: Color,
}

/// A deadline that passed validation and is ready to be stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeadlineDraft {
    pub title: String,
    pub class_name: String,
    pub due: NaiveDateTime,
    pub color: Color,
}

impl NewDeadline {
    /// Title, class and due date are all required. Past due dates are
    /// accepted; they just show up as overdue.
    pub fn validated(self) -> Option<DeadlineDraft> {
        let title = self.title.trim();
        let class_name = self.class_name.trim();
        if title.is_empty() || class_name.is_empty() {
            return None;
        }
        Some(DeadlineDraft {
            title: title.to_string(),
            class_name: class_name.to_string(),
            due: self.due?,
            color: self.color,
        })
    }
}

impl DeadlineDraft {
    pub fn into_deadline(self, id: String) -> Deadline {
        Deadline {
            id,
            title: self.title,
            class_name: self.class_name,
            due: self.due,
            color: self.color,
        }
    }
}

/// A checklist item owned by exactly one class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Builds a client-side task that has not been persisted yet.
    pub fn unsaved(suffix: impl fmt::Display, title: impl Into<String>) -> Self {
        Self {
            id: format!("{TEMP_ID_PREFIX}{suffix}"),
            title: title.into(),
            completed: false,
        }
    }

    pub fn is_unsaved(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl NewTask {
    pub fn validated(self) -> Option<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            completed: self.completed,
        })
    }
}

/// A named class with its task checklist.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassSubject {
    pub id: String,
    pub name: String,
    pub color: Color,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ClassSubject {
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Completion as a whole percentage, truncated. A class without tasks
    /// is at 0%.
    pub fn completion_percentage(&self) -> u32 {
        percentage(self.completed_count(), self.tasks.len())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    pub name: String,
    #[serde(default)]
    pub color: Color,
}

impl NewClass {
    pub fn validated(self) -> Option<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            color: self.color,
        })
    }
}

/// Completion across every task of every class, truncated to a whole
/// percentage.
pub fn overall_completion(classes: &[ClassSubject]) -> u32 {
    let completed = classes.iter().map(ClassSubject::completed_count).sum();
    let total = classes.iter().map(|c| c.tasks.len()).sum();
    percentage(completed, total)
}

fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed * 100 / total) as u32
}

/// A free-text memo. `created_at` is set once and never changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}
