// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Translation between the REST records and the planner's view model.

use crate::model::{
    ClassSubject, Color, Deadline, DeadlineDraft, NewClass, NewTimeBlock, Note, Task, TimeBlock,
};
use crate::schedule::{interval_to_slot, slot_to_interval, Interval};
use crate::wire::{
    CreateDeadline, CreateItem, CreateNote, CreateSession, CreateSubject, DeadlineRecord,
    ItemRecord, NoteRecord, SessionRecord, SubjectRecord, UpdateSession,
};
use chrono::NaiveDateTime;

/// Every note created from the planner carries this title; the content is
/// what matters.
pub const NOTE_TITLE: &str = "Note";

pub fn session_to_time_block(session: &SessionRecord) -> TimeBlock {
    let fields = interval_to_slot(&Interval {
        start: session.start_time,
        end: session.end_time,
    });
    TimeBlock {
        id: session.id.to_string(),
        title: session.title.clone(),
        description: session.description.clone().unwrap_or_default(),
        duration_minutes: fields.duration_minutes,
        day: fields.day,
        start_hour: fields.start_hour,
        color: Color::parse_or(Some(&session.color), Color::Purple),
        completed: session.is_completed,
    }
}

/// Anchors a new block to the next occurrence of its weekday after `now`.
pub fn new_block_to_session(block: &NewTimeBlock, now: NaiveDateTime) -> CreateSession {
    let interval = slot_to_interval(block.day, block.start_hour, block.duration_minutes, now);
    CreateSession {
        title: block.title.clone(),
        description: Some(block.description.clone()),
        subject: None,
        color: Some(block.color.to_string()),
        start_time: interval.start,
        end_time: interval.end,
        is_completed: Some(block.completed),
    }
}

/// Full update for an edited or moved block. The stored date is discarded
/// and re-anchored relative to `now`.
pub fn block_to_session_update(block: &TimeBlock, now: NaiveDateTime) -> UpdateSession {
    let interval = slot_to_interval(block.day, block.start_hour, block.duration_minutes, now);
    UpdateSession {
        title: Some(block.title.clone()),
        description: Some(block.description.clone()),
        subject: None,
        color: Some(block.color.to_string()),
        start_time: Some(interval.start),
        end_time: Some(interval.end),
        is_completed: Some(block.completed),
    }
}

pub fn deadline_from_record(record: &DeadlineRecord) -> Deadline {
    Deadline {
        id: record.id.to_string(),
        title: record.title.clone(),
        class_name: record.subject.clone().unwrap_or_default(),
        due: record.due_date,
        color: Color::parse_or(Some(&record.color), Color::Orange),
    }
}

pub fn draft_to_create_deadline(draft: &DeadlineDraft) -> CreateDeadline {
    CreateDeadline {
        title: draft.title.clone(),
        description: None,
        subject: Some(draft.class_name.clone()),
        color: Some(draft.color.to_string()),
        due_date: draft.due,
        priority: None,
        is_completed: None,
    }
}

pub fn note_from_record(record: &NoteRecord) -> Note {
    Note {
        id: record.id.to_string(),
        content: record.content.clone(),
        created_at: record.created_at,
    }
}

pub fn note_payload(content: &str) -> CreateNote {
    CreateNote {
        title: NOTE_TITLE.to_string(),
        content: content.to_string(),
        subject: None,
        session_id: None,
        show_date: None,
    }
}

pub fn task_from_item(item: &ItemRecord) -> Task {
    Task {
        id: item.id.to_string(),
        title: item.title.clone(),
        completed: item.is_completed,
    }
}

pub fn task_payload(class: &ClassSubject, title: &str, completed: bool) -> CreateItem {
    CreateItem {
        title: title.to_string(),
        description: None,
        subject: Some(class.name.clone()),
        is_completed: Some(completed),
        order: None,
        deadline_id: None,
    }
}

pub fn class_payload(class: &NewClass) -> CreateSubject {
    CreateSubject {
        name: class.name.clone(),
        color: Some(class.color.to_string()),
    }
}

/// Joins subjects with the items whose `subject` matches the subject name.
/// Items pointing at a subject that no longer exists are dropped.
pub fn classes_from_records(subjects: &[SubjectRecord], items: &[ItemRecord]) -> Vec<ClassSubject> {
    subjects
        .iter()
        .map(|subject| ClassSubject {
            id: subject.id.to_string(),
            name: subject.name.clone(),
            color: Color::parse_or(Some(&subject.color), Color::Purple),
            tasks: items
                .iter()
                .filter(|item| item.subject.as_deref() == Some(subject.name.as_str()))
                .map(task_from_item)
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn subject(id: i64, name: &str, color: &str) -> SubjectRecord {
        SubjectRecord {
            id,
            name: name.into(),
            color: color.into(),
            created_at: at(1, 0, 0),
        }
    }

    fn item(id: i64, subject: Option<&str>, done: bool) -> ItemRecord {
        ItemRecord {
            id,
            title: format!("item {id}"),
            description: None,
            subject: subject.map(str::to_string),
            is_completed: done,
            order: id,
            deadline_id: None,
            created_at: at(1, 8, 0),
            updated_at: at(1, 8, 0),
            completed_at: None,
        }
    }

    #[test]
    fn test_session_maps_to_block() {
        // 2025-07-10 is a Thursday.
        let session = SessionRecord {
            id: 42,
            title: "Physics lab".into(),
            description: None,
            subject: None,
            color: "unknown".into(),
            start_time: at(10, 9, 30),
            end_time: at(10, 9, 30) + Duration::minutes(50),
            is_completed: true,
            created_at: at(1, 0, 0),
            updated_at: at(1, 0, 0),
        };
        let block = session_to_time_block(&session);
        assert_eq!(block.id, "42");
        assert_eq!(block.day, 4);
        assert_eq!(block.start_hour, 9);
        assert_eq!(block.duration_minutes, 50);
        assert_eq!(block.description, "");
        assert_eq!(block.color, Color::Purple);
        assert!(block.completed);
    }

    #[test]
    fn test_block_update_reanchors_from_now() {
        let block = TimeBlock {
            id: "3".into(),
            title: "Review".into(),
            description: "ch. 2".into(),
            duration_minutes: 60,
            day: 5,
            start_hour: 14,
            color: Color::Cyan,
            completed: false,
        };
        // Wednesday 2025-07-09: Friday is 2025-07-11.
        let update = block_to_session_update(&block, at(9, 18, 0));
        assert_eq!(update.start_time, Some(at(11, 14, 0)));
        assert_eq!(update.end_time, Some(at(11, 15, 0)));
        assert_eq!(update.color.as_deref(), Some("cyan"));
        assert_eq!(update.is_completed, Some(false));
    }

    #[test]
    fn test_deadline_without_subject_has_empty_class_name() {
        let record = DeadlineRecord {
            id: 1,
            title: "Essay".into(),
            description: None,
            subject: None,
            color: "".into(),
            due_date: at(20, 23, 59),
            priority: "medium".into(),
            is_completed: false,
            created_at: at(1, 0, 0),
            updated_at: at(1, 0, 0),
        };
        let deadline = deadline_from_record(&record);
        assert_eq!(deadline.class_name, "");
        assert_eq!(deadline.color, Color::Orange);
    }

    #[test]
    fn test_classes_join_items_by_subject_name() {
        let subjects = vec![
            subject(1, "Math", "purple"),
            subject(2, "Art", "pink"),
        ];
        let items = vec![
            item(10, Some("Math"), true),
            item(11, Some("Art"), false),
            item(12, Some("Math"), false),
            item(13, None, false),
            item(14, Some("History"), true),
        ];
        let classes = classes_from_records(&subjects, &items);
        assert_eq!(classes.len(), 2);
        let ids: Vec<_> = classes[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["10", "12"]);
        assert_eq!(classes[1].tasks.len(), 1);
        assert_eq!(classes[1].color, Color::Pink);
    }

    #[test]
    fn test_note_payload_uses_fixed_title() {
        let payload = note_payload("Bring calculator");
        assert_eq!(payload.title, NOTE_TITLE);
        assert_eq!(payload.content, "Bring calculator");
    }
}
