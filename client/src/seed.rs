// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{Duration, NaiveDateTime};
use common::{ClassSubject, Color, Deadline, Note, Task, TimeBlock};

/// The four collections a [`MemoryBackend`](crate::MemoryBackend) starts from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialState {
    pub time_blocks: Vec<TimeBlock>,
    pub deadlines: Vec<Deadline>,
    pub classes: Vec<ClassSubject>,
    pub notes: Vec<Note>,
}

impl InitialState {
    /// Demo data shown when no service is configured. Due dates and the
    /// note timestamp are relative to `now`.
    pub fn sample(now: NaiveDateTime) -> Self {
        Self {
            time_blocks: Vec::new(),
            deadlines: vec![
                Deadline {
                    id: "d1".into(),
                    title: "Final Exam".into(),
                    class_name: "Mathematics".into(),
                    due: now + Duration::days(5),
                    color: Color::Purple,
                },
                Deadline {
                    id: "d2".into(),
                    title: "Project Submission".into(),
                    class_name: "Computer Science".into(),
                    due: now + Duration::days(2),
                    color: Color::Cyan,
                },
            ],
            classes: vec![
                class(
                    "1",
                    "Mathematics",
                    Color::Purple,
                    &[
                        ("t1", "Complete Chapter 5 exercises", true),
                        ("t2", "Review quadratic formulas", false),
                        ("t3", "Practice integration problems", false),
                    ],
                ),
                class(
                    "2",
                    "Computer Science",
                    Color::Cyan,
                    &[
                        ("t4", "Finish algorithm assignment", true),
                        ("t5", "Study data structures", true),
                        ("t6", "Build portfolio project", false),
                    ],
                ),
                class(
                    "3",
                    "Physics",
                    Color::Orange,
                    &[
                        ("t7", "Lab report on optics", false),
                        ("t8", "Revise thermodynamics", false),
                    ],
                ),
            ],
            notes: vec![Note {
                id: "n1".into(),
                content: "Remember to review the integration by parts technique before the exam!"
                    .into(),
                created_at: now - Duration::hours(2),
            }],
        }
    }
}

fn class(id: &str, name: &str, color: Color, tasks: &[(&str, &str, bool)]) -> ClassSubject {
    ClassSubject {
        id: id.into(),
        name: name.into(),
        color,
        tasks: tasks
            .iter()
            .map(|(id, title, completed)| Task {
                id: (*id).into(),
                title: (*title).into(),
                completed: *completed,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::overall_completion;

    #[test]
    fn test_sample_state() {
        let now = NaiveDate::from_ymd_opt(2025, 7, 9).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let state = InitialState::sample(now);

        assert!(state.time_blocks.is_empty());
        assert_eq!(state.classes.len(), 3);
        // 3 of 8 tasks are done.
        assert_eq!(overall_completion(&state.classes), 37);
        assert_eq!(state.deadlines[1].due, now + Duration::days(2));
        assert_eq!(state.notes[0].created_at.to_string(), "2025-07-09 08:00:00");
    }
}
