// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Shared types for the study planner: the view model used by the store,
//! the weekly-slot arithmetic, the deadline countdown and the REST wire
//! format spoken between the client and the server.

pub mod convert;
pub mod countdown;
pub mod model;
pub mod schedule;
pub mod wire;

pub use countdown::{remaining, Remaining};
pub use model::{
    clamp_duration, overall_completion, ClassSubject, Color, Deadline, DeadlineDraft, NewClass,
    NewDeadline, NewTask, NewTimeBlock, Note, Priority, Task, TimeBlock,
};
pub use schedule::{
    blocks_in_slot, interval_to_slot, move_block, occupies_slot, slot_to_interval, week_grid,
    Interval, SlotFields,
};
