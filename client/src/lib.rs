// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Client side of the study planner: the collection store the UI reads
//! from and issues commands against, its two backends (seeded in-memory
//! data or the REST service), and the per-deadline countdown tickers.

pub mod api;
pub mod backend;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod error;
pub mod reconcile;
pub mod seed;
pub mod store;

pub use api::ApiClient;
pub use backend::{Backend, MemoryBackend, RemoteBackend};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::ClientConfig;
pub use countdown::{CountdownBoard, CountdownHandle};
pub use error::{ApiError, Result};
pub use reconcile::{diff_tasks, TaskOp};
pub use seed::InitialState;
pub use store::{Command, Snapshot, Store};
