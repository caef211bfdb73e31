// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Live countdowns for displayed deadlines.
//!
//! Each displayed deadline owns one ticker task. The ticker recomputes
//! [`Remaining`] once per period and publishes it on a `watch` channel.
//! Dropping the handle aborts the task, so a deadline that leaves the
//! display stops ticking.

use crate::clock::SharedClock;
use chrono::NaiveDateTime;
use common::{remaining, Deadline, Remaining};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

pub const TICK: Duration = Duration::from_secs(1);

/// A running countdown. Must be created inside a tokio runtime.
pub struct CountdownHandle {
    due: NaiveDateTime,
    receiver: watch::Receiver<Remaining>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn start(due: NaiveDateTime, clock: SharedClock) -> Self {
        Self::with_period(due, clock, TICK)
    }

    pub fn with_period(due: NaiveDateTime, clock: SharedClock, period: Duration) -> Self {
        let (sender, receiver) = watch::channel(remaining(due, clock.now()));

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and the value is already set.
            interval.tick().await;
            loop {
                interval.tick().await;
                // Once overdue, always overdue, even if the clock goes back.
                let next = if sender.borrow().overdue {
                    Remaining::OVERDUE
                } else {
                    remaining(due, clock.now())
                };
                sender.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    *current = next;
                    true
                });
            }
        });

        Self { due, receiver, task }
    }

    pub fn due(&self) -> NaiveDateTime {
        self.due
    }

    pub fn current(&self) -> Remaining {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Remaining> {
        self.receiver.clone()
    }

    /// Stops ticking. Subscribers see the channel close.
    pub fn cancel(self) {}
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The set of countdowns for whatever deadlines are currently displayed.
pub struct CountdownBoard {
    clock: SharedClock,
    period: Duration,
    tickers: HashMap<String, CountdownHandle>,
}

impl CountdownBoard {
    pub fn new(clock: SharedClock) -> Self {
        Self::with_period(clock, TICK)
    }

    pub fn with_period(clock: SharedClock, period: Duration) -> Self {
        Self {
            clock,
            period,
            tickers: HashMap::new(),
        }
    }

    /// Starts a ticker for every new deadline, restarts those whose due date
    /// changed and stops those no longer listed.
    pub fn sync(&mut self, deadlines: &[Deadline]) {
        self.tickers.retain(|id, handle| {
            let keep = deadlines.iter().any(|d| &d.id == id && d.due == handle.due());
            if !keep {
                debug!("Stopping countdown for deadline {}", id);
            }
            keep
        });

        for deadline in deadlines {
            if !self.tickers.contains_key(&deadline.id) {
                debug!("Starting countdown for deadline {}", deadline.id);
                let handle =
                    CountdownHandle::with_period(deadline.due, self.clock.clone(), self.period);
                self.tickers.insert(deadline.id.clone(), handle);
            }
        }
    }

    pub fn remaining(&self, deadline_id: &str) -> Option<Remaining> {
        self.tickers.get(deadline_id).map(CountdownHandle::current)
    }

    pub fn subscribe(&self, deadline_id: &str) -> Option<watch::Receiver<Remaining>> {
        self.tickers.get(deadline_id).map(CountdownHandle::subscribe)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn clear(&mut self) {
        self.tickers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use common::Color;
    use std::sync::Arc;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 9).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn deadline(id: &str, due: NaiveDateTime) -> Deadline {
        Deadline {
            id: id.into(),
            title: "Final Exam".into(),
            class_name: "Mathematics".into(),
            due,
            color: Color::Purple,
        }
    }

    /// Moves the wall clock forward, then sleeps just past the matching
    /// ticks so the paused runtime fires them first.
    async fn tick(clock: &ManualClock, seconds: i64) {
        clock.advance(ChronoDuration::seconds(seconds));
        time::sleep(Duration::from_secs(seconds as u64) + Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_every_second() {
        let clock = ManualClock::new(start());
        let due = start() + ChronoDuration::days(5);
        let handle = CountdownHandle::start(due, Arc::new(clock.clone()));
        assert_eq!(handle.current().days, 5);

        tick(&clock, 1).await;

        let left = handle.current();
        assert_eq!((left.days, left.hours, left.minutes, left.seconds), (4, 23, 59, 59));
        assert!(!left.overdue);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_latches() {
        let clock = ManualClock::new(start());
        let due = start() + ChronoDuration::seconds(2);
        let handle = CountdownHandle::start(due, Arc::new(clock.clone()));

        tick(&clock, 3).await;
        assert!(handle.current().overdue);

        // Even a clock that jumps back does not revive it.
        clock.set(start());
        tick(&clock, 1).await;
        assert_eq!(handle.current(), Remaining::OVERDUE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_closes_the_channel() {
        let clock = ManualClock::new(start());
        let due = start() + ChronoDuration::hours(1);
        let handle = CountdownHandle::start(due, Arc::new(clock.clone()));
        let mut updates = handle.subscribe();

        handle.cancel();
        tokio::task::yield_now().await;

        assert!(updates.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_board_follows_displayed_deadlines() {
        let clock = ManualClock::new(start());
        let mut board = CountdownBoard::new(Arc::new(clock.clone()));
        let exam = deadline("d1", start() + ChronoDuration::days(5));
        let project = deadline("d2", start() + ChronoDuration::days(2));

        board.sync(&[exam.clone(), project.clone()]);
        assert_eq!(board.len(), 2);
        assert_eq!(board.remaining("d2").unwrap().days, 2);

        let mut exam_updates = board.subscribe("d1").unwrap();
        board.sync(&[project.clone()]);
        tokio::task::yield_now().await;

        assert_eq!(board.len(), 1);
        assert!(board.remaining("d1").is_none());
        assert!(exam_updates.changed().await.is_err());

        let mut postponed = project;
        postponed.due += ChronoDuration::days(1);
        board.sync(&[postponed]);
        assert_eq!(board.remaining("d2").unwrap().days, 3);

        board.clear();
        assert!(board.is_empty());
    }
}
