// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Conversions between the weekly grid (weekday + hour + duration) and the
//! absolute intervals the server stores.
//!
//! The mapping is lossy on purpose: a slot always resolves to the *next*
//! occurrence of its weekday relative to `now` (today included), so saving
//! a block again re-anchors it to the upcoming week.

use crate::model::TimeBlock;
use chrono::{Datelike, Days, Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: u32 = 7;
const HOURS_PER_DAY: u32 = 24;
/// First hour shown on the weekly grid (06:00).
pub const GRID_FIRST_HOUR: u32 = 6;
/// Number of hour rows on the grid (06:00 to 21:00).
pub const GRID_HOURS: usize = 16;

/// An absolute `[start, end)` interval.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// The grid-facing fields recovered from an interval.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotFields {
    pub day: u32,
    pub start_hour: u32,
    pub duration_minutes: i64,
}

/// Weekdays outside `0..=6` wrap around instead of being rejected.
pub fn normalize_day(day: u32) -> u32 {
    day % DAYS_PER_WEEK
}

/// Folds a start hour past 23 into the following days, so `(3, 25)`
/// becomes `(4, 1)`. Both results are always in range.
pub fn normalize_slot(day: u32, start_hour: u32) -> (u32, u32) {
    let carry = (start_hour / HOURS_PER_DAY) % DAYS_PER_WEEK;
    (
        (normalize_day(day) + carry) % DAYS_PER_WEEK,
        start_hour % HOURS_PER_DAY,
    )
}

/// Resolves a weekly slot to the upcoming interval for that weekday.
///
/// The slot is normalized first, so hours past 23 land on a later weekday
/// rather than failing. Durations too large to represent saturate.
pub fn slot_to_interval(
    day: u32,
    start_hour: u32,
    duration_minutes: i64,
    now: NaiveDateTime,
) -> Interval {
    let (day, start_hour) = normalize_slot(day, start_hour);
    let today = now.weekday().num_days_from_sunday();
    let days_until_target = (day + DAYS_PER_WEEK - today) % DAYS_PER_WEEK;

    let date = now
        .date()
        .checked_add_days(Days::new(u64::from(days_until_target)))
        .unwrap_or(now.date());
    let start = date.and_time(NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap_or_default());
    let end = Duration::try_minutes(duration_minutes)
        .and_then(|span| start.checked_add_signed(span))
        .unwrap_or(if duration_minutes < 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        });

    Interval { start, end }
}

/// Recovers the grid fields of a stored interval. Minutes past the hour are
/// dropped (09:30 lands in the 9 o'clock row); the duration is rounded to
/// the nearest minute.
pub fn interval_to_slot(interval: &Interval) -> SlotFields {
    let millis = (interval.end - interval.start).num_milliseconds();
    SlotFields {
        day: interval.start.weekday().num_days_from_sunday(),
        start_hour: interval.start.hour(),
        duration_minutes: (millis as f64 / 60_000.0).round() as i64,
    }
}

/// True when the block starts in the given grid cell.
pub fn occupies_slot(block: &TimeBlock, day: u32, hour: u32) -> bool {
    block.day == day && block.start_hour == hour
}

/// Every block starting in the given cell. Overlapping blocks simply stack.
pub fn blocks_in_slot(blocks: &[TimeBlock], day: u32, hour: u32) -> Vec<&TimeBlock> {
    blocks
        .iter()
        .filter(|block| occupies_slot(block, day, hour))
        .collect()
}

/// Builds the 7 × 16 display grid, indexed as `grid[day][hour - 6]`.
/// Blocks starting outside 06:00-21:00 are not shown.
pub fn week_grid(blocks: &[TimeBlock]) -> [[Vec<&TimeBlock>; GRID_HOURS]; DAYS_PER_WEEK as usize] {
    std::array::from_fn(|day| {
        std::array::from_fn(|row| blocks_in_slot(blocks, day as u32, GRID_FIRST_HOUR + row as u32))
    })
}

/// Returns a copy of `block` dropped into another slot. Everything except
/// the weekday and start hour is carried over. The slot is normalized the
/// same way [`slot_to_interval`] does it.
pub fn move_block(block: &TimeBlock, day: u32, hour: u32) -> TimeBlock {
    let (day, start_hour) = normalize_slot(day, hour);
    TimeBlock {
        day,
        start_hour,
        ..block.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use chrono::NaiveDate;

    // 2025-07-09 is a Wednesday (day 3).
    fn wednesday_afternoon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 9)
            .unwrap()
            .and_hms_milli_opt(15, 42, 17, 250)
            .unwrap()
    }

    fn sample_block() -> TimeBlock {
        TimeBlock {
            id: "b1".into(),
            title: "X".into(),
            description: "notes".into(),
            duration_minutes: 45,
            day: 1,
            start_hour: 9,
            color: Color::Pink,
            completed: true,
        }
    }

    #[test]
    fn test_slot_to_interval_picks_next_occurrence() {
        let now = wednesday_afternoon();

        // Friday is two days ahead.
        let friday = slot_to_interval(5, 10, 90, now);
        let expected_start = NaiveDate::from_ymd_opt(2025, 7, 11)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(friday.start, expected_start);
        assert_eq!(friday.end, expected_start + Duration::minutes(90));

        // Monday already passed this week, so it lands next week.
        let monday = slot_to_interval(1, 8, 30, now);
        assert_eq!(monday.start.date(), NaiveDate::from_ymd_opt(2025, 7, 14).unwrap());

        // Today's weekday resolves to today, even if the hour has passed.
        let today = slot_to_interval(3, 9, 30, now);
        assert_eq!(today.start.date(), now.date());
        assert_eq!(today.start.time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_round_trip_preserves_slot_fields() {
        let anchors = [
            wednesday_afternoon(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap().and_hms_opt(23, 59, 59).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        ];
        for now in anchors {
            for day in 0..7 {
                for hour in [6, 9, 13, 21] {
                    for duration in [15, 45, 480] {
                        let interval = slot_to_interval(day, hour, duration, now);
                        let fields = interval_to_slot(&interval);
                        assert_eq!(
                            fields,
                            SlotFields {
                                day,
                                start_hour: hour,
                                duration_minutes: duration,
                            },
                            "round trip failed for day={day} hour={hour} now={now}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_interval_to_slot_drops_minutes_and_rounds_duration() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 8).unwrap().and_hms_opt(9, 30, 0).unwrap();
        let interval = Interval {
            start,
            end: start + Duration::seconds(44 * 60 + 40),
        };
        let fields = interval_to_slot(&interval);
        assert_eq!(fields.day, 2);
        assert_eq!(fields.start_hour, 9);
        assert_eq!(fields.duration_minutes, 45);
    }

    #[test]
    fn test_out_of_range_day_wraps() {
        let now = wednesday_afternoon();
        assert_eq!(slot_to_interval(10, 9, 30, now), slot_to_interval(3, 9, 30, now));
        assert_eq!(interval_to_slot(&slot_to_interval(8, 9, 30, now)).day, 1);
    }

    #[test]
    fn test_hours_past_midnight_spill_over() {
        let now = wednesday_afternoon();
        let interval = slot_to_interval(3, 25, 30, now);
        assert_eq!(interval.start.date(), NaiveDate::from_ymd_opt(2025, 7, 10).unwrap());
        assert_eq!(interval.start.hour(), 1);
        assert_eq!(normalize_slot(3, 25), (4, 1));
        assert_eq!(normalize_slot(6, 48), (1, 0));
    }

    #[test]
    fn test_extreme_slot_values_do_not_panic() {
        let now = wednesday_afternoon();

        let interval = slot_to_interval(u32::MAX, u32::MAX, 30, now);
        let (day, hour) = normalize_slot(u32::MAX, u32::MAX);
        assert_eq!(interval_to_slot(&interval).day, day);
        assert_eq!(interval.start.hour(), hour);
        assert!(hour < 24 && day < 7);

        let endless = slot_to_interval(3, 9, i64::MAX, now);
        assert_eq!(endless.end, NaiveDateTime::MAX);
        let backwards = slot_to_interval(3, 9, i64::MIN, now);
        assert_eq!(backwards.end, NaiveDateTime::MIN);
    }

    #[test]
    fn test_occupies_slot() {
        let block = sample_block();
        assert!(occupies_slot(&block, 1, 9));
        assert!(!occupies_slot(&block, 1, 10));
        assert!(!occupies_slot(&block, 2, 9));
    }

    #[test]
    fn test_overlapping_blocks_stack_in_one_cell() {
        let first = sample_block();
        let mut second = sample_block();
        second.id = "b2".into();
        let mut elsewhere = sample_block();
        elsewhere.id = "b3".into();
        elsewhere.start_hour = 5; // before the grid starts

        let blocks = vec![first, second, elsewhere];
        assert_eq!(blocks_in_slot(&blocks, 1, 9).len(), 2);

        let grid = week_grid(&blocks);
        assert_eq!(grid[1][9 - GRID_FIRST_HOUR as usize].len(), 2);
        let shown: usize = grid.iter().flatten().map(Vec::len).sum();
        assert_eq!(shown, 2);
    }

    #[test]
    fn test_move_block_only_changes_slot() {
        let block = sample_block();
        let moved = move_block(&block, 3, 14);
        assert_eq!(moved.day, 3);
        assert_eq!(moved.start_hour, 14);
        assert_eq!(
            moved,
            TimeBlock {
                day: 3,
                start_hour: 14,
                ..block.clone()
            }
        );

        let wrapped = move_block(&block, 2, u32::MAX);
        assert_eq!((wrapped.day, wrapped.start_hour), normalize_slot(2, u32::MAX));
        assert_eq!(wrapped.title, block.title);
    }
}
