// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_SECOND: i64 = 1_000;

/// Time left until a deadline, or the overdue marker once it has passed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub overdue: bool,
}

impl Remaining {
    pub const OVERDUE: Remaining = Remaining {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        overdue: true,
    };
}

/// Splits `due - now` into whole days, hours, minutes and seconds.
/// Every step truncates; nothing is rounded up.
pub fn remaining(due: NaiveDateTime, now: NaiveDateTime) -> Remaining {
    let diff = (due - now).num_milliseconds();
    if diff <= 0 {
        return Remaining::OVERDUE;
    }

    Remaining {
        days: diff / MS_PER_DAY,
        hours: (diff % MS_PER_DAY) / MS_PER_HOUR,
        minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
        seconds: (diff % MS_PER_MINUTE) / MS_PER_SECOND,
        overdue: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 9)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_one_of_each_unit() {
        let due = now() + Duration::milliseconds(90_061_000);
        assert_eq!(
            remaining(due, now()),
            Remaining {
                days: 1,
                hours: 1,
                minutes: 1,
                seconds: 1,
                overdue: false
            }
        );
    }

    #[test]
    fn test_truncates_sub_second_remainder() {
        let due = now() + Duration::milliseconds(1_999);
        let left = remaining(due, now());
        assert_eq!(left.seconds, 1);
        assert!(!left.overdue);
    }

    #[test]
    fn test_past_or_equal_is_overdue() {
        assert_eq!(remaining(now() - Duration::milliseconds(1), now()), Remaining::OVERDUE);
        assert_eq!(remaining(now(), now()), Remaining::OVERDUE);
    }

    #[test]
    fn test_five_days_out_just_after_creation() {
        let created = now();
        let due = created + Duration::days(5);
        let left = remaining(due, created + Duration::seconds(1));
        assert_eq!(left.days, 4);
        assert_eq!(left.hours, 23);
        assert_eq!(left.minutes, 59);
        assert_eq!(left.seconds, 59);
    }
}
