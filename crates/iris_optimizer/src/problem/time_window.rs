use serde::Serialize;

use crate::error::InputError;

use super::units::{Duration, UserDuration, scale_from_user_duration, scale_to_user_duration};

/// Time window in scaled units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: Duration,
    end: Duration,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: 0,
            end: scale_from_user_duration(UserDuration::MAX),
        }
    }
}

impl TimeWindow {
    pub fn new(start: UserDuration, end: UserDuration) -> Result<Self, InputError> {
        if start > end {
            return Err(InputError::InvalidTimeWindow { start, end });
        }

        Ok(Self {
            start: scale_from_user_duration(start),
            end: scale_from_user_duration(end),
        })
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn end(&self) -> Duration {
        self.end
    }

    pub fn user_start(&self) -> UserDuration {
        scale_to_user_duration(self.start)
    }

    pub fn user_end(&self) -> UserDuration {
        scale_to_user_duration(self.end)
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, time: Duration) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn is_default(&self) -> bool {
        *self == TimeWindow::default()
    }
}

/// Checks that windows are sorted and pairwise disjoint.
pub fn validate_time_windows(time_windows: &[TimeWindow], owner: &str) -> Result<(), InputError> {
    if time_windows
        .windows(2)
        .any(|pair| pair[1].start <= pair[0].end)
    {
        return Err(InputError::OverlappingTimeWindows(owner.to_owned()));
    }

    Ok(())
}

/// Earliest service start at or after `time` within one of `time_windows`.
pub fn earliest_start(time_windows: &[TimeWindow], time: Duration) -> Option<Duration> {
    time_windows
        .iter()
        .find(|tw| time <= tw.end)
        .map(|tw| time.max(tw.start))
}

/// Latest service start at or before `time` within one of `time_windows`.
pub fn latest_start(time_windows: &[TimeWindow], time: Duration) -> Option<Duration> {
    time_windows
        .iter()
        .rev()
        .find(|tw| tw.start <= time)
        .map(|tw| time.min(tw.end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_window() {
        assert_eq!(
            TimeWindow::new(10, 5),
            Err(InputError::InvalidTimeWindow { start: 10, end: 5 })
        );
    }

    #[test]
    fn test_earliest_and_latest_start() {
        let tws = vec![
            TimeWindow::new(10, 20).unwrap(),
            TimeWindow::new(40, 50).unwrap(),
        ];

        assert_eq!(earliest_start(&tws, 0), Some(1000));
        assert_eq!(earliest_start(&tws, 1500), Some(1500));
        assert_eq!(earliest_start(&tws, 2500), Some(4000));
        assert_eq!(earliest_start(&tws, 5001), None);

        assert_eq!(latest_start(&tws, 999), None);
        assert_eq!(latest_start(&tws, 3000), Some(2000));
        assert_eq!(latest_start(&tws, 9000), Some(5000));
    }

    #[test]
    fn test_validate_time_windows() {
        let sorted = vec![
            TimeWindow::new(0, 10).unwrap(),
            TimeWindow::new(11, 20).unwrap(),
        ];
        assert!(validate_time_windows(&sorted, "job 1").is_ok());

        let overlapping = vec![
            TimeWindow::new(0, 10).unwrap(),
            TimeWindow::new(5, 20).unwrap(),
        ];
        assert_eq!(
            validate_time_windows(&overlapping, "job 1"),
            Err(InputError::OverlappingTimeWindows("job 1".into()))
        );
    }
}
