//! Walk-forward train/test partitioning
//!
//! Each split is a train window of `train_days` calendar days followed
//! immediately by a test window of `test_days` days. The anchor moves forward
//! by `step_days` until the test window would run past the last date.
//! Test dates always come strictly after train dates.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::error::{CoreError, CoreResult};

/// Inclusive calendar range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One train/test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardSplit {
    /// Observed dates inside the train window
    pub train: Vec<NaiveDate>,
    /// Observed dates inside the test window
    pub test: Vec<NaiveDate>,
    pub train_range: DateRange,
    pub test_range: DateRange,
}

fn add_days(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
}

/// Partition observed dates into rolling train/test splits
///
/// Dates may be unsorted and repeated. Calendar windows that contain no
/// observed date on either side are skipped.
///
/// # Errors
/// `InvalidInput` when any window length is zero.
pub fn walk_forward_split(
    dates: &[NaiveDate],
    train_days: u32,
    test_days: u32,
    step_days: u32,
) -> CoreResult<Vec<WalkForwardSplit>> {
    if train_days == 0 || test_days == 0 || step_days == 0 {
        return Err(CoreError::InvalidInput(format!(
            "walk-forward windows must be positive (train={}, test={}, step={})",
            train_days, test_days, step_days
        )));
    }

    let observed: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let (Some(&first), Some(&last)) = (observed.first(), observed.last()) else {
        return Ok(Vec::new());
    };

    let mut splits = Vec::new();
    let mut anchor = first;

    loop {
        let Some(train_end) = add_days(anchor, train_days - 1) else {
            break;
        };
        let Some(test_start) = add_days(train_end, 1) else {
            break;
        };
        let Some(test_end) = add_days(test_start, test_days - 1) else {
            break;
        };

        if test_end > last {
            break;
        }

        let train: Vec<NaiveDate> = observed.range(anchor..=train_end).copied().collect();
        let test: Vec<NaiveDate> = observed.range(test_start..=test_end).copied().collect();

        if !train.is_empty() && !test.is_empty() {
            splits.push(WalkForwardSplit {
                train,
                test,
                train_range: DateRange {
                    start: anchor,
                    end: train_end,
                },
                test_range: DateRange {
                    start: test_start,
                    end: test_end,
                },
            });
        }

        match add_days(anchor, step_days) {
            Some(next) => anchor = next,
            None => break,
        }
    }

    Ok(splits)
}
