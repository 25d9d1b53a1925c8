// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SM-2 style scheduling: maps a learner's feedback to a recall quality, and
//! a quality to a new ease factor and interval.

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

/// The lowest ease factor a card can have.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// The ease factor of a card that has never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// The interval of a card that has never been reviewed, in days.
pub const INITIAL_INTERVAL: u32 = 1;

/// Intervals are capped so due dates stay representable.
pub const MAX_INTERVAL: u32 = 36_500;

/// Qualities below this reset the interval.
const PASSING_QUALITY: u8 = 3;

/// What the learner said about a card after seeing it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Interaction {
    Easy,
    Good,
    Hard,
    /// Any token outside the known vocabulary. Treated as a failed recall.
    Other(String),
}

impl Interaction {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "easy" => Interaction::Easy,
            "good" => Interaction::Good,
            "hard" => Interaction::Hard,
            _ => Interaction::Other(token.to_string()),
        }
    }

    pub fn quality(&self) -> Quality {
        match self {
            Interaction::Easy => Quality(5),
            Interaction::Good => Quality(4),
            Interaction::Hard => Quality(3),
            Interaction::Other(_) => Quality(2),
        }
    }
}

/// Discretized recall strength, from 2 (failed) to 5 (perfect).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Quality(u8);

impl Quality {
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn passed(self) -> bool {
        self.0 >= PASSING_QUALITY
    }
}

/// Multiplier controlling how fast a card's interval grows. Never below
/// [`MIN_EASE_FACTOR`].
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
pub struct EaseFactor(f64);

impl EaseFactor {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(MIN_EASE_FACTOR);
        }
        Self(value.max(MIN_EASE_FACTOR))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for EaseFactor {
    fn default() -> Self {
        Self(INITIAL_EASE_FACTOR)
    }
}

/// Days until the next review. Always at least one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Interval(u32);

impl Interval {
    pub fn new(days: u32) -> Self {
        Self(days.clamp(1, MAX_INTERVAL))
    }

    pub fn days(self) -> u32 {
        self.0
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self(INITIAL_INTERVAL)
    }
}

/// Compute the ease factor and interval that follow a review of the given
/// quality.
pub fn review(
    ease_factor: EaseFactor,
    interval: Interval,
    quality: Quality,
) -> (EaseFactor, Interval) {
    if !quality.passed() {
        return (ease_factor, Interval::new(1));
    }
    let q = 5.0 - quality.value() as f64;
    let ease_factor = EaseFactor::new(ease_factor.value() + (0.1 - q * (0.08 + q * 0.02)));
    // Quality 3 follows the same growth rule as 4 and 5.
    let days = (interval.days() as f64 * ease_factor.value()).round();
    let interval = Interval::new(days.min(MAX_INTERVAL as f64) as u32);
    (ease_factor, interval)
}

impl ToSql for EaseFactor {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for EaseFactor {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let value: f64 = FromSql::column_result(value)?;
        Ok(EaseFactor::new(value))
    }
}

impl ToSql for Interval {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Interval {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let value: i64 = FromSql::column_result(value)?;
        let days = u32::try_from(value).map_err(|_| FromSqlError::OutOfRange(value))?;
        Ok(Interval::new(days))
    }
}
