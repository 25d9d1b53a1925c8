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

use crate::sm2::EaseFactor;
use crate::sm2::Interval;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::learner::LearnerId;

/// Row identifier of a performance record.
pub type PerformanceId = i64;

/// A learner's memory state for one card.
#[derive(Clone, PartialEq, Debug)]
pub struct PerformanceRecord {
    /// Unset until the record has been stored.
    pub id: Option<PerformanceId>,
    pub learner_id: LearnerId,
    pub card_id: CardId,
    pub ease_factor: EaseFactor,
    pub interval: Interval,
    pub due_date: Date,
    /// The date of the last review, if any.
    pub last_reviewed: Option<Date>,
    /// The number of reviews applied. Also the record's revision number: an
    /// update only applies against the revision it was computed from.
    pub review_count: u32,
}

impl PerformanceRecord {
    /// The state of a card the learner has just been shown for the first
    /// time: default ease and interval, due immediately.
    pub fn initial(learner_id: LearnerId, card_id: CardId, today: Date) -> Self {
        Self {
            id: None,
            learner_id,
            card_id,
            ease_factor: EaseFactor::default(),
            interval: Interval::default(),
            due_date: today,
            last_reviewed: None,
            review_count: 0,
        }
    }
}

/// The fields the review updater writes back.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PerformanceUpdate {
    pub ease_factor: EaseFactor,
    pub interval: Interval,
    pub due_date: Date,
    pub reviewed_on: Date,
}
