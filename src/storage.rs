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

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::interest::Interest;
use crate::types::learner::LearnerId;
use crate::types::performance::PerformanceId;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::PerformanceUpdate;

/// A due performance record together with its card.
#[derive(Clone, Debug)]
pub struct DueCard {
    pub card: Card,
    pub performance: PerformanceRecord,
}

/// The persistence operations the scheduler needs. Every call is atomic at
/// the row level.
pub trait Storage: Send + Sync {
    /// Find the learner's most overdue card: the lowest due date on or
    /// before `today`, ties broken by the lowest card ID.
    fn find_due_performance(&self, learner: &LearnerId, today: Date) -> Fallible<Option<DueCard>>;

    fn list_interests(&self, learner: &LearnerId) -> Fallible<Vec<Interest>>;

    fn get_card(&self, card_id: CardId) -> Fallible<Option<Card>>;

    fn insert_card(&self, card: &Card) -> Fallible<()>;

    /// Delete a card that has no performance records. Only used to undo a
    /// partially-completed insert.
    fn remove_card(&self, card_id: CardId) -> Fallible<()>;

    fn insert_performance(&self, record: &PerformanceRecord) -> Fallible<PerformanceId>;

    fn find_performance(
        &self,
        learner: &LearnerId,
        card_id: CardId,
    ) -> Fallible<Option<PerformanceRecord>>;

    /// Write the update onto the record with the given ID, bumping its
    /// review count, but only if the stored review count still equals
    /// `expected_revision`. Returns whether the update was applied.
    fn update_performance(
        &self,
        id: PerformanceId,
        expected_revision: u32,
        update: &PerformanceUpdate,
    ) -> Fallible<bool>;

    /// Insert or replace a learner's interest in a topic.
    fn set_interest(&self, interest: &Interest) -> Fallible<()>;

    /// Insert a card and its first performance record together. If the
    /// record cannot be inserted, the card is removed again.
    fn insert_card_with_performance(
        &self,
        card: &Card,
        record: &PerformanceRecord,
    ) -> Fallible<PerformanceId> {
        self.insert_card(card)?;
        match self.insert_performance(record) {
            Ok(id) => Ok(id),
            Err(e) => {
                if let Err(undo) = self.remove_card(card.id()) {
                    log::error!("failed to remove card {} after error: {undo}", card.id());
                }
                Err(e)
            }
        }
    }
}
