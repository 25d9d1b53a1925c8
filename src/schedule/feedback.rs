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

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::schedule::Scheduler;
use crate::sm2::Interaction;
use crate::sm2::review;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::learner::LearnerId;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::PerformanceUpdate;

/// How many times to re-read and re-apply a review that lost a race with a
/// concurrent review of the same card.
const MAX_ATTEMPTS: usize = 5;

impl Scheduler {
    /// Apply the learner's feedback on a card to its performance record.
    ///
    /// The card must exist. A missing performance record is created with
    /// default values first. Returns the values that were written.
    pub fn record_feedback(
        &self,
        learner: &LearnerId,
        card_id: CardId,
        interaction: &Interaction,
        today: Date,
    ) -> Fallible<PerformanceUpdate> {
        if self.storage.get_card(card_id)?.is_none() {
            return Err(ErrorReport::not_found(format!("no card with id {card_id}")));
        }
        let quality = interaction.quality();
        for _ in 0..MAX_ATTEMPTS {
            let record = self.find_or_create_performance(learner, card_id, today)?;
            let id = record
                .id
                .ok_or_else(|| ErrorReport::new("performance record has no id"))?;
            let (ease_factor, interval) = review(record.ease_factor, record.interval, quality);
            let update = PerformanceUpdate {
                ease_factor,
                interval,
                due_date: today.plus_days(interval.days())?,
                reviewed_on: today,
            };
            if self
                .storage
                .update_performance(id, record.review_count, &update)?
            {
                log::debug!(
                    "{} {learner} q={} EF={:.2} I={}d due={}",
                    &card_id.to_hex()[..8],
                    quality.value(),
                    update.ease_factor.value(),
                    update.interval.days(),
                    update.due_date
                );
                return Ok(update);
            }
            log::debug!("{learner}: concurrent review of {card_id}, retrying");
        }
        Err(ErrorReport::new(format!(
            "gave up reviewing card {card_id} after {MAX_ATTEMPTS} conflicting updates"
        )))
    }

    fn find_or_create_performance(
        &self,
        learner: &LearnerId,
        card_id: CardId,
        today: Date,
    ) -> Fallible<PerformanceRecord> {
        if let Some(record) = self.storage.find_performance(learner, card_id)? {
            return Ok(record);
        }
        log::warn!("{learner}: no performance record for card {card_id}, creating one");
        let mut record = PerformanceRecord::initial(learner.clone(), card_id, today);
        match self.storage.insert_performance(&record) {
            Ok(id) => {
                record.id = Some(id);
                Ok(record)
            }
            // Another request may have created it in the meantime.
            Err(e) => match self.storage.find_performance(learner, card_id)? {
                Some(record) => Ok(record),
                None => Err(e),
            },
        }
    }
}
