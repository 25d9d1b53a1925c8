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

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::schedule::Scheduler;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::interest::Interest;
use crate::types::learner::LearnerId;
use crate::types::performance::PerformanceRecord;

/// Which end of a learner's interests to practice when nothing is due.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    /// Practice the least-interesting topic.
    Remediate,
    /// Practice the most-interesting topic.
    Reinforce,
}

impl Strategy {
    /// Flip a fair coin.
    pub fn flip<R: Rng>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Strategy::Remediate
        } else {
            Strategy::Reinforce
        }
    }
}

/// Pick the lowest- or highest-scoring topic. On ties in score, the topic
/// listed first wins for `Remediate`, and the one listed last for
/// `Reinforce`.
pub fn pick_topic(interests: &[Interest], strategy: Strategy) -> Option<&str> {
    let mut sorted: Vec<&Interest> = interests.iter().collect();
    sorted.sort_by(|a, b| a.score.total_cmp(&b.score));
    let interest = match strategy {
        Strategy::Remediate => sorted.first(),
        Strategy::Reinforce => sorted.last(),
    };
    interest.map(|interest| interest.topic.as_str())
}

impl Scheduler {
    /// Choose the card the learner should see next.
    ///
    /// A due card always wins. Otherwise a new card is generated for a topic
    /// chosen from the learner's interests (or the fallback topics if they
    /// have none), and stored together with a fresh performance record that
    /// is due today.
    pub async fn select_next<R: Rng>(
        &self,
        learner: &LearnerId,
        today: Date,
        rng: &mut R,
    ) -> Fallible<Card> {
        if let Some(due) = self.storage.find_due_performance(learner, today)? {
            log::debug!(
                "{learner}: card {} due since {}",
                due.card.id(),
                due.performance.due_date
            );
            return Ok(due.card);
        }

        let topic = self.choose_topic(learner, rng)?;
        let nonce: [u8; 16] = rng.r#gen();

        let content = self.source.generate(&topic).await?.validate()?;
        let id = CardId::generate(&topic, &content.question, &content.answer, nonce);
        let card = Card::new(id, topic, content.question, content.answer);
        let record = PerformanceRecord::initial(learner.clone(), card.id(), today);
        self.storage.insert_card_with_performance(&card, &record)?;
        log::debug!("{learner}: generated card {} on {}", card.id(), card.topic());
        Ok(card)
    }

    fn choose_topic<R: Rng>(&self, learner: &LearnerId, rng: &mut R) -> Fallible<String> {
        let interests = self.storage.list_interests(learner)?;
        if interests.is_empty() {
            let topic = self
                .fallback_topics
                .choose(rng)
                .ok_or_else(|| ErrorReport::validation("no fallback topics configured"))?;
            log::debug!("{learner}: no interests, using fallback topic {topic}");
            return Ok(topic.clone());
        }
        let strategy = Strategy::flip(rng);
        let topic = pick_topic(&interests, strategy)
            .ok_or_else(|| ErrorReport::new("no interests to choose from"))?;
        log::debug!("{learner}: {strategy:?} picked {topic}");
        Ok(topic.to_string())
    }
}
