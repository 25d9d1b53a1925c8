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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::storage::DueCard;
use crate::storage::Storage;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::interest::Interest;
use crate::types::learner::LearnerId;
use crate::types::performance::PerformanceId;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::PerformanceUpdate;
use crate::types::timestamp::Timestamp;

/// SQLite-backed storage. The connection sits behind a mutex, so every call
/// is serialized.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Counts reported by the `stats` command.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStats {
    pub card_count: usize,
    pub due_today_count: usize,
    pub interest_count: usize,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    pub fn stats(&self, learner: &LearnerId, today: Date) -> Fallible<LearnerStats> {
        let conn = self.acquire()?;
        let card_count: i64 = conn.query_row(
            "select count(*) from performance where learner_id = ?;",
            [learner],
            |row| row.get(0),
        )?;
        let due_today_count: i64 = conn.query_row(
            "select count(*) from performance where learner_id = ? and due_date <= ?;",
            (learner, today),
            |row| row.get(0),
        )?;
        let interest_count: i64 = conn.query_row(
            "select count(*) from interests where learner_id = ?;",
            [learner],
            |row| row.get(0),
        )?;
        Ok(LearnerStats {
            card_count: card_count as usize,
            due_today_count: due_today_count as usize,
            interest_count: interest_count as usize,
        })
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database connection lock poisoned"))
    }
}

impl Storage for Database {
    fn find_due_performance(&self, learner: &LearnerId, today: Date) -> Fallible<Option<DueCard>> {
        let conn = self.acquire()?;
        let sql = "select c.card_id, c.topic, c.question, c.answer, p.performance_id, p.ease_factor, p.interval_days, p.due_date, p.last_reviewed, p.review_count from performance p join cards c on c.card_id = p.card_id where p.learner_id = ? and p.due_date <= ? order by p.due_date asc, p.card_id asc limit 1;";
        let due = conn
            .query_row(sql, (learner, today), |row| {
                let card = Card::new(
                    row.get(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                );
                let performance = read_performance(row, 4, learner.clone(), card.id())?;
                Ok(DueCard { card, performance })
            })
            .optional()?;
        Ok(due)
    }

    fn list_interests(&self, learner: &LearnerId) -> Fallible<Vec<Interest>> {
        let conn = self.acquire()?;
        let sql = "select topic, score from interests where learner_id = ? order by interest_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([learner])?;
        let mut interests = Vec::new();
        while let Some(row) = rows.next()? {
            interests.push(Interest {
                learner_id: learner.clone(),
                topic: row.get(0)?,
                score: row.get(1)?,
            });
        }
        Ok(interests)
    }

    fn get_card(&self, card_id: CardId) -> Fallible<Option<Card>> {
        let conn = self.acquire()?;
        let sql = "select topic, question, answer from cards where card_id = ?;";
        let card = conn
            .query_row(sql, [card_id], |row| {
                Ok(Card::new(
                    card_id,
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .optional()?;
        Ok(card)
    }

    fn insert_card(&self, card: &Card) -> Fallible<()> {
        log::debug!("Adding new card: {}", card.id());
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        insert_card(&tx, card)?;
        tx.commit()?;
        Ok(())
    }

    fn remove_card(&self, card_id: CardId) -> Fallible<()> {
        let conn = self.acquire()?;
        conn.execute("delete from cards where card_id = ?;", [card_id])?;
        Ok(())
    }

    fn insert_performance(&self, record: &PerformanceRecord) -> Fallible<PerformanceId> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let id = insert_performance(&tx, record)?;
        tx.commit()?;
        Ok(id)
    }

    fn find_performance(
        &self,
        learner: &LearnerId,
        card_id: CardId,
    ) -> Fallible<Option<PerformanceRecord>> {
        let conn = self.acquire()?;
        let sql = "select performance_id, ease_factor, interval_days, due_date, last_reviewed, review_count from performance where learner_id = ? and card_id = ?;";
        let record = conn
            .query_row(sql, (learner, card_id), |row| {
                read_performance(row, 0, learner.clone(), card_id)
            })
            .optional()?;
        Ok(record)
    }

    fn update_performance(
        &self,
        id: PerformanceId,
        expected_revision: u32,
        update: &PerformanceUpdate,
    ) -> Fallible<bool> {
        let conn = self.acquire()?;
        let sql = "update performance set ease_factor = ?, interval_days = ?, due_date = ?, last_reviewed = ?, review_count = review_count + 1 where performance_id = ? and review_count = ?;";
        let changed = conn.execute(
            sql,
            (
                update.ease_factor,
                update.interval,
                update.due_date,
                update.reviewed_on,
                id,
                expected_revision,
            ),
        )?;
        Ok(changed == 1)
    }

    fn set_interest(&self, interest: &Interest) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "insert into interests (learner_id, topic, score) values (?, ?, ?) on conflict (learner_id, topic) do update set score = excluded.score;";
        conn.execute(sql, (&interest.learner_id, &interest.topic, interest.score))?;
        Ok(())
    }

    fn insert_card_with_performance(
        &self,
        card: &Card,
        record: &PerformanceRecord,
    ) -> Fallible<PerformanceId> {
        log::debug!("Adding new card {} for {}", card.id(), record.learner_id);
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        insert_card(&tx, card)?;
        let id = insert_performance(&tx, record)?;
        tx.commit()?;
        Ok(id)
    }
}

fn insert_card(tx: &Transaction, card: &Card) -> Fallible<()> {
    let sql = "insert into cards (card_id, topic, question, answer, created_at) values (?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            card.id(),
            card.topic(),
            card.question(),
            card.answer(),
            Timestamp::now(),
        ),
    )?;
    Ok(())
}

fn insert_performance(tx: &Transaction, record: &PerformanceRecord) -> Fallible<PerformanceId> {
    let sql = "insert into performance (learner_id, card_id, ease_factor, interval_days, due_date, last_reviewed, review_count) values (?, ?, ?, ?, ?, ?, ?) returning performance_id;";
    let id: PerformanceId = tx.query_row(
        sql,
        (
            &record.learner_id,
            record.card_id,
            record.ease_factor,
            record.interval,
            record.due_date,
            record.last_reviewed,
            record.review_count,
        ),
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Read the performance columns starting at `offset`, in the order
/// `performance_id, ease_factor, interval_days, due_date, last_reviewed,
/// review_count`.
fn read_performance(
    row: &Row,
    offset: usize,
    learner_id: LearnerId,
    card_id: CardId,
) -> rusqlite::Result<PerformanceRecord> {
    Ok(PerformanceRecord {
        id: Some(row.get(offset)?),
        learner_id,
        card_id,
        ease_factor: row.get(offset + 1)?,
        interval: row.get(offset + 2)?,
        due_date: row.get(offset + 3)?,
        last_reviewed: row.get(offset + 4)?,
        review_count: row.get(offset + 5)?,
    })
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
