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

//! The scheduling core: choosing the next card for a learner, and updating a
//! card's memory state after feedback.

mod feedback;
mod select;

use std::sync::Arc;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::generator::ContentSource;
use crate::storage::Storage;

/// Holds the scheduler's collaborators. Cloning is cheap, and every
/// operation runs independently: there is no shared mutable state besides
/// what the storage persists.
#[derive(Clone)]
pub struct Scheduler {
    storage: Arc<dyn Storage>,
    source: Arc<dyn ContentSource>,
    fallback_topics: Vec<String>,
}

impl Scheduler {
    pub fn new(
        storage: Arc<dyn Storage>,
        source: Arc<dyn ContentSource>,
        fallback_topics: Vec<String>,
    ) -> Fallible<Self> {
        let fallback_topics: Vec<String> = fallback_topics
            .into_iter()
            .map(|topic| topic.trim().to_string())
            .filter(|topic| !topic.is_empty())
            .collect();
        if fallback_topics.is_empty() {
            return Err(ErrorReport::validation("no fallback topics configured"));
        }
        Ok(Self {
            storage,
            source,
            fallback_topics,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use rand::RngCore;
    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::Scheduler;
    use crate::db::Database;
    use crate::error::ErrorReport;
    use crate::error::Fallible;
    use crate::generator::ContentSource;
    use crate::generator::GeneratedContent;

    pub const FALLBACK_TOPICS: [&str; 3] = ["science", "history", "math"];

    /// A content source that hands out numbered cards, or fails.
    pub struct FakeSource {
        pub calls: AtomicUsize,
        pub topics: Mutex<Vec<String>>,
        pub reply: Option<GeneratedContent>,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                topics: Mutex::new(Vec::new()),
                reply: None,
            }
        }

        /// Always return the given content.
        pub fn replying(question: &str, answer: &str) -> Self {
            Self {
                reply: Some(GeneratedContent {
                    question: question.to_string(),
                    answer: answer.to_string(),
                }),
                ..Self::new()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn generate(&self, topic: &str) -> Fallible<GeneratedContent> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.topics.lock().unwrap().push(topic.to_string());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Ok(GeneratedContent {
                    question: format!("{topic} question {n}"),
                    answer: format!("{topic} answer {n}"),
                }),
            }
        }
    }

    /// A content source that is always down.
    pub struct DownSource;

    #[async_trait]
    impl ContentSource for DownSource {
        async fn generate(&self, _topic: &str) -> Fallible<GeneratedContent> {
            Err(ErrorReport::generation("content source unavailable"))
        }
    }

    /// An RNG that returns the same word forever. With `0`, every coin flip
    /// comes up true; with `u64::MAX`, false.
    pub struct FixedRng(pub u64);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0 as u8);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    pub fn temp_db() -> Fallible<(TempDir, Database)> {
        let dir = tempdir()?;
        let path = dir.path().join("flashsched.db");
        let path = path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db = Database::new(path)?;
        Ok((dir, db))
    }

    pub fn scheduler(db: &Database, source: Arc<dyn ContentSource>) -> Scheduler {
        let topics = FALLBACK_TOPICS.iter().map(|t| t.to_string()).collect();
        Scheduler::new(Arc::new(db.clone()), source, topics).unwrap()
    }
}
