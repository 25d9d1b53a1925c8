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

mod get;
mod post;
pub mod server;
mod state;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::Client;
    use reqwest::StatusCode;
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio::net::TcpListener;
    use tokio::net::TcpStream;
    use tokio::spawn;
    use tokio::time::sleep;

    use crate::db::Database;
    use crate::error::Fallible;
    use crate::generator::ContentSource;
    use crate::schedule::testing::DownSource;
    use crate::schedule::testing::FALLBACK_TOPICS;
    use crate::schedule::testing::FakeSource;
    use crate::schedule::testing::scheduler;
    use crate::schedule::testing::temp_db;
    use crate::serve::server::serve;
    use crate::storage::Storage;
    use crate::types::card_id::CardId;
    use crate::types::learner::LearnerId;
    use crate::types::timestamp::Timestamp;

    /// Start a server on a free port. Returns its base URL.
    async fn start(source: Arc<dyn ContentSource>) -> Fallible<(TempDir, Database, String)> {
        let (dir, db) = temp_db()?;
        let scheduler = scheduler(&db, source);
        let port = portpicker::pick_unused_port().expect("no free port");
        let bind = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&bind).await?;
        spawn(async move { serve(listener, scheduler).await });
        loop {
            if let Ok(stream) = TcpStream::connect(&bind).await {
                drop(stream);
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        Ok((dir, db, format!("http://{bind}")))
    }

    async fn json(response: reqwest::Response) -> Value {
        let text = response.text().await.unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_next_then_feedback() -> Fallible<()> {
        let (_dir, db, url) = start(Arc::new(FakeSource::new())).await?;
        let client = Client::new();

        // Get a new card.
        let response = client
            .get(format!("{url}/flashcards/next"))
            .header("x-learner-id", "user1")
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let card = json(response).await;
        let topic = card["topic"].as_str().unwrap();
        assert!(FALLBACK_TOPICS.contains(&topic));
        assert!(card["question"].as_str().unwrap().starts_with(topic));
        let id = card["id"].as_str().unwrap().to_string();

        // It is due, so asking again returns it.
        let response = client
            .get(format!("{url}/flashcards/next"))
            .header("x-learner-id", "user1")
            .send()
            .await?;
        assert_eq!(json(response).await["id"], id.as_str());

        // Submit feedback.
        let response = client
            .post(format!("{url}/flashcards/feedback"))
            .header("x-learner-id", "user1")
            .header("content-type", "application/json")
            .body(format!(r#"{{"flashcardId": "{id}", "interaction": "good"}}"#))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["message"], "Feedback received");

        let learner = LearnerId::new("user1")?;
        let today = Timestamp::now().local_date();
        let record = db
            .find_performance(&learner, CardId::from_hex(&id)?)?
            .unwrap();
        assert_eq!(record.interval.days(), 3);
        assert_eq!(record.due_date, today.plus_days(3)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_learner() -> Fallible<()> {
        let (_dir, _db, url) = start(Arc::new(FakeSource::new())).await?;
        let response = reqwest::get(format!("{url}/flashcards/next")).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "missing learner id");
        Ok(())
    }

    #[tokio::test]
    async fn test_feedback_errors() -> Fallible<()> {
        let (_dir, _db, url) = start(Arc::new(FakeSource::new())).await?;
        let client = Client::new();
        let post = |body: String| {
            client
                .post(format!("{url}/flashcards/feedback"))
                .header("x-learner-id", "user1")
                .body(body)
                .send()
        };

        // Missing card ID.
        let response = post(r#"{"interaction": "good"}"#.to_string()).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Malformed card ID.
        let response =
            post(r#"{"flashcardId": "flashcard1", "interaction": "good"}"#.to_string()).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unknown card.
        let unknown = CardId::hash_bytes(b"nope");
        let response =
            post(format!(r#"{{"flashcardId": "{unknown}", "interaction": "good"}}"#)).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_content_source_down() -> Fallible<()> {
        let (_dir, _db, url) = start(Arc::new(DownSource)).await?;
        let response = Client::new()
            .get(format!("{url}/flashcards/next"))
            .header("x-learner-id", "user1")
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        Ok(())
    }

    #[tokio::test]
    async fn test_not_found() -> Fallible<()> {
        let (_dir, _db, url) = start(Arc::new(FakeSource::new())).await?;
        let response = reqwest::get(format!("{url}/herp-derp")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
