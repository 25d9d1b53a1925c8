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

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::generator::GeminiSource;
use crate::schedule::Scheduler;
use crate::serve::get::next_handler;
use crate::serve::post::feedback_handler;
use crate::serve::state::ServerState;

pub async fn start_server(config: Config) -> Fallible<()> {
    let db = Database::new(config.database_path()?)?;
    let source = GeminiSource::new(&config.generator)?;
    let scheduler = Scheduler::new(Arc::new(db), Arc::new(source), config.fallback_topics)?;

    let bind = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    serve(listener, scheduler).await
}

/// Serve the scheduler on an already-bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, scheduler: Scheduler) -> Fallible<()> {
    let app = app(scheduler);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

pub fn app(scheduler: Scheduler) -> Router {
    let state = ServerState { scheduler };
    let app = Router::new();
    let app = app.route("/flashcards/next", get(next_handler));
    let app = app.route("/flashcards/feedback", post(feedback_handler));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
