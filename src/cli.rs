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

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::serve::server::start_server;
use crate::storage::Storage;
use crate::types::interest::Interest;
use crate::types::learner::LearnerId;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the scheduling API over HTTP.
    Serve {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Port to listen on, overriding the configuration file.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Set a learner's interest score for a topic.
    Interest {
        learner: String,
        topic: String,
        score: f64,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a learner's card counts as JSON.
    Stats {
        learner: String,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve { config, port } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(port) = port {
                config.port = port;
            }
            start_server(config).await
        }
        Command::Interest {
            learner,
            topic,
            score,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let topic = topic.trim().to_string();
            if topic.is_empty() {
                return Err(ErrorReport::validation("topic must not be empty"));
            }
            if !score.is_finite() {
                return Err(ErrorReport::validation("score must be a finite number"));
            }
            let db = Database::new(config.database_path()?)?;
            db.set_interest(&Interest {
                learner_id: LearnerId::new(&learner)?,
                topic,
                score,
            })?;
            println!("ok");
            Ok(())
        }
        Command::Stats { learner, config } => {
            let config = Config::load(config.as_deref())?;
            let db = Database::new(config.database_path()?)?;
            let today = Timestamp::now().local_date();
            let stats = db.stats(&LearnerId::new(&learner)?, today)?;
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{stats_json}");
            Ok(())
        }
    }
}
