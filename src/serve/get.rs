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

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::ErrorReport;
use crate::serve::state::ServerState;
use crate::serve::state::learner_from_headers;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

pub async fn next_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<Card>, ErrorReport> {
    let learner = learner_from_headers(&headers)?;
    let today = Timestamp::now().local_date();
    let mut rng = StdRng::from_entropy();
    match state.scheduler.select_next(&learner, today, &mut rng).await {
        Ok(card) => Ok(Json(card)),
        Err(e) => {
            log::error!("{learner}: selecting next card: {e}");
            Err(e)
        }
    }
}
