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
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::serve::state::ServerState;
use crate::serve::state::learner_from_headers;
use crate::sm2::Interaction;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackForm {
    flashcard_id: Option<String>,
    interaction: Option<String>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    message: &'static str,
}

fn parse_form(body: &[u8]) -> Fallible<(CardId, Interaction)> {
    let form: FeedbackForm = serde_json::from_slice(body)
        .map_err(|e| ErrorReport::validation(format!("invalid feedback body: {e}")))?;
    let flashcard_id = form
        .flashcard_id
        .ok_or_else(|| ErrorReport::validation("missing flashcardId"))?;
    let interaction = form
        .interaction
        .ok_or_else(|| ErrorReport::validation("missing interaction"))?;
    Ok((CardId::from_hex(&flashcard_id)?, Interaction::parse(&interaction)))
}

pub async fn feedback_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FeedbackResponse>, ErrorReport> {
    let learner = learner_from_headers(&headers)?;
    let (card_id, interaction) = parse_form(&body)?;
    let today = Timestamp::now().local_date();
    match state
        .scheduler
        .record_feedback(&learner, card_id, &interaction, today)
    {
        Ok(_) => Ok(Json(FeedbackResponse {
            message: "Feedback received",
        })),
        Err(e) => {
            log::error!("{learner}: recording feedback on {card_id}: {e}");
            Err(e)
        }
    }
}
