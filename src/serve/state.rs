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

use axum::http::HeaderMap;
use axum::http::HeaderName;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::schedule::Scheduler;
use crate::types::learner::LearnerId;

/// The header carrying the ID of the learner a request acts for. Callers are
/// authenticated upstream.
pub const LEARNER_HEADER: HeaderName = HeaderName::from_static("x-learner-id");

#[derive(Clone)]
pub struct ServerState {
    pub scheduler: Scheduler,
}

pub fn learner_from_headers(headers: &HeaderMap) -> Fallible<LearnerId> {
    let value = headers
        .get(&LEARNER_HEADER)
        .ok_or_else(|| ErrorReport::validation("missing learner id"))?;
    let value = value
        .to_str()
        .map_err(|_| ErrorReport::validation("learner id is not valid text"))?;
    LearnerId::new(value)
}
