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

use chrono::DateTime;
use chrono::Local;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;

use crate::types::date::Date;

/// The wall-clock instant a row was written. Stored as RFC 3339 text and
/// never read back by the scheduler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The calendar date of this instant in the server's time zone. This is
    /// what "today" means for due dates.
    pub fn local_date(self) -> Date {
        Date::new(self.0.with_timezone(&Local).date_naive())
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_rfc3339()))
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::types::Value;

    use super::*;

    #[test]
    fn test_stored_as_rfc3339() -> rusqlite::Result<()> {
        let ts = Timestamp::now();
        let ToSqlOutput::Owned(Value::Text(text)) = ts.to_sql()? else {
            panic!("expected owned text");
        };
        let parsed = DateTime::parse_from_rfc3339(&text).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), ts.0);
        Ok(())
    }
}
