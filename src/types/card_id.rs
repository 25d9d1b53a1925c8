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

use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Identifies a card. Generated cards get the hash of their content plus a
/// random nonce, so two cards with the same text still get distinct IDs.
///
/// blake3 does not implement `Ord`, hence the wrapper.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CardId {
    inner: blake3::Hash,
}

impl CardId {
    pub fn generate(topic: &str, question: &str, answer: &str, nonce: [u8; 16]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for field in [topic, question, answer] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(&nonce);
        Self {
            inner: hasher.finalize(),
        }
    }

    #[cfg(test)]
    pub fn hash_bytes(bytes: &[u8]) -> Self {
        Self {
            inner: blake3::hash(bytes),
        }
    }

    pub fn to_hex(self) -> String {
        self.inner.to_hex().to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        let inner = blake3::Hash::from_hex(s.trim())
            .map_err(|_| ErrorReport::validation(format!("invalid card id: {s:?}")))?;
        Ok(Self { inner })
    }
}

impl PartialOrd for CardId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CardId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.as_bytes().cmp(other.inner.as_bytes())
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_hex()))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardId::from_hex(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for CardId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_display() {
        let id = CardId::hash_bytes(b"test");
        assert_eq!(
            id.to_string(),
            "4878ca0425c739fa427f7eda20fe845f6b2e46ba5fe2a14df5b1e32f50603215"
        );
    }

    #[test]
    fn test_ordering() -> Fallible<()> {
        let a =
            CardId::from_hex("0000000000000000000000000000000000000000000000000000000000000000")?;
        let b =
            CardId::from_hex("0000000000000000000000000000000000000000000000000000000000000001")?;
        assert!(a < b);
        Ok(())
    }

    #[test]
    fn test_nonce_distinguishes_identical_content() {
        let a = CardId::generate("math", "2+2?", "4", [0; 16]);
        let b = CardId::generate("math", "2+2?", "4", [1; 16]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hex_is_a_validation_error() {
        let err = CardId::from_hex("flashcard1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
