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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

/// The file read when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "flashsched.toml";

/// Service configuration, read from a TOML file. Every field has a default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Path to the SQLite database.
    pub database: PathBuf,
    /// Topics to draw from for learners with no recorded interests.
    pub fallback_topics: Vec<String>,
    pub generator: GeneratorConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Base URL of the Gemini API.
    pub endpoint: String,
    pub model: String,
    /// The environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database: PathBuf::from("flashsched.db"),
            fallback_topics: ["science", "history", "math", "literature", "geography"]
                .into_iter()
                .map(String::from)
                .collect(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load the configuration. An explicit path must exist; otherwise the
    /// default file is read if present, and defaults are used if not.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return fail(format!("config file {} does not exist.", path.display()));
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    log::debug!("No {DEFAULT_CONFIG_FILE}, using defaults.");
                    return Ok(Self::default());
                }
                path
            }
        };
        log::debug!("Loading configuration from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Fallible<()> {
        if self.fallback_topics.iter().all(|t| t.trim().is_empty()) {
            return Err(ErrorReport::validation(
                "fallback_topics must contain at least one topic",
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> Fallible<&str> {
        self.database
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_file_gives_defaults() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_override() -> Fallible<()> {
        let config = Config::parse(
            r#"
            port = 9000
            fallback_topics = ["chemistry"]

            [generator]
            model = "gemini-2.0-flash"
            "#,
        )?;
        assert_eq!(config.port, 9000);
        assert_eq!(config.fallback_topics, vec!["chemistry".to_string()]);
        assert_eq!(config.generator.model, "gemini-2.0-flash");
        assert_eq!(config.generator.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.database, PathBuf::from("flashsched.db"));
        Ok(())
    }

    #[test]
    fn test_empty_fallback_topics() {
        let err = Config::parse("fallback_topics = []").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_key() {
        assert!(Config::parse("prot = 9000").is_err());
    }

    #[test]
    fn test_load_from_file() -> Fallible<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "database = \"/tmp/cards.db\"")?;
        let config = Config::load(Some(file.path()))?;
        assert_eq!(config.database, PathBuf::from("/tmp/cards.db"));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load(Some(Path::new("./derpherp.toml"))).is_err());
    }
}
