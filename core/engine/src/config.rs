//! FILENAME: core/engine/src/config.rs
//! PURPOSE: Execution settings supplied by the embedding application.
//! CONTEXT: The query runner on the other side of the bridge decides which
//! placeholder syntax its driver understands, and user-entered dates arrive
//! in whatever format the front end produced. Both are configuration, not
//! report content, so they live here rather than in the definition.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Named-placeholder syntax the query runner expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `:Name`
    #[default]
    Colon,
    /// `%(Name)s`
    Pyformat,
    /// `@Name`
    AtSign,
    /// `$Name`
    Dollar,
}

impl PlaceholderStyle {
    pub fn render(&self, name: &str) -> String {
        match self {
            PlaceholderStyle::Colon => format!(":{}", name),
            PlaceholderStyle::Pyformat => format!("%({})s", name),
            PlaceholderStyle::AtSign => format!("@{}", name),
            PlaceholderStyle::Dollar => format!("${}", name),
        }
    }
}

fn default_date_input_formats() -> Vec<String> {
    [
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Engine configuration. Every field has a default, so a partial JSON
/// document (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub placeholder_style: PlaceholderStyle,
    /// chrono format strings tried in order when coercing text to a date.
    pub date_input_formats: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            placeholder_style: PlaceholderStyle::default(),
            date_input_formats: default_date_input_formats(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parses user-entered date text with the configured formats.
    /// Date-only formats yield midnight.
    pub fn parse_date(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        self.date_input_formats.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(text, format)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(text, format)
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN))
                })
        })
    }
}
