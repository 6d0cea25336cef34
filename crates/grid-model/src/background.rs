//! Canvas background fill.

use std::str::FromStr;

use gridstack_common::error::GridstackError;
use serde::{Deserialize, Serialize};

/// Background of the blank canvas every item is composited onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    /// Opaque (or `@alpha`) color in ffmpeg syntax: `black`, `#1e1e1e`,
    /// `0xff8800`, `white@0.5`.
    Color(String),

    /// Fully transparent; requires an output format with alpha.
    Transparent,
}

impl Background {
    /// Color argument for ffmpeg's `color` source and `pad` filter.
    pub fn ffmpeg_color(&self) -> &str {
        match self {
            Self::Color(c) => c,
            Self::Transparent => "black@0.0",
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::Color("black".to_string())
    }
}

impl FromStr for Background {
    type Err = GridstackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GridstackError::invalid_config("background color is empty"));
        }
        if s.eq_ignore_ascii_case("transparent") || s.eq_ignore_ascii_case("none") {
            return Ok(Self::Transparent);
        }
        // Anything else would have to be escaped inside a filter graph.
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '#' | '@' | '.' | '_')))
        {
            return Err(GridstackError::invalid_config(format!(
                "background color '{s}' contains unsupported character '{bad}'"
            )));
        }
        if s.matches('@').count() > 1 || s.starts_with('@') {
            return Err(GridstackError::invalid_config(format!(
                "background color '{s}' is malformed"
            )));
        }
        Ok(Self::Color(s.to_string()))
    }
}

impl TryFrom<String> for Background {
    type Error = GridstackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Background> for String {
    fn from(value: Background) -> Self {
        match value {
            Background::Color(c) => c,
            Background::Transparent => "transparent".to_string(),
        }
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Color(c) => f.write_str(c),
            Self::Transparent => f.write_str("transparent"),
        }
    }
}
