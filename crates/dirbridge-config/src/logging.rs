//! Log output formats understood by the bridge's telemetry layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How log events are rendered on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with fields flattened, for log shippers.
    #[default]
    Json,
    /// One human-readable line per event.
    Compact,
    /// Multi-line human-readable output with source locations.
    Pretty,
}

impl LogFormat {
    /// Returns `true` when output is meant for machines rather than people.
    ///
    /// Structured output never carries terminal colour codes.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
