use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SCENARIO_ID_LEN: usize = 32;

/// Normalized scenario identifier (e.g. `s0020`).
///
/// The accepted alphabet is URL-safe by construction, so the identifier
/// embeds byte-identically in both a wire path and a cache key. This is what
/// keeps the endpoint registry and the key registry isomorphic for
/// parameterized resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenarioId(String);

impl ScenarioId {
    /// Parse and normalize an identifier to lowercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyScenarioId);
        }

        let normalized = trimmed.to_ascii_lowercase();
        let len = normalized.chars().count();
        if len > MAX_SCENARIO_ID_LEN {
            return Err(ValidationError::ScenarioIdTooLong {
                len,
                max: MAX_SCENARIO_ID_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(ValidationError::ScenarioIdInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '_' || ch == '-';
            if !valid {
                return Err(ValidationError::ScenarioIdInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ScenarioId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ScenarioId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for ScenarioId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ScenarioId> for String {
    fn from(value: ScenarioId) -> Self {
        value.0
    }
}

/// One selectable scenario as listed by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Whole-document response of the scenario list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioList {
    pub scenarios: Vec<Scenario>,
}
