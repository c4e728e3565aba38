//! Per-node mutation state and its persisted attribute record

use crate::error::MutationError;
use crate::node::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Row kind of a dropdown option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Text,
    Image,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::Text => "text",
            OptionKind::Image => "image",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OptionKind::Text),
            "image" => Ok(OptionKind::Image),
            other => Err(MutationError::malformed(
                "options",
                format!("unknown option kind '{}'", other),
            )),
        }
    }
}

/// Connection layout chosen on a block definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionMode {
    None,
    Left,
    Both,
    Top,
    Bottom,
}

impl ConnectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionMode::None => "NONE",
            ConnectionMode::Left => "LEFT",
            ConnectionMode::Both => "BOTH",
            ConnectionMode::Top => "TOP",
            ConnectionMode::Bottom => "BOTTOM",
        }
    }

    pub fn has_output(self) -> bool {
        matches!(self, ConnectionMode::Left)
    }

    pub fn has_top(self) -> bool {
        matches!(self, ConnectionMode::Top | ConnectionMode::Both)
    }

    pub fn has_bottom(self) -> bool {
        matches!(self, ConnectionMode::Bottom | ConnectionMode::Both)
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionMode {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(ConnectionMode::None),
            "LEFT" => Ok(ConnectionMode::Left),
            "BOTH" => Ok(ConnectionMode::Both),
            "TOP" => Ok(ConnectionMode::Top),
            "BOTTOM" => Ok(ConnectionMode::Bottom),
            other => Err(MutationError::malformed(
                "connections",
                format!("unknown connection mode '{}'", other),
            )),
        }
    }
}

/// Which shape of mutation state a block type carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    None,
    OptionKinds,
    TypeCount,
    ParamCount,
    Connections,
    Colour,
}

impl MutationKind {
    /// State assumed when a record carries no attribute for this kind
    pub fn default_state(self) -> MutationState {
        match self {
            MutationKind::None => MutationState::None,
            MutationKind::OptionKinds => MutationState::OptionKinds(vec![OptionKind::Text; 3]),
            MutationKind::TypeCount => MutationState::TypeCount(2),
            MutationKind::ParamCount => MutationState::ParamCount(1),
            MutationKind::Connections => MutationState::Connections(ConnectionMode::None),
            MutationKind::Colour => MutationState::Colour("0".to_string()),
        }
    }

    /// Record attribute holding this kind's state
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            MutationKind::None => None,
            MutationKind::OptionKinds => Some("options"),
            MutationKind::TypeCount => Some("types"),
            MutationKind::ParamCount => Some("params"),
            MutationKind::Connections => Some("connections"),
            MutationKind::Colour => Some("colour"),
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Extra configuration that changes a node's required slot set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum MutationState {
    None,
    OptionKinds(Vec<OptionKind>),
    TypeCount(usize),
    ParamCount(usize),
    Connections(ConnectionMode),
    Colour(String),
}

impl Default for MutationState {
    fn default() -> Self {
        MutationState::None
    }
}

impl MutationState {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationState::None => MutationKind::None,
            MutationState::OptionKinds(_) => MutationKind::OptionKinds,
            MutationState::TypeCount(_) => MutationKind::TypeCount,
            MutationState::ParamCount(_) => MutationKind::ParamCount,
            MutationState::Connections(_) => MutationKind::Connections,
            MutationState::Colour(_) => MutationKind::Colour,
        }
    }

    pub fn option_kinds(&self) -> &[OptionKind] {
        match self {
            MutationState::OptionKinds(kinds) => kinds,
            _ => &[],
        }
    }

    /// Number of repeated slots the state asks for, where that applies
    pub fn count(&self) -> Option<usize> {
        match self {
            MutationState::OptionKinds(kinds) => Some(kinds.len()),
            MutationState::TypeCount(n) | MutationState::ParamCount(n) => Some(*n),
            _ => None,
        }
    }

    /// Rebuild a state from a persisted record.
    ///
    /// Legacy forms are upgraded rather than rejected: a bare integer in
    /// `options` means that many text options, and a missing attribute
    /// falls back to the kind's default.
    pub fn from_record(kind: MutationKind, record: &MutationRecord) -> Result<Self, MutationError> {
        let Some(attribute) = kind.attribute() else {
            return Ok(MutationState::None);
        };
        let Some(raw) = record.get(attribute) else {
            debug!("Mutation record has no '{}' attribute, using default", attribute);
            return Ok(kind.default_state());
        };

        match kind {
            MutationKind::None => Ok(MutationState::None),
            MutationKind::OptionKinds => parse_option_kinds(raw).map(MutationState::OptionKinds),
            MutationKind::TypeCount => parse_count(attribute, raw).map(MutationState::TypeCount),
            MutationKind::ParamCount => parse_count(attribute, raw).map(MutationState::ParamCount),
            MutationKind::Connections => raw.trim().parse().map(MutationState::Connections),
            MutationKind::Colour => Ok(MutationState::Colour(raw.to_string())),
        }
    }

    /// State selected through a driving field's value
    pub fn from_field(kind: MutationKind, value: &FieldValue) -> Result<Self, MutationError> {
        let text = value.as_text();
        match kind {
            MutationKind::Connections => text.trim().parse().map(MutationState::Connections),
            MutationKind::Colour => Ok(MutationState::Colour(text)),
            other => Err(MutationError::KindMismatch {
                expected: "field-driven mutation".to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Field value mirroring this state, for field-driven kinds
    pub fn field_value(&self) -> Option<FieldValue> {
        match self {
            MutationState::Connections(mode) => Some(FieldValue::choice(mode.as_str())),
            MutationState::Colour(colour) => Some(
                colour
                    .parse::<f64>()
                    .map(FieldValue::Number)
                    .unwrap_or_else(|_| FieldValue::text(colour.clone())),
            ),
            _ => None,
        }
    }
}

/// Upper bound on repeated slots a single state may ask for
pub const MAX_REPEAT_COUNT: usize = 1024;

fn check_count(attribute: &str, count: usize) -> Result<usize, MutationError> {
    if count > MAX_REPEAT_COUNT {
        return Err(MutationError::malformed(
            attribute,
            format!("count {} exceeds the maximum of {}", count, MAX_REPEAT_COUNT),
        ));
    }
    Ok(count)
}

fn parse_option_kinds(raw: &str) -> Result<Vec<OptionKind>, MutationError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| MutationError::malformed("options", e.to_string()))?;

    match value {
        serde_json::Value::Number(n) => {
            let count = n
                .as_u64()
                .and_then(|c| usize::try_from(c).ok())
                .ok_or_else(|| {
                    MutationError::malformed("options", format!("invalid option count {}", n))
                })?;
            let count = check_count("options", count)?;
            debug!("Upgrading legacy option count {} to text options", count);
            Ok(vec![OptionKind::Text; count])
        }
        serde_json::Value::Array(items) => {
            check_count("options", items.len())?;
            items
                .iter()
                .map(|item| match item.as_str() {
                    Some(s) => s.parse(),
                    None => Err(MutationError::malformed(
                        "options",
                        format!("expected option kind string, found {}", item),
                    )),
                })
                .collect()
        }
        other => Err(MutationError::malformed(
            "options",
            format!("expected list or count, found {}", other),
        )),
    }
}

fn parse_count(attribute: &str, raw: &str) -> Result<usize, MutationError> {
    let count = raw
        .trim()
        .parse()
        .map_err(|_| MutationError::malformed(attribute, format!("invalid count '{}'", raw)))?;
    check_count(attribute, count)
}

/// Attribute/value snapshot of a node's mutation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationRecord {
    pub attributes: BTreeMap<String, String>,
}

impl MutationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Snapshot a state in its current encoding
    pub fn from_state(state: &MutationState) -> Self {
        let record = MutationRecord::new();
        match state {
            MutationState::None => record,
            MutationState::OptionKinds(kinds) => {
                let list = serde_json::Value::Array(
                    kinds
                        .iter()
                        .map(|k| serde_json::Value::String(k.as_str().to_string()))
                        .collect(),
                );
                record.with("options", list.to_string())
            }
            MutationState::TypeCount(n) => record.with("types", n.to_string()),
            MutationState::ParamCount(n) => record.with("params", n.to_string()),
            MutationState::Connections(mode) => record.with("connections", mode.as_str()),
            MutationState::Colour(colour) => record.with("colour", colour.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(state: MutationState) {
        let record = MutationRecord::from_state(&state);
        let restored = MutationState::from_record(state.kind(), &record).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        let huge = MutationRecord::new().with("options", "18446744073709551615");
        assert!(matches!(
            MutationState::from_record(MutationKind::OptionKinds, &huge),
            Err(MutationError::Malformed { .. })
        ));

        let types = MutationRecord::new().with("types", "4000000000");
        assert!(MutationState::from_record(MutationKind::TypeCount, &types).is_err());
        let params = MutationRecord::new().with("params", (MAX_REPEAT_COUNT + 1).to_string());
        assert!(MutationState::from_record(MutationKind::ParamCount, &params).is_err());

        let at_limit = MutationRecord::new().with("params", MAX_REPEAT_COUNT.to_string());
        assert_eq!(
            MutationState::from_record(MutationKind::ParamCount, &at_limit).unwrap(),
            MutationState::ParamCount(MAX_REPEAT_COUNT)
        );
    }

    #[test]
    fn test_every_kind_restores_from_its_record() {
        roundtrip(MutationState::None);
        roundtrip(MutationState::OptionKinds(vec![]));
        roundtrip(MutationState::OptionKinds(vec![OptionKind::Text, OptionKind::Image]));
        roundtrip(MutationState::TypeCount(0));
        roundtrip(MutationState::TypeCount(5));
        roundtrip(MutationState::ParamCount(3));
        roundtrip(MutationState::Connections(ConnectionMode::Both));
        roundtrip(MutationState::Colour("#5b80a5".into()));
    }

    #[test]
    fn test_options_encoding_is_compact_json() {
        let record = MutationRecord::from_state(&MutationState::OptionKinds(vec![
            OptionKind::Text,
            OptionKind::Image,
        ]));
        assert_eq!(record.get("options"), Some(r#"["text","image"]"#));
    }

    #[test]
    fn test_legacy_option_count_upgrades_to_text() {
        let record = MutationRecord::new().with("options", "2");
        let state = MutationState::from_record(MutationKind::OptionKinds, &record).unwrap();
        assert_eq!(
            state,
            MutationState::OptionKinds(vec![OptionKind::Text, OptionKind::Text])
        );
    }

    #[test]
    fn test_missing_attribute_uses_default() {
        let empty = MutationRecord::new();
        assert_eq!(
            MutationState::from_record(MutationKind::TypeCount, &empty).unwrap(),
            MutationState::TypeCount(2)
        );
        assert_eq!(
            MutationState::from_record(MutationKind::Connections, &empty).unwrap(),
            MutationState::Connections(ConnectionMode::None)
        );
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        let bad_kind = MutationRecord::new().with("options", r#"["text","video"]"#);
        assert!(matches!(
            MutationState::from_record(MutationKind::OptionKinds, &bad_kind),
            Err(MutationError::Malformed { .. })
        ));

        let negative = MutationRecord::new().with("options", "-1");
        assert!(MutationState::from_record(MutationKind::OptionKinds, &negative).is_err());

        let bad_count = MutationRecord::new().with("types", "two");
        assert!(MutationState::from_record(MutationKind::TypeCount, &bad_count).is_err());

        let bad_mode = MutationRecord::new().with("connections", "SIDEWAYS");
        assert!(MutationState::from_record(MutationKind::Connections, &bad_mode).is_err());
    }

    #[test]
    fn test_field_driven_states() {
        let left = FieldValue::choice("LEFT");
        let state = MutationState::from_field(MutationKind::Connections, &left).unwrap();
        assert_eq!(state, MutationState::Connections(ConnectionMode::Left));
        assert_eq!(state.field_value(), Some(FieldValue::choice("LEFT")));

        let hue =
            MutationState::from_field(MutationKind::Colour, &FieldValue::Number(120.0)).unwrap();
        assert_eq!(hue, MutationState::Colour("120".into()));
        let count = FieldValue::Number(2.0);
        assert!(MutationState::from_field(MutationKind::TypeCount, &count).is_err());
    }

    #[test]
    fn test_connection_mode_flags() {
        assert!(ConnectionMode::Both.has_top());
        assert!(ConnectionMode::Both.has_bottom());
        assert!(!ConnectionMode::Both.has_output());
        assert!(ConnectionMode::Left.has_output());
    }
}
