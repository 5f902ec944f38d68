//! Card configuration validation.
//!
//! Turns the raw mapping a host hands to `set_config` into a normalized,
//! strongly typed [`WidgetConfig`]. Validation is a pure function of its
//! input and is independent of rendering.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::event_button::EventButtonCard;
use super::tile::TileCard;

pub const SLOT_MIN: u8 = 1;
pub const SLOT_MAX: u8 = 4;
pub const EVENT_MIN: u8 = 1;
pub const EVENT_MAX: u8 = 50;

/// Prefix hosts put in front of custom card tags in a card's `type`.
pub const CUSTOM_PREFIX: &str = "custom:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("card configuration must be a mapping")]
    NotAMapping,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("`{0}` must be a string")]
    InvalidField(&'static str),

    #[error("`{field}` must be an integer between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: u8,
        max: u8,
    },

    #[error("unknown card type `{0}`")]
    UnknownType(String),

    #[error("`{config}` config given to a `{card}` card")]
    WrongKind {
        card: &'static str,
        config: &'static str,
    },
}

/// Cosmetic rendering variant. Anything other than exactly `bubble` is `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StyleMode {
    #[default]
    Default,
    Bubble,
}

impl StyleMode {
    pub fn from_raw(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str) {
            Some("bubble") => StyleMode::Bubble,
            _ => StyleMode::Default,
        }
    }

    /// CSS class applied to the card root.
    pub fn class(self) -> &'static str {
        match self {
            StyleMode::Default => "style-default",
            StyleMode::Bubble => "style-bubble",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileConfig {
    pub name: Option<String>,
    pub volume_entity: String,
    pub mute_entity: Option<String>,
    pub source_entity: Option<String>,
    pub style: StyleMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventButtonConfig {
    pub entry_id: String,
    pub slot: u8,
    pub event: u8,
    pub label: String,
    pub style: StyleMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetConfig {
    Tile(TileConfig),
    EventButton(EventButtonConfig),
}

impl WidgetConfig {
    /// Tag of the card this config belongs to.
    pub fn tag(&self) -> &'static str {
        match self {
            WidgetConfig::Tile(_) => TileCard::TAG,
            WidgetConfig::EventButton(_) => EventButtonCard::TAG,
        }
    }
}

/// Validate a raw config of either card kind, selected by its `type` key.
pub fn validate(raw: &Value) -> Result<WidgetConfig, ConfigurationError> {
    let map = as_mapping(raw)?;
    let card_type = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ConfigurationError::MissingField("type"))?;

    match card_type.strip_prefix(CUSTOM_PREFIX).unwrap_or(card_type) {
        TileCard::TAG => validate_tile(raw).map(WidgetConfig::Tile),
        EventButtonCard::TAG => validate_event_button(raw).map(WidgetConfig::EventButton),
        other => Err(ConfigurationError::UnknownType(other.to_string())),
    }
}

pub fn validate_tile(raw: &Value) -> Result<TileConfig, ConfigurationError> {
    let map = as_mapping(raw)?;

    Ok(TileConfig {
        volume_entity: required_string(map, "volume_entity")?,
        name: optional_string(map, "name")?,
        mute_entity: optional_string(map, "mute_entity")?,
        source_entity: optional_string(map, "source_entity")?,
        style: StyleMode::from_raw(map.get("style")),
    })
}

pub fn validate_event_button(raw: &Value) -> Result<EventButtonConfig, ConfigurationError> {
    let map = as_mapping(raw)?;

    let entry_id = required_string(map, "entry_id")?;
    let slot = ranged_integer(map, "slot", SLOT_MIN, SLOT_MAX)?;
    let event = ranged_integer(map, "event", EVENT_MIN, EVENT_MAX)?;
    let label = optional_string(map, "label")?.unwrap_or_else(|| default_label(slot, event));

    Ok(EventButtonConfig {
        entry_id,
        slot,
        event,
        label,
        style: StyleMode::from_raw(map.get("style")),
    })
}

pub fn default_label(slot: u8, event: u8) -> String {
    format!("Slot {} Event {}", slot, event)
}

fn as_mapping(raw: &Value) -> Result<&Map<String, Value>, ConfigurationError> {
    raw.as_object().ok_or(ConfigurationError::NotAMapping)
}

fn required_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ConfigurationError> {
    optional_string(map, field)?.ok_or(ConfigurationError::MissingField(field))
}

/// Absent, `null` and blank strings all count as "not set".
fn optional_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ConfigurationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigurationError::InvalidField(field)),
    }
}

fn ranged_integer(
    map: &Map<String, Value>,
    field: &'static str,
    min: u8,
    max: u8,
) -> Result<u8, ConfigurationError> {
    let out_of_range = ConfigurationError::OutOfRange { field, min, max };

    let value = match map.get(field) {
        None => return Ok(min),
        Some(raw) => coerce_integer(raw).ok_or(out_of_range.clone())?,
    };

    if (i64::from(min)..=i64::from(max)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(out_of_range)
    }
}

/// Integer coercion shared with the editor: integers, integral floats and
/// strings holding either.
pub(crate) fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_event_button_accepts_full_range() {
        for slot in SLOT_MIN..=SLOT_MAX {
            for event in EVENT_MIN..=EVENT_MAX {
                let raw = json!({"entry_id": "abc", "slot": slot, "event": event});
                let config = validate_event_button(&raw).unwrap();
                assert_eq!(config.slot, slot);
                assert_eq!(config.event, event);
            }
        }
    }

    #[test]
    fn test_event_button_coerces_strings() {
        let raw = json!({"entry_id": "abc", "slot": "3", "event": " 12 "});
        let config = validate_event_button(&raw).unwrap();
        assert_eq!(config.slot, 3);
        assert_eq!(config.event, 12);
        assert_eq!(config.label, "Slot 3 Event 12");

        let raw = json!({"entry_id": "abc", "slot": 2.0, "event": "7.0"});
        let config = validate_event_button(&raw).unwrap();
        assert_eq!(config.slot, 2);
        assert_eq!(config.event, 7);
    }

    #[test]
    fn test_event_button_rejects_out_of_range() {
        let slot_err = ConfigurationError::OutOfRange {
            field: "slot",
            min: 1,
            max: 4,
        };
        let event_err = ConfigurationError::OutOfRange {
            field: "event",
            min: 1,
            max: 50,
        };

        let bad = [json!(0), json!(5), json!(-1), json!(""), json!("two"), json!(1.5), json!(true)];
        for slot in bad {
            let raw = json!({"entry_id": "abc", "slot": slot, "event": 1});
            assert_eq!(validate_event_button(&raw), Err(slot_err.clone()));
        }

        for event in [json!(0), json!(51), json!("51"), json!(""), json!(null), json!("x")] {
            let raw = json!({"entry_id": "abc", "slot": 1, "event": event});
            assert_eq!(validate_event_button(&raw), Err(event_err.clone()));
        }
    }

    #[test]
    fn test_range_error_message() {
        let raw = json!({"entry_id": "abc", "slot": 9});
        let err = validate_event_button(&raw).unwrap_err();
        assert_eq!(err.to_string(), "`slot` must be an integer between 1 and 4");
    }

    #[test]
    fn test_missing_required_fields() {
        let raw = json!({"slot": 1, "event": 1, "label": "Chime"});
        assert_eq!(
            validate_event_button(&raw),
            Err(ConfigurationError::MissingField("entry_id"))
        );

        // Missing entry_id wins even when other fields are invalid.
        let raw = json!({"slot": 99});
        assert_eq!(
            validate_event_button(&raw),
            Err(ConfigurationError::MissingField("entry_id"))
        );

        let raw = json!({"name": "Lobby", "mute_entity": "switch.zone_1_mute"});
        let err = validate_tile(&raw).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingField("volume_entity"));
        assert_eq!(err.to_string(), "missing required field `volume_entity`");

        let raw = json!({"volume_entity": ""});
        assert_eq!(
            validate_tile(&raw),
            Err(ConfigurationError::MissingField("volume_entity"))
        );
    }

    #[test]
    fn test_defaults() {
        let raw = json!({"entry_id": "abc"});
        let config = validate_event_button(&raw).unwrap();
        assert_eq!(config.slot, 1);
        assert_eq!(config.event, 1);
        assert_eq!(config.label, "Slot 1 Event 1");
        assert_eq!(config.style, StyleMode::Default);

        let raw = json!({"entry_id": "abc", "slot": 4, "event": 9, "label": ""});
        assert_eq!(validate_event_button(&raw).unwrap().label, "Slot 4 Event 9");

        let raw = json!({"volume_entity": "number.zone_1_volume", "source_entity": ""});
        let config = validate_tile(&raw).unwrap();
        assert_eq!(config.name, None);
        assert_eq!(config.mute_entity, None);
        assert_eq!(config.source_entity, None);
    }

    #[test]
    fn test_style_normalization() {
        assert_eq!(StyleMode::from_raw(Some(&json!("bubble"))), StyleMode::Bubble);
        for raw in [json!("Bubble"), json!(""), json!("fancy"), json!(1), json!(null)] {
            assert_eq!(StyleMode::from_raw(Some(&raw)), StyleMode::Default);
        }
        assert_eq!(StyleMode::from_raw(None), StyleMode::Default);

        let raw = json!({"volume_entity": "number.v", "style": "BUBBLE"});
        assert_eq!(validate_tile(&raw).unwrap().style, StyleMode::Default);
    }

    #[test]
    fn test_validate_by_type() {
        let raw = json!({"type": "custom:audac-zone-card", "volume_entity": "number.v"});
        assert!(matches!(validate(&raw), Ok(WidgetConfig::Tile(_))));

        let raw = json!({"type": "audac-event-button-card", "entry_id": "abc"});
        assert!(matches!(validate(&raw), Ok(WidgetConfig::EventButton(_))));

        let raw = json!({"type": "custom:other-card"});
        assert_eq!(
            validate(&raw),
            Err(ConfigurationError::UnknownType("other-card".to_string()))
        );

        assert_eq!(validate(&json!(["x"])), Err(ConfigurationError::NotAMapping));
    }

    #[test]
    fn test_non_string_field_rejected() {
        let raw = json!({"volume_entity": 12});
        assert_eq!(
            validate_tile(&raw),
            Err(ConfigurationError::InvalidField("volume_entity"))
        );
    }
}
