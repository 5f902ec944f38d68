//! Visual editor for the event button card.
//!
//! Holds the card's raw config merged over a full set of defaults, presents
//! it as a form, and emits the whole merged config upward on every change.
//! Values are only coerced here; range checks happen when the host feeds the
//! emitted config back into the card.

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use super::config::CUSTOM_PREFIX;
use super::config::EVENT_MAX;
use super::config::EVENT_MIN;
use super::config::SLOT_MAX;
use super::config::SLOT_MIN;
use super::config::coerce_integer;
use super::event_button::EventButtonCard;
use crate::snapshot::Hass;
use crate::view::DomEvent;
use crate::view::UiEvent;
use crate::view::View;
use crate::view::ViewBuilder;

/// Editable config keys, in form order.
pub const FIELDS: [&str; 5] = ["entry_id", "label", "slot", "event", "style"];

const NUMERIC_FIELDS: [&str; 2] = ["slot", "event"];

const FORM: &str = "form";

/// Notification carrying the full merged config after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChanged {
    pub config: Value,
}

impl ConfigChanged {
    /// Name of the DOM event the host's editor shell listens for.
    pub const EVENT: &'static str = "config-changed";
}

pub type ConfigChangedSender = mpsc::UnboundedSender<ConfigChanged>;
pub type ConfigChangedReceiver = mpsc::UnboundedReceiver<ConfigChanged>;

pub struct EventButtonEditor {
    config: Map<String, Value>,
    hass: Option<Hass>,
    form: View<&'static str>,
    form_builds: u64,
    events: ConfigChangedSender,
}

impl EventButtonEditor {
    pub const TAG: &'static str = "audac-event-button-card-editor";

    pub fn new() -> (Self, ConfigChangedReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let config = defaults();
        let editor = Self {
            form: build_form(&config),
            form_builds: 1,
            config,
            hass: None,
            events,
        };
        (editor, rx)
    }

    /// Replace the held config with `raw` merged over the defaults.
    pub fn set_config(&mut self, raw: &Value) {
        let mut config = defaults();
        match raw {
            Value::Object(map) => {
                for (key, value) in map {
                    config.insert(key.clone(), value.clone());
                }
            }
            other => warn!("Editor ignoring non-mapping config: {}", other),
        }
        self.config = config;
        self.rebuild();
    }

    pub fn set_hass(&mut self, hass: Hass) {
        self.hass = Some(hass);
        self.rebuild();
    }

    /// Whether the host has supplied its context yet.
    pub fn is_connected(&self) -> bool {
        self.hass.is_some()
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn form(&self) -> &View<&'static str> {
        &self.form
    }

    /// How many times the form has been built, including the first.
    pub fn form_builds(&self) -> u64 {
        self.form_builds
    }

    pub fn handle_event(&mut self, event: &UiEvent) {
        let Some(key) = self.form.route(&event.target, event.kind).copied() else {
            debug!("No editor field for {} on {}", event.kind, event.target);
            return;
        };
        self.handle_change(key, event.value.as_deref().unwrap_or_default());
    }

    /// Apply one field edit and emit the full merged config.
    pub fn handle_change(&mut self, key: &str, raw: &str) {
        let Some(key) = FIELDS.iter().find(|field| **field == key) else {
            debug!("Editor ignoring unknown field {}", key);
            return;
        };

        let value = if NUMERIC_FIELDS.contains(key) {
            coerce_number(raw)
        } else {
            Value::String(raw.to_string())
        };
        self.config.insert(key.to_string(), value);
        let shown = display(self.config.get(*key));
        self.form.set_attr(key, "value", &shown);

        let changed = ConfigChanged {
            config: Value::Object(self.config.clone()),
        };
        if self.events.send(changed).is_err() {
            debug!("No listener for {}", ConfigChanged::EVENT);
        }
    }

    fn rebuild(&mut self) {
        self.form = build_form(&self.config);
        self.form_builds += 1;
    }
}

fn defaults() -> Map<String, Value> {
    let defaults = json!({
        "type": format!("{}{}", CUSTOM_PREFIX, EventButtonCard::TAG),
        "entry_id": "",
        "label": "",
        "slot": SLOT_MIN,
        "event": EVENT_MIN,
        "style": "default",
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Integers stay integers; anything unparsable is kept verbatim so the card's
/// validator can reject it.
fn coerce_number(raw: &str) -> Value {
    match coerce_integer(&Value::String(raw.to_string())) {
        Some(n) => Value::from(n),
        None => match raw.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Value::from(f),
            _ => Value::String(raw.to_string()),
        },
    }
}

fn range_options(min: u8, max: u8) -> Vec<String> {
    (min..=max).map(|n| n.to_string()).collect()
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn build_form(config: &Map<String, Value>) -> View<&'static str> {
    let mut builder = ViewBuilder::new(FORM, "form")
        .child(FORM, "entry_id", "input")
        .child(FORM, "label", "input")
        .child(FORM, "slot", "select")
        .child(FORM, "event", "select")
        .child(FORM, "style", "select")
        .options("slot", range_options(SLOT_MIN, SLOT_MAX))
        .options("event", range_options(EVENT_MIN, EVENT_MAX))
        .options("style", vec!["default".to_string(), "bubble".to_string()]);

    for field in FIELDS {
        builder = builder
            .attr(field, "data-key", field)
            .attr(field, "value", display(config.get(field)))
            .listen(field, DomEvent::Change, field);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let (mut editor, _rx) = EventButtonEditor::new();
        editor.set_config(&json!({"entry_id": "entry123", "event": 7}));

        let config = editor.config();
        assert_eq!(config["type"], "custom:audac-event-button-card");
        assert_eq!(config["entry_id"], "entry123");
        assert_eq!(config["slot"], 1);
        assert_eq!(config["event"], 7);
        assert_eq!(config["label"], "");
        assert_eq!(config["style"], "default");
    }

    #[test]
    fn test_partial_change_preserves_other_fields() {
        let (mut editor, mut rx) = EventButtonEditor::new();
        editor.set_config(&json!({
            "entry_id": "entry123",
            "slot": 3,
            "event": 12,
            "style": "bubble",
        }));

        editor.handle_change("label", "Doorbell");
        let changed = rx.try_recv().unwrap();
        assert_eq!(
            changed.config,
            json!({
                "type": "custom:audac-event-button-card",
                "entry_id": "entry123",
                "label": "Doorbell",
                "slot": 3,
                "event": 12,
                "style": "bubble",
            })
        );
    }

    #[test]
    fn test_numeric_coercion_without_range_check() {
        let (mut editor, mut rx) = EventButtonEditor::new();

        editor.handle_change("slot", "4");
        assert_eq!(rx.try_recv().unwrap().config["slot"], json!(4));

        editor.handle_change("event", "99");
        assert_eq!(rx.try_recv().unwrap().config["event"], json!(99));

        editor.handle_change("event", "");
        assert_eq!(rx.try_recv().unwrap().config["event"], json!(""));

        // Each emission carries everything held so far.
        editor.handle_change("label", "x");
        let config = rx.try_recv().unwrap().config;
        assert_eq!(config["slot"], json!(4));
        assert_eq!(config["label"], json!("x"));
    }

    #[test]
    fn test_unknown_field_ignored() {
        let (mut editor, mut rx) = EventButtonEditor::new();
        editor.handle_change("volume_entity", "number.x");
        assert!(rx.try_recv().is_err());
        assert!(!editor.config().contains_key("volume_entity"));
    }

    #[test]
    fn test_form_reflects_config() {
        let (mut editor, _rx) = EventButtonEditor::new();
        editor.set_config(&json!({"entry_id": "entry123", "slot": 2, "event": 30}));

        let form = editor.form();
        assert_eq!(form.options("slot").len(), 4);
        assert_eq!(form.options("event").len(), 50);
        assert_eq!(form.options("event").first().map(String::as_str), Some("1"));
        assert_eq!(form.attr("slot", "value"), Some("2"));
        assert_eq!(form.attr("event", "value"), Some("30"));
        assert_eq!(form.attr("entry_id", "value"), Some("entry123"));
        assert_eq!(form.attr("label", "data-key"), Some("label"));
        assert_eq!(form.listener_count(), FIELDS.len());
    }

    #[test]
    fn test_edit_patches_form_in_place() {
        let (mut editor, _rx) = EventButtonEditor::new();
        editor.set_config(&json!({"entry_id": "entry123", "slot": 2}));
        let patches = editor.form().patch_count();

        editor.handle_change("slot", "3");
        editor.handle_change("label", "Gong");

        let form = editor.form();
        assert_eq!(form.attr("slot", "value"), Some("3"));
        assert_eq!(form.attr("label", "value"), Some("Gong"));
        assert_eq!(form.patch_count(), patches + 2);
        assert_eq!(editor.form_builds(), 2);

        // Re-entering the current value changes nothing.
        editor.handle_change("label", "Gong");
        assert_eq!(editor.form().patch_count(), patches + 2);
    }

    #[test]
    fn test_form_events_route_to_fields() {
        let (mut editor, mut rx) = EventButtonEditor::new();
        editor.handle_event(&UiEvent::change("slot", "2"));
        assert_eq!(rx.try_recv().unwrap().config["slot"], json!(2));

        editor.handle_event(&UiEvent::click("slot"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rebuilds_on_new_context() {
        let (mut editor, _rx) = EventButtonEditor::new();
        assert_eq!(editor.form_builds(), 1);

        editor.set_config(&json!({"entry_id": "a"}));
        editor.set_config(&json!("garbage"));
        assert_eq!(editor.form_builds(), 3);
        assert_eq!(editor.config()["entry_id"], "");
        assert!(!editor.is_connected());

        let hass = Hass::new(
            crate::snapshot::EntitySnapshot::new(),
            std::sync::Arc::new(crate::dispatch::MockBridge::default()),
        );
        editor.set_hass(hass);
        assert!(editor.is_connected());
        assert_eq!(editor.form_builds(), 4);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (mut editor, rx) = EventButtonEditor::new();
        drop(rx);
        editor.handle_change("label", "still fine");
        assert_eq!(editor.config()["label"], "still fine");
    }
}
