//! Command dispatch from cards to the host's service-call bridge.
//!
//! Tile actions are fire-and-forget: the bridge owns delivery. Event triggers
//! are awaited, and their outcome is folded into a status line instead of an
//! error so a failing device never takes a card down.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cards::EventButtonConfig;
use crate::cards::TileConfig;

/// Domain of the device integration's own services.
pub const AUDAC_DOMAIN: &str = "audac";
pub const SEND_RAW_COMMAND: &str = "send_raw_command";

/// Separator between the event number and the start/stop flag.
const ARGUMENT_SEPARATOR: char = '^';

/// One outbound service invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub data: Map<String, Value>,
}

impl ServiceCall {
    pub fn new(domain: &str, service: &str, data: Value) -> Self {
        Self {
            domain: domain.to_string(),
            service: service.to_string(),
            data: match data {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    pub fn switch_toggle(entity_id: &str) -> Self {
        Self::new("switch", "toggle", json!({ "entity_id": entity_id }))
    }

    pub fn number_set_value(entity_id: &str, value: f64) -> Self {
        Self::new(
            "number",
            "set_value",
            json!({ "entity_id": entity_id, "value": value }),
        )
    }

    pub fn select_option(entity_id: &str, option: &str) -> Self {
        Self::new(
            "select",
            "select_option",
            json!({ "entity_id": entity_id, "option": option }),
        )
    }

    pub fn raw_command(entry_id: &str, command: &str, argument: &str) -> Self {
        Self::new(
            AUDAC_DOMAIN,
            SEND_RAW_COMMAND,
            json!({ "entry_id": entry_id, "command": command, "argument": argument }),
        )
    }
}

impl std::fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = Value::Object(self.data.clone());
        write!(f, "{}.{} {}", self.domain, self.service, data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The host (or the integration behind it) refused or failed the call.
    #[error("{0}")]
    Rejected(String),

    #[error("service bridge is closed")]
    Closed,

    #[error("service bridge dropped the request without replying")]
    NoReply,
}

/// The host's service-call bridge.
///
/// This trait allows the host side to be replaced with a test double.
#[async_trait]
pub trait ServiceBridge: Send + Sync {
    /// Queue a call without waiting for its outcome.
    fn fire(&self, call: ServiceCall);

    /// Issue a call and wait for the host to complete it.
    async fn call(&self, call: ServiceCall) -> Result<(), DispatchError>;
}

/// Discrete user actions on a zone tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileAction {
    ToggleMute,
    SetVolume,
    SelectSource,
}

/// Resolve a tile action plus the control's current value into a service
/// call. `None` when the action targets an unconfigured entity or carries an
/// unusable value.
pub fn tile_call(
    config: &TileConfig,
    action: &TileAction,
    value: Option<&str>,
) -> Option<ServiceCall> {
    match action {
        TileAction::ToggleMute => config
            .mute_entity
            .as_deref()
            .map(ServiceCall::switch_toggle),
        TileAction::SetVolume => {
            let value = value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
            Some(ServiceCall::number_set_value(&config.volume_entity, value))
        }
        TileAction::SelectSource => {
            let entity = config.source_entity.as_deref()?;
            Some(ServiceCall::select_option(entity, value?))
        }
    }
}

/// Fire a tile action at the bridge. Returns whether a call went out.
pub fn fire_tile_action(
    services: &dyn ServiceBridge,
    config: &TileConfig,
    action: &TileAction,
    value: Option<&str>,
) -> bool {
    match tile_call(config, action, value) {
        Some(call) => {
            info!("Firing {}", call);
            services.fire(call);
            true
        }
        None => {
            debug!(
                "Ignoring {:?} (value {:?}) for {}",
                action, value, config.volume_entity
            );
            false
        }
    }
}

/// Start or stop of a numbered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TriggerAction {
    Play,
    Stop,
}

impl TriggerAction {
    fn flag(self) -> char {
        match self {
            TriggerAction::Play => '1',
            TriggerAction::Stop => '0',
        }
    }
}

pub fn trigger_command(slot: u8) -> String {
    format!("SSTR{}", slot)
}

pub fn trigger_argument(event: u8, action: TriggerAction) -> String {
    format!("{}{}{}", event, ARGUMENT_SEPARATOR, action.flag())
}

/// Send a start/stop trigger and wait for it. Always returns the status line
/// to show; failures are absorbed into an `Error: ...` message.
pub async fn send_trigger(
    services: &dyn ServiceBridge,
    config: &EventButtonConfig,
    action: TriggerAction,
) -> String {
    let command = trigger_command(config.slot);
    let argument = trigger_argument(config.event, action);
    let call = ServiceCall::raw_command(&config.entry_id, &command, &argument);

    info!("[{}] Sending {} {}", config.entry_id, command, argument);
    match services.call(call).await {
        Ok(()) => format!("{} sent ({})", action, argument),
        Err(e) => {
            warn!("[{}] {} {} failed: {}", config.entry_id, command, argument, e);
            format!("Error: {}", e)
        }
    }
}

/// Service bridge double for tests: records calls and optionally rejects
/// awaited ones.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockBridge {
    pub fired: std::sync::Mutex<Vec<ServiceCall>>,
    pub called: std::sync::Mutex<Vec<ServiceCall>>,
    pub reject_with: Option<String>,
}

#[cfg(test)]
impl MockBridge {
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn fired(&self) -> Vec<ServiceCall> {
        self.fired.lock().unwrap().clone()
    }

    pub fn called(&self) -> Vec<ServiceCall> {
        self.called.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ServiceBridge for MockBridge {
    fn fire(&self, call: ServiceCall) {
        self.fired.lock().unwrap().push(call);
    }

    async fn call(&self, call: ServiceCall) -> Result<(), DispatchError> {
        self.called.lock().unwrap().push(call);
        match &self.reject_with {
            Some(message) => Err(DispatchError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}
