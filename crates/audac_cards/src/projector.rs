//! Projection of host entity state onto card view values.
//!
//! Missing or malformed entity data is never an error here. A control whose
//! data is absent is hidden, and a tick without a usable volume is skipped
//! entirely so the previous view stays on screen.

use serde_json::Value;
use tracing::debug;

use crate::cards::TileConfig;
use crate::snapshot::EntitySnapshot;
use crate::snapshot::EntityState;

/// Volume attenuation range of a zone, used when the entity does not carry
/// its own bounds.
pub const VOLUME_MIN: f64 = 0.0;
pub const VOLUME_MAX: f64 = 70.0;
pub const VOLUME_STEP: f64 = 1.0;

/// Status line of an event button before its first dispatch.
pub const READY: &str = "Ready";

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProjection {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceProjection {
    pub options: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileProjection {
    pub title: String,
    pub volume: VolumeProjection,
    /// `None` hides the mute control; otherwise whether the zone is muted.
    pub muted: Option<bool>,
    /// `None` hides the source selector.
    pub source: Option<SourceProjection>,
}

/// Project a snapshot for a zone tile. `None` means skip this tick.
pub fn project_tile(config: &TileConfig, states: &EntitySnapshot) -> Option<TileProjection> {
    let Some(volume_state) = states.get(&config.volume_entity) else {
        debug!("{} not in snapshot, skipping projection", config.volume_entity);
        return None;
    };
    let volume = project_volume(volume_state).or_else(|| {
        debug!(
            "{} has non-numeric state {:?}, skipping projection",
            config.volume_entity, volume_state.state
        );
        None
    })?;

    let title = config
        .name
        .clone()
        .or_else(|| {
            volume_state
                .attribute("friendly_name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| config.volume_entity.clone());

    let muted = config
        .mute_entity
        .as_deref()
        .map(|id| states.get(id).is_some_and(|s| s.state == "on"));

    let source = config
        .source_entity
        .as_deref()
        .and_then(|id| states.get(id))
        .map(project_source);

    Some(TileProjection {
        title,
        volume,
        muted,
        source,
    })
}

/// Numeric states are clamped into the entity's range; anything else
/// (`unavailable`, `unknown`, garbage) yields `None`.
fn project_volume(state: &EntityState) -> Option<VolumeProjection> {
    let value = state.state.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;

    let min = number_attribute(state, "min").unwrap_or(VOLUME_MIN);
    let max = number_attribute(state, "max")
        .filter(|max| *max >= min)
        .unwrap_or(VOLUME_MAX.max(min));
    let step = number_attribute(state, "step")
        .filter(|step| *step > 0.0)
        .unwrap_or(VOLUME_STEP);

    Some(VolumeProjection {
        value: value.clamp(min, max),
        min,
        max,
        step,
    })
}

fn project_source(state: &EntityState) -> SourceProjection {
    let options = state
        .attribute("options")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    SourceProjection {
        options,
        selected: state.state.clone(),
    }
}

fn number_attribute(state: &EntityState, key: &str) -> Option<f64> {
    state
        .attribute(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

/// Status text for an event button given its last dispatch result.
pub fn event_button_status(last_result: Option<&str>) -> &str {
    last_result.unwrap_or(READY)
}
