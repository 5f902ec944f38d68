//! Zone tile: volume slider, mute toggle and source selector for one zone.

use serde_json::Value;
use tracing::debug;

use super::config::ConfigurationError;
use super::config::TileConfig;
use super::config::validate_tile;
use super::lifecycle::Lifecycle;
use super::lifecycle::Phase;
use super::CARD_SIZE;
use super::apply_style;
use crate::dispatch::TileAction;
use crate::dispatch::fire_tile_action;
use crate::projector::TileProjection;
use crate::projector::project_tile;
use crate::snapshot::Hass;
use crate::view::DomEvent;
use crate::view::UiEvent;
use crate::view::View;
use crate::view::ViewBuilder;

const ROOT: &str = "card";

pub struct TileCard {
    lifecycle: Lifecycle<TileConfig>,
    view: Option<View<TileAction>>,
}

impl TileCard {
    pub const TAG: &'static str = "audac-zone-card";

    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            view: None,
        }
    }

    /// Validate and apply a new config. On error the previous config stays.
    pub fn set_config(&mut self, raw: &Value) -> Result<(), ConfigurationError> {
        self.configure(validate_tile(raw)?);
        Ok(())
    }

    /// Apply an already validated config.
    pub fn configure(&mut self, config: TileConfig) {
        self.lifecycle.configure(config);
        self.render();
    }

    pub fn set_hass(&mut self, hass: Hass) {
        self.lifecycle.connect(hass);
        self.render();
    }

    pub fn card_size(&self) -> u32 {
        CARD_SIZE
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn config(&self) -> Option<&TileConfig> {
        self.lifecycle.config()
    }

    /// `None` until the card has both a config and a host context.
    pub fn view(&self) -> Option<&View<TileAction>> {
        self.view.as_ref()
    }

    /// Route a user interaction to a service call. Fire-and-forget; the new
    /// state arrives with a later snapshot.
    pub fn handle_event(&mut self, event: &UiEvent) {
        let (Some((config, hass)), Some(view)) = (self.lifecycle.live(), self.view.as_ref()) else {
            debug!("{} not live, ignoring {:?}", Self::TAG, event);
            return;
        };
        let Some(action) = view.route(&event.target, event.kind) else {
            debug!("No listener for {} on {}", event.kind, event.target);
            return;
        };
        fire_tile_action(hass.services.as_ref(), config, action, event.value.as_deref());
    }

    fn render(&mut self) {
        let Some((config, hass)) = self.lifecycle.live() else {
            return;
        };
        let view = self.view.get_or_insert_with(build_view);

        apply_style(view, ROOT, config.style);
        // Optional controls follow the config even when the tick is skipped.
        view.set_hidden("mute", config.mute_entity.is_none());
        view.set_hidden("source", config.source_entity.is_none());

        if let Some(projection) = project_tile(config, &hass.states) {
            apply(view, &projection);
        }
    }
}

impl Default for TileCard {
    fn default() -> Self {
        Self::new()
    }
}

fn build_view() -> View<TileAction> {
    ViewBuilder::new(ROOT, "ha-card")
        .class(ROOT, "audac-zone")
        .child(ROOT, "header", "div")
        .child("header", "title", "div")
        .child("header", "mute", "button")
        .child(ROOT, "controls", "div")
        .child("controls", "volume", "input")
        .child("controls", "source", "select")
        .child(ROOT, "status", "div")
        .attr("volume", "type", "range")
        .text("mute", "Mute")
        .listen("mute", DomEvent::Click, TileAction::ToggleMute)
        .listen("volume", DomEvent::Change, TileAction::SetVolume)
        .listen("source", DomEvent::Change, TileAction::SelectSource)
        .build()
}

fn apply(view: &mut View<TileAction>, projection: &TileProjection) {
    view.set_text("title", &projection.title);

    let volume = &projection.volume;
    view.set_attr("volume", "min", &volume.min.to_string());
    view.set_attr("volume", "max", &volume.max.to_string());
    view.set_attr("volume", "step", &volume.step.to_string());
    view.set_attr("volume", "value", &volume.value.to_string());
    view.set_text("status", &format!("{} dB", volume.value));

    view.set_hidden("mute", projection.muted.is_none());
    let muted = projection.muted.unwrap_or(false);
    view.set_class("mute", "active", muted);
    view.set_attr("mute", "aria-pressed", if muted { "true" } else { "false" });

    match &projection.source {
        Some(source) => {
            view.set_hidden("source", false);
            view.set_options("source", &source.options);
            view.set_attr("source", "value", &source.selected);
        }
        None => view.set_hidden("source", true),
    }
}
