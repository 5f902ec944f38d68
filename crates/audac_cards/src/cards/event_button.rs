//! Event button: plays or stops a numbered event on one device slot.
//!
//! A press does not borrow the card while the trigger is in flight. It hands
//! back a [`PendingPress`] that owns everything the call needs and posts the
//! resulting status line to the card's result channel; the card drains that
//! channel whenever it renders.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::CARD_SIZE;
use super::apply_style;
use super::config::ConfigurationError;
use super::config::EventButtonConfig;
use super::config::validate_event_button;
use super::lifecycle::Lifecycle;
use super::lifecycle::Phase;
use crate::dispatch::TriggerAction;
use crate::dispatch::send_trigger;
use crate::projector::event_button_status;
use crate::snapshot::Hass;
use crate::view::DomEvent;
use crate::view::UiEvent;
use crate::view::View;
use crate::view::ViewBuilder;

const ROOT: &str = "card";

/// A trigger handed to the bridge whose outcome has not come back yet.
pub type PendingPress = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct EventButtonCard {
    lifecycle: Lifecycle<EventButtonConfig>,
    view: Option<View<TriggerAction>>,
    /// Outcome of the most recent dispatch, if any.
    last_result: Option<String>,
    results_tx: mpsc::UnboundedSender<String>,
    results_rx: mpsc::UnboundedReceiver<String>,
}

impl EventButtonCard {
    pub const TAG: &'static str = "audac-event-button-card";

    pub fn new() -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            lifecycle: Lifecycle::default(),
            view: None,
            last_result: None,
            results_tx,
            results_rx,
        }
    }

    pub fn set_config(&mut self, raw: &Value) -> Result<(), ConfigurationError> {
        self.configure(validate_event_button(raw)?);
        Ok(())
    }

    /// Apply an already validated config.
    pub fn configure(&mut self, config: EventButtonConfig) {
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

    pub fn config(&self) -> Option<&EventButtonConfig> {
        self.lifecycle.config()
    }

    pub fn view(&self) -> Option<&View<TriggerAction>> {
        self.view.as_ref()
    }

    pub fn last_result(&self) -> Option<&str> {
        self.last_result.as_deref()
    }

    pub fn handle_event(&self, event: &UiEvent) -> Option<PendingPress> {
        let action = self
            .view
            .as_ref()
            .and_then(|view| view.route(&event.target, event.kind))
            .copied();

        match action {
            Some(action) => self.press(action),
            None => {
                debug!("No listener for {} on {}", event.kind, event.target);
                None
            }
        }
    }

    /// Start a trigger for `action`. `None` before the card is live.
    ///
    /// Every press is independent: the returned future never fails, and a
    /// rejected call only changes the status line. Presses finishing out of
    /// order resolve by completion, the last one to finish wins.
    pub fn press(&self, action: TriggerAction) -> Option<PendingPress> {
        let Some((config, hass)) = self.lifecycle.live() else {
            debug!("{} not live, ignoring {}", Self::TAG, action);
            return None;
        };
        let config = config.clone();
        let services = hass.services.clone();
        let results = self.results_tx.clone();

        Some(Box::pin(async move {
            let status = send_trigger(services.as_ref(), &config, action).await;
            // The card may have been dropped while the call was in flight.
            let _ = results.send(status);
        }))
    }

    /// Show the outcome of presses that have finished since the last render.
    pub fn refresh(&mut self) {
        self.render();
    }

    fn render(&mut self) {
        while let Ok(status) = self.results_rx.try_recv() {
            self.last_result = Some(status);
        }

        let Some((config, _)) = self.lifecycle.live() else {
            return;
        };
        let view = self.view.get_or_insert_with(build_view);

        apply_style(view, ROOT, config.style);
        view.set_text("title", &config.label);
        view.set_text(
            "meta",
            &format!("Slot {} / Event {}", config.slot, config.event),
        );
        view.set_text("status", event_button_status(self.last_result.as_deref()));
    }
}

impl Default for EventButtonCard {
    fn default() -> Self {
        Self::new()
    }
}

fn build_view() -> View<TriggerAction> {
    ViewBuilder::new(ROOT, "ha-card")
        .class(ROOT, "audac-event-button")
        .child(ROOT, "title", "div")
        .child(ROOT, "meta", "div")
        .child(ROOT, "controls", "div")
        .child("controls", "play", "button")
        .child("controls", "stop", "button")
        .child(ROOT, "status", "div")
        .text("play", TriggerAction::Play.to_string())
        .text("stop", TriggerAction::Stop.to_string())
        .listen("play", DomEvent::Click, TriggerAction::Play)
        .listen("stop", DomEvent::Click, TriggerAction::Stop)
        .build()
}
