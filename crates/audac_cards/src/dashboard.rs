//! Host-side container for a column of cards.
//!
//! Mounts cards from raw configs through the element registry, fans every
//! host tick out to each card, and routes user interactions to one card.
//! Event button presses run as their own tasks, so a slow device never
//! holds up ticks or other cards.
//! A card whose config is rejected is kept as a failed slot so the host can
//! show the error in its place.

use std::fmt::Write as _;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::cards::Card;
use crate::registry::ElementRegistry;
use crate::snapshot::Hass;
use crate::view::UiEvent;

pub enum Slot {
    Mounted(Card),
    Failed { card_type: String, error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("no card at position {0}")]
    NoSuchCard(usize),

    #[error("card at position {0} failed to load")]
    CardFailed(usize),
}

#[derive(Default)]
pub struct Dashboard {
    slots: Vec<Slot>,
}

impl Dashboard {
    pub fn build(cards: &[Value], registry: &ElementRegistry) -> Self {
        let slots = cards
            .iter()
            .map(|raw| match registry.mount(raw) {
                Ok(card) => Slot::Mounted(card),
                Err(e) => {
                    let card_type = raw
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("<none>")
                        .to_string();
                    warn!("Refusing card {}: {}", card_type, e);
                    Slot::Failed {
                        card_type,
                        error: e.to_string(),
                    }
                }
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Deliver one host tick to every mounted card.
    pub fn push(&mut self, hass: &Hass) {
        for slot in &mut self.slots {
            if let Slot::Mounted(card) = slot {
                card.set_hass(hass.clone());
            }
        }
    }

    /// Route a user interaction to one card. A resulting trigger is spawned
    /// on the runtime; its outcome shows after the next [`Dashboard::refresh`]
    /// or [`Dashboard::push`].
    pub fn dispatch(
        &mut self,
        index: usize,
        event: &UiEvent,
    ) -> Result<Option<JoinHandle<()>>, DashboardError> {
        match self.slots.get_mut(index) {
            Some(Slot::Mounted(card)) => Ok(card.handle_event(event).map(tokio::spawn)),
            Some(Slot::Failed { .. }) => Err(DashboardError::CardFailed(index)),
            None => Err(DashboardError::NoSuchCard(index)),
        }
    }

    /// Show the outcome of every trigger that has finished.
    pub fn refresh(&mut self) {
        for slot in &mut self.slots {
            if let Slot::Mounted(card) = slot {
                card.refresh();
            }
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Mounted(card) => {
                    let _ = writeln!(out, "[{}] {} (size {})", index, card.tag(), card.card_size());
                    match card.render_text() {
                        Some(text) => out.push_str(&text),
                        None => out.push_str("(waiting for host)\n"),
                    }
                }
                Slot::Failed { card_type, error } => {
                    let _ = writeln!(out, "[{}] {} failed: {}", index, card_type, error);
                }
            }
        }
        out
    }
}
