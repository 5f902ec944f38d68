mod config;
mod editor;
mod event_button;
mod lifecycle;
mod tile;

use linkme::distributed_slice;
use serde_json::Value;

pub use config::CUSTOM_PREFIX;
pub use config::ConfigurationError;
pub use config::EventButtonConfig;
pub use config::StyleMode;
pub use config::TileConfig;
pub use config::WidgetConfig;
pub use config::default_label;
pub use config::validate;
pub use config::validate_event_button;
pub use config::validate_tile;
pub use editor::ConfigChanged;
pub use editor::ConfigChangedReceiver;
pub use editor::EventButtonEditor;
pub use event_button::EventButtonCard;
pub use event_button::PendingPress;
pub use lifecycle::Lifecycle;
pub use lifecycle::Phase;
pub use tile::TileCard;

use crate::registry::CARDS;
use crate::registry::CardDefinition;
use crate::registry::EditorDefinition;
use crate::snapshot::Hass;
use crate::view::UiEvent;
use crate::view::View;

/// Sizing hint reported to the host's layout engine.
pub const CARD_SIZE: u32 = 2;

#[distributed_slice(CARDS)]
static ZONE_CARD: CardDefinition = CardDefinition {
    tag: TileCard::TAG,
    name: "Audac Zone",
    description: "Volume, mute and source control for one Audac matrix zone",
    preview: true,
    create: || Card::Tile(TileCard::new()),
    editor: None,
};

#[distributed_slice(CARDS)]
static EVENT_BUTTON_CARD: CardDefinition = CardDefinition {
    tag: EventButtonCard::TAG,
    name: "Audac Event Button",
    description: "Play or stop a numbered event on an Audac device slot",
    preview: true,
    create: || Card::EventButton(EventButtonCard::new()),
    editor: Some(EditorDefinition {
        tag: EventButtonEditor::TAG,
        create: EventButtonEditor::new,
    }),
};

/// Swap the root's style class to match `style`.
fn apply_style<A>(view: &mut View<A>, root: &str, style: StyleMode) {
    for mode in [StyleMode::Default, StyleMode::Bubble] {
        view.set_class(root, mode.class(), mode == style);
    }
}

/// Any mounted card.
pub enum Card {
    Tile(TileCard),
    EventButton(EventButtonCard),
}

impl Card {
    pub fn tag(&self) -> &'static str {
        match self {
            Card::Tile(_) => TileCard::TAG,
            Card::EventButton(_) => EventButtonCard::TAG,
        }
    }

    pub fn set_config(&mut self, raw: &Value) -> Result<(), ConfigurationError> {
        match self {
            Card::Tile(card) => card.set_config(raw),
            Card::EventButton(card) => card.set_config(raw),
        }
    }

    /// Apply a config already validated by [`validate`]. Fails when the
    /// config is for the other kind of card.
    pub fn configure(&mut self, config: WidgetConfig) -> Result<(), ConfigurationError> {
        match (self, config) {
            (Card::Tile(card), WidgetConfig::Tile(config)) => card.configure(config),
            (Card::EventButton(card), WidgetConfig::EventButton(config)) => {
                card.configure(config)
            }
            (card, config) => {
                return Err(ConfigurationError::WrongKind {
                    card: card.tag(),
                    config: config.tag(),
                });
            }
        }
        Ok(())
    }

    pub fn set_hass(&mut self, hass: Hass) {
        match self {
            Card::Tile(card) => card.set_hass(hass),
            Card::EventButton(card) => card.set_hass(hass),
        }
    }

    pub fn card_size(&self) -> u32 {
        match self {
            Card::Tile(card) => card.card_size(),
            Card::EventButton(card) => card.card_size(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Card::Tile(card) => card.phase(),
            Card::EventButton(card) => card.phase(),
        }
    }

    /// Route a user interaction. Tile actions go out immediately; an event
    /// button press comes back as a future for the host to drive.
    pub fn handle_event(&mut self, event: &UiEvent) -> Option<PendingPress> {
        match self {
            Card::Tile(card) => {
                card.handle_event(event);
                None
            }
            Card::EventButton(card) => card.handle_event(event),
        }
    }

    /// Pick up finished presses.
    pub fn refresh(&mut self) {
        if let Card::EventButton(card) = self {
            card.refresh();
        }
    }

    /// Rendered view as text, `None` before the card is live.
    pub fn render_text(&self) -> Option<String> {
        match self {
            Card::Tile(card) => card.view().map(View::render_text),
            Card::EventButton(card) => card.view().map(View::render_text),
        }
    }
}
