//! Registration surface for cards and their editors.
//!
//! Each card module contributes a [`CardDefinition`] to [`CARDS`]. At startup
//! the host calls [`register_cards`] once, which defines every tag in an
//! [`ElementRegistry`] and advertises each card in a [`CardCatalog`] for the
//! card picker. Defining a tag twice is skipped, not an error.

use std::collections::BTreeMap;

use linkme::distributed_slice;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::cards::Card;
use crate::cards::ConfigChangedReceiver;
use crate::cards::EventButtonEditor;
use crate::cards::validate;

/// Static description of one card type.
pub struct CardDefinition {
    pub tag: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview: bool,
    pub create: fn() -> Card,
    pub editor: Option<EditorDefinition>,
}

pub struct EditorDefinition {
    pub tag: &'static str,
    pub create: fn() -> (EventButtonEditor, ConfigChangedReceiver),
}

#[distributed_slice]
pub static CARDS: [CardDefinition];

/// Constructor stored against a tag name.
#[derive(Clone, Copy)]
pub enum Constructor {
    Card(fn() -> Card),
    Editor(fn() -> (EventButtonEditor, ConfigChangedReceiver)),
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constructor::Card(_) => f.write_str("Card(<fn>)"),
            Constructor::Editor(_) => f.write_str("Editor(<fn>)"),
        }
    }
}

/// Tag name → constructor, each tag defined at most once.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    elements: BTreeMap<&'static str, Constructor>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `tag`. Returns `false` (and keeps the first constructor) when
    /// the tag is already defined.
    pub fn define(&mut self, tag: &'static str, constructor: Constructor) -> bool {
        if self.elements.contains_key(tag) {
            debug!("Element {} already registered, skipping", tag);
            return false;
        }
        self.elements.insert(tag, constructor);
        true
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.elements.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Instantiate the card for a config `type` (with or without `custom:`).
    pub fn create_card(&self, card_type: &str) -> Option<Card> {
        let tag = card_type
            .strip_prefix(crate::cards::CUSTOM_PREFIX)
            .unwrap_or(card_type);
        match self.elements.get(tag)? {
            Constructor::Card(create) => Some(create()),
            Constructor::Editor(_) => None,
        }
    }

    pub fn create_editor(&self, tag: &str) -> Option<(EventButtonEditor, ConfigChangedReceiver)> {
        match self.elements.get(tag)? {
            Constructor::Editor(create) => Some(create()),
            Constructor::Card(_) => None,
        }
    }

    /// Create a card from a raw config: look up its `type`, then apply the
    /// config. A rejected config never yields an instance.
    pub fn mount(&self, raw: &serde_json::Value) -> Result<Card, MountError> {
        let card_type = raw
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(MountError::MissingType)?;
        let mut card = self
            .create_card(card_type)
            .ok_or_else(|| MountError::UnknownType(card_type.to_string()))?;
        card.configure(validate(raw)?)?;
        Ok(card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    #[error("card config has no `type`")]
    MissingType,

    #[error("no card registered for type `{0}`")]
    UnknownType(String),

    #[error(transparent)]
    Configuration(#[from] crate::cards::ConfigurationError),
}

/// Card picker entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub card_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct CardCatalog {
    entries: Vec<CatalogEntry>,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `entry` unless a card of the same type already is.
    pub fn advertise(&mut self, entry: CatalogEntry) -> bool {
        if self.entries.iter().any(|e| e.card_type == entry.card_type) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

/// Define every card in [`CARDS`] (and its editor) and advertise it.
/// Returns how many tags were newly defined; calling it again is harmless.
pub fn register_cards(elements: &mut ElementRegistry, catalog: &mut CardCatalog) -> usize {
    let mut defined = 0;
    for card in CARDS {
        if elements.define(card.tag, Constructor::Card(card.create)) {
            info!("Registered card {}", card.tag);
            defined += 1;
        }
        if let Some(editor) = &card.editor {
            if elements.define(editor.tag, Constructor::Editor(editor.create)) {
                info!("Registered editor {}", editor.tag);
                defined += 1;
            }
        }
        catalog.advertise(CatalogEntry {
            card_type: card.tag,
            name: card.name,
            description: card.description,
            preview: card.preview,
        });
    }
    defined
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cards::ConfigurationError;
    use crate::cards::EventButtonCard;
    use crate::cards::Phase;
    use crate::cards::TileCard;

    fn registered() -> (ElementRegistry, CardCatalog) {
        let mut elements = ElementRegistry::new();
        let mut catalog = CardCatalog::new();
        register_cards(&mut elements, &mut catalog);
        (elements, catalog)
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut elements = ElementRegistry::new();
        let mut catalog = CardCatalog::new();

        assert_eq!(register_cards(&mut elements, &mut catalog), 3);
        assert_eq!(register_cards(&mut elements, &mut catalog), 0);

        assert_eq!(elements.len(), 3);
        assert!(elements.is_defined(TileCard::TAG));
        assert!(elements.is_defined(EventButtonCard::TAG));
        assert!(elements.is_defined(EventButtonEditor::TAG));
        assert_eq!(catalog.entries().len(), 2);
    }

    #[test]
    fn test_define_keeps_first() {
        let mut elements = ElementRegistry::new();
        assert!(elements.define("x-card", Constructor::Card(|| Card::Tile(TileCard::new()))));
        assert!(!elements.define("x-card", Constructor::Editor(EventButtonEditor::new)));
        assert!(elements.create_card("custom:x-card").is_some());
        assert!(elements.create_editor("x-card").is_none());
    }

    #[test]
    fn test_catalog_json() {
        let (_, catalog) = registered();
        let json = serde_json::to_value(&catalog).unwrap();
        let entries = json.as_array().unwrap();
        assert!(entries.contains(&json!({
            "type": "audac-zone-card",
            "name": "Audac Zone",
            "description": "Volume, mute and source control for one Audac matrix zone",
            "preview": true,
        })));
        assert!(entries.iter().any(|e| e["type"] == "audac-event-button-card"));
    }

    #[test]
    fn test_create_by_type() {
        let (elements, _) = registered();
        assert_eq!(
            elements.create_card("custom:audac-zone-card").map(|c| c.tag()),
            Some(TileCard::TAG)
        );
        assert!(elements.create_card("audac-event-button-card").is_some());
        assert!(elements.create_card(EventButtonEditor::TAG).is_none());
        assert!(elements.create_card("custom:unknown").is_none());
        assert!(elements.create_editor(EventButtonEditor::TAG).is_some());
    }

    #[test]
    fn test_mount() {
        let (elements, _) = registered();

        let card = elements
            .mount(&json!({"type": "custom:audac-event-button-card", "entry_id": "e"}))
            .unwrap();
        assert_eq!(card.card_size(), 2);
        assert_eq!(card.phase(), Phase::Configured);

        assert_eq!(
            elements.mount(&json!({"entry_id": "e"})).err(),
            Some(MountError::MissingType)
        );
        assert_eq!(
            elements.mount(&json!({"type": "custom:nope"})).err(),
            Some(MountError::UnknownType("custom:nope".to_string()))
        );
        assert_eq!(
            elements
                .mount(&json!({"type": "custom:audac-zone-card"}))
                .err(),
            Some(MountError::Configuration(ConfigurationError::MissingField(
                "volume_entity"
            )))
        );
    }

    #[test]
    fn test_configure_checks_kind() {
        let (elements, _) = registered();
        let mut card = elements.create_card(TileCard::TAG).unwrap();

        let config = validate(&json!({"type": "custom:audac-event-button-card", "entry_id": "e"}))
            .unwrap();
        assert_eq!(
            card.configure(config),
            Err(ConfigurationError::WrongKind {
                card: "audac-zone-card",
                config: "audac-event-button-card",
            })
        );
        assert_eq!(card.phase(), Phase::Unconfigured);

        let config = validate(&json!({"type": "audac-zone-card", "volume_entity": "number.v"}))
            .unwrap();
        assert_eq!(card.configure(config), Ok(()));
        assert_eq!(card.phase(), Phase::Configured);
    }
}
