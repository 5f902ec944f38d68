pub mod bridge;
pub mod cards;
pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod projector;
pub mod registry;
pub mod snapshot;
pub mod view;

pub use bridge::BridgeRequest;
pub use bridge::ChannelBridge;
pub use cards::Card;
pub use cards::ConfigurationError;
pub use cards::EventButtonCard;
pub use cards::EventButtonEditor;
pub use cards::TileCard;
pub use config::Config;
pub use config::LogLevel;
pub use dashboard::Dashboard;
pub use dispatch::DispatchError;
pub use dispatch::ServiceBridge;
pub use dispatch::ServiceCall;
pub use registry::CardCatalog;
pub use registry::ElementRegistry;
pub use registry::register_cards;
pub use snapshot::EntitySnapshot;
pub use snapshot::EntityState;
pub use snapshot::Hass;
pub use view::UiEvent;
