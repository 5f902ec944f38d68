use crate::snapshot::Hass;

/// Coarse phase of a card, for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Phase {
    Unconfigured,
    Configured,
    Live,
}

/// Host-driven card lifecycle.
///
/// The two inbound host calls are the only transitions: `configure` (a
/// validated config replaced atomically) and `connect` (a new host context).
/// A host context that arrives before any config is held until one does.
#[derive(Debug)]
pub enum Lifecycle<C> {
    Unconfigured { hass: Option<Hass> },
    Configured { config: C },
    Live { config: C, hass: Hass },
}

impl<C> Default for Lifecycle<C> {
    fn default() -> Self {
        Lifecycle::Unconfigured { hass: None }
    }
}

impl<C> Lifecycle<C> {
    pub fn configure(&mut self, config: C) {
        *self = match std::mem::take(self) {
            Lifecycle::Unconfigured { hass: None } => Lifecycle::Configured { config },
            Lifecycle::Unconfigured { hass: Some(hass) } | Lifecycle::Live { hass, .. } => {
                Lifecycle::Live { config, hass }
            }
            Lifecycle::Configured { .. } => Lifecycle::Configured { config },
        };
    }

    pub fn connect(&mut self, hass: Hass) {
        *self = match std::mem::take(self) {
            Lifecycle::Unconfigured { .. } => Lifecycle::Unconfigured { hass: Some(hass) },
            Lifecycle::Configured { config } | Lifecycle::Live { config, .. } => {
                Lifecycle::Live { config, hass }
            }
        };
    }

    pub fn phase(&self) -> Phase {
        match self {
            Lifecycle::Unconfigured { .. } => Phase::Unconfigured,
            Lifecycle::Configured { .. } => Phase::Configured,
            Lifecycle::Live { .. } => Phase::Live,
        }
    }

    pub fn config(&self) -> Option<&C> {
        match self {
            Lifecycle::Unconfigured { .. } => None,
            Lifecycle::Configured { config } | Lifecycle::Live { config, .. } => Some(config),
        }
    }

    pub fn live(&self) -> Option<(&C, &Hass)> {
        match self {
            Lifecycle::Live { config, hass } => Some((config, hass)),
            _ => None,
        }
    }
}
