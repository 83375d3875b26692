//! Error types
//!
//! Gameplay operations never fail: they report outcomes through return
//! values and the message log. The errors here cover construction and
//! lookup, where a caller hands the simulation something it cannot use.

use thiserror::Error;

use crate::creature::CreatureId;

/// Problems loading or validating a [`SimConfig`](crate::config::SimConfig)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("could not parse configuration: {0}")]
    Parse(String),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Roster bookkeeping failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("creature {0} is already in the roster")]
    Duplicate(CreatureId),

    #[error("creature {0} is not in the roster")]
    Missing(CreatureId),
}

/// Failed lookups in the bolt or monster catalogs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no bolt named '{0}'")]
    UnknownBolt(String),

    #[error("no monster named '{0}'")]
    UnknownMonster(String),
}

/// Any error surfaced by the simulation core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::Invalid {
            field: "map_width",
            reason: "must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for 'map_width': must be positive");
        assert_eq!(
            RosterError::Duplicate(CreatureId(7)).to_string(),
            "creature #7 is already in the roster"
        );
    }

    #[test]
    fn test_sim_error_from_conversions() {
        let err: SimError = CatalogError::UnknownBolt("zap".into()).into();
        assert_eq!(err.to_string(), "no bolt named 'zap'");
        assert!(matches!(err, SimError::Catalog(_)));
    }
}
