// error.rs - Error hierarchy for sampler configuration
//
// Evaluation never fails: every evaluation-time problem degrades to a zero
// output. These errors only surface from configuration-time entry points.

use crate::gradient::source::EntityId;
use thiserror::Error;

/// Root error type for gradient sampler configuration.
#[derive(Error, Debug)]
pub enum SamplerError {
    /// The candidate reference is the sampler's own owning entity.
    #[error("gradient {entity} cannot reference itself")]
    SelfReference { entity: EntityId },

    /// The candidate's reference chain already leads back to the owner.
    #[error("gradient {candidate} already references {owner}; selecting it would create a cycle")]
    CyclicReference {
        candidate: EntityId,
        owner: EntityId,
    },

    /// A configuration value is out of its accepted domain.
    #[error("config error: {0}")]
    Config(String),

    /// The configuration document could not be parsed.
    #[error("invalid sampler config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SamplerResult<T> = Result<T, SamplerError>;
