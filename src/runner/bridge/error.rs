use thiserror::Error;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::RealmId;

pub const NAME_COLLISION_MESSAGE: &str =
    "Cannot bind an API on top of an existing property on the window object";

/// Failures of bridge operations.
///
/// Every variant is local to the call that produced it. When a failure has to surface inside
/// a realm it is turned into a thrown value through `From<BridgeError> for JErrorType`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{}", NAME_COLLISION_MESSAGE)]
    NameCollision(String),

    #[error("Context bridge recursion depth exceeded. Nested objects deeper than {0} are not supported.")]
    RecursionDepthExceeded(usize),

    #[error("An object could not be cloned.")]
    Uncloneable,

    #[error("{0}")]
    CrossRealmException(String),

    #[error("{realm} has been torn down, the bridged value can no longer be used")]
    StaleHandle { realm: RealmId },

    #[error("No world with id {0} exists in this frame")]
    UnknownWorld(i32),

    #[error("Invalid key path '{path}': {reason}")]
    InvalidKeyPath { path: String, reason: String },

    #[error("Failed to freeze {0}")]
    FreezeFailed(String),

    #[error("Weak reference tracking is not available in sandboxed realms")]
    WeakTrackingUnavailable,

    #[error("Invalid bridge configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Script(JErrorType),
}

impl BridgeError {
    pub fn invalid_key_path(path: impl ToString, reason: impl Into<String>) -> Self {
        BridgeError::InvalidKeyPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// The message a JS `Error` built from this failure carries.
    pub fn message(&self) -> String {
        match self {
            BridgeError::Script(e) => match e.message() {
                Some(m) => m.to_string(),
                None => e.to_string(),
            },
            e => e.to_string(),
        }
    }
}

impl From<JErrorType> for BridgeError {
    fn from(e: JErrorType) -> Self {
        BridgeError::Script(e)
    }
}

impl From<BridgeError> for JErrorType {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Script(e) => e,
            e @ BridgeError::RecursionDepthExceeded(_) | e @ BridgeError::Uncloneable => {
                JErrorType::TypeError(e.to_string())
            }
            e => JErrorType::Error(e.to_string()),
        }
    }
}
