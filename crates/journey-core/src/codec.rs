//! Serialized layout of the progress blob, and tolerant loading.
//!
//! The blob is a single JSON object holding the [`JourneyState`] fields in
//! camelCase plus a `version` number:
//!
//! ```json
//! {"version":1,"accessGranted":true,"chaptersUnlocked":[true,false,...],...}
//! ```
//!
//! # Reading rules
//!
//! - Missing fields take their defaults; unknown fields are ignored.
//! - A missing `version` is read as a pre-versioned blob.
//! - A `version` newer than [`FORMAT_VERSION`] is rejected as corrupt.
//! - Decoded state goes through [`JourneyState::repair`].
//!
//! Loading never fails: a missing blob gives defaults, and a blob that cannot
//! be decoded is copied aside under `<key>.corrupt` before defaults are used.

use serde_json::Value;

use crate::error::ErrorCode;
use crate::state::JourneyState;
use crate::storage::{Storage, StorageError};

/// Storage key for the progress blob.
pub const PROGRESS_KEY: &str = "journey.progress";

/// Current layout version written by [`encode`].
pub const FORMAT_VERSION: u64 = 1;

/// Why a stored blob could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("stored blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored blob is not a JSON object")]
    NotAnObject,

    #[error("stored blob has format version {found}, newest supported is {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },
}

impl DecodeError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Json(_) | Self::NotAnObject => ErrorCode::CorruptState,
            Self::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
        }
    }
}

/// Serialize `state` with the current version tag.
///
/// # Errors
///
/// Returns an error only if serialization itself fails, which the derived
/// impls never do for this type.
pub fn encode(state: &JourneyState) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(state)?;
    if let Value::Object(map) = &mut value {
        map.insert("version".to_string(), Value::from(FORMAT_VERSION));
    }
    serde_json::to_string(&value)
}

/// Parse and repair a stored progress blob.
///
/// # Errors
///
/// Returns [`DecodeError`] when the text is not a JSON object of the expected
/// shape or carries a newer version.
pub fn decode(raw: &str) -> Result<JourneyState, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = &value else {
        return Err(DecodeError::NotAnObject);
    };

    let version = map.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let mut state: JourneyState = serde_json::from_value(value)?;
    let fixes = state.repair();
    if fixes > 0 {
        tracing::warn!(fixes, version, "repaired inconsistent progress blob");
    }
    Ok(state)
}

/// How a load resolved.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing was stored yet.
    Fresh,
    /// The stored blob decoded cleanly.
    Restored,
    /// The stored blob was unreadable and replaced by defaults.
    Recovered {
        error: DecodeError,
        /// Key the damaged text was copied to, if the copy succeeded.
        quarantined_as: Option<String>,
    },
    /// The backend itself failed; defaults are in use for this session.
    Unavailable(StorageError),
}

impl LoadOutcome {
    /// True when defaults replaced a blob that should have been there.
    #[must_use]
    pub const fn lost_data(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }
}

/// A value read from storage plus how the read went.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub outcome: LoadOutcome,
}

/// Key under which a damaged copy of `key` is parked.
#[must_use]
pub fn quarantine_key(key: &str) -> String {
    format!("{key}.corrupt")
}

/// Read `key` and decode it, falling back to `T::default()` on any failure.
pub fn load_with<T, S, F>(storage: &S, key: &str, decode: F) -> Loaded<T>
where
    T: Default,
    S: Storage + ?Sized,
    F: FnOnce(&str) -> Result<T, DecodeError>,
{
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "no stored value, starting fresh");
            return Loaded {
                value: T::default(),
                outcome: LoadOutcome::Fresh,
            };
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "storage unavailable, using defaults for this session");
            return Loaded {
                value: T::default(),
                outcome: LoadOutcome::Unavailable(err),
            };
        }
    };

    match decode(&raw) {
        Ok(value) => Loaded {
            value,
            outcome: LoadOutcome::Restored,
        },
        Err(error) => {
            let target = quarantine_key(key);
            let quarantined_as = match storage.write(&target, &raw) {
                Ok(()) => Some(target),
                Err(write_err) => {
                    tracing::warn!(key, error = %write_err, "could not quarantine damaged blob");
                    None
                }
            };
            tracing::warn!(
                key,
                error = %error,
                quarantined = quarantined_as.as_deref().unwrap_or("-"),
                "discarded unreadable stored value"
            );
            Loaded {
                value: T::default(),
                outcome: LoadOutcome::Recovered {
                    error,
                    quarantined_as,
                },
            }
        }
    }
}

/// Load the progress blob from `storage`.
pub fn load_progress<S: Storage + ?Sized>(storage: &S) -> Loaded<JourneyState> {
    load_with(storage, PROGRESS_KEY, decode)
}
