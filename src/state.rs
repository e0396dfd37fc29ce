//! # State Persistence
//!
//! Saves the parameter store as a small, self-describing JSON document:
//!
//! ```json
//! { "version": 1, "params": { "mode": 0.0, "delayTimeMs": 350.0, ... } }
//! ```
//!
//! Restoring ignores keys it does not know and falls back to defaults for
//! the ones it does not find, so presets survive parameters being added
//! or removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{ParamId, ParamStore};

/// Version written by [`save`]. Blobs from a newer version are rejected.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("malformed state blob: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
struct StateBlob {
    #[serde(default = "default_version")]
    version: u32,
    /// Values are kept untyped so that keys from other versions, whatever
    /// they hold, never fail the whole blob.
    #[serde(default)]
    params: BTreeMap<String, serde_json::Value>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

/// Serialize every current parameter value.
pub fn save(store: &ParamStore) -> Result<Vec<u8>, StateError> {
    let blob = StateBlob {
        version: STATE_VERSION,
        params: ParamId::ALL
            .into_iter()
            .map(|id| (id.spec().id.to_owned(), store.get(id).into()))
            .collect(),
    };
    Ok(serde_json::to_vec(&blob)?)
}

/// Republish the values in `data` to `store`.
///
/// Nothing is published unless the whole blob parses. A declared
/// parameter that is missing or not a number gets its default.
///
/// Only `store` is updated. The host-facing [`PluginParams`] keep their
/// previous values, so the host's own saved state will not contain what
/// was restored here, and a later host write of a value equal to the
/// stale host-side one does not reach the store.
///
/// [`PluginParams`]: crate::params::PluginParams
pub fn restore(store: &ParamStore, data: &[u8]) -> Result<(), StateError> {
    let blob: StateBlob = serde_json::from_slice(data)?;
    if blob.version > STATE_VERSION {
        return Err(StateError::UnsupportedVersion {
            found: blob.version,
            supported: STATE_VERSION,
        });
    }

    for id in ParamId::ALL {
        let spec = id.spec();
        let value = blob
            .params
            .get(spec.id)
            .and_then(serde_json::Value::as_f64)
            .map_or(spec.default, |value| value as f32);
        store.set(id, value);
    }
    Ok(())
}
