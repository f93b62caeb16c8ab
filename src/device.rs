//! # Device Directory
//!
//! Immutable map from originator id to device model, built once from the
//! configuration and handed to the pipeline at construction.

use std::collections::HashMap;

use crate::eep::Profile;
use crate::error::DecodeError;
use crate::esp3::protocol::hex_id;

/// Strip the leading zero pair from a 48-bit id so it matches its 32-bit form
///
/// ```
/// use enocean_gateway::device::normalize_id;
///
/// assert_eq!(normalize_id(&[0, 0, 4, 1, 2, 3]), &[4, 1, 2, 3]);
/// assert_eq!(normalize_id(&[4, 1, 2, 3]), &[4, 1, 2, 3]);
/// ```
pub fn normalize_id(id: &[u8]) -> &[u8] {
    match id {
        [0, 0, rest @ ..] if rest.len() == 4 => rest,
        _ => id,
    }
}

/// Canonical text form of a configured id: lowercase hex, no separators,
/// 48-bit ids with a leading zero pair shortened to 32 bits
pub fn normalize_id_str(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match cleaned.strip_prefix("0000") {
        Some(rest) if cleaned.len() == 12 => rest.to_string(),
        _ => cleaned,
    }
}

/// A device resolved from the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevice {
    pub id: String,
    pub model: String,
    pub profile: Profile,
}

/// Read-only directory of monitored devices
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    devices: HashMap<String, String>,
}

impl DeviceDirectory {
    /// Build a directory; ids are normalized and models upper-cased
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let devices = entries
            .into_iter()
            .map(|(id, model)| {
                (
                    normalize_id_str(id.as_ref()),
                    model.as_ref().trim().to_ascii_uppercase(),
                )
            })
            .collect();
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Model label for a raw originator id
    pub fn model(&self, originator_id: &[u8]) -> Option<&str> {
        self.devices
            .get(&hex_id(normalize_id(originator_id)))
            .map(String::as_str)
    }

    /// Resolve an originator id to its model and decoding profile
    ///
    /// # Errors
    ///
    /// - `UnmappedDevice` if the id is not listed
    /// - `UnsupportedModel` if the listed model has no decoder
    pub fn resolve(&self, originator_id: &[u8]) -> Result<ResolvedDevice, DecodeError> {
        let id = hex_id(normalize_id(originator_id));
        let model = self
            .devices
            .get(&id)
            .ok_or_else(|| DecodeError::UnmappedDevice(id.clone()))?;

        let profile = Profile::for_model(model).ok_or_else(|| DecodeError::UnsupportedModel {
            id: id.clone(),
            model: model.clone(),
        })?;

        Ok(ResolvedDevice {
            id,
            model: model.clone(),
            profile,
        })
    }
}
