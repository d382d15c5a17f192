//! # Persisted Settings Document
//!
//! Shape of the settings document produced by `write_state` and consumed by
//! `read_state` / `restore_state`:
//!
//! ```text
//! {
//!   "active":   [ PackageEntry, ... ],   attached + pending states
//!   "restored": [ PackageEntry, ... ]    restored states awaiting install
//! }
//!
//! PackageEntry = { packageName, id, hasAutoVerifyDomains,
//!                  states: { domain: code },
//!                  userStates: [ { userId, enabledHosts, allowLinkHandling } ] }
//! ```
//!
//! Entries are sorted by package name so the output is deterministic.

use super::entities::{PackageState, UserSelectionState};
use super::errors::PersistenceError;
use super::value_objects::{DomainSetId, UserId, VerificationState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

/// Root of the settings document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(default)]
    pub active: Vec<PersistedPackage>,
    #[serde(default)]
    pub restored: Vec<PersistedPackage>,
}

/// One package entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPackage {
    pub package_name: String,
    pub id: DomainSetId,
    #[serde(default)]
    pub has_auto_verify_domains: bool,
    #[serde(default)]
    pub states: BTreeMap<String, VerificationState>,
    #[serde(default)]
    pub user_states: Vec<PersistedUserState>,
}

/// One user's selection inside a package entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUserState {
    pub user_id: UserId,
    #[serde(default)]
    pub enabled_hosts: BTreeSet<String>,
    #[serde(default = "default_allow_link_handling")]
    pub allow_link_handling: bool,
}

fn default_allow_link_handling() -> bool {
    true
}

impl From<&PackageState> for PersistedPackage {
    fn from(state: &PackageState) -> Self {
        Self {
            package_name: state.package_name().to_string(),
            id: state.id(),
            has_auto_verify_domains: state.has_auto_verify_domains(),
            states: state.state_map().clone(),
            user_states: state
                .user_states()
                .values()
                .map(|user| PersistedUserState {
                    user_id: user.user_id,
                    enabled_hosts: user.enabled_hosts().clone(),
                    allow_link_handling: !user.is_disallow_link_handling(),
                })
                .collect(),
        }
    }
}

impl From<PersistedPackage> for PackageState {
    fn from(entry: PersistedPackage) -> Self {
        let user_states = entry
            .user_states
            .into_iter()
            .map(|user| {
                (
                    user.user_id,
                    UserSelectionState::with_hosts(
                        user.user_id,
                        user.enabled_hosts,
                        !user.allow_link_handling,
                    ),
                )
            })
            .collect();

        PackageState::with_states(
            entry.package_name,
            entry.id,
            entry.has_auto_verify_domains,
            entry.states,
            user_states,
        )
    }
}

impl PersistedSettings {
    /// Encodes the document as JSON into `sink`.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<(), PersistenceError> {
        serde_json::to_writer_pretty(&mut *sink, self)
            .map_err(|e| PersistenceError::Encode(e.to_string()))?;
        sink.flush()
            .map_err(|e| PersistenceError::Encode(e.to_string()))
    }

    /// Decodes a JSON document from `source`.
    pub fn read_from(source: &mut dyn Read) -> Result<Self, PersistenceError> {
        serde_json::from_reader(source).map_err(|e| PersistenceError::Decode(e.to_string()))
    }

    /// Total entry count across both sections.
    pub fn len(&self) -> usize {
        self.active.len() + self.restored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
