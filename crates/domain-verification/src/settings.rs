//! # Pending and Restored State
//!
//! Holds package states read from disk or from a backup that have not been
//! attached to an installed package yet. Entries here are exclusive with the
//! attached `StateMap`: once a package is added, its pending or restored
//! entry moves into the map.
//!
//! Guarded by the service lock, like the attached map.

use crate::algorithms::{coerce_for_restore, merge_restored};
use crate::domain::{
    DomainSetId, PackageState, PersistedPackage, PersistedSettings, StateMap, UserId,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Where the state for a newly added package comes from.
#[derive(Debug)]
pub enum AttachSource {
    /// Brand new package; state starts blank.
    FreshInstall,
    /// State read from disk at boot.
    PendingRestore(PackageState),
    /// State restored from a backup before the package was installed.
    RestoredBackup(PackageState),
}

impl AttachSource {
    /// Whether attaching from this source should stay silent towards the verifier.
    pub fn suppresses_verification(&self) -> bool {
        !matches!(self, AttachSource::FreshInstall)
    }
}

/// Package states waiting for their package to be added: `pending` from the
/// settings file read at boot, `restored` from a backup.
#[derive(Debug, Default)]
pub struct DomainVerificationSettings {
    pending: BTreeMap<String, PackageState>,
    restored: BTreeMap<String, PackageState>,
}

impl DomainVerificationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn restored_count(&self) -> usize {
        self.restored.len()
    }

    /// Removes and returns the stored state for `package_name`, pending first.
    ///
    /// A restored entry shadowed by a pending one is discarded with it, so a
    /// later reinstall starts fresh.
    pub fn take_attach_source(&mut self, package_name: &str) -> AttachSource {
        if let Some(state) = self.pending.remove(package_name) {
            if self.restored.remove(package_name).is_some() {
                debug!(package = %package_name, "Dropped restored state shadowed by pending");
            }
            return AttachSource::PendingRestore(state);
        }
        if let Some(state) = self.restored.remove(package_name) {
            return AttachSource::RestoredBackup(state);
        }
        AttachSource::FreshInstall
    }

    pub fn contains_id(&self, id: &DomainSetId) -> bool {
        self.pending
            .values()
            .chain(self.restored.values())
            .any(|state| state.id() == *id)
    }

    pub fn remove_user(&mut self, user_id: UserId) {
        for state in self.pending.values_mut().chain(self.restored.values_mut()) {
            state.remove_user(user_id);
        }
    }

    /// Applies a document written by `write_state`.
    ///
    /// Active entries without an attached package become pending. An attached
    /// package with a different token is merged as if restored. Restored
    /// entries replace any restored entry of the same name.
    pub fn read_settings(&mut self, doc: PersistedSettings, attached: &mut StateMap<PackageState>) {
        for entry in doc.active {
            let incoming = PackageState::from(entry);
            match attached.get_mut(incoming.package_name()) {
                Some(existing) => {
                    // Settings are read before packages are added; reaching
                    // this arm means the host added packages first.
                    warn!(
                        package = %incoming.package_name(),
                        "Settings read after package attach, merging"
                    );
                    if existing.id() != incoming.id() {
                        merge_restored(existing, &incoming);
                    }
                }
                None => {
                    self.pending
                        .insert(incoming.package_name().to_string(), incoming);
                }
            }
        }

        for entry in doc.restored {
            let state = PackageState::from(entry);
            self.restored.insert(state.package_name().to_string(), state);
        }

        debug!(
            pending = self.pending.len(),
            restored = self.restored.len(),
            "Read domain verification settings"
        );
    }

    /// Applies a backup document.
    ///
    /// Every entry, active or restored, is merged into the attached, pending
    /// or restored state of the same package, in that order of preference.
    /// With nothing to merge into, the entry is coerced and kept as restored.
    pub fn restore_settings(
        &mut self,
        doc: PersistedSettings,
        attached: &mut StateMap<PackageState>,
    ) {
        let entries = doc.active.into_iter().chain(doc.restored);
        for entry in entries {
            let mut incoming = PackageState::from(entry);
            let name = incoming.package_name().to_string();

            if let Some(existing) = attached.get_mut(&name) {
                merge_restored(existing, &incoming);
            } else if let Some(existing) = self.pending.get_mut(&name) {
                merge_restored(existing, &incoming);
            } else if let Some(existing) = self.restored.get_mut(&name) {
                merge_restored(existing, &incoming);
            } else {
                coerce_for_restore(&mut incoming);
                self.restored.insert(name, incoming);
            }
        }
    }

    /// Builds the document for `write_state`: attached and pending states as
    /// active, restored states as restored.
    pub fn snapshot(&self, attached: &StateMap<PackageState>) -> PersistedSettings {
        let mut active: Vec<PersistedPackage> = attached
            .values()
            .chain(self.pending.values())
            .map(PersistedPackage::from)
            .collect();
        active.sort_by(|a, b| a.package_name.cmp(&b.package_name));

        PersistedSettings {
            active,
            restored: self.restored.values().map(PersistedPackage::from).collect(),
        }
    }
}
