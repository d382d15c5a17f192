//! # Domain Verification Service - Internal API
//!
//! Package lifecycle, persistence and proxy management for the owning
//! package manager. These calls are trusted and never role-checked.

use super::*;
use crate::algorithms::{carry_forward_states, carry_forward_user_states};
use crate::domain::{PackageSetting, PersistedSettings};
use crate::ports::inbound::DomainVerificationInternal;
use crate::settings::AttachSource;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use tracing::{error, warn};

impl<C, D, E> DomainVerificationService<C, D, E>
where
    C: Connection,
    D: DomainCollector,
    E: Enforcer,
{
    /// Rebuilds the state of an upgraded package under its new token.
    ///
    /// Returns whether the verification agent should be notified.
    fn migrate_locked(
        &self,
        state: &mut ServiceState,
        old_setting: &PackageSetting,
        new_setting: &PackageSetting,
    ) -> bool {
        let package_name = new_setting.name.as_str();
        let old_id = old_setting.domain_set_id();
        let new_id = new_setting.domain_set_id();
        let old_state = state.attached.remove_by_id(&old_id);

        let (old_state, new_pkg) = match (old_state, &old_setting.pkg, &new_setting.pkg) {
            (Some(old_state), Some(_), Some(new_pkg)) => (old_state, new_pkg),
            (old_state, old_pkg, new_pkg) => {
                error!(
                    package = %package_name,
                    %old_id,
                    %new_id,
                    has_old_state = old_state.is_some(),
                    has_old_pkg = old_pkg.is_some(),
                    has_new_pkg = new_pkg.is_some(),
                    "Inconsistent state during migration, attaching blank state"
                );
                let has_auto_verify_domains = new_pkg
                    .as_ref()
                    .map(|pkg| !self.collector.collect_auto_verify_domains(pkg).is_empty())
                    .unwrap_or(true);
                state.attached.put(
                    package_name,
                    new_id,
                    PackageState::new(package_name, new_id, has_auto_verify_domains),
                );
                return false;
            }
        };

        let new_auto_verify_domains = self.collector.collect_auto_verify_domains(new_pkg);
        let state_map = carry_forward_states(old_state.state_map(), &new_auto_verify_domains);
        let user_states = if old_state.user_states().is_empty() {
            BTreeMap::new()
        } else {
            let new_web_domains = self.collector.collect_all_web_domains(new_pkg);
            carry_forward_user_states(old_state.user_states(), &new_web_domains)
        };

        let has_auto_verify_domains = !new_auto_verify_domains.is_empty();
        let mut new_state = PackageState::with_states(
            package_name,
            new_id,
            has_auto_verify_domains,
            state_map,
            user_states,
        );
        let applied = self.apply_immutable_state(&mut new_state, &new_auto_verify_domains);

        info!(
            package = %package_name,
            %old_id,
            %new_id,
            carried = new_state.state_map().len(),
            domains = new_auto_verify_domains.len(),
            "Migrated package state"
        );
        state.attached.put(package_name, new_id, new_state);

        has_auto_verify_domains && !applied
    }
}

impl<C, D, E> DomainVerificationInternal for DomainVerificationService<C, D, E>
where
    C: Connection,
    D: DomainCollector,
    E: Enforcer,
{
    fn generate_new_id(&self) -> DomainSetId {
        let state = self.state.lock();
        loop {
            let id = DomainSetId::new_random();
            if !id.is_nil()
                && !state.attached.contains_id(&id)
                && !state.settings.contains_id(&id)
            {
                return id;
            }
            warn!(%id, "Domain set id collision, regenerating");
        }
    }

    fn add_package(&self, setting: &PackageSetting) {
        let package_name = setting.name.as_str();
        let id = setting.domain_set_id();
        if id.is_nil() {
            error!(package = %package_name, "Package has no domain set id, not attaching");
            return;
        }

        let pkg = setting.pkg.as_ref();
        let auto_verify_domains = pkg
            .map(|pkg| self.collector.collect_auto_verify_domains(pkg))
            .unwrap_or_default();
        let has_auto_verify_domains = !auto_verify_domains.is_empty();

        let send_broadcast = {
            let mut state = self.state.lock();
            let source = state.settings.take_attach_source(package_name);
            let suppressed = source.suppresses_verification();
            let fresh = matches!(source, AttachSource::FreshInstall);

            let mut pkg_state = match source {
                AttachSource::PendingRestore(mut pkg_state)
                | AttachSource::RestoredBackup(mut pkg_state) => {
                    pkg_state.set_id(id);
                    pkg_state.set_has_auto_verify_domains(has_auto_verify_domains);
                    pkg_state
                }
                AttachSource::FreshInstall => {
                    PackageState::new(package_name, id, has_auto_verify_domains)
                }
            };

            let applied = self.apply_immutable_state(&mut pkg_state, &auto_verify_domains);
            if !applied && fresh {
                self.apply_legacy_preferences(&mut pkg_state, setting, pkg, &auto_verify_domains);
            }

            state.attached.put(package_name, id, pkg_state);
            info!(
                package = %package_name,
                %id,
                fresh,
                domains = auto_verify_domains.len(),
                "Attached package"
            );

            has_auto_verify_domains && !suppressed && !applied
        };

        self.connection.schedule_write_settings();
        if send_broadcast {
            self.send_broadcast_for_package(package_name);
        }
    }

    fn migrate_package(&self, old_setting: &PackageSetting, new_setting: &PackageSetting) {
        let send_broadcast = {
            let mut state = self.state.lock();
            self.migrate_locked(&mut state, old_setting, new_setting)
        };

        self.connection.schedule_write_settings();
        if send_broadcast {
            self.send_broadcast_for_package(&new_setting.name);
        }
    }

    fn remove_package(&self, package_name: &str) {
        let removed = self.state.lock().attached.remove(package_name).is_some();
        if removed {
            info!(package = %package_name, "Removed package state");
        } else {
            debug!(package = %package_name, "No attached state to remove");
        }
        self.connection.schedule_write_settings();
    }

    fn remove_user(&self, user_id: UserId) {
        {
            let mut state = self.state.lock();
            for pkg_state in state.attached.values_mut() {
                pkg_state.remove_user(user_id);
            }
            state.settings.remove_user(user_id);
        }

        info!(user_id, "Removed user selections");
        self.connection.schedule_write_settings();
    }

    fn write_state(&self, sink: &mut dyn Write) -> Result<(), DomainVerificationError> {
        let snapshot = {
            let state = self.state.lock();
            state.settings.snapshot(&state.attached)
        };

        snapshot.write_to(sink)?;
        debug!(
            active = snapshot.active.len(),
            restored = snapshot.restored.len(),
            "Wrote domain verification settings"
        );
        Ok(())
    }

    fn read_state(&self, source: &mut dyn Read) -> Result<(), DomainVerificationError> {
        let doc = PersistedSettings::read_from(source)?;
        let entries = doc.len();

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.settings.read_settings(doc, &mut state.attached);
        }

        info!(entries, "Read domain verification settings");
        Ok(())
    }

    fn restore_state(&self, source: &mut dyn Read) -> Result<(), DomainVerificationError> {
        let doc = PersistedSettings::read_from(source)?;
        let entries = doc.len();

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.settings.restore_settings(doc, &mut state.attached);
        }

        info!(entries, "Restored domain verification settings");
        self.connection.schedule_write_settings();
        Ok(())
    }

    fn set_proxy(&self, proxy: Arc<dyn DomainVerificationProxy>) {
        let available = proxy.is_available();
        *self.proxy.write() = proxy;
        info!(available, "Verification proxy replaced");
    }
}
