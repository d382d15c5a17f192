//! # Domain Verification Service - External API
//!
//! Role-checked queries and mutations. Every operation authorizes the caller
//! before taking the state lock.

use super::*;
use crate::domain::VerificationState;
use crate::ports::inbound::DomainSet;
use std::collections::BTreeMap;
use tracing::warn;

impl<C, D, E> DomainVerificationApi for DomainVerificationService<C, D, E>
where
    C: Connection,
    D: DomainCollector,
    E: Enforcer,
{
    fn list_verified_package_names(&self) -> Result<Vec<String>, DomainVerificationError> {
        let proxy = self.proxy();
        self.enforcer
            .assert_approved_verifier(self.connection.calling_uid(), proxy.as_ref())?;

        let state = self.state.lock();
        Ok(state
            .attached
            .values()
            .filter(|pkg_state| pkg_state.has_auto_verify_domains())
            .map(|pkg_state| pkg_state.package_name().to_string())
            .collect())
    }

    fn get_domain_set(
        &self,
        package_name: &str,
    ) -> Result<Option<DomainSet>, DomainVerificationError> {
        let proxy = self.proxy();
        self.enforcer
            .assert_approved_querent(self.connection.calling_uid(), proxy.as_ref())?;

        let state = self.state.lock();
        let Some(pkg_state) = state.attached.get(package_name) else {
            return Ok(None);
        };

        let pkg = self
            .connection
            .package_locked(package_name)
            .ok_or_else(|| DomainVerificationError::PackageUnavailable(package_name.to_string()))?;

        let domains = self.collector.collect_auto_verify_domains(&pkg);
        if domains.is_empty() {
            return Ok(None);
        }

        let mut host_to_state = pkg_state.state_map().clone();
        for domain in domains {
            host_to_state
                .entry(domain)
                .or_insert(VerificationState::NoResponse);
        }

        Ok(Some(DomainSet {
            id: pkg_state.id(),
            package_name: package_name.to_string(),
            host_to_state,
        }))
    }

    fn set_verification_state(
        &self,
        id: DomainSetId,
        domains: &BTreeSet<String>,
        new_state: VerificationState,
    ) -> Result<usize, DomainVerificationError> {
        let proxy = self.proxy();
        self.enforcer
            .assert_approved_verifier(self.connection.calling_uid(), proxy.as_ref())?;

        if !new_state.is_settable_by_verifier() {
            warn!(state = %new_state, "Rejected verifier state outside the settable range");
            return Err(DomainVerificationError::InvalidArgument(format!(
                "verifier may only set SUCCESS or codes >= FIRST_VERIFIER_DEFINED, got {}",
                new_state.code()
            )));
        }
        let new_state = new_state.normalized();

        let modified = {
            let mut state = self.state.lock();
            let pkg_state = self.validate_attached_locked(&mut state, id, domains, true)?;
            let state_map = pkg_state.state_map_mut();

            let mut modified = 0;
            for domain in domains {
                let previous = state_map.get(domain).copied();
                if matches!(previous, Some(previous) if !previous.is_modifiable()) {
                    continue;
                }
                state_map.insert(domain.clone(), new_state);
                modified += 1;
            }

            debug!(
                package = %pkg_state.package_name(),
                state = %new_state,
                requested = domains.len(),
                modified,
                "Recorded verification result"
            );
            modified
        };

        self.connection.schedule_write_settings();
        Ok(modified)
    }

    fn set_link_handling_allowed(
        &self,
        package_name: &str,
        allowed: bool,
        user_id: UserId,
    ) -> Result<(), DomainVerificationError> {
        self.enforcer.assert_approved_user_selector(
            self.connection.calling_uid(),
            self.connection.calling_user_id(),
            user_id,
        )?;

        {
            let mut state = self.state.lock();
            let pkg_state = state
                .attached
                .get_mut(package_name)
                .ok_or_else(|| {
                    DomainVerificationError::PackageUnavailable(package_name.to_string())
                })?;

            pkg_state
                .user_state_or_create(user_id)
                .set_disallow_link_handling(!allowed);
        }

        debug!(package = %package_name, user_id, allowed, "Updated link handling");
        self.connection.schedule_write_settings();
        Ok(())
    }

    fn set_user_selection(
        &self,
        id: DomainSetId,
        domains: &BTreeSet<String>,
        enabled: bool,
        user_id: UserId,
    ) -> Result<(), DomainVerificationError> {
        self.enforcer.assert_approved_user_selector(
            self.connection.calling_uid(),
            self.connection.calling_user_id(),
            user_id,
        )?;

        {
            let mut state = self.state.lock();
            let pkg_state = self.validate_attached_locked(&mut state, id, domains, false)?;
            let user_state = pkg_state.user_state_or_create(user_id);
            if enabled {
                user_state.add_hosts(domains);
            } else {
                user_state.remove_hosts(domains);
            }
            debug!(
                package = %pkg_state.package_name(),
                user_id,
                enabled,
                domains = domains.len(),
                "Updated user selection"
            );
        }

        self.connection.schedule_write_settings();
        Ok(())
    }

    fn get_user_selection(
        &self,
        package_name: &str,
        user_id: UserId,
    ) -> Result<Option<UserSelection>, DomainVerificationError> {
        self.enforcer.assert_approved_user_selector(
            self.connection.calling_uid(),
            self.connection.calling_user_id(),
            user_id,
        )?;

        let state = self.state.lock();
        let Some(pkg_state) = state.attached.get(package_name) else {
            return Ok(None);
        };

        let pkg = self
            .connection
            .package_locked(package_name)
            .ok_or_else(|| DomainVerificationError::PackageUnavailable(package_name.to_string()))?;

        let mut host_to_enabled: BTreeMap<String, bool> = self
            .collector
            .collect_all_web_domains(&pkg)
            .into_iter()
            .map(|domain| (domain, false))
            .collect();

        // No sub-state means the user never opted out.
        let mut open_verified_links = true;
        if let Some(user_state) = pkg_state.user_state(user_id) {
            open_verified_links = !user_state.is_disallow_link_handling();
            for host in user_state.enabled_hosts() {
                host_to_enabled.insert(host.clone(), true);
            }
        }

        Ok(Some(UserSelection {
            id: pkg_state.id(),
            package_name: package_name.to_string(),
            user_id,
            open_verified_links,
            host_to_enabled,
        }))
    }
}
