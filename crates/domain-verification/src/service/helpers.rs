//! # Domain Verification Service - Helper Methods
//!
//! Validation, immutable state and legacy preference rules shared by the
//! query and lifecycle paths. Methods suffixed `_locked` expect the caller to
//! hold the state lock.

use super::*;
use crate::domain::{InvalidDomainSetReason, PackageManifest, PackageSetting, VerificationState};
use tracing::warn;

impl<C, D, E> DomainVerificationService<C, D, E>
where
    C: Connection,
    D: DomainCollector,
    E: Enforcer,
{
    /// Resolves `id` to an attached package and checks `domains` against
    /// the package's declared domains.
    ///
    /// Checks run in order: null token, unknown token, unresolvable package,
    /// empty set, undeclared domain. `domains` is never modified.
    pub(crate) fn validate_attached_locked<'s>(
        &self,
        state: &'s mut ServiceState,
        id: DomainSetId,
        domains: &BTreeSet<String>,
        for_auto_verify: bool,
    ) -> Result<&'s mut PackageState, DomainVerificationError> {
        if id.is_nil() {
            return Err(DomainVerificationError::invalid_set(
                None,
                None,
                InvalidDomainSetReason::IdNull,
            ));
        }

        let pkg_state = state.attached.get_by_id_mut(&id).ok_or_else(|| {
            DomainVerificationError::invalid_set(Some(id), None, InvalidDomainSetReason::IdInvalid)
        })?;

        let package_name = pkg_state.package_name().to_string();
        let pkg = self
            .connection
            .package_setting_locked(&package_name)
            .and_then(|setting| setting.pkg)
            .ok_or_else(|| DomainVerificationError::PackageUnavailable(package_name.clone()))?;

        if domains.is_empty() {
            return Err(DomainVerificationError::invalid_set(
                Some(id),
                Some(&package_name),
                InvalidDomainSetReason::SetEmpty,
            ));
        }

        let declared = if for_auto_verify {
            self.collector.collect_auto_verify_domains(&pkg)
        } else {
            self.collector.collect_all_web_domains(&pkg)
        };

        if !domains.is_subset(&declared) {
            warn!(
                package = %package_name,
                requested = domains.len(),
                declared = declared.len(),
                "Rejected undeclared domains"
            );
            return Err(DomainVerificationError::invalid_set(
                Some(id),
                Some(&package_name),
                InvalidDomainSetReason::UnknownDomain,
            ));
        }

        Ok(pkg_state)
    }

    /// Approves every auto-verify domain of a platform-linked package.
    ///
    /// Returns whether the package is linked. Runs last when adding or
    /// migrating, so it overrides any carried or legacy state.
    pub(crate) fn apply_immutable_state(
        &self,
        pkg_state: &mut PackageState,
        auto_verify_domains: &BTreeSet<String>,
    ) -> bool {
        if !self.config.is_linked_app(pkg_state.package_name()) {
            return false;
        }

        let state_map = pkg_state.state_map_mut();
        for domain in auto_verify_domains {
            state_map.insert(domain.clone(), VerificationState::Approved);
        }
        debug!(
            package = %pkg_state.package_name(),
            domains = auto_verify_domains.len(),
            "Applied platform link approval"
        );
        true
    }

    /// Carries pre-verification preferences onto a fresh state.
    ///
    /// Users whose legacy choice was "always" get every web domain enabled.
    /// A legacy package-wide "always" marks every auto-verify domain
    /// `Migrated`, which the agent re-verifies later.
    pub(crate) fn apply_legacy_preferences(
        &self,
        pkg_state: &mut PackageState,
        setting: &PackageSetting,
        pkg: Option<&PackageManifest>,
        auto_verify_domains: &BTreeSet<String>,
    ) {
        let mut always_users = setting.users_with_legacy_always().peekable();
        if always_users.peek().is_some() {
            let web_domains = pkg
                .map(|pkg| self.collector.collect_all_web_domains(pkg))
                .unwrap_or_default();
            for user_id in always_users {
                pkg_state.user_state_or_create(user_id).add_hosts(&web_domains);
            }
        }

        if setting.legacy_always_approved() {
            let state_map = pkg_state.state_map_mut();
            for domain in auto_verify_domains {
                state_map.insert(domain.clone(), VerificationState::Migrated);
            }
            debug!(
                package = %pkg_state.package_name(),
                domains = auto_verify_domains.len(),
                "Migrated legacy approval"
            );
        }
    }

    /// Whether any live auto-verify domain of `pkg_state` still awaits a
    /// final answer. Unresolvable packages have none.
    pub(crate) fn has_unanswered_domains_locked(&self, pkg_state: &PackageState) -> bool {
        let Some(pkg) = self.connection.package_locked(pkg_state.package_name()) else {
            return false;
        };
        self.collector
            .collect_auto_verify_domains(&pkg)
            .iter()
            .any(|domain| {
                pkg_state
                    .state_map()
                    .get(domain)
                    .copied()
                    .unwrap_or_default()
                    .is_modifiable()
            })
    }

    /// Notifies the proxy about one package. Must not be called with the
    /// state lock held.
    pub(crate) fn send_broadcast_for_package(&self, package_name: &str) {
        let batch: BTreeSet<String> = [package_name.to_string()].into_iter().collect();
        debug!(package = %package_name, "Requesting verification");
        self.proxy().send_broadcast_for_packages(&batch);
    }
}
