//! Core domain entities for the Domain Verification subsystem.
//!
//! `PackageState` is the live record for one attached package.
//! `UserSelectionState` is its per-user sub-record. The package snapshot
//! types (`PackageManifest`, `PackageSetting`) are supplied by the host and
//! only read here.

use super::value_objects::{DomainSetId, UserId, VerificationState};
use std::collections::{BTreeMap, BTreeSet};

/// Per-user link selection for one package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserSelectionState {
    /// Owning user.
    pub user_id: UserId,
    /// Hosts the user manually allowed to open in the app.
    enabled_hosts: BTreeSet<String>,
    /// The user opted out of in-app link handling for this package.
    disallow_link_handling: bool,
}

impl UserSelectionState {
    /// Creates an empty selection for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            enabled_hosts: BTreeSet::new(),
            disallow_link_handling: false,
        }
    }

    /// Creates a selection with explicit contents.
    pub fn with_hosts(
        user_id: UserId,
        enabled_hosts: BTreeSet<String>,
        disallow_link_handling: bool,
    ) -> Self {
        Self {
            user_id,
            enabled_hosts,
            disallow_link_handling,
        }
    }

    pub fn enabled_hosts(&self) -> &BTreeSet<String> {
        &self.enabled_hosts
    }

    pub fn is_disallow_link_handling(&self) -> bool {
        self.disallow_link_handling
    }

    pub fn set_disallow_link_handling(&mut self, disallow: bool) {
        self.disallow_link_handling = disallow;
    }

    /// Enables every host in `hosts`.
    pub fn add_hosts<'a, I>(&mut self, hosts: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.enabled_hosts.extend(hosts.into_iter().cloned());
    }

    /// Disables every host in `hosts`.
    pub fn remove_hosts<'a, I>(&mut self, hosts: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for host in hosts {
            self.enabled_hosts.remove(host);
        }
    }

    /// Drops every enabled host not in `declared`.
    pub fn retain_hosts(&mut self, declared: &BTreeSet<String>) {
        self.enabled_hosts.retain(|host| declared.contains(host));
    }
}

/// Live verification record for one attached package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageState {
    package_name: String,
    id: DomainSetId,
    has_auto_verify_domains: bool,
    /// Domain → state. Keys may lag the manifest until refreshed.
    state_map: BTreeMap<String, VerificationState>,
    user_states: BTreeMap<UserId, UserSelectionState>,
}

impl PackageState {
    /// Creates a blank state.
    pub fn new(
        package_name: impl Into<String>,
        id: DomainSetId,
        has_auto_verify_domains: bool,
    ) -> Self {
        Self::with_states(
            package_name,
            id,
            has_auto_verify_domains,
            BTreeMap::new(),
            BTreeMap::new(),
        )
    }

    /// Creates a state with explicit contents.
    pub fn with_states(
        package_name: impl Into<String>,
        id: DomainSetId,
        has_auto_verify_domains: bool,
        state_map: BTreeMap<String, VerificationState>,
        user_states: BTreeMap<UserId, UserSelectionState>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            id,
            has_auto_verify_domains,
            state_map,
            user_states,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn id(&self) -> DomainSetId {
        self.id
    }

    /// Re-tags this state with a new identity token.
    pub fn set_id(&mut self, id: DomainSetId) {
        self.id = id;
    }

    pub fn has_auto_verify_domains(&self) -> bool {
        self.has_auto_verify_domains
    }

    pub fn set_has_auto_verify_domains(&mut self, value: bool) {
        self.has_auto_verify_domains = value;
    }

    pub fn state_map(&self) -> &BTreeMap<String, VerificationState> {
        &self.state_map
    }

    pub fn state_map_mut(&mut self) -> &mut BTreeMap<String, VerificationState> {
        &mut self.state_map
    }

    pub fn user_states(&self) -> &BTreeMap<UserId, UserSelectionState> {
        &self.user_states
    }

    pub fn user_state(&self, user_id: UserId) -> Option<&UserSelectionState> {
        self.user_states.get(&user_id)
    }

    /// Returns the selection for `user_id`, creating an empty one on first use.
    pub fn user_state_or_create(&mut self, user_id: UserId) -> &mut UserSelectionState {
        self.user_states
            .entry(user_id)
            .or_insert_with(|| UserSelectionState::new(user_id))
    }

    /// Drops the selection for `user_id`. Returns whether one existed.
    pub fn remove_user(&mut self, user_id: UserId) -> bool {
        self.user_states.remove(&user_id).is_some()
    }

    /// Verifier-writable domains, i.e. those still awaiting a final answer.
    pub fn modifiable_domains(&self) -> impl Iterator<Item = &String> {
        self.state_map
            .iter()
            .filter(|(_, state)| state.is_modifiable())
            .map(|(domain, _)| domain)
    }
}

/// One link-handling filter declared in a package manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkFilter {
    /// The package asked for automatic verification of this filter's hosts.
    pub auto_verify: bool,
    /// Filter accepts browsable (web) intents.
    pub browsable: bool,
    /// URI schemes, e.g. `https`.
    pub schemes: Vec<String>,
    /// URI hosts, e.g. `example.com`.
    pub hosts: Vec<String>,
}

impl LinkFilter {
    /// Browsable https filter, the common shape for app links.
    pub fn web(auto_verify: bool, hosts: &[&str]) -> Self {
        Self {
            auto_verify,
            browsable: true,
            schemes: vec!["http".to_string(), "https".to_string()],
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }

    /// Whether this filter handles web links only.
    pub fn handles_web(&self) -> bool {
        self.browsable
            && !self.schemes.is_empty()
            && self
                .schemes
                .iter()
                .all(|s| s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
    }
}

/// Parsed manifest data relevant to link handling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub package_name: String,
    pub filters: Vec<LinkFilter>,
}

impl PackageManifest {
    pub fn new(package_name: impl Into<String>, filters: Vec<LinkFilter>) -> Self {
        Self {
            package_name: package_name.into(),
            filters,
        }
    }
}

/// Legacy per-user link preference recorded before domain verification existed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegacyLinkStatus {
    #[default]
    Undefined,
    Ask,
    Always,
    Never,
    AlwaysAsk,
}

/// Legacy per-user package state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LegacyUserState {
    pub link_status: LegacyLinkStatus,
}

/// Legacy package-wide verification record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LegacyVerificationInfo {
    pub status: LegacyLinkStatus,
}

/// Host-owned description of an installed package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageSetting {
    pub name: String,
    /// Token assigned by the host, obtained from `generate_new_id`.
    pub domain_set_id: Option<DomainSetId>,
    /// Parsed manifest; absent while the package cannot be resolved.
    pub pkg: Option<PackageManifest>,
    pub user_states: BTreeMap<UserId, LegacyUserState>,
    pub legacy_verification: Option<LegacyVerificationInfo>,
}

impl PackageSetting {
    pub fn new(name: impl Into<String>, domain_set_id: DomainSetId, pkg: PackageManifest) -> Self {
        Self {
            name: name.into(),
            domain_set_id: Some(domain_set_id),
            pkg: Some(pkg),
            user_states: BTreeMap::new(),
            legacy_verification: None,
        }
    }

    /// Token assigned to this setting, or the nil token if none was assigned.
    pub fn domain_set_id(&self) -> DomainSetId {
        self.domain_set_id.unwrap_or_else(DomainSetId::nil)
    }

    /// Users whose legacy preference was "always open in app".
    pub fn users_with_legacy_always(&self) -> impl Iterator<Item = UserId> + '_ {
        self.user_states
            .iter()
            .filter(|(_, state)| state.link_status == LegacyLinkStatus::Always)
            .map(|(user_id, _)| *user_id)
    }

    /// Whether the legacy package-wide record approved every domain.
    pub fn legacy_always_approved(&self) -> bool {
        self.legacy_verification
            .map(|info| info.status == LegacyLinkStatus::Always)
            .unwrap_or(false)
    }
}
