//! # Domain Verification Service
//!
//! The main service implementing the Domain Verification API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `DomainVerificationApi` for role-checked external callers
//! 2. Implements `DomainVerificationInternal` for the package manager
//! 3. Guards all package state with a single lock
//! 4. Uses dependency injection for all external collaborators
//!
//! ## Locking
//!
//! `state` guards the attached `StateMap` and the pending/restored holder.
//! `proxy` is a separate lock and is only held long enough to clone the
//! current `Arc`. Write scheduling and proxy notification always run after
//! the state guard is dropped.

mod helpers;
mod lifecycle;
mod query;

use crate::adapters::UnavailableProxy;
use crate::config::DomainVerificationConfig;
use crate::domain::{DomainSetId, DomainVerificationError, PackageState, StateMap, UserId};
use crate::ports::inbound::{DomainVerificationApi, UserSelection};
use crate::ports::outbound::{Connection, DomainCollector, DomainVerificationProxy, Enforcer};
use crate::settings::DomainVerificationSettings;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// State guarded by the service lock.
#[derive(Debug, Default)]
pub(crate) struct ServiceState {
    /// Packages currently known to the package manager.
    pub(crate) attached: StateMap<PackageState>,
    /// Read from disk or backup, awaiting `add_package`.
    pub(crate) settings: DomainVerificationSettings,
}

/// The Domain Verification Service.
///
/// Implements both `DomainVerificationApi` (external, role-checked) and
/// `DomainVerificationInternal` (lifecycle, persistence, proxy).
pub struct DomainVerificationService<C, D, E>
where
    C: Connection,
    D: DomainCollector,
    E: Enforcer,
{
    /// Package manager link.
    pub(crate) connection: C,
    /// Manifest domain derivation.
    pub(crate) collector: D,
    /// Caller role checks.
    pub(crate) enforcer: E,
    /// Service configuration.
    pub(crate) config: DomainVerificationConfig,
    /// Verification agent channel.
    pub(crate) proxy: RwLock<Arc<dyn DomainVerificationProxy>>,
    /// Attached, pending and restored package state.
    pub(crate) state: Mutex<ServiceState>,
}

/// Dependencies for DomainVerificationService
pub struct DomainVerificationDependencies<C, D, E> {
    pub connection: C,
    pub collector: D,
    pub enforcer: E,
}

impl<C, D, E> DomainVerificationService<C, D, E>
where
    C: Connection,
    D: DomainCollector,
    E: Enforcer,
{
    /// Create a new service with no attached packages.
    ///
    /// The proxy starts as `UnavailableProxy` until `set_proxy` is called.
    pub fn new(
        deps: DomainVerificationDependencies<C, D, E>,
        config: DomainVerificationConfig,
    ) -> Self {
        info!(
            linked_apps = config.linked_apps.len(),
            system_uids = config.system_uids.len(),
            "Domain verification service created"
        );

        Self {
            connection: deps.connection,
            collector: deps.collector,
            enforcer: deps.enforcer,
            config,
            proxy: RwLock::new(Arc::new(UnavailableProxy)),
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn config(&self) -> &DomainVerificationConfig {
        &self.config
    }

    /// Current proxy. The proxy lock is released before returning.
    pub(crate) fn proxy(&self) -> Arc<dyn DomainVerificationProxy> {
        self.proxy.read().clone()
    }

    /// Whether a real verification agent is connected.
    pub fn has_real_verifier(&self) -> bool {
        self.proxy().is_available()
    }

    /// Forwards a deferred message to the proxy.
    pub fn run_message(&self, message_code: u32) -> bool {
        self.proxy().run_message(message_code)
    }

    /// Number of attached packages.
    pub fn attached_count(&self) -> usize {
        self.state.lock().attached.len()
    }

    /// Number of states read from disk that await their package.
    pub fn pending_count(&self) -> usize {
        self.state.lock().settings.pending_count()
    }

    /// Number of states restored from backup that await their package.
    pub fn restored_count(&self) -> usize {
        self.state.lock().settings.restored_count()
    }

    /// Asks the agent to verify every attached package with unanswered
    /// auto-verify domains, in a single batch.
    ///
    /// Attaching from pending state never notifies, so the host calls this
    /// once after boot. Returns the batch that was sent.
    pub fn resend_pending_verification(&self) -> BTreeSet<String> {
        let batch: BTreeSet<String> = {
            let state = self.state.lock();
            state
                .attached
                .values()
                .filter(|pkg_state| pkg_state.has_auto_verify_domains())
                .filter(|pkg_state| self.has_unanswered_domains_locked(pkg_state))
                .map(|pkg_state| pkg_state.package_name().to_string())
                .collect()
        };

        if batch.is_empty() {
            debug!("No packages awaiting verification");
        } else {
            info!(packages = batch.len(), "Re-sending pending verification requests");
            self.proxy().send_broadcast_for_packages(&batch);
        }
        batch
    }

    /// `set_link_handling_allowed` for the calling user.
    pub fn set_link_handling_allowed_for_calling_user(
        &self,
        package_name: &str,
        allowed: bool,
    ) -> Result<(), DomainVerificationError> {
        let user_id: UserId = self.connection.calling_user_id();
        self.set_link_handling_allowed(package_name, allowed, user_id)
    }

    /// `set_user_selection` for the calling user.
    pub fn set_user_selection_for_calling_user(
        &self,
        id: DomainSetId,
        domains: &BTreeSet<String>,
        enabled: bool,
    ) -> Result<(), DomainVerificationError> {
        let user_id = self.connection.calling_user_id();
        self.set_user_selection(id, domains, enabled, user_id)
    }

    /// `get_user_selection` for the calling user.
    pub fn get_user_selection_for_calling_user(
        &self,
        package_name: &str,
    ) -> Result<Option<UserSelection>, DomainVerificationError> {
        let user_id = self.connection.calling_user_id();
        self.get_user_selection(package_name, user_id)
    }
}
