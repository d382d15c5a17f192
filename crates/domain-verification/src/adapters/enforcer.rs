//! Policy Enforcer
//!
//! Implements `Enforcer` from a set of trusted system uids and the verifier
//! identity reported by the proxy.

use crate::config::DomainVerificationConfig;
use crate::domain::{CallerRole, DomainVerificationError, Uid, UserId};
use crate::ports::outbound::{DomainVerificationProxy, Enforcer};
use std::collections::BTreeSet;
use tracing::warn;

/// Role rules:
///
/// | Role | Allowed callers |
/// |------|-----------------|
/// | Verifier | system uids, the proxy's verifier |
/// | Querent | system uids, the proxy's verifier |
/// | UserSelector | system uids, any caller acting on its own user |
#[derive(Clone, Debug)]
pub struct PolicyEnforcer {
    system_uids: BTreeSet<Uid>,
}

impl PolicyEnforcer {
    pub fn new(system_uids: BTreeSet<Uid>) -> Self {
        Self { system_uids }
    }

    pub fn from_config(config: &DomainVerificationConfig) -> Self {
        Self::new(config.system_uids.clone())
    }

    fn is_system(&self, uid: Uid) -> bool {
        self.system_uids.contains(&uid)
    }

    fn deny(role: CallerRole, uid: Uid) -> DomainVerificationError {
        warn!(%role, uid, "Rejected caller without required role");
        DomainVerificationError::NotAuthorized { role, uid }
    }
}

impl Default for PolicyEnforcer {
    fn default() -> Self {
        Self::from_config(&DomainVerificationConfig::default())
    }
}

impl Enforcer for PolicyEnforcer {
    fn assert_approved_verifier(
        &self,
        calling_uid: Uid,
        proxy: &dyn DomainVerificationProxy,
    ) -> Result<(), DomainVerificationError> {
        if self.is_system(calling_uid) || proxy.is_caller_verifier(calling_uid) {
            Ok(())
        } else {
            Err(Self::deny(CallerRole::Verifier, calling_uid))
        }
    }

    fn assert_approved_querent(
        &self,
        calling_uid: Uid,
        proxy: &dyn DomainVerificationProxy,
    ) -> Result<(), DomainVerificationError> {
        if self.is_system(calling_uid) || proxy.is_caller_verifier(calling_uid) {
            Ok(())
        } else {
            Err(Self::deny(CallerRole::Querent, calling_uid))
        }
    }

    fn assert_approved_user_selector(
        &self,
        calling_uid: Uid,
        calling_user_id: UserId,
        target_user_id: UserId,
    ) -> Result<(), DomainVerificationError> {
        if self.is_system(calling_uid) || calling_user_id == target_user_id {
            Ok(())
        } else {
            Err(Self::deny(CallerRole::UserSelector, calling_uid))
        }
    }
}

/// Enforcer that authorizes every caller. For tests and trusted embeddings.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAllEnforcer;

impl Enforcer for AllowAllEnforcer {
    fn assert_approved_verifier(
        &self,
        _calling_uid: Uid,
        _proxy: &dyn DomainVerificationProxy,
    ) -> Result<(), DomainVerificationError> {
        Ok(())
    }

    fn assert_approved_querent(
        &self,
        _calling_uid: Uid,
        _proxy: &dyn DomainVerificationProxy,
    ) -> Result<(), DomainVerificationError> {
        Ok(())
    }

    fn assert_approved_user_selector(
        &self,
        _calling_uid: Uid,
        _calling_user_id: UserId,
        _target_user_id: UserId,
    ) -> Result<(), DomainVerificationError> {
        Ok(())
    }
}
