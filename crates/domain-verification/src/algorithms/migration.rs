//! # Upgrade Migration
//!
//! Reconciles a package's verification state across an update that replaced
//! its identity token.
//!
//! ## Carry rules
//!
//! | Old state | New state |
//! |-----------|-----------|
//! | SUCCESS / RESTORED / MIGRATED | kept as-is |
//! | anything else | dropped (reads as NO_RESPONSE) |
//! | domain no longer declared | dropped |
//!
//! Dropping a non-final state is the signal to the verification agent that
//! the domain must be re-attempted after the upgrade.

use crate::domain::{UserId, UserSelectionState, VerificationState};
use std::collections::{BTreeMap, BTreeSet};

/// Builds the state map for the upgraded package.
pub fn carry_forward_states(
    old_states: &BTreeMap<String, VerificationState>,
    new_auto_verify_domains: &BTreeSet<String>,
) -> BTreeMap<String, VerificationState> {
    new_auto_verify_domains
        .iter()
        .filter_map(|domain| {
            old_states
                .get(domain)
                .filter(|state| state.survives_migration())
                .map(|state| (domain.clone(), *state))
        })
        .collect()
}

/// Rebuilds per-user selections, dropping hosts the new manifest no longer declares.
pub fn carry_forward_user_states(
    old_user_states: &BTreeMap<UserId, UserSelectionState>,
    new_web_domains: &BTreeSet<String>,
) -> BTreeMap<UserId, UserSelectionState> {
    old_user_states
        .iter()
        .map(|(user_id, old)| {
            let mut user_state = old.clone();
            user_state.retain_hosts(new_web_domains);
            (*user_id, user_state)
        })
        .collect()
}
