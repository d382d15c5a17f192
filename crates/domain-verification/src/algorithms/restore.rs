//! # Backup Restore Merge
//!
//! Rules for folding a restored package state into an existing one, and for
//! preparing a restored state that has no package to attach to yet.
//!
//! Restored data never downgrades anything: it only fills domains that have
//! no answer yet, and only with states that were trusted on the source device.

use crate::domain::{PackageState, VerificationState};

/// Merges `incoming` into `existing`.
///
/// - a domain absent or NO_RESPONSE in `existing` becomes RESTORED when the
///   incoming state is SUCCESS or RESTORED;
/// - a user absent in `existing` adopts the incoming selection;
/// - a user present in both gets the union of enabled hosts.
pub fn merge_restored(existing: &mut PackageState, incoming: &PackageState) {
    for (domain, incoming_state) in incoming.state_map() {
        if !incoming_state.is_restorable() {
            continue;
        }

        let current = existing
            .state_map()
            .get(domain)
            .copied()
            .unwrap_or_default();
        if current == VerificationState::NoResponse {
            existing
                .state_map_mut()
                .insert(domain.clone(), VerificationState::Restored);
        }
    }

    for (user_id, incoming_user) in incoming.user_states() {
        if existing.user_state(*user_id).is_some() {
            existing
                .user_state_or_create(*user_id)
                .add_hosts(incoming_user.enabled_hosts());
        } else {
            *existing.user_state_or_create(*user_id) = incoming_user.clone();
        }
    }
}

/// Coerces a restored state with nothing to merge into.
///
/// SUCCESS and RESTORED become RESTORED; every other entry is dropped.
pub fn coerce_for_restore(state: &mut PackageState) {
    let map = state.state_map_mut();
    map.retain(|_, s| s.is_restorable());
    for s in map.values_mut() {
        *s = VerificationState::Restored;
    }
}
