//! Algorithms for Domain Verification
//!
//! - `migration`: carry rules applied when a package is upgraded
//! - `restore`: merge rules applied when backup data is restored

pub mod migration;
pub mod restore;

pub use migration::{carry_forward_states, carry_forward_user_states};
pub use restore::{coerce_for_restore, merge_restored};
