//! Event reconciliation: queries, notifications and commands in one place

pub mod auto_select;
pub mod lifecycle;
pub mod status;

pub use auto_select::{AutoSelectDecision, AutoSelectPolicy};
pub use lifecycle::SubscriptionSet;
pub use status::{ConfigChange, ErrorSink, StatusReconciler};
