pub mod domain;
pub mod notification_reconciler;

pub use domain::*;
pub use notification_reconciler::*;
