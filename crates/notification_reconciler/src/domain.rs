mod notification_log;
mod notification_reconciler_service;
mod polling_handle;

pub use notification_log::*;
pub use notification_reconciler_service::*;
pub use polling_handle::*;
