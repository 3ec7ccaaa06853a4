mod breach_event;
mod breaching_set;
mod device_position;
mod geofence;
mod queue;
mod result;

pub use breach_event::*;
pub use breaching_set::*;
pub use device_position::*;
pub use geofence::*;
pub use queue::*;
pub use result::*;
