pub mod demo_feed;
pub mod domain;
pub mod nats;

pub use demo_feed::*;
pub use domain::*;
pub use nats::*;
