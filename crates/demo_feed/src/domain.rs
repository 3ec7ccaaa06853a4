mod demo_feed_driver;
mod demo_script;

pub use demo_feed_driver::*;
pub use demo_script::*;
