mod client;
mod message_queue;
mod trace_context;
mod traits;

pub use client::*;
pub use message_queue::*;
pub use trace_context::*;
pub use traits::*;
