pub mod client;
pub mod events;

pub use client::StateFeed;
pub use events::StateEvent;
