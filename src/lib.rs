// Library interface for testing

pub mod config;
pub mod credentials;
pub mod db;
pub mod extract;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod queries;
pub mod schema;
pub mod slot;
pub mod store;
pub mod time_rule;
pub mod watcher;

pub use slot::{RawSlot, SeenSlot, SlotRecord};
pub use store::{SlotStore, SqliteSlotStore};
pub use time_rule::{ClockTime, ThresholdConfig};
