//! Runtime layer for roomwatch.
//!
//! Runs one [`room_monitor::RoomMonitor`] task per watched room, fans them
//! out from the [`orchestrator::SessionOrchestrator`], and delivers their
//! notifications through a shared [`notifier::Notifier`].

pub mod notifier;
pub mod orchestrator;
pub mod room_monitor;

#[cfg(test)]
mod test_utils;

pub use watch_core as core;
pub use watch_transport as transport;
