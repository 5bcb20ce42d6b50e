//! Process lifecycle.
//!
//! ```text
//! startup.rs   config → logging/metrics → stores, mailer → listener → serve
//! signals.rs   SIGINT / SIGTERM → Shutdown::trigger
//! shutdown.rs  broadcast → server drains, sweeper and reload task exit
//!              → user store saved to disk
//! ```
//!
//! Config reload is driven by the file watcher, not by a signal.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
