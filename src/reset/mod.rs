//! Password recovery.
//!
//! Invoked out-of-band by the forgot/reset handlers, never by the request gate.

pub mod ledger;

pub use ledger::{ResetError, ResetTokenLedger};
