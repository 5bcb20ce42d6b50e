//! Background maintenance tasks.

pub mod sweeper;

pub use sweeper::Sweeper;
