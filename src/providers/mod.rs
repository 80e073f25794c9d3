//! Snapshot providers.

pub mod live;

pub use live::LiveProvider;
