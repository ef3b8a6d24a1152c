//! MangaSwap runtime: composition root wiring storage, cache and the
//! recommendation engine, plus tracing setup for hosts.

pub mod context;
pub mod telemetry;

pub use context::MangaSwap;
pub use telemetry::init_tracing;
