//! Recommendations: catalog, user profiles, collaborative signals and the
//! multi-category scorer.
//!
//! Candidates come from five categories (genre match, collaborative, author
//! match, similar items, trending), each filling a fixed share of the
//! requested limit. The exchange matcher is a separate entry point that
//! ranks other users' exchange histories against a held item.

pub mod catalog;
pub mod engine;
pub mod exchange;
mod scoring;
pub mod signals;
pub mod types;

pub use catalog::Catalog;
pub use engine::RecommendationEngine;
pub use exchange::ExchangeMatcher;
pub use signals::CollaborativeSignals;
pub use types::*;
