//! CareerPro Achievements - badge evaluation over the usage ledger
//!
//! Achievements carry declarative requirements (count, streak, quality)
//! evaluated against cumulative usage; completion is an idempotent upsert
//! and a check returns at most one newly satisfied achievement.

pub mod error;
pub mod evaluator;

pub use error::AchievementError;
pub use evaluator::AchievementEvaluator;
