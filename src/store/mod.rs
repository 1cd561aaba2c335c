//! In-memory stores backing ranked play

pub mod ranked;

pub use ranked::{LeaderboardEntry, PlayerDefence, RankedStore, StoreError};
