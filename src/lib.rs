//! Omega Replay - deterministic replay of pre-computed fleet battles
//!
//! A fight record produced by the authoritative simulator is decoded by
//! [`wire`], stepped through round by round by [`game::RoundResolver`] and
//! paced for presentation by [`game::PlaybackController`].

pub mod app;
pub mod config;
pub mod game;
pub mod sim;
pub mod store;
pub mod util;
pub mod wire;

pub use game::{
    FightRecord, Outcome, PlaybackConfig, PlaybackController, PlaybackReport, ReplayObserver,
    ShipCatalog, Side,
};
pub use wire::{decode_fight_record, DecodeError};
