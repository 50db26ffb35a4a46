//! Game sessions and spin records
//!
//! A session owns one seed pair and the nonce counter that sequences spins
//! against it. The nonce is the only field that mutates during active play;
//! it starts at 0 and advances by exactly 1 per recorded spin, so the nonces
//! of a session's records are always `0..n` with no gaps or repeats.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::crypto::SeedPair;
use crate::error::Result;
use crate::game::Outcome;

pub type PlayerId = Uuid;
pub type SessionId = Uuid;
pub type SpinId = Uuid;

/// Seconds since the Unix epoch.
pub(crate) fn unix_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Session lifecycle: `Open --spin--> Open`, `Open --end--> Ended` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Open,
    Ended,
}

/// One player's play session under a single seed pair.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: SessionId,
    pub owner: PlayerId,
    pub game_id: String,
    pub seed: SeedPair,
    /// Next nonce to be consumed; equals the number of recorded spins.
    pub nonce: u64,
    pub status: SessionStatus,
    pub created_at: u64,
    pub ended_at: Option<u64>,
}

impl GameSession {
    /// Open a new session, generating and committing its seed pair.
    pub fn open(owner: PlayerId, game_id: impl Into<String>, client_seed: &str) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            game_id: game_id.into(),
            seed: SeedPair::open(client_seed)?,
            nonce: 0,
            status: SessionStatus::Open,
            created_at: unix_time_secs(),
            ended_at: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

/// Immutable record of one spin: the nonce it consumed, the amounts moved,
/// and the derived outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinRecord {
    pub id: SpinId,
    pub session_id: SessionId,
    pub owner: PlayerId,
    pub game_id: String,
    pub nonce: u64,
    pub bet_amount: u64,
    pub win_amount: u64,
    /// Matched paytable multiplier in hundredths of the bet.
    pub multiplier: u64,
    pub outcome: Outcome,
    pub recorded_at: u64,
}
