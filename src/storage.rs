//! Storage boundary for sessions, balances, and spin records
//!
//! The engine owns no ambient connection state; callers construct a store and
//! inject it. `SpinStore::commit_spin` is the single transactional boundary of
//! the whole engine: the bet debit, the win credit, the nonce advance, and the
//! record append either all happen or none do. The nonce advance is
//! conditional (compare-and-set on the stored counter) so concurrent
//! reservations against one session cannot both succeed.
//!
//! `MemoryStore` is the bundled in-process implementation, used by the tests
//! and suitable as a default backend. A database-backed implementation maps
//! `commit_spin` onto one transaction with a conditional `UPDATE` on the
//! session nonce and a uniqueness constraint on `(session_id, nonce)`.

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::{GameSession, PlayerId, SessionId, SessionStatus, SpinRecord};

/// One atomic spin commit: the expected nonce for the conditional advance and
/// the fully-built record carrying the amounts to apply.
#[derive(Debug, Clone)]
pub struct SpinCommit {
    /// Nonce the caller derived the outcome against; the commit is rejected
    /// with `NonceConflict` if the stored counter has moved past it.
    pub expected_nonce: u64,
    pub record: SpinRecord,
}

/// Persistence operations the engine needs.
pub trait SpinStore: Send + Sync {
    fn insert_session(&self, session: GameSession) -> Result<()>;

    fn load_session(&self, id: SessionId) -> Result<GameSession>;

    /// Atomically transition `Open -> Ended`. Fails with `InvalidState` if the
    /// session already ended.
    fn end_session(&self, id: SessionId, ended_at: u64) -> Result<GameSession>;

    fn balance(&self, owner: PlayerId) -> Result<u64>;

    /// Atomic delta-apply; creates the account on first credit.
    fn credit(&self, owner: PlayerId, amount: u64) -> Result<u64>;

    /// Apply one spin as a single atomic unit: conditional nonce advance,
    /// balance debit+credit, record append. On any error nothing is applied.
    fn commit_spin(&self, commit: SpinCommit) -> Result<()>;

    /// Spin records for a session, in nonce order.
    fn spins_for_session(&self, id: SessionId) -> Result<Vec<SpinRecord>>;
}

/// In-memory store backed by concurrent maps.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<SessionId, GameSession>,
    balances: DashMap<PlayerId, u64>,
    spins: Mutex<Vec<SpinRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpinStore for MemoryStore {
    fn insert_session(&self, session: GameSession) -> Result<()> {
        let id = session.id;
        if self.sessions.insert(id, session).is_some() {
            return Err(Error::TransactionFailure(format!(
                "session {id} already exists"
            )));
        }
        Ok(())
    }

    fn load_session(&self, id: SessionId) -> Result<GameSession> {
        self.sessions
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(Error::SessionNotFound)
    }

    fn end_session(&self, id: SessionId, ended_at: u64) -> Result<GameSession> {
        let mut entry = self.sessions.get_mut(&id).ok_or(Error::SessionNotFound)?;
        if entry.status == SessionStatus::Ended {
            return Err(Error::InvalidState("session already ended".into()));
        }
        entry.status = SessionStatus::Ended;
        entry.ended_at = Some(ended_at);
        Ok(entry.clone())
    }

    fn balance(&self, owner: PlayerId) -> Result<u64> {
        self.balances
            .get(&owner)
            .map(|b| *b)
            .ok_or(Error::AccountNotFound)
    }

    fn credit(&self, owner: PlayerId, amount: u64) -> Result<u64> {
        let mut entry = self.balances.entry(owner).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| Error::TransactionFailure("balance overflow".into()))?;
        Ok(*entry)
    }

    fn commit_spin(&self, commit: SpinCommit) -> Result<()> {
        let record = commit.record;
        debug_assert_eq!(record.nonce, commit.expected_nonce);

        // Lock order everywhere: session entry, then balance entry, then the
        // record log. Holding all three makes the commit one critical section.
        let mut session = self
            .sessions
            .get_mut(&record.session_id)
            .ok_or(Error::SessionNotFound)?;
        if session.status != SessionStatus::Open {
            return Err(Error::SessionClosed);
        }
        if session.nonce != commit.expected_nonce {
            debug!(
                session_id = %record.session_id,
                stored = session.nonce,
                expected = commit.expected_nonce,
                "nonce reservation conflict"
            );
            return Err(Error::NonceConflict);
        }

        let mut balance = self
            .balances
            .get_mut(&record.owner)
            .ok_or(Error::AccountNotFound)?;
        if *balance < record.bet_amount {
            return Err(Error::InsufficientFunds {
                balance: *balance,
                bet: record.bet_amount,
            });
        }
        let settled = (*balance - record.bet_amount)
            .checked_add(record.win_amount)
            .ok_or_else(|| Error::TransactionFailure("balance overflow".into()))?;

        // All checks passed; apply the three effects together.
        let mut spins = self.spins.lock();
        *balance = settled;
        session.nonce += 1;
        spins.push(record);
        Ok(())
    }

    fn spins_for_session(&self, id: SessionId) -> Result<Vec<SpinRecord>> {
        let mut records: Vec<SpinRecord> = self
            .spins
            .lock()
            .iter()
            .filter(|r| r.session_id == id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.nonce);
        Ok(records)
    }
}
