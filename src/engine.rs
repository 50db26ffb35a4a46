//! The engine facade: session lifecycle, spins, and seed reveal
//!
//! `SlotEngine` wires the commitment manager, the outcome generator, and the
//! storage boundary together. It is synchronous and holds no threads of its
//! own; concurrent request handlers call into it and are serialized per
//! session through a lock registry, so spins on different sessions never block
//! each other while two spins on the same session are strictly ordered.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::game::{derive_outcome, GameConfig};
use crate::session::{unix_time_secs, GameSession, PlayerId, SessionId, SpinRecord};
use crate::storage::{SpinCommit, SpinStore};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many times a `NonceConflict` from the store is retried before the
    /// spin is surfaced as a retryable `TransactionFailure`.
    pub nonce_retry_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nonce_retry_limit: 3,
        }
    }
}

/// What the player sees when a session opens: the commitment, never the seed.
#[derive(Debug, Clone)]
pub struct SessionReceipt {
    pub session_id: SessionId,
    pub server_seed_hash: String,
    pub scheme_version: u8,
}

/// Revealed seed material for an ended session. Everything a verifier needs.
#[derive(Debug, Clone)]
pub struct SeedReveal {
    pub session_id: SessionId,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub scheme_version: u8,
}

/// Provably-fair slot engine over an injected store.
pub struct SlotEngine<S: SpinStore> {
    store: Arc<S>,
    config: EngineConfig,
    session_locks: DashMap<SessionId, Arc<Mutex<()>>>,
}

impl<S: SpinStore> SlotEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            session_locks: DashMap::new(),
        }
    }

    /// Credit a player's balance (deposit / initial funding).
    pub fn deposit(&self, owner: PlayerId, amount: u64) -> Result<u64> {
        let balance = self.store.credit(owner, amount)?;
        debug!(%owner, amount, balance, "deposit applied");
        Ok(balance)
    }

    pub fn balance(&self, owner: PlayerId) -> Result<u64> {
        self.store.balance(owner)
    }

    /// Open a session: generate the seed pair and publish its commitment.
    pub fn open_session(
        &self,
        owner: PlayerId,
        game_id: impl Into<String>,
        client_seed: &str,
    ) -> Result<SessionReceipt> {
        let session = GameSession::open(owner, game_id, client_seed)?;
        let receipt = SessionReceipt {
            session_id: session.id,
            server_seed_hash: session.seed.server_seed_hash_hex(),
            scheme_version: session.seed.scheme_version(),
        };
        self.store.insert_session(session)?;
        info!(
            session_id = %receipt.session_id,
            %owner,
            commitment = %receipt.server_seed_hash,
            "session opened"
        );
        Ok(receipt)
    }

    /// Place one wager: reserve the next nonce, derive the outcome, and apply
    /// debit, credit, and record as one atomic unit.
    ///
    /// Preconditions are checked before the nonce is touched, so a rejected
    /// wager (`InvalidBet`, `InsufficientFunds`) never burns a nonce.
    pub fn spin(
        &self,
        session_id: SessionId,
        bet_amount: u64,
        game_config: &GameConfig,
    ) -> Result<SpinRecord> {
        if bet_amount == 0 {
            return Err(Error::InvalidBet("bet must be positive".into()));
        }
        game_config.validate()?;

        let lock = self.session_lock(session_id);
        let _guard = lock.lock();

        let mut attempts = 0u32;
        loop {
            let session = self.store.load_session(session_id)?;
            if !session.is_open() {
                return Err(Error::SessionClosed);
            }

            let balance = self.store.balance(session.owner)?;
            if balance < bet_amount {
                return Err(Error::InsufficientFunds {
                    balance,
                    bet: bet_amount,
                });
            }

            let nonce = session.nonce;
            let outcome = derive_outcome(
                session.seed.server_seed(),
                session.seed.client_seed(),
                nonce,
                game_config,
            )?;
            let win_amount = outcome.payout(bet_amount);
            let record = SpinRecord {
                id: Uuid::new_v4(),
                session_id,
                owner: session.owner,
                game_id: session.game_id.clone(),
                nonce,
                bet_amount,
                win_amount,
                multiplier: outcome.multiplier(),
                outcome,
                recorded_at: unix_time_secs(),
            };

            match self.store.commit_spin(SpinCommit {
                expected_nonce: nonce,
                record: record.clone(),
            }) {
                Ok(()) => {
                    debug!(
                        %session_id,
                        nonce,
                        bet_amount,
                        win_amount,
                        multiplier = record.multiplier,
                        "spin recorded"
                    );
                    return Ok(record);
                }
                Err(Error::NonceConflict) if attempts < self.config.nonce_retry_limit => {
                    // Another writer advanced the counter; re-derive against
                    // the fresh nonce. Never surfaced to the caller.
                    attempts += 1;
                    debug!(%session_id, attempts, "retrying nonce reservation");
                }
                Err(Error::NonceConflict) => {
                    warn!(%session_id, attempts, "nonce reservation kept conflicting");
                    return Err(Error::TransactionFailure(
                        "nonce reservation kept conflicting".into(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// End the session and reveal its server seed.
    pub fn end_session(&self, session_id: SessionId) -> Result<SeedReveal> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock();

        let ended = self.store.end_session(session_id, unix_time_secs());
        // The session is terminal (or missing) from here on; no further spin
        // can commit against it, so its lock entry can go.
        self.session_locks.remove(&session_id);
        let session = ended?;
        info!(%session_id, nonce = session.nonce, "session ended");
        Ok(Self::reveal_of(&session))
    }

    /// Reveal the seed of an already-ended session.
    ///
    /// Revealing an active session's seed would let the player predict every
    /// remaining outcome, so this fails with `InvalidState` while play is open.
    pub fn reveal_seed(&self, session_id: SessionId) -> Result<SeedReveal> {
        let session = self.store.load_session(session_id)?;
        if session.is_open() {
            return Err(Error::InvalidState(
                "seed reveal requires an ended session".into(),
            ));
        }
        Ok(Self::reveal_of(&session))
    }

    /// Spin history for a session, in nonce order.
    pub fn session_spins(&self, session_id: SessionId) -> Result<Vec<SpinRecord>> {
        self.store.spins_for_session(session_id)
    }

    fn reveal_of(session: &GameSession) -> SeedReveal {
        SeedReveal {
            session_id: session.id,
            server_seed: session.seed.server_seed().to_hex(),
            server_seed_hash: session.seed.server_seed_hash_hex(),
            client_seed: session.seed.client_seed().to_string(),
            scheme_version: session.seed.scheme_version(),
        }
    }

    fn session_lock(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SCHEME_VERSION;
    use crate::session::SessionStatus;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn engine() -> SlotEngine<MemoryStore> {
        SlotEngine::new(Arc::new(MemoryStore::new()))
    }

    /// Store wrapper that reports `NonceConflict` for the first
    /// `conflicts_left` commits, optionally letting a competing writer win
    /// the contested nonce first. Everything else delegates to `MemoryStore`.
    struct ContendedStore {
        inner: MemoryStore,
        conflicts_left: AtomicU32,
        advance_on_conflict: bool,
        commit_attempts: AtomicU32,
    }

    impl ContendedStore {
        fn new(conflicts: u32, advance_on_conflict: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                conflicts_left: AtomicU32::new(conflicts),
                advance_on_conflict,
                commit_attempts: AtomicU32::new(0),
            }
        }
    }

    impl SpinStore for ContendedStore {
        fn insert_session(&self, session: GameSession) -> Result<()> {
            self.inner.insert_session(session)
        }

        fn load_session(&self, id: SessionId) -> Result<GameSession> {
            self.inner.load_session(id)
        }

        fn end_session(&self, id: SessionId, ended_at: u64) -> Result<GameSession> {
            self.inner.end_session(id, ended_at)
        }

        fn balance(&self, owner: PlayerId) -> Result<u64> {
            self.inner.balance(owner)
        }

        fn credit(&self, owner: PlayerId, amount: u64) -> Result<u64> {
            self.inner.credit(owner, amount)
        }

        fn commit_spin(&self, commit: SpinCommit) -> Result<()> {
            self.commit_attempts.fetch_add(1, Ordering::SeqCst);
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                if self.advance_on_conflict {
                    // The competing writer takes the contested nonce.
                    let mut competing = commit.record.clone();
                    competing.id = Uuid::new_v4();
                    self.inner.commit_spin(SpinCommit {
                        expected_nonce: commit.expected_nonce,
                        record: competing,
                    })?;
                }
                return Err(Error::NonceConflict);
            }
            self.inner.commit_spin(commit)
        }

        fn spins_for_session(&self, id: SessionId) -> Result<Vec<SpinRecord>> {
            self.inner.spins_for_session(id)
        }
    }

    fn contended_engine(store: ContendedStore) -> (SlotEngine<ContendedStore>, SessionId) {
        let engine = SlotEngine::new(Arc::new(store));
        let owner = Uuid::new_v4();
        engine.deposit(owner, 10_000).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        (engine, receipt.session_id)
    }

    #[test]
    fn open_session_returns_commitment_not_seed() {
        let engine = engine();
        let owner = Uuid::new_v4();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        assert_eq!(receipt.server_seed_hash.len(), 64);
        assert_eq!(receipt.scheme_version, SCHEME_VERSION);
    }

    #[test]
    fn spin_requires_positive_bet() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 1000).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        let result = engine.spin(receipt.session_id, 0, &GameConfig::classic_three_reel());
        assert!(matches!(result, Err(Error::InvalidBet(_))));
    }

    #[test]
    fn rejected_wager_burns_no_nonce() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 50).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        let config = GameConfig::classic_three_reel();

        let result = engine.spin(receipt.session_id, 100, &config);
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));

        // Balance check failed before reservation; the next spin gets nonce 0.
        let record = engine.spin(receipt.session_id, 50, &config).unwrap();
        assert_eq!(record.nonce, 0);
    }

    #[test]
    fn nonces_ascend_one_per_spin() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 1_000_000).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        let config = GameConfig::classic_three_reel();
        for expected in 0..10 {
            let record = engine.spin(receipt.session_id, 100, &config).unwrap();
            assert_eq!(record.nonce, expected);
        }
    }

    #[test]
    fn spin_after_end_fails_closed() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 1000).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        engine.end_session(receipt.session_id).unwrap();
        let result = engine.spin(receipt.session_id, 100, &GameConfig::classic_three_reel());
        assert!(matches!(result, Err(Error::SessionClosed)));
    }

    #[test]
    fn reveal_before_end_is_invalid_state() {
        let engine = engine();
        let owner = Uuid::new_v4();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        assert!(matches!(
            engine.reveal_seed(receipt.session_id),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn reveal_matches_commitment_after_end() {
        let engine = engine();
        let owner = Uuid::new_v4();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        let reveal = engine.end_session(receipt.session_id).unwrap();
        assert_eq!(reveal.server_seed_hash, receipt.server_seed_hash);
        assert_eq!(reveal.client_seed, "abc");
        // And reveal_seed keeps working on the ended session.
        let again = engine.reveal_seed(receipt.session_id).unwrap();
        assert_eq!(again.server_seed, reveal.server_seed);
    }

    #[test]
    fn balance_tracks_spin_deltas() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 10_000).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        let config = GameConfig::classic_three_reel();

        let mut expected = 10_000i128;
        for _ in 0..20 {
            let record = engine.spin(receipt.session_id, 100, &config).unwrap();
            expected += record.win_amount as i128 - record.bet_amount as i128;
        }
        assert_eq!(engine.balance(owner).unwrap() as i128, expected);
    }

    #[test]
    fn bet_of_entire_balance_succeeds() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 100).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        let config = GameConfig::classic_three_reel();

        let record = engine.spin(receipt.session_id, 100, &config).unwrap();
        assert_eq!(engine.balance(owner).unwrap(), record.win_amount);
    }

    #[test]
    fn transient_nonce_conflicts_are_retried_transparently() {
        // Two conflicts, default retry limit 3: the caller never sees them.
        let (engine, session_id) = contended_engine(ContendedStore::new(2, false));
        let config = GameConfig::classic_three_reel();

        let record = engine.spin(session_id, 100, &config).unwrap();
        assert_eq!(record.nonce, 0);

        let store = &engine.store;
        assert_eq!(store.commit_attempts.load(Ordering::SeqCst), 3);
        assert_eq!(store.spins_for_session(session_id).unwrap().len(), 1);
    }

    #[test]
    fn retry_re_derives_against_the_advanced_nonce() {
        // A competing writer wins nonce 0; the retry must re-derive at 1,
        // not replay the stale reservation.
        let (engine, session_id) = contended_engine(ContendedStore::new(1, true));
        let config = GameConfig::classic_three_reel();

        let record = engine.spin(session_id, 100, &config).unwrap();
        assert_eq!(record.nonce, 1);

        let nonces: Vec<u64> = engine
            .session_spins(session_id)
            .unwrap()
            .iter()
            .map(|r| r.nonce)
            .collect();
        assert_eq!(nonces, vec![0, 1]);
    }

    #[test]
    fn persistent_nonce_conflicts_surface_as_transaction_failure() {
        let (engine, session_id) = contended_engine(ContendedStore::new(u32::MAX, false));
        let config = GameConfig::classic_three_reel();

        let result = engine.spin(session_id, 100, &config);
        assert!(matches!(result, Err(Error::TransactionFailure(_))));

        // Initial attempt plus nonce_retry_limit retries, then give up.
        let store = &engine.store;
        let expected = 1 + EngineConfig::default().nonce_retry_limit;
        assert_eq!(store.commit_attempts.load(Ordering::SeqCst), expected);
        assert!(store.spins_for_session(session_id).unwrap().is_empty());
    }

    #[test]
    fn end_session_prunes_the_lock_registry() {
        let engine = engine();
        let owner = Uuid::new_v4();
        engine.deposit(owner, 1_000).unwrap();
        let receipt = engine.open_session(owner, "classic-three-reel", "abc").unwrap();
        engine.spin(receipt.session_id, 100, &GameConfig::classic_three_reel()).unwrap();
        assert_eq!(engine.session_locks.len(), 1);

        engine.end_session(receipt.session_id).unwrap();
        assert!(engine.session_locks.is_empty());

        // A second end re-creates no lasting entry either.
        assert!(matches!(
            engine.end_session(receipt.session_id),
            Err(Error::InvalidState(_))
        ));
        assert!(engine.session_locks.is_empty());

        // The store still holds the terminal session.
        assert_eq!(
            engine.store.load_session(receipt.session_id).unwrap().status,
            SessionStatus::Ended
        );
    }
}
