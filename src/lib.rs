//! Fairspin - a provably-fair slot outcome engine
//!
//! Players wager against a house balance and can cryptographically verify,
//! after the fact, that no spin was manipulated. The engine covers:
//! - crypto: seed commitment protocol (commit before play, reveal after)
//! - game: deterministic outcome derivation from seed material and a nonce
//! - session / storage: the nonce ledger and the atomic balance/record commit
//! - engine: the operation surface exposed to the API layer
//! - verify: stateless recomputation anyone can run from revealed data
//!
//! Presentation, authentication, and transport are external collaborators;
//! the engine only needs a player id to attribute a spin.

pub mod crypto;
pub mod engine;
pub mod error;
pub mod game;
pub mod session;
pub mod storage;
pub mod verify;

// Re-export commonly used types for easy access
pub use crypto::{SeedPair, ServerSeed, SCHEME_VERSION, SERVER_SEED_LEN};
pub use engine::{EngineConfig, SeedReveal, SessionReceipt, SlotEngine};
pub use error::{Error, Result};
pub use game::{derive_outcome, GameConfig, Outcome, PaytableEntry, SlotOutcome, SymbolWeight};
pub use session::{GameSession, PlayerId, SessionId, SessionStatus, SpinRecord};
pub use storage::{MemoryStore, SpinCommit, SpinStore};
pub use verify::{verify_record, verify_spin, VerifyFailure, VerifyReport};
