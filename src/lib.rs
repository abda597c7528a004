//! # Duel Arena Server
//!
//! Authoritative server for two-player, turn-based duels.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DUEL ARENA SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── permille.rs  - Integer ratio math                       │
//! │  └── rng.rs       - Xorshift128+ PRNG, room seed derivation  │
//! │                                                              │
//! │  game/            - Duel rules (deterministic)               │
//! │  ├── catalog.rs   - Weapons, skills, shop items              │
//! │  ├── state.rs     - Players and rooms                        │
//! │  ├── effects.rs   - Status effects and ticking               │
//! │  ├── combat.rs    - Action resolution                        │
//! │  ├── turn.rs      - Win check and turn order                 │
//! │  ├── rewards.rs   - End-of-duel payouts                      │
//! │  └── rules.rs     - Tunable constants                        │
//! │                                                              │
//! │  network/         - Lobby and transport                      │
//! │  ├── registry.rs  - Connected players                        │
//! │  ├── matchmaking.rs - FIFO pairing                           │
//! │  ├── session.rs   - Room lifecycle                           │
//! │  ├── engine.rs    - Command in, outbox out                   │
//! │  ├── protocol.rs  - Message types                            │
//! │  └── server.rs    - WebSocket server                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules use no floating point, no HashMap and
//! no system time. All hit rolls come from the room's seeded RNG, so a
//! duel replays exactly from its seed and command sequence.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::permille::{Permille, PERMILLE_ONE};
pub use crate::core::rng::{DeterministicRng, HitRoll};
pub use crate::game::catalog::Catalog;
pub use crate::game::rules::DuelRules;
pub use crate::game::state::{Player, PlayerId, RoomId};
pub use crate::network::engine::{Command, DuelEngine, Outbox};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
