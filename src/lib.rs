//! Gatewarden
//!
//! Membership engine for a gated community: candidates apply, existing
//! members vote within a bounded window, and applications resolve to
//! approved/rejected/expired from participation and approval thresholds.
//! A reputation engine accumulates peer ratings and ejects members whose
//! negative aggregate crosses the configured bar.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Environment-driven configuration
//! ├── error.rs       - Typed error taxonomy
//! ├── retry.rs       - Bounded backoff for transient store failures
//! ├── identity.rs    - Users, roles, capability resolution
//! ├── voting/        - Application lifecycle & vote resolution
//! │   ├── application.rs - Entities and status state machine
//! │   ├── resolver.rs    - Pure threshold arithmetic
//! │   ├── engine.rs      - Orchestration and side effects
//! │   └── sweeper.rs     - Periodic deadline enforcement
//! ├── reputation/    - Peer ratings, ejection, amnesty
//! │   ├── score.rs   - Records, aggregates, ejection math
//! │   └── engine.rs  - Orchestration
//! ├── store/         - Persistence contract
//! │   ├── memory.rs  - In-memory backend (tests, fallback)
//! │   └── postgres/  - sqlx/PostgreSQL backend
//! ├── sync/          - External collaborators (roster, notifications)
//! └── api/           - HTTP endpoints
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod reputation;
pub mod retry;
pub mod store;
pub mod sync;
pub mod voting;

pub use config::AppConfig;
pub use error::EngineError;
pub use identity::{Actor, Role, User};
pub use reputation::{RatingPolarity, RatingReceipt, ReputationEngine, ReputationScore};
pub use retry::RetryPolicy;
pub use store::{MemoryStore, PostgresStore, Store, SystemSettings};
pub use sync::{
    DisabledWhitelistSync, HttpWhitelistSync, LogNotifier, Notifier, NotifyEvent, WhitelistSync,
};
pub use voting::{
    Application, ApplicationStatus, ExpirationSweeper, ResolutionOutcome, SweepReport, Tally,
    TallyDecision, VotePolarity, VoteReceipt, VotingEngine,
};
