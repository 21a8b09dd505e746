//! Application Lifecycle & Vote-Resolution Engine
//!
//! - `application` - entities and the status state machine
//! - `resolver`    - pure threshold arithmetic
//! - `engine`      - orchestration over the store and external collaborators
//! - `sweeper`     - periodic deadline enforcement

pub mod application;
pub mod engine;
pub mod resolver;
pub mod sweeper;

pub use application::{
    Application, ApplicationStatus, ResolutionCause, ResolutionOutcome, Tally, Vote, VotePolarity,
};
pub use engine::{ResolveDisposition, ResolutionSummary, SweepReport, VoteReceipt, VotingEngine};
pub use resolver::{decide, required_votes, TallyDecision};
pub use sweeper::ExpirationSweeper;
