//! Beam Planning Library
//!
//! Assigns beams from a serving satellite fleet to ground users, one pass
//! per color, with every pass sharing the same users and beam tables.
//!
//! # Admissibility
//!
//! A (satellite, user) pair may connect on color `C` only if all hold:
//!
//! | Rule          | Condition |
//! |---------------|-----------|
//! | Capacity      | satellite holds fewer than `max_beams` beams |
//! | Not served    | user is not already in this satellite's beam table |
//! | Not connected | user has not been claimed by any satellite |
//! | Boresight     | angle(sat, user, earth center) <= `user_sat_limit_deg` |
//! | Co-color      | separation at the satellite from every `C` beam >= `same_color_limit_deg` |
//! | Interference  | separation at the user from every interferer >= `interferer_limit_deg` |
//!
//! # Concurrency
//!
//! Colors run concurrently on a rayon pool. Each satellite's beam table
//! sits behind its own mutex and each user carries an atomic claim flag,
//! so the check and commit of one candidate pair is atomic while
//! geometry that only depends on fixed positions runs unlocked.
//!
//! ```text
//! loader ──► Constellation ──► BeamPlanner::plan ──► BeamPlan ──► report
//!                                 │
//!                      ┌──────────┼──────────┐
//!                  pass(A)    pass(B) ...  pass(N)     (rayon pool)
//!                      └── ConstraintEvaluator ──┘
//! ```

use thiserror::Error;

pub mod config;
pub mod constraints;
pub mod coordinator;
pub mod engine;
pub mod entity;
pub mod geometry;
pub mod loader;
pub mod report;

pub use config::{ExecutionMode, IterationOrder, PlannerConfig};
pub use constraints::{ConstraintEvaluator, Rejection, Verdict};
pub use coordinator::{BeamPlan, BeamPlanner, PlanReport};
pub use engine::{PassReport, PlanningState, RejectionCounts};
pub use entity::{
    Beam, BeamTable, Color, Constellation, EntityId, EntityKind, InterferingSatellite,
    ServingSatellite, User,
};
pub use geometry::{angle_degrees, earth_center, separation_degrees, Point3};

/// Beam capacity of one serving satellite
pub const MAX_BEAMS: usize = 32;

/// Minimum separation between same-color beams seen from the satellite (deg)
pub const SAME_COLOR_LIMIT_DEG: f64 = 10.0;

/// Minimum separation between serving satellite and interferer seen from the user (deg)
pub const INTERF_SAT_LIMIT_DEG: f64 = 20.0;

/// Maximum angle between the user's line to the satellite and its local vertical (deg)
pub const USER_SAT_LIMIT_DEG: f64 = 45.0;

/// Default color palette
pub const DEFAULT_COLORS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("Degenerate geometry: zero-length direction at ({x}, {y}, {z})")]
    DegenerateGeometry { x: f64, y: f64, z: f64 },
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
    #[error("Duplicate {kind} id {id}")]
    DuplicateEntityId { kind: EntityKind, id: EntityId },
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, PlanningError>;
