//! Single-color assignment pass over shared planning state
//!
//! Every color pass walks satellites, then users, in the configured order
//! and commits the first admissible pairs it finds (first-fit greedy, no
//! backtracking). Passes for different colors may run at the same time on
//! one [`PlanningState`]:
//!
//! - each satellite's beam table sits behind its own mutex
//! - each user carries an atomic claim flag
//!
//! Boresight and interference depend only on fixed positions and are
//! checked without any lock. Capacity, not-served, co-color and the user
//! claim are checked and committed while holding the satellite's mutex, so
//! no two passes can both admit the same user or overfill a satellite.

use crate::config::IterationOrder;
use crate::constraints::{ConstraintEvaluator, Rejection};
use crate::entity::{
    Beam, BeamTable, Color, Constellation, EntityId, InterferingSatellite, ServingSatellite, User,
};
use crate::geometry::Point3;
use crate::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, info_span, warn};

struct UserSlot {
    /// Snapshot stored into beam tables
    user: User,
    connected: AtomicBool,
}

struct SatelliteSlot {
    id: EntityId,
    position: Point3,
    beams: Mutex<BeamTable>,
}

/// Shared mutable state of one planning run
pub struct PlanningState {
    users: Vec<UserSlot>,
    satellites: Vec<SatelliteSlot>,
    interferers: Vec<InterferingSatellite>,
    user_order: Vec<usize>,
    satellite_order: Vec<usize>,
}

impl PlanningState {
    pub fn new(constellation: Constellation, order: IterationOrder) -> Self {
        let (users, satellites, interferers) = constellation.into_parts();

        let user_order = visit_order(users.iter().map(|u| u.id), order);
        let satellite_order = visit_order(satellites.iter().map(|s| s.id), order);

        let users = users
            .into_iter()
            .map(|user| UserSlot {
                connected: AtomicBool::new(user.connected),
                user,
            })
            .collect();
        let satellites = satellites
            .into_iter()
            .map(|sat| SatelliteSlot {
                id: sat.id,
                position: sat.position,
                beams: Mutex::new(sat.beams),
            })
            .collect();

        Self {
            users,
            satellites,
            interferers,
            user_order,
            satellite_order,
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn satellite_count(&self) -> usize {
        self.satellites.len()
    }

    pub fn interferers(&self) -> &[InterferingSatellite] {
        &self.interferers
    }

    /// Whether the user with `id` has been claimed
    pub fn is_connected(&self, id: EntityId) -> bool {
        self.users
            .iter()
            .find(|slot| slot.user.id == id)
            .is_some_and(|slot| slot.connected.load(Ordering::Acquire))
    }

    /// Copy of every satellite and its beam table, in visiting order
    pub fn satellites(&self) -> Vec<ServingSatellite> {
        self.satellite_order
            .iter()
            .map(|&i| {
                let slot = &self.satellites[i];
                ServingSatellite {
                    id: slot.id,
                    position: slot.position,
                    beams: slot.beams.lock().clone(),
                }
            })
            .collect()
    }

    /// Tear down into plain entities, users carrying their final flag.
    /// Users and satellites come back in visiting order.
    pub fn into_parts(
        self,
    ) -> (
        Vec<User>,
        Vec<ServingSatellite>,
        Vec<InterferingSatellite>,
    ) {
        let mut users: Vec<Option<UserSlot>> = self.users.into_iter().map(Some).collect();
        let users = self
            .user_order
            .iter()
            .filter_map(|&i| users[i].take())
            .map(|slot| User {
                connected: slot.connected.into_inner(),
                ..slot.user
            })
            .collect();

        let mut satellites: Vec<Option<SatelliteSlot>> =
            self.satellites.into_iter().map(Some).collect();
        let satellites = self
            .satellite_order
            .iter()
            .filter_map(|&i| satellites[i].take())
            .map(|slot| ServingSatellite {
                id: slot.id,
                position: slot.position,
                beams: slot.beams.into_inner(),
            })
            .collect();

        (users, satellites, self.interferers)
    }
}

fn visit_order(ids: impl Iterator<Item = EntityId>, order: IterationOrder) -> Vec<usize> {
    let mut indexed: Vec<(usize, EntityId)> = ids.enumerate().collect();
    if order == IterationOrder::ById {
        indexed.sort_by_key(|&(_, id)| id);
    }
    indexed.into_iter().map(|(i, _)| i).collect()
}

/// Rejection tallies per rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub at_capacity: usize,
    pub already_served: usize,
    pub already_connected: usize,
    pub boresight: usize,
    pub co_color: usize,
    pub interference: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::AtCapacity { .. } => self.at_capacity += 1,
            Rejection::AlreadyServed => self.already_served += 1,
            Rejection::AlreadyConnected => self.already_connected += 1,
            Rejection::Boresight { .. } => self.boresight += 1,
            Rejection::CoColor { .. } => self.co_color += 1,
            Rejection::Interference { .. } => self.interference += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.at_capacity
            + self.already_served
            + self.already_connected
            + self.boresight
            + self.co_color
            + self.interference
    }
}

/// Counters for one color pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub color: Color,
    /// Candidate pairs examined
    pub evaluated: usize,
    /// Beams committed
    pub assigned: usize,
    pub rejections: RejectionCounts,
    /// Pairs dropped because an angle could not be computed
    pub degenerate: usize,
}

impl PassReport {
    fn new(color: Color) -> Self {
        Self {
            color,
            evaluated: 0,
            assigned: 0,
            rejections: RejectionCounts::default(),
            degenerate: 0,
        }
    }
}

enum Outcome {
    Committed,
    Rejected(Rejection),
}

/// Run the greedy assignment for one color against shared state.
pub fn run_pass(
    state: &PlanningState,
    color: &Color,
    evaluator: &ConstraintEvaluator,
) -> PassReport {
    let span = info_span!("color_pass", color = %color);
    let _enter = span.enter();

    let mut report = PassReport::new(color.clone());

    for &si in &state.satellite_order {
        let sat = &state.satellites[si];

        for &ui in &state.user_order {
            let slot = &state.users[ui];
            report.evaluated += 1;

            match try_assign(state, sat, slot, color, evaluator) {
                Ok(Outcome::Committed) => {
                    report.assigned += 1;
                    debug!(sat = sat.id, user = slot.user.id, "beam committed");
                }
                Ok(Outcome::Rejected(rejection)) => {
                    report.rejections.record(&rejection);
                    if matches!(rejection, Rejection::AtCapacity { .. }) {
                        break;
                    }
                }
                Err(e) => {
                    report.degenerate += 1;
                    warn!(sat = sat.id, user = slot.user.id, "skipping candidate: {}", e);
                }
            }
        }
    }

    info!(
        "Pass {} complete: {} beams assigned, {} rejected, {} degenerate",
        color,
        report.assigned,
        report.rejections.total(),
        report.degenerate
    );

    report
}

fn try_assign(
    state: &PlanningState,
    sat: &SatelliteSlot,
    slot: &UserSlot,
    color: &Color,
    evaluator: &ConstraintEvaluator,
) -> Result<Outcome> {
    let user = &slot.user;

    // Lock-free early outs; both are re-checked under the lock.
    if let Some(r) = evaluator.check_capacity(&sat.beams.lock()) {
        return Ok(Outcome::Rejected(r));
    }
    if let Some(r) = evaluator.check_not_connected(slot.connected.load(Ordering::Acquire)) {
        return Ok(Outcome::Rejected(r));
    }

    if let Some(r) = evaluator.check_boresight(&user.position, &sat.position)? {
        return Ok(Outcome::Rejected(r));
    }
    if let Some(r) = evaluator.check_interference(&user.position, &sat.position, &state.interferers)? {
        return Ok(Outcome::Rejected(r));
    }

    let mut beams = sat.beams.lock();

    if let Some(r) = evaluator
        .check_capacity(&beams)
        .or_else(|| evaluator.check_not_served(user.id, &beams))
        .or_else(|| evaluator.check_not_connected(slot.connected.load(Ordering::Acquire)))
    {
        return Ok(Outcome::Rejected(r));
    }
    if let Some(r) = evaluator.check_co_color(&user.position, &sat.position, &beams, color)? {
        return Ok(Outcome::Rejected(r));
    }

    // Another satellite may claim this user without holding our lock
    if slot
        .connected
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Ok(Outcome::Rejected(Rejection::AlreadyConnected));
    }

    beams.insert(
        user.id,
        Beam {
            user: user.clone(),
            color: color.clone(),
        },
    );
    Ok(Outcome::Committed)
}
