//! Fans out one assignment pass per color and collects the final plan

use crate::config::{ExecutionMode, PlannerConfig};
use crate::constraints::ConstraintEvaluator;
use crate::engine::{run_pass, PassReport, PlanningState};
use crate::entity::{Color, Constellation, EntityId, InterferingSatellite, ServingSatellite, User};
use crate::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::info;

/// Aggregate counters of a planning run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    /// One entry per color, in palette order
    pub passes: Vec<PassReport>,
    pub total_beams: usize,
    pub connected_users: usize,
    pub unserved_users: usize,
    pub degenerate_evaluations: usize,
}

/// Final assignment state after every color pass has finished
#[derive(Debug, Clone)]
pub struct BeamPlan {
    users: Vec<User>,
    satellites: Vec<ServingSatellite>,
    interferers: Vec<InterferingSatellite>,
    report: PlanReport,
}

impl BeamPlan {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn satellites(&self) -> &[ServingSatellite] {
        &self.satellites
    }

    pub fn interferers(&self) -> &[InterferingSatellite] {
        &self.interferers
    }

    pub fn report(&self) -> &PlanReport {
        &self.report
    }

    /// Every beam as `(satellite id, ordinal from 1, user id, color)`.
    ///
    /// Satellites appear in planning order, beams in user-id order.
    pub fn beams(&self) -> impl Iterator<Item = (EntityId, usize, EntityId, &Color)> + '_ {
        self.satellites.iter().flat_map(|sat| {
            sat.beams
                .iter()
                .enumerate()
                .map(move |(i, (user_id, beam))| (sat.id, i + 1, *user_id, &beam.color))
        })
    }

    /// Satellite serving `user_id`, if any
    pub fn serving_satellite(&self, user_id: EntityId) -> Option<&ServingSatellite> {
        self.satellites.iter().find(|s| s.serves(user_id))
    }
}

/// Runs the per-color passes over one constellation
pub struct BeamPlanner {
    config: PlannerConfig,
    evaluator: ConstraintEvaluator,
}

impl BeamPlanner {
    /// Validates the configuration; no pass runs with invalid limits.
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        let evaluator = ConstraintEvaluator::new(&config);
        Ok(Self { config, evaluator })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan(&self, constellation: Constellation) -> Result<BeamPlan> {
        info!(
            "Planning {} users on {} satellites ({} interferers), colors [{}], {:?}",
            constellation.users().len(),
            constellation.satellites().len(),
            constellation.interferers().len(),
            self.config
                .colors
                .iter()
                .map(Color::label)
                .collect::<Vec<_>>()
                .join(", "),
            self.config.execution
        );

        let state = PlanningState::new(constellation, self.config.order);
        let colors = &self.config.colors;

        let passes: Vec<PassReport> = match self.config.execution {
            ExecutionMode::Parallel => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(self.config.worker_count())
                    .thread_name(|i| format!("beam-pass-{i}"))
                    .build()?;
                pool.install(|| {
                    colors
                        .par_iter()
                        .map(|color| run_pass(&state, color, &self.evaluator))
                        .collect::<Vec<_>>()
                })
            }
            ExecutionMode::Sequential => colors
                .iter()
                .map(|color| run_pass(&state, color, &self.evaluator))
                .collect(),
        };

        let (users, satellites, interferers) = state.into_parts();

        let connected_users = users.iter().filter(|u| u.connected).count();
        let report = PlanReport {
            total_beams: satellites.iter().map(ServingSatellite::beam_count).sum(),
            connected_users,
            unserved_users: users.len() - connected_users,
            degenerate_evaluations: passes.iter().map(|p| p.degenerate).sum(),
            passes,
        };

        info!(
            "Plan complete: {} beams, {} users connected, {} unserved",
            report.total_beams, report.connected_users, report.unserved_users
        );

        Ok(BeamPlan {
            users,
            satellites,
            interferers,
            report,
        })
    }
}
