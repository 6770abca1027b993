//! Rendering of a finished plan: plain listing and JSON summary

use crate::config::PlannerConfig;
use crate::coordinator::{BeamPlan, PlanReport};
use crate::entity::{Color, EntityId};
use serde::Serialize;
use std::io::{self, Write};

/// Write one line per beam: `sat <sid> beam <n> user <uid> color <c>`
pub fn write_listing<W: Write>(plan: &BeamPlan, mut out: W) -> io::Result<()> {
    for (sat, n, user, color) in plan.beams() {
        writeln!(out, "sat {} beam {} user {} color {}", sat, n, user, color)?;
    }
    out.flush()
}

#[derive(Debug, Clone, Serialize)]
pub struct BeamRecord {
    pub user: EntityId,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct SatelliteRecord {
    pub id: EntityId,
    pub beams: Vec<BeamRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitsRecord {
    pub max_beams: usize,
    pub same_color_limit_deg: f64,
    pub interferer_limit_deg: f64,
    pub user_sat_limit_deg: f64,
    pub colors: Vec<Color>,
}

/// Machine-readable plan summary
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub generated_at: String,
    pub limits: LimitsRecord,
    pub report: PlanReport,
    pub satellites: Vec<SatelliteRecord>,
}

impl PlanSummary {
    pub fn new(plan: &BeamPlan, config: &PlannerConfig) -> Self {
        let satellites = plan
            .satellites()
            .iter()
            .map(|sat| SatelliteRecord {
                id: sat.id,
                beams: sat
                    .beams
                    .iter()
                    .map(|(user, beam)| BeamRecord {
                        user: *user,
                        color: beam.color.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            limits: LimitsRecord {
                max_beams: config.max_beams,
                same_color_limit_deg: config.same_color_limit_deg,
                interferer_limit_deg: config.interferer_limit_deg,
                user_sat_limit_deg: config.user_sat_limit_deg,
                colors: config.colors.clone(),
            },
            report: plan.report().clone(),
            satellites,
        }
    }
}

/// Write the plan summary as pretty-printed JSON
pub fn write_json<W: Write>(
    plan: &BeamPlan,
    config: &PlannerConfig,
    mut out: W,
) -> crate::Result<()> {
    serde_json::to_writer_pretty(&mut out, &PlanSummary::new(plan, config))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
