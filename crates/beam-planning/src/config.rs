//! Planner configuration

use crate::entity::Color;
use crate::geometry::{earth_center, Point3};
use crate::{
    PlanningError, Result, INTERF_SAT_LIMIT_DEG, MAX_BEAMS, SAME_COLOR_LIMIT_DEG,
    USER_SAT_LIMIT_DEG,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// How the per-color passes are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One concurrent pass per color; which color wins a contested user or
    /// beam slot depends on scheduling.
    #[default]
    Parallel,
    /// Passes run one after another in palette order. Fully deterministic.
    Sequential,
}

/// Order in which satellites and users are visited within one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationOrder {
    /// Order of the input collections
    #[default]
    AsLoaded,
    /// Ascending entity id
    ById,
}

/// Limits and scheduling for a planning run.
///
/// # Examples
///
/// ```
/// use beam_planning::{Color, PlannerConfig, ExecutionMode};
///
/// let config = PlannerConfig::default()
///     .with_max_beams(16)
///     .with_colors(vec![Color::new("R"), Color::new("L")])
///     .with_execution(ExecutionMode::Sequential);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Beam capacity per serving satellite
    pub max_beams: usize,
    /// Minimum same-color separation at the satellite (deg, >= 10)
    pub same_color_limit_deg: f64,
    /// Minimum satellite/interferer separation at the user (deg, >= 20)
    pub interferer_limit_deg: f64,
    /// Maximum tilt from the user's vertical (deg, <= 45)
    pub user_sat_limit_deg: f64,
    /// Colors in palette order
    pub colors: Vec<Color>,
    /// Reference point for the boresight check
    pub reference_point: Point3,
    pub execution: ExecutionMode,
    pub order: IterationOrder,
    /// Worker threads for parallel execution; defaults to one per color
    pub workers: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_beams: MAX_BEAMS,
            same_color_limit_deg: SAME_COLOR_LIMIT_DEG,
            interferer_limit_deg: INTERF_SAT_LIMIT_DEG,
            user_sat_limit_deg: USER_SAT_LIMIT_DEG,
            colors: Color::default_palette(),
            reference_point: earth_center(),
            execution: ExecutionMode::default(),
            order: IterationOrder::default(),
            workers: None,
        }
    }
}

impl PlannerConfig {
    /// Load a JSON configuration file; absent fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading planner configuration from {:?}", path);

        let file = File::open(path)?;
        let config: PlannerConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn with_max_beams(mut self, n: usize) -> Self {
        self.max_beams = n;
        self
    }

    pub fn with_same_color_limit(mut self, deg: f64) -> Self {
        self.same_color_limit_deg = deg;
        self
    }

    pub fn with_interferer_limit(mut self, deg: f64) -> Self {
        self.interferer_limit_deg = deg;
        self
    }

    pub fn with_user_sat_limit(mut self, deg: f64) -> Self {
        self.user_sat_limit_deg = deg;
        self
    }

    pub fn with_colors(mut self, colors: Vec<Color>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_reference_point(mut self, point: Point3) -> Self {
        self.reference_point = point;
        self
    }

    pub fn with_execution(mut self, mode: ExecutionMode) -> Self {
        self.execution = mode;
        self
    }

    pub fn with_order(mut self, order: IterationOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    /// Worker threads a parallel run will use
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or(self.colors.len()).max(1)
    }

    /// Validates the configuration against the domain bounds.
    pub fn validate(&self) -> Result<()> {
        if self.max_beams == 0 {
            return Err(invalid("max_beams must be at least 1"));
        }
        check_range("same_color_limit_deg", self.same_color_limit_deg, 10.0, 180.0)?;
        check_range("interferer_limit_deg", self.interferer_limit_deg, 20.0, 180.0)?;
        check_range("user_sat_limit_deg", self.user_sat_limit_deg, 0.0, 45.0)?;

        let p = &self.reference_point;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(invalid("reference_point must have finite coordinates"));
        }

        if self.colors.is_empty() {
            return Err(invalid("at least one color is required"));
        }
        let mut seen = HashSet::new();
        for color in &self.colors {
            if color.label().trim().is_empty() {
                return Err(invalid("color labels must not be empty"));
            }
            if !seen.insert(color.label()) {
                return Err(invalid(&format!("duplicate color {color}")));
            }
        }

        if self.workers == Some(0) {
            return Err(invalid("workers must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> PlanningError {
    PlanningError::ConfigurationInvalid(reason.to_string())
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(PlanningError::ConfigurationInvalid(format!(
            "{name} must be within [{min}, {max}], got {value}"
        )));
    }
    Ok(())
}
