//! Entity loading from line-oriented scenario files
//!
//! ```text
//! # comment
//! sat 1 6921.0 0.0 0.0
//! user 1 6371.0 0.0 0.0     # trailing comments are allowed
//! interferer 1 42164.0 0.0 0.0
//! ```

use crate::entity::{Constellation, EntityId, EntityKind, InterferingSatellite, ServingSatellite, User};
use crate::geometry::Point3;
use crate::{PlanningError, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const FIELD_COUNT: usize = 5;

/// Load a scenario file into a validated constellation
pub fn load_file(path: impl AsRef<Path>) -> Result<Constellation> {
    let path = path.as_ref();
    info!("Loading scenario from {:?}", path);

    let text = fs::read_to_string(path)?;
    parse_str(&text)
}

/// Parse scenario text into a validated constellation
pub fn parse_str(text: &str) -> Result<Constellation> {
    let mut users = Vec::new();
    let mut satellites = Vec::new();
    let mut interferers = Vec::new();
    let mut skipped = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(kind) = EntityKind::from_tag(fields[0]) else {
            warn!("line {}: unknown entity type {:?}, skipping", line_no, fields[0]);
            skipped += 1;
            continue;
        };

        if fields.len() != FIELD_COUNT {
            return Err(parse_error(
                line_no,
                format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
            ));
        }

        let id: EntityId = fields[1]
            .parse()
            .map_err(|_| parse_error(line_no, format!("invalid id {:?}", fields[1])))?;
        let position = Point3::new(
            coordinate(fields[2], line_no)?,
            coordinate(fields[3], line_no)?,
            coordinate(fields[4], line_no)?,
        );

        match kind {
            EntityKind::User => users.push(User::new(id, position)),
            EntityKind::ServingSatellite => satellites.push(ServingSatellite::new(id, position)),
            EntityKind::Interferer => interferers.push(InterferingSatellite::new(id, position)),
        }
    }

    info!(
        "Loaded {} users, {} satellites, {} interferers ({} lines skipped)",
        users.len(),
        satellites.len(),
        interferers.len(),
        skipped
    );

    Constellation::new(users, satellites, interferers)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn coordinate(field: &str, line_no: usize) -> Result<f64> {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(parse_error(line_no, format!("invalid coordinate {field:?}"))),
    }
}

fn parse_error(line: usize, reason: String) -> PlanningError {
    PlanningError::Parse { line, reason }
}
