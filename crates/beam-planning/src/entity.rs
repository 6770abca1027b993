//! Users, serving satellites, interferers and the beams that join them

use crate::geometry::Point3;
use crate::{PlanningError, Result, DEFAULT_COLORS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Entity identifier, unique within one [`EntityKind`]
pub type EntityId = i64;

/// Beam table of one serving satellite, keyed and ordered by user id
pub type BeamTable = BTreeMap<EntityId, Beam>;

/// Entity categories as tagged in input files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    ServingSatellite,
    Interferer,
}

impl EntityKind {
    /// Parse an input type tag (`user`, `sat`, `interferer`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "user" => Some(Self::User),
            "sat" => Some(Self::ServingSatellite),
            "interferer" => Some(Self::Interferer),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ServingSatellite => "sat",
            Self::Interferer => "interferer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Frequency/polarization channel label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// The four-color palette `A`, `B`, `C`, `D`
    pub fn default_palette() -> Vec<Color> {
        DEFAULT_COLORS.iter().map(|c| Color::new(*c)).collect()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ground user requesting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub position: Point3,
    /// Set once a satellite has claimed this user
    pub connected: bool,
}

impl User {
    pub fn new(id: EntityId, position: Point3) -> Self {
        Self {
            id,
            position,
            connected: false,
        }
    }
}

/// One committed (user, color) assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    /// Copy of the user taken when the beam was committed
    pub user: User,
    pub color: Color,
}

/// Satellite of the serving fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingSatellite {
    pub id: EntityId,
    pub position: Point3,
    pub beams: BeamTable,
}

impl ServingSatellite {
    pub fn new(id: EntityId, position: Point3) -> Self {
        Self {
            id,
            position,
            beams: BeamTable::new(),
        }
    }

    /// Record a beam to `user` on `color`.
    ///
    /// Stores a snapshot of the user; no admissibility checks are made here.
    pub fn commit(&mut self, user: &User, color: Color) {
        self.beams.insert(
            user.id,
            Beam {
                user: user.clone(),
                color,
            },
        );
    }

    pub fn beam_count(&self) -> usize {
        self.beams.len()
    }

    pub fn serves(&self, user_id: EntityId) -> bool {
        self.beams.contains_key(&user_id)
    }
}

/// Satellite outside the serving fleet, a read-only interference source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterferingSatellite {
    pub id: EntityId,
    pub position: Point3,
}

impl InterferingSatellite {
    pub fn new(id: EntityId, position: Point3) -> Self {
        Self { id, position }
    }
}

/// Validated set of entities handed to the planner
#[derive(Debug, Clone, Default)]
pub struct Constellation {
    users: Vec<User>,
    satellites: Vec<ServingSatellite>,
    interferers: Vec<InterferingSatellite>,
}

impl Constellation {
    /// Build a constellation, rejecting ids repeated within one category.
    ///
    /// Users are reset to unconnected and satellites to empty beam tables.
    pub fn new(
        mut users: Vec<User>,
        mut satellites: Vec<ServingSatellite>,
        interferers: Vec<InterferingSatellite>,
    ) -> Result<Self> {
        ensure_unique(EntityKind::User, users.iter().map(|u| u.id))?;
        ensure_unique(
            EntityKind::ServingSatellite,
            satellites.iter().map(|s| s.id),
        )?;
        ensure_unique(EntityKind::Interferer, interferers.iter().map(|i| i.id))?;

        users.iter_mut().for_each(|u| u.connected = false);
        satellites.iter_mut().for_each(|s| s.beams.clear());

        Ok(Self {
            users,
            satellites,
            interferers,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn satellites(&self) -> &[ServingSatellite] {
        &self.satellites
    }

    pub fn interferers(&self) -> &[InterferingSatellite] {
        &self.interferers
    }

    pub fn into_parts(
        self,
    ) -> (
        Vec<User>,
        Vec<ServingSatellite>,
        Vec<InterferingSatellite>,
    ) {
        (self.users, self.satellites, self.interferers)
    }
}

fn ensure_unique(kind: EntityKind, ids: impl Iterator<Item = EntityId>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PlanningError::DuplicateEntityId { kind, id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64) -> Point3 {
        Point3::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(EntityKind::from_tag("sat"), Some(EntityKind::ServingSatellite));
        assert_eq!(EntityKind::from_tag("interferer"), Some(EntityKind::Interferer));
        assert_eq!(EntityKind::from_tag("user"), Some(EntityKind::User));
        assert_eq!(EntityKind::from_tag("gateway"), None);
        assert_eq!(EntityKind::ServingSatellite.to_string(), "sat");
    }

    #[test]
    fn test_default_palette() {
        let palette = Color::default_palette();
        let labels: Vec<&str> = palette.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let users = vec![User::new(1, at(1.0)), User::new(1, at(2.0))];
        let err = Constellation::new(users, vec![], vec![]).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::DuplicateEntityId {
                kind: EntityKind::User,
                id: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_satellite_rejected() {
        let sats = vec![
            ServingSatellite::new(4, at(7000.0)),
            ServingSatellite::new(4, at(7100.0)),
        ];
        assert!(Constellation::new(vec![], sats, vec![]).is_err());
    }

    #[test]
    fn test_ids_may_repeat_across_kinds() {
        let constellation = Constellation::new(
            vec![User::new(1, at(6371.0))],
            vec![ServingSatellite::new(1, at(6921.0))],
            vec![InterferingSatellite::new(1, at(42164.0))],
        )
        .unwrap();
        assert_eq!(constellation.users().len(), 1);
        assert_eq!(constellation.satellites().len(), 1);
        assert_eq!(constellation.interferers().len(), 1);
    }

    #[test]
    fn test_constellation_resets_state() {
        let mut user = User::new(1, at(6371.0));
        user.connected = true;
        let mut sat = ServingSatellite::new(9, at(6921.0));
        sat.commit(&User::new(2, at(6371.0)), Color::new("A"));

        let constellation = Constellation::new(vec![user], vec![sat], vec![]).unwrap();
        assert!(!constellation.users()[0].connected);
        assert_eq!(constellation.satellites()[0].beam_count(), 0);
    }

    #[test]
    fn test_beam_snapshot_is_a_copy() {
        let mut user = User::new(3, at(6371.0));
        let mut sat = ServingSatellite::new(1, at(6921.0));
        sat.commit(&user, Color::new("B"));

        user.connected = true;
        user.position = at(1.0);

        let beam = &sat.beams[&3];
        assert!(!beam.user.connected);
        assert_eq!(beam.user.position, at(6371.0));
        assert_eq!(beam.color, Color::new("B"));
        assert!(sat.serves(3));
    }
}
