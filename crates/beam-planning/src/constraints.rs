//! Admissibility checks for a (satellite, user, color) candidate
//!
//! Six independent predicates, composed by [`ConstraintEvaluator::evaluate`]:
//! capacity, not-served, not-connected, boresight, co-color and interference.
//! The first three read mutable planning state; the last three are pure
//! geometry on fixed positions.

use crate::config::PlannerConfig;
use crate::entity::{BeamTable, Color, EntityId, InterferingSatellite, ServingSatellite, User};
use crate::geometry::{angle_degrees, separation_degrees, Point3};
use crate::Result;
use serde::Serialize;

/// Why a candidate pair was turned down
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rejection {
    /// Satellite already holds `max_beams` beams
    AtCapacity { beams: usize },
    /// User is already a key in this satellite's beam table
    AlreadyServed,
    /// User was claimed by another satellite or pass
    AlreadyConnected,
    /// Beam tilt from the user's vertical exceeds the limit
    Boresight { angle_deg: f64 },
    /// Too close to an existing same-color beam on this satellite
    CoColor { user: EntityId, separation_deg: f64 },
    /// Too close to an interfering satellite as seen from the user
    Interference {
        interferer: EntityId,
        separation_deg: f64,
    },
}

/// Outcome of evaluating one candidate pair
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Admissible,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_admissible(&self) -> bool {
        matches!(self, Verdict::Admissible)
    }
}

impl From<Option<Rejection>> for Verdict {
    fn from(rejection: Option<Rejection>) -> Self {
        match rejection {
            Some(r) => Verdict::Rejected(r),
            None => Verdict::Admissible,
        }
    }
}

/// Applies the configured limits to candidate pairs
#[derive(Debug, Clone)]
pub struct ConstraintEvaluator {
    max_beams: usize,
    same_color_limit_deg: f64,
    interferer_limit_deg: f64,
    user_sat_limit_deg: f64,
    reference_point: Point3,
}

impl ConstraintEvaluator {
    /// Build from a configuration; callers validate it first.
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            max_beams: config.max_beams,
            same_color_limit_deg: config.same_color_limit_deg,
            interferer_limit_deg: config.interferer_limit_deg,
            user_sat_limit_deg: config.user_sat_limit_deg,
            reference_point: config.reference_point,
        }
    }

    pub fn max_beams(&self) -> usize {
        self.max_beams
    }

    /// Full admissibility check against a satellite's current beam table.
    ///
    /// Cheap state checks run first. An `Err` means the geometry was
    /// degenerate and the pair must be treated as inadmissible.
    pub fn evaluate(
        &self,
        user: &User,
        satellite: &ServingSatellite,
        color: &Color,
        interferers: &[InterferingSatellite],
    ) -> Result<Verdict> {
        if let Some(r) = self
            .check_capacity(&satellite.beams)
            .or_else(|| self.check_not_served(user.id, &satellite.beams))
            .or_else(|| self.check_not_connected(user.connected))
        {
            return Ok(Verdict::Rejected(r));
        }

        if let Some(r) = self.check_boresight(&user.position, &satellite.position)? {
            return Ok(Verdict::Rejected(r));
        }
        if let Some(r) =
            self.check_co_color(&user.position, &satellite.position, &satellite.beams, color)?
        {
            return Ok(Verdict::Rejected(r));
        }
        Ok(self
            .check_interference(&user.position, &satellite.position, interferers)?
            .into())
    }

    pub fn check_capacity(&self, beams: &BeamTable) -> Option<Rejection> {
        (beams.len() >= self.max_beams).then(|| Rejection::AtCapacity { beams: beams.len() })
    }

    pub fn check_not_served(&self, user_id: EntityId, beams: &BeamTable) -> Option<Rejection> {
        beams
            .contains_key(&user_id)
            .then_some(Rejection::AlreadyServed)
    }

    pub fn check_not_connected(&self, connected: bool) -> Option<Rejection> {
        connected.then_some(Rejection::AlreadyConnected)
    }

    /// Tilt of the satellite → user line from the user → reference line.
    pub fn check_boresight(&self, user: &Point3, satellite: &Point3) -> Result<Option<Rejection>> {
        let angle_deg = angle_degrees(satellite, user, &self.reference_point)?;
        Ok((angle_deg > self.user_sat_limit_deg).then_some(Rejection::Boresight { angle_deg }))
    }

    /// Separation at the satellite from every beam already on `color`.
    pub fn check_co_color(
        &self,
        user: &Point3,
        satellite: &Point3,
        beams: &BeamTable,
        color: &Color,
    ) -> Result<Option<Rejection>> {
        for beam in beams.values().filter(|b| &b.color == color) {
            let separation_deg = separation_degrees(user, satellite, &beam.user.position)?;
            if separation_deg < self.same_color_limit_deg {
                return Ok(Some(Rejection::CoColor {
                    user: beam.user.id,
                    separation_deg,
                }));
            }
        }
        Ok(None)
    }

    /// Separation at the user between the satellite and every interferer.
    pub fn check_interference(
        &self,
        user: &Point3,
        satellite: &Point3,
        interferers: &[InterferingSatellite],
    ) -> Result<Option<Rejection>> {
        for interferer in interferers {
            let separation_deg = separation_degrees(satellite, user, &interferer.position)?;
            if separation_deg < self.interferer_limit_deg {
                return Ok(Some(Rejection::Interference {
                    interferer: interferer.id,
                    separation_deg,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlanningError;

    const EARTH_RADIUS_KM: f64 = 6371.0;
    const ALTITUDE_KM: f64 = 550.0;

    fn evaluator() -> ConstraintEvaluator {
        ConstraintEvaluator::new(&PlannerConfig::default())
    }

    fn overhead_satellite(id: EntityId) -> ServingSatellite {
        ServingSatellite::new(id, Point3::new(0.0, 0.0, EARTH_RADIUS_KM + ALTITUDE_KM))
    }

    /// User on a ray leaving the overhead satellite `theta_deg` off straight down
    fn user_on_ray(id: EntityId, theta_deg: f64) -> User {
        let t = theta_deg.to_radians();
        let sat = overhead_satellite(0).position;
        let pos = Point3::new(
            sat.x + ALTITUDE_KM * t.sin(),
            sat.y,
            sat.z - ALTITUDE_KM * t.cos(),
        );
        User::new(id, pos)
    }

    /// Satellite seen from a user at the north pole with the given tilt
    fn satellite_at_tilt(id: EntityId, tilt_deg: f64) -> (User, ServingSatellite) {
        let user = User::new(1, Point3::new(0.0, 0.0, EARTH_RADIUS_KM));
        let t = tilt_deg.to_radians();
        let range = 1000.0;
        let sat = ServingSatellite::new(
            id,
            Point3::new(-range * t.sin(), 0.0, EARTH_RADIUS_KM + range * t.cos()),
        );
        (user, sat)
    }

    #[test]
    fn test_boresight_46_degrees_rejected() {
        let (user, sat) = satellite_at_tilt(1, 46.0);
        let verdict = evaluator().evaluate(&user, &sat, &Color::new("A"), &[]).unwrap();
        match verdict {
            Verdict::Rejected(Rejection::Boresight { angle_deg }) => {
                assert!((angle_deg - 46.0).abs() < 1e-6, "got {angle_deg}");
            }
            other => panic!("expected boresight rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_boresight_44_degrees_admitted() {
        let (user, sat) = satellite_at_tilt(1, 44.0);
        let verdict = evaluator().evaluate(&user, &sat, &Color::new("A"), &[]).unwrap();
        assert!(verdict.is_admissible());
    }

    #[test]
    fn test_co_color_9_degrees_rejected() {
        let mut sat = overhead_satellite(1);
        sat.commit(&user_on_ray(1, 0.0), Color::new("A"));

        let second = user_on_ray(2, 9.0);
        let verdict = evaluator().evaluate(&second, &sat, &Color::new("A"), &[]).unwrap();
        match verdict {
            Verdict::Rejected(Rejection::CoColor { user, separation_deg }) => {
                assert_eq!(user, 1);
                assert!((separation_deg - 9.0).abs() < 1e-6, "got {separation_deg}");
            }
            other => panic!("expected co-color rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_co_color_ignores_other_colors() {
        let mut sat = overhead_satellite(1);
        sat.commit(&user_on_ray(1, 0.0), Color::new("A"));

        let second = user_on_ray(2, 9.0);
        let verdict = evaluator().evaluate(&second, &sat, &Color::new("B"), &[]).unwrap();
        assert!(verdict.is_admissible());
    }

    #[test]
    fn test_co_color_11_degrees_admitted() {
        let mut sat = overhead_satellite(1);
        sat.commit(&user_on_ray(1, 0.0), Color::new("A"));

        let second = user_on_ray(2, 11.0);
        let verdict = evaluator().evaluate(&second, &sat, &Color::new("A"), &[]).unwrap();
        assert!(verdict.is_admissible());
    }

    #[test]
    fn test_full_satellite_rejects_everything() {
        let mut sat = overhead_satellite(1);
        for id in 0..32 {
            sat.commit(&user_on_ray(100 + id, 0.0), Color::new("A"));
        }
        assert_eq!(sat.beam_count(), 32);

        // Geometry that would otherwise pass on an unused color
        let candidate = user_on_ray(1, 20.0);
        for color in ["A", "B", "C", "D"] {
            let verdict = evaluator()
                .evaluate(&candidate, &sat, &Color::new(color), &[])
                .unwrap();
            assert_eq!(verdict, Verdict::Rejected(Rejection::AtCapacity { beams: 32 }));
        }
    }

    #[test]
    fn test_no_interferers_is_vacuous_pass() {
        let sat = overhead_satellite(1);
        let user = user_on_ray(1, 0.0);
        let e = evaluator();
        assert_eq!(e.check_interference(&user.position, &sat.position, &[]).unwrap(), None);
        assert!(e.evaluate(&user, &sat, &Color::new("A"), &[]).unwrap().is_admissible());
    }

    #[test]
    fn test_interferer_behind_satellite_rejected() {
        let sat = overhead_satellite(1);
        let user = user_on_ray(1, 0.0);
        let geo = InterferingSatellite::new(77, Point3::new(0.0, 0.0, 42_164.0));

        let verdict = evaluator()
            .evaluate(&user, &sat, &Color::new("A"), &[geo])
            .unwrap();
        match verdict {
            Verdict::Rejected(Rejection::Interference {
                interferer,
                separation_deg,
            }) => {
                assert_eq!(interferer, 77);
                assert!(separation_deg.abs() < 1e-6);
            }
            other => panic!("expected interference rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_interferer_far_off_axis_admitted() {
        let sat = overhead_satellite(1);
        let user = user_on_ray(1, 0.0);
        let geo = InterferingSatellite::new(77, Point3::new(-42_164.0, 0.0, 0.0));

        let verdict = evaluator()
            .evaluate(&user, &sat, &Color::new("A"), &[geo])
            .unwrap();
        assert!(verdict.is_admissible());
    }

    #[test]
    fn test_already_served_and_connected() {
        let mut sat = overhead_satellite(1);
        let mut user = user_on_ray(5, 0.0);
        sat.commit(&user, Color::new("A"));

        let e = evaluator();
        assert_eq!(
            e.evaluate(&user, &sat, &Color::new("B"), &[]).unwrap(),
            Verdict::Rejected(Rejection::AlreadyServed)
        );

        user.connected = true;
        let other = overhead_satellite(2);
        assert_eq!(
            e.evaluate(&user, &other, &Color::new("B"), &[]).unwrap(),
            Verdict::Rejected(Rejection::AlreadyConnected)
        );
    }

    #[test]
    fn test_degenerate_user_on_satellite() {
        let sat = overhead_satellite(1);
        let user = User::new(1, sat.position);
        let result = evaluator().evaluate(&user, &sat, &Color::new("A"), &[]);
        assert!(matches!(result, Err(PlanningError::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let mut sat = overhead_satellite(1);
        sat.commit(&user_on_ray(1, 0.0), Color::new("A"));
        let interferers = [InterferingSatellite::new(9, Point3::new(30_000.0, 0.0, 30_000.0))];
        let e = evaluator();

        for theta in [3.0, 9.0, 12.0, 25.0, 40.0] {
            let user = user_on_ray(2, theta);
            let first = e.evaluate(&user, &sat, &Color::new("A"), &interferers).unwrap();
            let second = e.evaluate(&user, &sat, &Color::new("A"), &interferers).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_tighter_limits_from_config() {
        let config = PlannerConfig::default()
            .with_same_color_limit(15.0)
            .with_user_sat_limit(20.0);
        let e = ConstraintEvaluator::new(&config);

        let mut sat = overhead_satellite(1);
        sat.commit(&user_on_ray(1, 0.0), Color::new("A"));
        let user = user_on_ray(2, 12.0);
        assert!(matches!(
            e.evaluate(&user, &sat, &Color::new("A"), &[]).unwrap(),
            Verdict::Rejected(Rejection::CoColor { .. })
        ));

        let (user, sat) = satellite_at_tilt(3, 25.0);
        assert!(matches!(
            e.evaluate(&user, &sat, &Color::new("A"), &[]).unwrap(),
            Verdict::Rejected(Rejection::Boresight { .. })
        ));
    }
}
