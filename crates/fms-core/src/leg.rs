//! Legs: one route-string segment expanded into an ordered waypoint run.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::navdata::{NavDatabase, ProcedureKind};
use crate::route::PROCEDURE_DIVIDER;
use crate::waypoint::{Waypoint, VECTOR_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegKind {
    Sid,
    Star,
    Airway,
    Direct,
    Vector,
}

/// A contiguous waypoint run sourced from a single route-string segment:
/// a bare fix, a vector token, or an `entry.name.exit` procedure/airway span.
///
/// Waypoints move from the remaining queue to the flown list as the flight
/// progresses; the leg never forgets a waypoint it expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    route_string: String,
    kind: LegKind,
    waypoints: VecDeque<Waypoint>,
    flown: Vec<Waypoint>,
}

impl Leg {
    /// Expand one route-string segment. Fails hard on anything the database
    /// cannot resolve; an empty leg is never constructed.
    pub fn from_segment(segment: &str, navdb: &NavDatabase) -> Result<Self, RouteError> {
        let segment = segment.to_ascii_lowercase();
        let tokens: Vec<&str> = segment.split(PROCEDURE_DIVIDER).collect();
        if tokens.iter().any(|token| token.is_empty()) {
            return Err(RouteError::MalformedSegment(segment.clone()));
        }

        match tokens.as_slice() {
            [token] => Self::from_single_token(token, navdb),
            [entry, name, exit] => Self::from_procedure_segment(entry, name, exit, &segment, navdb),
            _ => Err(RouteError::MalformedSegment(segment.clone())),
        }
    }

    fn from_single_token(token: &str, navdb: &NavDatabase) -> Result<Self, RouteError> {
        let waypoint = Waypoint::from_token(token, navdb)?;
        let kind = if waypoint.is_vector() {
            LegKind::Vector
        } else {
            LegKind::Direct
        };
        Ok(Self {
            route_string: token.to_string(),
            kind,
            waypoints: VecDeque::from([waypoint]),
            flown: Vec::new(),
        })
    }

    fn from_procedure_segment(
        entry: &str,
        name: &str,
        exit: &str,
        segment: &str,
        navdb: &NavDatabase,
    ) -> Result<Self, RouteError> {
        let (kind, fixes) = if let Some(procedure) = navdb.procedure(name) {
            let kind = match procedure.kind {
                ProcedureKind::Sid => LegKind::Sid,
                ProcedureKind::Star => LegKind::Star,
            };
            (kind, procedure.collect_fixes(entry, exit)?)
        } else if let Some(airway) = navdb.airway(name) {
            (LegKind::Airway, airway.fixes_between(entry, exit)?)
        } else {
            return Err(RouteError::UnknownProcedure(name.to_string()));
        };

        let mut waypoints = VecDeque::with_capacity(fixes.len());
        for fix in &fixes {
            let position = *navdb
                .fix(&fix.name)
                .ok_or_else(|| RouteError::UnknownFix(fix.name.clone()))?;
            waypoints.push_back(Waypoint::from_fix(&fix.name, position, &fix.restrictions));
        }
        if waypoints.is_empty() {
            return Err(RouteError::EmptyLeg(segment.to_string()));
        }

        Ok(Self {
            route_string: segment.to_string(),
            kind,
            waypoints,
            flown: Vec::new(),
        })
    }

    /// Canonical segment form, round-tripping through the route grammar.
    pub fn route_string(&self) -> &str {
        &self.route_string
    }

    pub fn kind(&self) -> LegKind {
        self.kind
    }

    pub fn is_sid_leg(&self) -> bool {
        self.kind == LegKind::Sid
    }

    pub fn is_star_leg(&self) -> bool {
        self.kind == LegKind::Star
    }

    pub fn is_airway_leg(&self) -> bool {
        self.kind == LegKind::Airway
    }

    pub fn is_vector_leg(&self) -> bool {
        self.kind == LegKind::Vector
    }

    pub fn is_procedure_leg(&self) -> bool {
        matches!(self.kind, LegKind::Sid | LegKind::Star)
    }

    /// First token of the segment; for direct legs, the fix itself.
    pub fn entry_fix_name(&self) -> &str {
        self.route_string
            .split(PROCEDURE_DIVIDER)
            .next()
            .unwrap_or(&self.route_string)
    }

    /// Last token of the segment; for direct legs, the fix itself.
    pub fn exit_fix_name(&self) -> &str {
        self.route_string
            .split(PROCEDURE_DIVIDER)
            .next_back()
            .unwrap_or(&self.route_string)
    }

    /// Middle token of a procedure/airway segment.
    pub fn procedure_name(&self) -> Option<&str> {
        if !self.is_procedure_leg() && !self.is_airway_leg() {
            return None;
        }
        self.route_string.split(PROCEDURE_DIVIDER).nth(1)
    }

    /// Remaining (not yet flown) waypoints in order.
    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn flown_waypoints(&self) -> &[Waypoint] {
        &self.flown
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn total_waypoint_count(&self) -> usize {
        self.waypoints.len() + self.flown.len()
    }

    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.front()
    }

    pub fn current_waypoint_mut(&mut self) -> Option<&mut Waypoint> {
        self.waypoints.front_mut()
    }

    pub fn has_next_waypoint(&self) -> bool {
        self.waypoints.len() > 1
    }

    /// Whether `name` identifies one of the remaining waypoints. The query
    /// may carry clearance markers (`@`, `^`) and any casing.
    pub fn has_waypoint(&self, name: &str) -> bool {
        let bare = bare_query(name);
        self.waypoints.iter().any(|waypoint| waypoint.ident() == bare)
    }

    pub fn find_waypoint_mut(&mut self, name: &str) -> Option<&mut Waypoint> {
        let bare = bare_query(name);
        self.waypoints
            .iter_mut()
            .find(|waypoint| waypoint.ident() == bare)
    }

    /// Advance past the current waypoint. Returns false (and stays put) when
    /// this leg has nothing further; the route then moves to the next leg.
    pub fn skip_to_next_waypoint(&mut self) -> bool {
        if !self.has_next_waypoint() {
            return false;
        }
        if let Some(waypoint) = self.waypoints.pop_front() {
            self.flown.push(waypoint);
        }
        true
    }

    /// Advance until `name` is the current waypoint, moving everything
    /// before it to the flown list. False when the name is not ahead.
    pub fn skip_to_waypoint(&mut self, name: &str) -> bool {
        if !self.has_waypoint(name) {
            return false;
        }
        let bare = bare_query(name);
        while let Some(current) = self.waypoints.front() {
            if current.ident() == bare {
                return true;
            }
            if let Some(waypoint) = self.waypoints.pop_front() {
                self.flown.push(waypoint);
            }
        }
        false
    }

    /// Highest altitude ceiling among this leg's waypoints, flown included;
    /// `None` when no waypoint carries one.
    pub fn procedure_top_altitude(&self) -> Option<i32> {
        self.all_waypoints()
            .filter_map(Waypoint::altitude_maximum)
            .max()
    }

    /// Lowest altitude floor among this leg's waypoints, flown included;
    /// `None` when no waypoint carries one.
    pub fn procedure_bottom_altitude(&self) -> Option<i32> {
        self.all_waypoints()
            .filter_map(Waypoint::altitude_minimum)
            .min()
    }

    fn all_waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.flown.iter().chain(self.waypoints.iter())
    }
}

/// Normalize a waypoint query: lowercase, clearance markers stripped.
/// Vector idents keep their `#` prefix.
fn bare_query(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    if lowered.starts_with(VECTOR_PREFIX) {
        lowered
    } else {
        lowered.trim_start_matches(['@', '^']).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::{Airway, Procedure, ProcedureFix, ProcedureKind};
    use crate::spatial::Position;
    use std::collections::HashMap;

    fn fixture_navdb() -> NavDatabase {
        let mut navdb = NavDatabase::new();
        navdb.add_fix("senzy", Position::new(37.58, -122.52));
        navdb.add_fix("peeno", Position::new(36.50, -121.90));
        navdb.add_fix("sxc", Position::new(33.38, -118.42));
        navdb.add_fix("hec", Position::new(34.80, -116.46));
        navdb.add_fix("ipl", Position::new(32.95, -115.57));

        navdb.add_procedure(Procedure {
            name: "offsh9".to_string(),
            kind: ProcedureKind::Sid,
            entry_points: HashMap::from([(
                "ksfo28r".to_string(),
                vec![ProcedureFix::new("senzy")],
            )]),
            body: vec![ProcedureFix::with_restrictions("peeno", "A130+|S250").unwrap()],
            exit_points: HashMap::from([("sxc".to_string(), vec![ProcedureFix::new("sxc")])]),
        });

        navdb.add_airway(Airway {
            name: "v458".to_string(),
            fixes: vec![
                ProcedureFix::new("sxc"),
                ProcedureFix::new("hec"),
                ProcedureFix::new("ipl"),
            ],
        });

        navdb
    }

    #[test]
    fn direct_leg_from_fix_token() {
        let leg = Leg::from_segment("SXC", &fixture_navdb()).unwrap();
        assert_eq!(leg.kind(), LegKind::Direct);
        assert_eq!(leg.route_string(), "sxc");
        assert_eq!(leg.waypoint_count(), 1);
        assert_eq!(leg.entry_fix_name(), "sxc");
        assert_eq!(leg.exit_fix_name(), "sxc");
    }

    #[test]
    fn vector_leg_from_heading_token() {
        let leg = Leg::from_segment("#250", &fixture_navdb()).unwrap();
        assert!(leg.is_vector_leg());
        assert!(leg.current_waypoint().unwrap().is_vector());
    }

    #[test]
    fn sid_leg_expands_entry_body_exit() {
        let leg = Leg::from_segment("ksfo28r.offsh9.sxc", &fixture_navdb()).unwrap();
        assert!(leg.is_sid_leg());
        let names: Vec<&str> = leg.waypoints().map(Waypoint::ident).collect();
        assert_eq!(names, vec!["senzy", "peeno", "sxc"]);
        assert_eq!(leg.procedure_name(), Some("offsh9"));

        // Restrictions carry over from the published fix.
        let peeno = leg.waypoints().nth(1).unwrap();
        assert_eq!(peeno.altitude_minimum(), Some(13_000));
        assert_eq!(peeno.speed_minimum(), Some(250));
    }

    #[test]
    fn airway_leg_resolves_span() {
        let leg = Leg::from_segment("sxc.v458.ipl", &fixture_navdb()).unwrap();
        assert!(leg.is_airway_leg());
        let names: Vec<&str> = leg.waypoints().map(Waypoint::ident).collect();
        assert_eq!(names, vec!["sxc", "hec", "ipl"]);
    }

    #[test]
    fn unresolved_names_fail_construction() {
        let navdb = fixture_navdb();
        assert!(matches!(
            Leg::from_segment("nowhere", &navdb),
            Err(RouteError::UnknownFix(_))
        ));
        assert!(matches!(
            Leg::from_segment("sxc.v999.ipl", &navdb),
            Err(RouteError::UnknownProcedure(_))
        ));
        assert!(matches!(
            Leg::from_segment("ksfo10l.offsh9.sxc", &navdb),
            Err(RouteError::InvalidEntry { .. })
        ));
        assert!(Leg::from_segment("sxc..ipl", &navdb).is_err());
    }

    #[test]
    fn skip_moves_waypoints_to_flown() {
        let mut leg = Leg::from_segment("sxc.v458.ipl", &fixture_navdb()).unwrap();

        assert!(leg.skip_to_next_waypoint());
        assert_eq!(leg.current_waypoint().unwrap().ident(), "hec");
        assert_eq!(leg.flown_waypoints().len(), 1);
        assert_eq!(leg.total_waypoint_count(), 3);

        assert!(leg.skip_to_next_waypoint());
        // Last waypoint: nothing further to advance to.
        assert!(!leg.skip_to_next_waypoint());
        assert_eq!(leg.current_waypoint().unwrap().ident(), "ipl");
    }

    #[test]
    fn skip_to_named_waypoint() {
        let mut leg = Leg::from_segment("sxc.v458.ipl", &fixture_navdb()).unwrap();
        assert!(leg.skip_to_waypoint("IPL"));
        assert_eq!(leg.current_waypoint().unwrap().ident(), "ipl");
        assert_eq!(leg.flown_waypoints().len(), 2);

        assert!(!leg.skip_to_waypoint("sxc"), "flown fixes are behind us");
    }

    #[test]
    fn altitude_envelope_queries() {
        let navdb = fixture_navdb();

        let sid = Leg::from_segment("ksfo28r.offsh9.sxc", &navdb).unwrap();
        assert_eq!(sid.procedure_bottom_altitude(), Some(13_000));
        assert_eq!(sid.procedure_top_altitude(), None);

        let airway = Leg::from_segment("sxc.v458.ipl", &navdb).unwrap();
        assert_eq!(airway.procedure_bottom_altitude(), None);
        assert_eq!(airway.procedure_top_altitude(), None);
    }
}
