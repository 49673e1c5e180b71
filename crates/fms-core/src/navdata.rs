//! Navigation database: published fixes, procedures, and airways.
//!
//! The database is a read-only dependency injected into leg and route
//! construction. It never lives in a global; tests build small fixture
//! databases and production code loads one per airport.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::spatial::Position;

/// Altitude/speed bounds attached to a procedure fix. Feet and knots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default)]
    pub altitude_minimum: Option<i32>,
    #[serde(default)]
    pub altitude_maximum: Option<i32>,
    #[serde(default)]
    pub speed_minimum: Option<i32>,
    #[serde(default)]
    pub speed_maximum: Option<i32>,
}

impl Restrictions {
    pub fn is_empty(&self) -> bool {
        self.altitude_minimum.is_none()
            && self.altitude_maximum.is_none()
            && self.speed_minimum.is_none()
            && self.speed_maximum.is_none()
    }

    /// Parse the compact notation published procedures attach to fixes.
    ///
    /// Items join with `|`: `A110+` (at or above 11,000ft), `A80-` (at or
    /// below 8,000ft), `S250` (at 250kt — both bounds). Altitudes are given
    /// in hundreds of feet.
    pub fn parse(notation: &str) -> Result<Self, RouteError> {
        let mut restrictions = Restrictions::default();

        for item in notation.split('|') {
            let item = item.trim().to_ascii_lowercase();
            if item.is_empty() {
                continue;
            }

            let invalid = || RouteError::InvalidRestriction(notation.to_string());
            let (rest, qualifier) = match (item.strip_suffix('+'), item.strip_suffix('-')) {
                (Some(rest), _) => (rest, Some('+')),
                (_, Some(rest)) => (rest, Some('-')),
                _ => (item.as_str(), None),
            };

            if let Some(digits) = rest.strip_prefix('a') {
                let feet = digits.parse::<i32>().map_err(|_| invalid())? * 100;
                match qualifier {
                    Some('+') => restrictions.altitude_minimum = Some(feet),
                    Some('-') => restrictions.altitude_maximum = Some(feet),
                    _ => {
                        restrictions.altitude_minimum = Some(feet);
                        restrictions.altitude_maximum = Some(feet);
                    }
                }
            } else if let Some(digits) = rest.strip_prefix('s') {
                let knots = digits.parse::<i32>().map_err(|_| invalid())?;
                match qualifier {
                    Some('+') => restrictions.speed_minimum = Some(knots),
                    Some('-') => restrictions.speed_maximum = Some(knots),
                    _ => {
                        restrictions.speed_minimum = Some(knots);
                        restrictions.speed_maximum = Some(knots);
                    }
                }
            } else {
                return Err(invalid());
            }
        }

        Ok(restrictions)
    }
}

/// One step of a procedure or airway: a fix name plus any bounds the
/// publication attaches to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureFix {
    pub name: String,
    #[serde(default)]
    pub restrictions: Restrictions,
}

impl ProcedureFix {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            restrictions: Restrictions::default(),
        }
    }

    /// Attach restrictions from the compact notation, e.g. `A110+|S250`.
    pub fn with_restrictions(name: &str, notation: &str) -> Result<Self, RouteError> {
        Ok(Self {
            name: name.to_ascii_lowercase(),
            restrictions: Restrictions::parse(notation)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Sid,
    Star,
}

/// A published SID or STAR: entry-keyed segments (runways for a SID,
/// transitions for a STAR) around a common body, then exit-keyed segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub kind: ProcedureKind,
    #[serde(default)]
    pub entry_points: HashMap<String, Vec<ProcedureFix>>,
    #[serde(default)]
    pub body: Vec<ProcedureFix>,
    #[serde(default)]
    pub exit_points: HashMap<String, Vec<ProcedureFix>>,
}

impl Procedure {
    /// Ordered fixes from `entry` through the body to `exit`.
    pub fn collect_fixes(&self, entry: &str, exit: &str) -> Result<Vec<ProcedureFix>, RouteError> {
        let entry_fixes =
            self.entry_points
                .get(&entry.to_ascii_lowercase())
                .ok_or_else(|| RouteError::InvalidEntry {
                    procedure: self.name.clone(),
                    entry: entry.to_string(),
                })?;
        let exit_fixes =
            self.exit_points
                .get(&exit.to_ascii_lowercase())
                .ok_or_else(|| RouteError::InvalidExit {
                    procedure: self.name.clone(),
                    exit: exit.to_string(),
                })?;

        let mut fixes =
            Vec::with_capacity(entry_fixes.len() + self.body.len() + exit_fixes.len());
        fixes.extend_from_slice(entry_fixes);
        fixes.extend_from_slice(&self.body);
        fixes.extend_from_slice(exit_fixes);
        Ok(fixes)
    }
}

/// A published airway: a linear fix chain joinable at any on-airway fix and
/// flyable in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airway {
    pub name: String,
    pub fixes: Vec<ProcedureFix>,
}

impl Airway {
    /// Inclusive span between two on-airway fixes, reversed when `exit`
    /// precedes `entry` in the published direction.
    pub fn fixes_between(&self, entry: &str, exit: &str) -> Result<Vec<ProcedureFix>, RouteError> {
        let entry = entry.to_ascii_lowercase();
        let exit = exit.to_ascii_lowercase();

        let entry_index = self
            .fixes
            .iter()
            .position(|fix| fix.name == entry)
            .ok_or_else(|| RouteError::InvalidEntry {
                procedure: self.name.clone(),
                entry,
            })?;
        let exit_index = self
            .fixes
            .iter()
            .position(|fix| fix.name == exit)
            .ok_or_else(|| RouteError::InvalidExit {
                procedure: self.name.clone(),
                exit,
            })?;

        let span = if entry_index <= exit_index {
            self.fixes[entry_index..=exit_index].to_vec()
        } else {
            self.fixes[exit_index..=entry_index]
                .iter()
                .rev()
                .cloned()
                .collect()
        };
        Ok(span)
    }
}

/// Read-only lookup tables for everything a route string can reference.
///
/// Names canonicalize to lowercase on insert; lookups lowercase the query,
/// so callers may pass idents in any case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavDatabase {
    #[serde(default)]
    fixes: HashMap<String, Position>,
    #[serde(default)]
    procedures: HashMap<String, Procedure>,
    #[serde(default)]
    airways: HashMap<String, Airway>,
}

impl NavDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_fix(&mut self, name: &str, position: Position) {
        self.fixes.insert(name.to_ascii_lowercase(), position);
    }

    pub fn add_procedure(&mut self, procedure: Procedure) {
        self.procedures
            .insert(procedure.name.to_ascii_lowercase(), procedure);
    }

    pub fn add_airway(&mut self, airway: Airway) {
        self.airways.insert(airway.name.to_ascii_lowercase(), airway);
    }

    pub fn fix(&self, name: &str) -> Option<&Position> {
        self.fixes.get(&name.to_ascii_lowercase())
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(&name.to_ascii_lowercase())
    }

    pub fn airway(&self, name: &str) -> Option<&Airway> {
        self.airways.get(&name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_airway() -> Airway {
        Airway {
            name: "v458".to_string(),
            fixes: vec![
                ProcedureFix::new("sxc"),
                ProcedureFix::new("hec"),
                ProcedureFix::new("ipl"),
            ],
        }
    }

    #[test]
    fn parse_restriction_bounds() {
        let restrictions = Restrictions::parse("A110+|S250-").unwrap();
        assert_eq!(restrictions.altitude_minimum, Some(11_000));
        assert_eq!(restrictions.altitude_maximum, None);
        assert_eq!(restrictions.speed_maximum, Some(250));
        assert_eq!(restrictions.speed_minimum, None);
    }

    #[test]
    fn parse_at_restriction_sets_both_bounds() {
        let restrictions = Restrictions::parse("a80").unwrap();
        assert_eq!(restrictions.altitude_minimum, Some(8_000));
        assert_eq!(restrictions.altitude_maximum, Some(8_000));
    }

    #[test]
    fn parse_rejects_garbage_notation() {
        assert!(Restrictions::parse("x120").is_err());
        assert!(Restrictions::parse("Aabc+").is_err());
        assert!(Restrictions::parse("").map(|r| r.is_empty()).unwrap_or(false));
    }

    #[test]
    fn airway_span_forward_and_reversed() {
        let airway = sample_airway();

        let forward = airway.fixes_between("sxc", "ipl").unwrap();
        let names: Vec<&str> = forward.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["sxc", "hec", "ipl"]);

        let reversed = airway.fixes_between("ipl", "sxc").unwrap();
        let names: Vec<&str> = reversed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ipl", "hec", "sxc"]);
    }

    #[test]
    fn airway_rejects_off_airway_fix() {
        let airway = sample_airway();
        assert!(matches!(
            airway.fixes_between("sxc", "dag"),
            Err(RouteError::InvalidExit { .. })
        ));
    }

    #[test]
    fn procedure_collects_entry_body_exit() {
        let procedure = Procedure {
            name: "offsh9".to_string(),
            kind: ProcedureKind::Sid,
            entry_points: HashMap::from([(
                "ksfo28r".to_string(),
                vec![ProcedureFix::new("senzy")],
            )]),
            body: vec![ProcedureFix::new("peeno")],
            exit_points: HashMap::from([("sxc".to_string(), vec![ProcedureFix::new("sxc")])]),
        };

        let fixes = procedure.collect_fixes("KSFO28R", "sxc").unwrap();
        let names: Vec<&str> = fixes.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["senzy", "peeno", "sxc"]);

        assert!(matches!(
            procedure.collect_fixes("ksfo10l", "sxc"),
            Err(RouteError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn database_lookup_is_case_insensitive() {
        let mut navdb = NavDatabase::new();
        navdb.add_fix("SXC", Position::new(33.38, -118.42));

        assert!(navdb.fix("sxc").is_some());
        assert!(navdb.fix("SXC").is_some());
        assert!(navdb.fix("dag").is_none());
    }

    #[test]
    fn database_deserializes_from_fixture_json() {
        let navdb: NavDatabase = serde_json::from_value(serde_json::json!({
            "fixes": {
                "sxc": { "lat": 33.38, "lon": -118.42 },
                "ipl": { "lat": 32.95, "lon": -115.57 }
            },
            "airways": {
                "v458": {
                    "name": "v458",
                    "fixes": [
                        { "name": "sxc" },
                        { "name": "ipl", "restrictions": { "altitude_minimum": 7000 } }
                    ]
                }
            }
        }))
        .expect("fixture should deserialize");

        assert!(navdb.fix("sxc").is_some());
        let airway = navdb.airway("V458").expect("airway should resolve");
        assert_eq!(airway.fixes[1].restrictions.altitude_minimum, Some(7_000));
    }
}
