//! Routes: an ordered leg collection with the string-segmentation grammar,
//! navigation-state queries, and the in-flight mutation operations.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RouteError;
use crate::leg::{Leg, LegKind};
use crate::navdata::NavDatabase;
use crate::waypoint::{HoldLegLength, TurnDirection, Waypoint};

/// The single reserved divider character of the route-string grammar.
pub const PROCEDURE_DIVIDER: char = '.';
/// Direct-segment divider: the procedure divider doubled.
pub const DIRECT_DIVIDER: &str = "..";

/// The full flight plan: remaining legs ahead of the aircraft plus the legs
/// already flown, partitioned by navigation progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    legs: VecDeque<Leg>,
    flown_legs: Vec<Leg>,
}

impl Route {
    /// Parse a route string and expand every segment into a leg.
    ///
    /// All-or-nothing: whitespace, grammar violations, unresolved names, or
    /// an expansion totalling fewer than two waypoints abort construction
    /// and no partially built route escapes.
    pub fn from_string(route_string: &str, navdb: &NavDatabase) -> Result<Self, RouteError> {
        let canonical = route_string.to_ascii_lowercase();
        let segments = divide_route_string_into_segments(&canonical)?;

        let mut legs = VecDeque::with_capacity(segments.len());
        for segment in &segments {
            legs.push_back(Leg::from_segment(segment, navdb)?);
        }

        let route = Self {
            legs,
            flown_legs: Vec::new(),
        };
        if route.waypoint_count() < 2 {
            return Err(RouteError::TooFewWaypoints(canonical));
        }

        debug!(route = %canonical, legs = route.legs.len(), "route constructed");
        Ok(route)
    }

    // ========== NAVIGATION STATE ==========

    /// The leg currently being flown; first of the remaining sequence.
    pub fn current_leg(&self) -> Option<&Leg> {
        self.legs.front()
    }

    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.legs.front()?.current_waypoint()
    }

    /// Second waypoint of the current leg, or the next leg's first.
    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        let current = self.legs.front()?;
        if current.has_next_waypoint() {
            current.waypoints().nth(1)
        } else {
            self.legs.get(1)?.current_waypoint()
        }
    }

    pub fn has_next_leg(&self) -> bool {
        self.legs.len() > 1
    }

    pub fn has_next_waypoint(&self) -> bool {
        self.legs
            .front()
            .is_some_and(Leg::has_next_waypoint)
            || self.has_next_leg()
    }

    /// Retire the current leg to the flown history. No-op without a next leg.
    pub fn skip_to_next_leg(&mut self) -> bool {
        if self.legs.len() < 2 {
            return false;
        }
        if let Some(leg) = self.legs.pop_front() {
            self.flown_legs.push(leg);
        }
        true
    }

    /// Advance one waypoint, rolling into the next leg at a boundary.
    pub fn skip_to_next_waypoint(&mut self) -> bool {
        if let Some(leg) = self.legs.front_mut() {
            if leg.skip_to_next_waypoint() {
                return true;
            }
        }
        self.skip_to_next_leg()
    }

    /// Jump ahead to a named waypoint: legs before the match retire to the
    /// flown history and the matching leg advances its cursor. False (and
    /// no mutation) when the name is not on the remaining route.
    pub fn skip_to_waypoint_name(&mut self, name: &str) -> bool {
        let Some(index) = self.legs.iter().position(|leg| leg.has_waypoint(name)) else {
            return false;
        };
        for _ in 0..index {
            if let Some(leg) = self.legs.pop_front() {
                self.flown_legs.push(leg);
            }
        }
        self.legs
            .front_mut()
            .is_some_and(|leg| leg.skip_to_waypoint(name))
    }

    // ========== QUERIES ==========

    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter()
    }

    pub fn flown_legs(&self) -> &[Leg] {
        &self.flown_legs
    }

    /// Fresh snapshot of the remaining waypoints, in flying order.
    pub fn waypoints(&self) -> Vec<&Waypoint> {
        self.legs.iter().flat_map(Leg::waypoints).collect()
    }

    /// Remaining waypoint total.
    pub fn waypoint_count(&self) -> usize {
        self.legs.iter().map(Leg::waypoint_count).sum()
    }

    /// Waypoint total across flown and remaining legs; invariant under the
    /// skip operations.
    pub fn total_waypoint_count(&self) -> usize {
        self.flown_legs
            .iter()
            .chain(self.legs.iter())
            .map(Leg::total_waypoint_count)
            .sum()
    }

    pub fn has_waypoint_name(&self, name: &str) -> bool {
        self.legs.iter().any(|leg| leg.has_waypoint(name))
    }

    pub fn altitude_restricted_waypoints(&self) -> Vec<&Waypoint> {
        self.legs
            .iter()
            .flat_map(Leg::waypoints)
            .filter(|waypoint| waypoint.has_altitude_restriction())
            .collect()
    }

    /// Lowest altitude floor published anywhere on the remaining legs;
    /// `None` when no leg carries altitude data.
    pub fn bottom_altitude(&self) -> Option<i32> {
        self.legs
            .iter()
            .filter_map(Leg::procedure_bottom_altitude)
            .min()
    }

    /// Highest altitude ceiling published anywhere on the remaining legs;
    /// `None` when no leg carries altitude data.
    pub fn top_altitude(&self) -> Option<i32> {
        self.legs
            .iter()
            .filter_map(Leg::procedure_top_altitude)
            .max()
    }

    /// Bearing from the first waypoint to the second, radians. `None` when
    /// either lacks a position (a route leading with vectors).
    pub fn calculate_spawn_heading(&self) -> Option<f64> {
        let waypoints = self.waypoints();
        let first = waypoints.first()?.position()?;
        let second = waypoints.get(1)?.position()?;
        Some(first.bearing_to(&second))
    }

    /// Canonical route string for the remaining legs.
    pub fn route_string(&self) -> String {
        calculate_route_string_for_legs(self.legs.iter())
    }

    /// Canonical route string for the whole plan, flown legs included.
    pub fn full_route_string(&self) -> String {
        calculate_route_string_for_legs(self.flown_legs.iter().chain(self.legs.iter()))
    }

    // ========== MUTATIONS ==========

    /// Swap in a new departure procedure. The existing SID leg is replaced
    /// in place; without one the new leg goes to the front. False (route
    /// untouched) when the segment does not build a SID leg.
    pub fn replace_departure_procedure(&mut self, segment: &str, navdb: &NavDatabase) -> bool {
        let leg = match Leg::from_segment(segment, navdb) {
            Ok(leg) => leg,
            Err(error) => {
                warn!(%segment, %error, "departure replacement rejected");
                return false;
            }
        };
        if !leg.is_sid_leg() {
            warn!(%segment, "departure replacement rejected: not a SID segment");
            return false;
        }

        match self.legs.iter().position(Leg::is_sid_leg) {
            Some(index) => self.legs[index] = leg,
            None => self.legs.push_front(leg),
        }
        true
    }

    /// Swap in a new arrival procedure. The existing STAR leg is replaced
    /// in place; without one the new leg is appended. False (route
    /// untouched) when the segment does not build a STAR leg.
    pub fn replace_arrival_procedure(&mut self, segment: &str, navdb: &NavDatabase) -> bool {
        let leg = match Leg::from_segment(segment, navdb) {
            Ok(leg) => leg,
            Err(error) => {
                warn!(%segment, %error, "arrival replacement rejected");
                return false;
            }
        };
        if !leg.is_star_leg() {
            warn!(%segment, "arrival replacement rejected: not a STAR segment");
            return false;
        }

        match self.legs.iter().position(Leg::is_star_leg) {
            Some(index) => self.legs[index] = leg,
            None => self.legs.push_back(leg),
        }
        true
    }

    /// Apply hold parameters to a named remaining waypoint.
    pub fn activate_hold_for_waypoint_name(
        &mut self,
        name: &str,
        inbound_heading: f64,
        turn_direction: TurnDirection,
        leg_length: HoldLegLength,
    ) -> bool {
        for leg in self.legs.iter_mut() {
            if let Some(waypoint) = leg.find_waypoint_mut(name) {
                waypoint.update_hold_parameters(inbound_heading, turn_direction, leg_length);
                return true;
            }
        }
        false
    }

    /// Clear both sequences. The only state in which the route holds no
    /// legs; callers follow up by assigning a freshly built route.
    pub fn reset(&mut self) {
        self.legs.clear();
        self.flown_legs.clear();
    }

    /// Merge a cleared amendment route into this one.
    ///
    /// The amendment's final waypoint must lie ahead on this route (the
    /// convergence fix). Remaining legs before the convergence point are
    /// discarded and the amendment's legs take their place; rejoining
    /// mid-leg rebuilds the convergence leg's tail, which requires the leg
    /// to be an airway. False (route untouched) when no convergence exists
    /// or the tail cannot be rebuilt.
    pub fn absorb_route_model(&mut self, other: Route, navdb: &NavDatabase) -> bool {
        let Some(convergence) = other
            .waypoints()
            .last()
            .map(|waypoint| waypoint.ident().to_string())
        else {
            warn!("route absorption rejected: amendment has no waypoints");
            return false;
        };

        let Some((index, tail)) = self.convergence_tail(&convergence, navdb) else {
            return false;
        };

        let mut new_legs = other.legs;
        // The amendment ends on the fix the tail starts with; drop a
        // redundant direct leg so the fix appears once.
        if new_legs
            .back()
            .is_some_and(|leg| leg.kind() == LegKind::Direct && leg.has_waypoint(&convergence))
        {
            new_legs.pop_back();
        }
        new_legs.push_back(tail);
        new_legs.extend(self.legs.drain(..).skip(index + 1));
        self.legs = new_legs;
        true
    }

    /// Locate the convergence fix on the remaining route and build the leg
    /// that continues from it.
    fn convergence_tail(&self, convergence: &str, navdb: &NavDatabase) -> Option<(usize, Leg)> {
        // A leg starting exactly on the fix survives as-is.
        if let Some(index) = self.legs.iter().position(|leg| {
            leg.current_waypoint()
                .is_some_and(|waypoint| waypoint.ident() == convergence)
        }) {
            return Some((index, self.legs[index].clone()));
        }

        let index = match self.legs.iter().position(|leg| leg.has_waypoint(convergence)) {
            Some(index) => index,
            None => {
                warn!(fix = %convergence, "route absorption rejected: no convergence fix ahead");
                return None;
            }
        };
        let leg = &self.legs[index];

        // Convergence on the leg's final fix: continue direct from it.
        let ends_on_convergence = leg
            .waypoints()
            .last()
            .is_some_and(|waypoint| waypoint.ident() == convergence);
        let segment = if ends_on_convergence {
            convergence.to_string()
        } else {
            let Some(name) = leg.procedure_name() else {
                warn!(fix = %convergence, "route absorption rejected: cannot rejoin mid-leg");
                return None;
            };
            format!("{convergence}.{name}.{}", leg.exit_fix_name())
        };

        match Leg::from_segment(&segment, navdb) {
            Ok(tail) => Some((index, tail)),
            Err(error) => {
                warn!(%segment, %error, "route absorption rejected");
                None
            }
        }
    }
}

/// Split a full route string into self-contained per-leg segments.
///
/// Direct chunks split first. Within a chunk, the first three tokens form
/// `entry.name.exit`; the rest pair up as `name.exit`, each pair rewritten
/// with the previous pair's exit so every segment resolves independently.
fn divide_route_string_into_segments(route_string: &str) -> Result<Vec<String>, RouteError> {
    if route_string.contains(char::is_whitespace) {
        return Err(RouteError::WhitespaceInRouteString(route_string.to_string()));
    }
    if route_string.is_empty() {
        return Err(RouteError::MalformedSegment(String::new()));
    }

    let mut segments = Vec::new();
    for chunk in route_string.split(DIRECT_DIVIDER) {
        let tokens: Vec<&str> = chunk.split(PROCEDURE_DIVIDER).collect();
        if tokens.iter().any(|token| token.is_empty()) {
            return Err(RouteError::MalformedSegment(chunk.to_string()));
        }

        match tokens.len() {
            1 => segments.push(tokens[0].to_string()),
            len if len >= 3 && len % 2 == 1 => {
                segments.push(tokens[..3].join("."));
                let mut previous_exit = tokens[2];
                for pair in tokens[3..].chunks(2) {
                    segments.push(format!("{previous_exit}.{}.{}", pair[0], pair[1]));
                    previous_exit = pair[1];
                }
            }
            _ => return Err(RouteError::MalformedSegment(chunk.to_string())),
        }
    }
    Ok(segments)
}

/// Reassemble the canonical route string for a leg sequence, merging shared
/// transition fixes so each appears once.
fn calculate_route_string_for_legs<'a, I>(legs: I) -> String
where
    I: IntoIterator<Item = &'a Leg>,
{
    let mut out = String::new();
    let mut previous_exit: Option<String> = None;

    for leg in legs {
        match previous_exit {
            None => out.push_str(leg.route_string()),
            Some(ref exit) => {
                let chains = (leg.is_procedure_leg() || leg.is_airway_leg())
                    && leg.entry_fix_name() == exit.as_str();
                if chains {
                    // Continue the chain from the shared transition fix.
                    out.push_str(&leg.route_string()[leg.entry_fix_name().len()..]);
                } else {
                    out.push_str(DIRECT_DIVIDER);
                    out.push_str(leg.route_string());
                }
            }
        }
        previous_exit = Some(leg.exit_fix_name().to_string());
    }
    out
}
