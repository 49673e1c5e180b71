//! Waypoints: navigable points with altitude/speed bounds and hold or
//! vector metadata.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::navdata::{NavDatabase, Restrictions};
use crate::spatial::Position;

/// Ident prefix marking an RNAV point-in-space waypoint.
pub const RNAV_PREFIX: char = '_';
/// Display label shown for RNAV point-in-space waypoints.
pub const RNAV_DISPLAY_NAME: &str = "RNAV";
/// Ident prefix marking a fly-heading (vector) token.
pub const VECTOR_PREFIX: char = '#';
/// Route-token prefix requesting a hold at the fix.
const HOLD_PREFIX: char = '@';
/// Route-token prefix marking a fly-over fix.
const FLY_OVER_PREFIX: char = '^';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

/// Length of a holding pattern's straight segments, as issued in
/// clearances: `1min` or `3nm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldLegLength {
    Minutes(u32),
    NauticalMiles(u32),
}

impl HoldLegLength {
    /// Numeric value with the unit suffix stripped.
    pub fn value(&self) -> u32 {
        match self {
            Self::Minutes(value) | Self::NauticalMiles(value) => *value,
        }
    }
}

impl FromStr for HoldLegLength {
    type Err = RouteError;

    fn from_str(notation: &str) -> Result<Self, Self::Err> {
        let lowered = notation.trim().to_ascii_lowercase();
        let invalid = || RouteError::InvalidHoldLegLength(notation.to_string());

        if let Some(digits) = lowered.strip_suffix("min") {
            digits.parse().map(Self::Minutes).map_err(|_| invalid())
        } else if let Some(digits) = lowered.strip_suffix("nm") {
            digits.parse().map(Self::NauticalMiles).map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    }
}

/// Parameters of an active holding pattern at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldParameters {
    /// Inbound course to the hold fix, radians.
    pub inbound_heading: f64,
    pub turn_direction: TurnDirection,
    pub leg_length: HoldLegLength,
    /// Simulation time at which the hold expires; `None` while no timer runs.
    #[serde(default)]
    pub timer: Option<f64>,
}

impl Default for HoldParameters {
    /// A standard published hold: right turns, one-minute legs.
    fn default() -> Self {
        Self {
            inbound_heading: 0.0,
            turn_direction: TurnDirection::Right,
            leg_length: HoldLegLength::Minutes(1),
            timer: None,
        }
    }
}

/// Snapshot handed to the hold-flying logic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldInstruction {
    pub turn_direction: TurnDirection,
    pub fix_name: String,
    pub fix_position: Option<Position>,
    /// Inbound course to the hold fix, radians.
    pub inbound_heading: f64,
    /// Leg length with the unit suffix stripped.
    pub leg_length: u32,
    pub timer: Option<f64>,
}

/// Property bag for rebuilding a waypoint from persisted state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaypointProps {
    pub ident: String,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub restrictions: Restrictions,
    #[serde(default)]
    pub is_fly_over: bool,
    #[serde(default)]
    pub hold: Option<HoldParameters>,
}

/// A navigable point on a route.
///
/// Identity and flags are fixed at construction; the restriction fields and
/// hold state mutate as clearances amend the flight plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    ident: String,
    position: Option<Position>,
    altitude_minimum: Option<i32>,
    altitude_maximum: Option<i32>,
    speed_minimum: Option<i32>,
    speed_maximum: Option<i32>,
    is_fly_over: bool,
    is_vector: bool,
    hold: Option<HoldParameters>,
}

impl Waypoint {
    /// Build from a resolved fix, carrying over any published restrictions.
    pub fn from_fix(name: &str, position: Position, restrictions: &Restrictions) -> Self {
        Self {
            ident: name.to_ascii_lowercase(),
            position: Some(position),
            altitude_minimum: restrictions.altitude_minimum,
            altitude_maximum: restrictions.altitude_maximum,
            speed_minimum: restrictions.speed_minimum,
            speed_maximum: restrictions.speed_maximum,
            is_fly_over: false,
            is_vector: false,
            hold: None,
        }
    }

    /// Build a fly-heading waypoint from a vector token such as `#250`.
    pub fn vector(token: &str) -> Result<Self, RouteError> {
        let token = token.to_ascii_lowercase();
        let valid_heading = token
            .strip_prefix(VECTOR_PREFIX)
            .and_then(|digits| digits.parse::<u32>().ok())
            .is_some_and(|heading| (1..=360).contains(&heading));
        if !valid_heading {
            return Err(RouteError::InvalidVectorHeading(token));
        }

        Ok(Self {
            ident: token,
            position: None,
            altitude_minimum: None,
            altitude_maximum: None,
            speed_minimum: None,
            speed_maximum: None,
            is_fly_over: false,
            is_vector: true,
            hold: None,
        })
    }

    /// Build from a direct route token, resolving the fix through the
    /// database. Understands the `@` (hold here), `^` (fly over), `#`
    /// (vector) and `_` (RNAV point) markers.
    pub fn from_token(token: &str, navdb: &NavDatabase) -> Result<Self, RouteError> {
        let token = token.to_ascii_lowercase();
        if token.starts_with(VECTOR_PREFIX) {
            return Self::vector(&token);
        }

        let mut bare = token.as_str();
        let mut hold_requested = false;
        let mut fly_over = false;
        loop {
            if let Some(stripped) = bare.strip_prefix(HOLD_PREFIX) {
                hold_requested = true;
                bare = stripped;
            } else if let Some(stripped) = bare.strip_prefix(FLY_OVER_PREFIX) {
                fly_over = true;
                bare = stripped;
            } else {
                break;
            }
        }

        let position = *navdb
            .fix(bare)
            .ok_or_else(|| RouteError::UnknownFix(bare.to_string()))?;

        let mut waypoint = Self::from_fix(bare, position, &Restrictions::default());
        waypoint.is_fly_over = fly_over;
        if hold_requested {
            waypoint.hold = Some(HoldParameters::default());
        }
        Ok(waypoint)
    }

    /// Rebuild from persisted state, hold data included.
    pub fn from_props(props: WaypointProps) -> Self {
        let ident = props.ident.to_ascii_lowercase();
        let is_vector = ident.starts_with(VECTOR_PREFIX);
        Self {
            ident,
            position: props.position,
            altitude_minimum: props.restrictions.altitude_minimum,
            altitude_maximum: props.restrictions.altitude_maximum,
            speed_minimum: props.restrictions.speed_minimum,
            speed_maximum: props.restrictions.speed_maximum,
            is_fly_over: props.is_fly_over,
            is_vector,
            hold: props.hold,
        }
    }

    /// Display name: RNAV points show the generic label, everything else
    /// its ident.
    pub fn name(&self) -> &str {
        if self.ident.starts_with(RNAV_PREFIX) {
            RNAV_DISPLAY_NAME
        } else {
            &self.ident
        }
    }

    /// Raw identifier as encoded in the route string; the lookup key.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn altitude_minimum(&self) -> Option<i32> {
        self.altitude_minimum
    }

    pub fn altitude_maximum(&self) -> Option<i32> {
        self.altitude_maximum
    }

    pub fn speed_minimum(&self) -> Option<i32> {
        self.speed_minimum
    }

    pub fn speed_maximum(&self) -> Option<i32> {
        self.speed_maximum
    }

    pub fn has_altitude_restriction(&self) -> bool {
        self.altitude_minimum.is_some() || self.altitude_maximum.is_some()
    }

    pub fn has_speed_restriction(&self) -> bool {
        self.speed_minimum.is_some() || self.speed_maximum.is_some()
    }

    pub fn has_restriction(&self) -> bool {
        self.has_altitude_restriction() || self.has_speed_restriction()
    }

    pub fn is_fly_over(&self) -> bool {
        self.is_fly_over
    }

    pub fn is_vector(&self) -> bool {
        self.is_vector
    }

    pub fn is_rnav(&self) -> bool {
        self.ident.starts_with(RNAV_PREFIX)
    }

    pub fn is_hold(&self) -> bool {
        self.hold.is_some()
    }

    /// Heading encoded in a vector ident, in radians. `None` for fixes.
    pub fn vector_heading(&self) -> Option<f64> {
        if !self.is_vector {
            return None;
        }
        let degrees: f64 = self.ident.strip_prefix(VECTOR_PREFIX)?.parse().ok()?;
        Some(degrees.to_radians())
    }

    /// Mark this waypoint as a hold with the given parameters.
    ///
    /// Values are applied as passed; callers validate heading range and leg
    /// length before issuing the clearance. A running timer survives
    /// re-issued hold parameters.
    pub fn update_hold_parameters(
        &mut self,
        inbound_heading: f64,
        turn_direction: TurnDirection,
        leg_length: HoldLegLength,
    ) {
        let timer = self.hold.and_then(|hold| hold.timer);
        self.hold = Some(HoldParameters {
            inbound_heading,
            turn_direction,
            leg_length,
            timer,
        });
    }

    /// Start or clear the hold's expiry timer. No-op on non-hold waypoints.
    pub fn set_hold_timer(&mut self, timer: Option<f64>) {
        if let Some(hold) = self.hold.as_mut() {
            hold.timer = timer;
        }
    }

    /// Snapshot for the hold-flying logic; `None` until a hold is active.
    pub fn hold_instruction(&self) -> Option<HoldInstruction> {
        let hold = self.hold?;
        Some(HoldInstruction {
            turn_direction: hold.turn_direction,
            fix_name: self.name().to_string(),
            fix_position: self.position,
            inbound_heading: hold.inbound_heading,
            leg_length: hold.leg_length.value(),
            timer: hold.timer,
        })
    }
}
