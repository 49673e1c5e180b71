pub mod error;
pub mod leg;
pub mod navdata;
pub mod route;
pub mod spatial;
pub mod waypoint;

pub use error::RouteError;
pub use leg::{Leg, LegKind};
pub use navdata::{Airway, NavDatabase, Procedure, ProcedureFix, ProcedureKind, Restrictions};
pub use route::{Route, DIRECT_DIVIDER, PROCEDURE_DIVIDER};
pub use spatial::{haversine_distance, Position};
pub use waypoint::{
    HoldInstruction, HoldLegLength, HoldParameters, TurnDirection, Waypoint, WaypointProps,
    RNAV_DISPLAY_NAME,
};
