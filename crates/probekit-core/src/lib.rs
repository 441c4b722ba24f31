//! # ProbeKit Core
//!
//! Data model for CNC touch-probe sequences: probe operations, the
//! auxiliary movement steps attached to them, program-level settings,
//! and the unit system. The G-code translation lives in `probekit-gcode`;
//! UI, storage, and visualization layers consume these types as plain data.

pub mod error;
pub mod probe;
pub mod units;

pub use error::ModelError;
pub use probe::{
    new_id, validate_sequence, Axis, AxisValues, CoordinateSystem, DwellMove, MachinePosition,
    MovementStep, PositionMode, ProbeDirection, ProbeOperation, ProbeSequenceSettings, RapidMove,
};
pub use units::Units;
