//! Probe sequence data model
//!
//! A probe sequence is an ordered list of [`ProbeOperation`]s, each one a
//! single `G38.2` touch-probe cycle along one axis. Auxiliary rapid and
//! dwell instructions attach to an operation either as pre-moves (run just
//! before the approach) or post-moves (run after the automatic backoff, up
//! to the next probe). Program-level parameters live in
//! [`ProbeSequenceSettings`].
//!
//! Movement steps are a proper sum type so a rapid can never carry a dwell
//! time and a dwell can never carry axis words.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ModelError;
use crate::units::Units;

/// Generate a fresh opaque id for operations and steps
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Machine axis addressed by a probe or rapid move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Parse an axis letter, case-insensitively
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            _ => None,
        }
    }

    /// The uppercase axis letter
    pub fn letter(&self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Axis::from_char(c).ok_or_else(|| format!("Unknown axis: {}", s)),
            _ => Err(format!("Unknown axis: {}", s)),
        }
    }
}

/// Direction of probe travel along its axis
///
/// Serialized as `1` / `-1`, matching the stored document format of the
/// sequence designer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum ProbeDirection {
    /// Travel toward positive axis values
    Positive,
    /// Travel toward negative axis values
    Negative,
}

impl ProbeDirection {
    /// Sign factor applied to the travel distance
    pub fn sign(&self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    /// Direction implied by a signed axis value
    pub fn from_value(value: f64) -> Self {
        if value < 0.0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}

impl From<ProbeDirection> for i8 {
    fn from(d: ProbeDirection) -> i8 {
        match d {
            ProbeDirection::Positive => 1,
            ProbeDirection::Negative => -1,
        }
    }
}

impl TryFrom<i8> for ProbeDirection {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Positive),
            -1 => Ok(Self::Negative),
            _ => Err(format!("Invalid probe direction: {}", v)),
        }
    }
}

impl fmt::Display for ProbeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Positioning mode word carried by a rapid move
///
/// Absence of a mode word is modeled as `Option::None` on the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// G90 - absolute positioning
    Absolute,
    /// G91 - incremental positioning
    Relative,
}

/// Coordinate system word carried by a rapid move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    /// G53 - machine coordinates
    Machine,
    /// G54 - work coordinates
    Work,
}

/// Insertion-ordered mapping of axis letters to signed scalars
///
/// Rapid moves carry one to three axis words; their order on the G-code
/// line follows the order they were inserted here. Re-inserting an axis
/// replaces its value but keeps its original slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisValues(Vec<(Axis, f64)>);

impl AxisValues {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value for an axis
    pub fn insert(&mut self, axis: Axis, value: f64) {
        if let Some(slot) = self.0.iter_mut().find(|(a, _)| *a == axis) {
            slot.1 = value;
        } else {
            self.0.push((axis, value));
        }
    }

    /// Look up the value for an axis
    pub fn get(&self, axis: Axis) -> Option<f64> {
        self.0.iter().find(|(a, _)| *a == axis).map(|(_, v)| *v)
    }

    /// Iterate axis/value pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        self.0.iter().copied()
    }

    /// Number of axes present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no axis word is present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Axis, f64)> for AxisValues {
    fn from_iter<I: IntoIterator<Item = (Axis, f64)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (axis, value) in iter {
            values.insert(axis, value);
        }
        values
    }
}

// Stored documents use a plain {"X": 10, "Y": 20} object; serialize as a
// map rather than a list of pairs so they stay interchangeable.
impl Serialize for AxisValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (axis, value) in &self.0 {
            map.serialize_entry(axis, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AxisValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AxisValuesVisitor;

        impl<'de> Visitor<'de> for AxisValuesVisitor {
            type Value = AxisValues;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of axis letters to numbers")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut values = AxisValues::new();
                while let Some((axis, value)) = access.next_entry::<Axis, f64>()? {
                    values.insert(axis, value);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_map(AxisValuesVisitor)
    }
}

/// A rapid (G0) movement step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RapidMove {
    /// Unique step id
    pub id: String,
    /// Human-readable description; becomes the trailing G-code comment
    pub description: String,
    /// Axis words in emission order
    pub axes_values: AxisValues,
    /// Optional positioning mode word (G90/G91)
    pub position_mode: Option<PositionMode>,
    /// Optional coordinate system word (G53/G54)
    pub coordinate_system: Option<CoordinateSystem>,
}

impl RapidMove {
    /// Create a rapid step with a fresh id
    pub fn new(
        axes_values: AxisValues,
        position_mode: Option<PositionMode>,
        coordinate_system: Option<CoordinateSystem>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            axes_values,
            position_mode,
            coordinate_system,
        }
    }
}

/// A dwell (G4) movement step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DwellMove {
    /// Unique step id
    pub id: String,
    /// Human-readable description; becomes the trailing G-code comment
    pub description: String,
    /// Dwell duration in seconds
    pub dwell_time: f64,
}

impl DwellMove {
    /// Create a dwell step with a fresh id
    pub fn new(dwell_time: f64, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            dwell_time,
        }
    }
}

/// One auxiliary instruction attached to a probe operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MovementStep {
    /// Rapid positioning move
    Rapid(RapidMove),
    /// Timed dwell
    Dwell(DwellMove),
}

impl MovementStep {
    /// The step's unique id
    pub fn id(&self) -> &str {
        match self {
            Self::Rapid(r) => &r.id,
            Self::Dwell(d) => &d.id,
        }
    }

    /// The step's human-readable description
    pub fn description(&self) -> &str {
        match self {
            Self::Rapid(r) => &r.description,
            Self::Dwell(d) => &d.description,
        }
    }
}

/// One touch-probe cycle along a single axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOperation {
    /// Unique operation id
    pub id: String,
    /// Axis the probe travels along
    pub axis: Axis,
    /// Direction of travel
    pub direction: ProbeDirection,
    /// Probing travel magnitude (unsigned)
    pub distance: f64,
    /// Probing feed rate
    pub feed_rate: f64,
    /// Retract distance after contact (unsigned)
    pub backoff_distance: f64,
    /// Coordinate-system offset value written on contact (G10 L20 P1)
    pub wcs_offset: f64,
    /// Steps executed immediately before the probe move
    pub pre_moves: Vec<MovementStep>,
    /// Steps executed after the automatic backoff, up to the next probe
    pub post_moves: Vec<MovementStep>,
}

impl ProbeOperation {
    /// Create a probe operation with a fresh id and default parameters
    pub fn new(axis: Axis, direction: ProbeDirection, distance: f64) -> Self {
        Self {
            id: new_id(),
            axis,
            direction,
            distance,
            feed_rate: 10.0,
            backoff_distance: 1.0,
            wcs_offset: 0.0,
            pre_moves: Vec::new(),
            post_moves: Vec::new(),
        }
    }

    /// The signed travel distance as emitted on the G38.2 line
    pub fn signed_distance(&self) -> f64 {
        self.direction.sign() * self.distance
    }

    /// Check the operation against the model invariants
    ///
    /// The generator does not call this; strict callers do.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.distance < 0.0 {
            return Err(ModelError::NegativeDistance {
                id: self.id.clone(),
                distance: self.distance,
            });
        }
        if self.backoff_distance < 0.0 {
            return Err(ModelError::NegativeBackoff {
                id: self.id.clone(),
                backoff: self.backoff_distance,
            });
        }
        if self.feed_rate <= 0.0 {
            return Err(ModelError::NonPositiveFeedRate {
                id: self.id.clone(),
                feed_rate: self.feed_rate,
            });
        }
        for step in self.pre_moves.iter().chain(self.post_moves.iter()) {
            validate_step(step)?;
        }
        Ok(())
    }
}

fn validate_step(step: &MovementStep) -> Result<(), ModelError> {
    match step {
        MovementStep::Rapid(r) => {
            if r.axes_values.is_empty() || r.axes_values.len() > 3 {
                return Err(ModelError::BadAxisCount {
                    id: r.id.clone(),
                    count: r.axes_values.len(),
                });
            }
        }
        MovementStep::Dwell(d) => {
            if d.dwell_time <= 0.0 {
                return Err(ModelError::NonPositiveDwell {
                    id: d.id.clone(),
                    seconds: d.dwell_time,
                });
            }
        }
    }
    Ok(())
}

/// Validate every operation of a sequence, collecting all violations
pub fn validate_sequence(operations: &[ProbeOperation]) -> Vec<ModelError> {
    let errors: Vec<ModelError> = operations
        .iter()
        .filter_map(|op| op.validate().err())
        .collect();
    if !errors.is_empty() {
        tracing::debug!(
            count = errors.len(),
            "probe sequence failed model validation"
        );
    }
    errors
}

/// Absolute machine-coordinate position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MachinePosition {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl MachinePosition {
    /// Create a position from its three coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Program-level parameters for a probe sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSequenceSettings {
    /// Absolute machine-coordinate starting point
    pub initial_position: MachinePosition,
    /// Number of buffer-clearing dwells emitted before each probe
    pub dwells_before_probe: u32,
    /// Spindle speed in RPM
    pub spindle_speed: f64,
    /// Unit system for the whole program
    pub units: Units,
    /// Endmill diameter, used by the editing UI for offset math
    pub endmill_size: f64,
}

impl Default for ProbeSequenceSettings {
    fn default() -> Self {
        Self {
            initial_position: MachinePosition::default(),
            dwells_before_probe: 3,
            spindle_speed: 5000.0,
            units: Units::Mm,
            endmill_size: 6.35,
        }
    }
}
