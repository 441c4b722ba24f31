//! Probe-sequence G-code generator
//!
//! Deterministic, stateless serializer from the probe-sequence model to the
//! canonical textual form. The generator assumes well-formed input and
//! emits values as-is; strict callers run
//! [`probekit_core::validate_sequence`] beforehand.
//!
//! Layout of the emitted program, in order: units word, three absolute
//! machine-coordinate rapids to the initial position (Z, then Y, then X),
//! spindle start with a fixed 3-second stabilization dwell, incremental
//! positioning mode, one labeled block per probe operation, and a
//! return-to-origin footer. Every command line carries a trailing
//! parenthesized comment; step descriptions become those comments so a
//! re-parse recovers them verbatim.

use probekit_core::{
    CoordinateSystem, MovementStep, PositionMode, ProbeOperation, ProbeSequenceSettings, Units,
};

use crate::words::fmt_num;

/// Column the trailing comment starts at
const COMMENT_COLUMN: usize = 40;

/// Serialize a probe sequence into a complete G-code program
///
/// Pure function over in-memory data; output uses Unix newlines.
pub fn generate_gcode(operations: &[ProbeOperation], settings: &ProbeSequenceSettings) -> String {
    let mut gcode = String::new();

    let units_comment = match settings.units {
        Units::Mm => "Set units to millimeters",
        Units::Inch => "Set units to inches",
    };
    gcode.push_str(&format_line(settings.units.gcode_word(), units_comment));

    let pos = settings.initial_position;
    gcode.push_str(&format_line(
        &format!("G0 G90 G53 Z{}", fmt_num(pos.z)),
        "Move to initial Z position",
    ));
    gcode.push_str(&format_line(
        &format!("G0 G90 G53 Y{}", fmt_num(pos.y)),
        "Move to initial Y position",
    ));
    gcode.push_str(&format_line(
        &format!("G0 G90 G53 X{}", fmt_num(pos.x)),
        "Move to initial X position",
    ));

    gcode.push_str(&format_line(
        &format!("S{} M4", fmt_num(settings.spindle_speed)),
        "Start spindle",
    ));
    gcode.push_str(&format_line("G4 P3", "Wait for spindle to stabilize"));

    gcode.push_str(&format_line("G91", "Switch to incremental positioning"));
    gcode.push('\n');

    for (index, operation) in operations.iter().enumerate() {
        emit_operation(&mut gcode, index + 1, operation, settings);
    }

    gcode.push_str(&format_line("G0 G54 G90 X0Y0", "Return to origin"));
    gcode.push_str(&format_line("S0", "Stop spindle"));

    tracing::debug!(
        operations = operations.len(),
        bytes = gcode.len(),
        "generated probe program"
    );
    gcode
}

/// Emit one labeled probe block (1-indexed)
fn emit_operation(
    gcode: &mut String,
    number: usize,
    operation: &ProbeOperation,
    settings: &ProbeSequenceSettings,
) {
    gcode.push_str(&format!(
        "(=== Probe Operation {}: {} Axis ===)\n",
        number, operation.axis
    ));

    if !operation.pre_moves.is_empty() {
        gcode.push_str(&format!("(Pre-moves for Probe Operation {})\n", number));
        for step in &operation.pre_moves {
            if let Some(line) = serialize_step(step) {
                gcode.push_str(&line);
            }
        }
        gcode.push('\n');
    }

    // Buffer-clear dwells flush the controller's motion buffer before the
    // time-critical probe; their count is fixed per sequence.
    for _ in 0..settings.dwells_before_probe {
        gcode.push_str(&format_line("G4 P0.01", "Empty Buffer"));
    }
    gcode.push('\n');

    gcode.push_str(&format_line(
        &format!(
            "G38.2 {}{} F{}",
            operation.axis,
            fmt_num(operation.signed_distance()),
            fmt_num(operation.feed_rate)
        ),
        &format!(
            "Probe {} axis in {} direction",
            operation.axis, operation.direction
        ),
    ));
    gcode.push_str(&format_line(
        &format!(
            "G10 L20 P1 {}{}",
            operation.axis,
            fmt_num(operation.wcs_offset)
        ),
        &format!("Set {} axis WCS origin", operation.axis),
    ));
    // Backoff is always emitted in the positive incremental sense,
    // regardless of the probe direction.
    gcode.push_str(&format_line(
        &format!(
            "G0 G91 {}{}",
            operation.axis,
            fmt_num(operation.backoff_distance)
        ),
        "Back off from surface",
    ));
    gcode.push('\n');

    if !operation.post_moves.is_empty() {
        gcode.push_str(&format!("(Post-moves for Probe Operation {})\n", number));
        for step in &operation.post_moves {
            if let Some(line) = serialize_step(step) {
                gcode.push_str(&line);
            }
        }
        gcode.push('\n');
    }
}

/// Serialize one movement step, or nothing for a rapid without axis words
fn serialize_step(step: &MovementStep) -> Option<String> {
    match step {
        MovementStep::Rapid(rapid) => {
            if rapid.axes_values.is_empty() {
                return None;
            }
            let mut command = String::from("G0");
            match rapid.position_mode {
                Some(PositionMode::Absolute) => command.push_str(" G90"),
                Some(PositionMode::Relative) => command.push_str(" G91"),
                None => {}
            }
            match rapid.coordinate_system {
                Some(CoordinateSystem::Machine) => command.push_str(" G53"),
                Some(CoordinateSystem::Work) => command.push_str(" G54"),
                None => {}
            }
            for (axis, value) in rapid.axes_values.iter() {
                command.push_str(&format!(" {}{}", axis, fmt_num(value)));
            }
            Some(format_line(&command, &rapid.description))
        }
        MovementStep::Dwell(dwell) => Some(format_line(
            &format!("G4 P{}", fmt_num(dwell.dwell_time)),
            &dwell.description,
        )),
    }
}

/// Right-pad a command to the comment column and append its comment
///
/// Commands longer than the column still get two separating spaces. Every
/// line is newline-terminated.
fn format_line(command: &str, comment: &str) -> String {
    if comment.is_empty() {
        return format!("{}\n", command);
    }
    let width = (command.len() + 2).max(COMMENT_COLUMN);
    format!("{:<width$}({})\n", command, comment, width = width)
}
