use probekit_core::{Axis, MovementStep, ProbeDirection, Units};
use probekit_gcode::{parse_gcode, DEFAULT_BACKOFF_DISTANCE, DEFAULT_FEED_RATE};

#[test]
fn test_minimal_probe_program() {
    let program = parse_gcode(
        "G21\n\
         G91\n\
         \n\
         G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Y-10 F100\n\
         G10 L20 P1 Y1.5875\n\
         G0 G91 Y1\n",
    );

    assert_eq!(program.units, Some(Units::Mm));
    assert_eq!(program.dwells_before_probe, Some(2));
    assert!(program.errors.is_empty());
    assert_eq!(program.probe_sequence.len(), 1);

    let probe = &program.probe_sequence[0];
    assert_eq!(probe.axis, Axis::Y);
    assert_eq!(probe.direction, ProbeDirection::Negative);
    assert_eq!(probe.distance, 10.0);
    assert_eq!(probe.feed_rate, 100.0);
    assert_eq!(probe.wcs_offset, 1.5875);
    assert_eq!(probe.backoff_distance, 1.0);
    assert!(probe.pre_moves.is_empty());
    assert!(probe.post_moves.is_empty());
}

#[test]
fn test_single_buffer_dwell_is_an_ordinary_step() {
    // Two consecutive P0.01 dwells form a block; a lone one after the
    // backoff is a user-authored dwell step.
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Z-5 F50\n\
         G10 L20 P1 Z0\n\
         G0 G91 Z1\n\
         G4 P0.01\n\
         G0 X1\n",
    );

    assert_eq!(program.dwells_before_probe, Some(2));
    let probe = &program.probe_sequence[0];
    assert_eq!(probe.post_moves.len(), 2);
    match &probe.post_moves[0] {
        MovementStep::Dwell(dwell) => {
            assert_eq!(dwell.dwell_time, 0.01);
            assert_eq!(dwell.description, "Dwell for 0.01 seconds");
        }
        other => panic!("expected a dwell step, got {:?}", other),
    }
    match &probe.post_moves[1] {
        MovementStep::Rapid(rapid) => assert_eq!(rapid.description, "Rapid move to X1"),
        other => panic!("expected a rapid step, got {:?}", other),
    }
}

#[test]
fn test_backoff_magnitude_is_recorded_not_replayed() {
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Y-10 F100\n\
         G10 L20 P1 Y0.5\n\
         G0 G91 Y2.5\n",
    );

    let probe = &program.probe_sequence[0];
    assert_eq!(probe.backoff_distance, 2.5);
    // The backoff rapid must not reappear as a post-move.
    assert!(probe.post_moves.is_empty());
}

#[test]
fn test_initial_position_is_not_a_pre_move() {
    let program = parse_gcode(
        "G21\n\
         G0 G90 G53 Z-2 (Move to initial Z position)\n\
         G0 G90 G53 Y-78.5 (Move to initial Y position)\n\
         G0 G90 G53 X-10 (Move to initial X position)\n\
         S5000 M4 (Start spindle)\n\
         G4 P3 (Wait for spindle to stabilize)\n\
         G91\n\
         \n\
         G4 P0.01\n\
         G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 X3 F75\n\
         G10 L20 P1 X0\n\
         G0 G91 X1\n",
    );

    let position = program.initial_position.expect("initial position");
    assert_eq!(position.x, -10.0);
    assert_eq!(position.y, -78.5);
    assert_eq!(position.z, -2.0);
    assert_eq!(program.spindle_speed, Some(5000.0));
    assert_eq!(program.dwells_before_probe, Some(3));

    // The stabilization dwell is machine setup, discarded at the first
    // buffer block because G53/M4 appeared earlier.
    let probe = &program.probe_sequence[0];
    assert!(probe.pre_moves.is_empty());
}

#[test]
fn test_pre_moves_survive_without_setup_tokens() {
    // Hand-written program: no G53/M4 anywhere, moves both before the
    // first buffer block and between block and probe become pre-moves.
    let program = parse_gcode(
        "G21\n\
         G4 P0.5\n\
         \n\
         G4 P0.01\n\
         G4 P0.01\n\
         G0 G91 X-5 (approach clamp)\n\
         G0 X10 Y20\n\
         \n\
         G38.2 X3 F75\n\
         G10 L20 P1 X0\n\
         G0 G91 X1\n",
    );

    let probe = &program.probe_sequence[0];
    assert_eq!(probe.pre_moves.len(), 3);
    assert_eq!(probe.pre_moves[0].description(), "Dwell for 0.5 seconds");
    assert_eq!(probe.pre_moves[1].description(), "approach clamp");
    assert_eq!(probe.pre_moves[2].description(), "Rapid move to X10 Y20");
    match &probe.pre_moves[2] {
        MovementStep::Rapid(rapid) => {
            assert_eq!(rapid.axes_values.get(Axis::X), Some(10.0));
            assert_eq!(rapid.axes_values.get(Axis::Y), Some(20.0));
            assert_eq!(rapid.position_mode, None);
            assert_eq!(rapid.coordinate_system, None);
        }
        other => panic!("expected a rapid step, got {:?}", other),
    }
}

#[test]
fn test_invalid_probe_line_does_not_abort() {
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 X5 Y5 F50\n\
         \n\
         G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Y-10 F100\n\
         G10 L20 P1 Y0.5\n\
         G0 G91 Y1\n",
    );

    assert_eq!(program.errors.len(), 1);
    let message = program.errors[0].to_string();
    assert!(message.contains("Line 4"), "got: {}", message);
    assert!(message.contains("exactly one axis"), "got: {}", message);

    // The malformed line opened no probe; the later valid one is intact.
    assert_eq!(program.probe_sequence.len(), 1);
    assert_eq!(program.probe_sequence[0].axis, Axis::Y);
}

#[test]
fn test_probe_with_no_axis_is_an_error() {
    let program = parse_gcode("G38.2 F100\n");
    assert_eq!(program.errors.len(), 1);
    assert_eq!(program.errors[0].line_number(), 1);
    assert!(program.probe_sequence.is_empty());
}

#[test]
fn test_header_fields_keep_first_value() {
    let program = parse_gcode(
        "G20\n\
         G21\n\
         S5000 M4\n\
         S300 M4\n",
    );
    assert_eq!(program.units, Some(Units::Inch));
    assert_eq!(program.spindle_speed, Some(5000.0));
}

#[test]
fn test_buffer_block_separates_probes() {
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Z-5 F50\n\
         G10 L20 P1 Z0\n\
         G0 G91 Z2\n\
         G0 G91 Z10 (retract high)\n\
         \n\
         G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Y-10 F100\n\
         G10 L20 P1 Y0\n\
         G0 G91 Y1\n",
    );

    assert_eq!(program.probe_sequence.len(), 2);

    let first = &program.probe_sequence[0];
    assert_eq!(first.backoff_distance, 2.0);
    assert_eq!(first.post_moves.len(), 1);
    assert_eq!(first.post_moves[0].description(), "retract high");

    let second = &program.probe_sequence[1];
    assert_eq!(second.axis, Axis::Y);
    assert!(second.pre_moves.is_empty());
    assert!(second.post_moves.is_empty());
}

#[test]
fn test_new_probe_closes_the_open_one() {
    // No boundary block between the two probes: the first is finalized
    // when the second opens.
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 X5 F50\n\
         G10 L20 P1 X0\n\
         G0 G91 X1\n\
         G38.2 Y5 F50\n",
    );

    assert_eq!(program.probe_sequence.len(), 2);
    assert_eq!(program.probe_sequence[0].axis, Axis::X);
    assert!(program.probe_sequence[0].post_moves.is_empty());
    assert_eq!(program.probe_sequence[1].axis, Axis::Y);
    assert_eq!(
        program.probe_sequence[1].backoff_distance,
        DEFAULT_BACKOFF_DISTANCE
    );
}

#[test]
fn test_missing_feed_rate_defaults() {
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Y-10\n",
    );
    assert_eq!(program.probe_sequence[0].feed_rate, DEFAULT_FEED_RATE);
}

#[test]
fn test_commands_are_case_insensitive() {
    let program = parse_gcode(
        "g21\n\
         g4 p0.01\n\
         g4 p0.01\n\
         \n\
         g38.2 y-10 f100\n\
         g10 l20 p1 y1.5875\n\
         g0 g91 y1\n",
    );
    assert_eq!(program.units, Some(Units::Mm));
    assert_eq!(program.probe_sequence.len(), 1);
    assert_eq!(program.probe_sequence[0].wcs_offset, 1.5875);
}

#[test]
fn test_unrecognized_commands_are_not_errors() {
    let program = parse_gcode(
        "M30\n\
         G17\n\
         T1 M6\n\
         (a lone comment)\n",
    );
    assert!(program.errors.is_empty());
    assert!(program.probe_sequence.is_empty());
    assert!(program.units.is_none());
}

#[test]
fn test_empty_input() {
    let program = parse_gcode("");
    assert!(program.probe_sequence.is_empty());
    assert!(program.initial_position.is_none());
    assert!(program.dwells_before_probe.is_none());
    assert!(program.spindle_speed.is_none());
    assert!(program.units.is_none());
    assert!(program.errors.is_empty());
}

#[test]
fn test_diagnostics_serialize_as_display_strings() {
    let program = parse_gcode("G38.2 F100\n");
    let json = serde_json::to_value(&program).unwrap();
    let rendered = json["errors"][0].as_str().expect("string diagnostic");
    assert!(rendered.starts_with("Line 1:"));
}

#[test]
fn test_wcs_offset_is_absolute() {
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Z-5 F50\n\
         G10 L20 P1 Z-3.2\n\
         G0 G91 Z1\n",
    );
    assert_eq!(program.probe_sequence[0].wcs_offset, 3.2);
}

#[test]
fn test_wcs_line_for_other_axis_is_ignored() {
    // The offset line names X while the probe runs on Z; no offset is
    // taken and no backoff is expected, so the Z rapid is a post-move.
    let program = parse_gcode(
        "G4 P0.01\n\
         G4 P0.01\n\
         \n\
         G38.2 Z-5 F50\n\
         G10 L20 P1 X2\n\
         G0 G91 Z1\n",
    );
    let probe = &program.probe_sequence[0];
    assert_eq!(probe.wcs_offset, 0.0);
    assert_eq!(probe.backoff_distance, DEFAULT_BACKOFF_DISTANCE);
    assert_eq!(probe.post_moves.len(), 1);
}
