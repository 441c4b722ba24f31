//! Probe-sequence G-code parser
//!
//! Stateful line-by-line scanner that reconstructs a probe sequence from a
//! flat instruction stream. The interesting work is inference: the
//! generator writes structure explicitly, but on the way back in the parser
//! has to recognize buffer-clear dwell blocks as probe boundaries, swallow
//! the automatic backoff rapid so it does not resurface as a post-move,
//! separate machine setup from user moves, and fall back to synthesized
//! descriptions when comments are missing.
//!
//! The parser never fails for malformed input. Problems are accumulated as
//! [`ParseDiagnostic`]s and scanning continues with the next line, so a
//! partially broken program still imports whatever could be reconstructed.
//!
//! Structure boundaries hinge on one content-sensitive heuristic: the first
//! buffer-clear block (a run of two or more consecutive `G4 P0.01` lines)
//! ends the program header, and every later block separates two probes.
//! This is deliberately not a fixed line count; real files vary in header
//! length.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use probekit_core::{
    new_id, Axis, AxisValues, CoordinateSystem, DwellMove, MachinePosition, MovementStep,
    PositionMode, ProbeDirection, ProbeOperation, RapidMove, Units,
};

use crate::error::ParseDiagnostic;
use crate::words::{axis_words, clean_line, fmt_num, has_code, trailing_comment, word_value};

/// Feed rate assumed when a probe command carries no F word
pub const DEFAULT_FEED_RATE: f64 = 10.0;

/// Backoff distance assumed until the automatic backoff rapid is seen
pub const DEFAULT_BACKOFF_DISTANCE: f64 = 1.0;

/// Dwell time that marks a buffer-clearing no-op dwell
const BUFFER_DWELL_SECONDS: f64 = 0.01;

/// Result of parsing a G-code program
///
/// Header metadata fields are present only when the corresponding line was
/// found. `errors` is always present, possibly empty; a parse with errors
/// still returns every operation that could be reconstructed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProbeProgram {
    /// Reconstructed probe operations, in program order
    pub probe_sequence: Vec<ProbeOperation>,
    /// Starting point, when any G90 G53 rapid preceded the first buffer block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_position: Option<MachinePosition>,
    /// Length of the first buffer-clear block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwells_before_probe: Option<u32>,
    /// Spindle speed from the first `S<n> M4` line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spindle_speed: Option<f64>,
    /// Unit system from the first G20/G21 line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,
    /// Non-fatal diagnostics, in source order
    pub errors: Vec<ParseDiagnostic>,
}

/// Parse a G-code program into a probe sequence
pub fn parse_gcode(text: &str) -> ParsedProbeProgram {
    let lines: Vec<SourceLine> = text
        .lines()
        .enumerate()
        .map(|(index, raw)| SourceLine {
            number: index + 1,
            raw,
            cleaned: clean_line(raw),
        })
        .collect();

    let blocks = detect_buffer_blocks(&lines);

    let mut parser = Parser::default();
    for (index, line) in lines.iter().enumerate() {
        if line.cleaned.is_empty() {
            continue;
        }
        if let Some(len) = blocks.starts.get(&index) {
            parser.on_buffer_block(*len);
        }
        if blocks.members.contains(&index) {
            continue;
        }
        if let Err(diagnostic) = parser.dispatch(line) {
            tracing::warn!(line = line.number, "{}", diagnostic);
            parser.errors.push(diagnostic);
        }
    }
    parser.finish()
}

struct SourceLine<'a> {
    /// 1-based source line number
    number: usize,
    raw: &'a str,
    /// Comment-stripped, trimmed, uppercased form
    cleaned: String,
}

/// Buffer-clear blocks found by the pre-pass
///
/// A block is a maximal run of two or more consecutive significant lines
/// each being a `G4 P0.01` dwell; blank and comment-only lines do not break
/// a run. Member lines are skipped entirely during the main pass, so they
/// are never recorded as user-authored dwell steps. A single isolated
/// `G4 P0.01` is not a block and parses as an ordinary dwell.
#[derive(Default)]
struct BufferBlocks {
    /// Starting line index of each block, mapped to the block length
    starts: HashMap<usize, u32>,
    /// Every line index that belongs to a block
    members: HashSet<usize>,
}

fn is_buffer_dwell(cleaned: &str) -> bool {
    has_code(cleaned, "G4") && word_value(cleaned, 'P') == Some(BUFFER_DWELL_SECONDS)
}

fn detect_buffer_blocks(lines: &[SourceLine]) -> BufferBlocks {
    let mut blocks = BufferBlocks::default();
    let mut run: Vec<usize> = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if line.cleaned.is_empty() {
            continue;
        }
        if is_buffer_dwell(&line.cleaned) {
            run.push(index);
        } else {
            flush_run(&mut run, &mut blocks);
        }
    }
    flush_run(&mut run, &mut blocks);
    blocks
}

fn flush_run(run: &mut Vec<usize>, blocks: &mut BufferBlocks) {
    if run.len() >= 2 {
        blocks.starts.insert(run[0], run.len() as u32);
        blocks.members.extend(run.iter().copied());
    }
    run.clear();
}

/// Line classification, first match wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Units,
    Spindle,
    Probe,
    WcsSet,
    Rapid,
    Dwell,
    Other,
}

fn classify(cleaned: &str) -> LineClass {
    if has_code(cleaned, "G20") || has_code(cleaned, "G21") {
        LineClass::Units
    } else if has_code(cleaned, "M4") && word_value(cleaned, 'S').is_some() {
        LineClass::Spindle
    } else if has_code(cleaned, "G38.2") {
        LineClass::Probe
    } else if has_code(cleaned, "G10") && has_code(cleaned, "L20") && has_code(cleaned, "P1") {
        LineClass::WcsSet
    } else if has_code(cleaned, "G0") {
        LineClass::Rapid
    } else if has_code(cleaned, "G4") {
        LineClass::Dwell
    } else {
        LineClass::Other
    }
}

/// Parser state carried across lines
#[derive(Default)]
struct Parser {
    probe_sequence: Vec<ProbeOperation>,
    current_probe: Option<ProbeOperation>,
    /// Moves accumulated since the last probe-boundary event, not yet
    /// attached to any operation
    pending_moves: Vec<MovementStep>,
    /// Everything before the first buffer block is header/setup
    has_seen_first_buffer_block: bool,
    /// Set right after a WCS-offset line so the automatic backoff rapid is
    /// recognized and swallowed
    expecting_backoff_move: bool,
    /// Whether any line so far carried a G53 or M4 setup token
    saw_machine_setup: bool,
    initial_x: Option<f64>,
    initial_y: Option<f64>,
    initial_z: Option<f64>,
    dwells_before_probe: Option<u32>,
    spindle_speed: Option<f64>,
    units: Option<Units>,
    errors: Vec<ParseDiagnostic>,
}

impl Parser {
    /// React to a buffer-clear block starting at the current line
    fn on_buffer_block(&mut self, length: u32) {
        if !self.has_seen_first_buffer_block {
            self.has_seen_first_buffer_block = true;
            self.dwells_before_probe = Some(length);
            if self.saw_machine_setup {
                // Moves before the first block with G53/M4 in play are
                // machine setup, not probe pre-moves.
                self.pending_moves.clear();
            }
        } else {
            // A later block is a probe-to-probe boundary.
            self.finalize_current();
        }
    }

    fn dispatch(&mut self, line: &SourceLine) -> Result<(), ParseDiagnostic> {
        let cleaned = line.cleaned.as_str();
        if has_code(cleaned, "G53") || has_code(cleaned, "M4") {
            self.saw_machine_setup = true;
        }
        match classify(cleaned) {
            LineClass::Units => self.on_units(cleaned),
            LineClass::Spindle => self.on_spindle(cleaned),
            LineClass::Probe => self.on_probe(line)?,
            LineClass::WcsSet => self.on_wcs(cleaned),
            LineClass::Rapid => self.on_rapid(line),
            LineClass::Dwell => self.on_dwell(line),
            // Unrecognized commands are ignored, not errors.
            LineClass::Other => {}
        }
        Ok(())
    }

    fn on_units(&mut self, cleaned: &str) {
        if self.units.is_none() {
            self.units = Some(if has_code(cleaned, "G20") {
                Units::Inch
            } else {
                Units::Mm
            });
        }
    }

    fn on_spindle(&mut self, cleaned: &str) {
        if self.spindle_speed.is_none() {
            self.spindle_speed = word_value(cleaned, 'S');
        }
    }

    fn on_probe(&mut self, line: &SourceLine) -> Result<(), ParseDiagnostic> {
        let pairs = axis_words(&line.cleaned);
        if pairs.len() != 1 {
            return Err(ParseDiagnostic::InvalidProbeCommand {
                line_number: line.number,
                line: line.raw.trim().to_string(),
            });
        }

        // A new probe while one is still open acts as its boundary: the
        // open probe keeps the accumulated moves as post-moves.
        if self.current_probe.is_some() {
            self.finalize_current();
        }

        let (axis, value) = pairs[0];
        let feed_rate = match word_value(&line.cleaned, 'F') {
            Some(feed) => feed,
            None => {
                tracing::debug!(
                    line = line.number,
                    "probe command has no feed rate, assuming {}",
                    DEFAULT_FEED_RATE
                );
                DEFAULT_FEED_RATE
            }
        };
        self.current_probe = Some(ProbeOperation {
            id: new_id(),
            axis,
            direction: ProbeDirection::from_value(value),
            distance: value.abs(),
            feed_rate,
            backoff_distance: DEFAULT_BACKOFF_DISTANCE,
            wcs_offset: 0.0,
            pre_moves: std::mem::take(&mut self.pending_moves),
            post_moves: Vec::new(),
        });
        Ok(())
    }

    fn on_wcs(&mut self, cleaned: &str) {
        // Only meaningful while a probe is open.
        if let Some(probe) = self.current_probe.as_mut() {
            let offset = axis_words(cleaned)
                .into_iter()
                .find(|(axis, _)| *axis == probe.axis)
                .map(|(_, value)| value);
            if let Some(offset) = offset {
                probe.wcs_offset = offset.abs();
                self.expecting_backoff_move = true;
            }
        }
    }

    fn on_rapid(&mut self, line: &SourceLine) {
        let pairs = axis_words(&line.cleaned);
        if pairs.is_empty() {
            return;
        }
        let cleaned = line.cleaned.as_str();
        let has_g90 = has_code(cleaned, "G90");
        let has_g91 = has_code(cleaned, "G91");
        let has_g53 = has_code(cleaned, "G53");
        let has_g54 = has_code(cleaned, "G54");

        // Initial positioning: absolute machine-coordinate rapids before
        // the first buffer block describe the starting point, not a move.
        if !self.has_seen_first_buffer_block && has_g90 && has_g53 {
            for (axis, value) in pairs {
                let slot = match axis {
                    Axis::X => &mut self.initial_x,
                    Axis::Y => &mut self.initial_y,
                    Axis::Z => &mut self.initial_z,
                };
                if slot.is_none() {
                    *slot = Some(value);
                }
            }
            return;
        }

        // The automatic backoff rapid right after a WCS-offset line is
        // synthetic generator output; record its magnitude and swallow it.
        if self.expecting_backoff_move && has_g91 && pairs.len() == 1 {
            if let Some(probe) = self.current_probe.as_mut() {
                if pairs[0].0 == probe.axis {
                    probe.backoff_distance = pairs[0].1.abs();
                    self.expecting_backoff_move = false;
                    return;
                }
            }
        }

        // Same reasoning for the canonical return-to-origin footer: the
        // generator always emits it, so it must not come back as a
        // post-move of the last probe.
        if self.has_seen_first_buffer_block
            && has_g90
            && has_g54
            && pairs == [(Axis::X, 0.0), (Axis::Y, 0.0)]
        {
            self.expecting_backoff_move = false;
            return;
        }

        let description = trailing_comment(line.raw).unwrap_or_else(|| {
            let words: Vec<String> = pairs
                .iter()
                .map(|(axis, value)| format!("{}{}", axis, fmt_num(*value)))
                .collect();
            format!("Rapid move to {}", words.join(" "))
        });
        let axes_values: AxisValues = pairs.into_iter().collect();
        let position_mode = if has_g91 {
            Some(PositionMode::Relative)
        } else if has_g90 {
            Some(PositionMode::Absolute)
        } else {
            None
        };
        let coordinate_system = if has_g53 {
            Some(CoordinateSystem::Machine)
        } else if has_g54 {
            Some(CoordinateSystem::Work)
        } else {
            None
        };
        self.pending_moves.push(MovementStep::Rapid(RapidMove {
            id: new_id(),
            description,
            axes_values,
            position_mode,
            coordinate_system,
        }));
        // Any rapid that is not the backoff cancels the expectation.
        self.expecting_backoff_move = false;
    }

    fn on_dwell(&mut self, line: &SourceLine) {
        let Some(seconds) = word_value(&line.cleaned, 'P') else {
            return;
        };
        let description = trailing_comment(line.raw)
            .unwrap_or_else(|| format!("Dwell for {} seconds", fmt_num(seconds)));
        self.pending_moves.push(MovementStep::Dwell(DwellMove {
            id: new_id(),
            description,
            dwell_time: seconds,
        }));
    }

    /// Close the open probe, attaching pending moves as its post-moves
    fn finalize_current(&mut self) {
        if let Some(mut probe) = self.current_probe.take() {
            probe.post_moves = std::mem::take(&mut self.pending_moves);
            self.probe_sequence.push(probe);
            self.expecting_backoff_move = false;
        }
    }

    fn finish(mut self) -> ParsedProbeProgram {
        self.finalize_current();
        let initial_position =
            if self.initial_x.is_some() || self.initial_y.is_some() || self.initial_z.is_some() {
                Some(MachinePosition::new(
                    self.initial_x.unwrap_or(0.0),
                    self.initial_y.unwrap_or(0.0),
                    self.initial_z.unwrap_or(0.0),
                ))
            } else {
                None
            };
        tracing::debug!(
            probes = self.probe_sequence.len(),
            errors = self.errors.len(),
            "parsed probe program"
        );
        ParsedProbeProgram {
            probe_sequence: self.probe_sequence,
            initial_position,
            dwells_before_probe: self.dwells_before_probe,
            spindle_speed: self.spindle_speed,
            units: self.units,
            errors: self.errors,
        }
    }
}
