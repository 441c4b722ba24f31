//! # ProbeKit G-code
//!
//! Bidirectional translator between the probe-sequence data model of
//! `probekit-core` and the probing G-code dialect spoken by the sequence
//! designer:
//!
//! - [`generate_gcode`] serializes a sequence into its canonical,
//!   fully-commented textual form.
//! - [`parse_gcode`] reconstructs a sequence from G-code text, including
//!   hand-edited or foreign programs with inconsistent commenting, and
//!   reports problems as non-fatal diagnostics instead of failing.
//!
//! The two directions are deliberately not mirror images. The generator
//! always emits explicit structure (buffer-clear dwell blocks before each
//! probe, an automatic backoff rapid after each contact, descriptions as
//! trailing comments); the parser has to infer that structure back out of a
//! flat instruction stream.

pub mod error;
pub mod generator;
pub mod parser;

mod words;

pub use error::ParseDiagnostic;
pub use generator::generate_gcode;
pub use parser::{parse_gcode, ParsedProbeProgram, DEFAULT_BACKOFF_DISTANCE, DEFAULT_FEED_RATE};
