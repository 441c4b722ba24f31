//! # ProbeKit
//!
//! Designer core and G-code translator for CNC touch-probe sequences.
//!
//! ProbeKit is organized as a workspace:
//!
//! 1. **probekit-core** - probe sequence data model, units, validation
//! 2. **probekit-gcode** - G-code generation and parsing
//! 3. **probekit** - CLI binary for translating between the two forms
//!
//! The UI layers that edit sequences and visualize probe paths consume
//! these crates as plain data; nothing here renders or persists.

pub use probekit_core::{
    validate_sequence, Axis, AxisValues, CoordinateSystem, DwellMove, MachinePosition, ModelError,
    MovementStep, PositionMode, ProbeDirection, ProbeOperation, ProbeSequenceSettings, RapidMove,
    Units,
};
pub use probekit_gcode::{generate_gcode, parse_gcode, ParseDiagnostic, ParsedProbeProgram};

/// Initialize global tracing with an environment-driven filter
///
/// Defaults to `info`; override with `RUST_LOG` (e.g.
/// `RUST_LOG=probekit_gcode=debug`). Logs go to stderr so generated
/// G-code on stdout stays clean.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    Ok(())
}
