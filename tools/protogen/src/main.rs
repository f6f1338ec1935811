//! Regenerates the committed protocol code under src/proto/generated/.
//!
//! Run via scripts/regenerate-protos.sh whenever proto/ changes.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        .build_server(false)
        .out_dir("../../src/proto/generated")
        .compile_protos(&["../../proto/uplink.proto"], &["../../proto"])?;

    Ok(())
}
