//! Verify command implementation

use std::error::Error;
use std::fs;
use std::path::Path;

use fuseprog_core::chip::ChipProfile;
use fuseprog_core::context::PromContext;
use fuseprog_core::ops;
use fuseprog_core::programmer::{PromBus, Timing};

/// Run the verify command
///
/// Compares chip contents against an expected image; the first mismatch is
/// reported with both masked values.
pub fn run<P: PromBus + Timing>(
    prog: &mut P,
    profile: ChipProfile,
    input: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut ctx = PromContext::new();
    ctx.select(profile);

    let image = fs::read(input)?;
    ctx.load(&image).map_err(|_| {
        format!(
            "Image size ({} bytes) exceeds chip size ({} cells)",
            image.len(),
            profile.cell_count
        )
    })?;

    ops::verify(prog, &mut ctx)?;
    println!("Verify done");
    Ok(())
}
