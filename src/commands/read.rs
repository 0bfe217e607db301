//! Read command implementation

use std::error::Error;
use std::fs;
use std::path::Path;

use fuseprog_core::chip::ChipProfile;
use fuseprog_core::context::PromContext;
use fuseprog_core::ops;
use fuseprog_core::programmer::{PromBus, Timing};

/// Run the read command
///
/// Dumps to stdout as hex, or writes the raw masked cells to `output`.
pub fn run<P: PromBus + Timing>(
    prog: &mut P,
    profile: ChipProfile,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut ctx = PromContext::new();
    ctx.select(profile);

    ops::read(prog, &mut ctx)?;

    match output {
        Some(path) => {
            fs::write(path, &ctx.read_data()[..profile.cell_count])?;
            println!(
                "Read {} cells from {} to {}",
                profile.cell_count,
                profile.name,
                path.display()
            );
        }
        None => print!("{}", ctx.dump_read()?),
    }

    Ok(())
}
