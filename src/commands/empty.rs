//! Empty-check command implementation

use std::error::Error;

use fuseprog_core::chip::ChipProfile;
use fuseprog_core::context::PromContext;
use fuseprog_core::ops;
use fuseprog_core::programmer::{PromBus, Timing};

/// Run the empty check
///
/// Succeeds when every masked cell reads the chip's unburned value.
pub fn run<P: PromBus + Timing>(
    prog: &mut P,
    profile: ChipProfile,
) -> Result<(), Box<dyn Error>> {
    let mut ctx = PromContext::new();
    ctx.select(profile);

    ops::check_empty(prog, &mut ctx)?;
    println!("Empty");
    Ok(())
}
