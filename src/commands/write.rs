//! Write command implementation

use std::error::Error;
use std::fs;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use fuseprog_core::chip::ChipProfile;
use fuseprog_core::context::PromContext;
use fuseprog_core::ops;
use fuseprog_core::programmer::{BurnProgress, PromBus, Timing};

/// Progress reporter using an indicatif progress bar
///
/// One tick per address; the per-bit pulses show up in the message slot.
struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    fn new(cell_count: usize) -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(cell_count as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}

impl BurnProgress for IndicatifProgress {
    fn address_start(&mut self, address: usize) {
        self.bar.set_position(address as u64);
    }

    fn bit_start(&mut self, address: usize, bit: u8) {
        self.bar
            .set_message(format!("burning bit {} at {:02X}", bit, address));
    }
}

/// Run the write command
///
/// Loads a raw image into the write buffer, burns it, and relies on the
/// engine's built-in end-to-end verify. A burn failure aborts immediately;
/// cells burned before the failure stay burned.
pub fn run<P: PromBus + Timing>(
    prog: &mut P,
    profile: ChipProfile,
    input: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut ctx = PromContext::new();
    ctx.select(profile);

    let image = fs::read(input)?;
    println!("Read {} bytes from {}", image.len(), input.display());
    if image.len() < profile.cell_count {
        println!(
            "Padding image from {} to {} cells with 00",
            image.len(),
            profile.cell_count
        );
    }
    ctx.load(&image).map_err(|_| {
        format!(
            "Image size ({} bytes) exceeds chip size ({} cells)",
            image.len(),
            profile.cell_count
        )
    })?;

    let mut progress = IndicatifProgress::new(profile.cell_count)?;
    match ops::burn(prog, &mut ctx, &mut progress) {
        Ok(()) => {
            progress.finish("burn complete");
            println!("Write complete, verify passed");
            Ok(())
        }
        Err(e) => {
            progress.abandon("burn aborted");
            Err(e.into())
        }
    }
}
