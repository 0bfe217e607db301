//! fuseprog - A fuse-link PROM programmer
//!
//! Burns and dumps the one-time-programmable bipolar PROMs K155RE3
//! (32 x 8) and K556RT4 (256 x 4) through a programmer adapter.
//!
//! # Architecture
//!
//! The engine lives in `fuseprog-core` and talks to hardware through the
//! `PromBus`/`Timing` traits. Programmer backends implement those traits:
//! the in-memory `dummy` emulator here on the host, the STM32 adapter
//! board in the on-target firmware (see `firmware/`). The same command
//! implementations work against either.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use fuseprog_core::chip;

/// Open the named programmer and run `$body` with the concrete backend
///
/// `Timing::critical` is generic over its closure and therefore not
/// object-safe, so backends are dispatched by enum variant instead of
/// through a boxed trait object.
macro_rules! with_programmer {
    ($spec:expr, |$prog:ident| $body:expr) => {
        match programmers::open($spec)? {
            #[cfg(feature = "dummy")]
            programmers::Programmer::Dummy(mut $prog) => $body,
        }
    };
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Console { programmer } => {
            with_programmer!(&programmer, |prog| commands::console::run(&mut prog))
        }
        Commands::Read {
            programmer,
            chip,
            output,
        } => {
            let profile = lookup_chip(&chip)?;
            with_programmer!(&programmer, |prog| commands::read::run(
                &mut prog,
                profile,
                output.as_deref()
            ))
        }
        Commands::Write {
            programmer,
            chip,
            input,
        } => {
            let profile = lookup_chip(&chip)?;
            with_programmer!(&programmer, |prog| commands::write::run(
                &mut prog,
                profile,
                &input
            ))
        }
        Commands::Verify {
            programmer,
            chip,
            input,
        } => {
            let profile = lookup_chip(&chip)?;
            with_programmer!(&programmer, |prog| commands::verify::run(
                &mut prog,
                profile,
                &input
            ))
        }
        Commands::Empty { programmer, chip } => {
            let profile = lookup_chip(&chip)?;
            with_programmer!(&programmer, |prog| commands::empty::run(&mut prog, profile))
        }
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Resolve a chip family name or fail with the supported list
fn lookup_chip(name: &str) -> Result<chip::ChipProfile, Box<dyn std::error::Error>> {
    chip::find_by_name(name).ok_or_else(|| {
        let names: Vec<&str> = chip::PROFILES.iter().map(|p| p.name).collect();
        format!("Unknown chip '{}' (supported: {})", name, names.join(", ")).into()
    })
}
