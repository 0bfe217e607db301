//! Interactive programmer console
//!
//! The same command set the adapter firmware exposes over its serial
//! console, run on the host against any programmer backend: chip
//! selection, `ADDR: B B B...` data entry, buffer dump, read, verify,
//! empty check and write. The host console additionally understands
//! `help` and `quit`; line editing belongs to the terminal.

use std::error::Error;
use std::io::{self, BufRead, Write as _};

use fuseprog_core::chip;
use fuseprog_core::console::{self, Command, Parsed};
use fuseprog_core::context::PromContext;
use fuseprog_core::ops;
use fuseprog_core::programmer::{BurnProgress, PromBus, Timing};

/// Per-pulse console messages, as the original firmware printed them
struct ConsoleProgress;

impl BurnProgress for ConsoleProgress {
    fn bit_start(&mut self, address: usize, bit: u8) {
        println!("Burn {} bit to address {}", bit, address);
    }
}

/// Run the interactive console until `quit` or end of input
pub fn run<P: PromBus + Timing>(prog: &mut P) -> Result<(), Box<dyn Error>> {
    println!("K155RE3 and K556RT4 programmer");
    println!("Type 'help' for commands, 'quit' to leave");

    let mut ctx = PromContext::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "help" {
            print_help();
            continue;
        }

        match console::parse(line) {
            Parsed::Command(command) => execute(prog, &mut ctx, command),
            Parsed::ExtraArguments(_) => println!("Extra characters at the end"),
            Parsed::Unknown(rest) => match ctx.enter(rest) {
                Some(Ok(())) => {}
                Some(Err(e)) => println!("{}", e),
                None => {
                    println!("Unknown command");
                    print_help();
                }
            },
        }
    }

    Ok(())
}

fn execute<P: PromBus + Timing>(prog: &mut P, ctx: &mut PromContext, command: Command) {
    match command {
        Command::SelectRe3 => ctx.select(chip::K155RE3),
        Command::SelectRt4 => ctx.select(chip::K556RT4),
        Command::Clear => ctx.clear(),
        Command::Print => match ctx.dump_write() {
            Ok(dump) => print!("{}", dump),
            Err(e) => println!("{}", e),
        },
        Command::Read => match ops::read(prog, ctx) {
            Ok(()) => match ctx.dump_read() {
                Ok(dump) => print!("{}", dump),
                Err(e) => println!("{}", e),
            },
            Err(e) => println!("{}", e),
        },
        Command::Verify => report(ops::verify(prog, ctx), "Verify done"),
        Command::Empty => report(ops::check_empty(prog, ctx), "Empty"),
        // The burn runs its own end-to-end verify before reporting.
        Command::Write => report(ops::burn(prog, ctx, &mut ConsoleProgress), "Verify done"),
    }
}

fn report(result: fuseprog_core::Result<()>, success: &str) {
    match result {
        Ok(()) => println!("{}", success),
        Err(e) => println!("{}", e),
    }
}

fn print_help() {
    println!("Help:");
    println!(
        "{}\t - {}",
        console::ENTRY_USAGE,
        console::ENTRY_HELP
    );
    for spec in console::COMMANDS {
        println!("{}\t - {}", spec.name, spec.help);
    }
    println!("quit\t - Leave the console");
}
