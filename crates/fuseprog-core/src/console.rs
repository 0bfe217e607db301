//! Console command set
//!
//! The interactive console (host CLI or on-target firmware) dispatches a
//! closed set of named commands plus the free-form `ADDR: B B B...` entry
//! line handled by [`crate::context::PromContext::enter`]. The table here
//! carries the names and help strings; executing a command and formatting
//! its outcome stay with the caller, which owns the output channel.

/// One console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select the K155RE3 profile
    SelectRe3,
    /// Select the K556RT4 profile
    SelectRt4,
    /// Reset the write buffer
    Clear,
    /// Dump the write buffer
    Print,
    /// Read the chip and dump the read buffer
    Read,
    /// Compare chip contents against the write buffer
    Verify,
    /// Check the chip is empty
    Empty,
    /// Burn the write buffer into the chip
    Write,
}

/// Name and help line for one command
pub struct CommandSpec {
    /// Command name as typed at the console
    pub name: &'static str,
    /// One-line help text
    pub help: &'static str,
    /// The command itself
    pub command: Command,
}

/// Entry-line usage shown at the top of the help listing
pub const ENTRY_USAGE: &str = "ADDR: BYTE BYTE BYTE...";

/// Entry-line help text
pub const ENTRY_HELP: &str = "Enter data for write or verify";

/// Every named command, in help-listing order
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "re3",
        help: "Select K155RE3 chip",
        command: Command::SelectRe3,
    },
    CommandSpec {
        name: "rt4",
        help: "Select K556RT4 chip",
        command: Command::SelectRt4,
    },
    CommandSpec {
        name: "clear",
        help: "Clear data (fill with 00)",
        command: Command::Clear,
    },
    CommandSpec {
        name: "print",
        help: "Print data",
        command: Command::Print,
    },
    CommandSpec {
        name: "read",
        help: "Read data from chip",
        command: Command::Read,
    },
    CommandSpec {
        name: "verify",
        help: "Compare chip with data",
        command: Command::Verify,
    },
    CommandSpec {
        name: "empty",
        help: "Check chip empty",
        command: Command::Empty,
    },
    CommandSpec {
        name: "write",
        help: "Write data to chip",
        command: Command::Write,
    },
];

/// Outcome of matching one console line against the command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed<'a> {
    /// A known command; none of them take arguments
    Command(Command),
    /// A known command followed by trailing text, which is rejected
    ExtraArguments(Command),
    /// Not a known command; may still be an entry line
    Unknown(&'a str),
}

/// Match a trimmed console line against the command table
///
/// A command name must be followed by end-of-line or whitespace; trailing
/// non-space text after the name is reported rather than ignored.
pub fn parse(line: &str) -> Parsed<'_> {
    for spec in COMMANDS {
        if let Some(rest) = strip_name(line, spec.name) {
            if rest.is_empty() {
                return Parsed::Command(spec.command);
            }
            return Parsed::ExtraArguments(spec.command);
        }
    }
    Parsed::Unknown(line)
}

/// Strip a command name followed by end or whitespace; returns the
/// remainder with leading spaces removed
fn strip_name<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if rest.is_empty() {
        return Some(rest);
    }
    if !rest.starts_with(' ') {
        return None;
    }
    Some(rest.trim_start_matches(' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse("read"), Parsed::Command(Command::Read));
        assert_eq!(parse("re3"), Parsed::Command(Command::SelectRe3));
        assert_eq!(parse("write"), Parsed::Command(Command::Write));
    }

    #[test]
    fn trailing_text_is_rejected_not_ignored() {
        assert_eq!(
            parse("read now"),
            Parsed::ExtraArguments(Command::Read)
        );
        // Trailing spaces alone are fine.
        assert_eq!(parse("read   "), Parsed::Command(Command::Read));
    }

    #[test]
    fn prefixes_do_not_match() {
        // "re3x" must not dispatch as "re3".
        assert_eq!(parse("re3x"), Parsed::Unknown("re3x"));
        assert_eq!(parse("rea"), Parsed::Unknown("rea"));
    }

    #[test]
    fn entry_lines_stay_unknown_here() {
        assert_eq!(parse("05: AA BB"), Parsed::Unknown("05: AA BB"));
    }
}
