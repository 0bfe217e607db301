//! Error types for fuseprog-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
///
/// None of these are fatal to the enclosing command loop: a failed
/// operation reports and returns control. Cells burned before a
/// [`Error::BurnFailure`] stay burned; the hardware action cannot be
/// rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No chip profile is selected; the operation needs one
    NoChipSelected,
    /// An address reached the selected chip's cell count
    AddressOutOfRange,
    /// A data entry token was not a hexadecimal byte in `0..=255`
    ParseError,
    /// Chip contents differ from the write buffer (first mismatch only)
    VerifyMismatch {
        /// Address of the first mismatching cell
        address: usize,
        /// Masked value read from the chip
        found: u8,
        /// Masked value expected from the write buffer
        expected: u8,
    },
    /// A cell is not in the unburned state (first offender only)
    NotEmpty {
        /// Address of the first non-empty cell
        address: usize,
        /// Masked value read from the chip
        found: u8,
    },
    /// A fuse bit did not read back "on" after its programming pulse;
    /// the write was aborted at this bit
    BurnFailure {
        /// Address of the cell whose bit refused to burn
        address: usize,
        /// Bit position (0..8) that failed
        bit: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The next two strings are part of the data entry protocol;
            // keep them stable.
            Self::AddressOutOfRange => write!(f, "Too big address"),
            Self::ParseError => write!(f, "Incorrect number"),
            Self::NoChipSelected => write!(f, "Chip not selected"),
            Self::VerifyMismatch {
                address,
                found,
                expected,
            } => write!(
                f,
                "Verify failed. {:02X} != {:02X} at {:02X}.",
                found, expected, address
            ),
            Self::NotEmpty { address, found } => {
                write!(f, "Not empty. {:02X} at {:02X}", found, address)
            }
            Self::BurnFailure { address, bit } => {
                write!(f, "Burn failed at address {:02X}, bit {}", address, bit)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
