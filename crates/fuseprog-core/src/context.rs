//! Programming session state: chip selection and data buffers
//!
//! [`PromContext`] is the single owned home of everything mutable between
//! commands: the selected chip profile, the write buffer (target bit
//! patterns to burn) and the read buffer (latest sample from the chip).
//! The engine in [`crate::ops`] drives the bus against this state.

use core::fmt;

use crate::chip::ChipProfile;
use crate::error::{Error, Result};

/// Backing capacity of both buffers; the larger chip family uses all of it
pub const MAX_CELLS: usize = 0x100;

/// Number of cells rendered per hex dump line
const CELLS_PER_LINE: usize = 16;

/// Chip selection plus write/read buffers
///
/// The buffers live for the whole process and are only ever mutated by the
/// entry/clear/load paths and the read/verify/empty/write operations, one
/// whole address at a time.
pub struct PromContext {
    profile: Option<ChipProfile>,
    pub(crate) write_data: [u8; MAX_CELLS],
    pub(crate) read_data: [u8; MAX_CELLS],
}

impl PromContext {
    /// Create a context with no chip selected and zeroed buffers
    pub const fn new() -> Self {
        Self {
            profile: None,
            write_data: [0; MAX_CELLS],
            read_data: [0; MAX_CELLS],
        }
    }

    /// Install a chip profile and reset the write buffer
    ///
    /// The read buffer is left untouched until the next read operation.
    pub fn select(&mut self, profile: ChipProfile) {
        log::debug!(
            "selected {} (mask {:02X}, {} cells)",
            profile.name,
            profile.bit_mask,
            profile.cell_count
        );
        self.profile = Some(profile);
        self.clear();
    }

    /// Reset the write buffer to all-zero bytes
    ///
    /// Unconditional: operates on the fixed-size backing array whether or
    /// not a chip is selected.
    pub fn clear(&mut self) {
        self.write_data = [0; MAX_CELLS];
    }

    /// The selected profile, or `NoChipSelected`
    pub fn profile(&self) -> Result<ChipProfile> {
        self.profile.ok_or(Error::NoChipSelected)
    }

    /// The selected profile, if any
    pub fn selected(&self) -> Option<ChipProfile> {
        self.profile
    }

    /// Target bit patterns to be burned
    pub fn write_data(&self) -> &[u8; MAX_CELLS] {
        &self.write_data
    }

    /// Latest values sampled from the chip
    pub fn read_data(&self) -> &[u8; MAX_CELLS] {
        &self.read_data
    }

    /// Apply a free-form `ADDR: B B B...` entry line to the write buffer
    ///
    /// Returns `None` when the line does not have the `HEXADDR:` prefix
    /// shape at all, so a console can fall through to command parsing.
    /// Otherwise the line is consumed: a selected profile is required, the
    /// address must be inside the chip, and each space-separated token must
    /// be a hexadecimal byte. Bytes are written at consecutive addresses,
    /// auto-incrementing. On error, bytes written before the failing token
    /// remain written.
    pub fn enter(&mut self, line: &str) -> Option<Result<()>> {
        let (address, data) = split_entry(line)?;
        Some(self.enter_at(address, data))
    }

    fn enter_at(&mut self, address: u64, data: &str) -> Result<()> {
        let profile = self.profile()?;

        let mut address = address;
        if address >= profile.cell_count as u64 {
            return Err(Error::AddressOutOfRange);
        }

        for token in data.split_whitespace() {
            let byte = u32::from_str_radix(token, 16).map_err(|_| Error::ParseError)?;
            if byte > u8::MAX as u32 {
                return Err(Error::ParseError);
            }
            if address >= profile.cell_count as u64 {
                return Err(Error::AddressOutOfRange);
            }
            self.write_data[address as usize] = byte as u8;
            address += 1;
        }
        Ok(())
    }

    /// Fill the write buffer from a whole-chip image
    ///
    /// Images larger than the chip are rejected; shorter images are padded
    /// with the cleared value.
    pub fn load(&mut self, image: &[u8]) -> Result<()> {
        let profile = self.profile()?;
        if image.len() > profile.cell_count {
            return Err(Error::AddressOutOfRange);
        }
        self.clear();
        self.write_data[..image.len()].copy_from_slice(image);
        Ok(())
    }

    /// Hex dump of the write buffer under the selected profile
    pub fn dump_write(&self) -> Result<Dump<'_>> {
        Ok(Dump {
            data: &self.write_data,
            profile: self.profile()?,
        })
    }

    /// Hex dump of the read buffer under the selected profile
    pub fn dump_read(&self) -> Result<Dump<'_>> {
        Ok(Dump {
            data: &self.read_data,
            profile: self.profile()?,
        })
    }
}

impl Default for PromContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an entry line into its address and data part
///
/// The address must be a run of hex digits immediately followed by `:`;
/// anything else is not an entry line. The address parses through `u64` so
/// absurdly long addresses still report as out of range rather than as an
/// unknown command.
fn split_entry(line: &str) -> Option<(u64, &str)> {
    let (addr, data) = line.split_once(':')?;
    if addr.is_empty() || !addr.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let address = u64::from_str_radix(addr, 16).unwrap_or(u64::MAX);
    Some((address, data))
}

/// Hex dump display adapter: 16 cells per line, one hex digit per cell for
/// nibble-wide chips, two otherwise
pub struct Dump<'a> {
    data: &'a [u8],
    profile: ChipProfile,
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = self.profile.bit_mask;
        let wide = self.profile.cell_hex_digits() == 2;
        for base in (0..self.profile.cell_count).step_by(CELLS_PER_LINE) {
            write!(f, "{:02X}:", base)?;
            for cell in &self.data[base..(base + CELLS_PER_LINE).min(self.profile.cell_count)] {
                if wide {
                    write!(f, " {:02X}", cell & mask)?;
                } else {
                    write!(f, " {:X}", cell & mask)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::string::ToString;

    use super::*;
    use crate::chip::{K155RE3, K556RT4};

    #[test]
    fn select_installs_profile_and_zero_fills() {
        let mut ctx = PromContext::new();
        assert_eq!(ctx.profile(), Err(Error::NoChipSelected));

        ctx.select(K155RE3);
        let p = ctx.profile().unwrap();
        assert_eq!((p.bit_mask, p.cell_count), (0xFF, 32));

        ctx.write_data[5] = 0xAA;
        ctx.select(K556RT4);
        let p = ctx.profile().unwrap();
        assert_eq!((p.bit_mask, p.cell_count), (0x0F, 256));
        assert!(ctx.write_data.iter().all(|&b| b == 0));
    }

    #[test]
    fn clear_works_without_selection() {
        let mut ctx = PromContext::new();
        ctx.write_data[0] = 0xFF;
        ctx.clear();
        assert_eq!(ctx.write_data[0], 0);
    }

    #[test]
    fn enter_writes_consecutive_bytes() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(ctx.enter("05: aa 0B C"), Some(Ok(())));
        assert_eq!(&ctx.write_data[5..8], &[0xAA, 0x0B, 0x0C]);
        assert_eq!(ctx.write_data[8], 0);
    }

    #[test]
    fn enter_requires_selection_after_prefix() {
        let mut ctx = PromContext::new();
        assert_eq!(ctx.enter("05: AA"), Some(Err(Error::NoChipSelected)));
    }

    #[test]
    fn enter_stops_at_first_bad_token() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(ctx.enter("05: AA ZZ"), Some(Err(Error::ParseError)));
        assert_eq!(ctx.write_data[5], 0xAA);
        assert_eq!(ctx.write_data[6], 0);
    }

    #[test]
    fn enter_rejects_out_of_byte_range_token() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(ctx.enter("00: 100"), Some(Err(Error::ParseError)));
        assert_eq!(ctx.write_data[0], 0);
    }

    #[test]
    fn enter_rejects_address_at_capacity() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(ctx.enter("20: 01"), Some(Err(Error::AddressOutOfRange)));
        // Auto-increment hits the boundary after the first byte lands.
        assert_eq!(ctx.enter("1F: AA BB"), Some(Err(Error::AddressOutOfRange)));
        assert_eq!(ctx.write_data[0x1F], 0xAA);
    }

    #[test]
    fn enter_accepts_empty_data_list() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(ctx.enter("05:"), Some(Ok(())));
    }

    #[test]
    fn non_entry_lines_fall_through() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(ctx.enter("read"), None);
        assert_eq!(ctx.enter("5 : AA"), None);
        assert_eq!(ctx.enter(": AA"), None);
        assert_eq!(ctx.enter("G5: AA"), None);
    }

    #[test]
    fn enter_huge_address_is_out_of_range() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(
            ctx.enter("FFFFFFFFFFFFFFFFFF: 01"),
            Some(Err(Error::AddressOutOfRange))
        );
    }

    #[test]
    fn load_pads_and_bounds_checks() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        ctx.write_data[31] = 0x55;
        ctx.load(&[1, 2, 3]).unwrap();
        assert_eq!(&ctx.write_data[..4], &[1, 2, 3, 0]);
        assert_eq!(ctx.write_data[31], 0);

        let too_big = [0u8; 33];
        assert_eq!(ctx.load(&too_big), Err(Error::AddressOutOfRange));
    }

    #[test]
    fn dump_renders_bytes_for_wide_chips() {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        ctx.enter("00: DE AD").unwrap().unwrap();
        let dump = ctx.dump_write().unwrap().to_string();
        let mut lines = dump.lines();
        assert_eq!(
            lines.next().unwrap(),
            "00: DE AD 00 00 00 00 00 00 00 00 00 00 00 00 00 00"
        );
        assert_eq!(
            lines.next().unwrap(),
            "10: 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00"
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn dump_renders_nibbles_for_narrow_chips() {
        let mut ctx = PromContext::new();
        ctx.select(K556RT4);
        // Bits outside the mask must not show up in the dump.
        ctx.enter("00: FA 5").unwrap().unwrap();
        let dump = ctx.dump_write().unwrap().to_string();
        let first = dump.lines().next().unwrap();
        assert_eq!(first, "00: A 5 0 0 0 0 0 0 0 0 0 0 0 0 0 0");
        assert_eq!(dump.lines().count(), 16);
        assert!(dump.lines().last().unwrap().starts_with("F0:"));
    }

    #[test]
    fn dump_requires_selection() {
        let ctx = PromContext::new();
        assert!(ctx.dump_write().is_err());
    }
}
