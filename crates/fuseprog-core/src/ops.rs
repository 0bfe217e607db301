//! Bus-level programming operations
//!
//! Read, verify, empty-check and burn. All operations walk addresses
//! strictly ascending, insert an explicit settle delay after every address
//! change, and park the address bus at 0 when they finish, so the hardware
//! is always left in a defined idle state.
//!
//! Burning is the only destructive operation. A fuse bit can go from "off"
//! to "on" exactly once and never back, so the engine verifies every bit
//! immediately after its pulse and aborts the whole write on the first bit
//! that does not respond: a non-responding fuse means a hardware fault, and
//! further pulses would only waste irreplaceable programming attempts.

use crate::context::PromContext;
use crate::error::{Error, Result};
use crate::programmer::{BurnProgress, PromBus, Timing};

/// Settle delay after driving the address lines
pub const SETTLE_MS: u32 = 1;

/// One duty-cycle unit; the programming pulse is exactly one unit wide
pub const PULSE_UNIT_MS: u32 = 300;

/// Pre-charge hold before the pulse, write-enable still off
pub const PRECHARGE_MS: u32 = 3 * PULSE_UNIT_MS;

/// Cool-down after the pulse
///
/// Together with the pre-charge this keeps the on/off ratio of consecutive
/// pulses at the chip's required minimum of 1:8.
pub const COOLDOWN_MS: u32 = 4 * PULSE_UNIT_MS;

/// Bus word that releases the data lines for reading
const READ_RELEASE: u8 = 0xFF;

/// Bits that need a programming pulse: requested "on" in the target but
/// currently reading "off", limited to the chip's meaningful bits
///
/// Burning is monotonic; a bit that already reads "on" is never pulsed
/// again.
#[inline]
pub fn burn_bits(target: u8, now: u8, mask: u8) -> u8 {
    target & !now & mask
}

/// Sample every cell into the read buffer
///
/// Each address is driven, allowed [`SETTLE_MS`] to settle, then sampled
/// and masked. The address bus is driven back to 0 afterwards.
pub fn read<P: PromBus + Timing>(prog: &mut P, ctx: &mut PromContext) -> Result<()> {
    let profile = ctx.profile()?;
    for address in 0..profile.cell_count {
        prog.set_address(address as u8);
        prog.delay_ms(SETTLE_MS);
        ctx.read_data[address] = prog.get_data() & profile.bit_mask;
    }
    prog.set_address(0);
    Ok(())
}

/// Read the chip and compare against the write buffer
///
/// Reports the first mismatching address with both masked values and
/// stops; it does not aggregate further mismatches.
pub fn verify<P: PromBus + Timing>(prog: &mut P, ctx: &mut PromContext) -> Result<()> {
    read(prog, ctx)?;

    let profile = ctx.profile()?;
    for address in 0..profile.cell_count {
        let found = ctx.read_data[address] & profile.bit_mask;
        let expected = ctx.write_data[address] & profile.bit_mask;
        if found != expected {
            return Err(Error::VerifyMismatch {
                address,
                found,
                expected,
            });
        }
    }
    Ok(())
}

/// Read the chip and require every cell in the unburned state
///
/// A cell is empty when its masked value equals the full bit mask (the
/// unburned/default level under this hardware's polarity convention).
/// Reports the first offender and stops.
pub fn check_empty<P: PromBus + Timing>(prog: &mut P, ctx: &mut PromContext) -> Result<()> {
    read(prog, ctx)?;

    let profile = ctx.profile()?;
    for address in 0..profile.cell_count {
        let found = ctx.read_data[address] & profile.bit_mask;
        if found != profile.bit_mask {
            return Err(Error::NotEmpty { address, found });
        }
    }
    Ok(())
}

/// Burn the write buffer into the chip, then verify end-to-end
///
/// Walks addresses ascending; for each address samples the current value
/// and pulses only the bits of [`burn_bits`], lowest bit position first.
/// Every pulse is re-verified immediately; the first bit that still reads
/// "off" aborts the whole operation with [`Error::BurnFailure`], leaving
/// the address bus parked at 0. Cells burned up to that point stay burned.
///
/// There is no cancellation: a worst-case write holds the bus for its full
/// duration.
pub fn burn<P, G>(prog: &mut P, ctx: &mut PromContext, progress: &mut G) -> Result<()>
where
    P: PromBus + Timing,
    G: BurnProgress,
{
    let profile = ctx.profile()?;

    for address in 0..profile.cell_count {
        progress.address_start(address);
        prog.set_address(address as u8);
        prog.delay_ms(SETTLE_MS);
        let now = prog.get_data();

        let wanted = burn_bits(ctx.write_data[address], now, profile.bit_mask);

        for bit in 0..8u8 {
            let bit_mask = 1u8 << bit;
            if wanted & bit_mask == 0 {
                continue;
            }

            log::debug!("burning bit {} at address {:02X}", bit, address);
            progress.bit_start(address, bit);

            if !pulse(prog, bit_mask) {
                prog.set_address(0);
                return Err(Error::BurnFailure { address, bit });
            }
            progress.bit_done(address, bit);
        }
    }

    verify(prog, ctx)
}

/// Fire one programming pulse for a single bit and re-check it
///
/// Pre-charge with write-enable off, then the interrupt-masked pulse of
/// exactly [`PULSE_UNIT_MS`], then the cool-down and the release of the
/// bus back to its read state. Returns whether the bit reads "on".
fn pulse<P: PromBus + Timing>(prog: &mut P, bit_mask: u8) -> bool {
    prog.set_data(bit_mask, false);
    prog.delay_ms(PRECHARGE_MS);

    // Any preemption inside this window distorts the physical pulse width
    // and risks an under- or over-programmed fuse.
    prog.critical(|p| {
        p.set_data(bit_mask, true);
        p.delay_ms(PULSE_UNIT_MS);
        p.set_data(bit_mask, false);
    });

    prog.delay_ms(COOLDOWN_MS);
    prog.set_data(READ_RELEASE, false);

    prog.get_data() & bit_mask != 0
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec::Vec;

    use super::*;
    use crate::chip::{K155RE3, K556RT4};

    #[test]
    fn burn_bits_is_monotonic_and_masked() {
        for mask in [0xFFu8, 0x0F] {
            for target in 0..=255u8 {
                for now in 0..=255u8 {
                    let bits = burn_bits(target, now, mask);
                    assert_eq!(bits, target & !now & mask);
                    // Never pulses a bit that already reads "on".
                    assert_eq!(bits & now, 0);
                    // Never pulses outside the chip's data width.
                    assert_eq!(bits & !mask, 0);
                }
            }
        }
    }

    /// Scripted bus for engine-level ordering checks. The fuller emulator
    /// lives in the fuseprog-dummy crate; this one only replays fixed
    /// per-address values.
    struct ScriptedBus {
        values: [u8; 256],
        address: u8,
        addresses_driven: Vec<u8>,
    }

    impl ScriptedBus {
        fn with(values: &[(usize, u8)], fill: u8) -> Self {
            let mut v = [fill; 256];
            for &(a, b) in values {
                v[a] = b;
            }
            Self {
                values: v,
                address: 0,
                addresses_driven: Vec::new(),
            }
        }
    }

    impl PromBus for ScriptedBus {
        fn set_address(&mut self, address: u8) {
            self.address = address;
            self.addresses_driven.push(address);
        }

        fn set_data(&mut self, _value: u8, _write_enable: bool) {}

        fn get_data(&mut self) -> u8 {
            self.values[self.address as usize]
        }
    }

    impl Timing for ScriptedBus {
        fn delay_ms(&mut self, _ms: u32) {}

        fn critical<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
            body(self)
        }
    }

    #[test]
    fn read_masks_samples_and_parks_address() {
        let mut bus = ScriptedBus::with(&[(0, 0xF5), (3, 0xAB)], 0xFF);
        let mut ctx = PromContext::new();
        ctx.select(K556RT4);

        read(&mut bus, &mut ctx).unwrap();
        assert_eq!(ctx.read_data()[0], 0x05);
        assert_eq!(ctx.read_data()[3], 0x0B);
        assert_eq!(bus.addresses_driven.len(), 257);
        assert_eq!(*bus.addresses_driven.last().unwrap(), 0);
    }

    #[test]
    fn read_requires_selection() {
        let mut bus = ScriptedBus::with(&[], 0xFF);
        let mut ctx = PromContext::new();
        assert_eq!(read(&mut bus, &mut ctx), Err(Error::NoChipSelected));
        assert!(bus.addresses_driven.is_empty());
    }

    #[test]
    fn verify_reports_first_mismatch_only() {
        let mut bus = ScriptedBus::with(&[(2, 0x01), (7, 0x02)], 0x00);
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);

        assert_eq!(
            verify(&mut bus, &mut ctx),
            Err(Error::VerifyMismatch {
                address: 2,
                found: 0x01,
                expected: 0x00,
            })
        );
    }

    #[test]
    fn verify_ignores_bits_outside_mask() {
        let mut bus = ScriptedBus::with(&[], 0xF7);
        let mut ctx = PromContext::new();
        ctx.select(K556RT4);
        for line in 0..16 {
            ctx.enter(&alloc::format!("{:02X}: 7 7 7 7 7 7 7 7 7 7 7 7 7 7 7 7", line * 16))
                .unwrap()
                .unwrap();
        }

        assert_eq!(verify(&mut bus, &mut ctx), Ok(()));
    }

    #[test]
    fn check_empty_reports_first_hole() {
        let mut bus = ScriptedBus::with(&[(3, 0xF0)], 0xFF);
        let mut ctx = PromContext::new();
        ctx.select(K556RT4);

        assert_eq!(
            check_empty(&mut bus, &mut ctx),
            Err(Error::NotEmpty {
                address: 3,
                found: 0x00,
            })
        );
    }

    #[test]
    fn check_empty_passes_on_blank_chip() {
        let mut bus = ScriptedBus::with(&[], 0xFF);
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        assert_eq!(check_empty(&mut bus, &mut ctx), Ok(()));
    }

    #[test]
    fn burn_with_nothing_to_do_still_verifies() {
        // Chip already reads exactly the target: no pulses, straight to
        // the final verify.
        let mut bus = ScriptedBus::with(&[], 0x00);
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);

        assert_eq!(burn(&mut bus, &mut ctx, &mut ()), Ok(()));
        // One address walk for the burn, one for the verify read.
        assert_eq!(bus.addresses_driven.len(), 32 + 33);
    }
}
