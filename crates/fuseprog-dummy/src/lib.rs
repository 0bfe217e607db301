//! fuseprog-dummy - In-memory fuse PROM emulator
//!
//! This crate provides a dummy programmer that emulates a fuse-link PROM
//! in memory. It's useful for testing and development without real
//! hardware, and it is the scripted bus the engine tests run against.
//!
//! The emulator implements both halves of the programmer contract:
//! [`PromBus`] over an in-memory cell array and [`Timing`] over a
//! simulated millisecond clock. Burning follows the hardware's monotonic
//! rule - a write-enable assertion can only move bits from "off" to "on" -
//! and individual bits can be marked *stuck* so they refuse to burn, which
//! is how tests exercise the engine's abort path.
//!
//! Every bus call is recorded with the simulated time and whether it
//! happened inside a critical section, so tests can assert call ordering,
//! pulse widths, and duty cycles.
//!
//! # Usage with the fuseprog CLI
//!
//! ```bash
//! # A blank, burnable chip
//! fuseprog console -p dummy
//!
//! # Cells pre-filled with 0x0F (reads as an empty K556RT4)
//! fuseprog empty -p dummy:fill=0F --chip rt4
//!
//! # Bit 1 at address 02 refuses to burn
//! fuseprog write -p dummy:stuck=02:02 --chip re3 -i data.bin
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;

use fuseprog_core::context::MAX_CELLS;
use fuseprog_core::programmer::{PromBus, Timing};

#[cfg(feature = "std")]
pub mod params;

#[cfg(feature = "std")]
pub use params::DummyParamError;

/// Configuration for the dummy PROM
#[derive(Debug, Clone, Copy)]
pub struct DummyConfig {
    /// Initial value of every cell
    ///
    /// The default 0x00 is a burnable blank: every meaningful bit reads
    /// "off" and can be pulsed "on". Use the chip's bit mask to emulate a
    /// factory-fresh part that passes the empty check.
    pub fill: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self { fill: 0x00 }
    }
}

/// What one recorded bus call was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCall {
    /// `set_address(address)`
    SetAddress(u8),
    /// `set_data(value, write_enable)`
    SetData {
        /// Logical data byte driven
        value: u8,
        /// Whether the burn write-enable line was asserted
        write_enable: bool,
    },
    /// `get_data()` and the value it returned
    GetData(u8),
}

/// One recorded bus call with its timing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRecord {
    /// Simulated milliseconds since the emulator was created
    pub at_ms: u64,
    /// Whether the call happened inside `Timing::critical`
    pub in_critical: bool,
    /// The call itself
    pub call: BusCall,
}

/// Dummy fuse PROM programmer
///
/// Emulates the chip socket in memory for testing purposes.
pub struct DummyProm {
    cells: [u8; MAX_CELLS],
    stuck: [u8; MAX_CELLS],
    address: u8,
    now_ms: u64,
    critical_depth: u32,
    calls: Vec<CallRecord>,
}

impl DummyProm {
    /// Create a dummy PROM with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            cells: [config.fill; MAX_CELLS],
            stuck: [0; MAX_CELLS],
            address: 0,
            now_ms: 0,
            critical_depth: 0,
            calls: Vec::new(),
        }
    }

    /// Create a blank, fully burnable dummy PROM
    pub fn blank() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy PROM with explicit initial cell contents
    pub fn with_cells(initial: &[u8]) -> Self {
        let mut prom = Self::blank();
        let len = initial.len().min(MAX_CELLS);
        prom.cells[..len].copy_from_slice(&initial[..len]);
        prom
    }

    /// Mark bits at `address` that will refuse to burn
    pub fn set_stuck(&mut self, address: usize, mask: u8) {
        self.stuck[address] |= mask;
    }

    /// Current cell contents
    pub fn cells(&self) -> &[u8; MAX_CELLS] {
        &self.cells
    }

    /// Mutable cell contents, for scripting test fixtures
    pub fn cells_mut(&mut self) -> &mut [u8; MAX_CELLS] {
        &mut self.cells
    }

    /// Every bus call made so far
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    /// Forget recorded calls (cell contents and the clock are kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Simulated milliseconds elapsed
    pub fn elapsed_ms(&self) -> u64 {
        self.now_ms
    }

    fn record(&mut self, call: BusCall) {
        self.calls.push(CallRecord {
            at_ms: self.now_ms,
            in_critical: self.critical_depth > 0,
            call,
        });
    }
}

impl PromBus for DummyProm {
    fn set_address(&mut self, address: u8) {
        self.record(BusCall::SetAddress(address));
        self.address = address;
    }

    fn set_data(&mut self, value: u8, write_enable: bool) {
        self.record(BusCall::SetData {
            value,
            write_enable,
        });
        if write_enable {
            // Fuse burning is monotonic: bits only ever go "on", and
            // stuck bits never take.
            let address = self.address as usize;
            let burned = value & !self.stuck[address];
            if burned != 0 {
                log::debug!(
                    "dummy: burning {:02X} at {:02X} (now {:02X})",
                    burned,
                    address,
                    self.cells[address] | burned
                );
            }
            self.cells[address] |= burned;
        }
    }

    fn get_data(&mut self) -> u8 {
        let value = self.cells[self.address as usize];
        self.record(BusCall::GetData(value));
        value
    }
}

impl Timing for DummyProm {
    fn delay_ms(&mut self, ms: u32) {
        self.now_ms += ms as u64;
    }

    fn critical<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.critical_depth += 1;
        let result = body(self);
        self.critical_depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuseprog_core::chip::{K155RE3, K556RT4};
    use fuseprog_core::context::PromContext;
    use fuseprog_core::ops::{self, COOLDOWN_MS, PRECHARGE_MS, PULSE_UNIT_MS};
    use fuseprog_core::Error;

    fn re3_context() -> PromContext {
        let mut ctx = PromContext::new();
        ctx.select(K155RE3);
        ctx
    }

    #[test]
    fn burn_programs_a_blank_chip_and_verifies() {
        let mut prom = DummyProm::blank();
        let mut ctx = re3_context();
        ctx.enter("00: DE AD BE EF").unwrap().unwrap();
        ctx.enter("1F: 80").unwrap().unwrap();

        ops::burn(&mut prom, &mut ctx, &mut ()).unwrap();

        assert_eq!(&prom.cells()[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(prom.cells()[0x1F], 0x80);
        assert!(prom.cells()[4..0x1F].iter().all(|&c| c == 0));
        assert_eq!(ops::verify(&mut prom, &mut ctx), Ok(()));
    }

    #[test]
    fn burn_skips_bits_already_on() {
        let mut prom = DummyProm::with_cells(&[0x0F]);
        let mut ctx = re3_context();
        ctx.enter("00: 1F").unwrap().unwrap();

        ops::burn(&mut prom, &mut ctx, &mut ()).unwrap();

        // Only bit 4 needed a pulse.
        let pulses: Vec<_> = prom
            .calls()
            .iter()
            .filter(|r| matches!(r.call, BusCall::SetData { write_enable: true, .. }))
            .collect();
        assert_eq!(pulses.len(), 1);
        assert_eq!(
            pulses[0].call,
            BusCall::SetData {
                value: 0x10,
                write_enable: true,
            }
        );
    }

    #[test]
    fn pulse_timing_and_exclusivity() {
        let mut prom = DummyProm::blank();
        let mut ctx = re3_context();
        ctx.enter("03: 04").unwrap().unwrap();

        ops::burn(&mut prom, &mut ctx, &mut ()).unwrap();

        let calls = prom.calls();
        let we_on = calls
            .iter()
            .position(|r| matches!(r.call, BusCall::SetData { write_enable: true, .. }))
            .unwrap();
        let we_off = we_on + 1;

        // The programming pulse is exactly one duty unit wide and runs
        // inside the critical section.
        assert!(calls[we_on].in_critical);
        assert!(calls[we_off].in_critical);
        assert!(matches!(
            calls[we_off].call,
            BusCall::SetData {
                value: 0x04,
                write_enable: false,
            }
        ));
        assert_eq!(
            calls[we_off].at_ms - calls[we_on].at_ms,
            PULSE_UNIT_MS as u64
        );

        // Pre-charge before, cool-down after, nothing else in between.
        let precharge = we_on - 1;
        assert!(!calls[precharge].in_critical);
        assert_eq!(
            calls[we_on].at_ms - calls[precharge].at_ms,
            PRECHARGE_MS as u64
        );
        let release = we_off + 1;
        assert_eq!(
            calls[release].at_ms - calls[we_off].at_ms,
            COOLDOWN_MS as u64
        );
        assert!(matches!(
            calls[release].call,
            BusCall::SetData {
                value: 0xFF,
                write_enable: false,
            }
        ));
    }

    #[test]
    fn stuck_bit_aborts_the_write() {
        let mut prom = DummyProm::blank();
        prom.set_stuck(2, 0x02);
        let mut ctx = re3_context();
        // Addresses 0..4 all want bit 1; address 2 will fail.
        ctx.enter("00: 02 02 02 02").unwrap().unwrap();

        assert_eq!(
            ops::burn(&mut prom, &mut ctx, &mut ()),
            Err(Error::BurnFailure { address: 2, bit: 1 })
        );

        // Earlier cells stay burned, later cells were never touched.
        assert_eq!(prom.cells()[0], 0x02);
        assert_eq!(prom.cells()[1], 0x02);
        assert_eq!(prom.cells()[3], 0x00);

        // No bus traffic for address 3 onward; the engine parks the
        // address bus at 0 on the way out.
        let addresses: Vec<u8> = prom
            .calls()
            .iter()
            .filter_map(|r| match r.call {
                BusCall::SetAddress(a) => Some(a),
                _ => None,
            })
            .collect();
        assert!(!addresses.contains(&3));
        assert_eq!(*addresses.last().unwrap(), 0);
    }

    #[test]
    fn empty_check_against_scripted_cells() {
        let mut prom = DummyProm::new(DummyConfig { fill: 0x0F });
        prom.cells_mut()[3] = 0x07;
        let mut ctx = PromContext::new();
        ctx.select(K556RT4);

        assert_eq!(
            ops::check_empty(&mut prom, &mut ctx),
            Err(Error::NotEmpty {
                address: 3,
                found: 0x07,
            })
        );
    }

    #[test]
    fn reads_park_the_address_bus() {
        let mut prom = DummyProm::new(DummyConfig { fill: 0xFF });
        let mut ctx = re3_context();

        ops::read(&mut prom, &mut ctx).unwrap();
        let last_address = prom
            .calls()
            .iter()
            .rev()
            .find_map(|r| match r.call {
                BusCall::SetAddress(a) => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_address, 0);
    }

    #[test]
    fn verify_reports_first_mismatch_even_with_many() {
        let mut prom = DummyProm::blank();
        prom.cells_mut()[4] = 0x01;
        prom.cells_mut()[9] = 0x01;
        let mut ctx = re3_context();

        assert_eq!(
            ops::verify(&mut prom, &mut ctx),
            Err(Error::VerifyMismatch {
                address: 4,
                found: 0x01,
                expected: 0x00,
            })
        );
    }
}
