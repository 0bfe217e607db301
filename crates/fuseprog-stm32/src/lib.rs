//! fuseprog-stm32 - Board support for the STM32F401 programmer adapter
//!
//! The adapter board wires the PROM socket straight onto two GPIO ports:
//!
//! | Lines                       | Port pins                      |
//! |-----------------------------|--------------------------------|
//! | Address out                 | PA0..PA7                       |
//! | Data out (inverting driver) | PB0..PB7                       |
//! | Burn write-enable (low)     | PB8                            |
//! | Data in                     | PB9 PB10 PB12..PB15 PA8 PA9    |
//! | Status LED (low)            | PC13                           |
//!
//! The data-out stage inverts (a driven low asserts a chip data pin), and
//! the data-in pins are scattered across the two ports, so this crate owns
//! the two fixed translations: [`data_word`] for the outbound port word
//! and [`remap_data_in`] for folding the inputs back into one logical
//! byte. Both are board wiring contracts; they are reproduced exactly and
//! locked by tests, not tidied.
//!
//! Delays busy-wait on the DWT cycle counter at the 84 MHz core clock, and
//! the burn-pulse critical section masks interrupts, so the pulse width
//! the engine asks for is the pulse width the chip sees.
//!
//! Register access goes through raw pointers; everything here compiles on
//! any target, and only [`Board::acquire`] (unsafe) gives out a value that
//! will actually touch the hardware.

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use cortex_m::interrupt;
use cortex_m::peripheral::DWT;

use fuseprog_core::programmer::{PromBus, Timing};

/// Core clock of the adapter board
pub const SYSTEM_CORE_CLOCK: u32 = 84_000_000;

const GPIOA_IDR: *const u32 = 0x4002_0010 as *const u32;
const GPIOA_ODR: *mut u32 = 0x4002_0014 as *mut u32;
const GPIOB_IDR: *const u32 = 0x4002_0410 as *const u32;
const GPIOB_ODR: *mut u32 = 0x4002_0414 as *mut u32;
const GPIOC_BSRR: *mut u32 = 0x4002_0818 as *mut u32;

const LED_PIN: u32 = 13;

/// Outbound port B word for a logical data byte
///
/// The driver stage inverts, and the burn write-enable line on PB8 is
/// active-low.
#[inline]
pub const fn data_word(value: u8, write_enable: bool) -> u16 {
    let word = (!value) as u16;
    if write_enable {
        word
    } else {
        word | 0x100
    }
}

/// Fold the scattered data-in pins into one logical byte
///
/// Data in: B9 B10 B12 B13 B14 B15 A8 A9. Board wiring contract; do not
/// rearrange.
#[inline]
pub const fn remap_data_in(idr_a: u16, idr_b: u16) -> u8 {
    (((idr_b >> 9) & 0x03) | ((idr_b >> (12 - 2)) & (0x0F << 2)) | ((idr_a >> (8 - 6)) & (0x03 << 6)))
        as u8
}

/// Drive the status LED (lit during burn pulses)
///
/// Goes through the port's atomic set/reset register, so it is safe to
/// call from a progress callback while the engine owns the [`Board`].
pub fn set_led(on: bool) {
    let bit = if on {
        // Active low: reset the pin to light it.
        1 << (LED_PIN + 16)
    } else {
        1 << LED_PIN
    };
    unsafe { GPIOC_BSRR.write_volatile(bit) };
}

/// The programmer adapter's bus and timing
pub struct Board {
    _ownership: (),
}

impl Board {
    /// Take ownership of the adapter hardware
    ///
    /// Enables the DWT cycle counter used for delays.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that GPIO ports A, B and C are clocked
    /// and configured for the adapter wiring, and that nothing else
    /// drives them or reconfigures the DWT while the returned value is
    /// alive.
    pub unsafe fn acquire() -> Self {
        let mut cp = cortex_m::Peripherals::steal();
        cp.DCB.enable_trace();
        cp.DWT.enable_cycle_counter();
        log::debug!("adapter board acquired, core clock {} Hz", SYSTEM_CORE_CLOCK);
        Board { _ownership: () }
    }

    fn delay_cycles(&self, cycles: u32) {
        let start = DWT::cycle_count();
        while DWT::cycle_count().wrapping_sub(start) < cycles {}
    }
}

impl PromBus for Board {
    fn set_address(&mut self, address: u8) {
        unsafe { GPIOA_ODR.write_volatile(address as u32) };
    }

    fn set_data(&mut self, value: u8, write_enable: bool) {
        unsafe { GPIOB_ODR.write_volatile(data_word(value, write_enable) as u32) };
    }

    fn get_data(&mut self) -> u8 {
        let (idr_a, idr_b) =
            unsafe { (GPIOA_IDR.read_volatile() as u16, GPIOB_IDR.read_volatile() as u16) };
        remap_data_in(idr_a, idr_b)
    }
}

impl Timing for Board {
    fn delay_ms(&mut self, ms: u32) {
        self.delay_cycles(ms * (SYSTEM_CORE_CLOCK / 1000));
    }

    fn critical<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        interrupt::free(|_| body(self))
    }
}
