//! On-target USB console for the PROM programmer adapter
//!
//! Brings the board up at 84 MHz, enumerates as a USB CDC serial device,
//! and runs the programmer console over it: chip selection, `ADDR: B B`
//! data entry, read, verify, empty check and write. The engine itself is
//! `fuseprog-core`; the bus and timing come from `fuseprog-stm32`.
//!
//! Pin budget (see fuseprog-stm32 for the socket wiring): PA0..PA7
//! address out, PB0..PB8 data out + write-enable, PB9/PB10/PB12..PB15 and
//! PA8/PA9 data in, PC13 LED, PA11/PA12 USB.

#![no_std]
#![no_main]

use core::fmt::{self, Write as _};

use cortex_m_rt::entry;
use panic_halt as _;

use stm32f4xx_hal::otg_fs::{UsbBus, USB};
use stm32f4xx_hal::pac;
use stm32f4xx_hal::prelude::*;
use usb_device::bus::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

use fuseprog_core::chip;
use fuseprog_core::console::{self, Command, Parsed};
use fuseprog_core::context::PromContext;
use fuseprog_core::ops;
use fuseprog_core::programmer::BurnProgress;
use fuseprog_stm32::Board;

static mut EP_MEMORY: [u32; 1024] = [0; 1024];

const LINE_CAPACITY: usize = 120;

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(25.MHz())
        .sysclk(84.MHz())
        .require_pll48clk()
        .freeze();

    // Socket wiring. The handles are dropped; the pins stay configured
    // and fuseprog-stm32 drives them at register level.
    let gpioa = dp.GPIOA.split();
    let gpiob = dp.GPIOB.split();
    let gpioc = dp.GPIOC.split();
    let _ = (
        gpioa.pa0.into_push_pull_output(),
        gpioa.pa1.into_push_pull_output(),
        gpioa.pa2.into_push_pull_output(),
        gpioa.pa3.into_push_pull_output(),
        gpioa.pa4.into_push_pull_output(),
        gpioa.pa5.into_push_pull_output(),
        gpioa.pa6.into_push_pull_output(),
        gpioa.pa7.into_push_pull_output(),
        gpioa.pa8.into_pull_up_input(),
        gpioa.pa9.into_pull_up_input(),
    );
    let _ = (
        gpiob.pb0.into_push_pull_output(),
        gpiob.pb1.into_push_pull_output(),
        gpiob.pb2.into_push_pull_output(),
        gpiob.pb3.into_push_pull_output(),
        gpiob.pb4.into_push_pull_output(),
        gpiob.pb5.into_push_pull_output(),
        gpiob.pb6.into_push_pull_output(),
        gpiob.pb7.into_push_pull_output(),
        gpiob.pb8.into_push_pull_output(),
        gpiob.pb9.into_pull_up_input(),
        gpiob.pb10.into_pull_up_input(),
        gpiob.pb12.into_pull_up_input(),
        gpiob.pb13.into_pull_up_input(),
        gpiob.pb14.into_pull_up_input(),
        gpiob.pb15.into_pull_up_input(),
    );
    let _ = gpioc.pc13.into_push_pull_output();

    let mut board = unsafe { Board::acquire() };
    // Bus idle: read-enable released, address parked.
    {
        use fuseprog_core::programmer::PromBus;
        board.set_data(0xFF, false);
        board.set_address(0);
    }
    fuseprog_stm32::set_led(false);

    let usb = USB::new(
        (dp.OTG_FS_GLOBAL, dp.OTG_FS_DEVICE, dp.OTG_FS_PWRCLK),
        (gpioa.pa11, gpioa.pa12),
        &clocks,
    );
    let usb_bus: UsbBusAllocator<UsbBus<USB>> =
        UsbBus::new(usb, unsafe { &mut *core::ptr::addr_of_mut!(EP_MEMORY) });
    let mut serial = SerialPort::new(&usb_bus);
    let mut usb_dev = UsbDeviceBuilder::new(&usb_bus, UsbVidPid(0x16C0, 0x27DD))
        .device_class(usbd_serial::USB_CLASS_CDC)
        .strings(&[StringDescriptors::default()
            .manufacturer("fuseprog")
            .product("PROM programmer")])
        .unwrap()
        .build();

    let mut ctx = PromContext::new();
    let mut line = [0u8; LINE_CAPACITY];
    let mut pos = 0usize;
    let mut greeted = false;

    loop {
        if !usb_dev.poll(&mut [&mut serial]) {
            continue;
        }

        if !greeted && usb_dev.state() == UsbDeviceState::Configured {
            let mut out = SerialOut { serial: &mut serial };
            let _ = writeln!(out, "K155RE3 and K556RT4 programmer");
            greeted = true;
        }

        let mut buf = [0u8; 64];
        let count = match serial.read(&mut buf) {
            Ok(count) => count,
            Err(_) => continue,
        };

        for &byte in &buf[..count] {
            match byte {
                b'\r' | b'\n' => {
                    if pos == 0 {
                        continue;
                    }
                    echo(&mut serial, b"\r\n");
                    let entered = core::str::from_utf8(&line[..pos]).unwrap_or("");
                    dispatch(&mut board, &mut ctx, &mut serial, entered);
                    pos = 0;
                }
                // Backspace: rub out the last character.
                0x08 | 0x7F => {
                    if pos > 0 {
                        pos -= 1;
                        echo(&mut serial, b"\x08 \x08");
                    }
                }
                _ => {
                    if pos == LINE_CAPACITY {
                        echo(&mut serial, b"\r\nLine too long\r\n");
                        pos = 0;
                        continue;
                    }
                    line[pos] = byte;
                    pos += 1;
                    echo(&mut serial, &[byte]);
                }
            }
        }
    }
}

/// Blocking write of a small byte sequence to the CDC port
fn echo<B: usb_device::bus::UsbBus>(serial: &mut SerialPort<'_, B>, bytes: &[u8]) {
    let mut rest = bytes;
    while !rest.is_empty() {
        match serial.write(rest) {
            Ok(written) => rest = &rest[written..],
            Err(UsbError::WouldBlock) => continue,
            Err(_) => return,
        }
    }
}

/// `core::fmt` adapter over the CDC port, expanding `\n` to `\r\n`
struct SerialOut<'a, 'b, B: usb_device::bus::UsbBus> {
    serial: &'a mut SerialPort<'b, B>,
}

impl<B: usb_device::bus::UsbBus> fmt::Write for SerialOut<'_, '_, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for chunk in s.split_inclusive('\n') {
            let (body, newline) = match chunk.strip_suffix('\n') {
                Some(body) => (body, true),
                None => (chunk, false),
            };
            echo(self.serial, body.as_bytes());
            if newline {
                echo(self.serial, b"\r\n");
            }
        }
        Ok(())
    }
}

/// Burn progress: pulse messages on the console, LED lit per bit
struct FirmwareProgress<'a, 'b, 'c, B: usb_device::bus::UsbBus> {
    out: &'a mut SerialOut<'b, 'c, B>,
}

impl<B: usb_device::bus::UsbBus> BurnProgress for FirmwareProgress<'_, '_, '_, B> {
    fn bit_start(&mut self, address: usize, bit: u8) {
        let _ = writeln!(self.out, "Burn {} bit to address {}", bit, address);
        fuseprog_stm32::set_led(true);
    }

    fn bit_done(&mut self, _address: usize, _bit: u8) {
        fuseprog_stm32::set_led(false);
    }
}

fn dispatch<B: usb_device::bus::UsbBus>(
    board: &mut Board,
    ctx: &mut PromContext,
    serial: &mut SerialPort<'_, B>,
    line: &str,
) {
    let mut out = SerialOut { serial };
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match console::parse(line) {
        Parsed::Command(command) => execute(board, ctx, &mut out, command),
        Parsed::ExtraArguments(_) => {
            let _ = writeln!(out, "Extra characters at the end");
        }
        Parsed::Unknown(rest) => match ctx.enter(rest) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                let _ = writeln!(out, "{}", e);
            }
            None => {
                let _ = writeln!(out, "Unknown command");
                help(&mut out);
            }
        },
    }
}

fn execute<B: usb_device::bus::UsbBus>(
    board: &mut Board,
    ctx: &mut PromContext,
    out: &mut SerialOut<'_, '_, B>,
    command: Command,
) {
    match command {
        Command::SelectRe3 => ctx.select(chip::K155RE3),
        Command::SelectRt4 => ctx.select(chip::K556RT4),
        Command::Clear => ctx.clear(),
        Command::Print => match ctx.dump_write() {
            Ok(dump) => {
                let _ = write!(out, "{}", dump);
            }
            Err(e) => {
                let _ = writeln!(out, "{}", e);
            }
        },
        Command::Read => match ops::read(board, ctx) {
            Ok(()) => {
                if let Ok(dump) = ctx.dump_read() {
                    let _ = write!(out, "{}", dump);
                }
            }
            Err(e) => {
                let _ = writeln!(out, "{}", e);
            }
        },
        Command::Verify => report(out, ops::verify(board, ctx), "Verify done"),
        Command::Empty => report(out, ops::check_empty(board, ctx), "Empty"),
        Command::Write => {
            let result = {
                let mut progress_out = SerialOut {
                    serial: &mut *out.serial,
                };
                let mut progress = FirmwareProgress {
                    out: &mut progress_out,
                };
                ops::burn(board, ctx, &mut progress)
            };
            fuseprog_stm32::set_led(false);
            report(out, result, "Verify done");
        }
    }
}

fn report<B: usb_device::bus::UsbBus>(
    out: &mut SerialOut<'_, '_, B>,
    result: fuseprog_core::Result<()>,
    success: &str,
) {
    match result {
        Ok(()) => {
            let _ = writeln!(out, "{}", success);
        }
        Err(e) => {
            let _ = writeln!(out, "{}", e);
        }
    }
}

fn help<B: usb_device::bus::UsbBus>(out: &mut SerialOut<'_, '_, B>) {
    let _ = writeln!(out, "Help:");
    let _ = writeln!(out, "{}\t - {}", console::ENTRY_USAGE, console::ENTRY_HELP);
    for spec in console::COMMANDS {
        let _ = writeln!(out, "{}\t - {}", spec.name, spec.help);
    }
}
