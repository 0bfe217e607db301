//! fuseprog-core - Core library for fuse-link PROM programming
//!
//! This crate provides the programming engine for one-time-programmable
//! fuse-link PROMs (K155RE3 and K556RT4): chip profiles, the write/read
//! data buffers, and the bus-level burn/verify/empty-check algorithms with
//! their timing discipline. It is `no_std` compatible so the same engine
//! runs in the on-target firmware and in host-side tools and tests.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use fuseprog_core::{chip, context::PromContext, ops};
//!
//! fn blank_check<P: PromBus + Timing>(prog: &mut P) {
//!     let mut ctx = PromContext::new();
//!     ctx.select(chip::K155RE3);
//!     match ops::check_empty(prog, &mut ctx) {
//!         Ok(()) => println!("Empty"),
//!         Err(e) => println!("{}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod console;
pub mod context;
pub mod error;
pub mod ops;
pub mod programmer;

pub use error::{Error, Result};
