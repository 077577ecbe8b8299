//! A host-side programming engine for the SPI configuration flash of FPGA
//! boards.
//!
//! The engine identifies the attached chip by its JEDEC ID, selects a
//! descriptor from a built-in database, and erases/programs/reads the
//! device through a minimal [`Transport`] contract. Both uniform NOR parts
//! (ST M25P, Winbond W25Q, AMIC A25L) and Atmel DataFlash parts in their
//! native or power-of-two page sizings are supported.
//!
//! The transport itself is supplied by the caller: anything that can clock
//! bytes out and in between a chip-select assertion and deassertion will
//! do. [`transport::SpiTransport`] adapts any [`embedded-hal`] SPI master
//! plus chip-select pin.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/

#![warn(missing_debug_implementations, rust_2018_idioms)]

#[macro_use]
mod log;
mod error;
mod utils;

pub mod chips;
pub mod commands;
pub mod ident;
pub mod programmer;
pub mod transport;
pub mod walker;

#[cfg(test)]
mod mock;

pub use crate::chips::FlashChip;
pub use crate::error::Error;
pub use crate::ident::find_chip;
pub use crate::programmer::Programmer;
pub use crate::transport::SpiTransport;

/// The single operation the engine needs from a link to the flash chip.
pub trait Transport {
    /// Error reported by the underlying link. Opaque to the engine; it is
    /// carried outward in [`Error::Transport`].
    type Error;

    /// Performs one SPI transaction: assert chip-select, clock out all of
    /// `cmd` MSB-first, clock `recv.len()` response bytes into `recv`,
    /// deassert chip-select.
    ///
    /// The exchange is atomic: no other SPI traffic may interleave while
    /// chip-select is asserted. An empty `recv` means send-only; `cmd` is
    /// never empty.
    fn send_message(&mut self, cmd: &[u8], recv: &mut [u8]) -> Result<(), Self::Error>;
}
