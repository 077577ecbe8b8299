//! A [`Transport`] built from an `embedded-hal` SPI master and a
//! chip-select pin.

use core::fmt::{self, Debug, Display};

use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use crate::Transport;

/// Error raised by [`SpiTransport`]: either the SPI master or the
/// chip-select line failed.
pub enum SpiError<S, G> {
    /// An SPI transfer failed.
    Spi(S),
    /// The chip-select line could not be driven.
    Gpio(G),
}

impl<S, G> Debug for SpiError<S, G>
where
    S: Debug,
    G: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiError::Spi(spi) => write!(f, "SpiError::Spi({:?})", spi),
            SpiError::Gpio(gpio) => write!(f, "SpiError::Gpio({:?})", gpio),
        }
    }
}

impl<S, G> Display for SpiError<S, G>
where
    S: Display,
    G: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiError::Spi(spi) => write!(f, "SPI error: {}", spi),
            SpiError::Gpio(gpio) => write!(f, "GPIO error: {}", gpio),
        }
    }
}

/// Drives a flash chip over any blocking `embedded-hal` SPI master.
///
/// The chip-select pin is held low across the whole command/response
/// exchange, making each [`send_message`] one atomic transaction as the
/// chip sees it.
///
/// [`send_message`]: Transport::send_message
#[derive(Debug)]
pub struct SpiTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI: Transfer<u8>, CS: OutputPin> SpiTransport<SPI, CS> {
    /// Wraps an SPI master and chip-select pin.
    ///
    /// `spi` must be configured for mode 0, MSB-first, with any hardware
    /// chip-select disabled; `cs` is driven low for the duration of each
    /// transaction and left high between them.
    pub fn new(spi: SPI, cs: CS) -> Self {
        SpiTransport { spi, cs }
    }

    /// Releases the SPI master and chip-select pin.
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI: Transfer<u8>, CS: OutputPin> Transport for SpiTransport<SPI, CS> {
    type Error = SpiError<SPI::Error, CS::Error>;

    fn send_message(&mut self, cmd: &[u8], recv: &mut [u8]) -> Result<(), Self::Error> {
        // `Transfer` clocks data out of a mutable buffer, so the command
        // goes through scratch space owned by this transaction.
        let mut scratch = cmd.to_vec();

        // If a transfer fails, deassert chip-select anyway.
        self.cs.set_low().map_err(SpiError::Gpio)?;
        let mut result = self.spi.transfer(&mut scratch).map(|_| ());
        if result.is_ok() && !recv.is_empty() {
            result = self.spi.transfer(recv).map(|_| ());
        }
        self.cs.set_high().map_err(SpiError::Gpio)?;
        result.map_err(SpiError::Spi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the order of CS edges and transfers.
    #[derive(Default)]
    struct Trace(std::rc::Rc<std::cell::RefCell<Vec<String>>>);

    struct FakeSpi {
        trace: Trace,
        fail: bool,
    }

    impl Transfer<u8> for FakeSpi {
        type Error = &'static str;
        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], &'static str> {
            self.trace.0.borrow_mut().push(format!("xfer {}", words.len()));
            if self.fail {
                return Err("spi fault");
            }
            // Echo a recognizable response pattern.
            for (i, word) in words.iter_mut().enumerate() {
                *word = i as u8;
            }
            Ok(words)
        }
    }

    struct FakeCs {
        trace: Trace,
    }

    impl OutputPin for FakeCs {
        type Error = core::convert::Infallible;
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.trace.0.borrow_mut().push("cs low".to_string());
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.trace.0.borrow_mut().push("cs high".to_string());
            Ok(())
        }
    }

    fn rig(fail: bool) -> (SpiTransport<FakeSpi, FakeCs>, Trace) {
        let trace = Trace::default();
        let spi = FakeSpi {
            trace: Trace(trace.0.clone()),
            fail,
        };
        let cs = FakeCs {
            trace: Trace(trace.0.clone()),
        };
        (SpiTransport::new(spi, cs), trace)
    }

    #[test]
    fn test_cs_frames_the_whole_exchange() {
        let (mut transport, trace) = rig(false);
        let mut recv = [0xFF; 3];
        transport.send_message(&[0x9F], &mut recv).unwrap();

        assert_eq!(
            *trace.0.borrow(),
            ["cs low", "xfer 1", "xfer 3", "cs high"]
        );
        assert_eq!(recv, [0, 1, 2]);
    }

    #[test]
    fn test_send_only_skips_the_receive_transfer() {
        let (mut transport, trace) = rig(false);
        transport.send_message(&[0x06], &mut []).unwrap();
        assert_eq!(*trace.0.borrow(), ["cs low", "xfer 1", "cs high"]);
    }

    #[test]
    fn test_cs_released_when_the_transfer_fails() {
        let (mut transport, trace) = rig(true);
        let result = transport.send_message(&[0x05], &mut [0u8]);
        assert!(matches!(result, Err(SpiError::Spi("spi fault"))));
        assert_eq!(*trace.0.borrow(), ["cs low", "xfer 1", "cs high"]);
    }
}
