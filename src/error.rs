use core::fmt::{self, Debug, Display};

/// The error type used by this library.
///
/// Every variant is fatal to the operation that raised it; there is no
/// retry at this level. A partially completed write leaves the covered
/// erase blocks in an indeterminate state, and the remedy is a full
/// re-program.
#[non_exhaustive]
pub enum Error<E> {
    /// The transport reported a failure. The SPI transaction may or may
    /// not have reached the chip.
    Transport(E),

    /// The JEDEC identification did not match any supported chip.
    UnknownDevice {
        /// Accumulated vendor ID, including any 0x7F continuation bytes.
        vendor_id: u32,
        /// 16-bit device ID, big-endian as read off the wire.
        device_id: u16,
    },

    /// The requested byte range runs past the end of the device.
    OutOfRange {
        addr: u32,
        len: u32,
        capacity_kib: u32,
    },

    /// A write started inside an erase block instead of on its boundary.
    Misaligned {
        /// Nearest aligned address at or below the requested one.
        lower: u32,
        /// Nearest aligned address above the requested one.
        upper: u32,
    },
}

impl<E> Debug for Error<E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "Error::Transport({:?})", e),
            Error::UnknownDevice {
                vendor_id,
                device_id,
            } => write!(
                f,
                "Error::UnknownDevice(0x{:08X}, 0x{:04X})",
                vendor_id, device_id
            ),
            Error::OutOfRange { addr, len, .. } => {
                write!(f, "Error::OutOfRange(0x{:08X} + 0x{:08X})", addr, len)
            }
            Error::Misaligned { lower, upper } => {
                write!(f, "Error::Misaligned(0x{:08X}, 0x{:08X})", lower, upper)
            }
        }
    }
}

impl<E> Display for Error<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::UnknownDevice {
                vendor_id,
                device_id,
            } => write!(
                f,
                "unknown device: vendorID = 0x{:08X}, deviceID = 0x{:04X}",
                vendor_id, device_id
            ),
            Error::OutOfRange { capacity_kib, .. } => write!(
                f,
                "address range error: this device's capacity is limited to {} KiB",
                capacity_kib
            ),
            Error::Misaligned { lower, upper } => write!(
                f,
                "address alignment error: the nearest aligned addresses are 0x{:08X} and 0x{:08X}",
                lower, upper
            ),
        }
    }
}

impl<E> std::error::Error for Error<E> where E: Debug + Display {}
