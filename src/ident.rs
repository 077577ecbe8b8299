//! Chip identification via the JEDEC Read Identification opcode.

use core::fmt;

use crate::chips::{FlashChip, CHIPS};
use crate::commands::Opcode;
use crate::error::Error;
use crate::utils::HexSlice;
use crate::Transport;

/// Parsed JEDEC manufacturer and device identification.
pub struct JedecId {
    vendor_id: u32,
    device_id: u16,
    continuations: u8,
}

impl JedecId {
    /// Parses a raw response to opcode 0x9F.
    ///
    /// Leading 0x7F continuation bytes (JEP106 bank escapes, not part of
    /// the core manufacturer ID) are folded into the vendor ID; the first
    /// other byte terminates it, and the next two form the big-endian
    /// device ID. Returns `None` when the response never terminates or is
    /// too short to carry a device ID.
    pub fn parse(buf: &[u8]) -> Option<JedecId> {
        let terminal = buf.iter().position(|&b| b != 0x7F)?;
        if terminal + 3 > buf.len() {
            return None;
        }

        let mut vendor_id: u32 = 0;
        for _ in 0..terminal {
            vendor_id = (vendor_id | 0x7F) << 8;
        }
        vendor_id |= u32::from(buf[terminal]);
        let device_id = u16::from(buf[terminal + 1]) << 8 | u16::from(buf[terminal + 2]);

        Some(JedecId {
            vendor_id,
            device_id,
            continuations: terminal as u8,
        })
    }

    /// Accumulated vendor ID, continuation bytes included.
    pub fn vendor_id(&self) -> u32 {
        self.vendor_id
    }

    /// 16-bit device ID.
    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// Number of continuation codes that preceded the manufacturer byte.
    pub fn continuation_count(&self) -> u8 {
        self.continuations
    }
}

impl fmt::Debug for JedecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JedecId(vendor = 0x{:X}, device = 0x{:04X})",
            self.vendor_id, self.device_id
        )
    }
}

/// Queries the attached chip for its JEDEC ID and finds the matching
/// descriptor.
///
/// When one JEDEC ID covers several configurations (DataFlash page
/// sizings), the matching entry's probe picks the actual one. Fails with
/// [`Error::UnknownDevice`] when nothing in the table matches.
pub fn find_chip<T: Transport>(transport: &mut T) -> Result<&'static FlashChip, Error<T::Error>> {
    let mut buf = [0; 256];
    transport
        .send_message(&[Opcode::ReadJedecId as u8], &mut buf)
        .map_err(Error::Transport)?;
    trace!("jedec response starts {:?}", HexSlice(&buf[..8]));

    // A response of nothing but continuation bytes carries no usable ID.
    let id = JedecId::parse(&buf).ok_or(Error::UnknownDevice {
        vendor_id: 0,
        device_id: 0,
    })?;

    let index = CHIPS
        .iter()
        .position(|chip| chip.matches(id.vendor_id(), id.device_id()))
        .ok_or(Error::UnknownDevice {
            vendor_id: id.vendor_id(),
            device_id: id.device_id(),
        })?;
    let chip = &CHIPS[index + CHIPS[index].variant_offset(transport)?];

    info!(
        "identified {} {}: {} KiB, {} byte pages",
        chip.vendor, chip.name, chip.capacity_kib, chip.page_size
    );
    Ok(chip)
}
