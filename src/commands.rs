//! Family-specific SPI command synthesis: erase, program, read, status.
//!
//! All addresses on the wire are 24-bit big-endian. A byte address is
//! converted to a flash address by splitting it at the page boundary and
//! re-joining with the descriptor's `bit_shift`, which also covers the
//! DataFlash parts whose pages are not a power of two.

use bitflags::bitflags;

use crate::chips::{Family, FlashChip, PageSizing};
use crate::error::Error;
use crate::Transport;

pub(crate) enum Opcode {
    /// Read the JEDEC manufacturer and device IDs.
    ReadJedecId = 0x9F,
    /// Set the write enable latch.
    WriteEnable = 0x06,
    /// Read the 8-bit status register.
    ReadStatus = 0x05,
    /// Read the DataFlash status register.
    ReadStatusDataFlash = 0xD7,
    Read = 0x03,
    PageProgram = 0x02,
    /// Program through buffer 1 with built-in erase (DataFlash).
    BufferProgram = 0x82,
    BlockErase = 0xD8,
}

bitflags! {
    /// Standard status register bits (opcode 0x05).
    pub struct Status: u8 {
        /// Erase or write in progress.
        const WIP = 1 << 0;
        /// Status of the write enable latch.
        const WEL = 1 << 1;
    }
}

bitflags! {
    /// DataFlash status register bits (opcode 0xD7).
    pub struct DataFlashStatus: u8 {
        /// Device is idle.
        const READY = 1 << 7;
        /// Page size is configured to a power of two.
        const POWER_OF_TWO = 1 << 0;
    }
}

fn write_enable<T: Transport>(transport: &mut T) -> Result<(), Error<T::Error>> {
    transport
        .send_message(&[Opcode::WriteEnable as u8], &mut [])
        .map_err(Error::Transport)
}

fn read_status<T: Transport>(transport: &mut T) -> Result<Status, Error<T::Error>> {
    let mut status = [0];
    transport
        .send_message(&[Opcode::ReadStatus as u8], &mut status)
        .map_err(Error::Transport)?;
    Ok(Status::from_bits_truncate(status[0]))
}

fn read_dataflash_status<T: Transport>(
    transport: &mut T,
) -> Result<DataFlashStatus, Error<T::Error>> {
    let mut status = [0];
    transport
        .send_message(&[Opcode::ReadStatusDataFlash as u8], &mut status)
        .map_err(Error::Transport)?;
    Ok(DataFlashStatus::from_bits_truncate(status[0]))
}

/// Polls 0x05 until the chip finishes its erase or program. Required for
/// correctness, not just latency: the chip ignores further opcodes while
/// a write is in progress.
fn wait_while_busy<T: Transport>(transport: &mut T) -> Result<(), Error<T::Error>> {
    while read_status(transport)?.contains(Status::WIP) {}
    Ok(())
}

/// DataFlash counterpart of [`wait_while_busy`], polling 0xD7.
fn wait_until_ready<T: Transport>(transport: &mut T) -> Result<(), Error<T::Error>> {
    while !read_dataflash_status(transport)?.contains(DataFlashStatus::READY) {}
    Ok(())
}

impl FlashChip {
    /// Converts a byte address into the chip's flash address.
    fn flash_address(&self, addr: u32) -> u32 {
        let page_num = addr / self.page_size;
        let page_offset = addr % self.page_size;
        (page_num << self.bit_shift) | page_offset
    }

    /// Probes which table entry actually describes the attached chip,
    /// returning an offset from the entry that matched the JEDEC ID.
    ///
    /// Only the native-page-size DataFlash entries carry a probe: bit 0
    /// of the 0xD7 status register set means the chip is configured for
    /// power-of-two pages, described by the next table slot.
    pub(crate) fn variant_offset<T: Transport>(
        &self,
        transport: &mut T,
    ) -> Result<usize, Error<T::Error>> {
        match self.family {
            Family::DataFlash(PageSizing::Native) => {
                let status = read_dataflash_status(transport)?;
                Ok(usize::from(status.contains(DataFlashStatus::POWER_OF_TWO)))
            }
            _ => Ok(0),
        }
    }

    /// Erases the erase block starting at `addr`.
    ///
    /// `addr` must be block-aligned, which implies page alignment with a
    /// zero intra-page offset. DataFlash parts erase implicitly during
    /// programming, so for them this does nothing.
    pub fn erase_block<T: Transport>(
        &self,
        transport: &mut T,
        addr: u32,
    ) -> Result<(), Error<T::Error>> {
        match self.family {
            Family::Standard => {
                let flash_addr = self.flash_address(addr);
                write_enable(transport)?;
                let cmd = [
                    Opcode::BlockErase as u8,
                    (flash_addr >> 16) as u8,
                    (flash_addr >> 8) as u8,
                    flash_addr as u8,
                ];
                transport.send_message(&cmd, &mut []).map_err(Error::Transport)?;
                wait_while_busy(transport)
            }
            Family::DataFlash(_) => Ok(()),
        }
    }

    /// Programs one page at the page-aligned address `addr`.
    ///
    /// `data` holds at most one page; the command always carries a full
    /// page, with the tail padded to the 0xFF erase state.
    pub fn program_page<T: Transport>(
        &self,
        transport: &mut T,
        addr: u32,
        data: &[u8],
    ) -> Result<(), Error<T::Error>> {
        debug_assert!(data.len() <= self.page_size as usize);
        debug_assert_eq!(addr % self.page_size, 0);

        let flash_addr = self.flash_address(addr);
        let opcode = match self.family {
            Family::Standard => Opcode::PageProgram,
            Family::DataFlash(_) => Opcode::BufferProgram,
        };
        let mut cmd = Vec::with_capacity(4 + self.page_size as usize);
        cmd.push(opcode as u8);
        cmd.push((flash_addr >> 16) as u8);
        cmd.push((flash_addr >> 8) as u8);
        cmd.push(flash_addr as u8);
        cmd.extend_from_slice(data);
        cmd.resize(4 + self.page_size as usize, 0xFF);

        match self.family {
            Family::Standard => {
                write_enable(transport)?;
                transport.send_message(&cmd, &mut []).map_err(Error::Transport)?;
                wait_while_busy(transport)
            }
            Family::DataFlash(_) => {
                transport.send_message(&cmd, &mut []).map_err(Error::Transport)?;
                wait_until_ready(transport)
            }
        }
    }

    /// Reads `buf.len()` bytes starting at any byte address, in a single
    /// transaction. NOR flash streams sequentially across page and block
    /// boundaries during read, so arbitrary lengths are fine.
    pub fn read_into<T: Transport>(
        &self,
        transport: &mut T,
        addr: u32,
        buf: &mut [u8],
    ) -> Result<(), Error<T::Error>> {
        let flash_addr = self.flash_address(addr);
        let cmd = [
            Opcode::Read as u8,
            (flash_addr >> 16) as u8,
            (flash_addr >> 8) as u8,
            flash_addr as u8,
        ];
        transport.send_message(&cmd, buf).map_err(Error::Transport)
    }
}
