//! Erase-and-program orchestration.

use core::convert::TryFrom;
use std::io::{self, Write};

use crate::chips::FlashChip;
use crate::error::Error;
use crate::walker::RegionWalker;
use crate::Transport;

/// Writes and reads back byte ranges of the selected chip.
///
/// A programmer is an ephemeral value scoped to one top-level operation.
/// Writing erases every covered block before programming its pages, and
/// reports progress as a stream of dots on standard output, one per page,
/// wrapping to a new line every 64 dots.
#[derive(Debug)]
pub struct Programmer<'a, T> {
    transport: &'a mut T,
    chip: &'static FlashChip,
    dots: u8,
}

impl<'a, T: Transport> Programmer<'a, T> {
    pub fn new(transport: &'a mut T, chip: &'static FlashChip) -> Self {
        Programmer {
            transport,
            chip,
            dots: 0,
        }
    }

    /// Writes `data` starting at the erase-block-aligned address `addr`.
    ///
    /// Every erase block the range touches is erased in full before its
    /// pages are programmed. When the end of the range falls inside a
    /// block, the tail of that block beyond the payload is left in the
    /// 0xFF erase state; nothing preserves whatever was there before.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), Error<T::Error>> {
        // Anything past 4 GiB cannot fit a 24-bit device; saturate and
        // let the range check reject it.
        let len = u32::try_from(data.len()).unwrap_or(u32::max_value());
        info!("writing 0x{:08X} bytes to address 0x{:08X}", len, addr);

        self.dots = 0;
        let mut data = data;
        for block in RegionWalker::new(self.chip, addr, len)? {
            self.chip.erase_block(self.transport, block.addr)?;

            let (used, rest) = data.split_at(block.len as usize);
            let mut page_addr = block.addr;
            for page in used.chunks(self.chip.page_size as usize) {
                self.chip.program_page(self.transport, page_addr, page)?;
                page_addr += self.chip.page_size;
                self.dot();
            }
            data = rest;
        }
        println!();
        Ok(())
    }

    /// Reads `buf.len()` bytes starting at any byte address.
    ///
    /// Reads have no alignment requirement and run as one transaction;
    /// only the range is checked.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), Error<T::Error>> {
        let len = u32::try_from(buf.len()).unwrap_or(u32::max_value());
        info!("reading 0x{:08X} bytes from address 0x{:08X}", len, addr);

        if u64::from(addr) + u64::from(len) > u64::from(self.chip.capacity()) {
            return Err(Error::OutOfRange {
                addr,
                len,
                capacity_kib: self.chip.capacity_kib,
            });
        }
        self.chip.read_into(self.transport, addr, buf)
    }

    fn dot(&mut self) {
        self.dots = (self.dots + 1) & 0x3F;
        if self.dots == 0 {
            println!(".");
        } else {
            print!(".");
        }
        let _ = io::stdout().flush();
    }
}
