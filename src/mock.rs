//! An in-memory flash device for the unit tests.
//!
//! Implements [`Transport`] by decoding the wire format of the supported
//! chips, including the non-linear page addressing of DataFlash parts,
//! and keeps a log of every transaction for wire-level assertions.

use core::convert::Infallible;

use crate::chips::{EraseRegion, Family, FlashChip, PageSizing};
use crate::Transport;

/// One recorded SPI transaction.
pub(crate) struct Transaction {
    /// Command bytes, exactly as sent.
    pub cmd: Vec<u8>,
    /// Number of response bytes the engine asked for.
    pub recv_len: usize,
}

pub(crate) struct MockFlash {
    id: Vec<u8>,
    page_size: u32,
    bit_shift: u32,
    regions: Vec<EraseRegion>,
    mem: Vec<u8>,
    dataflash: bool,
    pow2: bool,
    write_enabled: bool,
    /// How many status polls report busy after each erase or program.
    pub busy_polls: u8,
    busy_countdown: u8,
    pub log: Vec<Transaction>,
}

impl MockFlash {
    /// An emulated instance of the given descriptor, fully erased.
    pub fn for_chip(chip: &FlashChip) -> MockFlash {
        MockFlash {
            id: jedec_bytes(chip.vendor_id, chip.device_id),
            page_size: chip.page_size,
            bit_shift: chip.bit_shift,
            regions: chip.erase_regions.to_vec(),
            mem: vec![0xFF; chip.capacity() as usize],
            dataflash: matches!(chip.family, Family::DataFlash(_)),
            pow2: matches!(chip.family, Family::DataFlash(PageSizing::PowerOfTwo)),
            write_enabled: false,
            busy_polls: 0,
            busy_countdown: 0,
            log: Vec::new(),
        }
    }

    /// A bare device that only answers identification, with the given
    /// raw 0x9F response.
    pub fn with_id(id: Vec<u8>) -> MockFlash {
        MockFlash {
            id,
            page_size: 256,
            bit_shift: 8,
            regions: Vec::new(),
            mem: Vec::new(),
            dataflash: false,
            pow2: false,
            write_enabled: false,
            busy_polls: 0,
            busy_countdown: 0,
            log: Vec::new(),
        }
    }

    pub fn mem(&self) -> &[u8] {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut [u8] {
        &mut self.mem
    }

    /// Maps a 24-bit flash address from the wire back to a byte offset.
    fn byte_address(&self, cmd: &[u8]) -> usize {
        let flash_addr = u32::from(cmd[1]) << 16 | u32::from(cmd[2]) << 8 | u32::from(cmd[3]);
        let page = flash_addr >> self.bit_shift;
        let offset = flash_addr & ((1 << self.bit_shift) - 1);
        assert!(offset < self.page_size, "address between pages");
        (page * self.page_size + offset) as usize
    }

    fn erase_block_bounds(&self, byte_addr: usize) -> (usize, usize) {
        let mut base = 0;
        for region in &self.regions {
            let size = region.size as usize;
            let span = size * region.count as usize;
            if byte_addr < base + span {
                let start = base + (byte_addr - base) / size * size;
                return (start, start + size);
            }
            base += span;
        }
        panic!("erase at 0x{:08X} is outside the device", byte_addr);
    }

    fn busy(&mut self) -> bool {
        if self.busy_countdown > 0 {
            self.busy_countdown -= 1;
            true
        } else {
            false
        }
    }
}

impl Transport for MockFlash {
    type Error = Infallible;

    fn send_message(&mut self, cmd: &[u8], recv: &mut [u8]) -> Result<(), Infallible> {
        self.log.push(Transaction {
            cmd: cmd.to_vec(),
            recv_len: recv.len(),
        });

        match cmd[0] {
            // JEDEC identification: the response is padded with zeroes
            // past the end of the real identifier.
            0x9F => {
                for (i, byte) in recv.iter_mut().enumerate() {
                    *byte = self.id.get(i).copied().unwrap_or(0);
                }
            }
            // Standard status register.
            0x05 => {
                recv[0] = if self.busy() { 0x01 } else { 0x00 };
            }
            // DataFlash status register: READY plus the page-size bit.
            0xD7 => {
                let mut status = if self.pow2 { 0x01 } else { 0x00 };
                if !self.busy() {
                    status |= 0x80;
                }
                recv[0] = status;
            }
            0x06 => {
                assert!(!self.dataflash, "write-enable sent to a DataFlash part");
                self.write_enabled = true;
            }
            0x03 => {
                let start = self.byte_address(cmd);
                recv.copy_from_slice(&self.mem[start..start + recv.len()]);
            }
            0x02 => {
                assert!(!self.dataflash, "0x02 program sent to a DataFlash part");
                assert!(self.write_enabled, "page program without write enable");
                let start = self.byte_address(cmd);
                // Programming only clears bits; erased state is 0xFF.
                for (i, &byte) in cmd[4..].iter().enumerate() {
                    self.mem[start + i] &= byte;
                }
                self.write_enabled = false;
                self.busy_countdown = self.busy_polls;
            }
            0x82 => {
                assert!(self.dataflash, "0x82 program sent to a non-DataFlash part");
                let start = self.byte_address(cmd);
                let data = &cmd[4..];
                self.mem[start..start + data.len()].copy_from_slice(data);
                self.busy_countdown = self.busy_polls;
            }
            0xD8 => {
                assert!(!self.dataflash, "block erase sent to a DataFlash part");
                assert!(self.write_enabled, "block erase without write enable");
                let byte_addr = self.byte_address(cmd);
                let (start, end) = self.erase_block_bounds(byte_addr);
                for byte in &mut self.mem[start..end] {
                    *byte = 0xFF;
                }
                self.write_enabled = false;
                self.busy_countdown = self.busy_polls;
            }
            other => panic!("unsupported opcode 0x{:02X}", other),
        }
        Ok(())
    }
}

/// Serializes a folded vendor ID back into its on-wire byte sequence,
/// followed by the big-endian device ID.
fn jedec_bytes(vendor_id: u32, device_id: u16) -> Vec<u8> {
    let mut out: Vec<u8> = vendor_id
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|&b| b == 0)
        .collect();
    out.push((device_id >> 8) as u8);
    out.push(device_id as u8);
    out
}
