//! Walking the erase layout of a chip.
//!
//! Flash can only be erased at a coarse granularity, often 64 KiB, so a
//! write must be planned in terms of the erase blocks it touches. Given a
//! byte range, [`RegionWalker`] yields every block that intersects it, in
//! address order, along with how many payload bytes land in each.

use crate::chips::{EraseRegion, FlashChip};
use crate::error::Error;

/// One erase block touched by a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Byte address of the start of the block.
    pub addr: u32,
    /// Payload bytes that fall inside this block. Equal to the block size
    /// except in the trailing block of an unaligned-length range.
    pub len: u32,
}

/// Iterator over the erase blocks covered by `[addr, addr + len)`.
///
/// Construction validates the range; iteration is infallible and touches
/// no hardware. The consumer decides what to do per block.
#[derive(Debug)]
pub struct RegionWalker {
    regions: &'static [EraseRegion],
    region_idx: usize,
    blocks_left: u32,
    cumulative: u32,
    remaining: u32,
}

impl RegionWalker {
    /// Plans a walk of every erase block intersecting
    /// `[addr, addr + len)`.
    ///
    /// Fails with [`Error::OutOfRange`] when the range runs past the
    /// device capacity and with [`Error::Misaligned`] when `addr` falls
    /// inside an erase block rather than on its boundary.
    pub fn new<E>(chip: &FlashChip, addr: u32, len: u32) -> Result<RegionWalker, Error<E>> {
        if u64::from(addr) + u64::from(len) > u64::from(chip.capacity()) {
            return Err(Error::OutOfRange {
                addr,
                len,
                capacity_kib: chip.capacity_kib,
            });
        }

        let regions = chip.erase_regions;
        let mut region_idx = 0;
        let mut blocks_left = regions.first().map_or(0, |r| r.count);
        let mut block_size = regions.first().map_or(0, |r| r.size);
        let mut cumulative: u32 = 0;

        // Skip whole blocks below the start of the range. The coverage
        // invariant (regions sum to the capacity) together with the range
        // check above keeps the indexing in bounds.
        while cumulative < addr {
            if blocks_left == 0 {
                region_idx += 1;
                blocks_left = regions[region_idx].count;
            }
            block_size = regions[region_idx].size;
            cumulative += block_size;
            blocks_left -= 1;
        }
        if cumulative > addr {
            return Err(Error::Misaligned {
                lower: cumulative - block_size,
                upper: cumulative,
            });
        }

        Ok(RegionWalker {
            regions,
            region_idx,
            blocks_left,
            cumulative,
            remaining: len,
        })
    }
}

impl Iterator for RegionWalker {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.remaining == 0 {
            return None;
        }
        if self.blocks_left == 0 {
            self.region_idx += 1;
            if self.region_idx >= self.regions.len() {
                return None;
            }
            self.blocks_left = self.regions[self.region_idx].count;
        }

        let size = self.regions[self.region_idx].size;
        let block = Block {
            addr: self.cumulative,
            len: self.remaining.min(size),
        };
        self.cumulative += size;
        self.remaining -= block.len;
        self.blocks_left -= 1;
        Some(block)
    }
}
