//! The supported-chip database.
//!
//! Each supported (vendor, device, configuration) triple gets one
//! [`FlashChip`] descriptor, so many disparate chips can be driven
//! through the same API. The overall shape follows the descriptor tables
//! of the flashrom project.

/// A contiguous run of identically-sized erase blocks.
///
/// This is not one entry per eraseable address range but one per range
/// *type*: a chip split into eight 64 KiB blocks uses a single
/// `{65536, 8}` region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseRegion {
    /// Size of each block in this run, in bytes.
    pub size: u32,
    /// Number of consecutive blocks of this size.
    pub count: u32,
}

/// Page-size configuration of a DataFlash part.
///
/// DataFlash chips power up in either their native page size (264 or 528
/// bytes) or the nearest power of two, depending on a one-time
/// configuration bit. The two configurations differ in capacity and
/// addressing, so each gets its own table entry: the native entry first,
/// its power-of-two sibling immediately after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizing {
    /// Native page size. Identification probes the configuration bit and
    /// advances to the sibling entry when it is set.
    Native,
    /// Power-of-two page size; only ever reached through the sibling of a
    /// `Native` entry.
    PowerOfTwo,
}

/// Command behaviour shared by a family of chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Ordinary NOR parts: block erase 0xD8 and page program 0x02, each
    /// preceded by write-enable 0x06 and followed by polling the 0x05
    /// status register until the write-in-progress bit clears.
    Standard,
    /// Atmel DataFlash: page program 0x82 through the on-chip buffer with
    /// built-in erase (so block erase is a no-op), polling the 0xD7
    /// status register until the ready bit sets.
    DataFlash(PageSizing),
}

/// Descriptor for one supported chip configuration.
#[derive(Debug)]
pub struct FlashChip {
    /// Vendor name, for display only.
    pub vendor: &'static str,
    /// Device name, for display only.
    pub name: &'static str,
    /// JEDEC manufacturer ID with any 0x7F continuation bytes folded in.
    pub vendor_id: u32,
    /// 16-bit device ID.
    pub device_id: u16,
    /// Total capacity in KiB.
    pub capacity_kib: u32,
    /// Native page size in bytes. Not necessarily a power of two.
    pub page_size: u32,
    /// log2 of the page stride in the chip's address space. A page number
    /// shifted left by this many bits yields the flash address of the
    /// page; when `page_size < 2^bit_shift` the gap bit-positions encode
    /// the page boundary the way the chip expects.
    pub bit_shift: u32,
    /// Erase layout, in address order. Regions concatenate to cover the
    /// device exactly.
    pub erase_regions: &'static [EraseRegion],
    /// Which command family drives this chip.
    pub family: Family,
}

impl FlashChip {
    /// Total capacity in bytes.
    pub fn capacity(&self) -> u32 {
        self.capacity_kib * 1024
    }

    /// Whether this descriptor matches the given JEDEC identification.
    pub fn matches(&self, vendor_id: u32, device_id: u16) -> bool {
        self.vendor_id == vendor_id && self.device_id == device_id
    }
}

const AMIC: u32 = 0x7F37;
const ATMEL: u32 = 0x1F;
const ST: u32 = 0x20;
const WINBOND: u32 = 0xEF;

/// Every chip configuration the engine knows how to program.
///
/// Ordering matters for DataFlash parts: the identification step resolves
/// a power-of-two configuration by advancing from the `Native` entry to
/// the slot right after it.
pub static CHIPS: &[FlashChip] = &[
    FlashChip {
        vendor: "AMIC",
        name: "A25L05PT",
        vendor_id: AMIC,
        device_id: 0x2020,
        capacity_kib: 64,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[
            EraseRegion { size: 32 * 1024, count: 1 },
            EraseRegion { size: 16 * 1024, count: 1 },
            EraseRegion { size: 8 * 1024, count: 1 },
            EraseRegion { size: 4 * 1024, count: 2 },
        ],
        family: Family::Standard,
    },
    FlashChip {
        vendor: "AMIC",
        name: "A25L40PT",
        vendor_id: AMIC,
        device_id: 0x2013,
        capacity_kib: 512,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[
            EraseRegion { size: 64 * 1024, count: 7 },
            EraseRegion { size: 32 * 1024, count: 1 },
            EraseRegion { size: 16 * 1024, count: 1 },
            EraseRegion { size: 8 * 1024, count: 1 },
            EraseRegion { size: 4 * 1024, count: 2 },
        ],
        family: Family::Standard,
    },
    FlashChip {
        vendor: "Micron/Numonyx/ST",
        name: "M25P10",
        vendor_id: ST,
        device_id: 0x2011,
        capacity_kib: 128,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[EraseRegion { size: 32 * 1024, count: 4 }],
        family: Family::Standard,
    },
    FlashChip {
        vendor: "Micron/Numonyx/ST",
        name: "M25P40",
        vendor_id: ST,
        device_id: 0x2013,
        capacity_kib: 512,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[EraseRegion { size: 64 * 1024, count: 8 }],
        family: Family::Standard,
    },
    FlashChip {
        vendor: "Micron/Numonyx/ST",
        name: "N25Q128",
        vendor_id: ST,
        device_id: 0xBA18,
        capacity_kib: 16384,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[EraseRegion { size: 64 * 1024, count: 256 }],
        family: Family::Standard,
    },
    FlashChip {
        vendor: "Atmel",
        name: "AT45DB041D",
        vendor_id: ATMEL,
        device_id: 0x2400,
        capacity_kib: 528,
        page_size: 264,
        bit_shift: 9,
        erase_regions: &[EraseRegion { size: 264, count: 2048 }],
        family: Family::DataFlash(PageSizing::Native),
    },
    FlashChip {
        vendor: "Atmel",
        name: "AT45DB041D",
        vendor_id: ATMEL,
        device_id: 0x2400,
        capacity_kib: 512,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[EraseRegion { size: 256, count: 2048 }],
        family: Family::DataFlash(PageSizing::PowerOfTwo),
    },
    FlashChip {
        vendor: "Atmel",
        name: "AT45DB161D",
        vendor_id: ATMEL,
        device_id: 0x2600,
        capacity_kib: 2112,
        page_size: 528,
        bit_shift: 10,
        erase_regions: &[EraseRegion { size: 528, count: 4096 }],
        family: Family::DataFlash(PageSizing::Native),
    },
    FlashChip {
        vendor: "Atmel",
        name: "AT45DB161D",
        vendor_id: ATMEL,
        device_id: 0x2600,
        capacity_kib: 2048,
        page_size: 512,
        bit_shift: 9,
        erase_regions: &[EraseRegion { size: 512, count: 4096 }],
        family: Family::DataFlash(PageSizing::PowerOfTwo),
    },
    FlashChip {
        vendor: "Winbond",
        name: "W25Q64.V",
        vendor_id: WINBOND,
        device_id: 0x4017,
        capacity_kib: 8192,
        page_size: 256,
        bit_shift: 8,
        erase_regions: &[EraseRegion { size: 64 * 1024, count: 128 }],
        family: Family::Standard,
    },
];
