// Default address-space geometry: a 1 MiWord virtual space over a 1 KiWord
// physical memory, sixteen-word pages, four page-table levels.
pub const OFFSET_WIDTH: u32 = 4;
pub const VIRTUAL_ADDRESS_WIDTH: u32 = 20;
pub const PHYSICAL_ADDRESS_WIDTH: u32 = 10;
pub const TABLES_DEPTH: u32 = (VIRTUAL_ADDRESS_WIDTH - OFFSET_WIDTH) / OFFSET_WIDTH;

pub const PAGE_SIZE: u64 = 1 << OFFSET_WIDTH;
pub const NUM_FRAMES: u64 = 1 << (PHYSICAL_ADDRESS_WIDTH - OFFSET_WIDTH);
pub const NUM_PAGES: u64 = 1 << (VIRTUAL_ADDRESS_WIDTH - OFFSET_WIDTH);
pub const VIRTUAL_MEMORY_SIZE: u64 = 1 << VIRTUAL_ADDRESS_WIDTH;
pub const PHYSICAL_MEMORY_SIZE: u64 = 1 << PHYSICAL_ADDRESS_WIDTH;

/// Memory word. Signed, wide enough to hold any frame index and any stored
/// value.
pub type Word = i64;
