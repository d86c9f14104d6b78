use log::{debug, trace};

use crate::constants::Word;
use crate::error::VmError;
use crate::memory::{BackingStore, PhysicalMemory};
use crate::translation::{MemoryLayout, VirtualAddress};

/// Frame 0 permanently hosts the root page table.
pub const ROOT_FRAME: u64 = 0;

#[derive(Clone, Copy)]
enum Access {
    Read,
    Write(Word),
}

/// Distance between two page numbers on the page-number ring. The absolute
/// difference is taken in the unsigned domain so large spaces cannot
/// overflow a signed subtraction.
fn cyclic_distance(a: u64, b: u64, num_pages: u64) -> u64 {
    let d = a.abs_diff(b);
    d.min(num_pages - d)
}

/// Facts gathered by one depth-first sweep of the reachable page-table
/// tree. A sweep that finds a reclaimable table returns early, leaving the
/// other fields incomplete, so a scan is never reused across allocations.
struct TreeScan {
    target_page: u64,
    exclude: u64,
    max_frame: u64,
    victim: Option<Victim>,
}

#[derive(Clone, Copy)]
struct Victim {
    frame: u64,
    page: u64,
    parent_slot: u64,
    distance: u64,
}

impl TreeScan {
    fn new(exclude: u64, target_page: u64) -> Self {
        TreeScan {
            target_page,
            exclude,
            max_frame: 0,
            victim: None,
        }
    }

    /// Offer a resident data page as an eviction candidate. Ties go to the
    /// candidate seen last in traversal order.
    fn offer_victim(&mut self, frame: u64, page: u64, parent_slot: u64, num_pages: u64) {
        let distance = cyclic_distance(self.target_page, page, num_pages);
        let better = match self.victim {
            Some(current) => distance >= current.distance,
            None => true,
        };
        if better {
            self.victim = Some(Victim {
                frame,
                page,
                parent_slot,
                distance,
            });
        }
    }
}

/// Demand-paged virtual memory over a bounded physical word array. Missing
/// page-table levels are materialized during the walk; when no frame is
/// free, a resident page is pushed out to the backing store.
pub struct VmManager {
    layout: MemoryLayout,
    memory: PhysicalMemory,
    store: BackingStore,
}

impl VmManager {
    /// Create a manager with zeroed physical memory; frame 0 thereby starts
    /// as an empty root table.
    pub fn new(layout: MemoryLayout) -> Self {
        VmManager {
            memory: PhysicalMemory::new(&layout),
            store: BackingStore::new(),
            layout,
        }
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    pub fn store(&self) -> &BackingStore {
        &self.store
    }

    /// Drop every resident page and saved image and return to the
    /// just-initialized state. Clearing the whole array (not only the root)
    /// keeps the untouched-frames-are-zero rule intact.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.store.clear();
    }

    /// Read the word at virtual `address`
    pub fn read(&mut self, address: u64) -> Result<Word, VmError> {
        self.check_access(address)?;
        let va = VirtualAddress::decode(address, &self.layout);
        Ok(self.walk(va, ROOT_FRAME, 1, Access::Read))
    }

    /// Write `value` at virtual `address`
    pub fn write(&mut self, address: u64, value: Word) -> Result<(), VmError> {
        self.check_access(address)?;
        let va = VirtualAddress::decode(address, &self.layout);
        self.walk(va, ROOT_FRAME, 1, Access::Write(value));
        Ok(())
    }

    /// Both rejection causes precede any side effect.
    fn check_access(&self, address: u64) -> Result<(), VmError> {
        if !self.layout.is_feasible() {
            return Err(VmError::InfeasibleLayout(self.layout));
        }
        if address >= self.layout.virtual_memory_size() {
            return Err(VmError::AddressOutOfRange {
                address,
                width: self.layout.virtual_address_width,
            });
        }
        Ok(())
    }

    /// Recursive descent from `frame` at `depth` (1-based). A zero slot is a
    /// miss: a frame is obtained, installed in the slot, and either cleared
    /// (interior table) or restored from the backing store (data page).
    fn walk(&mut self, va: VirtualAddress, frame: u64, depth: u32, access: Access) -> Word {
        let slot_addr = self.memory.frame_base(frame) + va.table_slot(&self.layout, depth);
        let link = self.memory.read(slot_addr);
        let child = if link == 0 {
            // The current frame is about to receive the new link, so it is
            // off limits for reclaim during this allocation.
            let adopted = self.allocate(frame, va.page);
            self.memory.write(slot_addr, adopted as Word);
            if depth == self.layout.tables_depth {
                trace!("page {} restored into frame {}", va.page, adopted);
                self.store.restore(&mut self.memory, adopted, va.page);
            } else {
                self.memory.clear_frame(adopted);
            }
            adopted
        } else {
            link as u64
        };
        if depth == self.layout.tables_depth {
            let cell = self.memory.frame_base(child) + va.offset;
            match access {
                Access::Read => self.memory.read(cell),
                Access::Write(value) => {
                    self.memory.write(cell, value);
                    value
                }
            }
        } else {
            self.walk(va, child, depth + 1, access)
        }
    }

    /// Pick the frame that will host a new table or a restored page, in
    /// priority order: a reclaimable empty table, then the first frame past
    /// the highest index in use, then eviction of the resident page farthest
    /// (cyclically) from `target_page`.
    fn allocate(&mut self, exclude: u64, target_page: u64) -> u64 {
        let mut scan = TreeScan::new(exclude, target_page);
        if let Some(frame) = self.sweep(ROOT_FRAME, 1, 0, &mut scan) {
            debug!("reclaimed empty table frame {frame}");
            return frame;
        }
        let untouched = scan.max_frame + 1;
        if untouched < self.layout.num_frames() {
            trace!("using untouched frame {untouched}");
            return untouched;
        }
        // Feasibility guarantees a resident page once every frame is in use.
        let victim = scan
            .victim
            .expect("full tree holds at least one resident page");
        debug!(
            "evicting page {} from frame {} (distance {})",
            victim.page, victim.frame, victim.distance
        );
        self.store.evict(&self.memory, victim.frame, victim.page);
        self.memory.write(victim.parent_slot, 0);
        victim.frame
    }

    /// One depth-first pass over the reachable tree, slots in ascending
    /// order. Returns the first all-zero interior table that is not
    /// `scan.exclude`, already unlinked from its parent; `scan` accumulates
    /// the high-water mark and the eviction candidate along the way. The
    /// accumulated `page_prefix` becomes the full page number at leaf depth.
    fn sweep(&mut self, frame: u64, depth: u32, page_prefix: u64, scan: &mut TreeScan) -> Option<u64> {
        let base = self.memory.frame_base(frame);
        for slot in 0..self.layout.page_size() {
            let link = self.memory.read(base + slot);
            if link == 0 {
                continue;
            }
            let child = link as u64;
            if child > scan.max_frame {
                scan.max_frame = child;
            }
            let child_page = (page_prefix << self.layout.offset_width) | slot;
            if depth == self.layout.tables_depth {
                scan.offer_victim(child, child_page, base + slot, self.layout.num_pages());
            } else {
                if child != scan.exclude && self.memory.frame_is_zero(child) {
                    self.memory.write(base + slot, 0);
                    return Some(child);
                }
                if let Some(found) = self.sweep(child, depth + 1, child_page, scan) {
                    return Some(found);
                }
            }
        }
        None
    }
}
