//! The 2Q buffer manager: a fixed-size slab of frames, a directory mutex
//! protecting frame bookkeeping (hash table + FIFO/LRU membership), and a
//! per-frame latch protecting the page bytes themselves.
//!
//! Frames are a `Vec<RwLock<Vec<u8>>>` indexed by slot number (the slab
//! the design notes call for), so the FIFO/LRU lists are intrusive
//! doubly-linked lists of slot indices rather than a graph of
//! reference-counted nodes.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, trace};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::file_store::FileStore;
use super::page_id::PageId;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Copy)]
pub struct BufferPoolConfig {
    pub page_size: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queue {
    Fifo,
    Lru,
}

/// Bookkeeping for one frame slot. Mutated only while the directory mutex
/// is held; the page bytes themselves live in a separate per-slot latch.
struct SlotMeta {
    page_id: Option<PageId>,
    pinned: usize,
    dirty: bool,
    queue: Option<Queue>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl SlotMeta {
    fn empty() -> Self {
        SlotMeta {
            page_id: None,
            pinned: 0,
            dirty: false,
            queue: None,
            prev: None,
            next: None,
        }
    }
}

struct LinkedList {
    head: Option<usize>,
    tail: Option<usize>,
}

impl LinkedList {
    fn empty() -> Self {
        LinkedList { head: None, tail: None }
    }
}

struct Directory {
    slot_of: HashMap<PageId, usize>,
    slots: Vec<SlotMeta>,
    free: Vec<usize>,
    fifo: LinkedList,
    lru: LinkedList,
}

impl Directory {
    fn new(page_count: usize) -> Self {
        let mut slots = Vec::with_capacity(page_count);
        let mut free = Vec::with_capacity(page_count);
        for i in 0..page_count {
            slots.push(SlotMeta::empty());
            free.push(page_count - 1 - i); // pop() hands out slot 0 first
        }
        Directory {
            slot_of: HashMap::new(),
            slots,
            free,
            fifo: LinkedList::empty(),
            lru: LinkedList::empty(),
        }
    }

    fn list_mut(&mut self, queue: Queue) -> &mut LinkedList {
        match queue {
            Queue::Fifo => &mut self.fifo,
            Queue::Lru => &mut self.lru,
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next, queue) = {
            let m = &self.slots[slot];
            (m.prev, m.next, m.queue)
        };
        let queue = match queue {
            Some(q) => q,
            None => return,
        };
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.list_mut(queue).head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.list_mut(queue).tail = prev,
        }
        self.slots[slot].prev = None;
        self.slots[slot].next = None;
        self.slots[slot].queue = None;
    }

    /// Inserts `slot` at the head of `queue`.
    fn insert_head(&mut self, slot: usize, queue: Queue) {
        let old_head = self.list_mut(queue).head;
        self.slots[slot].prev = None;
        self.slots[slot].next = old_head;
        self.slots[slot].queue = Some(queue);
        if let Some(h) = old_head {
            self.slots[h].prev = Some(slot);
        } else {
            self.list_mut(queue).tail = Some(slot);
        }
        self.list_mut(queue).head = Some(slot);
    }

    /// Applies the 2Q promotion rule for a hit on `slot`.
    fn touch(&mut self, slot: usize) {
        match self.slots[slot].queue {
            Some(Queue::Fifo) => {
                self.unlink(slot);
                self.insert_head(slot, Queue::Lru);
            }
            Some(Queue::Lru) => {
                self.unlink(slot);
                self.insert_head(slot, Queue::Lru);
            }
            None => unreachable!("touched slot must be resident"),
        }
    }

    /// Scans a queue from its tail (oldest end) for the first unpinned
    /// slot.
    fn find_unpinned_from_tail(&self, queue: Queue) -> Option<usize> {
        let list = match queue {
            Queue::Fifo => &self.fifo,
            Queue::Lru => &self.lru,
        };
        let mut cur = list.tail;
        while let Some(slot) = cur {
            if self.slots[slot].pinned == 0 {
                return Some(slot);
            }
            cur = self.slots[slot].prev;
        }
        None
    }

    /// Lists a queue's resident page ids in the order its callers expect:
    /// LRU head (most-recently-touched) to tail; FIFO tail (oldest
    /// arrival) to head. Both lists are built with `insert_head`, so the
    /// head is always the most-recently-inserted/touched slot — FIFO's
    /// documented oldest-first order means walking it tail-to-head.
    fn to_vec(&self, queue: Queue) -> Vec<PageId> {
        let list = match queue {
            Queue::Fifo => &self.fifo,
            Queue::Lru => &self.lru,
        };
        let mut out = Vec::new();
        match queue {
            Queue::Fifo => {
                let mut cur = list.tail;
                while let Some(slot) = cur {
                    out.push(self.slots[slot].page_id.expect("listed slot must be resident"));
                    cur = self.slots[slot].prev;
                }
            }
            Queue::Lru => {
                let mut cur = list.head;
                while let Some(slot) = cur {
                    out.push(self.slots[slot].page_id.expect("listed slot must be resident"));
                    cur = self.slots[slot].next;
                }
            }
        }
        out
    }
}

struct ReservedSlot {
    slot: usize,
    /// Page id to write back if the victim frame was dirty. The bytes
    /// themselves are read after the directory lock is released — frame
    /// content is never touched while holding it.
    writeback_id: Option<PageId>,
}

/// A fixed-size cache of pages implementing 2Q replacement with per-page
/// shared/exclusive latching.
pub struct BufferManager {
    page_size: usize,
    page_count: usize,
    directory: parking_lot::Mutex<Directory>,
    frames: Vec<RwLock<Vec<u8>>>,
    store: FileStore,
}

/// Either half of a page's shared/exclusive latch, held for the duration
/// of the caller's access and released by `unfix_page`.
enum LatchGuard<'a> {
    Shared(RwLockReadGuard<'a, Vec<u8>>),
    Exclusive(RwLockWriteGuard<'a, Vec<u8>>),
}

/// A reference to one resident page, returned by `fix_page`. Must be
/// passed back to `unfix_page` to release the pin and the latch.
pub struct PageGuard<'a> {
    page_id: PageId,
    slot: usize,
    guard: LatchGuard<'a>,
}

impl<'a> PageGuard<'a> {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &[u8] {
        match &self.guard {
            LatchGuard::Shared(g) => g,
            LatchGuard::Exclusive(g) => g,
        }
    }

    /// Panics if this guard only holds a shared latch — writing through
    /// a shared fix is a programmer contract violation (§7).
    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.guard {
            LatchGuard::Exclusive(g) => g,
            LatchGuard::Shared(_) => panic!("data_mut called on a page fixed shared"),
        }
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self.guard, LatchGuard::Exclusive(_))
    }
}

impl BufferManager {
    pub fn new(config: BufferPoolConfig, base_dir: impl AsRef<Path>) -> DbResult<Self> {
        Ok(BufferManager {
            page_size: config.page_size,
            page_count: config.page_count,
            directory: parking_lot::Mutex::new(Directory::new(config.page_count)),
            frames: (0..config.page_count)
                .map(|_| RwLock::new(vec![0u8; config.page_size]))
                .collect(),
            store: FileStore::new(base_dir)?,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Fixes a page into the buffer, reading it from disk on a miss.
    /// Returns `BufferFull` when all resident frames are pinned and a new
    /// page must be read.
    pub fn fix_page(&self, page_id: PageId, exclusive: bool) -> DbResult<PageGuard<'_>> {
        enum Plan {
            Hit(usize),
            Miss(ReservedSlot),
        }

        let plan = {
            let mut dir = self.directory.lock();
            if let Some(&slot) = dir.slot_of.get(&page_id) {
                dir.touch(slot);
                dir.slots[slot].pinned += 1;
                Plan::Hit(slot)
            } else {
                let slot = match dir.free.pop() {
                    Some(slot) => slot,
                    None => match dir
                        .find_unpinned_from_tail(Queue::Fifo)
                        .or_else(|| dir.find_unpinned_from_tail(Queue::Lru))
                    {
                        Some(slot) => slot,
                        None => {
                            debug!("fix_page({}): buffer full, all frames pinned", page_id);
                            return Err(DbError::BufferFull(self.page_count));
                        }
                    },
                };

                let evicted = dir.slots[slot].page_id.take();
                let was_dirty = dir.slots[slot].dirty;
                if evicted.is_some() {
                    dir.unlink(slot);
                    dir.slot_of.remove(&evicted.unwrap());
                }

                dir.slots[slot] = SlotMeta {
                    page_id: Some(page_id),
                    pinned: 1,
                    dirty: false,
                    queue: None,
                    prev: None,
                    next: None,
                };
                dir.insert_head(slot, Queue::Fifo);
                dir.slot_of.insert(page_id, slot);

                let writeback_id = match evicted {
                    Some(old_id) if was_dirty => Some(old_id),
                    _ => None,
                };

                Plan::Miss(ReservedSlot { slot, writeback_id })
            }
        };

        match plan {
            Plan::Hit(slot) => {
                trace!("fix_page({}): hit, slot {}", page_id, slot);
                Ok(self.latch(page_id, slot, exclusive))
            }
            Plan::Miss(reserved) => {
                if let Some(old_id) = reserved.writeback_id {
                    debug!("evicting dirty page {} to make room for {}", old_id, page_id);
                    // Read the victim's bytes outside the directory lock.
                    // No other caller can reach this slot concurrently:
                    // it was claimed (pinned, mapped in `slot_of`) only
                    // under that lock, before it was released.
                    let bytes = self.frames[reserved.slot].read().clone();
                    self.store.write_page(old_id, &bytes)?;
                }
                let bytes = self.store.read_page(page_id, self.page_size)?;
                {
                    let mut buf = self.frames[reserved.slot].write();
                    buf.copy_from_slice(&bytes);
                }
                trace!("fix_page({}): miss, installed in slot {}", page_id, reserved.slot);
                Ok(self.latch(page_id, reserved.slot, exclusive))
            }
        }
    }

    fn latch(&self, page_id: PageId, slot: usize, exclusive: bool) -> PageGuard<'_> {
        let guard = if exclusive {
            LatchGuard::Exclusive(self.frames[slot].write())
        } else {
            LatchGuard::Shared(self.frames[slot].read())
        };
        PageGuard { page_id, slot, guard }
    }

    /// Decrements the pin count and, if `dirty`, marks the frame dirty.
    /// Releases the latch by dropping `guard`.
    pub fn unfix_page(&self, guard: PageGuard<'_>, dirty: bool) {
        let slot = guard.slot;
        {
            let mut dir = self.directory.lock();
            if dirty {
                dir.slots[slot].dirty = true;
            }
            debug_assert!(dir.slots[slot].pinned > 0, "unfixing a frame that isn't pinned");
            dir.slots[slot].pinned -= 1;
        }
        // `guard` drops here, releasing the latch.
    }

    /// Page ids resident in the FIFO list, head (oldest) to tail (newest).
    /// Inspection-only; not synchronized with concurrent mutators.
    pub fn get_fifo_list(&self) -> Vec<PageId> {
        self.directory.lock().to_vec(Queue::Fifo)
    }

    /// Page ids resident in the LRU list, head (most-recent) to tail
    /// (least-recent). Inspection-only.
    pub fn get_lru_list(&self) -> Vec<PageId> {
        self.directory.lock().to_vec(Queue::Lru)
    }

    /// Flushes every dirty resident page to disk. Called by `Drop`, and
    /// callable directly for an explicit checkpoint.
    pub fn flush_all(&self) -> DbResult<()> {
        let dirty: Vec<(PageId, usize)> = {
            let dir = self.directory.lock();
            dir.slots
                .iter()
                .enumerate()
                .filter_map(|(slot, meta)| {
                    if meta.dirty {
                        meta.page_id.map(|id| (id, slot))
                    } else {
                        None
                    }
                })
                .collect()
        };
        for (page_id, slot) in dirty {
            let bytes = self.frames[slot].read().clone();
            self.store.write_page(page_id, &bytes)?;
        }
        Ok(())
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all() {
            log::error!("failed to flush buffer pool on shutdown: {}", e);
        }
    }
}
