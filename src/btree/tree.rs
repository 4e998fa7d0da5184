//! A disk-backed B+ tree: ordered key→value map with page-per-node
//! storage on top of the buffer manager. The tree holds no page memory
//! of its own, only page identifiers; every node access goes through
//! `BufferManager::fix_page`/`unfix_page`.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use super::codec::FixedSize;
use super::node::{is_leaf, InnerLayout, LeafLayout};
use crate::buffer::{BufferManager, PageId};
use crate::error::DbResult;

#[derive(Debug, Clone, Copy)]
pub struct BTreeConfig {
    pub segment_id: u16,
}

enum InsertOutcome<K> {
    NoSplit,
    Split { separator: K, new_page: PageId },
}

/// An ordered key→value map keyed by `K`, page-per-node, built on a
/// [`BufferManager`]. Insert/erase on a single tree are expected to be
/// driven by one thread at a time (lookups may run concurrently with
/// them); the buffer manager is what's required to tolerate arbitrary
/// concurrency, not the tree's own structural edits.
pub struct BTree<'bm, K, V> {
    segment_id: u16,
    buffer_manager: &'bm BufferManager,
    leaf: LeafLayout<K, V>,
    inner: InnerLayout<K>,
    root: Mutex<Option<PageId>>,
    next_page_id: AtomicU64,
}

impl<'bm, K, V> BTree<'bm, K, V>
where
    K: FixedSize + Ord,
    V: FixedSize,
{
    pub fn new(config: BTreeConfig, buffer_manager: &'bm BufferManager) -> Self {
        let page_size = buffer_manager.page_size();
        BTree {
            segment_id: config.segment_id,
            buffer_manager,
            leaf: LeafLayout::new(page_size),
            inner: InnerLayout::new(page_size),
            root: Mutex::new(None),
            next_page_id: AtomicU64::new(1),
        }
    }

    pub fn leaf_capacity(&self) -> usize {
        self.leaf.capacity
    }

    pub fn inner_capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn root_page_id(&self) -> Option<PageId> {
        *self.root.lock()
    }

    fn allocate_page(&self) -> PageId {
        let offset = self.next_page_id.fetch_add(1, Ordering::SeqCst);
        PageId::new(self.segment_id, offset)
    }

    pub fn lookup(&self, key: &K) -> DbResult<Option<V>> {
        let root = match *self.root.lock() {
            Some(r) => r,
            None => return Ok(None),
        };
        self.lookup_recur(root, key)
    }

    fn lookup_recur(&self, page_id: PageId, key: &K) -> DbResult<Option<V>> {
        let frame = self.buffer_manager.fix_page(page_id, false)?;
        if is_leaf(frame.data()) {
            let result = self.leaf.lookup(frame.data(), key);
            self.buffer_manager.unfix_page(frame, false);
            Ok(result)
        } else {
            let idx = self.inner.child_index(frame.data(), key);
            let child = PageId::from_raw(self.inner.child(frame.data(), idx));
            self.buffer_manager.unfix_page(frame, false);
            self.lookup_recur(child, key)
        }
    }

    /// Inserts `key`→`value`, overwriting in place if `key` already
    /// exists. Splits nodes bottom-up as needed and grows the tree's
    /// height when the root itself splits.
    pub fn insert(&self, key: K, value: V) -> DbResult<()> {
        let root = *self.root.lock();
        let root = match root {
            Some(r) => r,
            None => {
                let page_id = self.allocate_page();
                let mut frame = self.buffer_manager.fix_page(page_id, true)?;
                self.leaf.init(frame.data_mut());
                self.leaf.insert(frame.data_mut(), key, value);
                self.buffer_manager.unfix_page(frame, true);
                *self.root.lock() = Some(page_id);
                trace!("btree[{}]: created root leaf {}", self.segment_id, page_id);
                return Ok(());
            }
        };

        match self.insert_recur(root, key, value)? {
            InsertOutcome::NoSplit => {}
            InsertOutcome::Split { separator, new_page } => {
                let new_root_id = self.allocate_page();
                let mut frame = self.buffer_manager.fix_page(new_root_id, true)?;
                self.inner
                    .init_root(frame.data_mut(), root.raw(), separator, new_page.raw());
                self.buffer_manager.unfix_page(frame, true);
                *self.root.lock() = Some(new_root_id);
                debug!(
                    "btree[{}]: root split, new root {} (height increased)",
                    self.segment_id, new_root_id
                );
            }
        }
        Ok(())
    }

    fn insert_recur(&self, page_id: PageId, key: K, value: V) -> DbResult<InsertOutcome<K>> {
        let mut frame = self.buffer_manager.fix_page(page_id, true)?;
        if is_leaf(frame.data()) {
            let count = self.leaf.count(frame.data());
            let overwrite = self.leaf.lookup(frame.data(), &key).is_some();
            if overwrite || count < self.leaf.capacity {
                self.leaf.insert(frame.data_mut(), key, value);
                self.buffer_manager.unfix_page(frame, true);
                return Ok(InsertOutcome::NoSplit);
            }

            let new_page_id = self.allocate_page();
            let mut sibling = self.buffer_manager.fix_page(new_page_id, true)?;
            let separator = self.leaf.split(frame.data_mut(), sibling.data_mut());
            if key < separator {
                self.leaf.insert(frame.data_mut(), key, value);
            } else {
                self.leaf.insert(sibling.data_mut(), key, value);
            }
            trace!("btree[{}]: leaf {} split, separator carried up", self.segment_id, page_id);
            self.buffer_manager.unfix_page(sibling, true);
            self.buffer_manager.unfix_page(frame, true);
            Ok(InsertOutcome::Split { separator, new_page: new_page_id })
        } else {
            let idx = self.inner.child_index(frame.data(), &key);
            let child_id = PageId::from_raw(self.inner.child(frame.data(), idx));
            self.buffer_manager.unfix_page(frame, false);

            match self.insert_recur(child_id, key, value)? {
                InsertOutcome::NoSplit => Ok(InsertOutcome::NoSplit),
                InsertOutcome::Split { separator, new_page } => {
                    let mut frame = self.buffer_manager.fix_page(page_id, true)?;
                    let count = self.inner.count(frame.data());
                    if count <= self.inner.capacity {
                        self.inner.insert(frame.data_mut(), separator, new_page.raw());
                        self.buffer_manager.unfix_page(frame, true);
                        Ok(InsertOutcome::NoSplit)
                    } else {
                        let new_inner_id = self.allocate_page();
                        let mut sibling = self.buffer_manager.fix_page(new_inner_id, true)?;
                        let promoted = self.inner.split(frame.data_mut(), sibling.data_mut());
                        if separator < promoted {
                            self.inner.insert(frame.data_mut(), separator, new_page.raw());
                        } else {
                            self.inner.insert(sibling.data_mut(), separator, new_page.raw());
                        }
                        trace!("btree[{}]: inner {} split, separator promoted", self.segment_id, page_id);
                        self.buffer_manager.unfix_page(sibling, true);
                        self.buffer_manager.unfix_page(frame, true);
                        Ok(InsertOutcome::Split { separator: promoted, new_page: new_inner_id })
                    }
                }
            }
        }
    }

    /// Removes a leaf entry if present. This design does not merge or
    /// redistribute underflowing nodes: erased slots simply vacate and
    /// the tree's height never decreases.
    pub fn erase(&self, key: &K) -> DbResult<()> {
        let root = *self.root.lock();
        if let Some(root) = root {
            self.erase_recur(root, key)?;
        }
        Ok(())
    }

    fn erase_recur(&self, page_id: PageId, key: &K) -> DbResult<()> {
        let mut frame = self.buffer_manager.fix_page(page_id, true)?;
        if is_leaf(frame.data()) {
            self.leaf.erase(frame.data_mut(), key);
            self.buffer_manager.unfix_page(frame, true);
            Ok(())
        } else {
            let idx = self.inner.child_index(frame.data(), key);
            let child_id = PageId::from_raw(self.inner.child(frame.data(), idx));
            self.buffer_manager.unfix_page(frame, false);
            self.erase_recur(child_id, key)
        }
    }
}
