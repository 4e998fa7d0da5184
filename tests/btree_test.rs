use buzzdb_core::btree::{BTree, BTreeConfig, Char16};
use buzzdb_core::buffer::{BufferManager, BufferPoolConfig};

fn manager(page_size: usize, page_count: usize) -> (BufferManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let bm = BufferManager::new(BufferPoolConfig { page_size, page_count }, dir.path()).unwrap();
    (bm, dir)
}

#[test]
fn keys_survive_a_working_set_larger_than_the_buffer_pool() {
    // Only 4 resident frames, but the tree will span far more than 4
    // pages once fully populated; this exercises eviction and reload of
    // B+ tree pages mid-traversal.
    let (bm, _dir) = manager(256, 4);
    let tree: BTree<i64, i64> = BTree::new(BTreeConfig { segment_id: 1 }, &bm);
    for k in 0..2000i64 {
        tree.insert(k, k * 3).unwrap();
    }
    for k in 0..2000i64 {
        assert_eq!(tree.lookup(&k).unwrap(), Some(k * 3));
    }
}

#[test]
fn string_keyed_tree_round_trips_fixed_width_strings() {
    let (bm, _dir) = manager(512, 16);
    let tree: BTree<Char16, i64> = BTree::new(BTreeConfig { segment_id: 2 }, &bm);
    let names = ["alice", "bob", "carol", "dave", "eve"];
    for (i, name) in names.iter().enumerate() {
        tree.insert(Char16::from_str(name), i as i64).unwrap();
    }
    for (i, name) in names.iter().enumerate() {
        assert_eq!(tree.lookup(&Char16::from_str(name)).unwrap(), Some(i as i64));
    }
    assert_eq!(tree.lookup(&Char16::from_str("nobody")).unwrap(), None);
}

#[test]
fn erase_then_reinsert_a_key_is_observable() {
    let (bm, _dir) = manager(256, 8);
    let tree: BTree<i64, i64> = BTree::new(BTreeConfig { segment_id: 0 }, &bm);
    for k in 0..100i64 {
        tree.insert(k, k).unwrap();
    }
    for k in (0..100i64).step_by(2) {
        tree.erase(&k).unwrap();
    }
    for k in 0..100i64 {
        if k % 2 == 0 {
            assert_eq!(tree.lookup(&k).unwrap(), None);
        } else {
            assert_eq!(tree.lookup(&k).unwrap(), Some(k));
        }
    }
    tree.insert(0, 999).unwrap();
    assert_eq!(tree.lookup(&0).unwrap(), Some(999));
}

#[test]
fn two_trees_in_different_segments_do_not_collide() {
    let (bm, _dir) = manager(256, 16);
    let a: BTree<i64, i64> = BTree::new(BTreeConfig { segment_id: 10 }, &bm);
    let b: BTree<i64, i64> = BTree::new(BTreeConfig { segment_id: 20 }, &bm);
    for k in 0..50i64 {
        a.insert(k, 1).unwrap();
        b.insert(k, 2).unwrap();
    }
    for k in 0..50i64 {
        assert_eq!(a.lookup(&k).unwrap(), Some(1));
        assert_eq!(b.lookup(&k).unwrap(), Some(2));
    }
}
