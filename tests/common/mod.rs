//! Helpers shared by the integration tests.

#![allow(dead_code)]

use pageindex::{BTreeIndex, IndexConfig, OpenMode, PageId, RecordId};
use std::path::Path;
use tempfile::TempDir;

/// Deterministic locator for a key so lookups can be checked without a map.
pub fn rid_for(key: i32) -> RecordId {
    RecordId::new(PageId::new(key as u32 % 100_000), key as u32)
}

pub fn small_config(max_keys: usize) -> IndexConfig {
    IndexConfig::default()
        .with_max_leaf_keys(max_keys)
        .with_max_internal_keys(max_keys)
}

pub fn open_small(path: &Path, max_keys: usize) -> BTreeIndex {
    BTreeIndex::open_with_config(path, OpenMode::ReadWrite, small_config(max_keys)).unwrap()
}

pub fn create_small(max_keys: usize) -> (BTreeIndex, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let index = open_small(&dir.path().join("test.idx"), max_keys);
    (index, dir)
}

/// All keys in leaf-chain order.
pub fn scan_keys(index: &BTreeIndex) -> Vec<i32> {
    index.iter().unwrap().map(|e| e.unwrap().0).collect()
}

/// Leaf contents grouped by page, in leaf-chain order.
pub fn leaf_chain(index: &BTreeIndex) -> Vec<Vec<i32>> {
    let mut leaves = Vec::new();
    let (mut cursor, _) = index.locate(i32::MIN).unwrap();
    let mut current = PageId::INVALID;
    while !cursor.is_end() {
        if cursor.pid != current {
            current = cursor.pid;
            leaves.push(Vec::new());
        }
        let (key, _) = index.read_forward(&mut cursor).unwrap();
        if let Some(leaf) = leaves.last_mut() {
            leaf.push(key);
        }
    }
    leaves
}

/// Walk the tree from the root, checking every key against the bounds its
/// ancestors imply, and return the leaf page ids left to right.
///
/// Panics if a node is out of order, a key escapes its bounds, or leaves
/// sit at different depths.
pub fn check_structure(index: &BTreeIndex) -> Vec<PageId> {
    let mut leaves = Vec::new();
    if !index.is_empty() {
        walk(index, index.root_pid(), 1, None, None, &mut leaves);
    }
    leaves
}

fn walk(
    index: &BTreeIndex,
    pid: PageId,
    depth: u32,
    lo: Option<i32>,
    hi: Option<i32>,
    leaves: &mut Vec<PageId>,
) {
    let in_bounds =
        |k: i32| lo.map_or(true, |lo| k >= lo) && hi.map_or(true, |hi| k < hi);

    if depth == index.tree_height() {
        let keys = index.read_leaf(pid).unwrap().keys();
        assert!(!keys.is_empty(), "empty leaf {}", pid);
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "unsorted leaf {}", pid);
        assert!(keys.iter().all(|&k| in_bounds(k)), "leaf {} out of bounds", pid);
        leaves.push(pid);
        return;
    }

    let node = index.read_internal(pid).unwrap();
    let keys = node.keys();
    let children = node.children();
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "unsorted node {}", pid);
    assert!(keys.iter().all(|&k| in_bounds(k)), "node {} out of bounds", pid);

    for (i, &child) in children.iter().enumerate() {
        let child_lo = if i == 0 { lo } else { Some(keys[i - 1]) };
        let child_hi = if i == keys.len() { hi } else { Some(keys[i]) };
        walk(index, child, depth + 1, child_lo, child_hi, leaves);
    }
}

/// Leaf page ids by following next pointers from the leftmost leaf.
pub fn chain_pages(index: &BTreeIndex) -> Vec<PageId> {
    let mut pages = Vec::new();
    let Some(&first) = check_structure(index).first() else {
        return pages;
    };
    let mut pid = first;
    while pid.is_valid() {
        pages.push(pid);
        pid = index.read_leaf(pid).unwrap().next_node_ptr();
    }
    pages
}
