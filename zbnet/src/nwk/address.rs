//! Cskip distributed address assignment and tree routing.
//!
//! Every router at depth `d` owns a contiguous address block. Router child
//! `k` (0-based) gets the sub-block starting at `parent + 1 + k * Cskip(d)`;
//! end-device child `n` (0-based) gets the single address
//! `parent + Rm * Cskip(d) + 1 + n`. The block sizes are a closed form of
//! the tree parameters, so a node's depth and the next hop toward any
//! address can be recovered from arithmetic alone, with no routing table.

use super::nib::TreeConfig;

/// The size of the address block of a router child at depth `depth + 1`,
/// including the router itself.
///
/// Zero at and below the maximum depth: such nodes get no address space for
/// children.
pub fn cskip(tree: &TreeConfig, depth: u8) -> u16 {
    let cm = tree.max_children as i64;
    let rm = tree.max_routers as i64;
    let lm = tree.max_depth as i64;
    let depth = depth as i64;

    if depth >= lm {
        return 0;
    }

    let skip = if rm == 1 {
        1 + cm * (lm - depth - 1)
    } else {
        let levels = (lm - depth - 1) as u32;
        (1 + cm - rm - cm * rm.pow(levels)) / (1 - rm)
    };

    skip as u16
}

/// Recover the tree depth of `address` by walking the Cskip strides from the
/// root. `None` when the address lies outside the address plan.
pub fn depth_of(tree: &TreeConfig, address: u16) -> Option<u8> {
    if address == 0 {
        return Some(0);
    }

    let mut base = 0u16;
    let mut depth = 0u8;

    loop {
        let skip = cskip(tree, depth);
        if skip == 0 {
            return None;
        }

        let router_span = tree.max_routers as u16 * skip;
        let end_devices = (tree.max_children - tree.max_routers) as u16;
        let offset = address.checked_sub(base)?;

        if (1..=router_span).contains(&offset) {
            let slot = (offset - 1) / skip;
            let child = base + 1 + slot * skip;
            if address == child {
                return Some(depth + 1);
            }
            base = child;
            depth += 1;
        } else if offset > router_span && offset <= router_span + end_devices {
            return Some(depth + 1);
        } else {
            return None;
        }
    }
}

/// The short address of the router child `index` (0-based) of a parent at
/// `(parent, depth)`.
pub fn router_child_address(tree: &TreeConfig, parent: u16, depth: u8, index: u8) -> u16 {
    parent + 1 + index as u16 * cskip(tree, depth)
}

/// The short address of the end-device child `index` (0-based) of a parent
/// at `(parent, depth)`.
pub fn end_device_child_address(tree: &TreeConfig, parent: u16, depth: u8, index: u8) -> u16 {
    parent + tree.max_routers as u16 * cskip(tree, depth) + 1 + index as u16
}

/// Whether `dst` lies in the subtree of a node at `(own, depth)`.
pub fn is_descendant(tree: &TreeConfig, own: u16, depth: u8, dst: u16) -> bool {
    if dst <= own {
        return false;
    }
    if depth == 0 {
        // The whole address plan descends from the coordinator.
        return true;
    }
    dst < own + cskip(tree, depth - 1)
}

/// The next hop from a node at `(own, depth)` toward `dst`.
///
/// `Some(hop)` when `dst` descends from this node (`hop` is either the child
/// itself or the router child whose block contains it); `None` means the
/// frame goes up to the parent.
pub fn next_hop(tree: &TreeConfig, own: u16, depth: u8, dst: u16) -> Option<u16> {
    if !is_descendant(tree, own, depth, dst) {
        return None;
    }

    let skip = cskip(tree, depth);
    if skip == 0 {
        return Some(dst);
    }

    let offset = dst - own;
    let router_span = tree.max_routers as u16 * skip;
    if offset > router_span {
        // A directly attached end device.
        return Some(dst);
    }

    Some(own + 1 + ((offset - 1) / skip) * skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The number of addresses in the subtree rooted at depth `depth`,
    /// counted the slow way.
    fn subtree_size(tree: &TreeConfig, depth: u8) -> u64 {
        let mut size = 1;
        if depth < tree.max_depth {
            size += (tree.max_children - tree.max_routers) as u64;
            size += tree.max_routers as u64 * subtree_size(tree, depth + 1);
        }
        size
    }

    #[test]
    fn cskip_matches_subtree_count() {
        for max_routers in 1..=4u8 {
            for max_children in max_routers..=6u8 {
                for max_depth in 1..=5u8 {
                    let tree = TreeConfig {
                        max_children,
                        max_routers,
                        max_depth,
                    };
                    for depth in 0..max_depth {
                        assert_eq!(
                            cskip(&tree, depth) as u64,
                            subtree_size(&tree, depth + 1),
                            "Cm={} Rm={} Lm={} d={}",
                            max_children,
                            max_routers,
                            max_depth,
                            depth,
                        );
                    }
                    assert_eq!(cskip(&tree, max_depth), 0);
                }
            }
        }
    }

    #[test]
    fn default_tree_strides() {
        let tree = TreeConfig::default();
        assert_eq!(cskip(&tree, 0), 5181);
        assert_eq!(cskip(&tree, 1), 861);
        assert_eq!(cskip(&tree, 2), 141);
        assert_eq!(cskip(&tree, 3), 21);
        assert_eq!(cskip(&tree, 4), 1);
        assert_eq!(cskip(&tree, 5), 0);
    }

    #[test]
    fn depth_recovered_from_address() {
        let tree = TreeConfig::default();

        assert_eq!(depth_of(&tree, 0x0000), Some(0));
        // First router child of the coordinator.
        assert_eq!(depth_of(&tree, 1), Some(1));
        // Second router child of the coordinator.
        assert_eq!(depth_of(&tree, 1 + 5181), Some(1));
        // First router child of router 1.
        assert_eq!(depth_of(&tree, 2), Some(2));
        // First end-device child of the coordinator.
        assert_eq!(depth_of(&tree, 6 * 5181 + 1), Some(1));
        // Last end-device child of the coordinator.
        assert_eq!(depth_of(&tree, 6 * 5181 + 14), Some(1));
        // Just past the address plan.
        assert_eq!(depth_of(&tree, 6 * 5181 + 15), None);
    }

    #[test]
    fn depth_of_inverts_assignment() {
        let tree = TreeConfig {
            max_children: 4,
            max_routers: 2,
            max_depth: 3,
        };

        // Walk every assignable child of the root and one level deeper.
        for router in 0..tree.max_routers {
            let child = router_child_address(&tree, 0, 0, router);
            assert_eq!(depth_of(&tree, child), Some(1));

            for grandchild in 0..tree.max_routers {
                let address = router_child_address(&tree, child, 1, grandchild);
                assert_eq!(depth_of(&tree, address), Some(2));
            }
            for end_device in 0..(tree.max_children - tree.max_routers) {
                let address = end_device_child_address(&tree, child, 1, end_device);
                assert_eq!(depth_of(&tree, address), Some(2));
            }
        }
    }

    #[test]
    fn routing_descends_or_climbs() {
        let tree = TreeConfig::default();

        // The coordinator routes into the owning child block.
        let router1 = router_child_address(&tree, 0, 0, 0); // 1
        let router2 = router_child_address(&tree, 0, 0, 1); // 5182
        assert_eq!(next_hop(&tree, 0, 0, router1 + 10), Some(router1));
        assert_eq!(next_hop(&tree, 0, 0, router2), Some(router2));

        // A directly attached end device is its own next hop.
        let end_device = end_device_child_address(&tree, 0, 0, 0);
        assert_eq!(next_hop(&tree, 0, 0, end_device), Some(end_device));

        // A router sends non-descendants to its parent.
        assert_eq!(next_hop(&tree, router2, 1, router1 + 10), None);
        // And descendants down the right block.
        let child = router_child_address(&tree, router2, 1, 0);
        assert_eq!(next_hop(&tree, router2, 1, child + 5), Some(child));
    }
}
