//! Search graph with arena allocation and a transposition table.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! Different move orders that reach the same board share one node, found
//! through the table by canonical hash. A shared node credits its
//! statistics to exactly one owning edge at a time; ownership moves to
//! whichever parent reaches it with the best cumulative score.

use std::collections::HashMap;

use engine_core::Board;
use thiserror::Error;
use tracing::trace;

use crate::node::{NodeId, SearchNode};

/// Ownership or table inconsistencies found by [`SearchTree::check_invariants`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {node} counts {active} active children but owns {owned}")]
    ActiveCountMismatch {
        node: u32,
        active: usize,
        owned: usize,
    },

    #[error("Node {node} owns slot {slot} but the child points at node {parent} slot {parent_slot}")]
    OwnerMismatch {
        node: u32,
        slot: usize,
        parent: u32,
        parent_slot: usize,
    },

    #[error("Node {node} has no active children but is still owned by node {parent}")]
    InactiveStillOwned { node: u32, parent: u32 },

    #[error("Node {node} is solved but still owned by node {parent}")]
    SolvedStillOwned { node: u32, parent: u32 },

    #[error("Table entry {hash:#018x} points at node {node} whose board hashes differently")]
    StaleTableEntry { hash: u64, node: u32 },

    #[error("Nodes {first} and {second} are both registered for the same board")]
    DuplicateState { first: u32, second: u32 },
}

/// Outcome of expanding a child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// A new node was created and is owned by the parent.
    Created(NodeId),
    /// An existing node was reached by a better path and reparented.
    Transposed(NodeId),
    /// An existing node was reached by a path that is no better than its
    /// current one, or that cannot take it over. The slot is linked but
    /// not owned.
    Dead(NodeId),
    /// An existing solved node was reached by a better path. The slot is
    /// linked but not owned; the node's known line is worth replaying.
    Solved(NodeId),
}

impl Expansion {
    pub fn node(self) -> NodeId {
        match self {
            Self::Created(id) | Self::Transposed(id) | Self::Dead(id) | Self::Solved(id) => id,
        }
    }
}

/// Multipliers for [`SearchTree::leaf_hit`].
#[derive(Debug, Clone, Copy)]
pub struct LeafHitBoost {
    pub initial: f64,
    pub decay: f64,
    pub floor: f64,
}

/// Search graph with arena-based node storage.
#[derive(Debug)]
pub struct SearchTree<B> {
    /// Arena storing all nodes
    nodes: Vec<SearchNode<B>>,

    /// Canonical hash to the node representing that board. The root is not
    /// registered; no move sequence can return to it.
    table: HashMap<u64, NodeId>,

    /// Root node index (always 0)
    root: NodeId,
}

impl<B: Board> SearchTree<B> {
    /// Create a new tree rooted at `board`.
    pub fn new(board: B, exploration: f64) -> Self {
        Self {
            nodes: vec![SearchNode::new_root(board, exploration)],
            table: HashMap::new(),
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode<B> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<B> {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node and return its ID.
    fn allocate(&mut self, node: SearchNode<B>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node registered for a canonical hash.
    pub fn lookup(&self, hash: u64) -> Option<NodeId> {
        self.table.get(&hash).copied()
    }

    /// Number of registered board states.
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Expand child `slot` of `parent`, where `cum` is the cumulative score
    /// at `parent`.
    ///
    /// On a table miss a fresh node is created. On a hit the slot is linked
    /// to the existing node: if this path is strictly better and the node
    /// can be owned, ownership moves here. A solved node reached by a better
    /// path only has its `cum` raised. Anything else stays a dead link.
    pub fn expand(&mut self, parent: NodeId, slot: usize, cum: i32, exploration: f64) -> Expansion {
        let (board, score) = {
            let node = self.get(parent);
            debug_assert!(node.children[slot].is_none(), "slot {} already expanded", slot);
            let mut board = node.board.clone();
            let score = board.do_move(node.moves[slot], 0);
            (board, score)
        };
        let edge = cum + score;
        let hash = board.canonical_hash();

        if let Some(existing) = self.lookup(hash) {
            let p = self.get_mut(parent);
            p.children[slot] = existing;
            p.owned[slot] = false;
            p.active -= 1;

            let better = edge > self.get(existing).cum;
            if better && self.can_own(existing) {
                self.activate(parent, slot, edge);
                trace!(parent = parent.0, node = existing.0, edge, "transposition reparented");
                return Expansion::Transposed(existing);
            }

            let p = self.get(parent);
            if p.active == 0 && p.parent.is_some() {
                self.deactivate(parent);
            }

            let node = self.get_mut(existing);
            if better && node.solved {
                node.cum = edge;
                trace!(parent = parent.0, node = existing.0, edge, "solved transposition");
                return Expansion::Solved(existing);
            }
            trace!(parent = parent.0, node = existing.0, "dead transposition");
            return Expansion::Dead(existing);
        }

        let id = self.allocate(SearchNode::new_child(parent, slot, board, edge, exploration));
        self.table.insert(hash, id);
        self.get_mut(parent).children[slot] = id;
        Expansion::Created(id)
    }

    /// Revoke the owning edge of `kid`, subtracting its statistics from
    /// the owner chain. An owner left without active children is revoked
    /// from its own owner in turn. No-op if the edge is not owned.
    pub fn deactivate(&mut self, kid: NodeId) {
        let (parent, slot) = {
            let node = self.get(kid);
            (node.parent, node.slot)
        };
        if parent.is_none() || !self.owns(parent, slot, kid) {
            return;
        }

        self.subtract(kid);

        let p = self.get_mut(parent);
        p.owned[slot] = false;
        p.active -= 1;
        if p.active == 0 && p.parent.is_some() {
            self.deactivate(parent);
        }
    }

    /// Whether `kid` may be taken over by a new owner. Solved nodes are
    /// never owned, and neither are nodes whose own children are all
    /// credited elsewhere: an owned node always has an active child unless
    /// it is terminal.
    pub fn can_own(&self, kid: NodeId) -> bool {
        let node = self.get(kid);
        !node.solved && (node.active > 0 || node.is_terminal())
    }

    /// Make `parent` the owner of its child in `slot`, reached with
    /// cumulative score `cum`. The previous owner is revoked first.
    pub fn activate(&mut self, parent: NodeId, slot: usize, cum: i32) {
        let kid = self.get(parent).children[slot];
        debug_assert!(kid.is_some(), "activating unexpanded slot {}", slot);
        assert!(self.can_own(kid), "node {} cannot be owned", kid.0);

        self.deactivate(kid);
        let (old_parent, old_slot) = {
            let node = self.get(kid);
            (node.parent, node.slot)
        };
        assert!(
            old_parent.is_none() || !self.owns(old_parent, old_slot, kid),
            "node {} still owned by {} after detaching",
            kid.0,
            old_parent.0
        );

        let p = self.get_mut(parent);
        p.owned[slot] = true;
        p.active += 1;

        let node = self.get_mut(kid);
        node.cum = cum;
        node.parent = parent;
        node.slot = slot;

        self.add(kid);
    }

    /// Whether `parent` owns `kid` through `slot`.
    #[inline]
    fn owns(&self, parent: NodeId, slot: usize, kid: NodeId) -> bool {
        let p = self.get(parent);
        p.children.get(slot) == Some(&kid) && p.owned[slot]
    }

    /// Remove the aggregate of `kid` from its owner chain.
    fn subtract(&mut self, kid: NodeId) {
        self.propagate(kid, false);
    }

    /// Add the aggregate of `kid` to its owner chain.
    fn add(&mut self, kid: NodeId) {
        self.propagate(kid, true);
    }

    /// Walk up owned edges from `kid`, recombining each ancestor's mean
    /// with `kid`'s samples shifted by the edge scores along the way.
    ///
    /// Solved nodes carry no statistics upward. The walk stops at the first
    /// edge that is not owned since that ancestor was already revoked.
    fn propagate(&mut self, kid: NodeId, adding: bool) {
        let (t, mut value, mut parent, mut slot) = {
            let node = self.get(kid);
            if node.solved || node.visits == 0 {
                return;
            }
            (node.visits, node.avg, node.parent, node.slot)
        };

        while parent.is_some() {
            let p = self.get_mut(parent);
            if p.solved {
                break;
            }
            value += p.scores[slot] as f64;

            if adding {
                let total = p.visits + t;
                p.avg = (p.avg * p.visits as f64 + value * t as f64) / total as f64;
                p.visits = total;
            } else {
                assert!(
                    p.visits >= t,
                    "node {} has {} visits, cannot remove {}",
                    parent.0,
                    p.visits,
                    t
                );
                let rest = p.visits - t;
                p.avg = if rest == 0 {
                    0.0
                } else {
                    (p.avg * p.visits as f64 - value * t as f64) / rest as f64
                };
                p.visits = rest;
            }

            let (up, up_slot) = (p.parent, p.slot);
            if up.is_none() || !self.owns(up, up_slot, parent) {
                break;
            }
            parent = up;
            slot = up_slot;
        }
    }

    /// Record that a terminal state was reached at `leaf`: every ancestor
    /// is flagged and its exploration constant boosted, with a boost that
    /// relaxes towards the floor the further up it goes.
    pub fn leaf_hit(&mut self, leaf: NodeId, boost: LeafHitBoost) {
        let mut mul = boost.initial;
        let mut id = leaf;
        while id.is_some() {
            let node = self.get_mut(id);
            node.exploration *= mul;
            node.has_leaf_hit = true;
            mul = (mul * boost.decay).max(boost.floor);
            id = node.parent;
        }
    }

    /// Revoke `id` and its owned unsolved subtree from exploration.
    pub fn cancel(&mut self, id: NodeId) {
        let len = self.get(id).children.len();
        for slot in 0..len {
            let (kid, owned) = {
                let node = self.get(id);
                (node.children[slot], node.owned[slot])
            };
            if kid.is_some() && owned && !self.get(kid).solved {
                self.cancel(kid);
            }
        }
        self.deactivate(id);
    }

    /// Whether `id` has an unexpanded or unsolved child.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id)
            .children
            .iter()
            .any(|&kid| kid.is_none() || !self.get(kid).solved)
    }

    /// Verify ownership conservation and transposition uniqueness.
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index as u32);

            let owned = node.owned_count();
            if owned != node.active {
                return Err(TreeError::ActiveCountMismatch {
                    node: id.0,
                    active: node.active,
                    owned,
                });
            }

            for (slot, &kid) in node.children.iter().enumerate() {
                if kid.is_none() || !node.owned[slot] {
                    continue;
                }
                let child = self.get(kid);
                if child.parent != id || child.slot != slot {
                    return Err(TreeError::OwnerMismatch {
                        node: id.0,
                        slot,
                        parent: child.parent.0,
                        parent_slot: child.slot,
                    });
                }
            }

            if node.parent.is_some() && self.owns(node.parent, node.slot, id) {
                if node.solved {
                    return Err(TreeError::SolvedStillOwned {
                        node: id.0,
                        parent: node.parent.0,
                    });
                }
                if !node.is_terminal() && node.active == 0 {
                    return Err(TreeError::InactiveStillOwned {
                        node: id.0,
                        parent: node.parent.0,
                    });
                }
            }
        }

        for (&hash, &id) in &self.table {
            if self.get(id).board.canonical_hash() != hash {
                return Err(TreeError::StaleTableEntry { hash, node: id.0 });
            }
        }

        // Every non-root node must be the registered node for its board
        for (index, node) in self.nodes.iter().enumerate().skip(1) {
            let id = NodeId(index as u32);
            if let Some(registered) = self.lookup(node.board.canonical_hash()) {
                if registered != id {
                    return Err(TreeError::DuplicateState {
                        first: registered.0,
                        second: id.0,
                    });
                }
            }
        }

        Ok(())
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            table_entries: self.table.len(),
            solved_nodes: self.nodes.iter().filter(|n| n.solved).count(),
            root_visits: root.visits,
            root_avg: root.avg,
            root_solved: root.solved,
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    /// Depth along owned edges. Each node has at most one owner, so this
    /// walks a tree even though the graph has shared nodes.
    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        let node = self.get(node_id);
        node.children
            .iter()
            .zip(&node.owned)
            .filter(|(kid, &own)| kid.is_some() && own && self.get(**kid).parent == node_id)
            .map(|(kid, _)| self.compute_max_depth(*kid, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about a search tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub table_entries: usize,
    pub solved_nodes: usize,
    pub root_visits: u32,
    pub root_avg: f64,
    pub root_solved: bool,
    pub max_depth: u32,
}
