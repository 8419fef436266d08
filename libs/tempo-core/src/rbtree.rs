//! Red-black tree ordered by virtual runtime
//!
//! Nodes live in an arena and link to each other by index. Index 0 is the
//! shared black sentinel that terminates every branch; its parent field is
//! scratch space during deletion. A pid -> node map sits beside the tree so
//! removal by identity stays O(log n) even though the tree is keyed on
//! vruntime.
//!
//! Processes with the same vruntime are ordered heavier weight first, then by
//! insertion order, so every key in the tree is distinct.

use crate::error::{Result, SchedError};
use crate::process::{Pid, Process};
use hashbrown::HashMap;
use std::cmp::Ordering;

type NodeId = usize;

/// Sentinel leaf
const NIL: NodeId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

/// Tree ordering: vruntime, then heavier weight, then insertion sequence
#[derive(Clone, Copy, Debug)]
struct Key {
    vruntime: f64,
    weight: u32,
    seq: u64,
}

impl Key {
    fn compare(&self, other: &Key) -> Ordering {
        self.vruntime
            .total_cmp(&other.vruntime)
            .then_with(|| other.weight.cmp(&self.weight))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Clone, Debug)]
struct Node {
    process: Option<Process>,
    seq: u64,
    color: Color,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
}

impl Node {
    fn sentinel() -> Self {
        Self {
            process: None,
            seq: 0,
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
        }
    }

    fn leaf(process: Process, seq: u64) -> Self {
        Self {
            process: Some(process),
            seq,
            color: Color::Red,
            parent: NIL,
            left: NIL,
            right: NIL,
        }
    }
}

/// Walk order for [`RbTree::visit`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    PreOrder,
    InOrder,
    PostOrder,
}

/// Runnable set for CFS
#[derive(Clone, Debug)]
pub struct RbTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Recycled arena slots
    free: Vec<NodeId>,
    /// Pid to owning node
    index: HashMap<Pid, NodeId>,
    /// Next insertion sequence number
    next_seq: u64,
}

impl RbTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty tree with room for `capacity` processes
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(Node::sentinel());
        Self {
            nodes,
            root: NIL,
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Number of processes in the tree
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Whether a process with this id is in the tree
    pub fn contains(&self, pid: Pid) -> bool {
        self.index.contains_key(&pid)
    }

    /// Look up a process by id
    pub fn search(&self, pid: Pid) -> Option<&Process> {
        let id = *self.index.get(&pid)?;
        self.nodes[id].process.as_ref()
    }

    /// Drop every process
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[NIL] = Node::sentinel();
        self.root = NIL;
        self.free.clear();
        self.index.clear();
        self.next_seq = 0;
    }

    /// Insert a process keyed by its current vruntime
    pub fn insert(&mut self, process: Process) -> Result<()> {
        let pid = process.pid;
        if self.index.contains_key(&pid) {
            return Err(SchedError::DuplicateProcess(pid));
        }
        let z = self.alloc(process);
        let key = self.key(z);

        let mut y = NIL;
        let mut x = self.root;
        while x != NIL {
            y = x;
            x = if self.less(key, x) { self.left(x) } else { self.right(x) };
        }

        self.nodes[z].parent = y;
        if y == NIL {
            self.root = z;
        } else if self.less(key, y) {
            self.nodes[y].left = z;
        } else {
            self.nodes[y].right = z;
        }

        self.index.insert(pid, z);
        self.insert_fixup(z);
        self.check_invariants();
        Ok(())
    }

    /// Process with the smallest vruntime
    pub fn find_minimum(&self) -> Result<&Process> {
        if self.root == NIL {
            return Err(SchedError::EmptyTree);
        }
        let id = self.minimum(self.root);
        self.nodes[id].process.as_ref().ok_or(SchedError::EmptyTree)
    }

    /// Remove and return the process with the smallest vruntime
    pub fn pop_minimum(&mut self) -> Result<Process> {
        let pid = self.find_minimum()?.pid;
        self.remove(pid).ok_or(SchedError::NotFound(pid))
    }

    /// Remove a process by id. Returns `None` if it is not in the tree.
    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        let z = self.index.remove(&pid)?;

        let mut y = z;
        let mut y_color = self.nodes[y].color;
        let x;

        if self.left(z) == NIL {
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z) == NIL {
            x = self.left(z);
            self.transplant(z, x);
        } else {
            y = self.minimum(self.right(z));
            y_color = self.nodes[y].color;
            x = self.right(y);
            if self.parent(y) == z {
                self.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                let zr = self.right(z);
                self.nodes[y].right = zr;
                self.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.left(z);
            self.nodes[y].left = zl;
            self.nodes[zl].parent = y;
            self.nodes[y].color = self.nodes[z].color;
        }

        if y_color == Color::Black {
            self.delete_fixup(x);
        }
        self.nodes[NIL].parent = NIL;

        let process = self.release(z);
        self.check_invariants();
        process
    }

    /// Call `f` on every process in the given order
    pub fn visit<F>(&self, order: Traversal, mut f: F)
    where
        F: FnMut(&Process),
    {
        self.walk(self.root, order, &mut f);
    }

    /// Processes in ascending vruntime order
    pub fn in_order(&self) -> Vec<&Process> {
        let mut out = Vec::with_capacity(self.len());
        self.collect(self.root, &mut out);
        out
    }

    /// Check every red-black and ordering invariant, returning the black height
    pub fn validate(&self) -> Result<usize> {
        if self.nodes[NIL].color != Color::Black {
            return Err(violation("sentinel is red"));
        }
        if self.nodes[self.root].color != Color::Black {
            return Err(violation("root is red"));
        }
        if self.root != NIL && self.parent(self.root) != NIL {
            return Err(violation("root has a parent"));
        }

        let black_height = self.check_subtree(self.root)?;

        let ordered = self.in_order();
        if ordered.len() != self.index.len() {
            return Err(violation(&format!(
                "{} nodes reachable but {} indexed",
                ordered.len(),
                self.index.len()
            )));
        }
        if ordered.windows(2).any(|w| w[0].vruntime > w[1].vruntime) {
            return Err(violation("in-order walk is not sorted by vruntime"));
        }
        for (pid, &id) in &self.index {
            match self.nodes[id].process.as_ref() {
                Some(p) if p.pid == *pid => {}
                _ => return Err(violation(&format!("index entry for {} is stale", pid))),
            }
        }

        Ok(black_height)
    }

    // Arena management

    fn alloc(&mut self, process: Process) -> NodeId {
        let seq = self.next_seq;
        self.next_seq += 1;
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Node::leaf(process, seq);
                id
            }
            None => {
                self.nodes.push(Node::leaf(process, seq));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Process> {
        let node = &mut self.nodes[id];
        node.parent = NIL;
        node.left = NIL;
        node.right = NIL;
        node.color = Color::Black;
        self.free.push(id);
        self.nodes[id].process.take()
    }

    // Accessors

    fn left(&self, id: NodeId) -> NodeId {
        self.nodes[id].left
    }

    fn right(&self, id: NodeId) -> NodeId {
        self.nodes[id].right
    }

    fn parent(&self, id: NodeId) -> NodeId {
        self.nodes[id].parent
    }

    fn is_red(&self, id: NodeId) -> bool {
        self.nodes[id].color == Color::Red
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        debug_assert!(id != NIL || color == Color::Black, "sentinel must stay black");
        self.nodes[id].color = color;
    }

    fn key(&self, id: NodeId) -> Key {
        let node = &self.nodes[id];
        let (vruntime, weight) = node
            .process
            .as_ref()
            .map_or((f64::NEG_INFINITY, 0), |p| (p.vruntime, p.weight));
        Key {
            vruntime,
            weight,
            seq: node.seq,
        }
    }

    fn less(&self, key: Key, id: NodeId) -> bool {
        key.compare(&self.key(id)).is_lt()
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while self.left(id) != NIL {
            id = self.left(id);
        }
        id
    }

    // Rebalancing

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);

        let yl = self.left(y);
        self.nodes[x].right = yl;
        if yl != NIL {
            self.nodes[yl].parent = x;
        }

        let xp = self.parent(x);
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.left(xp) {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }

        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, y: NodeId) {
        let x = self.left(y);

        let xr = self.right(x);
        self.nodes[y].left = xr;
        if xr != NIL {
            self.nodes[xr].parent = y;
        }

        let yp = self.parent(y);
        self.nodes[x].parent = yp;
        if yp == NIL {
            self.root = x;
        } else if y == self.left(yp) {
            self.nodes[yp].left = x;
        } else {
            self.nodes[yp].right = x;
        }

        self.nodes[x].right = y;
        self.nodes[y].parent = x;
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.is_red(self.parent(z)) {
            let p = self.parent(z);
            let g = self.parent(p);

            if p == self.left(g) {
                let uncle = self.right(g);
                if self.is_red(uncle) {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.is_red(uncle) {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v`
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let up = self.parent(u);
        if up == NIL {
            self.root = v;
        } else if u == self.left(up) {
            self.nodes[up].left = v;
        } else {
            self.nodes[up].right = v;
        }
        // Written even when v is the sentinel; delete_fixup climbs from it
        self.nodes[v].parent = up;
    }

    fn delete_fixup(&mut self, mut x: NodeId) {
        while x != self.root && !self.is_red(x) {
            let p = self.parent(x);

            if x == self.left(p) {
                let mut w = self.right(p);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_left(p);
                    w = self.right(self.parent(x));
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if !self.is_red(self.right(w)) {
                        let wl = self.left(w);
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(self.parent(x));
                    }
                    let p = self.parent(x);
                    let parent_color = self.nodes[p].color;
                    self.set_color(w, parent_color);
                    self.set_color(p, Color::Black);
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.left(p);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_right(p);
                    w = self.left(self.parent(x));
                }
                if !self.is_red(self.right(w)) && !self.is_red(self.left(w)) {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if !self.is_red(self.left(w)) {
                        let wr = self.right(w);
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(self.parent(x));
                    }
                    let p = self.parent(x);
                    let parent_color = self.nodes[p].color;
                    self.set_color(w, parent_color);
                    self.set_color(p, Color::Black);
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    // Traversal and checks

    fn walk<F>(&self, id: NodeId, order: Traversal, f: &mut F)
    where
        F: FnMut(&Process),
    {
        if id == NIL {
            return;
        }
        let node = &self.nodes[id];
        if order == Traversal::PreOrder {
            if let Some(p) = node.process.as_ref() {
                f(p);
            }
        }
        self.walk(node.left, order, f);
        if order == Traversal::InOrder {
            if let Some(p) = node.process.as_ref() {
                f(p);
            }
        }
        self.walk(node.right, order, f);
        if order == Traversal::PostOrder {
            if let Some(p) = node.process.as_ref() {
                f(p);
            }
        }
    }

    fn collect<'a>(&'a self, id: NodeId, out: &mut Vec<&'a Process>) {
        if id == NIL {
            return;
        }
        self.collect(self.left(id), out);
        if let Some(p) = self.nodes[id].process.as_ref() {
            out.push(p);
        }
        self.collect(self.right(id), out);
    }

    fn check_subtree(&self, id: NodeId) -> Result<usize> {
        if id == NIL {
            return Ok(1);
        }
        let node = &self.nodes[id];
        if node.process.is_none() {
            return Err(violation(&format!("node {} is linked but empty", id)));
        }
        for child in [node.left, node.right] {
            if child == NIL {
                continue;
            }
            if self.parent(child) != id {
                return Err(violation(&format!("node {} has a broken parent link", child)));
            }
            if node.color == Color::Red && self.is_red(child) {
                return Err(violation(&format!("red node {} has a red child", id)));
            }
        }
        if node.left != NIL && !self.less(self.key(node.left), id) {
            return Err(violation(&format!("left child of node {} is out of order", id)));
        }
        if node.right != NIL && !self.less(self.key(id), node.right) {
            return Err(violation(&format!("right child of node {} is out of order", id)));
        }

        let left = self.check_subtree(node.left)?;
        let right = self.check_subtree(node.right)?;
        if left != right {
            return Err(violation(&format!(
                "black height mismatch under node {}: {} vs {}",
                id, left, right
            )));
        }
        Ok(left + usize::from(node.color == Color::Black))
    }

    #[inline]
    fn check_invariants(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.validate() {
            panic!("red-black tree corrupted: {}", e);
        }
    }
}

impl Default for RbTree {
    fn default() -> Self {
        Self::new()
    }
}

fn violation(reason: &str) -> SchedError {
    SchedError::InvariantViolation(reason.to_string())
}
