//! Traversal engine shared by every tree in the crate.
//!
//! [`TreeTopology`] is the read-only capability the iterators need: roots,
//! children, parent, membership. Family queries and the three iteration
//! orders are provided on top of it, so the immutable model, the mutable
//! model, and the mitochondrial forest all traverse the same way.
//!
//! Iterators are driven by an explicit stack or queue of ids, never by
//! recursion, so arbitrarily deep trees are safe. Every iterator borrows its
//! tree, which rules out mutation while a traversal is live.

use std::collections::VecDeque;

/// Read-only structural access to a forest of id-addressed nodes.
pub trait TreeTopology {
    /// Node identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Root nodes in stored order.
    fn root_ids(&self) -> &[Self::Id];

    /// Children of `id` in stored order; empty for leaves and unknown ids.
    fn children_of(&self, id: Self::Id) -> &[Self::Id];

    /// Parent of `id`; `None` for roots and unknown ids.
    fn parent_of(&self, id: Self::Id) -> Option<Self::Id>;

    /// True if `id` is a live node.
    fn contains(&self, id: Self::Id) -> bool;

    /// True if `id` is a live node without parent.
    fn is_root(&self, id: Self::Id) -> bool {
        self.contains(id) && self.parent_of(id).is_none()
    }

    /// True if `id` is a live node without children.
    fn is_leaf(&self, id: Self::Id) -> bool {
        self.contains(id) && self.children_of(id).is_empty()
    }

    /// Other children of the same parent (other roots, for a root), in
    /// stored order.
    fn siblings_of(&self, id: Self::Id) -> Vec<Self::Id> {
        if !self.contains(id) {
            return Vec::new();
        }
        let family = match self.parent_of(id) {
            Some(parent) => self.children_of(parent),
            None => self.root_ids(),
        };
        family.iter().copied().filter(|&s| s != id).collect()
    }

    /// Strict ancestors of `id`, nearest first.
    fn ancestors_of(&self, id: Self::Id) -> Upstream<'_, Self> {
        Upstream {
            tree: self,
            next: self.parent_of(id),
        }
    }

    /// Root of the tree containing `id`.
    fn root_of(&self, id: Self::Id) -> Option<Self::Id> {
        if !self.contains(id) {
            return None;
        }
        self.upstream_from(id).last()
    }

    /// Number of edges between `id` and its root.
    fn depth_of(&self, id: Self::Id) -> usize {
        self.ancestors_of(id).count()
    }

    /// Depth-first pre-order over the whole forest.
    fn depth_first(&self) -> DepthFirst<'_, Self> {
        DepthFirst::new(self, self.root_ids().to_vec())
    }

    /// Depth-first pre-order over the subtree rooted at `id`.
    fn depth_first_from(&self, id: Self::Id) -> DepthFirst<'_, Self> {
        let start = if self.contains(id) { vec![id] } else { Vec::new() };
        DepthFirst::new(self, start)
    }

    /// Level-order over the whole forest.
    fn breadth_first(&self) -> BreadthFirst<'_, Self> {
        BreadthFirst::new(self, self.root_ids().to_vec())
    }

    /// Level-order over the subtree rooted at `id`.
    fn breadth_first_from(&self, id: Self::Id) -> BreadthFirst<'_, Self> {
        let start = if self.contains(id) { vec![id] } else { Vec::new() };
        BreadthFirst::new(self, start)
    }

    /// `id` followed by its ancestors, ending at a root.
    fn upstream_from(&self, id: Self::Id) -> Upstream<'_, Self> {
        Upstream {
            tree: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// True if `descendant` lies in the subtree rooted at `ancestor`
    /// (a node counts as its own descendant).
    fn is_descendant(&self, descendant: Self::Id, ancestor: Self::Id) -> bool {
        self.upstream_from(descendant).any(|id| id == ancestor)
    }
}

/// Depth-first pre-order iterator. Parents come before all of their
/// descendants and children are visited in stored order.
pub struct DepthFirst<'a, T: TreeTopology + ?Sized> {
    tree: &'a T,
    start: Vec<T::Id>,
    stack: Vec<T::Id>,
}

impl<'a, T: TreeTopology + ?Sized> DepthFirst<'a, T> {
    fn new(tree: &'a T, start: Vec<T::Id>) -> Self {
        let stack = start.iter().rev().copied().collect();
        Self { tree, start, stack }
    }

    /// Rewinds to the first node.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.stack.extend(self.start.iter().rev().copied());
    }
}

impl<T: TreeTopology + ?Sized> Clone for DepthFirst<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            start: self.start.clone(),
            stack: self.stack.clone(),
        }
    }
}

impl<T: TreeTopology + ?Sized> Iterator for DepthFirst<'_, T> {
    type Item = T::Id;

    fn next(&mut self) -> Option<T::Id> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children_of(id).iter().rev().copied());
        Some(id)
    }
}

/// Breadth-first (level-order) iterator.
pub struct BreadthFirst<'a, T: TreeTopology + ?Sized> {
    tree: &'a T,
    start: Vec<T::Id>,
    queue: VecDeque<T::Id>,
}

impl<'a, T: TreeTopology + ?Sized> BreadthFirst<'a, T> {
    fn new(tree: &'a T, start: Vec<T::Id>) -> Self {
        let queue = start.iter().copied().collect();
        Self { tree, start, queue }
    }

    /// Rewinds to the first node.
    pub fn restart(&mut self) {
        self.queue.clear();
        self.queue.extend(self.start.iter().copied());
    }
}

impl<T: TreeTopology + ?Sized> Clone for BreadthFirst<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            start: self.start.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<T: TreeTopology + ?Sized> Iterator for BreadthFirst<'_, T> {
    type Item = T::Id;

    fn next(&mut self) -> Option<T::Id> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.tree.children_of(id).iter().copied());
        Some(id)
    }
}

/// Walks parent links towards the root.
pub struct Upstream<'a, T: TreeTopology + ?Sized> {
    tree: &'a T,
    next: Option<T::Id>,
}

impl<T: TreeTopology + ?Sized> Clone for Upstream<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
        }
    }
}

impl<T: TreeTopology + ?Sized> Iterator for Upstream<'_, T> {
    type Item = T::Id;

    fn next(&mut self) -> Option<T::Id> {
        let id = self.next?;
        self.next = self.tree.parent_of(id);
        Some(id)
    }
}
