//! In-memory adjacency index for self-referencing tables
//!
//! Departments and menus store only `(id, parent_id)`. Every tree operation
//! loads that adjacency once per call and walks it here, so no walk depends on
//! lazy ORM traversal or unbounded recursion.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Upper bound for any parent-chain walk or tree expansion.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub struct TreeIndex<K> {
    parents: HashMap<K, Option<K>>,
    children: HashMap<Option<K>, Vec<K>>,
}

impl<K> TreeIndex<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Build the index from `(id, parent)` pairs. Sibling order follows input
    /// order. A node whose parent is missing from the input is treated as a root.
    pub fn new(nodes: impl IntoIterator<Item = (K, Option<K>)>) -> Self {
        let pairs: Vec<(K, Option<K>)> = nodes.into_iter().collect();
        let parents: HashMap<K, Option<K>> = pairs.iter().copied().collect();

        let mut children: HashMap<Option<K>, Vec<K>> = HashMap::new();
        for (id, parent) in pairs {
            let parent = parent.filter(|p| parents.contains_key(p));
            children.entry(parent).or_default().push(id);
        }

        Self { parents, children }
    }

    pub fn contains(&self, id: K) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Direct children of `parent` (`None` = roots), in sibling order
    pub fn children(&self, parent: Option<K>) -> &[K] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `ancestor` is `node` itself or lies on `node`'s parent
    /// chain. A chain that revisits a node or runs past `MAX_DEPTH` is corrupt
    /// and is reported as true, so callers refuse to build on top of it.
    pub fn is_descendant(&self, ancestor: K, node: K) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(node);

        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) || seen.len() > MAX_DEPTH {
                tracing::warn!("Malformed parent chain detected at {:?}", id);
                return true;
            }
            current = self.parents.get(&id).copied().flatten();
        }

        false
    }

    /// Closed subtree of `root` in post-order: every child precedes its parent,
    /// `root` comes last. Empty if `root` is unknown.
    pub fn subtree_post_order(&self, root: K) -> Vec<K> {
        if !self.contains(root) {
            return Vec::new();
        }

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !seen.insert(id) {
                continue;
            }
            stack.push((id, true));
            for &child in self.children(Some(id)).iter().rev() {
                if !seen.contains(&child) {
                    stack.push((child, false));
                }
            }
        }

        order
    }

    /// Closed subtree of `root` as a set
    pub fn subtree_ids(&self, root: K) -> HashSet<K> {
        self.subtree_post_order(root).into_iter().collect()
    }

    /// Assemble nested nodes below each of `roots`. `nodes` holds the payload
    /// per id; `attach` stores the finished children into their parent.
    pub fn assemble<T>(
        &self,
        roots: &[K],
        mut nodes: HashMap<K, T>,
        attach: impl Fn(&mut T, Vec<T>),
    ) -> Vec<T> {
        let mut seen = HashSet::new();
        roots
            .iter()
            .filter_map(|&id| self.build(id, &mut nodes, &attach, &mut seen, 0))
            .collect()
    }

    fn build<T>(
        &self,
        id: K,
        nodes: &mut HashMap<K, T>,
        attach: &impl Fn(&mut T, Vec<T>),
        seen: &mut HashSet<K>,
        depth: usize,
    ) -> Option<T> {
        if depth > MAX_DEPTH || !seen.insert(id) {
            return None;
        }
        let mut node = nodes.remove(&id)?;
        let children = self
            .children(Some(id))
            .iter()
            .filter_map(|&child| self.build(child, nodes, attach, seen, depth + 1))
            .collect();
        attach(&mut node, children);
        Some(node)
    }
}
