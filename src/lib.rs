//! An ordered map backed by a binary search tree with parent links.
//!
//! [`BstMap`] keeps its entries sorted under a comparison strategy carried
//! per instance (see [`Compare`]). The tree does not rebalance itself on
//! insertion; instead, [`BstMap::balance`] rebuilds it at minimal depth on
//! demand from its current contents. In-order traversal follows the node
//! links themselves — up through parents, down into right subtrees — so
//! cursors and iterators need no auxiliary stack.

// Structural invariants, for every node `n`:
// 1. Keys in `n.left`'s subtree order strictly before `n.key`, and keys in
//    `n.right`'s subtree strictly after, under the map's comparator.
// 2. Exactly one owning edge reaches every node: its parent's child link, or
//    the tree's root slot. `n.parent` mirrors that edge exactly and is never
//    used to free memory.
// 3. The link graph is acyclic and `len` equals the number of nodes
//    reachable from `root`.
//
// Teardown discipline: a chain-shaped tree has depth equal to its size, so
// bulk destruction must not recurse into subtrees. `clear` and the draining
// operations visit nodes iteratively and free each node only once its
// subtree has been emptied.

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

pub use compare::{natural, Compare, Natural};

mod cursor;
mod debug;
mod entry;
mod iter;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use iter::{IntoIter, Iter, IterMut};

use entry::InsertAs;

pub(crate) type Link<K, V> = Option<NonNull<Node<K, V>>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left,
    Right,
}

pub(crate) struct Node<K, V> {
    pub(crate) parent: Link<K, V>,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Node<K, V> {
    fn alloc(parent: Link<K, V>, key: K, value: V) -> NonNull<Node<K, V>> {
        NonNull::from(Box::leak(Box::new(Node {
            parent,
            left: None,
            right: None,
            key,
            value,
        })))
    }

    pub(crate) fn into_pair(self: Box<Self>) -> (K, V) {
        (self.key, self.value)
    }

    pub(crate) fn child(&self, dir: Dir) -> Link<K, V> {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, dir: Dir, child: Link<K, V>) {
        match dir {
            Dir::Left => self.left = child,
            Dir::Right => self.right = child,
        }
    }

    /// Returns the minimum node of the subtree rooted at `this`.
    pub(crate) unsafe fn leftmost(this: NonNull<Self>) -> NonNull<Self> {
        let mut cur = this;
        while let Some(left) = unsafe { (*cur.as_ptr()).left } {
            cur = left;
        }
        cur
    }

    /// Returns the nearest ancestor whose left subtree contains `this`, i.e.
    /// the in-order successor of a node without a right child. `None` when
    /// `this` is the last node in order.
    pub(crate) unsafe fn first_right_ancestor(this: NonNull<Self>) -> Link<K, V> {
        let mut cur = this;
        loop {
            match unsafe { (*cur.as_ptr()).parent } {
                Some(parent) if unsafe { (*parent.as_ptr()).right } == Some(cur) => cur = parent,
                other => return other,
            }
        }
    }

    /// In-order successor: the leftmost node of the right subtree if one
    /// exists, otherwise the first right ancestor.
    pub(crate) unsafe fn successor(this: NonNull<Self>) -> Link<K, V> {
        let node = unsafe { &*this.as_ptr() };
        if let Some(right) = node.right {
            Some(unsafe { Self::leftmost(right) })
        } else if node.parent.is_some() {
            unsafe { Self::first_right_ancestor(this) }
        } else {
            None
        }
    }

    /// Number of parent-chain steps from `this` to the root, inclusive; the
    /// root itself is at depth 1.
    pub(crate) unsafe fn depth_from(this: NonNull<Self>) -> usize {
        let mut depth = 1;
        let mut cur = this;
        while let Some(parent) = unsafe { (*cur.as_ptr()).parent } {
            debug_assert_ne!(parent, this);
            cur = parent;
            depth += 1;
        }
        depth
    }

    /// Frees both children of `this` and resets the links.
    ///
    /// The children's own subtrees must already have been released; nodes
    /// have no drop glue of their own, so a child freed here must not still
    /// reach live descendants.
    pub(crate) unsafe fn release_children(this: NonNull<Self>) {
        let node = unsafe { &mut *this.as_ptr() };
        if let Some(left) = node.left.take() {
            drop(unsafe { Box::from_raw(left.as_ptr()) });
        }
        if let Some(right) = node.right.take() {
            drop(unsafe { Box::from_raw(right.as_ptr()) });
        }
    }

    unsafe fn alloc_clone(parent: Link<K, V>, src: NonNull<Self>) -> NonNull<Self>
    where
        K: Clone,
        V: Clone,
    {
        let node = unsafe { &*src.as_ptr() };
        Node::alloc(parent, node.key.clone(), node.value.clone())
    }
}

/// Outcome of a positional probe: the key's node, or the slot where a node
/// for it would be attached.
pub(crate) enum Probe<K, V> {
    Occupied(NonNull<Node<K, V>>),
    Vacant(InsertAs<K, V>),
}

/// An ordered map backed by an unbalanced binary search tree.
///
/// Keys are unique under the map's comparator; inserting a key that is
/// already present leaves the stored value untouched. [`balance`] rebuilds
/// the tree at minimal depth without changing its contents.
///
/// ```
/// use taproot::BstMap;
///
/// let mut map = BstMap::new();
/// map.insert(2, "b");
/// map.insert(1, "a");
/// map.insert(3, "c");
///
/// assert_eq!(map.get(&2), Some(&"b"));
/// let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, vec![1, 2, 3]);
/// ```
///
/// [`balance`]: BstMap::balance
pub struct BstMap<K, V, C = Natural<K>>
where
    C: Compare<K>,
{
    pub(crate) root: Link<K, V>,
    pub(crate) len: usize,
    cmp: C,
    marker: PhantomData<Box<Node<K, V>>>,
}

unsafe impl<K: Send, V: Send, C: Compare<K> + Send> Send for BstMap<K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Compare<K> + Sync> Sync for BstMap<K, V, C> {}

impl<K: Ord, V> BstMap<K, V> {
    /// Returns a new empty map ordered by the natural order of its keys.
    pub fn new() -> BstMap<K, V> {
        BstMap::with_cmp(natural())
    }
}

impl<K, V, C> BstMap<K, V, C>
where
    C: Compare<K>,
{
    /// Returns a new empty map ordered by the given comparator.
    pub fn with_cmp(cmp: C) -> BstMap<K, V, C> {
        BstMap {
            root: None,
            len: 0,
            cmp,
            marker: PhantomData,
        }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the comparator the map orders its keys with.
    pub fn cmp(&self) -> &C {
        &self.cmp
    }

    /// Returns a borrowing in-order iterator over the map's pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Returns an in-order iterator with mutable access to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self)
    }

    /// Returns a cursor at the first element in order, or the end cursor
    /// when the map is empty.
    pub fn cursor_first(&self) -> Cursor<'_, K, V> {
        Cursor::at(self.root.map(|root| unsafe { Node::leftmost(root) }))
    }

    /// Returns a mutable cursor at the first element in order.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::at(self.root.map(|root| unsafe { Node::leftmost(root) }))
    }

    /// Returns the cursor one past the last element.
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::at(None)
    }

    // Walks from the root comparing `key` against each node. The walk is
    // bounded by `len` steps; a healthy tree resolves every probe within
    // its depth, so exceeding the bound means the structure no longer
    // mirrors `len`, and `None` is returned instead of looping.
    pub(crate) fn probe<Q: ?Sized>(&self, key: &Q) -> Option<Probe<K, V>>
    where
        C: Compare<Q, K>,
    {
        let Some(root) = self.root else {
            return Some(Probe::Vacant(InsertAs::Root));
        };

        let mut cur = root;
        for _ in 0..self.len {
            let node = unsafe { &*cur.as_ptr() };
            match self.cmp.compare(key, &node.key) {
                Ordering::Less => match node.left {
                    Some(left) => cur = left,
                    None => {
                        return Some(Probe::Vacant(InsertAs::Child {
                            parent: cur,
                            dir: Dir::Left,
                        }))
                    }
                },
                Ordering::Greater => match node.right {
                    Some(right) => cur = right,
                    None => {
                        return Some(Probe::Vacant(InsertAs::Child {
                            parent: cur,
                            dir: Dir::Right,
                        }))
                    }
                },
                Ordering::Equal => return Some(Probe::Occupied(cur)),
            }
        }

        None
    }

    /// Returns a cursor at the node holding `key`, or the end cursor when
    /// the key is absent.
    pub fn find<Q: ?Sized>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        C: Compare<Q, K>,
    {
        match self.probe(key) {
            Some(Probe::Occupied(node)) => Cursor::at(Some(node)),
            _ => Cursor::at(None),
        }
    }

    /// Returns a mutable cursor at the node holding `key`, or the end
    /// cursor when the key is absent.
    pub fn find_mut<Q: ?Sized>(&mut self, key: &Q) -> CursorMut<'_, K, V>
    where
        C: Compare<Q, K>,
    {
        match self.probe(key) {
            Some(Probe::Occupied(node)) => CursorMut::at(Some(node)),
            _ => CursorMut::at(None),
        }
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        C: Compare<Q, K>,
    {
        match self.probe(key) {
            Some(Probe::Occupied(node)) => Some(unsafe { &(*node.as_ptr()).value }),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        C: Compare<Q, K>,
    {
        match self.probe(key) {
            Some(Probe::Occupied(node)) => Some(unsafe { &mut (*node.as_ptr()).value }),
            _ => None,
        }
    }

    /// Returns `true` if the map holds a value for `key`.
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        C: Compare<Q, K>,
    {
        matches!(self.probe(key), Some(Probe::Occupied(_)))
    }

    /// Inserts `key` and `value`, returning a cursor at the key's node and
    /// whether a new node was created.
    ///
    /// If the key is already present the stored value is left untouched and
    /// the flag is `false`.
    pub fn insert(&mut self, key: K, value: V) -> (CursorMut<'_, K, V>, bool) {
        match self.probe(&key) {
            Some(Probe::Occupied(node)) => (CursorMut::at(Some(node)), false),
            Some(Probe::Vacant(at)) => {
                let node = self.attach(at, key, value);
                (CursorMut::at(Some(node)), true)
            }
            None => panic!("BstMap::insert: probe exceeded the size bound; tree is corrupted"),
        }
    }

    /// Returns the entry for `key`, vacant or occupied, from a single
    /// probe. `entry(key).or_default()` inserts a default value when the
    /// key is absent and returns the stored value either way.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C> {
        match self.probe(&key) {
            Some(Probe::Occupied(node)) => Entry::occupied(self, node),
            Some(Probe::Vacant(at)) => Entry::vacant(self, key, at),
            None => panic!("BstMap::entry: probe exceeded the size bound; tree is corrupted"),
        }
    }

    // Allocates a node for the pair at a slot recorded by a probe.
    pub(crate) fn attach(&mut self, at: InsertAs<K, V>, key: K, value: V) -> NonNull<Node<K, V>> {
        let node = match at {
            InsertAs::Root => {
                debug_assert!(self.root.is_none());
                let node = Node::alloc(None, key, value);
                self.root = Some(node);
                node
            }
            InsertAs::Child { parent, dir } => {
                let node = Node::alloc(Some(parent), key, value);
                unsafe {
                    debug_assert!((*parent.as_ptr()).child(dir).is_none());
                    (*parent.as_ptr()).set_child(dir, Some(node));
                }
                node
            }
        };

        self.len += 1;
        node
    }

    /// Removes all elements.
    ///
    /// Teardown is iterative: starting at the leftmost node, right subtrees
    /// are entered before a node's children are released, and releases
    /// happen while stepping back up out of right chains. Each node's
    /// children are freed only after their own subtrees are already empty,
    /// so destructor work per node is O(1) on any tree shape, including a
    /// linear chain as deep as the tree is large.
    pub fn clear(&mut self) {
        if let Some(root) = self.root {
            unsafe {
                let mut cur = Some(Node::leftmost(root));
                while let Some(node) = cur {
                    if let Some(right) = (*node.as_ptr()).right {
                        cur = Some(Node::leftmost(right));
                    } else if (*node.as_ptr()).parent.is_some() {
                        let mut up = node;
                        while let Some(parent) = (*up.as_ptr()).parent {
                            if (*parent.as_ptr()).right != Some(up) {
                                break;
                            }
                            Node::release_children(up);
                            up = parent;
                        }
                        Node::release_children(up);
                        cur = (*up.as_ptr()).parent;
                    } else {
                        Node::release_children(node);
                        cur = None;
                    }
                }
                drop(Box::from_raw(root.as_ptr()));
            }
        }

        self.root = None;
        self.len = 0;
    }

    // Unlinks the minimum node of the subtree rooted at `from`, elevating
    // its right child into the vacated slot. Returns the detached node and
    // the position an in-order drain continues from. The minimum is always
    // a left child or the root, so only those two slots are rewritten.
    pub(crate) unsafe fn detach_min(
        &mut self,
        from: NonNull<Node<K, V>>,
    ) -> (Box<Node<K, V>>, Link<K, V>) {
        unsafe {
            let min = Node::leftmost(from);
            let parent = (*min.as_ptr()).parent;
            let right = (*min.as_ptr()).right;

            match parent {
                Some(parent) => {
                    debug_assert_eq!((*parent.as_ptr()).left, Some(min));
                    (*parent.as_ptr()).left = right;
                }
                None => self.root = right,
            }

            if let Some(right) = right {
                (*right.as_ptr()).parent = parent;
            }

            self.len -= 1;
            (Box::from_raw(min.as_ptr()), right.or(parent))
        }
    }

    /// Rebuilds the tree at minimal depth from its current contents.
    ///
    /// The tree is drained in order into a sorted sequence, then rebuilt by
    /// inserting the median of each range first. The resulting depth is at
    /// most ⌈log₂(len + 1)⌉; the pair set and iteration order are unchanged.
    pub fn balance(&mut self) {
        let mut pairs: Vec<Option<(K, V)>> = Vec::with_capacity(self.len);

        let mut cur = self.root;
        while let Some(from) = cur {
            let (node, next) = unsafe { self.detach_min(from) };
            pairs.push(Some(node.into_pair()));
            cur = next;
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len, 0);

        self.insert_sorted_run(&mut pairs);
    }

    // Re-inserts an ordered run median-first, lower half before upper.
    fn insert_sorted_run(&mut self, run: &mut [Option<(K, V)>]) {
        if run.is_empty() {
            return;
        }

        let mid = run.len() / 2;
        let (key, value) = run[mid]
            .take()
            .expect("pair re-inserted twice during rebuild");
        self.insert(key, value);

        let (lower, upper) = run.split_at_mut(mid);
        self.insert_sorted_run(lower);
        self.insert_sorted_run(&mut upper[1..]);
    }

    /// Returns the maximum node depth, walking every element; 0 for an
    /// empty map, 1 for a map holding exactly one pair.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut curs = self.cursor_first();
        while !curs.is_end() {
            depth = depth.max(curs.depth());
            curs.move_next();
        }
        depth
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree must have len 0");
            return;
        };

        unsafe {
            assert!(
                (*root.as_ptr()).parent.is_none(),
                "root must not have a parent"
            );

            let mut count = 0usize;
            let mut prev: Link<K, V> = None;
            let mut cur = Some(Node::leftmost(root));

            while let Some(node) = cur {
                count += 1;
                assert!(count <= self.len, "more nodes reachable than len");

                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = (*node.as_ptr()).child(dir) {
                        assert_eq!(
                            (*child.as_ptr()).parent,
                            Some(node),
                            "child's parent link must mirror the owning edge"
                        );
                    }
                }

                if let Some(prev) = prev {
                    let ord = self
                        .cmp
                        .compare(&(*prev.as_ptr()).key, &(*node.as_ptr()).key);
                    assert_eq!(ord, Ordering::Less, "in-order keys must strictly increase");
                }

                prev = Some(node);
                cur = Node::successor(node);
            }

            assert_eq!(count, self.len, "reachable node count must equal len");
        }
    }
}

impl<K, V, C> Drop for BstMap<K, V, C>
where
    C: Compare<K>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V, C> Default for BstMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn default() -> BstMap<K, V, C> {
        BstMap::with_cmp(C::default())
    }
}

impl<K, V, C> Clone for BstMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K> + Clone,
{
    /// Deep copy: a fresh node graph with the same shape, keys and values,
    /// and a clone of the comparator (including any per-instance state).
    ///
    /// The walk is iterative, advancing source and copy in lockstep and
    /// using the copy's missing child links to tell copied subtrees from
    /// pending ones, so a chain-shaped source cannot exhaust the stack.
    fn clone(&self) -> Self {
        let mut copy = BstMap {
            root: None,
            len: self.len,
            cmp: self.cmp.clone(),
            marker: PhantomData,
        };

        let Some(src_root) = self.root else {
            return copy;
        };

        unsafe {
            let dst_root = Node::alloc_clone(None, src_root);
            copy.root = Some(dst_root);

            let mut src = src_root;
            let mut dst = dst_root;

            loop {
                let src_node = &*src.as_ptr();
                let dst_node = &mut *dst.as_ptr();

                if let (Some(src_left), None) = (src_node.left, dst_node.left) {
                    let child = Node::alloc_clone(Some(dst), src_left);
                    dst_node.left = Some(child);
                    src = src_left;
                    dst = child;
                } else if let (Some(src_right), None) = (src_node.right, dst_node.right) {
                    let child = Node::alloc_clone(Some(dst), src_right);
                    dst_node.right = Some(child);
                    src = src_right;
                    dst = child;
                } else if src == src_root {
                    break;
                } else {
                    src = src_node.parent.expect("copy walk escaped the source tree");
                    dst = dst_node.parent.expect("copy walk escaped the new tree");
                }
            }
        }

        copy
    }
}

impl<K, V, C> Extend<(K, V)> for BstMap<K, V, C>
where
    C: Compare<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for BstMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> BstMap<K, V, C> {
        let mut map = BstMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C> fmt::Display for BstMap<K, V, C>
where
    K: fmt::Display,
    V: fmt::Display,
    C: Compare<K>,
{
    /// Human-readable dump: `bst(<len>) {(<key>: <value>), ...}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bst({}) {{", self.len)?;
        for (key, value) in self.iter() {
            write!(f, "({key}: {value}), ")?;
        }
        write!(f, "}}")
    }
}

impl<K, V, C> fmt::Debug for BstMap<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Compare<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
