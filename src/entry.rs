use core::marker::PhantomData;
use core::ptr::NonNull;

use compare::Compare;

use crate::{BstMap, Dir, Node};

/// Slot recorded by a probe for a key that is not present: the empty root,
/// or one side of the last node the probe visited.
pub(crate) enum InsertAs<K, V> {
    Root,
    Child {
        parent: NonNull<Node<K, V>>,
        dir: Dir,
    },
}

/// A view into a single entry in a [`BstMap`], which may be either vacant
/// or occupied.
///
/// Produced by [`BstMap::entry`] from a single probe; inserting through a
/// vacant entry reuses the recorded slot instead of searching again.
pub enum Entry<'tree, K, V, C>
where
    C: Compare<K>,
{
    Vacant(VacantEntry<'tree, K, V, C>),
    Occupied(OccupiedEntry<'tree, K, V, C>),
}

impl<'tree, K, V, C> Entry<'tree, K, V, C>
where
    C: Compare<K>,
{
    pub(crate) fn vacant(
        tree: &'tree mut BstMap<K, V, C>,
        key: K,
        insert_as: InsertAs<K, V>,
    ) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            key,
            insert_as,
        })
    }

    pub(crate) fn occupied(_tree: &'tree mut BstMap<K, V, C>, node: NonNull<Node<K, V>>) -> Self {
        Entry::Occupied(OccupiedEntry {
            node,
            _tree: PhantomData,
        })
    }

    /// Returns the key this entry was probed with.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(vacant) => vacant.key(),
            Entry::Occupied(occupied) => occupied.key(),
        }
    }

    /// Inserts `default` when vacant; returns a mutable reference to the
    /// stored value either way.
    pub fn or_insert(self, default: V) -> &'tree mut V {
        match self {
            Entry::Vacant(vacant) => vacant.insert(default),
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    /// Inserts the result of `default` when vacant; returns a mutable
    /// reference to the stored value either way.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'tree mut V {
        match self {
            Entry::Vacant(vacant) => vacant.insert(default()),
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    /// Index-or-insert: inserts `V::default()` when the key is absent and
    /// returns a mutable reference to the stored value either way.
    pub fn or_default(self) -> &'tree mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Applies `f` to the stored value when the entry is occupied.
    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(ref mut occupied) = self {
            f(occupied.get_mut());
        }
        self
    }
}

/// A vacant entry: the probed key together with the slot a node for it
/// would occupy.
pub struct VacantEntry<'tree, K, V, C>
where
    C: Compare<K>,
{
    tree: &'tree mut BstMap<K, V, C>,
    key: K,
    insert_as: InsertAs<K, V>,
}

impl<'tree, K, V, C> VacantEntry<'tree, K, V, C>
where
    C: Compare<K>,
{
    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key back from the entry.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` at the recorded slot and returns a mutable
    /// reference to it.
    pub fn insert(self, value: V) -> &'tree mut V {
        let node = self.tree.attach(self.insert_as, self.key, value);
        unsafe { &mut (*node.as_ptr()).value }
    }
}

/// An occupied entry: the node found for the probed key.
pub struct OccupiedEntry<'tree, K, V, C>
where
    C: Compare<K>,
{
    node: NonNull<Node<K, V>>,
    _tree: PhantomData<&'tree mut BstMap<K, V, C>>,
}

impl<'tree, K, V, C> OccupiedEntry<'tree, K, V, C>
where
    C: Compare<K>,
{
    /// Returns the stored key.
    pub fn key(&self) -> &K {
        unsafe { &(*self.node.as_ptr()).key }
    }

    /// Returns a reference to the stored value.
    pub fn get(&self) -> &V {
        unsafe { &(*self.node.as_ptr()).value }
    }

    /// Returns a mutable reference to the stored value.
    pub fn get_mut(&mut self) -> &mut V {
        unsafe { &mut (*self.node.as_ptr()).value }
    }

    /// Converts the entry into a mutable reference to the stored value
    /// with the tree borrow's lifetime.
    pub fn into_mut(self) -> &'tree mut V {
        unsafe { &mut (*self.node.as_ptr()).value }
    }
}
