use core::fmt;
use core::marker::PhantomData;

use crate::{Link, Node};

/// A read-only forward cursor over a [`BstMap`](crate::BstMap).
///
/// A cursor points either at an element or at the end position one past the
/// last element. Traversal is driven entirely by the node links, so a
/// cursor carries no tree state beyond its position.
pub struct Cursor<'tree, K, V> {
    ptr: Link<K, V>,
    _tree: PhantomData<&'tree Node<K, V>>,
}

impl<'tree, K, V> Cursor<'tree, K, V> {
    pub(crate) fn at(ptr: Link<K, V>) -> Cursor<'tree, K, V> {
        Cursor {
            ptr,
            _tree: PhantomData,
        }
    }

    /// Returns `true` when the cursor is at the end position.
    pub fn is_end(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns the pair at the cursor, or `None` at the end position.
    pub fn key_value(&self) -> Option<(&'tree K, &'tree V)> {
        self.ptr.map(|node| unsafe {
            let node = &*node.as_ptr();
            (&node.key, &node.value)
        })
    }

    /// Returns the key at the cursor.
    pub fn key(&self) -> Option<&'tree K> {
        self.key_value().map(|(key, _)| key)
    }

    /// Returns the value at the cursor.
    pub fn value(&self) -> Option<&'tree V> {
        self.key_value().map(|(_, value)| value)
    }

    /// Moves the cursor to the in-order successor. The end cursor stays at
    /// the end position.
    pub fn move_next(&mut self) {
        if let Some(node) = self.ptr {
            self.ptr = unsafe { Node::successor(node) };
        }
    }

    /// Depth of the pointed-to node, counting the root as 1; 0 at the end
    /// position.
    pub fn depth(&self) -> usize {
        match self.ptr {
            Some(node) => unsafe { Node::depth_from(node) },
            None => 0,
        }
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    /// Cursors are equal when they point at the same node, or both at the
    /// end position.
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key_value() {
            Some(pair) => f.debug_tuple("Cursor").field(&pair).finish(),
            None => f.write_str("Cursor(end)"),
        }
    }
}

/// A forward cursor over a [`BstMap`](crate::BstMap) with mutable access to
/// the values.
///
/// Keys stay read-only; changing a stored key's ordering would break the
/// search invariant.
pub struct CursorMut<'tree, K, V> {
    ptr: Link<K, V>,
    _tree: PhantomData<&'tree mut Node<K, V>>,
}

impl<'tree, K, V> CursorMut<'tree, K, V> {
    pub(crate) fn at(ptr: Link<K, V>) -> CursorMut<'tree, K, V> {
        CursorMut {
            ptr,
            _tree: PhantomData,
        }
    }

    /// Returns `true` when the cursor is at the end position.
    pub fn is_end(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns the pair at the cursor, or `None` at the end position.
    pub fn key_value(&self) -> Option<(&K, &V)> {
        self.ptr.map(|node| unsafe {
            let node = &*node.as_ptr();
            (&node.key, &node.value)
        })
    }

    /// Returns the pair at the cursor with the value mutable.
    pub fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        self.ptr.map(|node| unsafe {
            let node = &mut *node.as_ptr();
            (&node.key, &mut node.value)
        })
    }

    /// Returns a mutable reference to the value at the cursor.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.key_value_mut().map(|(_, value)| value)
    }

    /// Returns a read-only cursor at the same position.
    ///
    /// The `CursorMut` stays borrowed for the lifetime of the returned
    /// `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::at(self.ptr)
    }

    /// Moves the cursor to the in-order successor. The end cursor stays at
    /// the end position.
    pub fn move_next(&mut self) {
        if let Some(node) = self.ptr {
            self.ptr = unsafe { Node::successor(node) };
        }
    }

    /// Depth of the pointed-to node, counting the root as 1; 0 at the end
    /// position.
    pub fn depth(&self) -> usize {
        match self.ptr {
            Some(node) => unsafe { Node::depth_from(node) },
            None => 0,
        }
    }
}

impl<K, V> PartialEq for CursorMut<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<K, V> Eq for CursorMut<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CursorMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key_value() {
            Some(pair) => f.debug_tuple("CursorMut").field(&pair).finish(),
            None => f.write_str("CursorMut(end)"),
        }
    }
}
