use core::fmt::{self, Write as _};
use core::ptr::NonNull;
use std::collections::VecDeque;

use compare::Compare;

use crate::{BstMap, Node};

impl<K, V, C> BstMap<K, V, C>
where
    K: fmt::Display,
    C: Compare<K>,
{
    /// Renders the tree as a Graphviz digraph, one `rank=same` row per
    /// level, with point nodes standing in for missing children.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, mut w: W) -> fmt::Result {
        let root = match self.root {
            Some(root) => root,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<K, V> {
            Node(NonNull<Node<K, V>>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            let row = queue.len();

            write!(w, "{{rank=same; ")?;

            for _ in 0..row {
                let item = queue.pop_front().expect("row outran the queue");

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = unsafe { &(*node.as_ptr()).key };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}\"]; ")?;

                let children = unsafe { [(*node.as_ptr()).left, (*node.as_ptr()).right] };
                for child in children {
                    match child {
                        Some(child) => {
                            let child_key = unsafe { &(*child.as_ptr()).key };
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                            queue.push_back(Item::Node(child));
                        }
                        None => {
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            queue.push_back(Item::Missing(missing));
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
