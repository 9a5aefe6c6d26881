//! Observable, ordered list of nodes for one family.
//!
//! A [`NodeList`] is a shared handle: the family that owns it and every
//! system holding a clone see the same nodes. Nodes appear in the order they
//! were admitted. Only the owning family adds or removes nodes; systems read
//! the list and may subscribe to [`NodeEvent`]s to track node lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use engine_component::{Listener, Signal};

use crate::node::Node;

/// The two event channels of a [`NodeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEvent {
    /// A node was appended to the list.
    NodeAdded,
    /// A node was taken out of the list.
    NodeRemoved,
}

struct NodeListData<S> {
    nodes: RefCell<Vec<Node<S>>>,
    node_added: Signal<Node<S>>,
    node_removed: Signal<Node<S>>,
}

/// A shared handle to an ordered list of [`Node`]s.
pub struct NodeList<S> {
    data: Rc<NodeListData<S>>,
}

impl<S> NodeList<S> {
    pub(crate) fn new() -> Self {
        Self {
            data: Rc::new(NodeListData {
                nodes: RefCell::new(Vec::new()),
                node_added: Signal::new(),
                node_removed: Signal::new(),
            }),
        }
    }

    /// Append `node` and announce it.
    pub(crate) fn add(&self, node: Node<S>) {
        self.data.nodes.borrow_mut().push(node.clone());
        self.data.node_added.dispatch(&node);
    }

    /// Remove the first occurrence of `node`.
    ///
    /// Announces the removal only if the node was in the list.
    pub(crate) fn remove(&self, node: &Node<S>) -> bool {
        let removed = {
            let mut nodes = self.data.nodes.borrow_mut();
            nodes
                .iter()
                .position(|n| n.ptr_eq(node))
                .map(|index| nodes.remove(index))
        };
        match removed {
            Some(removed) => {
                self.data.node_removed.dispatch(&removed);
                true
            }
            None => false,
        }
    }

    /// Remove every node front to back, announcing each exactly once.
    ///
    /// Always takes the current head, so listeners that remove further nodes
    /// while this runs do not cause skips or double announcements.
    pub(crate) fn remove_all(&self) {
        while let Some(head) = self.first() {
            self.remove(&head);
        }
    }

    /// Drop every node without announcing anything.
    pub(crate) fn clear(&self) {
        self.data.nodes.borrow_mut().clear();
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<Node<S>> {
        self.data.nodes.borrow().get(index).cloned()
    }

    /// Returns the first node.
    #[must_use]
    pub fn first(&self) -> Option<Node<S>> {
        self.at(0)
    }

    /// Returns `true` if `node` is in the list.
    #[must_use]
    pub fn contains(&self, node: &Node<S>) -> bool {
        self.data.nodes.borrow().iter().any(|n| n.ptr_eq(node))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nodes.borrow().len()
    }

    /// Returns `true` if the list has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nodes.borrow().is_empty()
    }

    /// Copy the current nodes into a `Vec`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Node<S>> {
        self.data.nodes.borrow().clone()
    }

    /// Iterate by position.
    ///
    /// The iterator holds no borrow between steps, so the engine may change
    /// while a system walks the list. A node removed ahead of the cursor is
    /// not visited; removing the current node shifts the next one under the
    /// cursor, which is then skipped.
    #[must_use]
    pub fn iter(&self) -> Iter<S> {
        Iter {
            list: self.clone(),
            index: 0,
        }
    }

    /// The signal for one event channel.
    #[must_use]
    pub fn signal(&self, event: NodeEvent) -> &Signal<Node<S>> {
        match event {
            NodeEvent::NodeAdded => &self.data.node_added,
            NodeEvent::NodeRemoved => &self.data.node_removed,
        }
    }

    /// Subscribe `listener` to one event channel.
    pub fn subscribe(&self, event: NodeEvent, listener: Listener<Node<S>>) {
        self.signal(event).subscribe(listener);
    }

    /// Remove the first registration of `listener` from one event channel.
    pub fn unsubscribe(&self, event: NodeEvent, listener: &Listener<Node<S>>) -> bool {
        self.signal(event).unsubscribe(listener)
    }

    /// Returns `true` if both handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(&self, other: &NodeList<S>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl<S> Clone for NodeList<S> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}

impl<S> std::fmt::Debug for NodeList<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeList")
            .field("shape", &std::any::type_name::<S>())
            .field("len", &self.len())
            .finish()
    }
}

/// Positional iterator over a [`NodeList`].
pub struct Iter<S> {
    list: NodeList<S>,
    index: usize,
}

impl<S> Iterator for Iter<S> {
    type Item = Node<S>;

    fn next(&mut self) -> Option<Node<S>> {
        let node = self.list.at(self.index)?;
        self.index += 1;
        Some(node)
    }
}

impl<S> IntoIterator for &NodeList<S> {
    type Item = Node<S>;
    type IntoIter = Iter<S>;

    fn into_iter(self) -> Iter<S> {
        self.iter()
    }
}
