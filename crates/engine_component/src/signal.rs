//! Minimal synchronous publish/subscribe primitive.
//!
//! A [`Signal`] keeps an ordered list of listeners and invokes them in
//! subscription order on [`Signal::dispatch`]. Listeners are identified by
//! allocation, so unsubscribing requires the same [`Listener`] handle that was
//! subscribed.

use std::cell::RefCell;
use std::rc::Rc;

/// A subscribed callback. Clone the `Rc` to keep a handle for unsubscribing.
pub type Listener<A> = Rc<dyn Fn(&A)>;

/// Wrap a closure as a [`Listener`].
pub fn listener<A, F>(f: F) -> Listener<A>
where
    F: Fn(&A) + 'static,
{
    Rc::new(f)
}

/// An ordered list of listeners for one event channel.
pub struct Signal<A> {
    listeners: RefCell<Vec<Listener<A>>>,
}

impl<A> Signal<A> {
    /// Create a signal with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Append a listener. The same listener may be subscribed more than once
    /// and is then invoked once per registration.
    pub fn subscribe(&self, listener: Listener<A>) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Remove the first registration of `listener`.
    ///
    /// Returns `false` if it was never subscribed.
    pub fn unsubscribe(&self, listener: &Listener<A>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invoke every listener in subscription order.
    ///
    /// No borrow is held while a listener runs, so listeners may subscribe or
    /// unsubscribe during dispatch. Such changes can shift which of the
    /// remaining listeners are reached. A panicking listener aborts the
    /// dispatch and unwinds into the caller.
    pub fn dispatch(&self, args: &A) {
        let mut index = 0;
        loop {
            let next = self.listeners.borrow().get(index).cloned();
            let Some(listener) = next else {
                break;
            };
            listener(args);
            index += 1;
        }
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns `true` if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.len())
            .finish()
    }
}
