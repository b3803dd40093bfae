//! Change Notification
//!
//! An identity-keyed side table of listener lists. Objects are keyed by pointer
//! identity and never kept alive by the table; a listener list lives until its
//! owner unsubscribes on its destroy path.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub type NotifyListener = Rc<dyn Fn(&Value)>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Identity(usize),
    Primitive(Value),
}

impl Key {
    fn of(target: &Value) -> Key {
        match target {
            Value::Object(o) => Key::Identity(Rc::as_ptr(o) as *const () as usize),
            Value::List(items) => Key::Identity(Rc::as_ptr(items) as usize),
            Value::Instance(i) => Key::Identity(i.addr()),
            other => Key::Primitive(other.clone()),
        }
    }
}

/// Returned by [`Notifier::listen`]; pass back to [`Notifier::unlisten`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    key: Key,
    id: usize,
}

#[derive(Default)]
pub struct Notifier {
    table: RefCell<HashMap<Key, Vec<(usize, NotifyListener)>>>,
    next_id: Cell<usize>,
}

impl Notifier {
    pub fn new() -> Self {
        Notifier::default()
    }

    pub fn listen(&self, target: &Value, listener: NotifyListener) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let key = Key::of(target);
        self.table
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push((id, listener));
        Subscription { key, id }
    }

    pub fn unlisten(&self, subscription: &Subscription) {
        let mut table = self.table.borrow_mut();
        if let Some(listeners) = table.get_mut(&subscription.key) {
            listeners.retain(|(id, _)| *id != subscription.id);
            if listeners.is_empty() {
                table.remove(&subscription.key);
            }
        }
    }

    /// Drop every listener registered against `target`.
    pub fn clear(&self, target: &Value) {
        self.table.borrow_mut().remove(&Key::of(target));
    }

    /// Fire all listeners registered against `target`. Listeners may subscribe
    /// or unsubscribe while being notified.
    pub fn notify(&self, target: &Value) {
        let listeners: Vec<NotifyListener> = match self.table.borrow().get(&Key::of(target)) {
            Some(listeners) => listeners.iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };
        for listener in listeners {
            listener(target);
        }
    }

    pub fn listener_count(&self, target: &Value) -> usize {
        self.table
            .borrow()
            .get(&Key::of(target))
            .map_or(0, |listeners| listeners.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    #[test]
    fn objects_are_keyed_by_identity() {
        let notifier = Notifier::new();
        let a = Record::new().into_value();
        let b = Record::new().into_value();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        notifier.listen(&a, Rc::new(move |_: &Value| h.set(h.get() + 1)));

        notifier.notify(&b);
        assert_eq!(hits.get(), 0);
        notifier.notify(&a.clone());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unlisten_removes_only_that_listener() {
        let notifier = Notifier::new();
        let target = Value::from("channel");
        let first = notifier.listen(&target, Rc::new(|_: &Value| {}));
        notifier.listen(&target, Rc::new(|_: &Value| {}));
        notifier.unlisten(&first);
        assert_eq!(notifier.listener_count(&target), 1);
        notifier.clear(&target);
        assert_eq!(notifier.listener_count(&target), 0);
    }
}
