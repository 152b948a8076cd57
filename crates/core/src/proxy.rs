use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use native_bridge_protocol::{ObjectId, Properties};
use serde_json::Value;

use crate::bridge::Bridge;
use crate::codec::TypeTable;
use crate::error::BridgeError;

/// Event names that never reach the host; listening to them is local
/// bookkeeping only.
pub const LOCAL_EVENTS: &[&str] = &["dispose", "animationstart", "animationend"];

pub fn is_local_event(name: &str) -> bool {
    LOCAL_EVENTS.iter().any(|local| *local == name)
}

/// An event delivered to listeners, with its payload already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: ObjectId,
    pub payload: Properties,
}

pub type Handler = Rc<dyn Fn(&Event)>;

/// Handle returned by `on`, used to remove that listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Per-proxy listener sets, counted per event name.
#[derive(Default)]
pub(crate) struct Listeners {
    by_event: BTreeMap<String, Vec<(ListenerId, Handler)>>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.by_event.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

impl Listeners {
    /// Returns `true` when this is the first listener for `event`.
    pub(crate) fn add(&mut self, event: &str, id: ListenerId, handler: Handler) -> bool {
        let handlers = self.by_event.entry(event.to_string()).or_default();
        handlers.push((id, handler));
        handlers.len() == 1
    }

    /// Returns `Some(true)` when the removed listener was the last one for
    /// `event`, `None` when it was not registered.
    pub(crate) fn remove(&mut self, event: &str, id: ListenerId) -> Option<bool> {
        let handlers = self.by_event.get_mut(event)?;
        let position = handlers.iter().position(|(l, _)| *l == id)?;
        handlers.remove(position);
        let last = handlers.is_empty();
        if last {
            self.by_event.remove(event);
        }
        Some(last)
    }

    pub(crate) fn handlers(&self, event: &str) -> Vec<Handler> {
        self.by_event
            .get(event)
            .map(|hs| hs.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, event: &str) -> usize {
        self.by_event.get(event).map_or(0, Vec::len)
    }
}

/// Registry entry of a live proxy.
#[derive(Debug)]
pub(crate) struct ProxyRecord {
    pub(crate) type_name: Rc<str>,
    pub(crate) table: Option<&'static TypeTable>,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) listeners: Listeners,
}

impl ProxyRecord {
    pub(crate) fn new(type_name: Rc<str>, table: Option<&'static TypeTable>, parent: Option<ObjectId>) -> Self {
        Self {
            type_name,
            table,
            parent,
            children: Vec::new(),
            listeners: Listeners::default(),
        }
    }
}

/// Local stand-in for a remote native object.
///
/// Cloning a proxy clones the handle, not the remote object. Once disposed,
/// `get` fails with [`UsageError::Disposed`](crate::UsageError::Disposed)
/// and every other operation is a no-op.
#[derive(Clone)]
pub struct Proxy {
    bridge: Bridge,
    id: ObjectId,
    type_name: Rc<str>,
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .finish()
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.bridge.same_as(&other.bridge)
    }
}

impl Proxy {
    pub(crate) fn new(bridge: Bridge, id: ObjectId, type_name: Rc<str>) -> Self {
        Self {
            bridge,
            id,
            type_name,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Application-level type tag this proxy was created with.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn is_disposed(&self) -> bool {
        !self.bridge.is_live(self.id)
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.bridge.parent_of(self.id)
    }

    pub fn set(&self, key: &str, value: Value) -> Result<(), BridgeError> {
        self.bridge.set(self.id, key, value)
    }

    pub fn set_all(&self, properties: Properties) -> Result<(), BridgeError> {
        self.bridge.set_all(self.id, properties)
    }

    pub fn get(&self, key: &str) -> Result<Value, BridgeError> {
        self.bridge.get(self.id, key)
    }

    pub fn call(&self, method: &str, parameters: Properties) -> Result<(), BridgeError> {
        self.bridge.call(self.id, method, parameters)
    }

    pub fn on(&self, event: &str, handler: impl Fn(&Event) + 'static) -> Result<ListenerId, BridgeError> {
        self.bridge.on(self.id, event, handler)
    }

    pub fn off(&self, event: &str, listener: ListenerId) -> Result<bool, BridgeError> {
        self.bridge.off(self.id, event, listener)
    }

    /// Deliver an event to this proxy's own listeners without involving
    /// the host.
    pub fn trigger(&self, event: &str, payload: Properties) {
        self.bridge.trigger(self.id, event, payload);
    }

    pub fn dispose(&self) -> Result<(), BridgeError> {
        self.bridge.dispose(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn noop() -> Handler {
        Rc::new(|_: &Event| {})
    }

    #[test]
    fn first_add_and_last_remove_are_reported() {
        let mut listeners = Listeners::default();
        assert!(listeners.add("Selection", ListenerId(1), noop()));
        assert!(!listeners.add("Selection", ListenerId(2), noop()));
        assert_eq!(listeners.count("Selection"), 2);
        assert_eq!(listeners.remove("Selection", ListenerId(1)), Some(false));
        assert_eq!(listeners.remove("Selection", ListenerId(1)), None);
        assert_eq!(listeners.remove("Selection", ListenerId(2)), Some(true));
        assert_eq!(listeners.count("Selection"), 0);
    }

    #[test]
    fn handlers_are_returned_in_registration_order() {
        let mut listeners = Listeners::default();
        let order = Rc::new(Cell::new(0));
        let first = Rc::clone(&order);
        let second = Rc::clone(&order);
        listeners.add("e", ListenerId(1), Rc::new(move |_: &Event| first.set(first.get() * 10 + 1)));
        listeners.add("e", ListenerId(2), Rc::new(move |_: &Event| second.set(second.get() * 10 + 2)));
        let event = Event {
            name: "e".into(),
            target: ObjectId::new(1),
            payload: Properties::new(),
        };
        for handler in listeners.handlers("e") {
            handler(&event);
        }
        assert_eq!(order.get(), 12);
    }

    #[test]
    fn local_events() {
        assert!(is_local_event("dispose"));
        assert!(!is_local_event("Selection"));
    }
}
