use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use native_bridge_protocol::{HostEvent, ObjectId, Operation, Properties};
use serde_json::Value;

use crate::canvas::ContextState;
use crate::codec;
use crate::config::BridgeConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{BridgeError, InvalidValue, UsageError};
use crate::proxy::{Event, Handler, ListenerId, Proxy, ProxyRecord, is_local_event};
use crate::transport::{Channel, FlushReport, Transport};

/// Client-side context of one host connection.
///
/// Owns the proxy registry, the open batch and the canvas contexts. A
/// `Bridge` is a cheap handle; clones share the same context. All access is
/// single-threaded by construction (`Rc`), which gives the exclusive section
/// the batching protocol relies on.
#[derive(Clone)]
pub struct Bridge {
    state: Rc<RefCell<BridgeState>>,
}

/// Non-owning handle, for callbacks stored inside the bridge itself.
#[derive(Clone)]
pub struct WeakBridge {
    state: Weak<RefCell<BridgeState>>,
}

impl WeakBridge {
    pub fn upgrade(&self) -> Option<Bridge> {
        self.state.upgrade().map(|state| Bridge { state })
    }
}

pub(crate) struct BridgeState {
    pub(crate) config: BridgeConfig,
    pub(crate) transport: Transport,
    registry: HashMap<ObjectId, ProxyRecord>,
    next_id: u64,
    next_listener: u64,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) contexts: Vec<Rc<RefCell<ContextState>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Live,
    Disposed,
    NotCreated,
}

impl BridgeState {
    fn status(&self, id: ObjectId) -> Status {
        if self.registry.contains_key(&id) {
            Status::Live
        } else if id.raw() >= 1 && id.raw() < self.next_id {
            Status::Disposed
        } else {
            Status::NotCreated
        }
    }

    /// Fails for ids this bridge never allocated; `Ok(false)` for disposed ones.
    fn require_created(&self, id: ObjectId) -> Result<bool, UsageError> {
        match self.status(id) {
            Status::Live => Ok(true),
            Status::Disposed => Ok(false),
            Status::NotCreated => Err(UsageError::NotCreated(id)),
        }
    }

    fn encode_properties(&mut self, table: Option<&codec::TypeTable>, properties: &Properties) -> Properties {
        let mut encoded = Properties::new();
        for (key, value) in properties {
            match codec::encode(table, key, value) {
                Ok((wire_key, wire_value)) => {
                    encoded.insert(wire_key, wire_value);
                }
                Err(err) => self.diagnostics.report(err),
            }
        }
        encoded
    }

    /// Pack every canvas context and enqueue its draw call, then send the
    /// batch.
    fn flush(&mut self) -> FlushReport {
        for context in &self.contexts {
            let mut context = context.borrow_mut();
            let Some(packed) = context.take_packed() else {
                continue;
            };
            let gc = context.gc();
            if self.registry.contains_key(&gc) {
                let mut parameters = Properties::new();
                match serde_json::to_value(packed) {
                    Ok(value) => {
                        parameters.insert("packedOperations".into(), value);
                        self.transport.enqueue(Operation::Call {
                            id: gc,
                            method: "draw".into(),
                            parameters,
                        });
                    }
                    Err(err) => log::warn!("could not serialize draw operations for {gc}: {err}"),
                }
            } else {
                log::trace!("dropping draw operations of disposed context {gc}");
            }
        }
        let registry = &self.registry;
        self.contexts
            .retain(|context| registry.contains_key(&context.borrow().gc()));
        self.transport.flush()
    }

    /// Flush first if the open batch still holds operations for `id`, so
    /// that an immediate request observes them.
    fn flush_if_pending(&mut self, id: ObjectId) {
        let pending = self.transport.batch().references(id)
            || self
                .contexts
                .iter()
                .any(|c| c.borrow().gc() == id && c.borrow().has_pending());
        if pending {
            let report = self.flush();
            if !report.is_clean() {
                log::warn!(
                    "{} operations failed while flushing before a request to {id}",
                    report.failures.len()
                );
            }
        }
    }

    /// `id` and all its live descendants, parents before children.
    fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = vec![id];
        let mut next = 0;
        while next < out.len() {
            if let Some(record) = self.registry.get(&out[next]) {
                out.extend(record.children.iter().copied());
            }
            next += 1;
        }
        out
    }
}

impl Bridge {
    pub fn new(channel: impl Channel + 'static) -> Self {
        Self::with_config(channel, BridgeConfig::default())
    }

    pub fn with_config(channel: impl Channel + 'static, config: BridgeConfig) -> Self {
        let state = BridgeState {
            transport: Transport::new(Box::new(channel), config.hoist_creates),
            diagnostics: Diagnostics::new(config.record_diagnostics),
            config,
            registry: HashMap::new(),
            next_id: 1,
            next_listener: 1,
            contexts: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn downgrade(&self) -> WeakBridge {
        WeakBridge {
            state: Rc::downgrade(&self.state),
        }
    }

    pub(crate) fn same_as(&self, other: &Bridge) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn state(&self) -> std::cell::RefMut<'_, BridgeState> {
        self.state.borrow_mut()
    }

    pub fn config(&self) -> BridgeConfig {
        self.state.borrow().config.clone()
    }

    /// Create a remote object of the given type tag.
    ///
    /// Properties are encoded with the type's codec; rejected values are
    /// reported as diagnostics and left out of the `create`.
    pub fn create(&self, type_name: &str, properties: Properties) -> Result<Proxy, BridgeError> {
        self.create_with_parent(type_name, None, properties)
    }

    /// Create a remote object owned by `parent`.
    pub fn create_child(&self, parent: &Proxy, type_name: &str, properties: Properties) -> Result<Proxy, BridgeError> {
        self.create_with_parent(type_name, Some(parent.id()), properties)
    }

    fn create_with_parent(
        &self,
        type_name: &str,
        parent: Option<ObjectId>,
        properties: Properties,
    ) -> Result<Proxy, BridgeError> {
        let mut state = self.state.borrow_mut();
        if let Some(parent) = parent
            && !state.require_created(parent)?
        {
            return Err(UsageError::Disposed(parent).into());
        }

        let table = codec::lookup(type_name);
        let mut encoded = state.encode_properties(table, &properties);
        if let Some(parent) = parent {
            encoded.insert("parent".into(), Value::String(parent.to_string()));
        }

        let id = ObjectId::new(state.next_id);
        state.next_id += 1;
        let type_name: Rc<str> = Rc::from(type_name);
        state
            .registry
            .insert(id, ProxyRecord::new(Rc::clone(&type_name), table, parent));
        if let Some(parent) = parent
            && let Some(record) = state.registry.get_mut(&parent)
        {
            record.children.push(id);
        }

        log::debug!("create {type_name} {id}");
        state.transport.enqueue(Operation::Create {
            id,
            type_name: codec::wire_type(&type_name).to_string(),
            properties: encoded,
        });
        drop(state);
        Ok(Proxy::new(self.clone(), id, type_name))
    }

    /// Whether the `create` of `id` is still waiting in the open batch.
    pub(crate) fn has_pending_create(&self, id: ObjectId) -> bool {
        self.state.borrow().transport.batch().has_pending_create(id)
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.state.borrow().status(id) == Status::Live
    }

    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.state.borrow().registry.get(&id).and_then(|r| r.parent)
    }

    /// Look up the live proxy for an id.
    pub fn proxy(&self, id: ObjectId) -> Option<Proxy> {
        let type_name = Rc::clone(&self.state.borrow().registry.get(&id)?.type_name);
        Some(Proxy::new(self.clone(), id, type_name))
    }

    pub fn set(&self, id: ObjectId, key: &str, value: Value) -> Result<(), BridgeError> {
        let mut properties = Properties::new();
        properties.insert(key.to_string(), value);
        self.set_all(id, properties)
    }

    /// Queue property changes. Merged with other pending changes of the same
    /// object until the next flush.
    pub fn set_all(&self, id: ObjectId, properties: Properties) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        if !state.require_created(id)? {
            return Ok(());
        }
        let table = state.registry.get(&id).and_then(|r| r.table);
        let encoded = state.encode_properties(table, &properties);
        if !encoded.is_empty() {
            state.transport.enqueue(Operation::Set {
                id,
                properties: encoded,
            });
        }
        Ok(())
    }

    /// Read the host's current value of a property.
    ///
    /// Pending operations for the same object are flushed first.
    pub fn get(&self, id: ObjectId, key: &str) -> Result<Value, BridgeError> {
        let mut state = self.state.borrow_mut();
        if !state.require_created(id)? {
            return Err(UsageError::Disposed(id).into());
        }
        state.flush_if_pending(id);
        let table = state.registry.get(&id).and_then(|r| r.table);
        let wire = state.transport.get(id, codec::wire_name(table, key))?;
        Ok(codec::decode(table, key, wire))
    }

    /// Queue a method call. Results, if any, come back as events.
    pub fn call(&self, id: ObjectId, method: &str, parameters: Properties) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        if !state.require_created(id)? {
            return Ok(());
        }
        state.transport.enqueue(Operation::Call {
            id,
            method: method.to_string(),
            parameters,
        });
        Ok(())
    }

    /// Send a method call right away instead of queueing it. Pending
    /// operations for the same object are flushed first.
    pub fn call_now(&self, id: ObjectId, method: &str, parameters: Properties) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        if !state.require_created(id)? {
            return Ok(());
        }
        state.flush_if_pending(id);
        state.transport.send(&Operation::Call {
            id,
            method: method.to_string(),
            parameters,
        })?;
        Ok(())
    }

    /// Register a listener. The host is asked to report `event` when the
    /// first listener for it is added.
    pub fn on(&self, id: ObjectId, event: &str, handler: impl Fn(&Event) + 'static) -> Result<ListenerId, BridgeError> {
        let mut state = self.state.borrow_mut();
        let listener = ListenerId(state.next_listener);
        state.next_listener += 1;
        if !state.require_created(id)? {
            return Ok(listener);
        }
        let handler: Handler = Rc::new(handler);
        let first = state
            .registry
            .get_mut(&id)
            .is_some_and(|record| record.listeners.add(event, listener, handler));
        if first && !is_local_event(event) {
            state.transport.enqueue(Operation::Listen {
                id,
                event: event.to_string(),
            });
        }
        Ok(listener)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&self, id: ObjectId, event: &str, listener: ListenerId) -> Result<bool, BridgeError> {
        let mut state = self.state.borrow_mut();
        if !state.require_created(id)? {
            return Ok(false);
        }
        let removed = state
            .registry
            .get_mut(&id)
            .and_then(|record| record.listeners.remove(event, listener));
        if removed == Some(true) && !is_local_event(event) {
            state.transport.enqueue(Operation::Unlisten {
                id,
                event: event.to_string(),
            });
        }
        Ok(removed.is_some())
    }

    /// Number of listeners registered for `event` on `id`.
    pub fn listener_count(&self, id: ObjectId, event: &str) -> usize {
        self.state
            .borrow()
            .registry
            .get(&id)
            .map_or(0, |r| r.listeners.count(event))
    }

    /// Dispose an object and its descendants.
    ///
    /// Fires the local `dispose` event first. Pending operations of the
    /// whole subtree are cancelled; a `destroy` is queued for `id` unless its
    /// `create` was never sent, in which case nothing reaches the host.
    pub fn dispose(&self, id: ObjectId) -> Result<(), BridgeError> {
        let notifications = {
            let state = self.state.borrow();
            if !state.require_created(id)? {
                return Ok(());
            }
            state
                .subtree(id)
                .into_iter()
                .filter_map(|node| {
                    let record = state.registry.get(&node)?;
                    Some((node, record.listeners.handlers("dispose")))
                })
                .collect::<Vec<_>>()
        };
        for (node, handlers) in notifications {
            let event = Event {
                name: "dispose".into(),
                target: node,
                payload: Properties::new(),
            };
            for handler in handlers {
                handler(&event);
            }
        }

        let mut state = self.state.borrow_mut();
        // A dispose listener may already have disposed the object.
        if state.status(id) != Status::Live {
            return Ok(());
        }
        let subtree = state.subtree(id);
        let unsent = state.transport.batch().has_pending_create(id);
        let parent = state.registry.get(&id).and_then(|r| r.parent);
        for node in &subtree {
            state.transport.batch_mut().cancel(*node);
            state.registry.remove(node);
        }
        if let Some(parent) = parent
            && let Some(record) = state.registry.get_mut(&parent)
        {
            record.children.retain(|child| *child != id);
        }
        if !unsent {
            state.transport.enqueue(Operation::Destroy { id });
        }
        log::debug!("dispose {id} ({} objects)", subtree.len());
        Ok(())
    }

    /// Flush signal: pack canvas contexts, send the open batch, start a new
    /// one. Never fails; per-operation failures are in the report.
    pub fn flush(&self) -> FlushReport {
        self.state.borrow_mut().flush()
    }

    /// Route a host notification to the listeners of its object.
    ///
    /// Events for unknown or disposed objects are dropped.
    pub fn dispatch(&self, event: HostEvent) {
        let (handlers, payload) = {
            let state = self.state.borrow();
            let Some(record) = state.registry.get(&event.id) else {
                log::trace!("dropping {} for {} (not live)", event.event, event.id);
                return;
            };
            let handlers = record.listeners.handlers(&event.event);
            if handlers.is_empty() {
                return;
            }
            (handlers, codec::decode_payload(record.table, event.payload))
        };
        let event = Event {
            name: event.event,
            target: event.id,
            payload,
        };
        for handler in handlers {
            handler(&event);
        }
    }

    /// Deliver a client-side event to the listeners of `id`.
    pub fn trigger(&self, id: ObjectId, event: &str, payload: Properties) {
        let handlers = match self.state.borrow().registry.get(&id) {
            Some(record) => record.listeners.handlers(event),
            None => return,
        };
        let event = Event {
            name: event.to_string(),
            target: id,
            payload,
        };
        for handler in handlers {
            handler(&event);
        }
    }

    /// Operations waiting for the next flush, in issuance order.
    pub fn pending_operations(&self) -> Vec<Operation> {
        self.state.borrow().transport.batch().operations().to_vec()
    }

    pub(crate) fn report(&self, err: InvalidValue) {
        self.state.borrow_mut().diagnostics.report(err);
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.state.borrow().diagnostics.entries().to_vec()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.state.borrow_mut().diagnostics.take()
    }

    /// Tear down all client state: registry, open batch, canvas contexts and
    /// diagnostics.
    ///
    /// Ids keep counting up, so handles from before the reset read as
    /// disposed instead of aliasing new objects.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.registry.clear();
        state.transport.reset();
        state.contexts.clear();
        state.diagnostics.clear();
        log::debug!("bridge reset, next id o{}", state.next_id);
    }
}
