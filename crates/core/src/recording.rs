//! In-memory host used for dry runs and tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use native_bridge_protocol::{ObjectId, Operation, OperationKind, PackedOperations, Properties};
use serde_json::Value;

use crate::error::ChannelError;
use crate::transport::Channel;

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<Operation>,
    properties: HashMap<ObjectId, Properties>,
    failing: Vec<(ObjectId, OperationKind)>,
}

/// A [`Channel`] that records every operation and answers `get` from the
/// values it has seen.
///
/// Clones share one recording, so a test can keep a handle after moving the
/// channel into a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations received so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.inner.borrow().calls.clone()
    }

    pub fn calls_of(&self, kind: OperationKind) -> Vec<Operation> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|op| op.kind() == kind)
            .cloned()
            .collect()
    }

    /// Operations targeting `id`.
    pub fn calls_for(&self, id: ObjectId) -> Vec<Operation> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|op| op.target() == id)
            .cloned()
            .collect()
    }

    /// Decoded `packedOperations` of every `draw` call sent to `gc`.
    pub fn draw_payloads(&self, gc: ObjectId) -> Vec<PackedOperations> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|op| match op {
                Operation::Call {
                    id,
                    method,
                    parameters,
                } if *id == gc && method == "draw" => parameters.get("packedOperations").cloned(),
                _ => None,
            })
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }

    /// Forget recorded operations; stored property values stay.
    pub fn reset_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    /// Set a host-side value, as if the native object changed it.
    pub fn prime(&self, id: ObjectId, property: &str, value: Value) {
        self.inner
            .borrow_mut()
            .properties
            .entry(id)
            .or_default()
            .insert(property.to_string(), value);
    }

    /// Last value the host holds for a wire property.
    pub fn property(&self, id: ObjectId, property: &str) -> Option<Value> {
        self.inner
            .borrow()
            .properties
            .get(&id)
            .and_then(|props| props.get(property).cloned())
    }

    /// Make every later operation of `kind` on `id` fail.
    pub fn fail_on(&self, id: ObjectId, kind: OperationKind) {
        self.inner.borrow_mut().failing.push((id, kind));
    }
}

impl Channel for RecordingChannel {
    fn call(&mut self, operation: &Operation) -> Result<Option<Value>, ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(operation.clone());
        let target = operation.target();
        if inner.failing.contains(&(target, operation.kind())) {
            return Err(ChannelError::new(format!("{} {target} rejected", operation.kind())));
        }
        match operation {
            Operation::Create { id, properties, .. } => {
                inner.properties.insert(*id, properties.clone());
                Ok(None)
            }
            Operation::Set { id, properties } => {
                let stored = inner.properties.entry(*id).or_default();
                for (key, value) in properties {
                    stored.insert(key.clone(), value.clone());
                }
                Ok(None)
            }
            Operation::Get { id, property } => Ok(Some(
                inner
                    .properties
                    .get(id)
                    .and_then(|props| props.get(property).cloned())
                    .unwrap_or(Value::Null),
            )),
            Operation::Destroy { id } => {
                inner.properties.remove(id);
                Ok(None)
            }
            Operation::Call { .. } | Operation::Listen { .. } | Operation::Unlisten { .. } => Ok(None),
        }
    }
}
