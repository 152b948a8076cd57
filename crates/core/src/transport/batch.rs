use native_bridge_protocol::{ObjectId, Operation};

/// Operations collected since the last flush, in issuance order.
///
/// Coalescing happens on the way in:
/// - a `set` for an id that already has a pending `set` is merged into it,
///   later values replacing earlier ones while keys keep their first
///   position;
/// - [`Batch::cancel`] drops every pending operation of an id.
#[derive(Debug, Default)]
pub struct Batch {
    operations: Vec<Operation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn push(&mut self, operation: Operation) {
        if let Operation::Set { id, properties } = operation {
            let pending = self.operations.iter_mut().find_map(|op| match op {
                Operation::Set {
                    id: pending_id,
                    properties,
                } if *pending_id == id => Some(properties),
                _ => None,
            });
            match pending {
                Some(merged) => merged.extend(properties),
                None => self.operations.push(Operation::Set { id, properties }),
            }
            return;
        }
        self.operations.push(operation);
    }

    /// Whether any pending operation addresses `id`.
    pub fn references(&self, id: ObjectId) -> bool {
        self.operations.iter().any(|op| op.target() == id)
    }

    /// Whether the `create` of `id` is still pending.
    pub fn has_pending_create(&self, id: ObjectId) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op, Operation::Create { id: pending, .. } if *pending == id))
    }

    /// Drop every pending operation of `id`. Returns how many were dropped.
    pub fn cancel(&mut self, id: ObjectId) -> usize {
        let before = self.operations.len();
        self.operations.retain(|op| op.target() != id);
        before - self.operations.len()
    }

    /// Take the batch for transmission, leaving an empty one behind.
    ///
    /// With `hoist_creates` the `create` operations come first, in creation
    /// order, followed by everything else in issuance order.
    pub fn drain(&mut self, hoist_creates: bool) -> Vec<Operation> {
        let mut operations = std::mem::take(&mut self.operations);
        if hoist_creates {
            // Stable: relative order inside both partitions is kept.
            operations.sort_by_key(|op| !matches!(op, Operation::Create { .. }));
        }
        operations
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use native_bridge_protocol::Properties;
    use serde_json::{Value, json};

    fn props(pairs: &[(&str, Value)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn id(n: u64) -> ObjectId {
        ObjectId::new(n)
    }

    #[test]
    fn sets_on_same_id_merge_last_write_wins() {
        let mut batch = Batch::new();
        batch.push(Operation::Set {
            id: id(1),
            properties: props(&[("a", json!(1)), ("b", json!(2))]),
        });
        batch.push(Operation::Set {
            id: id(1),
            properties: props(&[("c", json!(3)), ("a", json!(4))]),
        });
        assert_eq!(batch.len(), 1);
        let Operation::Set { properties, .. } = &batch.operations()[0] else {
            unreachable!("expected a set");
        };
        let keys: Vec<_> = properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(properties.get("a"), Some(&json!(4)));
    }

    #[test]
    fn sets_on_different_ids_stay_separate() {
        let mut batch = Batch::new();
        batch.push(Operation::Set {
            id: id(1),
            properties: props(&[("a", json!(1))]),
        });
        batch.push(Operation::Set {
            id: id(2),
            properties: props(&[("a", json!(1))]),
        });
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn cancel_removes_all_operations_of_id() {
        let mut batch = Batch::new();
        batch.push(Operation::Create {
            id: id(1),
            type_name: "x".into(),
            properties: Properties::new(),
        });
        batch.push(Operation::Listen {
            id: id(2),
            event: "e".into(),
        });
        batch.push(Operation::Call {
            id: id(1),
            method: "m".into(),
            parameters: Properties::new(),
        });
        assert!(batch.has_pending_create(id(1)));
        assert_eq!(batch.cancel(id(1)), 2);
        assert!(!batch.references(id(1)));
        assert!(batch.references(id(2)));
    }

    #[test]
    fn drain_hoists_creates_in_creation_order() {
        let mut batch = Batch::new();
        batch.push(Operation::Destroy { id: id(9) });
        batch.push(Operation::Create {
            id: id(1),
            type_name: "x".into(),
            properties: Properties::new(),
        });
        batch.push(Operation::Call {
            id: id(1),
            method: "m".into(),
            parameters: Properties::new(),
        });
        batch.push(Operation::Create {
            id: id(2),
            type_name: "x".into(),
            properties: Properties::new(),
        });
        let targets: Vec<_> = batch.drain(true).iter().map(|op| (op.kind().to_string(), op.target().raw())).collect();
        assert_eq!(
            targets,
            vec![
                ("create".to_string(), 1),
                ("create".to_string(), 2),
                ("destroy".to_string(), 9),
                ("call".to_string(), 1),
            ]
        );
        assert!(batch.is_empty());
    }

    #[test]
    fn drain_without_hoisting_keeps_issuance_order() {
        let mut batch = Batch::new();
        batch.push(Operation::Destroy { id: id(9) });
        batch.push(Operation::Create {
            id: id(1),
            type_name: "x".into(),
            properties: Properties::new(),
        });
        let kinds: Vec<_> = batch.drain(false).iter().map(|op| op.kind().to_string()).collect();
        assert_eq!(kinds, vec!["destroy", "create"]);
    }
}
