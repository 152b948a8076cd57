use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ObjectId;

/// Property map as it travels on the wire. Key order is insertion order.
pub type Properties = Map<String, Value>;

/// A single request sent to the host.
///
/// Serialized with an `op` tag, e.g.
/// `{"op":"set","id":"o3","properties":{"text":"OK"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Create {
        id: ObjectId,
        #[serde(rename = "type")]
        type_name: String,
        properties: Properties,
    },
    Set {
        id: ObjectId,
        properties: Properties,
    },
    Get {
        id: ObjectId,
        property: String,
    },
    Call {
        id: ObjectId,
        method: String,
        parameters: Properties,
    },
    Listen {
        id: ObjectId,
        event: String,
    },
    Unlisten {
        id: ObjectId,
        event: String,
    },
    Destroy {
        id: ObjectId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Set,
    Get,
    Call,
    Listen,
    Unlisten,
    Destroy,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Set => "set",
            Self::Get => "get",
            Self::Call => "call",
            Self::Listen => "listen",
            Self::Unlisten => "unlisten",
            Self::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

impl Operation {
    /// The object this operation addresses.
    pub fn target(&self) -> ObjectId {
        match self {
            Self::Create { id, .. }
            | Self::Set { id, .. }
            | Self::Get { id, .. }
            | Self::Call { id, .. }
            | Self::Listen { id, .. }
            | Self::Unlisten { id, .. }
            | Self::Destroy { id } => *id,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Set { .. } => OperationKind::Set,
            Self::Get { .. } => OperationKind::Get,
            Self::Call { .. } => OperationKind::Call,
            Self::Listen { .. } => OperationKind::Listen,
            Self::Unlisten { .. } => OperationKind::Unlisten,
            Self::Destroy { .. } => OperationKind::Destroy,
        }
    }

    /// Whether the host answers this operation with a value.
    pub fn expects_value(&self) -> bool {
        matches!(self, Self::Get { .. })
    }
}

/// Asynchronous notification from the host, e.g.
/// `{"event":"Selection","id":"o4","selection":true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    pub event: String,
    pub id: ObjectId,
    #[serde(flatten)]
    pub payload: Properties,
}

impl HostEvent {
    pub fn new(id: ObjectId, event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            id,
            payload: Properties::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}
