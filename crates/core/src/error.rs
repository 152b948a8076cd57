use native_bridge_protocol::{ObjectId, OperationKind, UnpackError};
use serde_json::Value;
use thiserror::Error;

/// A value outside a property's accepted domain.
///
/// The display form is the diagnostic text emitted when the value is
/// rejected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unsupported value for {property}: {}", display_value(.value))]
pub struct InvalidValue {
    pub property: String,
    pub value: Value,
}

impl InvalidValue {
    pub fn new(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

/// Renders a value the way it reads in a message: strings without quotes.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("object {0} was never created")]
    NotCreated(ObjectId),
    #[error("object {0} is disposed")]
    Disposed(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("channel failure: {message}")]
pub struct ChannelError {
    pub message: String,
}

impl ChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolMismatch {
    #[error("host returned no value for {0}")]
    MissingValue(OperationKind),
    #[error("host returned a value for {kind}: {value}")]
    UnexpectedValue { kind: OperationKind, value: Value },
    #[error("packed payload: {0}")]
    Packed(#[from] UnpackError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Validation(#[from] InvalidValue),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Protocol(#[from] ProtocolMismatch),
}

/// One operation of a flushed batch that the host did not accept.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailure {
    /// Position of the operation within the transmitted batch.
    pub index: usize,
    pub id: ObjectId,
    pub kind: OperationKind,
    pub error: BridgeError,
}
