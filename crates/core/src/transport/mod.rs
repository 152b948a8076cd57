//! Bridge transport: the channel to the host plus the open batch.

pub mod batch;

use native_bridge_protocol::{ObjectId, Operation, OperationKind};
use serde_json::Value;

use crate::error::{BridgeError, ChannelError, OperationFailure, ProtocolMismatch};

pub use batch::Batch;

/// Call-like connection to the host.
///
/// The host executes the operation and answers with a value for `get`
/// and with `None` for everything else.
pub trait Channel {
    fn call(&mut self, operation: &Operation) -> Result<Option<Value>, ChannelError>;
}

impl<F> Channel for F
where
    F: FnMut(&Operation) -> Result<Option<Value>, ChannelError>,
{
    fn call(&mut self, operation: &Operation) -> Result<Option<Value>, ChannelError> {
        self(operation)
    }
}

/// Outcome of one flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Operations handed to the channel.
    pub sent: usize,
    /// Operations the host failed or answered unexpectedly.
    pub failures: Vec<OperationFailure>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Transport {
    channel: Box<dyn Channel>,
    batch: Batch,
    hoist_creates: bool,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("batch", &self.batch)
            .field("hoist_creates", &self.hoist_creates)
            .finish_non_exhaustive()
    }
}

impl Transport {
    pub fn new(channel: Box<dyn Channel>, hoist_creates: bool) -> Self {
        Self {
            channel,
            batch: Batch::new(),
            hoist_creates,
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut Batch {
        &mut self.batch
    }

    pub fn enqueue(&mut self, operation: Operation) {
        log::trace!("enqueue {} {}", operation.kind(), operation.target());
        self.batch.push(operation);
    }

    /// Send the open batch and start a new one.
    ///
    /// Every operation is attempted; failures are collected in the report
    /// instead of aborting the rest of the batch.
    pub fn flush(&mut self) -> FlushReport {
        let operations = self.batch.drain(self.hoist_creates);
        let mut report = FlushReport::default();
        for (index, operation) in operations.iter().enumerate() {
            report.sent += 1;
            if let Err(error) = self.send(operation) {
                log::warn!(
                    "{} on {} failed: {error}",
                    operation.kind(),
                    operation.target()
                );
                report.failures.push(OperationFailure {
                    index,
                    id: operation.target(),
                    kind: operation.kind(),
                    error,
                });
            }
        }
        if report.sent > 0 {
            log::debug!(
                "flushed {} operations ({} failed)",
                report.sent,
                report.failures.len()
            );
        }
        report
    }

    /// Send one operation right away, outside the batch.
    pub fn send(&mut self, operation: &Operation) -> Result<Option<Value>, BridgeError> {
        log::trace!("send {} {}", operation.kind(), operation.target());
        let response = self.channel.call(operation)?;
        match (operation.expects_value(), response) {
            (true, Some(value)) => Ok(Some(value)),
            (true, None) => Err(ProtocolMismatch::MissingValue(operation.kind()).into()),
            (false, None) => Ok(None),
            (false, Some(value)) => Err(ProtocolMismatch::UnexpectedValue {
                kind: operation.kind(),
                value,
            }
            .into()),
        }
    }

    /// Synchronous property read.
    pub fn get(&mut self, id: ObjectId, property: &str) -> Result<Value, BridgeError> {
        let operation = Operation::Get {
            id,
            property: property.to_string(),
        };
        self.send(&operation)?
            .ok_or_else(|| ProtocolMismatch::MissingValue(OperationKind::Get).into())
    }

    pub fn reset(&mut self) {
        self.batch.clear();
    }
}
