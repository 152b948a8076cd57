//! Client side of a native UI bridge.
//!
//! Application code manipulates [`Proxy`] objects; the [`Bridge`] encodes
//! their property changes, coalesces them into one batch per flush and sends
//! the batch over a [`Channel`] to the host that owns the native widgets.
//! Canvas drawing is packed into a compact columnar payload
//! ([`CanvasContext`]), and animations run natively ([`Animation`]).

pub mod animation;
pub mod bridge;
pub mod canvas;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod proxy;
pub mod recording;
pub mod transport;

pub use animation::{Animation, AnimationOptions, AnimationState, Easing};
pub use bridge::{Bridge, WeakBridge};
pub use canvas::{CanvasContext, DrawingState, Matrix, TextMetrics};
pub use config::BridgeConfig;
pub use diagnostics::Diagnostic;
pub use error::{BridgeError, ChannelError, InvalidValue, OperationFailure, ProtocolMismatch, UsageError};
pub use native_bridge_protocol as protocol;
pub use proxy::{Event, ListenerId, Proxy};
pub use recording::RecordingChannel;
pub use transport::{Channel, FlushReport};
