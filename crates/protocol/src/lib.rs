pub mod commands;
pub mod operation;
pub mod packed;
pub mod tokens;
pub mod types;

pub use commands::{Arity, DrawInstruction};
pub use operation::{HostEvent, Operation, OperationKind, Properties};
pub use packed::{PackedDecoder, PackedOperations, UnpackError};
pub use tokens::{LineCap, LineJoin, TextAlign, TextBaseline, UnknownToken};
pub use types::{Bounds, Color, Font, ImageSource, ObjectId};
