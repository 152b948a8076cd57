use serde::{Deserialize, Serialize};

use crate::commands::{DrawInstruction, arity};

/// Columnar payload of one `draw` call.
///
/// Serialized as the 6-tuple
/// `[names, indices, doubles, booleans, strings, colors]`:
///
/// - `names`: operation names first used since the previous payload of the
///   same context. Together with all earlier payloads they form the
///   context's name table.
/// - `indices`: one entry per instruction, the position of its name in the
///   name table.
/// - the remaining columns hold the instructions' arguments in instruction
///   order; their layout per name is fixed by [`arity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PackedWire", into = "PackedWire")]
pub struct PackedOperations {
    pub names: Vec<String>,
    pub indices: Vec<u32>,
    pub doubles: Vec<f64>,
    pub booleans: Vec<bool>,
    pub strings: Vec<String>,
    pub colors: Vec<u8>,
}

type PackedWire = (
    Vec<String>,
    Vec<u32>,
    Vec<f64>,
    Vec<bool>,
    Vec<String>,
    Vec<u8>,
);

impl From<PackedWire> for PackedOperations {
    fn from((names, indices, doubles, booleans, strings, colors): PackedWire) -> Self {
        Self {
            names,
            indices,
            doubles,
            booleans,
            strings,
            colors,
        }
    }
}

impl From<PackedOperations> for PackedWire {
    fn from(p: PackedOperations) -> Self {
        (
            p.names,
            p.indices,
            p.doubles,
            p.booleans,
            p.strings,
            p.colors,
        )
    }
}

impl PackedOperations {
    /// Number of instructions in this payload.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Why a packed payload could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackError {
    /// An index points past the end of the name table.
    UnknownIndex(u32),
    /// A name without a column schema.
    UnknownOperation(String),
    /// An argument column ran out, or an argument was not decodable.
    MalformedArguments(String),
    /// Arguments were left over after the last instruction.
    TrailingArguments,
}

impl std::fmt::Display for UnpackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownIndex(i) => write!(f, "operation index {i} is not in the name table"),
            Self::UnknownOperation(name) => write!(f, "unknown draw operation: {name}"),
            Self::MalformedArguments(name) => write!(f, "malformed arguments for {name}"),
            Self::TrailingArguments => write!(f, "unconsumed arguments after last operation"),
        }
    }
}

impl std::error::Error for UnpackError {}

/// Host-side reader. Keeps the name table of one graphics context across
/// payloads, the way a native renderer has to.
#[derive(Debug, Default)]
pub struct PackedDecoder {
    names: Vec<String>,
}

impl PackedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The name table accumulated so far.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Expand one payload into instructions.
    ///
    /// The payload's new names are added to the table even when expansion
    /// fails later on, since the sender considers them transmitted.
    pub fn unpack(&mut self, packed: &PackedOperations) -> Result<Vec<DrawInstruction>, UnpackError> {
        self.names.extend(packed.names.iter().cloned());

        let (mut d, mut b, mut s, mut c) = (0, 0, 0, 0);
        let mut out = Vec::with_capacity(packed.len());
        for &index in &packed.indices {
            let name = self
                .names
                .get(index as usize)
                .ok_or(UnpackError::UnknownIndex(index))?;
            let schema = arity(name).ok_or_else(|| UnpackError::UnknownOperation(name.clone()))?;
            let malformed = || UnpackError::MalformedArguments(name.clone());
            let instruction = DrawInstruction::from_columns(
                name,
                packed.doubles.get(d..d + schema.doubles).ok_or_else(malformed)?,
                packed.booleans.get(b..b + schema.booleans).ok_or_else(malformed)?,
                packed.strings.get(s..s + schema.strings).ok_or_else(malformed)?,
                packed.colors.get(c..c + schema.colors).ok_or_else(malformed)?,
            )
            .ok_or_else(malformed)?;
            d += schema.doubles;
            b += schema.booleans;
            s += schema.strings;
            c += schema.colors;
            out.push(instruction);
        }

        if d != packed.doubles.len()
            || b != packed.booleans.len()
            || s != packed.strings.len()
            || c != packed.colors.len()
        {
            return Err(UnpackError::TrailingArguments);
        }
        Ok(out)
    }
}
