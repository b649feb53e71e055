//! Variables, references, assignments, and ports of a generated module.

use crate::ids::VarId;
use serde::{Deserialize, Serialize};

/// The pool a variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarPool {
    /// Channels: signals, ports, and auxiliary wires.
    Channel,
    /// Plain data members and constants.
    Data,
    /// Variables local to one process.
    ProcessLocal,
}

/// One emitted declaration.
///
/// Equality is by value and ignores nothing: two variables are equal when
/// they would render to the same declaration text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Name, unique within the owning module.
    pub name: String,
    /// Width in bits, at least 1.
    pub bitwidth: u32,
    /// Array dimensions, outermost first; empty for scalars.
    pub array_dims: Vec<usize>,
    /// Signedness of the element type.
    pub signed: bool,
    /// Initializer values, flattened row-major. Non-empty for constants.
    pub init_vals: Vec<i128>,
    /// Free-text comment rendered after the declaration.
    pub comment: String,
    /// Owning pool.
    pub pool: VarPool,
}

impl Variable {
    /// Returns `true` for constants (variables with initializers).
    pub fn is_constant(&self) -> bool {
        !self.init_vals.is_empty()
    }

    /// Returns `true` for array variables.
    pub fn is_array(&self) -> bool {
        !self.array_dims.is_empty()
    }

    /// Unsigned single-bit variables render their values as bit literals.
    pub fn is_bool(&self) -> bool {
        !self.signed && self.bitwidth == 1
    }
}

/// Everything needed to create a variable except its final name and pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSpec {
    pub(crate) name: String,
    pub(crate) bitwidth: u32,
    pub(crate) array_dims: Vec<usize>,
    pub(crate) signed: bool,
    pub(crate) init_vals: Vec<i128>,
    pub(crate) comment: String,
}

impl VarSpec {
    /// An unsigned scalar with the suggested name and width.
    pub fn new(name: impl Into<String>, bitwidth: u32) -> Self {
        Self {
            name: name.into(),
            bitwidth,
            array_dims: Vec::new(),
            signed: false,
            init_vals: Vec::new(),
            comment: String::new(),
        }
    }

    /// Marks the element type signed.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Sets the signedness.
    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Sets the array dimensions, outermost first.
    pub fn dims(mut self, dims: impl IntoIterator<Item = usize>) -> Self {
        self.array_dims = dims.into_iter().collect();
        self
    }

    /// Sets row-major initializer values, making the variable a constant.
    pub fn init(mut self, values: impl IntoIterator<Item = i128>) -> Self {
        self.init_vals = values.into_iter().collect();
        self
    }

    /// Sets the trailing comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The suggested name.
    pub fn suggested_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_variable(self, name: String, pool: VarPool) -> Variable {
        Variable {
            name,
            bitwidth: self.bitwidth,
            array_dims: self.array_dims,
            signed: self.signed,
            init_vals: self.init_vals,
            comment: self.comment,
            pool,
        }
    }
}

/// A variable together with an index path; empty for scalar access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarRef {
    /// Referenced variable.
    pub var: VarId,
    /// Constant indices, outermost first.
    pub indices: Vec<usize>,
}

impl VarRef {
    /// Scalar (unindexed) access.
    pub fn scalar(var: VarId) -> Self {
        Self {
            var,
            indices: Vec::new(),
        }
    }

    /// Indexed access.
    pub fn indexed(var: VarId, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            var,
            indices: indices.into_iter().collect(),
        }
    }

    /// Returns `true` if the reference carries no indices.
    pub fn is_scalar(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A continuous assignment `left := right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Driven side.
    pub left: VarRef,
    /// Driving side.
    pub right: VarRef,
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(left: VarRef, right: VarRef) -> Self {
        Self { left, right }
    }
}

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// `input`
    In,
    /// `output`
    Out,
    /// `inout`
    InOut,
}

impl PortDirection {
    /// The SystemVerilog direction keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            PortDirection::In => "input",
            PortDirection::Out => "output",
            PortDirection::InOut => "inout",
        }
    }
}

/// A module port backed by a channel variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port direction.
    pub direction: PortDirection,
    /// Backing channel variable.
    pub var: VarId,
}

/// Classifies a variable within a process's use/def record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    /// Plain data variable.
    Variable,
    /// Channel: signal or port.
    Channel,
    /// Constant that may be replaced by its value at use sites.
    Const,
}
