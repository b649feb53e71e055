//! Read-only view of the elaborated object model.
//!
//! The elaborator that walks the source design fills an [`ObjectTree`]:
//! every module, signal, port, data member, and array element becomes an
//! [`ElabObject`] with a closed [`ObjectKind`], and every process becomes a
//! [`ProcessInfo`] row. The generator only ever queries this tree.

use crate::arena::Arena;
use crate::ids::{DeclId, ObjectId, ProcessId};
use serde::{Deserialize, Serialize};
use svgen_common::{InternalError, Span, SvgenResult};

/// A source declaration: a field, a method, or a module member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    /// Declared name.
    pub name: String,
    /// Location of the declaration.
    pub span: Span,
}

/// A constant scalar value held by a primitive object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// A value of a signed type.
    Signed(i64),
    /// A value of an unsigned type.
    Unsigned(u64),
}

impl ScalarValue {
    /// Returns `true` for values of a signed type.
    pub fn is_signed(self) -> bool {
        matches!(self, ScalarValue::Signed(_))
    }

    /// Widens to a common representation for initializers.
    pub fn to_i128(self) -> i128 {
        match self {
            ScalarValue::Signed(v) => i128::from(v),
            ScalarValue::Unsigned(v) => i128::from(v),
        }
    }
}

/// A primitive value together with its declared bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueInfo {
    /// Declared width in bits.
    pub bitwidth: u32,
    /// The value itself.
    pub value: ScalarValue,
}

/// What an elaborated object is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A module, or a modular interface (a module-like unit living inside
    /// another module).
    Module {
        /// The elaborated type, used as type identity.
        type_name: String,
        /// `true` for modular interfaces.
        modular_interface: bool,
    },
    /// A record (struct) with member objects.
    Record,
    /// A homogeneous array; elements are objects placed as array elements.
    Array,
    /// A channel connecting processes.
    Signal,
    /// A port; `signal_port` ports carry a channel, others are pointers.
    Port {
        /// Whether the port is backed by a channel variable.
        signal_port: bool,
    },
    /// A scalar primitive, constant if `value` is present.
    Primitive {
        /// The fixed value, when known at elaboration time.
        value: Option<ValueInfo>,
    },
}

/// How an object is attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// No parent.
    Top,
    /// A named member of a module or record.
    DataMember,
    /// Element `index` of the parent array.
    ArrayElement {
        /// Position within the parent array.
        index: usize,
    },
    /// Dynamically allocated, owned through the parent pointer object.
    Pointee,
}

/// One object of the elaborated model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElabObject {
    /// Enclosing object, `None` for the top.
    pub parent: Option<ObjectId>,
    /// Variant of the object.
    pub kind: ObjectKind,
    /// How the object hangs off its parent.
    pub placement: Placement,
    /// Declaration that introduced the object, absent for array elements.
    pub decl: Option<DeclId>,
    /// Element objects, in index order, for arrays.
    pub elements: Vec<ObjectId>,
}

/// The kind of an elaborated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessKind {
    /// Combinational method, re-evaluated whenever an input changes.
    Method,
    /// Free-running thread.
    Thread,
    /// Thread clocked by an edge of its sensitivity.
    ClockedThread,
}

/// An edge (or level) trigger of a static sensitivity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Any value change.
    Any,
    /// Rising edge.
    Pos,
    /// Falling edge.
    Neg,
}

/// One entry of a static sensitivity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensEvent {
    /// Trigger edge.
    pub edge: Edge,
    /// The signal or port object (possibly an array element).
    pub source: ObjectId,
}

/// A reset declared for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetDesc {
    /// The signal or port object (possibly an array element).
    pub source: ObjectId,
    /// Active level: `true` resets while high.
    pub level: bool,
    /// Asynchronous resets join the sensitivity list.
    pub is_async: bool,
}

/// An elaborated process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// The module or modular interface object the process belongs to.
    pub parent: ObjectId,
    /// Process kind.
    pub kind: ProcessKind,
    /// The method declaration; required for naming and diagnostics.
    pub decl: Option<DeclId>,
    /// Static sensitivity.
    pub sensitivity: Vec<SensEvent>,
    /// Declared resets.
    pub resets: Vec<ResetDesc>,
    /// The body infers a latch; method processes then use `always_latch`.
    pub has_latch: bool,
}

impl ProcessInfo {
    /// A process with empty sensitivity and no resets.
    pub fn new(parent: ObjectId, kind: ProcessKind, decl: DeclId) -> Self {
        Self {
            parent,
            kind,
            decl: Some(decl),
            sensitivity: Vec::new(),
            resets: Vec::new(),
            has_latch: false,
        }
    }

    /// Returns `true` for combinational methods.
    pub fn is_method(&self) -> bool {
        self.kind == ProcessKind::Method
    }

    /// Returns `true` for threads and clocked threads.
    pub fn is_thread(&self) -> bool {
        !self.is_method()
    }
}

/// Arena of the elaborated objects, declarations, and processes.
#[derive(Debug, Clone, Default)]
pub struct ObjectTree {
    objects: Arena<ObjectId, ElabObject>,
    decls: Arena<DeclId, Decl>,
    processes: Arena<ProcessId, ProcessInfo>,
}

impl ObjectTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration.
    pub fn add_decl(&mut self, name: impl Into<String>, span: Span) -> DeclId {
        self.decls.alloc(Decl {
            name: name.into(),
            span,
        })
    }

    /// Adds an object under `parent`.
    ///
    /// Objects placed as array elements are appended to the parent's
    /// element list; the parent must be an array and the index must be the
    /// next free position.
    pub fn add_object(
        &mut self,
        parent: Option<ObjectId>,
        kind: ObjectKind,
        placement: Placement,
        decl: Option<DeclId>,
    ) -> SvgenResult<ObjectId> {
        if let Placement::ArrayElement { index } = placement {
            let parent_obj = parent
                .and_then(|p| self.objects.get(p))
                .ok_or_else(|| InternalError::new("array element without a parent array"))?;
            if parent_obj.kind != ObjectKind::Array || parent_obj.elements.len() != index {
                return Err(InternalError::new(format!(
                    "array element {index} added out of order or under a non-array"
                )));
            }
        }
        let id = self.objects.alloc(ElabObject {
            parent,
            kind,
            placement,
            decl,
            elements: Vec::new(),
        });
        if let (Some(parent), Placement::ArrayElement { .. }) = (parent, placement) {
            self.objects[parent].elements.push(id);
        }
        Ok(id)
    }

    /// Registers a process.
    pub fn add_process(&mut self, info: ProcessInfo) -> ProcessId {
        self.processes.alloc(info)
    }

    /// Looks up an object.
    pub fn object(&self, id: ObjectId) -> SvgenResult<&ElabObject> {
        self.objects
            .get(id)
            .ok_or_else(|| InternalError::new(format!("unknown object #{}", id.as_raw())))
    }

    /// Looks up a declaration.
    pub fn decl(&self, id: DeclId) -> SvgenResult<&Decl> {
        self.decls
            .get(id)
            .ok_or_else(|| InternalError::new(format!("unknown declaration #{}", id.as_raw())))
    }

    /// Looks up a process.
    pub fn process(&self, id: ProcessId) -> SvgenResult<&ProcessInfo> {
        self.processes
            .get(id)
            .ok_or_else(|| InternalError::new(format!("unknown process #{}", id.as_raw())))
    }

    /// The declaration of a process, which every process must have.
    pub fn process_decl(&self, id: ProcessId) -> SvgenResult<&Decl> {
        let decl = self.process(id)?.decl.ok_or_else(|| {
            InternalError::new(format!("process #{} has no declaration", id.as_raw()))
        })?;
        self.decl(decl)
    }

    /// Returns `true` for signal objects.
    pub fn is_signal(&self, id: ObjectId) -> bool {
        matches!(self.objects.get(id), Some(o) if o.kind == ObjectKind::Signal)
    }

    /// Returns `true` for ports backed by a channel.
    pub fn is_signal_port(&self, id: ObjectId) -> bool {
        matches!(
            self.objects.get(id),
            Some(o) if o.kind == ObjectKind::Port { signal_port: true }
        )
    }

    /// Returns `true` for modules and modular interfaces.
    pub fn is_module_like(&self, id: ObjectId) -> bool {
        matches!(
            self.objects.get(id),
            Some(ElabObject {
                kind: ObjectKind::Module { .. },
                ..
            })
        )
    }

    /// Returns `true` for modular interfaces.
    pub fn is_modular_interface(&self, id: ObjectId) -> bool {
        matches!(
            self.objects.get(id),
            Some(ElabObject {
                kind: ObjectKind::Module {
                    modular_interface: true,
                    ..
                },
                ..
            })
        )
    }

    /// The elaborated type identity of a module object.
    pub fn module_type_name(&self, id: ObjectId) -> SvgenResult<&str> {
        match &self.object(id)?.kind {
            ObjectKind::Module { type_name, .. } => Ok(type_name),
            other => Err(InternalError::new(format!(
                "object #{} is not a module: {other:?}",
                id.as_raw()
            ))),
        }
    }

    /// The constant value of a primitive object, if any.
    pub fn value(&self, id: ObjectId) -> Option<ValueInfo> {
        match self.objects.get(id)?.kind {
            ObjectKind::Primitive { value } => value,
            _ => None,
        }
    }

    /// Splits trailing array-element hops off `id`: returns the outermost
    /// non-element object and the element indices from outer to inner.
    ///
    /// `sig[2][1]` yields `(sig, [2, 1])`; a plain object yields itself and
    /// an empty path.
    pub fn array_element_with_indices(&self, id: ObjectId) -> (ObjectId, Vec<usize>) {
        let mut indices = Vec::new();
        let mut cur = id;
        while let Some(obj) = self.objects.get(cur) {
            match (obj.placement, obj.parent) {
                (Placement::ArrayElement { index }, Some(parent)) => {
                    indices.push(index);
                    cur = parent;
                }
                _ => break,
            }
        }
        indices.reverse();
        (cur, indices)
    }

    /// The outermost array or pointer that (transitively) holds `id`
    /// through element or pointee links only.
    pub fn topmost_parent_array_or_pointer(&self, id: ObjectId) -> Option<ObjectId> {
        let mut found = None;
        let mut cur = id;
        while let Some(obj) = self.objects.get(cur) {
            match (obj.placement, obj.parent) {
                (Placement::ArrayElement { .. } | Placement::Pointee, Some(parent)) => {
                    found = Some(parent);
                    cur = parent;
                }
                _ => break,
            }
        }
        found
    }

    /// Returns `true` if `id` hangs off its parent as an element or a pointee.
    pub fn is_element_or_pointee(&self, id: ObjectId) -> bool {
        matches!(
            self.objects.get(id).map(|o| o.placement),
            Some(Placement::ArrayElement { .. } | Placement::Pointee)
        )
    }
}
