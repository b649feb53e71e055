//! The generated module: pools, lookup maps, and per-process tables.
//!
//! An [`SvModule`] is populated through the registry operations while the
//! object model is walked, minimized once by the liveness pass, and then
//! read by the use/def checker, the serializer, and the equivalence check.

use crate::arena::Arena;
use crate::ids::{DeclId, InstanceId, ModuleId, ObjectId, ProcessId, VarId};
use crate::names::NameAllocator;
use crate::var::{Assignment, Port, VarKind, VarPool, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use svgen_common::{InternalError, SvgenResult};

/// Pre-rendered text of one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCode {
    /// Main statement sequence.
    pub body: String,
    /// Local declarations emitted before the body.
    pub local_vars: String,
    /// Statements executed while reset is active.
    pub reset_section: String,
    /// Temporal assertions checked every clock.
    pub temp_asserts: String,
    /// Assertions checked in reset.
    pub temp_rst_asserts: String,
}

impl ProcessCode {
    /// Code with only a main body.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }
}

/// Pre-rendered target text replacing a module's generated body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intrinsic {
    /// Verbatim module text.
    pub text: String,
}

/// A port binding of an instance: `.port(expr)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Port name in the child module.
    pub port: String,
    /// Parent-side expression text.
    pub expr: String,
}

/// A sub-module instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name, unique within the parent module.
    pub name: String,
    /// The instantiated module.
    pub child: ModuleId,
    /// The elaborated object of the child.
    pub object: ObjectId,
    /// Port bindings, in insertion order.
    pub bindings: Vec<Binding>,
}

/// A registered `register <= next` copy of a split thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterNextPair {
    /// Register updated in the synchronous block.
    pub register: VarId,
    /// Next-state variable computed combinationally.
    pub next: VarId,
    /// Appended to both names, selects a modular interface array element.
    pub suffix: String,
}

/// A process placed in a module, with its module-unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProcess {
    /// The elaborated process.
    pub id: ProcessId,
    /// Allocated block name.
    pub name: String,
}

/// Key sharing one declaration among members of modular interface array
/// elements: the enclosing module or interface, the member's declaration,
/// and the declarations of the intermediate records up to that scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MifNameKey {
    pub(crate) scope: ObjectId,
    pub(crate) decl: DeclId,
    pub(crate) parent_decls: Vec<Option<DeclId>>,
}

/// Per-process use or def record.
pub type UseDefMap = BTreeMap<ProcessId, BTreeMap<VarId, VarKind>>;

/// One generated SystemVerilog module.
#[derive(Debug, Clone)]
pub struct SvModule {
    pub(crate) object: ObjectId,
    pub(crate) name: String,
    pub(crate) comment: String,
    pub(crate) intrinsic: Option<Intrinsic>,
    pub(crate) names: NameAllocator,

    pub(crate) vars: Arena<VarId, Variable>,
    pub(crate) ports: Vec<Port>,
    pub(crate) signals: Vec<VarId>,
    pub(crate) channel_map: HashMap<ObjectId, Vec<VarId>>,
    pub(crate) data_map: HashMap<ObjectId, VarId>,
    pub(crate) mif_names: HashMap<MifNameKey, String>,
    pub(crate) mif_vars: HashSet<VarId>,

    pub(crate) assignments: Vec<Assignment>,
    pub(crate) instances: Arena<InstanceId, Instance>,
    pub(crate) instance_map: HashMap<ObjectId, InstanceId>,

    pub(crate) processes: Vec<ModuleProcess>,
    pub(crate) bodies: HashMap<ProcessId, ProcessCode>,
    pub(crate) proc_locals: HashMap<ProcessId, Vec<VarId>>,
    pub(crate) proc_consts: HashMap<ProcessId, Vec<VarId>>,
    pub(crate) reg_next_pairs: HashMap<ProcessId, Vec<RegisterNextPair>>,
    pub(crate) proc_reg_vars: HashMap<ProcessId, HashSet<VarId>>,

    pub(crate) proc_use: UseDefMap,
    pub(crate) proc_def: UseDefMap,
    pub(crate) sva_use: BTreeMap<VarId, VarKind>,
    pub(crate) bind_vars: Vec<VarId>,
    pub(crate) const_values: HashMap<VarId, bool>,

    pub(crate) required: HashSet<VarId>,
    pub(crate) liveness_done: bool,
    pub(crate) sva_code: String,
}

impl SvModule {
    /// Creates an empty module for the elaborated module `object`.
    pub fn new(object: ObjectId, name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            object,
            name: name.into(),
            comment: comment.into(),
            intrinsic: None,
            names: NameAllocator::new(),
            vars: Arena::new(),
            ports: Vec::new(),
            signals: Vec::new(),
            channel_map: HashMap::new(),
            data_map: HashMap::new(),
            mif_names: HashMap::new(),
            mif_vars: HashSet::new(),
            assignments: Vec::new(),
            instances: Arena::new(),
            instance_map: HashMap::new(),
            processes: Vec::new(),
            bodies: HashMap::new(),
            proc_locals: HashMap::new(),
            proc_consts: HashMap::new(),
            reg_next_pairs: HashMap::new(),
            proc_reg_vars: HashMap::new(),
            proc_use: BTreeMap::new(),
            proc_def: BTreeMap::new(),
            sva_use: BTreeMap::new(),
            bind_vars: Vec::new(),
            const_values: HashMap::new(),
            required: HashSet::new(),
            liveness_done: false,
            sva_code: String::new(),
        }
    }

    /// The elaborated module object.
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text comment printed on the `module` line.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Replaces the generated body with verbatim text.
    pub fn set_intrinsic(&mut self, text: impl Into<String>) {
        self.intrinsic = Some(Intrinsic { text: text.into() });
    }

    /// The intrinsic descriptor, if any.
    pub fn intrinsic(&self) -> Option<&Intrinsic> {
        self.intrinsic.as_ref()
    }

    /// Returns `true` for modules emitted verbatim.
    pub fn is_intrinsic(&self) -> bool {
        self.intrinsic.is_some()
    }

    /// The name allocator of this module's scope.
    pub fn names(&self) -> &NameAllocator {
        &self.names
    }

    /// Looks up a variable.
    pub fn var(&self, id: VarId) -> SvgenResult<&Variable> {
        self.vars
            .get(id)
            .ok_or_else(|| InternalError::new(format!("{}: unknown variable #{}", self.name, id.as_raw())))
    }

    /// Variables of one pool, in creation order.
    pub fn pool(&self, pool: VarPool) -> impl Iterator<Item = (VarId, &Variable)> + '_ {
        self.vars.iter().filter(move |(_, v)| v.pool == pool)
    }

    /// Ports, in declaration order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Signals, in declaration order.
    pub fn signals(&self) -> &[VarId] {
        &self.signals
    }

    /// Current continuous assignments.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Instances, in creation order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.instances.iter().map(|(_, inst)| inst)
    }

    /// Looks up an instance.
    pub fn instance(&self, id: InstanceId) -> SvgenResult<&Instance> {
        self.instances
            .get(id)
            .ok_or_else(|| InternalError::new(format!("{}: unknown instance #{}", self.name, id.as_raw())))
    }

    /// Processes, in insertion order.
    pub fn processes(&self) -> &[ModuleProcess] {
        &self.processes
    }

    /// The pre-rendered code of a process.
    pub fn process_code(&self, proc: ProcessId) -> SvgenResult<&ProcessCode> {
        self.bodies.get(&proc).ok_or_else(|| {
            InternalError::new(format!("{}: no body for process #{}", self.name, proc.as_raw()))
        })
    }

    /// Channel variables mapped to a signal or signal port object.
    pub fn channel_vars(&self, obj: ObjectId) -> Option<&[VarId]> {
        self.channel_map.get(&obj).map(Vec::as_slice)
    }

    /// Like [`channel_vars`](Self::channel_vars), but a missing mapping is a
    /// contract failure.
    pub(crate) fn channel_vars_or_err(&self, obj: ObjectId) -> SvgenResult<&[VarId]> {
        self.channel_vars(obj).ok_or_else(|| {
            InternalError::new(format!(
                "{}: object #{} has no channel variable",
                self.name,
                obj.as_raw()
            ))
        })
    }

    /// Returns `true` if the liveness pass kept `var`.
    pub fn is_required(&self, var: VarId) -> bool {
        self.required.contains(&var)
    }

    /// The variables kept by the liveness pass.
    pub fn required(&self) -> &HashSet<VarId> {
        &self.required
    }

    /// Returns `true` once the liveness pass has run.
    pub fn is_finalized(&self) -> bool {
        self.liveness_done
    }

    /// Returns `true` if `var` is shared by members of modular interface
    /// array elements.
    pub fn is_mif_array_var(&self, var: VarId) -> bool {
        self.mif_vars.contains(&var)
    }

    /// Variables that are process-local to `proc`, in insertion order.
    pub fn process_locals(&self, proc: ProcessId) -> &[VarId] {
        self.proc_locals.get(&proc).map(Vec::as_slice).unwrap_or_default()
    }

    /// Constants declared in `proc`, in insertion order.
    pub fn process_consts(&self, proc: ProcessId) -> &[VarId] {
        self.proc_consts.get(&proc).map(Vec::as_slice).unwrap_or_default()
    }

    /// Register/next pairs of `proc`.
    pub fn register_next_pairs(&self, proc: ProcessId) -> &[RegisterNextPair] {
        self.reg_next_pairs.get(&proc).map(Vec::as_slice).unwrap_or_default()
    }

    /// Assertion property code appended to the module.
    pub fn sva_code(&self) -> &str {
        &self.sva_code
    }

    /// Returns `true` if `var` holds a fixed initial value: not recorded
    /// at all, or recorded with its uses replaced by the literal.
    pub(crate) fn is_initialized(&self, var: VarId) -> bool {
        self.const_values.get(&var) != Some(&false)
    }

    /// Returns `true` if `var` is a recorded constant whose uses were all
    /// replaced by the literal.
    pub(crate) fn is_replaced_const(&self, var: VarId) -> bool {
        self.const_values.get(&var) == Some(&true)
    }

    pub(crate) fn var_name(&self, id: VarId) -> SvgenResult<&str> {
        Ok(&self.var(id)?.name)
    }
}
