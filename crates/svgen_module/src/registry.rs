//! Registry operations: creating variables, instances, and process tables.

use crate::ids::{InstanceId, ModuleId, ObjectId, ProcessId, VarId};
use crate::module::{Binding, Instance, MifNameKey, ModuleProcess, ProcessCode, RegisterNextPair, SvModule};
use crate::object::{ObjectKind, ObjectTree, Placement};
use crate::var::{Assignment, Port, PortDirection, VarKind, VarPool, VarRef, VarSpec};
use std::fmt::Write;
use svgen_common::{InternalError, SvgenResult};
use tracing::trace;

impl SvModule {
    fn push_var(&mut self, spec: VarSpec, pool: VarPool) -> VarId {
        let name = self.names.allocate(spec.suggested_name());
        self.vars.alloc(spec.into_variable(name, pool))
    }

    /// Creates a channel variable for a signal or signal port object.
    ///
    /// An object may map to several channel variables (a record signal is
    /// flattened into one per field); they are kept in creation order.
    pub fn create_channel_variable(&mut self, obj: ObjectId, spec: VarSpec) -> VarId {
        let var = self.push_var(spec, VarPool::Channel);
        self.channel_map.entry(obj).or_default().push(var);
        var
    }

    /// Creates a data variable for a plain data member object.
    pub fn create_data_variable(&mut self, obj: ObjectId, spec: VarSpec) -> VarId {
        let var = self.push_var(spec, VarPool::Data);
        self.data_map.insert(obj, var);
        var
    }

    /// Creates a data variable for a member of a modular interface array
    /// element.
    ///
    /// The same member in every element of the array shares one name: the
    /// first creation for a member path allocates it, later ones reuse it.
    /// All such variables are exempt from use/def checking.
    pub fn create_data_variable_mif_array(
        &mut self,
        objects: &ObjectTree,
        obj: ObjectId,
        scope: ObjectId,
        spec: VarSpec,
    ) -> SvgenResult<VarId> {
        let var_obj = objects.topmost_parent_array_or_pointer(obj).unwrap_or(obj);
        let decl = objects.object(var_obj)?.decl.ok_or_else(|| {
            InternalError::new(format!(
                "member object #{} of a modular interface array has no declaration",
                var_obj.as_raw()
            ))
        })?;

        let mut key = MifNameKey {
            scope,
            decl,
            parent_decls: Vec::new(),
        };
        let mut cur = var_obj;
        loop {
            let o = objects.object(cur)?;
            if !matches!(o.placement, Placement::DataMember | Placement::ArrayElement { .. }) {
                break;
            }
            let Some(parent) = o.parent else { break };
            cur = parent;
            if objects.is_module_like(cur) {
                break;
            }
            key.parent_decls.push(objects.object(cur)?.decl);
        }

        let name = match self.mif_names.get(&key) {
            Some(name) => name.clone(),
            None => {
                let name = self.names.allocate(spec.suggested_name());
                self.mif_names.insert(key, name.clone());
                name
            }
        };
        trace!(name = %name, object = obj.as_raw(), "modular interface array member");

        let var = self.vars.alloc(spec.into_variable(name, VarPool::Data));
        self.data_map.insert(obj, var);
        self.mif_vars.insert(var);
        Ok(var)
    }

    /// Creates a process-local variable, or a member variable used only by
    /// one process.
    pub fn create_process_local_variable(&mut self, spec: VarSpec) -> VarId {
        self.push_var(spec, VarPool::ProcessLocal)
    }

    /// Creates a process-local variable for a member of a non-zero modular
    /// interface array element.
    ///
    /// The name is used as given: element zero already allocated it. The
    /// variable is not declared on its own.
    pub fn create_process_local_variable_mif_non_zero(&mut self, spec: VarSpec) -> VarId {
        let name = spec.suggested_name().to_string();
        self.vars.alloc(spec.into_variable(name, VarPool::ProcessLocal))
    }

    /// Creates a channel variable with no object behind it and declares it
    /// as a signal.
    pub fn create_auxiliary_signal(&mut self, spec: VarSpec) -> VarId {
        let var = self.push_var(spec, VarPool::Channel);
        self.signals.push(var);
        var
    }

    /// Creates a channel variable with no object behind it and declares it
    /// as a port.
    pub fn create_auxiliary_port(&mut self, direction: PortDirection, spec: VarSpec) -> VarId {
        let var = self.push_var(spec, VarPool::Channel);
        self.ports.push(Port { direction, var });
        var
    }

    fn expect_channel(&self, var: VarId, op: &str) -> SvgenResult<()> {
        match self.vars.get(var) {
            Some(v) if v.pool == VarPool::Channel => Ok(()),
            Some(v) => Err(InternalError::new(format!(
                "{op}: `{}` is not a channel variable of `{}`",
                v.name, self.name
            ))),
            None => Err(InternalError::new(format!(
                "{op}: variable #{} does not belong to `{}`",
                var.as_raw(),
                self.name
            ))),
        }
    }

    /// Declares an existing channel variable as a port.
    pub fn convert_to_port(&mut self, var: VarId, direction: PortDirection) -> SvgenResult<()> {
        self.expect_channel(var, "convert_to_port")?;
        if self.ports.iter().any(|p| p.var == var) {
            return Err(InternalError::new(format!(
                "convert_to_port: `{}` is already a port",
                self.var_name(var)?
            )));
        }
        self.ports.push(Port { direction, var });
        Ok(())
    }

    /// Declares an existing channel variable as a signal.
    pub fn convert_to_signal(&mut self, var: VarId) -> SvgenResult<()> {
        self.expect_channel(var, "convert_to_signal")?;
        self.signals.push(var);
        Ok(())
    }

    /// Adds an instance of `child` for the elaborated child object.
    pub fn add_module_instance(&mut self, child: ModuleId, obj: ObjectId, name: &str) -> InstanceId {
        let name = self.names.allocate(name);
        let id = self.instances.alloc(Instance {
            name,
            child,
            object: obj,
            bindings: Vec::new(),
        });
        self.instance_map.insert(obj, id);
        id
    }

    /// The instance created for a child object.
    pub fn instance_for(&self, obj: ObjectId) -> SvgenResult<InstanceId> {
        self.instance_map.get(&obj).copied().ok_or_else(|| {
            InternalError::new(format!(
                "{}: no instance for object #{}",
                self.name,
                obj.as_raw()
            ))
        })
    }

    /// Binds `child_port` of an instance to a host variable reference,
    /// rendered as `name[i]...`.
    pub fn add_binding(&mut self, instance: InstanceId, child_port: &str, host: &VarRef) -> SvgenResult<()> {
        let mut expr = self.var_name(host.var)?.to_string();
        for idx in &host.indices {
            write!(expr, "[{idx}]")?;
        }
        let module = self.name.clone();
        let inst = self.instances.get_mut(instance).ok_or_else(|| {
            InternalError::new(format!("{module}: unknown instance #{}", instance.as_raw()))
        })?;
        inst.bindings.push(Binding {
            port: child_port.to_string(),
            expr,
        });
        Ok(())
    }

    /// The variables generated for an object: channel variables for signals
    /// and signal ports, the data variable otherwise.
    pub fn variables_for(&self, objects: &ObjectTree, obj: ObjectId) -> Vec<VarId> {
        if objects.is_signal(obj) || objects.is_signal_port(obj) {
            return self.channel_map.get(&obj).cloned().unwrap_or_default();
        }
        self.data_map.get(&obj).copied().into_iter().collect()
    }

    /// Creates a constant data variable from a primitive value or a
    /// constant primitive array.
    ///
    /// Array dimensions come from element zero at every level; values are
    /// flattened row-major.
    pub fn add_const_data_variable(&mut self, objects: &ObjectTree, obj: ObjectId, name: &str) -> SvgenResult<VarId> {
        if let Some(value) = objects.value(obj) {
            let spec = VarSpec::new(name, value.bitwidth)
                .with_signed(value.value.is_signed())
                .init([value.value.to_i128()]);
            return Ok(self.create_data_variable(obj, spec));
        }

        let not_const = || InternalError::new(format!("object #{} is not a constant primitive array", obj.as_raw()));
        let mut dims = Vec::new();
        let mut cur = obj;
        while objects.object(cur)?.kind == ObjectKind::Array {
            let elements = &objects.object(cur)?.elements;
            dims.push(elements.len());
            cur = *elements.first().ok_or_else(not_const)?;
        }
        if dims.is_empty() {
            return Err(not_const());
        }
        let leaf = objects.value(cur).ok_or_else(not_const)?;

        let mut values = Vec::new();
        let mut stack = vec![obj];
        while let Some(next) = stack.pop() {
            let o = objects.object(next)?;
            if o.kind == ObjectKind::Array {
                stack.extend(o.elements.iter().rev());
            } else {
                values.push(objects.value(next).ok_or_else(not_const)?.value.to_i128());
            }
        }

        let spec = VarSpec::new(name, leaf.bitwidth)
            .with_signed(leaf.value.is_signed())
            .dims(dims)
            .init(values);
        Ok(self.create_data_variable(obj, spec))
    }

    /// Places a process in the module under a module-unique name.
    ///
    /// The name comes from the process declaration, prefixed by the
    /// declaration of its modular interface (or of the array or pointer
    /// holding that interface).
    pub fn add_process(&mut self, objects: &ObjectTree, proc: ProcessId) -> SvgenResult<String> {
        let parent = objects.process(proc)?.parent;
        let mut name = objects.process_decl(proc)?.name.clone();
        if objects.is_modular_interface(parent) {
            let holder = if objects.is_element_or_pointee(parent) {
                objects.topmost_parent_array_or_pointer(parent).ok_or_else(|| {
                    InternalError::new(format!("modular interface #{} has no holder", parent.as_raw()))
                })?
            } else {
                parent
            };
            let decl = objects.object(holder)?.decl.ok_or_else(|| {
                InternalError::new(format!("modular interface holder #{} has no declaration", holder.as_raw()))
            })?;
            name = format!("{}_{name}", objects.decl(decl)?.name);
        }
        let name = self.names.allocate(&name);
        self.processes.push(ModuleProcess {
            id: proc,
            name: name.clone(),
        });
        Ok(name)
    }

    /// Sets the pre-rendered code of a process.
    pub fn add_process_body(&mut self, proc: ProcessId, code: ProcessCode) {
        self.bodies.insert(proc, code);
    }

    /// Registers a `register <= next` copy for a split thread.
    pub fn add_proc_register_next_pair(&mut self, proc: ProcessId, register: VarId, next: VarId, suffix: impl Into<String>) {
        self.reg_next_pairs.entry(proc).or_default().push(RegisterNextPair {
            register,
            next,
            suffix: suffix.into(),
        });
    }

    /// Records `register` for `proc`; returns `false` if it was already
    /// recorded, so the copy for a shared member is emitted only once.
    pub fn check_proc_unique_var(&mut self, proc: ProcessId, register: VarId) -> bool {
        self.proc_reg_vars.entry(proc).or_default().insert(register)
    }

    /// Declares `var` inside `proc`.
    pub fn convert_to_process_local_var(&mut self, var: VarId, proc: ProcessId) {
        push_unique(self.proc_locals.entry(proc).or_default(), var);
    }

    /// Declares constant `var` inside `proc`.
    pub fn add_proc_const(&mut self, var: VarId, proc: ProcessId) {
        push_unique(self.proc_consts.entry(proc).or_default(), var);
    }

    /// Records whether every use of constant `var` was replaced by its
    /// literal value.
    pub fn mark_const_value(&mut self, var: VarId, replaced: bool) {
        self.const_values.insert(var, replaced);
    }

    /// Records that `proc` reads `var`.
    pub fn add_proc_use_var(&mut self, proc: ProcessId, var: VarId, kind: VarKind) {
        self.proc_use.entry(proc).or_default().insert(var, kind);
    }

    /// Records that `proc` writes `var`.
    pub fn add_proc_def_var(&mut self, proc: ProcessId, var: VarId, kind: VarKind) {
        self.proc_def.entry(proc).or_default().insert(var, kind);
    }

    /// Records that assertion text refers to `var`.
    pub fn add_sva_use_var(&mut self, var: VarId, kind: VarKind) {
        self.sva_use.insert(var, kind);
    }

    /// Records that `var` is bound to a port of a sub-instance.
    pub fn add_bind_var(&mut self, var: VarId) {
        push_unique(&mut self.bind_vars, var);
    }

    /// Adds a continuous assignment. Both sides must be variables of this
    /// module.
    pub fn add_assignment(&mut self, left: VarRef, right: VarRef) -> SvgenResult<()> {
        self.var(left.var)?;
        self.var(right.var)?;
        self.assignments.push(Assignment::new(left, right));
        Ok(())
    }

    /// Appends assertion property code.
    pub fn add_sva_property_code(&mut self, code: &str) {
        self.sva_code.push_str(code);
    }
}

fn push_unique(list: &mut Vec<VarId>, var: VarId) {
    if !list.contains(&var) {
        list.push(var);
    }
}
