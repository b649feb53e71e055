//! Structural equivalence of finalized modules.
//!
//! Two modules are equivalent when they would emit the same text modulo
//! their own names: the same elaborated type, the same variables and
//! assignments by value, the same instances, and processes that pair up
//! position by position. Deduplication uses [`SvModule::fingerprint`] to
//! bucket candidates and [`SvModule::is_equivalent_to`] to confirm them.

use crate::ids::{ModuleId, ObjectId};
use crate::module::SvModule;
use crate::object::ObjectTree;
use crate::var::{VarPool, VarRef, Variable};
use svgen_common::{ContentHash, ContentHasher, SvgenResult};

impl SvModule {
    /// Returns `true` if `self` and `other` are structurally equivalent.
    ///
    /// Instances compare their children through `canonical`, so children
    /// already merged by deduplication count as the same module. A
    /// sensitivity or reset source without a channel variable is a contract
    /// failure.
    pub fn is_equivalent_to(
        &self,
        other: &SvModule,
        objects: &ObjectTree,
        canonical: impl Fn(ModuleId) -> ModuleId,
    ) -> SvgenResult<bool> {
        if objects.module_type_name(self.object)? != objects.module_type_name(other.object)? {
            return Ok(false);
        }
        match (&self.intrinsic, &other.intrinsic) {
            (Some(a), Some(b)) => return Ok(self.name == other.name && a == b),
            (None, None) => {}
            _ => return Ok(false),
        }

        for pool in [VarPool::Data, VarPool::Channel] {
            if !self.pool(pool).map(|(_, v)| v).eq(other.pool(pool).map(|(_, v)| v)) {
                return Ok(false);
            }
        }

        if self.instances.len() != other.instances.len() {
            return Ok(false);
        }
        for (a, b) in self.instances().zip(other.instances()) {
            if a.name != b.name || a.bindings != b.bindings || canonical(a.child) != canonical(b.child) {
                return Ok(false);
            }
        }

        if self.assignments.len() != other.assignments.len() {
            return Ok(false);
        }
        for (a, b) in self.assignments.iter().zip(&other.assignments) {
            if !self.same_ref(&a.left, other, &b.left)? || !self.same_ref(&a.right, other, &b.right)? {
                return Ok(false);
            }
        }

        if self.processes.len() != other.processes.len() {
            return Ok(false);
        }
        for (pa, pb) in self.processes.iter().zip(&other.processes) {
            let a = objects.process(pa.id)?;
            let b = objects.process(pb.id)?;
            if a.decl != b.decl || a.sensitivity.len() != b.sensitivity.len() || a.resets.len() != b.resets.len() {
                return Ok(false);
            }
            for (ea, eb) in a.sensitivity.iter().zip(&b.sensitivity) {
                if ea.edge != eb.edge || !self.same_source(objects, ea.source, other, eb.source)? {
                    return Ok(false);
                }
            }
            for (ra, rb) in a.resets.iter().zip(&b.resets) {
                if ra.level != rb.level
                    || ra.is_async != rb.is_async
                    || !self.same_source(objects, ra.source, other, rb.source)?
                {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn same_ref(&self, a: &VarRef, other: &SvModule, b: &VarRef) -> SvgenResult<bool> {
        Ok(a.indices == b.indices && self.var(a.var)? == other.var(b.var)?)
    }

    fn same_source(&self, objects: &ObjectTree, a: ObjectId, other: &SvModule, b: ObjectId) -> SvgenResult<bool> {
        let (base_a, idx_a) = objects.array_element_with_indices(a);
        let (base_b, idx_b) = objects.array_element_with_indices(b);
        if idx_a != idx_b {
            return Ok(false);
        }
        let vars_a = self.channel_vars_or_err(base_a)?;
        let vars_b = other.channel_vars_or_err(base_b)?;
        if vars_a.len() != vars_b.len() {
            return Ok(false);
        }
        for (&va, &vb) in vars_a.iter().zip(vars_b) {
            if self.var(va)? != other.var(vb)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Hash over the parts of the module that equivalence compares by
    /// value. Equivalent modules always share a fingerprint.
    pub fn fingerprint(&self, objects: &ObjectTree, canonical: impl Fn(ModuleId) -> ModuleId) -> SvgenResult<ContentHash> {
        let mut h = ContentHasher::new();
        h.str(objects.module_type_name(self.object)?);
        if let Some(intrinsic) = &self.intrinsic {
            h.bool(true).str(&self.name).str(&intrinsic.text);
            return Ok(h.finish());
        }
        h.bool(false);

        for pool in [VarPool::Data, VarPool::Channel] {
            h.u64(self.pool(pool).count() as u64);
            for (_, var) in self.pool(pool) {
                hash_var(&mut h, var);
            }
        }

        h.u64(self.instances.len() as u64);
        for inst in self.instances() {
            h.str(&inst.name).u64(u64::from(canonical(inst.child).as_raw()));
            for b in &inst.bindings {
                h.str(&b.port).str(&b.expr);
            }
        }

        h.u64(self.assignments.len() as u64);
        for asn in &self.assignments {
            for side in [&asn.left, &asn.right] {
                h.str(self.var_name(side.var)?);
                for &idx in &side.indices {
                    h.u64(idx as u64);
                }
            }
        }

        h.u64(self.processes.len() as u64);
        for proc in &self.processes {
            let info = objects.process(proc.id)?;
            h.u64(info.decl.map_or(u64::MAX, |d| u64::from(d.as_raw())));
            h.u64(info.sensitivity.len() as u64).u64(info.resets.len() as u64);
        }
        Ok(h.finish())
    }
}

fn hash_var(h: &mut ContentHasher, var: &Variable) {
    h.str(&var.name)
        .u64(u64::from(var.bitwidth))
        .bool(var.signed)
        .str(&var.comment);
    h.u64(var.array_dims.len() as u64);
    for &dim in &var.array_dims {
        h.u64(dim as u64);
    }
    h.u64(var.init_vals.len() as u64);
    for &val in &var.init_vals {
        h.i128(val);
    }
}
