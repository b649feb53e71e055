//! Design-level driver: owns every generated module, finalizes them,
//! merges equivalent ones, and renders the result.

use crate::arena::Arena;
use crate::ids::{ModuleId, ObjectId};
use crate::module::SvModule;
use crate::names::NameAllocator;
use crate::object::ObjectTree;
use crate::serialize::{EmitContext, ModuleNames};
use std::collections::HashMap;
use svgen_common::{ContentHash, InternalError, SourceDb, SvgenResult};
use svgen_config::EmitConfig;
use svgen_diagnostics::DiagnosticSink;
use tracing::debug;

/// All generated modules of one elaborated design.
pub struct Design {
    objects: ObjectTree,
    sources: SourceDb,
    config: EmitConfig,
    modules: Arena<ModuleId, SvModule>,
    module_names: NameAllocator,
    duplicates: HashMap<ModuleId, ModuleId>,
}

impl Design {
    /// Creates a design over an elaborated object model.
    pub fn new(objects: ObjectTree, sources: SourceDb, config: EmitConfig) -> Self {
        Self {
            objects,
            sources,
            config,
            modules: Arena::new(),
            module_names: NameAllocator::new(),
            duplicates: HashMap::new(),
        }
    }

    /// The elaborated object model.
    pub fn objects(&self) -> &ObjectTree {
        &self.objects
    }

    /// Registered source files.
    pub fn sources(&self) -> &SourceDb {
        &self.sources
    }

    /// Output switches.
    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    /// Creates a module for an elaborated module object under a
    /// design-unique name.
    pub fn create_module(&mut self, object: ObjectId, suggested: &str, comment: &str) -> ModuleId {
        let name = self.module_names.allocate(suggested);
        self.modules.alloc(SvModule::new(object, name, comment))
    }

    /// Every module, in creation order.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.ids()
    }

    /// Looks up a module.
    pub fn module(&self, id: ModuleId) -> SvgenResult<&SvModule> {
        self.modules
            .get(id)
            .ok_or_else(|| InternalError::new(format!("unknown module #{}", id.as_raw())))
    }

    /// The object model and a module under construction, for registry
    /// operations. Finalized modules are frozen.
    pub fn parts_mut(&mut self, id: ModuleId) -> SvgenResult<(&ObjectTree, &mut SvModule)> {
        let module = self
            .modules
            .get_mut(id)
            .ok_or_else(|| InternalError::new(format!("unknown module #{}", id.as_raw())))?;
        if module.is_finalized() {
            return Err(InternalError::new(format!(
                "module `{}` is finalized",
                module.name()
            )));
        }
        Ok((&self.objects, module))
    }

    /// Runs liveness, then the use/def check, on a fully registered
    /// module. Returns the number of use/def conflicts reported to `sink`.
    pub fn finalize(&mut self, id: ModuleId, sink: &DiagnosticSink) -> SvgenResult<usize> {
        let module = self
            .modules
            .get_mut(id)
            .ok_or_else(|| InternalError::new(format!("unknown module #{}", id.as_raw())))?;
        if module.is_intrinsic() {
            return Ok(0);
        }
        module.remove_unused_variables(&self.config)?;
        module.detect_use_def_errors(&self.objects, sink)
    }

    /// The module that `id` was merged into, or `id` itself.
    pub fn canonical(&self, id: ModuleId) -> ModuleId {
        self.duplicates.get(&id).copied().unwrap_or(id)
    }

    /// Returns `true` if `id` was merged into another module.
    pub fn is_duplicate(&self, id: ModuleId) -> bool {
        self.duplicates.contains_key(&id)
    }

    /// Merges equivalent modules, keeping the first created of each group.
    ///
    /// Passes repeat until nothing changes, since merging children can make
    /// their parents equivalent. Returns the number of modules merged.
    pub fn deduplicate(&mut self) -> SvgenResult<usize> {
        if let Some((_, m)) = self
            .modules
            .iter()
            .find(|(_, m)| !m.is_intrinsic() && !m.is_finalized())
        {
            return Err(InternalError::new(format!(
                "module `{}` deduplicated before finalize",
                m.name()
            )));
        }

        let mut total = 0;
        loop {
            let snapshot = self.duplicates.clone();
            let canonical = |id: ModuleId| snapshot.get(&id).copied().unwrap_or(id);
            let mut buckets: HashMap<ContentHash, Vec<ModuleId>> = HashMap::new();
            let mut merged = Vec::new();

            for (id, module) in self.modules.iter() {
                if snapshot.contains_key(&id) {
                    continue;
                }
                let bucket = buckets.entry(module.fingerprint(&self.objects, canonical)?).or_default();
                let mut found = None;
                for &rep in bucket.iter() {
                    if module.is_equivalent_to(&self.modules[rep], &self.objects, canonical)? {
                        found = Some(rep);
                        break;
                    }
                }
                match found {
                    Some(rep) => merged.push((id, rep)),
                    None => bucket.push(id),
                }
            }

            if merged.is_empty() {
                break;
            }
            total += merged.len();
            for (dup, rep) in merged {
                debug!(
                    duplicate = %self.modules[dup].name(),
                    canonical = %self.modules[rep].name(),
                    "merged equivalent module"
                );
                self.duplicates.insert(dup, rep);
            }
        }
        debug!(merged = total, modules = self.modules.len(), "deduplication done");
        Ok(total)
    }

    /// Renders one module.
    pub fn emit_module(&self, id: ModuleId) -> SvgenResult<String> {
        self.module(id)?.to_text(&self.emit_context())
    }

    /// Renders every module that was not merged away, in creation order.
    pub fn emit(&self) -> SvgenResult<String> {
        let ctx = self.emit_context();
        let mut out = String::new();
        for (id, module) in self.modules.iter() {
            if !self.is_duplicate(id) {
                module.serialize(&ctx, &mut out)?;
            }
        }
        Ok(out)
    }

    fn emit_context(&self) -> EmitContext<'_> {
        EmitContext {
            objects: &self.objects,
            sources: &self.sources,
            config: &self.config,
            module_names: self,
        }
    }
}

impl ModuleNames for Design {
    fn module_name(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(self.canonical(id)).map(SvModule::name)
    }
}
