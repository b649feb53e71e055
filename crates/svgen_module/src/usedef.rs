//! Cross-process use/def conflict detection.

use crate::errors::{error_multiple_access, error_multiple_drivers, error_use_def_same_process};
use crate::module::SvModule;
use crate::object::ObjectTree;
use crate::var::VarKind;
use std::collections::HashSet;
use svgen_common::SvgenResult;
use svgen_diagnostics::DiagnosticSink;
use tracing::debug;

impl SvModule {
    /// Reports variables shared between processes against the rules:
    ///
    /// - a variable or channel written by more than one process;
    /// - a plain variable read by more than one process;
    /// - a channel both written and read by the same method process.
    ///
    /// Members of modular interface array elements are exempt. Every
    /// conflict is reported before returning the number found. A process
    /// without a declaration is a contract failure.
    pub fn detect_use_def_errors(&self, objects: &ObjectTree, sink: &DiagnosticSink) -> SvgenResult<usize> {
        let mut conflicts = 0;

        let mut defined = HashSet::new();
        for (&proc, vars) in &self.proc_def {
            for (&var, &kind) in vars {
                if self.is_mif_array_var(var) || defined.insert(var) {
                    continue;
                }
                let span = objects.process_decl(proc)?.span;
                let name = self.var_name(var)?;
                sink.emit(if kind == VarKind::Channel {
                    error_multiple_drivers(name, span)
                } else {
                    error_multiple_access(name, span)
                });
                conflicts += 1;
            }
        }

        let mut used = HashSet::new();
        for (&proc, vars) in &self.proc_use {
            for (&var, &kind) in vars {
                if self.is_mif_array_var(var) || used.insert(var) || kind != VarKind::Variable {
                    continue;
                }
                let span = objects.process_decl(proc)?.span;
                sink.emit(error_multiple_access(self.var_name(var)?, span));
                conflicts += 1;
            }
        }

        for (&proc, vars) in &self.proc_def {
            if !objects.process(proc)?.is_method() {
                continue;
            }
            let Some(uses) = self.proc_use.get(&proc) else { continue };
            for (&var, &kind) in vars {
                if kind != VarKind::Channel || self.is_mif_array_var(var) || !uses.contains_key(&var) {
                    continue;
                }
                let span = objects.process_decl(proc)?.span;
                sink.emit(error_use_def_same_process(self.var_name(var)?, span));
                conflicts += 1;
            }
        }

        debug!(module = %self.name, conflicts, "use/def check done");
        Ok(conflicts)
    }
}
