//! Liveness and copy folding over the continuous assignments of a module.
//!
//! The pass first collapses pure copy chains through unrequired
//! intermediates, then keeps exactly the assignments that drive a required
//! variable, transitively.

use crate::ids::VarId;
use crate::module::SvModule;
use crate::var::{Assignment, VarKind, VarPool};
use std::collections::{HashMap, HashSet};
use svgen_common::{InternalError, SvgenResult};
use svgen_config::EmitConfig;
use tracing::{debug, trace};

#[derive(Default)]
struct Occurrences {
    def: Option<usize>,
    uses: Option<usize>,
    ambiguous: bool,
}

impl Occurrences {
    fn record(slot: &mut Option<usize>, ambiguous: &mut bool, index: usize) {
        if slot.replace(index).is_some() {
            *ambiguous = true;
        }
    }
}

/// Folds copy chains and drops assignments that cannot reach `required`.
///
/// A variable is folded away when it is not required, never indexed, and
/// appears unindexed on exactly one left side and exactly one other right
/// side: `a := b; b := c` becomes `a := c`. Only assignments reachable from
/// `required` are counted, and folding repeats until nothing changes, so a
/// second run from the same seeds is a no-op. A chain that would collapse
/// into `b := b` is left as written. Afterwards `required` is grown to its
/// fan-in closure and only assignments with a required left side survive,
/// in their original order.
pub fn filter_assignments(assignments: &mut Vec<Assignment>, required: &mut HashSet<VarId>) {
    loop {
        retain_reachable(assignments, &mut required.clone());
        if !fold_copies(assignments, required) {
            break;
        }
    }
    retain_reachable(assignments, required);
}

/// Applies one round of copy folding; returns `false` if nothing folded.
fn fold_copies(assignments: &mut Vec<Assignment>, required: &HashSet<VarId>) -> bool {
    let mut blocked: HashSet<VarId> = HashSet::new();
    loop {
        let foldable = foldable_copies(assignments, required, &blocked);
        if foldable.is_empty() {
            return false;
        }
        let (folded, self_loops) = resolve_folds(assignments, &foldable);
        if self_loops.is_empty() {
            *assignments = folded;
            return true;
        }
        blocked.extend(self_loops);
    }
}

/// Variable -> index of its single defining assignment.
fn foldable_copies(
    assignments: &[Assignment],
    required: &HashSet<VarId>,
    blocked: &HashSet<VarId>,
) -> HashMap<VarId, usize> {
    let mut occurrences: HashMap<VarId, Occurrences> = HashMap::new();
    let mut indexed: HashSet<VarId> = HashSet::new();
    for (i, asn) in assignments.iter().enumerate() {
        for (side, is_left) in [(&asn.left, true), (&asn.right, false)] {
            if !side.is_scalar() {
                indexed.insert(side.var);
                continue;
            }
            if required.contains(&side.var) || blocked.contains(&side.var) {
                continue;
            }
            let occ = occurrences.entry(side.var).or_default();
            let slot = if is_left { &mut occ.def } else { &mut occ.uses };
            Occurrences::record(slot, &mut occ.ambiguous, i);
        }
    }

    occurrences
        .into_iter()
        .filter(|(var, _)| !indexed.contains(var))
        .filter_map(|(var, occ)| match (occ.def, occ.uses, occ.ambiguous) {
            (Some(def), Some(uses), false) if def != uses => Some((var, def)),
            _ => None,
        })
        .collect()
}

/// Rewrites every surviving assignment through the foldable chains.
///
/// Also returns the chain variables of any assignment that would end up
/// driving itself.
fn resolve_folds(assignments: &[Assignment], foldable: &HashMap<VarId, usize>) -> (Vec<Assignment>, Vec<VarId>) {
    let removed: HashSet<usize> = foldable.values().copied().collect();
    let mut folded = Vec::with_capacity(assignments.len() - removed.len());
    let mut self_loops = Vec::new();
    for (i, asn) in assignments.iter().enumerate() {
        if removed.contains(&i) {
            continue;
        }
        let mut right = &asn.right;
        let mut chain = Vec::new();
        while right.is_scalar() && chain.len() < assignments.len() {
            let Some(&def) = foldable.get(&right.var) else { break };
            chain.push(right.var);
            right = &assignments[def].right;
        }
        if !chain.is_empty() && right.var == asn.left.var {
            self_loops.extend(chain);
            continue;
        }
        for var in &chain {
            trace!(var = var.as_raw(), "folded copy");
        }
        folded.push(Assignment::new(asn.left.clone(), right.clone()));
    }
    (folded, self_loops)
}

/// Keeps the assignments whose left side is in `required`, transitively,
/// growing `required` to the fan-in closure.
fn retain_reachable(assignments: &mut Vec<Assignment>, required: &mut HashSet<VarId>) {
    let mut by_left: HashMap<VarId, Vec<usize>> = HashMap::new();
    for (i, asn) in assignments.iter().enumerate() {
        by_left.entry(asn.left.var).or_default().push(i);
    }
    let mut kept = vec![false; assignments.len()];
    let mut worklist: Vec<VarId> = required.iter().copied().collect();
    while let Some(var) = worklist.pop() {
        for &i in by_left.get(&var).map_or(&[][..], Vec::as_slice) {
            if kept[i] {
                continue;
            }
            kept[i] = true;
            let right = assignments[i].right.var;
            if required.insert(right) {
                worklist.push(right);
            }
        }
    }

    let mut keep = kept.into_iter();
    assignments.retain(|_| keep.next().unwrap_or(false));
}

impl SvModule {
    /// Seeds the required set and runs [`filter_assignments`].
    ///
    /// Seeds are the variables used or defined by processes and assertions,
    /// variables bound to instance ports, and ports. With
    /// `remove_const_decl`, initialized scalar constants are not seeded.
    /// With `keep_all`, every channel and data variable is seeded. Runs
    /// once per module; a second run is a contract failure.
    pub fn remove_unused_variables(&mut self, config: &EmitConfig) -> SvgenResult<()> {
        if self.liveness_done {
            return Err(InternalError::new(format!(
                "liveness already ran for `{}`",
                self.name
            )));
        }

        let mut required = HashSet::new();
        let seeds = self
            .sva_use
            .iter()
            .chain(self.proc_use.values().flatten())
            .chain(self.proc_def.values().flatten());
        for (&var, &kind) in seeds {
            if config.remove_const_decl && kind == VarKind::Const && self.is_initialized(var) && !self.var(var)?.is_array() {
                continue;
            }
            required.insert(var);
        }
        required.extend(self.bind_vars.iter().copied());
        required.extend(self.ports.iter().map(|p| p.var));
        if config.keep_all {
            required.extend(
                self.vars
                    .iter()
                    .filter(|(_, v)| v.pool != VarPool::ProcessLocal)
                    .map(|(id, _)| id),
            );
        }

        let before = self.assignments.len();
        filter_assignments(&mut self.assignments, &mut required);
        debug!(
            module = %self.name,
            assignments_before = before,
            assignments_after = self.assignments.len(),
            required = required.len(),
            "liveness done"
        );
        self.required = required;
        self.liveness_done = true;
        Ok(())
    }
}
