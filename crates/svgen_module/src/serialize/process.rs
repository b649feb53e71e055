//! Process framing: single always-block and split comb/ff forms.

use super::decl::write_decl;
use super::{EmitContext, SECTION_RULE};
use crate::ids::{ObjectId, VarId};
use crate::module::{ModuleProcess, SvModule};
use crate::object::{Edge, ObjectTree, ProcessInfo};
use std::fmt::Write;
use svgen_common::SvgenResult;

const SVA_GUARD_OPEN: &str = "`ifndef SVA_OFF\n";
const SVA_GUARD_CLOSE: &str = "`endif // SVA_OFF\n";

impl SvModule {
    /// Writes one process, choosing the split form for threads when
    /// `split_threads` is set.
    pub(crate) fn write_process(&self, ctx: &EmitContext<'_>, proc: &ModuleProcess, out: &mut String) -> SvgenResult<()> {
        let info = ctx.objects.process(proc.id)?;
        if ctx.config.split_threads && info.is_thread() {
            self.write_process_split(ctx, proc, info, out)
        } else {
            self.write_process_single(ctx, proc, info, out)
        }
    }

    fn write_process_single(
        &self,
        ctx: &EmitContext<'_>,
        proc: &ModuleProcess,
        info: &ProcessInfo,
        out: &mut String,
    ) -> SvgenResult<()> {
        let code = self.process_code(proc.id)?;
        let loc = ctx.process_location(proc.id)?;
        let name = &proc.name;
        let framed = !info.sensitivity.is_empty();

        out.push_str(SECTION_RULE);
        let title = if info.is_method() { "Method process" } else { "Thread process" };
        write!(out, "// {title}: {name} ({loc})\n\n")?;

        self.write_decl_section(out, "// Process-local variables\n", self.process_locals(proc.id))?;

        if framed {
            if info.is_method() {
                out.push_str(if info.has_latch { "always_latch \n" } else { "always_comb \n" });
            } else {
                writeln!(out, "always @({}) ", self.sensitivity_list(ctx.objects, info)?)?;
            }
            writeln!(out, "begin : {name}     // {loc}")?;
        }

        if info.is_thread() {
            out.push_str(&code.local_vars);
            out.push_str("    ");
            if !info.resets.is_empty() {
                write!(out, "if {} ", self.reset_condition(ctx.objects, info)?)?;
                out.push_str(&code.reset_section);
                out.push_str("    else ");
            }
        }

        out.push_str(&code.body);
        if framed {
            out.push_str("end\n");
        }
        out.push('\n');
        Ok(())
    }

    fn write_process_split(
        &self,
        ctx: &EmitContext<'_>,
        proc: &ModuleProcess,
        info: &ProcessInfo,
        out: &mut String,
    ) -> SvgenResult<()> {
        let code = self.process_code(proc.id)?;
        let loc = ctx.process_location(proc.id)?;
        let name = &proc.name;

        out.push_str(SECTION_RULE);
        write!(out, "// Clocked THREAD: {name} ({loc})\n\n")?;

        self.write_decl_section(out, "// Thread-local variables\n", self.process_locals(proc.id))?;

        let consts: Vec<VarId> = self
            .process_consts(proc.id)
            .iter()
            .copied()
            .filter(|&var| !self.strips_local_const(ctx, var))
            .collect();
        self.write_decl_section(out, "// Thread-local constants\n", &consts)?;

        out.push_str("// Next-state combinational logic\n");
        writeln!(out, "always_comb begin : {name}_comb     // {loc}")?;
        writeln!(out, "    {name}_func;")?;
        out.push_str("end\n");
        writeln!(out, "function void {name}_func;")?;
        out.push_str(&code.local_vars);
        out.push_str(&code.body);
        out.push_str("endfunction\n\n");

        out.push_str("// Synchronous register update\n");
        writeln!(out, "always_ff @({}) ", self.sensitivity_list(ctx.objects, info)?)?;
        writeln!(out, "begin : {name}_ff")?;
        out.push_str("    ");
        if !info.resets.is_empty() {
            write!(out, "if {} ", self.reset_condition(ctx.objects, info)?)?;
            out.push_str(&code.reset_section);
            out.push_str("    else ");
        }
        out.push_str("begin\n");
        for pair in self.register_next_pairs(proc.id) {
            let sfx = &pair.suffix;
            writeln!(
                out,
                "        {}{sfx} <= {}{sfx};",
                self.var_name(pair.register)?,
                self.var_name(pair.next)?
            )?;
        }
        if !code.temp_asserts.is_empty() {
            write!(out, "\n    {SVA_GUARD_OPEN}")?;
            out.push_str(&code.temp_asserts);
            write!(out, "    {SVA_GUARD_CLOSE}")?;
        }
        out.push_str("    end\n");
        if !code.temp_rst_asserts.is_empty() {
            write!(out, "\n{SVA_GUARD_OPEN}")?;
            out.push_str(&code.temp_rst_asserts);
            out.push_str(SVA_GUARD_CLOSE);
        }
        out.push_str("end\n\n");
        Ok(())
    }

    /// A process-local constant is left undeclared when stripping is on and
    /// it is a scalar whose uses were all replaced by its value.
    fn strips_local_const(&self, ctx: &EmitContext<'_>, var: VarId) -> bool {
        ctx.config.remove_const_decl
            && self.is_replaced_const(var)
            && self.vars.get(var).is_some_and(|v| !v.is_array())
    }

    fn write_decl_section(&self, out: &mut String, header: &str, vars: &[VarId]) -> SvgenResult<()> {
        if vars.is_empty() {
            return Ok(());
        }
        out.push_str(header);
        for &var in vars {
            write_decl(out, self.var(var)?)?;
            out.push_str(";\n");
        }
        out.push('\n');
        Ok(())
    }

    /// `name[i]..` for every channel variable behind a (possibly array
    /// element) source object.
    fn source_terms(&self, objects: &ObjectTree, source: ObjectId) -> SvgenResult<Vec<String>> {
        let (base, indices) = objects.array_element_with_indices(source);
        let mut suffix = String::new();
        for idx in &indices {
            write!(suffix, "[{idx}]")?;
        }
        self.channel_vars_or_err(base)?
            .iter()
            .map(|&var| -> SvgenResult<String> { Ok(format!("{}{suffix}", self.var_name(var)?)) })
            .collect()
    }

    /// Renders the event list of an edge-sensitive block: one term per
    /// distinct edge and channel, asynchronous resets as edges, and
    /// synchronous resets as trailing comments.
    pub(crate) fn sensitivity_list(&self, objects: &ObjectTree, info: &ProcessInfo) -> SvgenResult<String> {
        let mut terms: Vec<String> = Vec::new();
        let mut push = |term: String| {
            if !terms.contains(&term) {
                terms.push(term);
            }
        };
        for event in &info.sensitivity {
            let edge = match event.edge {
                Edge::Pos => "posedge ",
                Edge::Neg => "negedge ",
                Edge::Any => "",
            };
            for term in self.source_terms(objects, event.source)? {
                push(format!("{edge}{term}"));
            }
        }
        let mut sync = String::new();
        for reset in &info.resets {
            for term in self.source_terms(objects, reset.source)? {
                if reset.is_async {
                    let edge = if reset.level { "posedge" } else { "negedge" };
                    push(format!("{edge} {term}"));
                } else {
                    write!(sync, " /*sync {term}*/")?;
                }
            }
        }
        Ok(terms.join(" or ") + &sync)
    }

    /// Renders `(rst || ~rst_n ..)` over every reset source.
    pub(crate) fn reset_condition(&self, objects: &ObjectTree, info: &ProcessInfo) -> SvgenResult<String> {
        let mut terms = Vec::new();
        for reset in &info.resets {
            let negate = if reset.level { "" } else { "~" };
            for term in self.source_terms(objects, reset.source)? {
                terms.push(format!("{negate}{term}"));
            }
        }
        Ok(format!("({})", terms.join(" || ")))
    }
}
