//! Rendering finalized modules to SystemVerilog text.
//!
//! Output layout, in order: a header comment, the `module` line with its
//! port list, signal and constant declarations, continuous assignments,
//! one block per process, sub-module instances, the guarded assertion
//! block, and `endmodule`.

mod decl;
mod process;

pub use decl::write_decl;

use crate::ids::{ModuleId, ProcessId};
use crate::module::SvModule;
use crate::object::ObjectTree;
use crate::var::VarPool;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use svgen_common::{InternalError, SourceDb, SvgenResult};
use svgen_config::EmitConfig;

pub(crate) const SECTION_RULE: &str =
    "//------------------------------------------------------------------------------\n";
const MODULE_RULE: &str =
    "//==============================================================================\n";

/// Resolves the emitted name of an instantiated module.
pub trait ModuleNames {
    /// The name under which module `id` is emitted, if it exists.
    fn module_name(&self, id: ModuleId) -> Option<&str>;
}

impl ModuleNames for HashMap<ModuleId, String> {
    fn module_name(&self, id: ModuleId) -> Option<&str> {
        self.get(&id).map(String::as_str)
    }
}

/// Everything a module needs from its surroundings to render itself.
#[derive(Clone, Copy)]
pub struct EmitContext<'a> {
    /// The elaborated object model.
    pub objects: &'a ObjectTree,
    /// Source files for location tokens.
    pub sources: &'a SourceDb,
    /// Output switches.
    pub config: &'a EmitConfig,
    /// Names of instantiated modules.
    pub module_names: &'a dyn ModuleNames,
}

impl EmitContext<'_> {
    fn process_location(&self, proc: ProcessId) -> SvgenResult<String> {
        let decl = self.objects.process_decl(proc)?;
        Ok(self.sources.location_token(decl.span))
    }
}

impl SvModule {
    /// Renders the module as SystemVerilog.
    pub fn to_text(&self, ctx: &EmitContext<'_>) -> SvgenResult<String> {
        let mut out = String::new();
        self.serialize(ctx, &mut out)?;
        Ok(out)
    }

    /// Appends the SystemVerilog text of the module to `out`.
    ///
    /// Intrinsic modules are written verbatim. Otherwise the liveness pass
    /// must have run: signals and constants outside the required set are
    /// left out unless `keep_all` is set.
    pub fn serialize(&self, ctx: &EmitContext<'_>, out: &mut String) -> SvgenResult<()> {
        if let Some(intrinsic) = &self.intrinsic {
            out.push_str(&intrinsic.text);
            return Ok(());
        }
        if !self.liveness_done {
            return Err(InternalError::new(format!(
                "`{}` serialized before liveness analysis",
                self.name
            )));
        }

        self.write_header(ctx, out)?;
        self.write_signals(ctx, out)?;
        self.write_data_vars(ctx, out)?;

        if !self.assignments.is_empty() {
            for asn in &self.assignments {
                write!(out, "assign {}", self.var_name(asn.left.var)?)?;
                for idx in &asn.left.indices {
                    write!(out, "[{idx}]")?;
                }
                write!(out, " = {}", self.var_name(asn.right.var)?)?;
                for idx in &asn.right.indices {
                    write!(out, "[{idx}]")?;
                }
                out.push_str(";\n");
            }
            out.push('\n');
        }

        for proc in &self.processes {
            self.write_process(ctx, proc, out)?;
        }

        let has_instances = !self.instances.is_empty();
        if has_instances {
            out.push('\n');
            out.push_str(SECTION_RULE);
            out.push('\n');
        }
        for (_, inst) in self.instances.iter() {
            let child = ctx.module_names.module_name(inst.child).ok_or_else(|| {
                InternalError::new(format!(
                    "instance `{}` of `{}` refers to unknown module #{}",
                    inst.name,
                    self.name,
                    inst.child.as_raw()
                ))
            })?;
            write!(out, "{child} {}\n(\n", inst.name)?;
            let bindings: Vec<String> = inst
                .bindings
                .iter()
                .map(|b| format!("  .{}({})", b.port, b.expr))
                .collect();
            out.push_str(&bindings.join(",\n"));
            out.push_str("\n);\n\n");
        }

        if !self.sva_code.is_empty() {
            if has_instances {
                out.push('\n');
                out.push_str(SECTION_RULE);
                out.push('\n');
            }
            out.push_str("`ifndef SVA_OFF\n");
            out.push_str(&self.sva_code);
            out.push_str("`endif // SVA_OFF\n\n");
        }

        out.push_str("endmodule\n\n\n");
        Ok(())
    }

    fn write_header(&self, ctx: &EmitContext<'_>, out: &mut String) -> SvgenResult<()> {
        let loc = match ctx.objects.object(self.object)?.decl {
            Some(decl) => ctx.sources.location_token(ctx.objects.decl(decl)?.span),
            None => String::new(),
        };
        out.push('\n');
        out.push_str(MODULE_RULE);
        out.push_str("//\n");
        writeln!(out, "// Module: {} ({loc})", self.name)?;
        out.push_str("//\n");
        writeln!(out, "module {} // \"{}\"", self.name, self.comment)?;
        out.push('(');
        for (i, port) in self.ports.iter().enumerate() {
            out.push_str(if i == 0 { "\n" } else { ",\n" });
            write!(out, "    {} ", port.direction.keyword())?;
            write_decl(out, self.var(port.var)?)?;
        }
        out.push_str("\n);\n\n");
        Ok(())
    }

    fn write_signals(&self, ctx: &EmitContext<'_>, out: &mut String) -> SvgenResult<()> {
        let mut first = true;
        for &var in &self.signals {
            if !ctx.config.keep_all && !self.required.contains(&var) {
                continue;
            }
            if first {
                out.push_str("// Signals\n");
                first = false;
            }
            write_decl(out, self.var(var)?)?;
            out.push_str(";\n");
        }
        if !first {
            out.push('\n');
        }
        Ok(())
    }

    fn write_data_vars(&self, ctx: &EmitContext<'_>, out: &mut String) -> SvgenResult<()> {
        let mut first = true;
        let mut printed: HashSet<&str> = HashSet::new();
        for (id, var) in self.pool(VarPool::Data) {
            if !ctx.config.keep_all
                && (!self.required.contains(&id) || !var.is_constant() || !printed.insert(var.name.as_str()))
            {
                continue;
            }
            if first {
                out.push_str("// Data variables\n");
                first = false;
            }
            write_decl(out, var)?;
            out.push_str(";\n");
        }
        if !first {
            out.push('\n');
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ObjectId, VarId};
    use crate::module::ProcessCode;
    use crate::object::{Edge, ObjectKind, Placement, ProcessInfo, ProcessKind, ResetDesc, SensEvent};
    use crate::var::{PortDirection, VarKind, VarRef, VarSpec};
    use svgen_common::{FileId, Span};

    const SRC: &str = "SC_MODULE(Top) {\n  void comb();\n  void seq();\n};\n";
    const COMB_AT: u32 = 24;
    const SEQ_AT: u32 = 39;

    struct Fixture {
        objects: ObjectTree,
        sources: SourceDb,
        file: FileId,
        top: ObjectId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut sources = SourceDb::new();
            let file = sources.add_source("/work/src/dut.cpp", SRC);
            let mut objects = ObjectTree::new();
            let decl = objects.add_decl("top", Span::new(file, 10, 13));
            let top = objects
                .add_object(
                    None,
                    ObjectKind::Module {
                        type_name: "Top".into(),
                        modular_interface: false,
                    },
                    Placement::Top,
                    Some(decl),
                )
                .unwrap();
            Self {
                objects,
                sources,
                file,
                top,
            }
        }

        fn signal(&mut self) -> ObjectId {
            self.objects
                .add_object(Some(self.top), ObjectKind::Signal, Placement::DataMember, None)
                .unwrap()
        }

        fn process(&mut self, name: &str, at: u32, kind: ProcessKind) -> ProcessInfo {
            let decl = self.objects.add_decl(name, Span::new(self.file, at, at + 4));
            ProcessInfo::new(self.top, kind, decl)
        }

        fn render_with(&self, m: &SvModule, config: &EmitConfig, names: &HashMap<ModuleId, String>) -> SvgenResult<String> {
            let ctx = EmitContext {
                objects: &self.objects,
                sources: &self.sources,
                config,
                module_names: names,
            };
            m.to_text(&ctx)
        }

        fn render(&self, m: &SvModule, config: &EmitConfig) -> String {
            self.render_with(m, config, &HashMap::new()).unwrap()
        }
    }

    fn channel(m: &mut SvModule, obj: ObjectId, name: &str, width: u32) -> VarId {
        m.create_channel_variable(obj, VarSpec::new(name, width))
    }

    #[test]
    fn header_ports_and_folded_assignment() {
        let mut f = Fixture::new();
        let (ox, oy, ot) = (f.signal(), f.signal(), f.signal());
        let mut m = SvModule::new(f.top, "Top", "");
        let x = channel(&mut m, ox, "x", 1);
        let y = channel(&mut m, oy, "y", 1);
        let t = channel(&mut m, ot, "t", 1);
        m.convert_to_port(x, PortDirection::In).unwrap();
        m.convert_to_port(y, PortDirection::Out).unwrap();
        m.convert_to_signal(t).unwrap();
        m.add_assignment(VarRef::scalar(t), VarRef::scalar(x)).unwrap();
        m.add_assignment(VarRef::scalar(y), VarRef::scalar(t)).unwrap();
        m.remove_unused_variables(&EmitConfig::default()).unwrap();

        let expected = "\n//==============================================================================\n\
                        //\n\
                        // Module: Top (dut.cpp:1:11)\n\
                        //\n\
                        module Top // \"\"\n\
                        (\n    input logic x,\n    output logic y\n);\n\n\
                        assign y = x;\n\n\
                        endmodule\n\n\n";
        assert_eq!(f.render(&m, &EmitConfig::default()), expected);
    }

    #[test]
    fn keep_all_prints_every_signal_and_data_var() {
        let mut f = Fixture::new();
        let ot = f.signal();
        let mut m = SvModule::new(f.top, "Top", "counter");
        let t = channel(&mut m, ot, "t", 2);
        m.convert_to_signal(t).unwrap();
        m.create_data_variable(ObjectId::from_raw(50), VarSpec::new("plain", 8));
        let config = EmitConfig {
            keep_all: true,
            ..EmitConfig::default()
        };
        m.remove_unused_variables(&config).unwrap();
        let text = f.render(&m, &config);
        assert!(text.contains("module Top // \"counter\"\n(\n);\n\n"));
        assert!(text.contains("// Signals\nlogic [1:0] t;\n\n// Data variables\nlogic [7:0] plain;\n\n"));
    }

    #[test]
    fn only_required_constants_are_declared() {
        let f = Fixture::new();
        let mut m = SvModule::new(f.top, "Top", "");
        let p = crate::ids::ProcessId::from_raw(0);
        let used = m.create_data_variable(ObjectId::from_raw(50), VarSpec::new("LUT", 4).dims([2]).init([1, 2]));
        m.create_data_variable(ObjectId::from_raw(51), VarSpec::new("UNUSED", 4).init([7]));
        let plain = m.create_data_variable(ObjectId::from_raw(52), VarSpec::new("v", 4));
        m.add_proc_use_var(p, used, VarKind::Const);
        m.add_proc_use_var(p, plain, VarKind::Variable);
        m.remove_unused_variables(&EmitConfig::default()).unwrap();
        let text = f.render(&m, &EmitConfig::default());
        assert!(text.contains("// Data variables\nlocalparam logic [3:0] LUT[2] = '{ 'd1, 'd2 };\n\n"));
        assert!(!text.contains("UNUSED"));
        assert!(!text.contains("logic [3:0] v;"));
    }

    #[test]
    fn method_processes() {
        let mut f = Fixture::new();
        let (ox, oy) = (f.signal(), f.signal());
        let mut comb = f.process("comb", COMB_AT, ProcessKind::Method);
        comb.sensitivity.push(SensEvent { edge: Edge::Any, source: ox });
        let comb = f.objects.add_process(comb);
        let mut latch = f.process("comb", COMB_AT, ProcessKind::Method);
        latch.sensitivity.push(SensEvent { edge: Edge::Any, source: ox });
        latch.has_latch = true;
        let latch = f.objects.add_process(latch);
        let bare = f.process("bare", COMB_AT, ProcessKind::Method);
        let bare = f.objects.add_process(bare);

        let mut m = SvModule::new(f.top, "Top", "");
        let x = channel(&mut m, ox, "x", 1);
        channel(&mut m, oy, "y", 1);
        let tmp = m.create_process_local_variable(VarSpec::new("tmp", 3));
        m.convert_to_process_local_var(tmp, comb);
        for p in [comb, latch, bare] {
            m.add_process(&f.objects, p).unwrap();
            m.add_process_body(p, ProcessCode::with_body("    y = x;\n"));
        }
        m.convert_to_port(x, PortDirection::In).unwrap();
        m.remove_unused_variables(&EmitConfig::default()).unwrap();
        let text = f.render(&m, &EmitConfig::default());

        let comb_block = "//------------------------------------------------------------------------------\n\
                          // Method process: comb (dut.cpp:2:8)\n\n\
                          // Process-local variables\n\
                          logic [2:0] tmp;\n\n\
                          always_comb \n\
                          begin : comb     // dut.cpp:2:8\n\
                          \x20   y = x;\n\
                          end\n\n";
        assert!(text.contains(comb_block), "{text}");
        assert!(text.contains("always_latch \nbegin : comb0     // dut.cpp:2:8\n"));
        let bare_block = "// Method process: bare (dut.cpp:2:8)\n\n    y = x;\n\n";
        assert!(text.contains(bare_block), "{text}");
    }

    struct ThreadModule {
        f: Fixture,
        m: SvModule,
    }

    fn thread_module(sync_reset: bool) -> ThreadModule {
        let mut f = Fixture::new();
        let (oclk, orst, ocnt) = (f.signal(), f.signal(), f.signal());
        let mut seq = f.process("seq", SEQ_AT, ProcessKind::ClockedThread);
        seq.sensitivity.push(SensEvent { edge: Edge::Pos, source: oclk });
        seq.resets.push(ResetDesc {
            source: orst,
            level: sync_reset,
            is_async: !sync_reset,
        });
        let seq = f.objects.add_process(seq);

        let mut m = SvModule::new(f.top, "Top", "");
        let clk = channel(&mut m, oclk, "clk", 1);
        let rst = channel(&mut m, orst, if sync_reset { "rst" } else { "rst_n" }, 1);
        let cnt = channel(&mut m, ocnt, "cnt", 4);
        m.convert_to_port(clk, PortDirection::In).unwrap();
        m.convert_to_port(rst, PortDirection::In).unwrap();
        m.convert_to_signal(cnt).unwrap();
        let next = m.create_process_local_variable(VarSpec::new("cnt_next", 4));
        m.convert_to_process_local_var(next, seq);
        m.add_process(&f.objects, seq).unwrap();
        m.add_proc_register_next_pair(seq, cnt, next, "");
        m.add_proc_def_var(seq, cnt, VarKind::Channel);
        m.add_process_body(
            seq,
            ProcessCode {
                body: "    cnt_next = cnt + 1;\n".into(),
                reset_section: "begin\n        cnt <= 0;\n    end\n".into(),
                temp_asserts: "    assert property (cnt != 15);\n".into(),
                ..ProcessCode::default()
            },
        );
        m.remove_unused_variables(&EmitConfig::default()).unwrap();
        ThreadModule { f, m }
    }

    #[test]
    fn split_thread() {
        let t = thread_module(false);
        let text = t.f.render(&t.m, &EmitConfig::default());
        let expected = "//------------------------------------------------------------------------------\n\
                        // Clocked THREAD: seq (dut.cpp:3:8)\n\n\
                        // Thread-local variables\n\
                        logic [3:0] cnt_next;\n\n\
                        // Next-state combinational logic\n\
                        always_comb begin : seq_comb     // dut.cpp:3:8\n\
                        \x20   seq_func;\n\
                        end\n\
                        function void seq_func;\n\
                        \x20   cnt_next = cnt + 1;\n\
                        endfunction\n\n\
                        // Synchronous register update\n\
                        always_ff @(posedge clk or negedge rst_n) \n\
                        begin : seq_ff\n\
                        \x20   if (~rst_n) begin\n\
                        \x20       cnt <= 0;\n\
                        \x20   end\n\
                        \x20   else begin\n\
                        \x20       cnt <= cnt_next;\n\
                        \n\
                        \x20   `ifndef SVA_OFF\n\
                        \x20   assert property (cnt != 15);\n\
                        \x20   `endif // SVA_OFF\n\
                        \x20   end\n\
                        end\n\n";
        assert!(text.contains(expected), "{text}");
        assert!(text.contains("// Signals\nlogic [3:0] cnt;\n\n"));
    }

    #[test]
    fn single_block_thread_with_sync_reset() {
        let t = thread_module(true);
        let config = EmitConfig {
            split_threads: false,
            ..EmitConfig::default()
        };
        let text = t.f.render(&t.m, &config);
        let expected = "// Thread process: seq (dut.cpp:3:8)\n\n\
                        // Process-local variables\n\
                        logic [3:0] cnt_next;\n\n\
                        always @(posedge clk /*sync rst*/) \n\
                        begin : seq     // dut.cpp:3:8\n\
                        \x20   if (rst) begin\n\
                        \x20       cnt <= 0;\n\
                        \x20   end\n\
                        \x20   else \x20   cnt_next = cnt + 1;\n\
                        end\n\n";
        assert!(text.contains(expected), "{text}");
        assert!(!text.contains("always_ff"));
    }

    #[test]
    fn thread_local_constants_filtered() {
        let mut t = thread_module(false);
        let seq = t.m.processes()[0].id;
        let replaced = t.m.create_process_local_variable(VarSpec::new("STEP", 4).init([1]));
        let kept = t.m.create_process_local_variable(VarSpec::new("LIMIT", 4).init([9]));
        let table = t.m.create_process_local_variable(VarSpec::new("TBL", 4).dims([2]).init([3, 4]));
        t.m.mark_const_value(replaced, true);
        t.m.mark_const_value(table, true);
        for var in [replaced, kept, table] {
            t.m.add_proc_const(var, seq);
        }
        let text = t.f.render(&t.m, &EmitConfig::default());
        assert!(text.contains(
            "// Thread-local constants\nlocalparam logic [3:0] LIMIT = 'd9;\nlocalparam logic [3:0] TBL[2] = '{ 'd3, 'd4 };\n\n"
        ));
        assert!(!text.contains("STEP"));

        let config = EmitConfig {
            remove_const_decl: false,
            ..EmitConfig::default()
        };
        assert!(t.f.render(&t.m, &config).contains("localparam logic [3:0] STEP = 'd1;\n"));
    }

    #[test]
    fn array_element_sensitivity_is_indexed_and_deduplicated() {
        let mut f = Fixture::new();
        let arr = f
            .objects
            .add_object(Some(f.top), ObjectKind::Array, Placement::DataMember, None)
            .unwrap();
        let e0 = f
            .objects
            .add_object(Some(arr), ObjectKind::Signal, Placement::ArrayElement { index: 0 }, None)
            .unwrap();
        let e1 = f
            .objects
            .add_object(Some(arr), ObjectKind::Signal, Placement::ArrayElement { index: 1 }, None)
            .unwrap();
        let mut info = f.process("seq", SEQ_AT, ProcessKind::Thread);
        for source in [e1, e1, e0] {
            info.sensitivity.push(SensEvent { edge: Edge::Neg, source });
        }
        let mut m = SvModule::new(f.top, "Top", "");
        channel(&mut m, arr, "clks", 1);
        assert_eq!(
            m.sensitivity_list(&f.objects, &info).unwrap(),
            "negedge clks[1] or negedge clks[0]"
        );

        info.sensitivity.push(SensEvent { edge: Edge::Pos, source: f.top });
        let err = m.sensitivity_list(&f.objects, &info).unwrap_err();
        assert!(err.message.contains("no channel variable"));
    }

    #[test]
    fn reset_condition_joins_sources() {
        let mut f = Fixture::new();
        let (a, b) = (f.signal(), f.signal());
        let mut info = f.process("seq", SEQ_AT, ProcessKind::ClockedThread);
        info.resets.push(ResetDesc { source: a, level: true, is_async: true });
        info.resets.push(ResetDesc { source: b, level: false, is_async: false });
        let mut m = SvModule::new(f.top, "Top", "");
        channel(&mut m, a, "rst", 1);
        channel(&mut m, b, "srst_n", 1);
        assert_eq!(m.reset_condition(&f.objects, &info).unwrap(), "(rst || ~srst_n)");
        assert_eq!(m.sensitivity_list(&f.objects, &info).unwrap(), "posedge rst /*sync srst_n*/");
    }

    #[test]
    fn instances_and_assertions() {
        let mut f = Fixture::new();
        let ob = f.signal();
        let child_obj = f
            .objects
            .add_object(
                Some(f.top),
                ObjectKind::Module {
                    type_name: "Child".into(),
                    modular_interface: false,
                },
                Placement::DataMember,
                None,
            )
            .unwrap();
        let mut m = SvModule::new(f.top, "Top", "");
        let bus = m.create_channel_variable(ob, VarSpec::new("bus", 8).dims([2]));
        m.convert_to_signal(bus).unwrap();
        let child = ModuleId::from_raw(1);
        let inst = m.add_module_instance(child, child_obj, "u_child");
        m.add_binding(inst, "din", &VarRef::indexed(bus, [0])).unwrap();
        m.add_binding(inst, "dout", &VarRef::indexed(bus, [1])).unwrap();
        m.add_bind_var(bus);
        m.add_sva_property_code("assert property (@(posedge clk) bus[0] |-> bus[1]);\n");
        m.remove_unused_variables(&EmitConfig::default()).unwrap();

        let names: HashMap<ModuleId, String> = [(child, "Child".to_string())].into_iter().collect();
        let text = f.render_with(&m, &EmitConfig::default(), &names).unwrap();
        let expected = "// Signals\nlogic [7:0] bus[2];\n\n\
                        \n//------------------------------------------------------------------------------\n\n\
                        Child u_child\n(\n  .din(bus[0]),\n  .dout(bus[1])\n);\n\n\
                        \n//------------------------------------------------------------------------------\n\n\
                        `ifndef SVA_OFF\n\
                        assert property (@(posedge clk) bus[0] |-> bus[1]);\n\
                        `endif // SVA_OFF\n\n\
                        endmodule\n\n\n";
        assert!(text.ends_with(expected), "{text}");

        let err = f.render_with(&m, &EmitConfig::default(), &HashMap::new()).unwrap_err();
        assert!(err.message.contains("unknown module"));
    }

    #[test]
    fn intrinsic_is_verbatim() {
        let f = Fixture::new();
        let mut m = SvModule::new(f.top, "mem", "");
        m.set_intrinsic("module mem(); endmodule\n");
        assert_eq!(f.render(&m, &EmitConfig::default()), "module mem(); endmodule\n");
    }

    #[test]
    fn serializing_before_liveness_fails() {
        let f = Fixture::new();
        let m = SvModule::new(f.top, "Top", "");
        let err = f.render_with(&m, &EmitConfig::default(), &HashMap::new()).unwrap_err();
        assert!(err.message.contains("before liveness"));
    }
}
