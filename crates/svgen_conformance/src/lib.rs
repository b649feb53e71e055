//! Conformance test helpers for the svgen module assembler.
//!
//! Builds small elaborated models backed by real source text, runs their
//! modules through the whole pipeline (liveness → use/def → deduplication →
//! emission), and returns structured results for assertion in integration
//! tests.

#![warn(missing_docs)]

use svgen_common::{FileId, SourceDb, Span, SvgenResult};
use svgen_config::{load_config_from_str, EmitConfig};
use svgen_diagnostics::{Diagnostic, DiagnosticSink};
use svgen_module::{Design, ObjectId, ObjectKind, ObjectTree, Placement, ProcessId, ProcessInfo, ProcessKind};

/// Builds an elaborated object model whose declarations point into one
/// source file.
pub struct ModelBuilder {
    objects: ObjectTree,
    sources: SourceDb,
    file: FileId,
    text: String,
}

impl ModelBuilder {
    /// Starts a model over the source file `path` with contents `text`.
    pub fn new(path: &str, text: &str) -> Self {
        let mut sources = SourceDb::new();
        let file = sources.add_source(path, text);
        Self {
            objects: ObjectTree::new(),
            sources,
            file,
            text: text.to_string(),
        }
    }

    /// Span of the first occurrence of `needle` in the source text.
    ///
    /// # Panics
    ///
    /// Panics if `needle` does not occur.
    pub fn span_of(&self, needle: &str) -> Span {
        let start = self
            .text
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not in source"));
        Span::new(self.file, start as u32, (start + needle.len()) as u32)
    }

    /// Adds a top-level module declared at `needle`.
    pub fn top_module(&mut self, type_name: &str, needle: &str) -> ObjectId {
        let span = self.span_of(needle);
        let decl = self.objects.add_decl(type_name, span);
        self.objects
            .add_object(None, module_kind(type_name, false), Placement::Top, Some(decl))
            .unwrap()
    }

    /// Adds a sub-module member of `parent`.
    pub fn child_module(&mut self, parent: ObjectId, type_name: &str) -> ObjectId {
        self.objects
            .add_object(Some(parent), module_kind(type_name, false), Placement::DataMember, None)
            .unwrap()
    }

    /// Adds a signal member of `parent`.
    pub fn signal(&mut self, parent: ObjectId) -> ObjectId {
        self.objects
            .add_object(Some(parent), ObjectKind::Signal, Placement::DataMember, None)
            .unwrap()
    }

    /// Adds an array member of `parent` holding `len` modular interfaces,
    /// each with one data member declared as `member`. Returns the member
    /// object of every element.
    pub fn mif_array(&mut self, parent: ObjectId, type_name: &str, member: &str, len: usize) -> Vec<ObjectId> {
        let decl = self.objects.add_decl(member, Span::DUMMY);
        let array = self
            .objects
            .add_object(Some(parent), ObjectKind::Array, Placement::DataMember, None)
            .unwrap();
        (0..len)
            .map(|index| {
                let element = self
                    .objects
                    .add_object(
                        Some(array),
                        module_kind(type_name, true),
                        Placement::ArrayElement { index },
                        None,
                    )
                    .unwrap();
                self.objects
                    .add_object(
                        Some(element),
                        ObjectKind::Primitive { value: None },
                        Placement::DataMember,
                        Some(decl),
                    )
                    .unwrap()
            })
            .collect()
    }

    /// Describes a process of module `parent` declared at `needle`; the
    /// caller fills in sensitivity and resets before [`Self::add_process`].
    pub fn process(&mut self, parent: ObjectId, needle: &str, kind: ProcessKind) -> ProcessInfo {
        let span = self.span_of(needle);
        let decl = self.objects.add_decl(needle, span);
        ProcessInfo::new(parent, kind, decl)
    }

    /// Registers a process.
    pub fn add_process(&mut self, info: ProcessInfo) -> ProcessId {
        self.objects.add_process(info)
    }

    /// Registered source files.
    pub fn sources(&self) -> &SourceDb {
        &self.sources
    }

    /// Hands the finished model to a new [`Design`].
    pub fn into_design(self, config: EmitConfig) -> Design {
        Design::new(self.objects, self.sources, config)
    }
}

fn module_kind(type_name: &str, modular_interface: bool) -> ObjectKind {
    ObjectKind::Module {
        type_name: type_name.to_string(),
        modular_interface,
    }
}

/// Result of running every module of a design through the pipeline.
pub struct PipelineResult {
    /// Emitted text of all modules that survived deduplication.
    pub text: String,
    /// All diagnostics emitted during the pipeline.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of use/def conflicts over all modules.
    pub conflicts: usize,
    /// Number of modules merged into an equivalent one.
    pub merged: usize,
}

/// Finalizes every module, merges equivalent ones, and emits the design.
pub fn run_pipeline(design: &mut Design) -> SvgenResult<PipelineResult> {
    let sink = DiagnosticSink::new();
    let ids: Vec<_> = design.module_ids().collect();
    let mut conflicts = 0;
    for id in ids {
        conflicts += design.finalize(id, &sink)?;
    }
    let merged = design.deduplicate()?;
    Ok(PipelineResult {
        text: design.emit()?,
        diagnostics: sink.take_all(),
        conflicts,
        merged,
    })
}

/// Parses an `svgen.toml` body.
pub fn make_config(toml: &str) -> EmitConfig {
    load_config_from_str(toml).unwrap()
}

/// Location token (`file:line:col`) of a diagnostic.
pub fn location_of(sources: &SourceDb, diag: &Diagnostic) -> String {
    sources.location_token(diag.span)
}
