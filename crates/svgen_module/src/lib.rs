//! SystemVerilog module assembly for elaborated hardware models.
//!
//! A front end walks an elaborated design ([`ObjectTree`]) and registers,
//! per generated module, the variables, ports, instances, assignments and
//! process bodies it derived. This crate owns the rest:
//!
//! - unique identifier allocation ([`NameAllocator`])
//! - copy folding and liveness over the registered assignments
//! - the multiple-driver / multiple-access checks
//! - process framing as `always_comb` / `always_ff` text
//! - assertion argument sanitizing
//! - merging structurally equivalent modules
//!
//! # Usage
//!
//! ```ignore
//! let mut design = Design::new(objects, sources, EmitConfig::default());
//! let top = design.create_module(top_obj, "Top", "top level");
//! let (objects, m) = design.parts_mut(top)?;
//! let x = m.create_channel_variable(x_obj, VarSpec::new("x", 1));
//! // ... register the rest ...
//! design.finalize(top, &sink)?;
//! design.deduplicate()?;
//! let text = design.emit()?;
//! ```

#![warn(missing_docs)]

pub mod arena;
pub mod design;
pub mod errors;
pub mod ids;
pub mod keywords;
pub mod liveness;
pub mod module;
pub mod names;
pub mod object;
pub mod serialize;
pub mod sva;
pub mod var;

mod equiv;
mod registry;
mod usedef;

pub use design::Design;
pub use ids::{DeclId, InstanceId, ModuleId, ObjectId, ProcessId, VarId};
pub use liveness::filter_assignments;
pub use module::{ProcessCode, SvModule};
pub use names::NameAllocator;
pub use object::{ObjectKind, ObjectTree, Placement, ProcessInfo, ProcessKind};
pub use serialize::{EmitContext, ModuleNames};
pub use sva::sanitize_sva_arg;
pub use var::{Assignment, PortDirection, VarKind, VarPool, VarRef, VarSpec, Variable};
