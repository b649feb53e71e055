//! Opaque ID newtypes for object-model entities and module-owned tables.
//!
//! IDs are plain `u32` indices: `Copy`, hashable, ordered, and never
//! pointers into the tables they index.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// An object of the elaborated model (module, signal, port, data member, array).
    ObjectId
);

define_id!(
    /// A source declaration (field, method) of the elaborated model.
    DeclId
);

define_id!(
    /// An elaborated process. Equality-comparable handle, not a live reference.
    ProcessId
);

define_id!(
    /// A generated module within a [`Design`](crate::design::Design).
    ModuleId
);

define_id!(
    /// A variable owned by one generated module.
    VarId
);

define_id!(
    /// A sub-module instance owned by one generated module.
    InstanceId
);
