//! Flee host registry crate.
//!
//! [`SymbolRegistry`] stores the host types expressions can see and
//! implements [`flee_core::SymbolResolver`] for the compiler. Classes are
//! registered through the fluent [`ClassBuilder`]; [`register_builtins`]
//! adds primitives, `object`, `string` and `Math`.

mod builder;
mod builtins;
mod registry;

pub use builder::ClassBuilder;
pub use builtins::register_builtins;
pub use registry::SymbolRegistry;
