//! Registry entry types.
//!
//! - [`TypeEntry`] - Unified enum wrapping all type entries
//! - [`ClassEntry`] - Host classes (also `string` and `object`)
//! - [`EnumEntry`] - Enumerations
//! - [`InterfaceEntry`] - Interfaces, optionally tagged as collections
//! - [`PrimitiveEntry`] / [`ArrayEntry`] - Built-in value and array types
//! - [`FunctionEntry`] - Methods, static functions, operators, indexers
//!
//! Supporting types:
//! - [`FieldEntry`], [`PropertyEntry`], [`EnumValue`] - Data members
//! - [`ParamEntry`] - Function parameters

mod class;
mod common;
mod enum_entry;
mod function;
mod interface;
mod primitive;
mod type_entry;

pub use class::ClassEntry;
pub use common::{EnumValue, FieldEntry, PropertyEntry};
pub use enum_entry::EnumEntry;
pub use function::{FunctionEntry, ParamEntry};
pub use interface::{CollectionKind, InterfaceEntry};
pub use primitive::{ArrayEntry, PrimitiveEntry};
pub use type_entry::TypeEntry;
