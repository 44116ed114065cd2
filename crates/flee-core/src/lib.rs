//! Core types shared by the Flee crates.
//!
//! - [`TypeHash`] type identity and the well-known [`primitives`]
//! - [`PrimitiveKind`] and runtime [`Value`]s
//! - [`NativeFn`] host function storage
//! - Registry [`entries`] and the [`SymbolResolver`] capability the compiler
//!   binds through
//! - Error types and the [`MessageCatalog`] used to format compile errors

pub mod entries;
pub mod error;
pub mod messages;
pub mod native_fn;
pub mod primitive;
pub mod resolver;
pub mod span;
pub mod type_hash;
pub mod value;

pub use entries::{
    ArrayEntry, ClassEntry, CollectionKind, EnumEntry, EnumValue, FieldEntry, FunctionEntry,
    InterfaceEntry, ParamEntry, PrimitiveEntry, PropertyEntry, TypeEntry,
};
pub use error::{
    CompileError, CompileErrorReason, LexError, ParseError, ParseErrorKind, RegistrationError,
};
pub use messages::{MessageCatalog, MessageKey};
pub use native_fn::{CallContext, NativeCallable, NativeError, NativeFn};
pub use primitive::PrimitiveKind;
pub use resolver::{MemberAccess, MemberKinds, MemberRef, SymbolResolver, Visibility};
pub use span::Span;
pub use type_hash::{TypeHash, hash_constants, primitives};
pub use value::{ArrayValue, ConversionError, FromValue, HostObject, ObjectRef, Value};
