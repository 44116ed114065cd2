//! Flee expression compiler.
//!
//! Turns expression text into a typed bytecode [`Chunk`] in two steps:
//!
//! - **Binding**: the [`ExprCompiler`] walks the parsed expression and
//!   resolves every name, operator and conversion against the host type
//!   system, producing an [`Element`] tree
//! - **Emission**: the element tree emits itself into an [`Emitter`],
//!   resolving branch offsets with a [`emit::BranchManager`]
//!
//! ## Modules
//!
//! - [`bytecode`]: Opcodes and the [`Chunk`] they are stored in
//! - [`conversion`]: Implicit and explicit conversions with their costs
//! - [`elements`]: The typed element tree
//! - [`emit`]: Bytecode emitter and branch management
//! - [`expr`]: Binding of parsed expressions to elements
//! - [`imports`]: Imported types, methods and namespaces
//! - [`options`]: Compile options
//! - [`overload`]: Overload resolution and operator lookup
//! - [`scope`]: Everything an expression sees while it compiles

pub mod bytecode;
pub mod conversion;
pub mod elements;
pub mod emit;
pub mod expr;
pub mod imports;
pub mod options;
pub mod overload;
pub mod scope;

pub use bytecode::{CallTarget, Chunk, OpCode};
pub use conversion::{
    Conversion, ConversionKind, can_convert, explicit_convertible, find_conversion, find_explicit_conversion,
};
pub use elements::Element;
pub use emit::Emitter;
pub use expr::ExprCompiler;
pub use imports::{Import, ImportScope};
pub use options::{ExpressionOptions, RealLiteralType, StringComparison};
pub use overload::{Candidate, OverloadError, resolve_overload};
pub use scope::{CompileScope, ExternalSymbols, NoExternals};

pub use flee_core::CompileError;

use bumpalo::Bump;
use flee_core::TypeHash;
use flee_parser::{Expr, Parser, ParserOptions};
use tracing::debug;

/// Bytecode of one expression and the type of the value it returns.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    pub chunk: Chunk,
    pub result_type: TypeHash,
}

/// Parse and compile expression text.
pub fn compile(
    text: &str,
    parser_options: &ParserOptions,
    scope: &CompileScope<'_>,
) -> Result<CompiledExpression, CompileError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("flee_compiler::compile");

    let arena = Bump::new();
    let expr = Parser::parse_expression(text, &arena, parser_options)?;
    compile_expr(expr, scope)
}

/// Compile an already parsed expression.
pub fn compile_expr(expr: &Expr<'_>, scope: &CompileScope<'_>) -> Result<CompiledExpression, CompileError> {
    let element = ExprCompiler::new(scope).compile_root(expr)?;
    let result_type = element.result_type();

    let mut emitter = Emitter::new();
    element.emit(&mut emitter);
    emitter.emit(OpCode::Return);
    let chunk = emitter.finish();

    debug!(
        result_type = %scope.type_name(result_type),
        bytes = chunk.len(),
        temps = chunk.temp_count(),
        "compiled expression"
    );
    Ok(CompiledExpression { chunk, result_type })
}
