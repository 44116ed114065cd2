//! End-to-end tests: compile expression text and evaluate it.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use flee::{
    CallContext, CompileErrorReason, EvalError, ExpressionContext, ExpressionOptions, HostObject,
    NativeError, OnDemandResolver, SymbolRegistry, TypeHash, Value, primitives,
};

type NativeResult = Result<(), NativeError>;

fn context() -> ExpressionContext {
    ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins()))
}

fn eval(ctx: &ExpressionContext, text: &str) -> Value {
    ctx.compile_dynamic(text)
        .unwrap_or_else(|err| panic!("compiling `{text}`: {err}"))
        .evaluate()
        .unwrap_or_else(|err| panic!("evaluating `{text}`: {err}"))
}

fn reason(ctx: &ExpressionContext, text: &str) -> CompileErrorReason {
    ctx.compile_dynamic(text).unwrap_err().reason()
}

// === Arithmetic and logic ===

#[test]
fn precedence() {
    let ctx = context();
    assert_eq!(eval(&ctx, "2 + 3 * 4"), Value::Int32(14));
    assert_eq!(eval(&ctx, "(2 + 3) * 4"), Value::Int32(20));
    assert_eq!(eval(&ctx, "2 ^ 3 ^ 2"), Value::Int32(64));
    assert_eq!(eval(&ctx, "-2 * 3"), Value::Int32(-6));
    assert_eq!(eval(&ctx, "7 % 3 + 10 / 4"), Value::Int32(3));
}

#[test]
fn numeric_promotion() {
    let ctx = context();
    assert_eq!(eval(&ctx, "1 + 2.5"), Value::Double(3.5));
    assert_eq!(eval(&ctx, "10 / 4.0"), Value::Double(2.5));
    assert_eq!(eval(&ctx, "1L + 1"), Value::Int64(2));
    assert_eq!(eval(&ctx, "0xFF"), Value::Int32(255));
}

#[test]
fn integers_as_doubles() {
    let ctx = context().with_options(ExpressionOptions::new().with_integers_as_doubles(true));
    assert_eq!(eval(&ctx, "10 / 4"), Value::Double(2.5));
}

#[test]
fn logical_operators() {
    let ctx = context();
    assert_eq!(eval(&ctx, "(1 < 2) and (3 > 2)"), Value::Bool(true));
    assert_eq!(eval(&ctx, "(1 > 2) or not (3 > 2)"), Value::Bool(false));
    assert_eq!(eval(&ctx, "true xor false"), Value::Bool(true));
    assert_eq!(eval(&ctx, "6 and 3"), Value::Int32(2));
}

fn tracer_registry(calls: Arc<AtomicUsize>) -> SymbolRegistry {
    let mut registry = SymbolRegistry::with_builtins();
    registry
        .register_class("Tracer")
        .static_method("Touch", primitives::BOOL, &[], move |ctx: &mut CallContext<'_>| {
            calls.fetch_add(1, Ordering::SeqCst);
            ctx.set_return(true);
            Ok::<(), NativeError>(())
        })
        .static_method("Boom", primitives::BOOL, &[], |_ctx: &mut CallContext<'_>| -> NativeResult {
            Err(NativeError::other("boom"))
        })
        .build()
        .unwrap();
    registry
}

#[test]
fn and_or_short_circuit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ctx = ExpressionContext::new(Arc::new(tracer_registry(calls.clone())));
    ctx.imports_mut().add_type("Tracer").unwrap();

    assert_eq!(eval(&ctx, "(1 < 2) and (3 > 2) and Touch()"), Value::Bool(true));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(eval(&ctx, "(1 > 2) and Touch()"), Value::Bool(false));
    assert_eq!(eval(&ctx, "(1 < 2) or Touch()"), Value::Bool(true));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(eval(&ctx, "false and Boom()"), Value::Bool(false));
    let err = ctx.compile_dynamic("true and Boom()").unwrap().evaluate().unwrap_err();
    assert!(matches!(err, EvalError::Native { .. }));
}

#[test]
fn conditionals_and_in() {
    let ctx = context();
    ctx.variables().add("x", 5).unwrap();
    assert_eq!(eval(&ctx, "if(x > 0, \"pos\", \"neg\")"), Value::string("pos"));
    assert_eq!(eval(&ctx, "if(x > 10, 1, 2.5)"), Value::Double(2.5));
    assert_eq!(eval(&ctx, "x in (1, 3, 5)"), Value::Bool(true));
    assert_eq!(eval(&ctx, "x in (2, 4)"), Value::Bool(false));
    assert_eq!(reason(&ctx, "if(1, 2, 3)"), CompileErrorReason::TypeMismatch);
}

#[test]
fn strings() {
    let ctx = context();
    assert_eq!(eval(&ctx, "\"a\" + 1"), Value::string("a1"));
    assert_eq!(eval(&ctx, "\"abc\" = \"abc\""), Value::Bool(true));
    assert_eq!(eval(&ctx, "\"abc\" <> \"ABC\""), Value::Bool(true));
    assert_eq!(eval(&ctx, "'x'"), Value::Char('x'));
}

#[test]
fn casts() {
    let ctx = context();
    assert_eq!(eval(&ctx, "cast(3.7, int)"), Value::Int32(3));
    assert_eq!(eval(&ctx, "cast(1, double)"), Value::Double(1.0));
    assert_eq!(reason(&ctx, "cast(\"a\", int)"), CompileErrorReason::InvalidExplicitCast);
}

#[test]
fn checked_overflow() {
    let ctx = context().with_options(ExpressionOptions::new().with_checked(true));
    ctx.variables().add("big", i32::MAX).unwrap();
    let err = ctx.compile_dynamic("big + 1").unwrap().evaluate().unwrap_err();
    assert!(matches!(err, EvalError::Overflow { .. }), "{err:?}");

    let unchecked = context();
    unchecked.variables().add("big", i32::MAX).unwrap();
    assert_eq!(eval(&unchecked, "big + 1"), Value::Int32(i32::MIN));
}

// === Imports ===

#[test]
fn math_imports() {
    let mut ctx = context();
    ctx.variables().add("x", 16.0).unwrap();
    assert_eq!(reason(&ctx, "Sqrt(x)"), CompileErrorReason::UndefinedName);

    ctx.imports_mut().add_type("Math").unwrap();
    assert_eq!(eval(&ctx, "Sqrt(x) + 1"), Value::Double(5.0));
    assert_eq!(eval(&ctx, "Max(2, 7)"), Value::Int32(7));

    let mut ns = context();
    ns.imports_mut().add_type_as_namespace("Math").unwrap();
    assert_eq!(eval(&ns, "Math.Abs(-3)"), Value::Int32(3));
}

// === Host types ===

#[derive(Debug)]
struct Customer {
    name: String,
    age: i32,
}

impl HostObject for Customer {
    fn type_hash(&self) -> TypeHash {
        TypeHash::from_name("Customer")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn virtual_property(&self, name: &str) -> Option<Value> {
        (name == "Tier").then(|| Value::string("gold"))
    }
}

fn customer_registry() -> SymbolRegistry {
    let mut registry = SymbolRegistry::with_builtins();
    registry
        .register_class("Customer")
        .field("Name", primitives::STRING, |ctx: &mut CallContext<'_>| {
            let name = ctx.this_as::<Customer>()?.name.clone();
            ctx.set_return(name);
            Ok::<(), NativeError>(())
        })
        .property("Age", primitives::INT32, |ctx: &mut CallContext<'_>| {
            let age = ctx.this_as::<Customer>()?.age;
            ctx.set_return(age);
            Ok::<(), NativeError>(())
        })
        .virtual_property("Tier", primitives::STRING)
        .method("IsOlderThan", primitives::BOOL, &[primitives::INT32], |ctx: &mut CallContext<'_>| {
            let limit = ctx.arg_as::<i32>(0)?;
            let older = ctx.this_as::<Customer>()?.age > limit;
            ctx.set_return(older);
            Ok::<(), NativeError>(())
        })
        .build()
        .unwrap();
    registry
}

#[test]
fn owner_members() {
    let ctx = ExpressionContext::new(Arc::new(customer_registry())).with_owner(Value::object(Customer {
        name: "Ada".to_string(),
        age: 36,
    }));

    assert_eq!(eval(&ctx, "name + \" is \" + age"), Value::string("Ada is 36"));
    assert_eq!(eval(&ctx, "IsOlderThan(30)"), Value::Bool(true));
    assert_eq!(reason(&ctx, "Missing"), CompileErrorReason::UndefinedName);
}

#[test]
fn owners_can_be_swapped() {
    let ctx = ExpressionContext::new(Arc::new(customer_registry())).with_owner(Value::object(Customer {
        name: "Ada".to_string(),
        age: 36,
    }));
    let mut expr = ctx.compile_dynamic("Age * 2").unwrap();
    assert_eq!(expr.evaluate().unwrap(), Value::Int32(72));

    expr.set_owner(Value::object(Customer {
        name: "Bob".to_string(),
        age: 20,
    }))
    .unwrap();
    assert_eq!(expr.evaluate().unwrap(), Value::Int32(40));
    assert!(expr.set_owner(5).is_err());
}

#[test]
fn member_chains_on_variables() {
    let ctx = ExpressionContext::new(Arc::new(customer_registry()));
    ctx.variables()
        .add(
            "c",
            Value::object(Customer {
                name: "Ada".to_string(),
                age: 36,
            }),
        )
        .unwrap();
    assert_eq!(eval(&ctx, "c.Name"), Value::string("Ada"));
    assert_eq!(eval(&ctx, "c.Tier + \"!\""), Value::string("gold!"));

    ctx.variables().define("nobody", TypeHash::from_name("Customer")).unwrap();
    let err = ctx.compile_dynamic("nobody.Age").unwrap().evaluate().unwrap_err();
    assert!(matches!(err, EvalError::NullReference { .. }), "{err:?}");
}

// === Overload resolution ===

/// `A` converts implicitly to both `B1` and `B2`; `Pick` takes either.
fn ambiguous_registry() -> SymbolRegistry {
    let mut registry = SymbolRegistry::with_builtins();
    let a = registry.register_class("A").build().unwrap();

    // Each target declares its conversion from `A`.
    let convert = |ctx: &mut CallContext<'_>| -> NativeResult {
        let value = ctx.arg(0)?.clone();
        ctx.set_return(value);
        Ok(())
    };
    let b1 = TypeHash::from_name("B1");
    let b2 = TypeHash::from_name("B2");
    registry
        .register_class("B1")
        .implicit_conversion(a, b1, convert)
        .build()
        .unwrap();
    registry
        .register_class("B2")
        .implicit_conversion(a, b2, convert)
        .build()
        .unwrap();

    let pick = |ctx: &mut CallContext<'_>| -> NativeResult {
        ctx.set_return(1);
        Ok(())
    };
    registry
        .register_class("Lib")
        .static_method("Pick", primitives::INT32, &[b1], pick)
        .static_method("Pick", primitives::INT32, &[b2], pick)
        .static_method("Exact", primitives::INT32, &[b1], pick)
        .build()
        .unwrap();
    registry
}

#[test]
fn equally_good_user_conversions_are_ambiguous() {
    let mut ctx = ExpressionContext::new(Arc::new(ambiguous_registry()));
    ctx.imports_mut().add_type("Lib").unwrap();
    ctx.variables().define("a", TypeHash::from_name("A")).unwrap();

    let err = ctx.compile_dynamic("Pick(a)").unwrap_err();
    assert_eq!(err.reason(), CompileErrorReason::AmbiguousMatch);
    assert!(err.message.contains("Pick"), "{}", err.message);

    // A single candidate is not ambiguous.
    assert_eq!(
        ctx.compile_dynamic("Exact(a)").unwrap().result_type(),
        primitives::INT32
    );
}

// === On-demand symbols ===

struct Sheet;

impl OnDemandResolver for Sheet {
    fn variable_type(&self, name: &str) -> Option<TypeHash> {
        name.starts_with("cell_").then_some(primitives::DOUBLE)
    }

    fn variable_value(&self, name: &str) -> Option<Value> {
        name.strip_prefix("cell_")
            .and_then(|n| n.parse::<f64>().ok())
            .map(Value::Double)
    }

    fn function_type(&self, name: &str, args: &[TypeHash]) -> Option<TypeHash> {
        (name.eq_ignore_ascii_case("sum") && args.iter().all(|a| *a == primitives::DOUBLE))
            .then_some(primitives::DOUBLE)
    }

    fn invoke_function(&self, _name: &str, args: &[Value]) -> Option<Value> {
        let mut total = 0.0;
        for arg in args {
            let Value::Double(d) = arg else { return None };
            total += d;
        }
        Some(Value::Double(total))
    }
}

#[test]
fn on_demand_variables_and_functions() {
    let ctx = context();
    ctx.variables().set_resolver(Sheet);

    assert_eq!(eval(&ctx, "cell_2 * 3"), Value::Double(6.0));
    assert_eq!(eval(&ctx, "Sum(cell_1, cell_2, 0.5)"), Value::Double(3.5));
    assert_eq!(reason(&ctx, "other"), CompileErrorReason::UndefinedName);

    ctx.variables().clear_resolver();
    assert_eq!(reason(&ctx, "cell_2"), CompileErrorReason::UndefinedName);
}

// === Typed results ===

#[test]
fn generic_expressions_convert_results() {
    let ctx = context();
    ctx.variables().add("n", 3).unwrap();
    let expr = ctx.compile_generic::<f64>("n * 2").unwrap();
    assert_eq!(expr.evaluate().unwrap(), 6.0);

    ctx.variables().set("n", 4).unwrap();
    assert_eq!(expr.evaluate().unwrap(), 8.0);

    assert_eq!(
        ctx.compile_generic::<bool>("n * 2").unwrap_err().reason(),
        CompileErrorReason::TypeMismatch
    );
}

#[test]
fn case_sensitivity() {
    let ctx = context();
    ctx.variables().add("Total", 10).unwrap();
    assert_eq!(eval(&ctx, "total + TOTAL"), Value::Int32(20));

    let mut strict = context();
    strict.set_options(ExpressionOptions::new().with_case_sensitive(true));
    strict.variables().add("Total", 10).unwrap();
    assert_eq!(eval(&strict, "Total"), Value::Int32(10));
    assert_eq!(reason(&strict, "total"), CompileErrorReason::UndefinedName);
}

#[test]
fn syntax_errors() {
    let ctx = context();
    assert_eq!(reason(&ctx, "1 +"), CompileErrorReason::SyntaxError);
    assert_eq!(reason(&ctx, "(1"), CompileErrorReason::SyntaxError);
    assert_eq!(reason(&ctx, "99999999999999999999"), CompileErrorReason::ConstantOverflow);
}
