//! End-to-end tests for the calculation engines.

use std::sync::Arc;

use flee::{
    CalcError, CalculationEngine, CompileErrorReason, EvalError, ExpressionContext, SimpleCalcEngine,
    SymbolRegistry, Value,
};
use parking_lot::Mutex;

fn context() -> ExpressionContext {
    ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins()))
}

fn record(engine: &mut CalculationEngine) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.on_node_recalculated(move |event| sink.lock().push(event.name.clone()));
    seen
}

#[test]
fn chained_entries_recalculate_in_order() {
    let ctx = context();
    ctx.variables().add("input", 1).unwrap();

    let mut engine = CalculationEngine::new();
    engine.add("A", "input", &ctx).unwrap();
    engine.add("B", "A + 1", &ctx).unwrap();
    engine.add("C", "B * 2", &ctx).unwrap();
    engine.add("D", "input * 100", &ctx).unwrap();
    let seen = record(&mut engine);

    engine.recalculate(&[]).unwrap();
    assert_eq!(engine.result("C").unwrap(), Value::Int32(4));
    {
        let seen = seen.lock();
        let pos = |name: &str| seen.iter().position(|n| n == name).unwrap();
        assert!(pos("A") < pos("B") && pos("B") < pos("C"));
    }
    seen.lock().clear();

    ctx.variables().set("input", 5).unwrap();
    engine.recalculate(&["a"]).unwrap();
    assert_eq!(engine.result_as::<i32>("B").unwrap(), 6);
    assert_eq!(engine.result_as::<i32>("C").unwrap(), 12);
    assert_eq!(*seen.lock(), vec!["A", "B", "C"]);

    // D was not recalculated, so it still holds the old input.
    assert_eq!(engine.result("D").unwrap(), Value::Int32(100));
}

#[test]
fn graph_queries() {
    let ctx = context();
    let mut engine = CalculationEngine::new();
    engine.add("a", "1", &ctx).unwrap();
    engine.add("b", "a + 1", &ctx).unwrap();
    engine.add("c", "a + b", &ctx).unwrap();

    assert_eq!(engine.count(), 3);
    assert_eq!(engine.dependents("a"), vec!["b", "c"]);
    assert_eq!(engine.precedents("c"), vec!["a", "b"]);
    assert!(engine.has_precedents("b"));
    assert!(!engine.has_dependents("c"));
    assert_eq!(engine.dependency_graph(), "a -> b,c\nb -> c\nc -> <empty>\n");

    // Removing an entry removes everything that reads it.
    assert!(engine.remove("b"));
    assert!(!engine.contains("c"));
    assert_eq!(engine.count(), 1);
}

#[test]
fn entries_must_exist_and_be_unique() {
    let ctx = context();
    let mut engine = CalculationEngine::new();
    let err = engine.add("x", "y", &ctx).unwrap_err();
    assert!(
        matches!(&err, CalcError::Compile { source, .. } if source.reason() == CompileErrorReason::UndefinedName),
        "{err:?}"
    );
    assert_eq!(engine.count(), 0);

    engine.add("x", "1", &ctx).unwrap();
    assert_eq!(
        engine.add("X", "2", &ctx).unwrap_err(),
        CalcError::DuplicateName("X".to_string())
    );
    assert_eq!(
        engine.add("z", "z + 1", &ctx).unwrap_err(),
        CalcError::CircularReference {
            at: Some("z".to_string())
        }
    );
    assert!(!engine.contains("z"));
}

#[test]
fn typed_results() {
    let ctx = context();
    let mut engine = CalculationEngine::new();
    engine.add("rate", "0.25", &ctx).unwrap();
    engine.recalculate(&[]).unwrap();

    assert_eq!(engine.result_as::<f64>("rate").unwrap(), 0.25);
    assert!(matches!(
        engine.result_as::<i32>("rate"),
        Err(CalcError::ResultTypeMismatch { .. })
    ));
    assert_eq!(
        engine.result("missing"),
        Err(CalcError::UnknownName("missing".to_string()))
    );
}

#[test]
fn batch_load_orders_entries() {
    let ctx = context();
    ctx.variables().add("qty", 4).unwrap();

    let mut engine = CalculationEngine::new();
    let mut loader = engine.batch_loader();
    loader.add("total", "subtotal + tax", &ctx).unwrap();
    loader.add("tax", "subtotal / 10", &ctx).unwrap();
    loader.add("subtotal", "price * qty", &ctx).unwrap();
    loader.add("price", "25", &ctx).unwrap();

    engine.batch_load(&loader).unwrap();
    assert_eq!(engine.count(), 4);
    engine.recalculate(&[]).unwrap();
    assert_eq!(engine.result("total").unwrap(), Value::Int32(110));
}

#[test]
fn batch_cycles_leave_the_engine_empty() {
    let ctx = context();
    let mut engine = CalculationEngine::new();
    engine.add("existing", "1", &ctx).unwrap();

    let mut loader = engine.batch_loader();
    loader.add("X", "Y", &ctx).unwrap();
    loader.add("Y", "X", &ctx).unwrap();

    assert!(matches!(
        engine.batch_load(&loader),
        Err(CalcError::CircularReference { .. })
    ));
    assert_eq!(engine.count(), 0);
    assert!(!engine.contains("X"));
    assert!(!engine.contains("Y"));
}

#[test]
fn batch_compile_errors_name_the_entry() {
    let ctx = context();
    let mut engine = CalculationEngine::new();
    let mut loader = engine.batch_loader();
    loader.add("a", "1", &ctx).unwrap();
    loader.add("b", "a + true", &ctx).unwrap();

    match engine.batch_load(&loader) {
        Err(CalcError::BatchLoadCompile { atom, text, source }) => {
            assert_eq!(atom, "b");
            assert_eq!(text, "a + true");
            assert_eq!(source.reason(), CompileErrorReason::TypeMismatch);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(engine.count(), 0);
}

#[test]
fn failing_entries_still_join_the_engine() {
    let ctx = context();
    ctx.variables().add("x", 0).unwrap();

    let mut engine = CalculationEngine::new();
    engine.add("ratio", "10 / x", &ctx).unwrap();
    assert!(engine.contains("ratio"));
    assert_eq!(engine.result("ratio").unwrap(), Value::Null);

    let mut loader = engine.batch_loader();
    loader.add("a", "1", &ctx).unwrap();
    loader.add("b", "a / x", &ctx).unwrap();
    engine.batch_load(&loader).unwrap();
    assert_eq!(engine.count(), 2);
    assert_eq!(engine.dependents("a"), vec!["b"]);
}

#[test]
fn recalculation_stops_at_the_first_failure() {
    let ctx = context();
    ctx.variables().add("input", 1).unwrap();

    let mut engine = CalculationEngine::new();
    engine.add("a", "input", &ctx).unwrap();
    engine.add("b", "10 / a", &ctx).unwrap();
    engine.add("c", "b + 1", &ctx).unwrap();
    let seen = record(&mut engine);

    engine.recalculate(&[]).unwrap();
    assert_eq!(engine.result("c").unwrap(), Value::Int32(11));
    seen.lock().clear();

    ctx.variables().set("input", 0).unwrap();
    match engine.recalculate(&["a"]) {
        Err(CalcError::Eval { name, source }) => {
            assert_eq!(name, "b");
            assert_eq!(source, EvalError::DivideByZero);
        }
        other => panic!("unexpected {other:?}"),
    }

    // `a` was recomputed before the failure; `b` and `c` keep their values.
    assert_eq!(engine.result("a").unwrap(), Value::Int32(0));
    assert_eq!(engine.result("b").unwrap(), Value::Int32(10));
    assert_eq!(engine.result("c").unwrap(), Value::Int32(11));
    assert_eq!(*seen.lock(), vec!["a"]);
}

#[test]
fn simple_engine_evaluates_on_read() {
    let ctx = context();
    ctx.variables().add("base", 2.0).unwrap();

    let mut engine = SimpleCalcEngine::new(ctx.clone_context(false));
    engine.add_dynamic("area", "base * base").unwrap();
    let doubled = engine.add_generic::<f64>("doubled", "area * 2").unwrap();
    assert_eq!(doubled.evaluate().unwrap(), 8.0);

    // Linked contexts copy the variables they were created with.
    engine.context().variables().set("base", 3.0).unwrap();
    assert_eq!(doubled.evaluate().unwrap(), 8.0);

    let tripled = engine.add_generic::<f64>("tripled", "area * 3").unwrap();
    assert_eq!(tripled.evaluate().unwrap(), 12.0);
}
