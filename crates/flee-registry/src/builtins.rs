//! Built-in types: primitives, `object`, `string` and `Math`.

use flee_core::{
    CallContext, ClassEntry, FunctionEntry, NativeError, NativeFn, SymbolResolver, TypeHash, Value,
    primitives,
};

use crate::SymbolRegistry;

type NativeResult = Result<(), NativeError>;

/// Register every built-in type and the framework-style aliases for them.
pub fn register_builtins(registry: &mut SymbolRegistry) {
    if registry.get_type(primitives::STRING).is_some() {
        return;
    }

    let to_string = FunctionEntry::new("ToString", primitives::OBJECT, primitives::STRING)
        .with_native(NativeFn::new(|ctx: &mut CallContext<'_>| -> NativeResult {
            let text = ctx.this()?.to_string();
            ctx.set_return(text);
            Ok(())
        }));
    let _ = registry.register_type(ClassEntry::global("object").with_method(to_string));
    registry.register_all_primitives();
    register_string(registry);
    register_math(registry);
    register_aliases(registry);
}

fn this_str<'a>(ctx: &CallContext<'a>) -> Result<&'a str, NativeError> {
    ctx.this()?.as_str().ok_or(NativeError::InvalidThis)
}

fn register_string(registry: &mut SymbolRegistry) {
    use primitives::{BOOL, INT32, STRING};

    let _ = registry
        .register_class("string")
        .property("Length", INT32, |ctx: &mut CallContext<'_>| -> NativeResult {
            let len = this_str(ctx)?.chars().count() as i32;
            ctx.set_return(len);
            Ok(())
        })
        .method("ToUpper", STRING, &[], |ctx: &mut CallContext<'_>| -> NativeResult {
            let upper = this_str(ctx)?.to_uppercase();
            ctx.set_return(upper);
            Ok(())
        })
        .method("ToLower", STRING, &[], |ctx: &mut CallContext<'_>| -> NativeResult {
            let lower = this_str(ctx)?.to_lowercase();
            ctx.set_return(lower);
            Ok(())
        })
        .method("Trim", STRING, &[], |ctx: &mut CallContext<'_>| -> NativeResult {
            let trimmed = this_str(ctx)?.trim().to_string();
            ctx.set_return(trimmed);
            Ok(())
        })
        .method("Contains", BOOL, &[STRING], |ctx: &mut CallContext<'_>| -> NativeResult {
            let needle: String = ctx.arg_as(0)?;
            let found = this_str(ctx)?.contains(needle.as_str());
            ctx.set_return(found);
            Ok(())
        })
        .method("StartsWith", BOOL, &[STRING], |ctx: &mut CallContext<'_>| -> NativeResult {
            let prefix: String = ctx.arg_as(0)?;
            let found = this_str(ctx)?.starts_with(prefix.as_str());
            ctx.set_return(found);
            Ok(())
        })
        .method("EndsWith", BOOL, &[STRING], |ctx: &mut CallContext<'_>| -> NativeResult {
            let suffix: String = ctx.arg_as(0)?;
            let found = this_str(ctx)?.ends_with(suffix.as_str());
            ctx.set_return(found);
            Ok(())
        })
        .method("Substring", STRING, &[INT32], |ctx: &mut CallContext<'_>| -> NativeResult {
            let start: i32 = ctx.arg_as(0)?;
            let text = this_str(ctx)?;
            let count = text.chars().count() as i32;
            let sub = substring(text, start, count - start)?;
            ctx.set_return(sub);
            Ok(())
        })
        .method(
            "Substring",
            STRING,
            &[INT32, INT32],
            |ctx: &mut CallContext<'_>| -> NativeResult {
                let start: i32 = ctx.arg_as(0)?;
                let length: i32 = ctx.arg_as(1)?;
                let sub = substring(this_str(ctx)?, start, length)?;
                ctx.set_return(sub);
                Ok(())
            },
        )
        .static_method(
            "Concat",
            STRING,
            &[STRING, STRING],
            |ctx: &mut CallContext<'_>| -> NativeResult {
                let a: String = ctx.arg_as(0)?;
                let b: String = ctx.arg_as(1)?;
                ctx.set_return(a + &b);
                Ok(())
            },
        )
        .build();
}

/// Character based substring with range checks.
fn substring(text: &str, start: i32, length: i32) -> Result<String, NativeError> {
    let count = text.chars().count() as i32;
    if start < 0 || length < 0 || start + length > count {
        return Err(NativeError::other(format!(
            "substring ({start}, {length}) is out of range for a string of length {count}"
        )));
    }
    Ok(text
        .chars()
        .skip(start as usize)
        .take(length as usize)
        .collect())
}

fn register_math(registry: &mut SymbolRegistry) {
    use primitives::{DOUBLE, INT32, INT64};

    fn unary(f: fn(f64) -> f64) -> impl Fn(&mut CallContext<'_>) -> NativeResult {
        move |ctx: &mut CallContext<'_>| {
            let x: f64 = ctx.arg_as(0)?;
            ctx.set_return(f(x));
            Ok(())
        }
    }

    let _ = registry
        .register_class("Math")
        .literal("PI", DOUBLE, Value::Double(std::f64::consts::PI))
        .literal("E", DOUBLE, Value::Double(std::f64::consts::E))
        .static_method("Abs", INT32, &[INT32], |ctx: &mut CallContext<'_>| -> NativeResult {
            let x: i32 = ctx.arg_as(0)?;
            ctx.set_return(x.wrapping_abs());
            Ok(())
        })
        .static_method("Abs", INT64, &[INT64], |ctx: &mut CallContext<'_>| -> NativeResult {
            let x: i64 = ctx.arg_as(0)?;
            ctx.set_return(x.wrapping_abs());
            Ok(())
        })
        .static_method("Abs", DOUBLE, &[DOUBLE], unary(f64::abs))
        .static_method("Max", INT32, &[INT32, INT32], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (i32, i32) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.max(b));
            Ok(())
        })
        .static_method("Max", INT64, &[INT64, INT64], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (i64, i64) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.max(b));
            Ok(())
        })
        .static_method("Max", DOUBLE, &[DOUBLE, DOUBLE], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (f64, f64) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.max(b));
            Ok(())
        })
        .static_method("Min", INT32, &[INT32, INT32], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (i32, i32) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.min(b));
            Ok(())
        })
        .static_method("Min", INT64, &[INT64, INT64], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (i64, i64) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.min(b));
            Ok(())
        })
        .static_method("Min", DOUBLE, &[DOUBLE, DOUBLE], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (f64, f64) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.min(b));
            Ok(())
        })
        .static_method("Pow", DOUBLE, &[DOUBLE, DOUBLE], |ctx: &mut CallContext<'_>| -> NativeResult {
            let (a, b): (f64, f64) = (ctx.arg_as(0)?, ctx.arg_as(1)?);
            ctx.set_return(a.powf(b));
            Ok(())
        })
        .static_method("Sqrt", DOUBLE, &[DOUBLE], unary(f64::sqrt))
        .static_method("Floor", DOUBLE, &[DOUBLE], unary(f64::floor))
        .static_method("Ceiling", DOUBLE, &[DOUBLE], unary(f64::ceil))
        .static_method("Round", DOUBLE, &[DOUBLE], unary(f64::round_ties_even))
        .static_method("Sin", DOUBLE, &[DOUBLE], unary(f64::sin))
        .static_method("Cos", DOUBLE, &[DOUBLE], unary(f64::cos))
        .static_method("Log", DOUBLE, &[DOUBLE], unary(f64::ln))
        .build();
}

fn register_aliases(registry: &mut SymbolRegistry) {
    let aliases: [(&str, TypeHash); 15] = [
        ("Boolean", primitives::BOOL),
        ("Char", primitives::CHAR),
        ("SByte", primitives::SBYTE),
        ("Byte", primitives::BYTE),
        ("Int16", primitives::INT16),
        ("UInt16", primitives::UINT16),
        ("Int32", primitives::INT32),
        ("UInt32", primitives::UINT32),
        ("Int64", primitives::INT64),
        ("UInt64", primitives::UINT64),
        ("Single", primitives::FLOAT),
        ("Double", primitives::DOUBLE),
        ("String", primitives::STRING),
        ("Object", primitives::OBJECT),
        ("Math", TypeHash::from_name("Math")),
    ];
    for (alias, target) in aliases {
        let _ = registry.register_alias(format!("System.{alias}"), target);
        if alias != "Math" {
            let _ = registry.register_alias(alias, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::MemberKinds;

    fn call(registry: &SymbolRegistry, owner: TypeHash, name: &str, this: Option<&Value>, args: &[Value]) -> Value {
        let params: Vec<TypeHash> = args.iter().map(Value::type_hash).collect();
        let members = registry.find_members(owner, name, MemberKinds::METHOD);
        let method = members
            .iter()
            .filter_map(|m| m.as_method())
            .find(|m| m.param_types().eq(params.iter().copied()))
            .unwrap();
        method.native.as_ref().unwrap().invoke(this, args).unwrap()
    }

    #[test]
    fn registering_twice_is_harmless() {
        let mut registry = SymbolRegistry::with_builtins();
        let count = registry.type_count();
        register_builtins(&mut registry);
        assert_eq!(registry.type_count(), count);
    }

    #[test]
    fn string_methods() {
        let registry = SymbolRegistry::with_builtins();
        let s = Value::string("Hello World");
        assert_eq!(call(&registry, primitives::STRING, "ToUpper", Some(&s), &[]), Value::string("HELLO WORLD"));
        assert_eq!(
            call(&registry, primitives::STRING, "Contains", Some(&s), &[Value::string("lo W")]),
            Value::Bool(true)
        );
        assert_eq!(
            call(&registry, primitives::STRING, "Substring", Some(&s), &[Value::Int32(6)]),
            Value::string("World")
        );
        assert_eq!(
            call(&registry, primitives::STRING, "Substring", Some(&s), &[Value::Int32(0), Value::Int32(5)]),
            Value::string("Hello")
        );
        assert_eq!(call(&registry, primitives::STRING, "ToString", Some(&s), &[]), Value::string("Hello World"));
    }

    #[test]
    fn substring_out_of_range() {
        assert!(substring("abc", 2, 5).is_err());
        assert!(substring("abc", -1, 1).is_err());
        assert_eq!(substring("abc", 1, 2).unwrap(), "bc");
    }

    #[test]
    fn math_overloads() {
        let registry = SymbolRegistry::with_builtins();
        let math = TypeHash::from_name("Math");
        assert_eq!(registry.find_members(math, "Max", MemberKinds::METHOD).len(), 3);
        assert_eq!(call(&registry, math, "Max", None, &[Value::Int32(3), Value::Int32(9)]), Value::Int32(9));
        assert_eq!(call(&registry, math, "Sqrt", None, &[Value::Double(16.0)]), Value::Double(4.0));
        let pi = registry.find_members(math, "PI", MemberKinds::DATA);
        assert!(matches!(pi[0], flee_core::MemberRef::Field(f) if f.is_literal()));
    }

    #[test]
    fn framework_names() {
        let registry = SymbolRegistry::with_builtins();
        assert_eq!(registry.lookup_type("System.Math", true).unwrap().type_hash(), TypeHash::from_name("Math"));
        assert_eq!(registry.lookup_type("int32", false).unwrap().type_hash(), primitives::INT32);
    }
}
