//! Overload resolution for function calls.
//!
//! This module selects the best matching function from a set of candidates
//! based on argument types and conversion costs.
//!
//! ## Algorithm
//!
//! 1. Match each candidate against the argument types, directly or by
//!    collecting trailing arguments into its parameter array
//! 2. Score each match: the sum of the argument conversion costs divided by
//!    the argument count (integer division); parameter array matches add 1
//! 3. Rank candidates by score, drop the inaccessible ones and select the
//!    best match
//! 4. Report an ambiguity when another candidate ties with the best

mod operators;
mod ranking;

pub use operators::{OperatorCache, OperatorError, binary_operator_name, unary_operator_name};
pub use ranking::find_best_match;

use flee_core::{FunctionEntry, SymbolResolver, TypeHash};

use crate::conversion::{Conversion, find_conversion};

/// How trailing arguments bind to a parameter array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamArrayMatch {
    /// Number of arguments bound to the fixed parameters.
    pub fixed: usize,
    /// Element type the remaining arguments were converted to.
    pub element: TypeHash,
}

/// A function considered for a call.
#[derive(Debug, Clone)]
pub struct Candidate<'r> {
    /// The function.
    pub function: &'r FunctionEntry,
    /// Whether the call site may use the function.
    pub accessible: bool,
    /// Match score, lower is better. Only meaningful after a match.
    pub score: f64,
    /// Set when the match collected arguments into the parameter array.
    pub param_array: Option<ParamArrayMatch>,
    /// Conversion for each argument; tail arguments convert to the element.
    pub conversions: Vec<Conversion>,
}

impl<'r> Candidate<'r> {
    pub fn new(function: &'r FunctionEntry, accessible: bool) -> Self {
        Self {
            function,
            accessible,
            score: 0.0,
            param_array: None,
            conversions: Vec::new(),
        }
    }

    /// Try to match the argument types, recording score and conversions.
    pub fn is_match(&mut self, args: &[TypeHash], resolver: &dyn SymbolResolver) -> bool {
        let params = &self.function.params;

        if params.is_empty() && args.is_empty() {
            self.score = 0.0;
            return true;
        }

        if params.len() == args.len() {
            let declared: Vec<TypeHash> = self.function.param_types().collect();
            if let Some(conversions) = convert_all(args, &declared, resolver) {
                self.score = average_cost(&conversions, args.len()) as f64;
                self.conversions = conversions;
                self.param_array = None;
                return true;
            }
        }

        if let Some(element) = params.last().and_then(|p| p.variadic_element) {
            let fixed = params.len() - 1;
            if args.len() < fixed {
                return false;
            }

            let mut targets: Vec<TypeHash> = params[..fixed].iter().map(|p| p.ty).collect();
            targets.extend(std::iter::repeat_n(element, args.len() - fixed));
            let Some(conversions) = convert_all(args, &targets, resolver) else {
                return false;
            };

            self.score = average_cost(&conversions, args.len()) as f64 + 1.0;
            self.conversions = conversions;
            self.param_array = Some(ParamArrayMatch { fixed, element });
            return true;
        }

        false
    }
}

fn convert_all(
    args: &[TypeHash],
    targets: &[TypeHash],
    resolver: &dyn SymbolResolver,
) -> Option<Vec<Conversion>> {
    args.iter()
        .zip(targets)
        .map(|(&arg, &target)| find_conversion(arg, target, resolver))
        .collect()
}

fn average_cost(conversions: &[Conversion], arg_count: usize) -> u32 {
    if arg_count == 0 {
        return 0;
    }
    let total: u32 = conversions.iter().map(|c| c.cost).sum();
    total / arg_count as u32
}

/// Why overload resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadError {
    /// No candidate accepts the arguments.
    NoMatch,
    /// Matching candidates exist but none is accessible.
    NoAccessible,
    /// Two accessible candidates tie for the best score.
    Ambiguous,
}

/// Resolve a call: match every candidate, then rank the matches.
pub fn resolve_overload<'r>(
    candidates: impl IntoIterator<Item = Candidate<'r>>,
    args: &[TypeHash],
    resolver: &dyn SymbolResolver,
) -> Result<Candidate<'r>, OverloadError> {
    let matched: Vec<Candidate<'r>> = candidates
        .into_iter()
        .filter_map(|mut candidate| candidate.is_match(args, resolver).then_some(candidate))
        .collect();
    find_best_match(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{CallContext, NativeError, Visibility, primitives};
    use flee_registry::SymbolRegistry;

    fn math() -> TypeHash {
        TypeHash::from_name("Math")
    }

    fn function(params: &[TypeHash]) -> FunctionEntry {
        let mut f = FunctionEntry::static_fn("F", math(), primitives::DOUBLE);
        for (i, ty) in params.iter().enumerate() {
            f = f.with_param(format!("p{i}"), *ty);
        }
        f
    }

    #[test]
    fn zero_arguments() {
        let registry = SymbolRegistry::with_builtins();
        let f = function(&[]);
        let mut candidate = Candidate::new(&f, true);
        assert!(candidate.is_match(&[], &registry));
        assert_eq!(candidate.score, 0.0);
        assert!(!candidate.is_match(&[primitives::INT32], &registry));
    }

    #[test]
    fn score_uses_integer_division() {
        let registry = SymbolRegistry::with_builtins();
        let f = function(&[primitives::INT64, primitives::INT32]);
        let mut candidate = Candidate::new(&f, true);
        // int -> long costs 2, int -> int costs 0: 2 / 2 = 1
        assert!(candidate.is_match(&[primitives::INT32, primitives::INT32], &registry));
        assert_eq!(candidate.score, 1.0);

        let f = function(&[primitives::INT64, primitives::INT32, primitives::INT32]);
        let mut candidate = Candidate::new(&f, true);
        // 2 / 3 = 0
        assert!(candidate.is_match(
            &[primitives::INT32, primitives::INT32, primitives::INT32],
            &registry
        ));
        assert_eq!(candidate.score, 0.0);
    }

    #[test]
    fn param_array_matching() {
        let registry = SymbolRegistry::with_builtins();
        let sum = FunctionEntry::static_fn("Sum", math(), primitives::DOUBLE)
            .with_param("first", primitives::DOUBLE)
            .with_variadic("rest", primitives::DOUBLE);

        let mut candidate = Candidate::new(&sum, true);
        assert!(candidate.is_match(
            &[primitives::DOUBLE, primitives::DOUBLE, primitives::DOUBLE],
            &registry
        ));
        assert_eq!(
            candidate.param_array,
            Some(ParamArrayMatch {
                fixed: 1,
                element: primitives::DOUBLE
            })
        );
        assert_eq!(candidate.score, 1.0);
        assert_eq!(candidate.conversions.len(), 3);

        // Only the fixed parameter: an empty array.
        let mut candidate = Candidate::new(&sum, true);
        assert!(candidate.is_match(&[primitives::DOUBLE], &registry));
        assert_eq!(candidate.param_array.map(|m| m.fixed), Some(1));

        // An array argument binds directly.
        let mut candidate = Candidate::new(&sum, true);
        let doubles = TypeHash::array_of(primitives::DOUBLE);
        assert!(candidate.is_match(&[primitives::DOUBLE, doubles], &registry));
        assert_eq!(candidate.param_array, None);

        let mut candidate = Candidate::new(&sum, true);
        assert!(!candidate.is_match(&[], &registry));
    }

    #[test]
    fn param_array_without_arguments_scores_one() {
        let registry = SymbolRegistry::with_builtins();
        let all = FunctionEntry::static_fn("All", math(), primitives::BOOL)
            .with_variadic("values", primitives::BOOL);
        let mut candidate = Candidate::new(&all, true);
        assert!(candidate.is_match(&[], &registry));
        assert_eq!(candidate.score, 1.0);
    }

    #[test]
    fn unique_best_wins() {
        let registry = SymbolRegistry::with_builtins();
        let ints = function(&[primitives::INT32]);
        let doubles = function(&[primitives::DOUBLE]);
        let best = resolve_overload(
            [Candidate::new(&doubles, true), Candidate::new(&ints, true)],
            &[primitives::INT16],
            &registry,
        )
        .unwrap();
        assert_eq!(best.function.params[0].ty, primitives::INT32);
    }

    #[test]
    fn ties_are_ambiguous() {
        let mut registry = SymbolRegistry::with_builtins();
        let a = TypeHash::from_name("A");
        let b = TypeHash::from_name("B");
        let c = TypeHash::from_name("C");
        let convert = |ctx: &mut CallContext<'_>| -> Result<(), NativeError> {
            ctx.set_return(ctx.arg(0)?.clone());
            Ok(())
        };
        registry.register_class("C").build().unwrap();
        registry
            .register_class("A")
            .implicit_conversion(c, a, convert)
            .build()
            .unwrap();
        registry
            .register_class("B")
            .implicit_conversion(c, b, convert)
            .build()
            .unwrap();

        let take_a = function(&[a]);
        let take_b = function(&[b]);
        let result = resolve_overload(
            [Candidate::new(&take_a, true), Candidate::new(&take_b, true)],
            &[c],
            &registry,
        );
        assert_eq!(result.unwrap_err(), OverloadError::Ambiguous);
    }

    #[test]
    fn inaccessible_and_missing() {
        let registry = SymbolRegistry::with_builtins();
        let private = function(&[primitives::INT32]).with_visibility(Visibility::Private);
        let result = resolve_overload(
            [Candidate::new(&private, false)],
            &[primitives::INT32],
            &registry,
        );
        assert_eq!(result.unwrap_err(), OverloadError::NoAccessible);

        let result = resolve_overload(
            [Candidate::new(&private, false)],
            &[primitives::STRING],
            &registry,
        );
        assert_eq!(result.unwrap_err(), OverloadError::NoMatch);
    }
}
