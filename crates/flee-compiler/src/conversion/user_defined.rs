//! User-defined implicit conversions.
//!
//! A host type opts into implicit conversions by registering a static
//! `op_Implicit(source) -> target` function on the source or the target
//! type. The operator may be surrounded by one standard conversion on each
//! side (`short -> int -> Money`).

use flee_core::{MemberKinds, SymbolResolver, TypeHash};

use crate::bytecode::CallTarget;

use super::{Conversion, ConversionKind, find_standard_conversion};

/// Name of the implicit conversion operator.
pub const OP_IMPLICIT: &str = "op_Implicit";

/// Find the best user-defined conversion from `from` to `to`.
///
/// Returns `None` if no operator applies or if two operators tie for the
/// lowest cost.
pub fn find_user_conversion(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    let mut best: Option<Conversion> = None;
    let mut tied = false;

    let owners: &[TypeHash] = if from == to { &[from] } else { &[from, to] };
    for &owner in owners {
        for member in resolver.find_members(owner, OP_IMPLICIT, MemberKinds::METHOD) {
            let Some(function) = member.as_method() else {
                continue;
            };
            if !function.is_static || function.params.len() != 1 {
                continue;
            }
            let Some(native) = &function.native else {
                continue;
            };

            let Some(pre) = find_standard_conversion(from, function.params[0].ty, resolver) else {
                continue;
            };
            let Some(post) = find_standard_conversion(function.return_type, to, resolver) else {
                continue;
            };

            let cost = Conversion::COST_USER_CONVERSION + post.cost;
            let candidate = Conversion {
                kind: ConversionKind::User {
                    function: CallTarget::new(&function.name, native.clone(), false, 1),
                    pre: Box::new(pre),
                    post: Box::new(post),
                },
                cost,
                is_implicit: true,
            };

            let replace = match &best {
                None => true,
                Some(current) if current.kind == candidate.kind => false,
                Some(current) if current.cost == cost => {
                    tied = true;
                    false
                }
                Some(current) => cost < current.cost,
            };
            if replace {
                best = Some(candidate);
                tied = false;
            }
        }
    }

    if tied { None } else { best }
}
