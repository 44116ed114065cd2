//! Identifier chains: `a`, `a.b`, `a.f(x)`, `a[i]` and any mix of them.
//!
//! A chain is flattened into an optional head (any expression that is not
//! part of the chain, such as a parenthesized expression or a literal) and
//! a list of links. Without a head, leading identifiers that name import
//! namespaces are consumed first, so `Math.Max(1, 2)` and `Color.Red`
//! resolve against the imported type.
//!
//! The first link then resolves in this order:
//!
//! 1. Fields and properties of the expression owner, then of the root
//!    imports (accessible members only)
//! 2. Variables
//! 3. Other entries of the calculation engine, when one is attached
//!
//! Calls look at owner methods, then imported methods, then functions the
//! variable resolver supplies on demand. Later links resolve against the
//! type of the previous link, falling back to virtual properties.

use flee_core::{
    CompileErrorReason, MemberKinds, MemberRef, MessageKey, NativeFn, Span, TypeHash, primitives,
};
use flee_parser::ast::{CallExpr, Expr, Ident, IndexExpr};

use super::{ExprCompiler, Result};
use crate::bytecode::CallTarget;
use crate::elements::Element;
use crate::imports::Import;
use crate::overload::{Candidate, OverloadError, resolve_overload};

/// One step of a chain after the head.
#[derive(Debug, Clone, Copy)]
enum Link<'ast> {
    Ident(Ident<'ast>),
    Call(&'ast CallExpr<'ast>),
    Index(&'ast IndexExpr<'ast>),
}

/// Where the members of the first link are looked up.
#[derive(Clone, Copy)]
enum FirstScope<'a> {
    /// Owner members, root imports, variables and engine entries.
    Global,
    /// Static members of an import namespace.
    Import(&'a Import),
}

/// A member found for a link, with the type it was found on.
#[derive(Clone, Copy)]
struct Found<'a> {
    member: MemberRef<'a>,
    reflected: TypeHash,
    /// Found among the expression owner's members.
    on_owner: bool,
}

pub(super) fn build_chain(compiler: &mut ExprCompiler<'_, '_>, expr: &Expr<'_>) -> Result<Element> {
    let mut links = Vec::new();
    let head = flatten(*expr, &mut links);

    let (mut element, rest) = match head {
        Some(head) => (compiler.build(&head)?, &links[..]),
        None => {
            let (scope, consumed) = consume_namespaces(compiler, &links);
            let Some((first, rest)) = links[consumed..].split_first() else {
                let name = links[..consumed]
                    .iter()
                    .filter_map(|link| match link {
                        Link::Ident(ident) => Some(ident.name),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                return Err(compiler.error(
                    CompileErrorReason::TypeMismatch,
                    expr.span(),
                    MessageKey::NamespaceCannotBeUsedAsType,
                    &[&name],
                ));
            };
            (build_first(compiler, scope, *first)?, rest)
        }
    };

    for link in rest {
        element = match *link {
            Link::Ident(ident) => build_member(compiler, element, ident)?,
            Link::Call(call) => build_method_call(compiler, element, call)?,
            Link::Index(index) => build_index(compiler, element, index)?,
        };
    }
    Ok(element)
}

/// Collect the links of `expr` in evaluation order and return the head.
fn flatten<'ast>(expr: Expr<'ast>, links: &mut Vec<Link<'ast>>) -> Option<Expr<'ast>> {
    match expr {
        Expr::Ident(ident) => {
            links.push(Link::Ident(ident));
            None
        }
        Expr::Member(member) => {
            let head = flatten(*member.object, links);
            links.push(Link::Ident(member.member));
            head
        }
        Expr::Call(call) => {
            let head = call.target.and_then(|target| flatten(*target, links));
            links.push(Link::Call(call));
            head
        }
        Expr::Index(index) => {
            let head = flatten(*index.object, links);
            links.push(Link::Index(index));
            head
        }
        other => Some(other),
    }
}

/// Walk leading identifiers through the import namespaces.
fn consume_namespaces<'a>(
    compiler: &ExprCompiler<'_, 'a>,
    links: &[Link<'_>],
) -> (FirstScope<'a>, usize) {
    let case_sensitive = compiler.scope().case_sensitive();
    let mut current = compiler.scope().imports.root();
    let mut consumed = 0;
    for link in links {
        let Link::Ident(ident) = link else {
            break;
        };
        match current.find_import(ident.name, case_sensitive) {
            Some(next) => {
                current = next;
                consumed += 1;
            }
            None => break,
        }
    }

    if consumed == 0 {
        (FirstScope::Global, 0)
    } else {
        (FirstScope::Import(current), consumed)
    }
}

// ============================================================================
// First link
// ============================================================================

fn build_first(compiler: &mut ExprCompiler<'_, '_>, scope: FirstScope<'_>, link: Link<'_>) -> Result<Element> {
    match link {
        Link::Ident(ident) => build_first_ident(compiler, scope, ident),
        Link::Call(call) => build_function_call(compiler, scope, call),
        Link::Index(index) => {
            let name = match scope {
                FirstScope::Import(import) => import.name().to_string(),
                FirstScope::Global => String::new(),
            };
            Err(compiler.error(
                CompileErrorReason::TypeMismatch,
                index.span,
                MessageKey::TypeCannotBeUsedAsAnExpression,
                &[&name],
            ))
        }
    }
}

fn build_first_ident(
    compiler: &mut ExprCompiler<'_, '_>,
    scope: FirstScope<'_>,
    ident: Ident<'_>,
) -> Result<Element> {
    let kinds = MemberKinds::DATA.with_case(compiler.scope().case_sensitive());

    let found = match scope {
        FirstScope::Import(import) => {
            let found = import_members(compiler, import, ident.name, kinds);
            if found.is_empty() {
                return Err(compiler.error(
                    CompileErrorReason::UndefinedName,
                    ident.span,
                    MessageKey::NoIdentifierWithNameOnType,
                    &[&ident.name, &import.name()],
                ));
            }
            found
        }
        FirstScope::Global => {
            let mut found = owner_members(compiler, ident.name, kinds);
            if found.is_empty() {
                found = import_members(compiler, compiler.scope().imports.root(), ident.name, kinds);
            }
            if found.is_empty() {
                return build_external(compiler, ident);
            }
            found
        }
    };

    let [found] = found[..] else {
        return Err(compiler.error(
            CompileErrorReason::AmbiguousMatch,
            ident.span,
            MessageKey::IdentifierIsAmbiguous,
            &[&ident.name],
        ));
    };

    let instance = first_link_instance(compiler, found, ident.span)?;
    read_member(compiler, found.member, instance, ident.span)
}

/// Variables, then engine entries.
fn build_external(compiler: &ExprCompiler<'_, '_>, ident: Ident<'_>) -> Result<Element> {
    let externals = compiler.scope().externals;
    if let Some(ty) = externals.variable_type(ident.name) {
        return Ok(Element::Variable {
            name: ident.name.to_string(),
            ty,
        });
    }

    if externals.calc_engine_attached() {
        return match externals.calc_result_type(ident.name) {
            Some(ty) => Ok(Element::CalcReference {
                name: ident.name.to_string(),
                ty,
            }),
            None => Err(compiler.error(
                CompileErrorReason::UndefinedName,
                ident.span,
                MessageKey::CalcEngineDoesNotContainAtom,
                &[&ident.name],
            )),
        };
    }

    Err(compiler.error(
        CompileErrorReason::UndefinedName,
        ident.span,
        MessageKey::NoIdentifierWithName,
        &[&ident.name],
    ))
}

/// `f(args)` with no object in front.
fn build_function_call(
    compiler: &mut ExprCompiler<'_, '_>,
    scope: FirstScope<'_>,
    call: &CallExpr<'_>,
) -> Result<Element> {
    let args = build_args(compiler, call.args)?;
    let types: Vec<TypeHash> = args.iter().map(Element::result_type).collect();
    let kinds = MemberKinds::METHOD.with_case(compiler.scope().case_sensitive());
    let name = call.name.name;

    let found = match scope {
        FirstScope::Import(import) => import_members(compiler, import, name, kinds),
        FirstScope::Global => {
            let found = owner_members(compiler, name, kinds);
            if found.iter().any(|f| callable(f.member)) {
                found
            } else {
                import_members(compiler, compiler.scope().imports.root(), name, kinds)
            }
        }
    };
    let found: Vec<Found<'_>> = found.into_iter().filter(|f| callable(f.member)).collect();

    if found.is_empty() {
        if let FirstScope::Global = scope
            && let Some(ty) = compiler.scope().externals.function_type(name, &types)
        {
            return Ok(Element::ExternalCall {
                name: name.to_string(),
                args,
                ty,
            });
        }
        return Err(undefined_function(compiler, scope_name(scope), name, &types, call.span));
    }

    let candidates = found.iter().filter_map(|f| {
        let function = f.member.as_method()?;
        let accessible = is_accessible(compiler, *f);
        Some(Candidate::new(function, accessible))
    });
    let candidate = resolve_overload(candidates, &types, compiler.resolver())
        .map_err(|err| overload_error(compiler, err, scope_name(scope), name, &types, call.span))?;

    let chosen = found
        .iter()
        .copied()
        .find(|f| f.member.as_method().is_some_and(|m| std::ptr::eq(m, candidate.function)));
    let instance = match chosen {
        Some(found) => first_link_instance(compiler, found, call.span)?,
        None => None,
    };
    compiler.bind_call(candidate, instance, args, call.span)
}

/// Accessible data members or any methods of the expression owner.
fn owner_members<'a>(compiler: &ExprCompiler<'_, 'a>, name: &str, kinds: MemberKinds) -> Vec<Found<'a>> {
    let Some(owner) = compiler.scope().owner_type else {
        return Vec::new();
    };
    compiler
        .resolver()
        .find_members(owner, name, kinds)
        .into_iter()
        .map(|member| Found {
            member,
            reflected: owner,
            on_owner: true,
        })
        .filter(|f| f.member.as_method().is_some() || is_accessible(compiler, *f))
        .collect()
}

/// Accessible data members or any methods reachable through an import.
fn import_members<'a>(
    compiler: &ExprCompiler<'_, 'a>,
    import: &Import,
    name: &str,
    kinds: MemberKinds,
) -> Vec<Found<'a>> {
    import
        .find_members(name, kinds, compiler.resolver())
        .into_iter()
        .map(|(reflected, member)| Found {
            member,
            reflected,
            on_owner: false,
        })
        .filter(|f| f.member.as_method().is_some() || is_accessible(compiler, *f))
        .collect()
}

/// Instance for a first-link member: the owner for owner instance members.
fn first_link_instance(compiler: &ExprCompiler<'_, '_>, found: Found<'_>, span: Span) -> Result<Option<Element>> {
    if found.member.is_static() {
        return Ok(None);
    }
    if found.on_owner {
        return Ok(Some(Element::Owner { ty: found.reflected }));
    }
    Err(compiler.error(
        CompileErrorReason::TypeMismatch,
        span,
        MessageKey::ReferenceToNonSharedMemberRequiresObjectReference,
        &[&found.member.name()],
    ))
}

// ============================================================================
// Later links
// ============================================================================

/// `previous.name`
fn build_member(compiler: &mut ExprCompiler<'_, '_>, previous: Element, ident: Ident<'_>) -> Result<Element> {
    let ty = previous.result_type();
    let case_sensitive = compiler.scope().case_sensitive();
    let kinds = MemberKinds::DATA.with_case(case_sensitive);

    let found: Vec<Found<'_>> = compiler
        .resolver()
        .find_members(ty, ident.name, kinds)
        .into_iter()
        .map(|member| Found {
            member,
            reflected: ty,
            on_owner: false,
        })
        .filter(|f| is_accessible(compiler, *f))
        .collect();

    match found[..] {
        [] => {
            let Some(property) = compiler.resolver().find_virtual_property(ty, ident.name, case_sensitive) else {
                return Err(compiler.error(
                    CompileErrorReason::UndefinedName,
                    ident.span,
                    MessageKey::NoIdentifierWithNameOnType,
                    &[&ident.name, &compiler.type_name(ty)],
                ));
            };
            Ok(Element::MemberRead {
                instance: Some(Box::new(previous)),
                getter: CallTarget::new(property.name.clone(), property.getter.clone(), true, 0),
                ty: property.ty,
            })
        }
        [found] => {
            if found.member.is_static() {
                return Err(static_through_instance(compiler, found.member, ident.span));
            }
            read_member(compiler, found.member, Some(previous), ident.span)
        }
        _ => Err(compiler.error(
            CompileErrorReason::AmbiguousMatch,
            ident.span,
            MessageKey::IdentifierIsAmbiguousOnType,
            &[&ident.name, &compiler.type_name(ty)],
        )),
    }
}

/// `previous.name(args)`
fn build_method_call(
    compiler: &mut ExprCompiler<'_, '_>,
    previous: Element,
    call: &CallExpr<'_>,
) -> Result<Element> {
    let ty = previous.result_type();
    let args = build_args(compiler, call.args)?;
    let types: Vec<TypeHash> = args.iter().map(Element::result_type).collect();
    let kinds = MemberKinds::METHOD.with_case(compiler.scope().case_sensitive());
    let name = call.name.name;
    let type_name = compiler.type_name(ty);

    let methods: Vec<Found<'_>> = compiler
        .resolver()
        .find_members(ty, name, kinds)
        .into_iter()
        .filter(|member| callable(*member))
        .map(|member| Found {
            member,
            reflected: ty,
            on_owner: false,
        })
        .collect();
    if methods.is_empty() {
        return Err(undefined_function(compiler, Some(&type_name), name, &types, call.span));
    }

    let candidates = methods.iter().filter_map(|f| {
        let function = f.member.as_method()?;
        Some(Candidate::new(function, is_accessible(compiler, *f)))
    });
    let candidate = resolve_overload(candidates, &types, compiler.resolver())
        .map_err(|err| overload_error(compiler, err, Some(&type_name), name, &types, call.span))?;

    if candidate.function.is_static {
        return Err(compiler.error(
            CompileErrorReason::TypeMismatch,
            call.span,
            MessageKey::StaticMemberCannotBeAccessedWithInstanceReference,
            &[&candidate.function.name],
        ));
    }
    compiler.bind_call(candidate, Some(previous), args, call.span)
}

/// `previous[indices]`
fn build_index(compiler: &mut ExprCompiler<'_, '_>, previous: Element, index: &IndexExpr<'_>) -> Result<Element> {
    let ty = previous.result_type();
    let mut indices = build_args(compiler, index.indices)?;

    if let Some(element_type) = compiler.resolver().array_element(ty) {
        if indices.len() != 1 {
            return Err(compiler.error(
                CompileErrorReason::TypeMismatch,
                index.span,
                MessageKey::MultiArrayIndexNotSupported,
                &[],
            ));
        }
        let position = indices.remove(0);
        let Some(position) = compiler.convert(position, primitives::INT32) else {
            return Err(compiler.error(
                CompileErrorReason::TypeMismatch,
                index.span,
                MessageKey::ArrayIndexersMustBeOfType,
                &[&"int"],
            ));
        };
        return Ok(Element::ArrayIndex {
            array: Box::new(previous),
            index: Box::new(position),
            ty: element_type,
        });
    }

    let types: Vec<TypeHash> = indices.iter().map(Element::result_type).collect();
    let resolver = compiler.resolver();
    let candidates = resolver
        .find_default_indexer_members(ty)
        .into_iter()
        .filter(|f| f.native.is_some())
        .map(|f| {
            let accessible = resolver.is_accessible(
                MemberRef::Method(f),
                ty,
                compiler.scope().owner_type,
                compiler.options().owner_member_access,
            );
            Candidate::new(f, accessible)
        });

    match resolve_overload(candidates, &types, resolver) {
        Ok(candidate) => compiler.bind_call(candidate, Some(previous), indices, index.span),
        Err(OverloadError::Ambiguous) => Err(compiler.error(
            CompileErrorReason::AmbiguousMatch,
            index.span,
            MessageKey::AmbiguousCallOfFunction,
            &[&"Indexer", &compiler.argument_list(&types)],
        )),
        Err(OverloadError::NoMatch | OverloadError::NoAccessible) => Err(compiler.error(
            CompileErrorReason::TypeMismatch,
            index.span,
            MessageKey::TypeNotArrayAndHasNoIndexerOfType,
            &[&compiler.type_name(ty), &compiler.argument_list(&types)],
        )),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn build_args(compiler: &mut ExprCompiler<'_, '_>, args: &[Expr<'_>]) -> Result<Vec<Element>> {
    args.iter().map(|arg| compiler.build(arg)).collect()
}

/// A method the evaluator can call.
fn callable(member: MemberRef<'_>) -> bool {
    member.as_method().is_some_and(|f| f.native.is_some())
}

fn is_accessible(compiler: &ExprCompiler<'_, '_>, found: Found<'_>) -> bool {
    compiler.resolver().is_accessible(
        found.member,
        found.reflected,
        compiler.scope().owner_type,
        compiler.options().owner_member_access,
    )
}

/// Read a field or property; literal fields become constants.
fn read_member(
    compiler: &ExprCompiler<'_, '_>,
    member: MemberRef<'_>,
    instance: Option<Element>,
    span: Span,
) -> Result<Element> {
    let getter: Option<NativeFn> = match member {
        MemberRef::Field(field) => {
            if let Some(value) = &field.constant {
                return Ok(Element::literal(value.clone(), field.ty));
            }
            field.getter.clone()
        }
        MemberRef::Property(property) => Some(property.getter.clone()),
        MemberRef::Method(_) => None,
    };
    let Some(getter) = getter else {
        return Err(compiler.error(
            CompileErrorReason::UndefinedName,
            span,
            MessageKey::NoIdentifierWithName,
            &[&member.name()],
        ));
    };

    Ok(Element::MemberRead {
        getter: CallTarget::new(member.name(), getter, instance.is_some(), 0),
        instance: instance.map(Box::new),
        ty: member.value_type(),
    })
}

fn static_through_instance(compiler: &ExprCompiler<'_, '_>, member: MemberRef<'_>, span: Span) -> flee_core::CompileError {
    compiler.error(
        CompileErrorReason::TypeMismatch,
        span,
        MessageKey::StaticMemberCannotBeAccessedWithInstanceReference,
        &[&member.name()],
    )
}

fn scope_name<'i>(scope: FirstScope<'i>) -> Option<&'i str> {
    match scope {
        FirstScope::Import(import) => Some(import.name()),
        FirstScope::Global => None,
    }
}

fn undefined_function(
    compiler: &ExprCompiler<'_, '_>,
    on: Option<&str>,
    name: &str,
    types: &[TypeHash],
    span: Span,
) -> flee_core::CompileError {
    let args = compiler.argument_list(types);
    match on {
        Some(on) => compiler.error(
            CompileErrorReason::UndefinedName,
            span,
            MessageKey::UndefinedFunctionOnType,
            &[&name, &args, &on],
        ),
        None => compiler.error(
            CompileErrorReason::UndefinedName,
            span,
            MessageKey::UndefinedFunction,
            &[&name, &args],
        ),
    }
}

fn overload_error(
    compiler: &ExprCompiler<'_, '_>,
    err: OverloadError,
    on: Option<&str>,
    name: &str,
    types: &[TypeHash],
    span: Span,
) -> flee_core::CompileError {
    match (err, on) {
        (OverloadError::NoMatch, _) => undefined_function(compiler, on, name, types, span),
        (OverloadError::NoAccessible, Some(on)) => compiler.error(
            CompileErrorReason::AccessDenied,
            span,
            MessageKey::NoAccessibleMatchesOnType,
            &[&name, &on],
        ),
        (OverloadError::NoAccessible, None) => compiler.error(
            CompileErrorReason::AccessDenied,
            span,
            MessageKey::NoAccessibleMatches,
            &[&name],
        ),
        (OverloadError::Ambiguous, _) => compiler.error(
            CompileErrorReason::AmbiguousMatch,
            span,
            MessageKey::AmbiguousCallOfFunction,
            &[&name, &compiler.argument_list(types)],
        ),
    }
}
