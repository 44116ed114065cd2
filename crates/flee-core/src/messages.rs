//! User-facing message templates.
//!
//! Compile errors are built from templates with positional placeholders
//! (`{0}`, `{1}`, ...). A [`MessageCatalog`] is handed to the compiler through
//! its scope, so hosts can replace individual templates (for example to
//! localise them) without any global state.

use std::borrow::Cow;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::Span;
use crate::error::{CompileError, CompileErrorReason};

/// Identifies one message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    CouldNotResolveType,
    CannotConvertType,
    FirstArgNotBoolean,
    NeitherArgIsConvertibleToTheOther,
    ValueNotRepresentableInType,
    SearchArgIsNotKnownCollectionType,
    OperandNotConvertibleToCollectionType,
    TypeNotArrayAndHasNoIndexerOfType,
    ArrayIndexersMustBeOfType,
    MultiArrayIndexNotSupported,
    AmbiguousCallOfFunction,
    NamespaceCannotBeUsedAsType,
    TypeCannotBeUsedAsAnExpression,
    StaticMemberCannotBeAccessedWithInstanceReference,
    ReferenceToNonSharedMemberRequiresObjectReference,
    FunctionHasNoReturnValue,
    OperationNotDefinedForType,
    OperationNotDefinedForTypes,
    CannotConvertTypeToExpressionResult,
    AmbiguousOverloadedOperator,
    NoIdentifierWithName,
    NoIdentifierWithNameOnType,
    IdentifierIsAmbiguous,
    IdentifierIsAmbiguousOnType,
    CalcEngineDoesNotContainAtom,
    UndefinedFunction,
    UndefinedFunctionOnType,
    NoAccessibleMatches,
    NoAccessibleMatchesOnType,
    InvalidExplicitCast,
    SyntaxError,
}

impl MessageKey {
    /// Built-in English template.
    pub fn default_template(self) -> &'static str {
        match self {
            MessageKey::CouldNotResolveType => "Could not resolve type '{0}'",
            MessageKey::CannotConvertType => "Cannot convert type '{0}' to '{1}'",
            MessageKey::FirstArgNotBoolean => "The first argument of '{0}' must be of type bool",
            MessageKey::NeitherArgIsConvertibleToTheOther => {
                "Neither argument of '{0}' is convertible to the other ('{1}' and '{2}')"
            }
            MessageKey::ValueNotRepresentableInType => {
                "The value '{0}' is not representable in type '{1}'"
            }
            MessageKey::SearchArgIsNotKnownCollectionType => {
                "The search argument of 'in' is of type '{0}' which is not a known collection type"
            }
            MessageKey::OperandNotConvertibleToCollectionType => {
                "Operand of type '{0}' is not convertible to the collection element type '{1}'"
            }
            MessageKey::TypeNotArrayAndHasNoIndexerOfType => {
                "Type '{0}' is not an array and has no indexer taking '{1}'"
            }
            MessageKey::ArrayIndexersMustBeOfType => "Array indexers must be of type '{0}'",
            MessageKey::MultiArrayIndexNotSupported => {
                "Multi-dimensional array indexing is not supported"
            }
            MessageKey::AmbiguousCallOfFunction => "Ambiguous call of function '{0}({1})'",
            MessageKey::NamespaceCannotBeUsedAsType => "Namespace '{0}' cannot be used as a type",
            MessageKey::TypeCannotBeUsedAsAnExpression => {
                "Type '{0}' cannot be used as an expression"
            }
            MessageKey::StaticMemberCannotBeAccessedWithInstanceReference => {
                "Static member '{0}' cannot be accessed with an instance reference"
            }
            MessageKey::ReferenceToNonSharedMemberRequiresObjectReference => {
                "Reference to instance member '{0}' requires an object reference"
            }
            MessageKey::FunctionHasNoReturnValue => "Function '{0}' does not return a value",
            MessageKey::OperationNotDefinedForType => {
                "Operation '{0}' is not defined for type '{1}'"
            }
            MessageKey::OperationNotDefinedForTypes => {
                "Operation '{0}' is not defined for types '{1}' and '{2}'"
            }
            MessageKey::CannotConvertTypeToExpressionResult => {
                "Cannot convert type '{0}' to the expression result type '{1}'"
            }
            MessageKey::AmbiguousOverloadedOperator => {
                "Both '{0}' and '{1}' define an overloaded operator '{2}'"
            }
            MessageKey::NoIdentifierWithName => "No identifier with name '{0}'",
            MessageKey::NoIdentifierWithNameOnType => "No identifier with name '{0}' on type '{1}'",
            MessageKey::IdentifierIsAmbiguous => "Identifier '{0}' is ambiguous",
            MessageKey::IdentifierIsAmbiguousOnType => "Identifier '{0}' is ambiguous on type '{1}'",
            MessageKey::CalcEngineDoesNotContainAtom => {
                "The calculation engine does not contain '{0}'"
            }
            MessageKey::UndefinedFunction => "Undefined function '{0}({1})'",
            MessageKey::UndefinedFunctionOnType => "Undefined function '{0}({1})' on type '{2}'",
            MessageKey::NoAccessibleMatches => "No accessible matches for '{0}'",
            MessageKey::NoAccessibleMatchesOnType => "No accessible matches for '{0}' on type '{1}'",
            MessageKey::InvalidExplicitCast => "Cannot cast '{0}' to '{1}'",
            MessageKey::SyntaxError => "Syntax error: {0}",
        }
    }
}

/// Message templates with optional host overrides.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    overrides: FxHashMap<MessageKey, Cow<'static, str>>,
}

impl MessageCatalog {
    /// Catalog with only the built-in templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the template for one key.
    pub fn with_template(mut self, key: MessageKey, template: impl Into<Cow<'static, str>>) -> Self {
        self.overrides.insert(key, template.into());
        self
    }

    /// The template in effect for a key.
    pub fn template(&self, key: MessageKey) -> &str {
        self.overrides
            .get(&key)
            .map(|t| t.as_ref())
            .unwrap_or_else(|| key.default_template())
    }

    /// Format a template, substituting `{n}` with the n-th argument.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn format(&self, key: MessageKey, args: &[&dyn fmt::Display]) -> String {
        let template = self.template(key);
        let mut out = String::with_capacity(template.len() + 16);
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let index = after
                .find('}')
                .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));
            match index {
                Some((i, close)) if i < args.len() => {
                    out.push_str(&args[i].to_string());
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Build a compile error from a template.
    pub fn error(
        &self,
        reason: CompileErrorReason,
        span: Span,
        key: MessageKey,
        args: &[&dyn fmt::Display],
    ) -> CompileError {
        CompileError::new(reason, span, self.format(key, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_arguments() {
        let catalog = MessageCatalog::new();
        let text = catalog.format(MessageKey::CannotConvertType, &[&"string", &"int"]);
        assert_eq!(text, "Cannot convert type 'string' to 'int'");
    }

    #[test]
    fn missing_arguments_are_left_in_place() {
        let catalog = MessageCatalog::new();
        let text = catalog.format(MessageKey::NoIdentifierWithNameOnType, &[&"x"]);
        assert_eq!(text, "No identifier with name 'x' on type '{1}'");
    }

    #[test]
    fn overrides_replace_templates() {
        let catalog =
            MessageCatalog::new().with_template(MessageKey::NoIdentifierWithName, "unbekannt: {0}");
        assert_eq!(
            catalog.format(MessageKey::NoIdentifierWithName, &[&"a"]),
            "unbekannt: a"
        );
        assert_eq!(
            catalog.format(MessageKey::IdentifierIsAmbiguous, &[&"a"]),
            "Identifier 'a' is ambiguous"
        );
    }

    #[test]
    fn error_carries_reason_and_span() {
        let catalog = MessageCatalog::new();
        let err = catalog.error(
            CompileErrorReason::UndefinedName,
            Span::new(2, 1),
            MessageKey::NoIdentifierWithName,
            &[&"q"],
        );
        assert_eq!(err.reason(), CompileErrorReason::UndefinedName);
        assert_eq!(err.message, "No identifier with name 'q'");
    }
}
