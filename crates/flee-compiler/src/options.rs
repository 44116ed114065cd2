//! Options that shape how an expression is compiled.

use flee_core::{MemberAccess, PrimitiveKind, TypeHash};

/// How `=` and `<>` compare two strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringComparison {
    #[default]
    Ordinal,
    OrdinalIgnoreCase,
}

/// Type given to real literals without a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RealLiteralType {
    Single,
    #[default]
    Double,
}

impl RealLiteralType {
    pub fn kind(self) -> PrimitiveKind {
        match self {
            RealLiteralType::Single => PrimitiveKind::Single,
            RealLiteralType::Double => PrimitiveKind::Double,
        }
    }
}

/// Compilation options.
///
/// Read-only while an expression compiles. The defaults match the usual
/// host expectations: names are case-insensitive, arithmetic wraps, and the
/// expression keeps the type of its root element.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionOptions {
    /// Match identifiers, members and imports by exact case.
    pub case_sensitive: bool,
    /// Fail on integral overflow in arithmetic and conversions.
    pub checked: bool,
    /// Convert the result to this type.
    pub result_type: Option<TypeHash>,
    /// Which owner members expressions may use.
    pub owner_member_access: MemberAccess,
    /// String equality mode.
    pub string_comparison: StringComparison,
    /// Type unsuffixed integer literals as `double`.
    pub integers_as_doubles: bool,
    /// Type of unsuffixed real literals.
    pub real_literal_type: RealLiteralType,
}

impl Default for ExpressionOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            checked: false,
            result_type: None,
            owner_member_access: MemberAccess::PUBLIC,
            string_comparison: StringComparison::Ordinal,
            integers_as_doubles: false,
            real_literal_type: RealLiteralType::Double,
        }
    }
}

impl ExpressionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_result_type(mut self, result_type: TypeHash) -> Self {
        self.result_type = Some(result_type);
        self
    }

    pub fn with_owner_member_access(mut self, access: MemberAccess) -> Self {
        self.owner_member_access = access;
        self
    }

    pub fn with_string_comparison(mut self, comparison: StringComparison) -> Self {
        self.string_comparison = comparison;
        self
    }

    pub fn with_integers_as_doubles(mut self, enabled: bool) -> Self {
        self.integers_as_doubles = enabled;
        self
    }

    pub fn with_real_literal_type(mut self, real: RealLiteralType) -> Self {
        self.real_literal_type = real;
        self
    }

    /// The requested result type, falling back to the expression's own.
    pub fn result_type_or(&self, natural: TypeHash) -> TypeHash {
        self.result_type.unwrap_or(natural)
    }
}
