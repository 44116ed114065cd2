//! The host type system as seen by the compiler.
//!
//! The compiler never inspects host types directly. Everything it needs to
//! know (members by name, accessibility, indexers, type relationships) goes
//! through [`SymbolResolver`], which `flee-registry` implements.

use std::fmt;

use bitflags::bitflags;

use crate::entries::{FieldEntry, FunctionEntry, PropertyEntry, TypeEntry};
use crate::{TypeHash, primitives};

/// Visibility of a host member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Internal => write!(f, "internal"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

bitflags! {
    /// Which members of the expression owner are visible to expressions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberAccess: u8 {
        /// Public members.
        const PUBLIC = 1 << 0;
        /// Everything else.
        const NON_PUBLIC = 1 << 1;
    }
}

impl Default for MemberAccess {
    fn default() -> Self {
        MemberAccess::PUBLIC
    }
}

bitflags! {
    /// Member categories to search for, plus lookup modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberKinds: u8 {
        const FIELD = 1 << 0;
        const PROPERTY = 1 << 1;
        const METHOD = 1 << 2;
        /// Compare names case-insensitively.
        const IGNORE_CASE = 1 << 7;

        /// Members that read like variables.
        const DATA = Self::FIELD.bits() | Self::PROPERTY.bits();
    }
}

impl MemberKinds {
    /// Add [`MemberKinds::IGNORE_CASE`] unless lookups are case sensitive.
    pub fn with_case(self, case_sensitive: bool) -> Self {
        if case_sensitive {
            self - MemberKinds::IGNORE_CASE
        } else {
            self | MemberKinds::IGNORE_CASE
        }
    }

    /// Compare a member name against a requested name.
    pub fn name_matches(self, member: &str, requested: &str) -> bool {
        if self.contains(MemberKinds::IGNORE_CASE) {
            member.eq_ignore_ascii_case(requested)
        } else {
            member == requested
        }
    }
}

/// A borrowed member found by lookup.
#[derive(Debug, Clone, Copy)]
pub enum MemberRef<'a> {
    Field(&'a FieldEntry),
    Property(&'a PropertyEntry),
    Method(&'a FunctionEntry),
}

impl<'a> MemberRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            MemberRef::Field(f) => &f.name,
            MemberRef::Property(p) => &p.name,
            MemberRef::Method(m) => &m.name,
        }
    }

    pub fn declaring_type(&self) -> TypeHash {
        match self {
            MemberRef::Field(f) => f.declaring_type,
            MemberRef::Property(p) => p.declaring_type,
            MemberRef::Method(m) => m.declaring_type,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            MemberRef::Field(f) => f.visibility,
            MemberRef::Property(p) => p.visibility,
            MemberRef::Method(m) => m.visibility,
        }
    }

    pub fn owner_access(&self) -> Option<bool> {
        match self {
            MemberRef::Field(f) => f.owner_access,
            MemberRef::Property(p) => p.owner_access,
            MemberRef::Method(m) => m.owner_access,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            MemberRef::Field(f) => f.is_static,
            MemberRef::Property(p) => p.is_static,
            MemberRef::Method(m) => m.is_static,
        }
    }

    /// Type of the value produced by reading the member.
    pub fn value_type(&self) -> TypeHash {
        match self {
            MemberRef::Field(f) => f.ty,
            MemberRef::Property(p) => p.ty,
            MemberRef::Method(m) => m.return_type,
        }
    }

    pub fn as_method(&self) -> Option<&'a FunctionEntry> {
        match self {
            MemberRef::Method(m) => Some(m),
            _ => None,
        }
    }
}

/// Access to host type information.
///
/// Member lookups include inherited members (the base class chain, and base
/// interfaces for interface types). A derived member hides a base member with
/// the same signature.
pub trait SymbolResolver {
    /// Look up a type by identity.
    fn get_type(&self, hash: TypeHash) -> Option<&TypeEntry>;

    /// Look up a type by (qualified) name.
    fn lookup_type(&self, name: &str, case_sensitive: bool) -> Option<&TypeEntry>;

    /// Members named `name` on `owner`.
    fn find_members(&self, owner: TypeHash, name: &str, kinds: MemberKinds) -> Vec<MemberRef<'_>>;

    /// Default indexer overloads of a type.
    fn find_default_indexer_members(&self, ty: TypeHash) -> Vec<&FunctionEntry>;

    /// A virtual property, consulted when normal lookup finds nothing.
    fn find_virtual_property(&self, owner: TypeHash, name: &str, case_sensitive: bool)
    -> Option<&PropertyEntry>;

    // === Provided type-info queries ===

    /// Whether `member`, found on `reflected_type`, may be used.
    ///
    /// Members of the expression owner follow the owner access policy (or the
    /// member's own override); other members must be public.
    fn is_accessible(
        &self,
        member: MemberRef<'_>,
        reflected_type: TypeHash,
        owner_type: Option<TypeHash>,
        policy: MemberAccess,
    ) -> bool {
        if owner_type == Some(reflected_type) {
            if let Some(allow) = member.owner_access() {
                return allow;
            }
            if member.visibility() == Visibility::Public {
                policy.contains(MemberAccess::PUBLIC)
            } else {
                policy.contains(MemberAccess::NON_PUBLIC)
            }
        } else {
            member.visibility() == Visibility::Public
        }
    }

    /// Display name of a type, for messages.
    fn type_name(&self, hash: TypeHash) -> String {
        if hash == primitives::NULL {
            return "null".to_string();
        }
        if hash == primitives::VOID {
            return "void".to_string();
        }
        match self.get_type(hash) {
            Some(entry) => entry.qualified_name().to_string(),
            None => hash.to_string(),
        }
    }

    /// Whether values of the type are references (nullable, upcastable).
    fn is_reference_type(&self, hash: TypeHash) -> bool {
        hash == primitives::NULL || self.get_type(hash).is_some_and(TypeEntry::is_reference)
    }

    /// Element type of an array type.
    fn array_element(&self, hash: TypeHash) -> Option<TypeHash> {
        self.get_type(hash)
            .and_then(TypeEntry::as_array)
            .map(|a| a.element)
    }

    /// Every interface implemented by a type, including inherited ones, in
    /// declaration order (own interfaces first).
    fn all_interfaces(&self, hash: TypeHash) -> Vec<TypeHash> {
        let mut out: Vec<TypeHash> = Vec::new();
        let mut pending = Vec::new();
        let mut current = Some(hash);
        while let Some(ty) = current {
            let Some(entry) = self.get_type(ty) else {
                break;
            };
            pending.extend(entry.interfaces().iter().copied());
            current = match entry {
                TypeEntry::Class(c) => c.base_class,
                _ => None,
            };
        }
        let mut index = 0;
        while index < pending.len() {
            let iface = pending[index];
            index += 1;
            if out.contains(&iface) {
                continue;
            }
            out.push(iface);
            if let Some(entry) = self.get_type(iface) {
                pending.extend(entry.interfaces().iter().copied());
            }
        }
        out
    }

    /// Number of inheritance steps from `from` up to `to`, if `to` is a base
    /// class or implemented interface of `from`.
    fn inheritance_distance(&self, from: TypeHash, to: TypeHash) -> Option<u32> {
        let mut frontier = vec![from];
        let mut seen = vec![from];
        let mut distance = 0;
        while !frontier.is_empty() {
            if frontier.contains(&to) {
                return Some(distance);
            }
            let mut next = Vec::new();
            for ty in frontier {
                let Some(entry) = self.get_type(ty) else {
                    continue;
                };
                for parent in entry.base_class().into_iter().chain(entry.interfaces().iter().copied()) {
                    if !seen.contains(&parent) {
                        seen.push(parent);
                        next.push(parent);
                    }
                }
            }
            frontier = next;
            distance += 1;
        }
        None
    }
}
