//! Runtime values.
//!
//! [`Value`] is what the evaluator pushes on its stack and what host
//! functions receive and return. Values carry their own primitive kind, so
//! the interpreter can dispatch arithmetic on the operands it actually holds;
//! the compiler guarantees operands were converted to a common type first.
//!
//! Host objects are reference counted trait objects ([`ObjectRef`]). Their
//! identity (pointer equality) is what reference equality compares.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::primitive::PrimitiveKind;
use crate::{TypeHash, primitives};

/// An object owned by the host application.
///
/// The type hash must name a class registered with the symbol registry so the
/// compiler can resolve members against it.
pub trait HostObject: Any + Send + Sync + fmt::Debug {
    /// Registered type of this object.
    fn type_hash(&self) -> TypeHash;

    /// Upcast for downcasting in native functions.
    fn as_any(&self) -> &dyn Any;

    /// Text used when the object is concatenated with a string.
    fn display(&self) -> String {
        format!("{self:?}")
    }

    /// Value of a virtual property, looked up by name at evaluation time.
    fn virtual_property(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Shared handle to a host object.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn HostObject>);

impl ObjectRef {
    /// Wrap a host object.
    pub fn new<T: HostObject>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Wrap an already shared host object.
    pub fn from_arc(object: Arc<dyn HostObject>) -> Self {
        Self(object)
    }

    /// Registered type of the wrapped object.
    pub fn type_hash(&self) -> TypeHash {
        self.0.type_hash()
    }

    /// Borrow the object as a concrete type.
    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Access the trait object.
    pub fn inner(&self) -> &Arc<dyn HostObject> {
        &self.0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single-dimension array value.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    /// Element type.
    pub element: TypeHash,
    /// Elements, all of the element type (or null).
    pub items: Vec<Value>,
}

impl ArrayValue {
    /// Create an array of the given element type.
    pub fn new(element: TypeHash, items: Vec<Value>) -> Self {
        Self { element, items }
    }
}

/// A runtime value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Null reference.
    #[default]
    Null,
    Bool(bool),
    Char(char),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    /// Immutable shared string.
    String(Arc<str>),
    /// Array of values.
    Array(Arc<ArrayValue>),
    /// Enum member, stored as its underlying integer.
    Enum { ty: TypeHash, value: i64 },
    /// Host object.
    Object(ObjectRef),
}

/// Failure converting a value between primitive kinds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Checked conversion does not fit the target.
    #[error("value {value} does not fit in '{target}'")]
    Overflow { value: String, target: &'static str },

    /// The value is not of a primitive kind the target accepts.
    #[error("cannot convert value of type '{from}' to '{target}'")]
    Unsupported { from: String, target: &'static str },
}

/// Intermediate numeric form used by conversions.
enum Numeric {
    Int(i128),
    Real(f64),
}

impl Value {
    /// Create a string value.
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Arc::from(text.as_ref()))
    }

    /// Create an array value.
    pub fn array(element: TypeHash, items: Vec<Value>) -> Self {
        Value::Array(Arc::new(ArrayValue::new(element, items)))
    }

    /// Create a host object value.
    pub fn object<T: HostObject>(object: T) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    /// The primitive kind of this value, if it is a primitive.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Char(_) => PrimitiveKind::Char,
            Value::SByte(_) => PrimitiveKind::SByte,
            Value::Byte(_) => PrimitiveKind::Byte,
            Value::Int16(_) => PrimitiveKind::Int16,
            Value::UInt16(_) => PrimitiveKind::UInt16,
            Value::Int32(_) => PrimitiveKind::Int32,
            Value::UInt32(_) => PrimitiveKind::UInt32,
            Value::Int64(_) => PrimitiveKind::Int64,
            Value::UInt64(_) => PrimitiveKind::UInt64,
            Value::Single(_) => PrimitiveKind::Single,
            Value::Double(_) => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Runtime type of this value.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Value::Null => primitives::NULL,
            Value::String(_) => primitives::STRING,
            Value::Array(array) => TypeHash::array_of(array.element),
            Value::Enum { ty, .. } => *ty,
            Value::Object(object) => object.type_hash(),
            other => other
                .primitive_kind()
                .map(PrimitiveKind::type_hash)
                .unwrap_or(primitives::OBJECT),
        }
    }

    /// Whether this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integral or enum payload widened to `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::SByte(v) => *v as i128,
            Value::Byte(v) => *v as i128,
            Value::Int16(v) => *v as i128,
            Value::UInt16(v) => *v as i128,
            Value::Int32(v) => *v as i128,
            Value::UInt32(v) => *v as i128,
            Value::Int64(v) => *v as i128,
            Value::UInt64(v) => *v as i128,
            Value::Char(c) => *c as u32 as i128,
            Value::Enum { value, .. } => *value as i128,
            _ => return None,
        })
    }

    /// Any numeric payload as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Single(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// The string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            Value::Single(v) => Some(Numeric::Real(*v as f64)),
            Value::Double(v) => Some(Numeric::Real(*v)),
            Value::Bool(_) | Value::Null | Value::String(_) | Value::Array(_) | Value::Object(_) => {
                None
            }
            other => other.as_i128().map(Numeric::Int),
        }
    }

    /// Convert a numeric value to another primitive kind.
    ///
    /// Unchecked integral conversions wrap; checked conversions fail when
    /// the value does not fit. Real to integral truncates toward zero.
    pub fn convert(&self, target: PrimitiveKind, checked: bool) -> Result<Value, ConversionError> {
        if self.primitive_kind() == Some(target) {
            return Ok(self.clone());
        }
        if target == PrimitiveKind::Bool {
            return Err(self.unsupported(target));
        }
        let numeric = self.numeric().ok_or_else(|| self.unsupported(target))?;

        if target.is_real() {
            let v = match numeric {
                Numeric::Int(i) => i as f64,
                Numeric::Real(r) => r,
            };
            return Ok(match target {
                PrimitiveKind::Single => Value::Single(v as f32),
                _ => Value::Double(v),
            });
        }

        let int = match numeric {
            Numeric::Int(i) => i,
            Numeric::Real(r) => {
                if checked && !r.is_finite() {
                    return Err(self.overflow(target));
                }
                r.trunc() as i128
            }
        };
        if checked && !fits(int, target) {
            return Err(self.overflow(target));
        }
        Ok(match target {
            PrimitiveKind::SByte => Value::SByte(int as i8),
            PrimitiveKind::Byte => Value::Byte(int as u8),
            PrimitiveKind::Int16 => Value::Int16(int as i16),
            PrimitiveKind::UInt16 => Value::UInt16(int as u16),
            PrimitiveKind::Int32 => Value::Int32(int as i32),
            PrimitiveKind::UInt32 => Value::UInt32(int as u32),
            PrimitiveKind::Int64 => Value::Int64(int as i64),
            PrimitiveKind::UInt64 => Value::UInt64(int as u64),
            PrimitiveKind::Char => {
                Value::Char(char::from_u32(int as u16 as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            PrimitiveKind::Bool | PrimitiveKind::Single | PrimitiveKind::Double => {
                unreachable!("handled above")
            }
        })
    }

    fn overflow(&self, target: PrimitiveKind) -> ConversionError {
        ConversionError::Overflow {
            value: self.to_string(),
            target: target.name(),
        }
    }

    fn unsupported(&self, target: PrimitiveKind) -> ConversionError {
        ConversionError::Unsupported {
            from: self.type_name(),
            target: target.name(),
        }
    }

    /// Short name of the runtime type, for messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Enum { .. } => "enum".to_string(),
            Value::Object(o) => format!("object {}", o.type_hash()),
            other => other
                .primitive_kind()
                .map(|k| k.name().to_string())
                .unwrap_or_default(),
        }
    }
}

fn fits(value: i128, target: PrimitiveKind) -> bool {
    let (min, max): (i128, i128) = match target {
        PrimitiveKind::SByte => (i8::MIN as i128, i8::MAX as i128),
        PrimitiveKind::Byte => (0, u8::MAX as i128),
        PrimitiveKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
        PrimitiveKind::UInt16 | PrimitiveKind::Char => (0, u16::MAX as i128),
        PrimitiveKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
        PrimitiveKind::UInt32 => (0, u32::MAX as i128),
        PrimitiveKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
        PrimitiveKind::UInt64 => (0, u64::MAX as i128),
        _ => return true,
    };
    (min..=max).contains(&value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Char(c) => write!(f, "{c}"),
            Value::SByte(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Single(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Enum { value, .. } => write!(f, "{value}"),
            Value::Object(object) => f.write_str(&object.inner().display()),
        }
    }
}

// ============================================================================
// Typed extraction
// ============================================================================

/// Types that can be pulled out of a [`Value`].
///
/// `type_hash` names the expression type that produces this Rust type, used to
/// check a typed request against the compiled result type.
pub trait FromValue: Sized {
    /// The expression type this Rust type corresponds to, if fixed.
    fn type_hash() -> Option<TypeHash>;

    /// Extract, returning `None` on a payload mismatch.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! primitive_value {
    ($rust:ty, $variant:ident, $hash:expr) => {
        impl From<$rust> for Value {
            fn from(v: $rust) -> Self {
                Value::$variant(v)
            }
        }

        impl FromValue for $rust {
            fn type_hash() -> Option<TypeHash> {
                Some($hash)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

primitive_value!(bool, Bool, primitives::BOOL);
primitive_value!(char, Char, primitives::CHAR);
primitive_value!(i8, SByte, primitives::SBYTE);
primitive_value!(u8, Byte, primitives::BYTE);
primitive_value!(i16, Int16, primitives::INT16);
primitive_value!(u16, UInt16, primitives::UINT16);
primitive_value!(i32, Int32, primitives::INT32);
primitive_value!(u32, UInt32, primitives::UINT32);
primitive_value!(i64, Int64, primitives::INT64);
primitive_value!(u64, UInt64, primitives::UINT64);
primitive_value!(f32, Single, primitives::FLOAT);
primitive_value!(f64, Double, primitives::DOUBLE);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl FromValue for String {
    fn type_hash() -> Option<TypeHash> {
        Some(primitives::STRING)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn type_hash() -> Option<TypeHash> {
        None
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for ObjectRef {
    fn type_hash() -> Option<TypeHash> {
        None
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Gadget;

    impl HostObject for Gadget {
        fn type_hash(&self) -> TypeHash {
            TypeHash::from_name("Gadget")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn widening_conversion_preserves_value() {
        let v = Value::Int32(-7).convert(PrimitiveKind::Int64, false).unwrap();
        assert_eq!(v, Value::Int64(-7));
        let d = Value::UInt32(3).convert(PrimitiveKind::Double, false).unwrap();
        assert_eq!(d, Value::Double(3.0));
    }

    #[test]
    fn unchecked_narrowing_wraps() {
        let v = Value::Int32(300).convert(PrimitiveKind::Byte, false).unwrap();
        assert_eq!(v, Value::Byte(44));
    }

    #[test]
    fn checked_narrowing_overflows() {
        let err = Value::Int32(300).convert(PrimitiveKind::Byte, true).unwrap_err();
        assert!(matches!(err, ConversionError::Overflow { target: "byte", .. }));
        assert!(Value::Int32(-1).convert(PrimitiveKind::UInt32, true).is_err());
    }

    #[test]
    fn real_to_integral_truncates() {
        let v = Value::Double(-2.9).convert(PrimitiveKind::Int32, false).unwrap();
        assert_eq!(v, Value::Int32(-2));
    }

    #[test]
    fn bool_does_not_convert_to_numbers() {
        assert!(Value::Bool(true).convert(PrimitiveKind::Int32, false).is_err());
        assert!(Value::Int32(1).convert(PrimitiveKind::Bool, false).is_err());
    }

    #[test]
    fn display_matches_expression_conventions() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Double(3.0).to_string(), "3");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::array(primitives::INT32, vec![1.into(), 2.into()]).to_string(), "[1, 2]");
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = ObjectRef::new(Gadget);
        let b = ObjectRef::new(Gadget);
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a.clone()), Value::Object(b));
        assert!(a.downcast_ref::<Gadget>().is_some());
        assert_eq!(Value::Object(a).type_hash(), TypeHash::from_name("Gadget"));
    }

    #[test]
    fn typed_extraction() {
        assert_eq!(i32::from_value(Value::Int32(4)), Some(4));
        assert_eq!(i32::from_value(Value::Int64(4)), None);
        assert_eq!(String::from_value(Value::string("x")), Some("x".to_string()));
        assert_eq!(<f64 as FromValue>::type_hash(), Some(primitives::DOUBLE));
    }
}
