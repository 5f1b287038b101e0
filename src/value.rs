use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::registry::types::TypeRef;

/// A host object exposed to the console.
///
/// The console never owns host state; it holds shared references and reads
/// through this trait. `type_name` must match a name registered in the
/// type table for converter and presenter dispatch to see the object's
/// lineage. Unregistered type names are treated as plain `object`.
pub trait ConsoleObject: Send + Sync + fmt::Debug {
    fn type_name(&self) -> &str;

    fn display_name(&self) -> String;

    /// Read a property or field by name.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Sequence access for indexable host objects.
    fn element(&self, _index: i64) -> Option<Value> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

pub type ObjectRef = Arc<dyn ConsoleObject>;

/// Dynamic runtime value flowing through the evaluator's operand stack.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Type(TypeRef),
    Object(ObjectRef),
}

impl Value {
    pub fn object(obj: impl ConsoleObject + 'static) -> Self {
        Self::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Downcast a host object to its concrete type.
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => a.tag == b.tag,
            // Host objects compare by identity.
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Type(t) => write!(f, "{}", t.name),
            Self::Object(obj) => write!(f, "{}", obj.display_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Type(t) => serializer.serialize_str(&t.name),
            Self::Object(obj) => serializer.serialize_str(&obj.display_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}
