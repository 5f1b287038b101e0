use std::collections::HashMap;

use serde::Serialize;

use super::Domain;
use crate::error::RegistryError;
use crate::value::Value;

/// Stable id of a registered type. Index into the `TypeTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeTag(pub u32);

impl TypeTag {
    pub const OBJECT: Self = Self(0);
    pub const BOOL: Self = Self(1);
    pub const INT: Self = Self(2);
    pub const FLOAT: Self = Self(3);
    pub const STRING: Self = Self(4);
    pub const LIST: Self = Self(5);
    pub const TYPE: Self = Self(6);
}

/// A type as a console value: the tag plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    pub tag: TypeTag,
    pub name: String,
}

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    /// Self first, root (`object`) last.
    lineage: Vec<TypeTag>,
}

/// Single-inheritance type tree rooted at `object`.
///
/// Each entry stores its full lineage when registered, so assignability and
/// subtype distance are a scan of a short vector.
#[derive(Debug, Clone)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeTag>,
}

const BUILTIN_TYPES: &[&str] = &["object", "bool", "int", "float", "string", "list", "type"];

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
        };
        for (i, name) in BUILTIN_TYPES.iter().enumerate() {
            let tag = TypeTag(u32::try_from(i).unwrap_or(0));
            let lineage = if tag == TypeTag::OBJECT {
                vec![tag]
            } else {
                vec![tag, TypeTag::OBJECT]
            };
            table.entries.push(TypeEntry {
                name: (*name).to_string(),
                lineage,
            });
            table.by_name.insert((*name).to_string(), tag);
        }
        table
    }

    /// Register a host type under `parent` (default `object`).
    pub fn register(&mut self, name: &str, parent: Option<TypeTag>) -> Result<TypeTag, RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::Duplicate {
                domain: Domain::Types,
                name: name.to_string(),
            });
        }
        let parent = parent.unwrap_or(TypeTag::OBJECT);
        let Some(parent_entry) = self.entry(parent) else {
            return Err(RegistryError::UnknownType {
                name: format!("#{}", parent.0),
            });
        };

        let tag = TypeTag(u32::try_from(self.entries.len()).map_err(|_| RegistryError::Load {
            message: "type table is full".to_string(),
        })?);
        let mut lineage = Vec::with_capacity(parent_entry.lineage.len() + 1);
        lineage.push(tag);
        lineage.extend_from_slice(&parent_entry.lineage);

        self.entries.push(TypeEntry {
            name: name.to_string(),
            lineage,
        });
        self.by_name.insert(name.to_string(), tag);
        Ok(tag)
    }

    fn entry(&self, tag: TypeTag) -> Option<&TypeEntry> {
        self.entries.get(tag.0 as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, tag: TypeTag) -> &str {
        self.entry(tag).map_or("unknown", |e| e.name.as_str())
    }

    pub fn type_ref(&self, tag: TypeTag) -> TypeRef {
        TypeRef {
            tag,
            name: self.name(tag).to_string(),
        }
    }

    pub fn lineage(&self, tag: TypeTag) -> &[TypeTag] {
        self.entry(tag).map_or(&[], |e| e.lineage.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TypeRef> + '_ {
        (0..self.entries.len()).filter_map(|i| u32::try_from(i).ok().map(|i| self.type_ref(TypeTag(i))))
    }

    /// Runtime type of a value. Null has none.
    pub fn tag_of(&self, value: &Value) -> Option<TypeTag> {
        Some(match value {
            Value::Null => return None,
            Value::Bool(_) => TypeTag::BOOL,
            Value::Int(_) => TypeTag::INT,
            Value::Float(_) => TypeTag::FLOAT,
            Value::String(_) => TypeTag::STRING,
            Value::List(_) => TypeTag::LIST,
            Value::Type(_) => TypeTag::TYPE,
            Value::Object(obj) => self.lookup(obj.type_name()).unwrap_or(TypeTag::OBJECT),
        })
    }

    /// True when a value of type `actual` may be used where `target` is expected.
    pub fn is_assignable(&self, target: TypeTag, actual: TypeTag) -> bool {
        self.lineage(actual).contains(&target)
    }

    /// Number of inheritance steps from `actual` up to `target`.
    pub fn distance(&self, target: TypeTag, actual: TypeTag) -> Option<usize> {
        self.lineage(actual).iter().position(|t| *t == target)
    }

    /// Whether `value` satisfies a parameter of type `target`. Null satisfies any.
    pub fn accepts(&self, target: TypeTag, value: &Value) -> bool {
        match self.tag_of(value) {
            Some(actual) => self.is_assignable(target, actual),
            None => true,
        }
    }

    /// Types whose name contains `pattern`'s characters in order.
    pub fn find_types(&self, pattern: &str) -> Vec<TypeRef> {
        self.iter().filter(|t| fuzzy_contains(&t.name, pattern)).collect()
    }

    /// Exact name, else the only fuzzy match.
    pub fn resolve_type(&self, pattern: &str) -> Option<TypeRef> {
        if let Some(tag) = self.lookup(pattern) {
            return Some(self.type_ref(tag));
        }
        let mut found = self.find_types(pattern);
        if found.len() == 1 {
            found.pop()
        } else {
            None
        }
    }
}

/// Ordered-subsequence match: every character of `pattern` appears in
/// `text`, in order, not necessarily adjacent.
pub fn fuzzy_contains(text: &str, pattern: &str) -> bool {
    let mut rest = text.chars();
    pattern.chars().all(|p| rest.any(|c| c == p))
}
