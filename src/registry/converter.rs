use std::fmt;
use std::sync::Arc;

use super::types::{TypeTable, TypeTag};
use crate::value::Value;

/// Attempt a conversion to the requested type. None means "could not
/// convert" and the original value is kept.
pub type ConvertFn = Arc<dyn Fn(&Value, TypeTag, &TypeTable) -> Option<Value> + Send + Sync>;

#[derive(Clone)]
pub struct ConverterDescriptor {
    pub target: TypeTag,
    pub source: TypeTag,
    pub builtin: bool,
    convert: ConvertFn,
}

impl fmt::Debug for ConverterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterDescriptor")
            .field("target", &self.target)
            .field("source", &self.source)
            .field("builtin", &self.builtin)
            .finish_non_exhaustive()
    }
}

impl ConverterDescriptor {
    pub fn new<F>(target: TypeTag, source: TypeTag, convert: F) -> Self
    where
        F: Fn(&Value, TypeTag, &TypeTable) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            target,
            source,
            builtin: false,
            convert: Arc::new(convert),
        }
    }

    fn builtin<F>(target: TypeTag, source: TypeTag, convert: F) -> Self
    where
        F: Fn(&Value, TypeTag, &TypeTable) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            builtin: true,
            ..Self::new(target, source, convert)
        }
    }

    pub fn try_convert(&self, value: &Value, requested: TypeTag, types: &TypeTable) -> Option<Value> {
        (self.convert)(value, requested, types)
    }

    /// Sort key among applicable converters: closest source, then closest
    /// target. None when the converter does not apply.
    pub fn rank(&self, requested: TypeTag, actual: TypeTag, types: &TypeTable) -> Option<(usize, usize)> {
        let target = types.distance(self.target, requested)?;
        let source = types.distance(self.source, actual)?;
        Some((source, target))
    }
}

/// Conversions every console starts with.
pub fn builtin_converters() -> Vec<ConverterDescriptor> {
    vec![
        ConverterDescriptor::builtin(TypeTag::INT, TypeTag::STRING, |v, _, _| {
            v.as_str()?.trim().parse::<i64>().ok().map(Value::Int)
        }),
        ConverterDescriptor::builtin(TypeTag::FLOAT, TypeTag::STRING, |v, _, _| {
            v.as_str()?.trim().parse::<f64>().ok().map(Value::Float)
        }),
        ConverterDescriptor::builtin(TypeTag::BOOL, TypeTag::STRING, |v, _, _| {
            match v.as_str()?.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(Value::Bool(true)),
                "false" | "0" | "no" => Some(Value::Bool(false)),
                _ => None,
            }
        }),
        ConverterDescriptor::builtin(TypeTag::FLOAT, TypeTag::INT, |v, _, _| match v {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Some(Value::Float(*i as f64)),
            _ => None,
        }),
        ConverterDescriptor::builtin(TypeTag::TYPE, TypeTag::STRING, |v, _, types| {
            types.resolve_type(v.as_str()?).map(Value::Type)
        }),
        ConverterDescriptor::builtin(TypeTag::STRING, TypeTag::OBJECT, |v, _, _| {
            Some(Value::String(v.to_string()))
        }),
    ]
}

/// Pick the best converter for turning a value of type `actual` into
/// `requested`. Ties keep registration order.
pub fn best_match<'a>(
    converters: impl IntoIterator<Item = &'a ConverterDescriptor>,
    requested: TypeTag,
    actual: TypeTag,
    types: &TypeTable,
) -> Option<&'a ConverterDescriptor> {
    converters
        .into_iter()
        .filter_map(|c| c.rank(requested, actual, types).map(|rank| (rank, c)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, c)| c)
}
