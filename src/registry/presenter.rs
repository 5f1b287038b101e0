use std::fmt;
use std::sync::Arc;

use super::types::{TypeTable, TypeTag};
use crate::sink::{LogLevel, PresentationSink};
use crate::value::Value;

/// Render a value as human-readable lines.
pub type PresentFn = Arc<dyn Fn(&Value, &TypeTable) -> Vec<String> + Send + Sync>;

#[derive(Clone)]
pub struct PresenterDescriptor {
    pub for_type: TypeTag,
    present: PresentFn,
}

impl fmt::Debug for PresenterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterDescriptor")
            .field("for_type", &self.for_type)
            .finish_non_exhaustive()
    }
}

impl PresenterDescriptor {
    pub fn new<F>(for_type: TypeTag, present: F) -> Self
    where
        F: Fn(&Value, &TypeTable) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            for_type,
            present: Arc::new(present),
        }
    }

    pub fn lines(&self, value: &Value, types: &TypeTable) -> Vec<String> {
        (self.present)(value, types)
    }

    /// Emit the description as one multi-line entry.
    pub fn invoke(&self, value: &Value, types: &TypeTable, sink: &mut dyn PresentationSink) {
        let lines = self.lines(value, types);
        if !lines.is_empty() {
            sink.emit(&lines.join("\n"), LogLevel::Log);
        }
    }
}

pub fn builtin_presenters() -> Vec<PresenterDescriptor> {
    vec![
        PresenterDescriptor::new(TypeTag::LIST, |value, _| {
            let Value::List(items) = value else {
                return Vec::new();
            };
            let mut lines = vec![format!("list ({} items)", items.len())];
            for (i, item) in items.iter().enumerate() {
                lines.push(format!("  [{i}] {item}"));
            }
            lines
        }),
        PresenterDescriptor::new(TypeTag::TYPE, |value, types| {
            let Some(t) = value.as_type() else {
                return Vec::new();
            };
            let lineage: Vec<&str> = types.lineage(t.tag).iter().map(|tag| types.name(*tag)).collect();
            vec![format!("type {}", t.name), format!("  lineage: {}", lineage.join(" > "))]
        }),
        PresenterDescriptor::new(TypeTag::OBJECT, |value, _| {
            let Value::Object(obj) = value else {
                return Vec::new();
            };
            let mut lines = vec![format!("{} ({})", obj.display_name(), obj.type_name())];
            for name in obj.property_names() {
                let shown = obj.property(&name).map_or_else(|| "?".to_string(), |v| v.to_string());
                lines.push(format!("  {name}: {shown}"));
            }
            lines
        }),
    ]
}

/// Most specific presenter whose type the value's type derives from.
pub fn best_match<'a>(
    presenters: impl IntoIterator<Item = &'a PresenterDescriptor>,
    actual: TypeTag,
    types: &TypeTable,
) -> Option<&'a PresenterDescriptor> {
    presenters
        .into_iter()
        .filter_map(|p| types.distance(p.for_type, actual).map(|d| (d, p)))
        .min_by_key(|(d, _)| *d)
        .map(|(_, p)| p)
}
