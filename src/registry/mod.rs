pub mod catalog;
pub mod command;
pub mod converter;
pub mod presenter;
pub mod types;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::RegistryError;
use crate::value::Value;
use command::CommandDescriptor;
use converter::ConverterDescriptor;
use presenter::PresenterDescriptor;
use types::{TypeTable, TypeTag};

// ── Domains ─────────────────────────────────────────────────────

/// Named partitions of the registry. Names are unique within a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Domain {
    Commands,
    Variables,
    Globals,
    Types,
    Converters,
    Presenters,
}

impl Domain {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Variables => "variables",
            Self::Globals => "globals",
            Self::Types => "types",
            Self::Converters => "converters",
            Self::Presenters => "presenters",
        }
    }

    pub fn all() -> &'static [Domain] {
        &[
            Self::Commands,
            Self::Variables,
            Self::Globals,
            Self::Types,
            Self::Converters,
            Self::Presenters,
        ]
    }
}

// ── Registry ────────────────────────────────────────────────────

/// Store of everything the evaluator resolves by name.
///
/// Commands, converters, presenters and types are populated during discovery
/// and read-only afterwards. Command lookups fail until `set_enabled(true)`,
/// so a half-populated registry never answers. Variables and globals change
/// during evaluation.
#[derive(Debug)]
pub struct Registry {
    commands: IndexMap<String, Arc<CommandDescriptor>>,
    enabled: bool,
    variables: IndexMap<String, Value>,
    globals: IndexMap<String, Value>,
    types: TypeTable,
    converters: Vec<ConverterDescriptor>,
    presenters: Vec<PresenterDescriptor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry holding the built-in types, converters, presenters and
    /// commands. Not yet enabled.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: IndexMap::new(),
            enabled: false,
            variables: IndexMap::new(),
            globals: IndexMap::new(),
            types: TypeTable::new(),
            converters: converter::builtin_converters(),
            presenters: presenter::builtin_presenters(),
        };
        crate::engine::builtins::install(&mut registry);
        registry
    }

    // ── Commands ──

    pub fn register_command(&mut self, command: CommandDescriptor) -> Result<(), RegistryError> {
        if self.commands.contains_key(&command.name) {
            return Err(RegistryError::Duplicate {
                domain: Domain::Commands,
                name: command.name,
            });
        }
        tracing::debug!("registered command '{}'", command.name);
        self.commands.insert(command.name.clone(), Arc::new(command));
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a command. Always None while the registry is disabled.
    pub fn command(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        if !self.enabled {
            return None;
        }
        self.commands.get(name).cloned()
    }

    /// Every command in registration order, enabled or not.
    pub fn commands(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values().map(AsRef::as_ref)
    }

    // ── Variables & globals ──

    /// Create or update a session variable. Updating keeps its position.
    pub fn set_variable(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.variables.get_mut(name) {
            *slot = value;
        } else {
            self.variables.insert(name.to_string(), value);
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Globals are set by the environment, not by console input.
    pub fn set_global(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.globals.get_mut(name) {
            *slot = value;
        } else {
            self.globals.insert(name.to_string(), value);
        }
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    // ── Types ──

    /// Register a host type under `parent` (by name, default `object`).
    pub fn register_type(&mut self, name: &str, parent: Option<&str>) -> Result<TypeTag, RegistryError> {
        let parent = match parent {
            Some(p) => Some(self.types.lookup(p).ok_or_else(|| RegistryError::UnknownType {
                name: p.to_string(),
            })?),
            None => None,
        };
        self.types.register(name, parent)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    // ── Converters ──

    /// Add a converter. One with the same target and source replaces the old one.
    pub fn register_converter(&mut self, converter: ConverterDescriptor) {
        if let Some(existing) = self
            .converters
            .iter_mut()
            .find(|c| c.target == converter.target && c.source == converter.source)
        {
            tracing::warn!(
                "replacing converter {} <- {}",
                self.types.name(converter.target),
                self.types.name(converter.source)
            );
            *existing = converter;
        } else {
            self.converters.push(converter);
        }
    }

    pub fn converters(&self) -> &[ConverterDescriptor] {
        &self.converters
    }

    pub fn converter_for(&self, requested: TypeTag, actual: TypeTag) -> Option<&ConverterDescriptor> {
        converter::best_match(&self.converters, requested, actual, &self.types)
    }

    /// Try the best converter; on no match or failure return the value unchanged.
    pub fn convert(&self, value: Value, requested: TypeTag) -> Value {
        let Some(actual) = self.types.tag_of(&value) else {
            return value;
        };
        if actual == requested {
            return value;
        }
        match self
            .converter_for(requested, actual)
            .and_then(|c| c.try_convert(&value, requested, &self.types))
        {
            Some(converted) => converted,
            None => value,
        }
    }

    // ── Presenters ──

    /// Add a presenter. One for the same type replaces the old one.
    pub fn register_presenter(&mut self, presenter: PresenterDescriptor) {
        if let Some(existing) = self.presenters.iter_mut().find(|p| p.for_type == presenter.for_type) {
            tracing::warn!("replacing presenter for {}", self.types.name(presenter.for_type));
            *existing = presenter;
        } else {
            self.presenters.push(presenter);
        }
    }

    pub fn presenters(&self) -> &[PresenterDescriptor] {
        &self.presenters
    }

    pub fn presenter_for(&self, value: &Value) -> Option<&PresenterDescriptor> {
        let actual = self.types.tag_of(value)?;
        presenter::best_match(&self.presenters, actual, &self.types)
    }

    /// Number of entries in a domain.
    pub fn count(&self, domain: Domain) -> usize {
        match domain {
            Domain::Commands => self.commands.len(),
            Domain::Variables => self.variables.len(),
            Domain::Globals => self.globals.len(),
            Domain::Types => self.types.len(),
            Domain::Converters => self.converters.len(),
            Domain::Presenters => self.presenters.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use command::CommandBuilder;

    fn noop(name: &str) -> CommandDescriptor {
        CommandBuilder::new(name).host(|_, _| Ok(Value::Null))
    }

    #[test]
    fn commands_hidden_until_enabled() {
        let mut reg = Registry::new();
        reg.register_command(noop("spawn")).unwrap();
        assert!(reg.command("spawn").is_none());
        reg.set_enabled(true);
        assert_eq!(reg.command("spawn").unwrap().name, "spawn");
    }

    #[test]
    fn duplicate_command_is_rejected() {
        let mut reg = Registry::new();
        reg.register_command(noop("spawn")).unwrap();
        let err = reg.register_command(noop("spawn")).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { domain: Domain::Commands, .. }));
        // builtins occupy their names too
        assert!(reg.register_command(noop("echo")).is_err());
    }

    #[test]
    fn variables_update_in_place() {
        let mut reg = Registry::new();
        reg.set_variable("a", Value::Int(1));
        reg.set_variable("b", Value::Int(2));
        reg.set_variable("a", Value::Int(3));
        let vars: Vec<(&str, &Value)> = reg.variables().collect();
        assert_eq!(vars, vec![("a", &Value::Int(3)), ("b", &Value::Int(2))]);
        assert_eq!(reg.count(Domain::Variables), 2);
    }

    #[test]
    fn register_type_resolves_parent_by_name() {
        let mut reg = Registry::new();
        let component = reg.register_type("Component", None).unwrap();
        let camera = reg.register_type("Camera", Some("Component")).unwrap();
        assert!(reg.types().is_assignable(component, camera));
        assert!(matches!(
            reg.register_type("Light", Some("Missing")),
            Err(RegistryError::UnknownType { .. })
        ));
    }

    #[test]
    fn convert_is_permissive() {
        let reg = Registry::new();
        assert_eq!(reg.convert("2.5".into(), TypeTag::FLOAT), Value::Float(2.5));
        assert_eq!(reg.convert("abc".into(), TypeTag::FLOAT), Value::from("abc"));
        assert_eq!(reg.convert(Value::Null, TypeTag::INT), Value::Null);
    }

    #[test]
    fn host_converter_replaces_builtin_pair() {
        let mut reg = Registry::new();
        let before = reg.converters().len();
        reg.register_converter(ConverterDescriptor::new(TypeTag::INT, TypeTag::STRING, |_, _, _| {
            Some(Value::Int(-1))
        }));
        assert_eq!(reg.converters().len(), before);
        assert_eq!(reg.convert("5".into(), TypeTag::INT), Value::Int(-1));
    }

    #[test]
    fn presenter_lookup_uses_runtime_type() {
        let reg = Registry::new();
        let p = reg.presenter_for(&Value::from(vec![1_i64])).unwrap();
        assert_eq!(p.for_type, TypeTag::LIST);
        assert!(reg.presenter_for(&Value::Null).is_none());
    }
}
