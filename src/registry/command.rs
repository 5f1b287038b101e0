use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use super::types::{TypeTable, TypeTag};
use crate::dsl::token::Token;
use crate::engine::Engine;
use crate::error::CommandError;
use crate::value::Value;

/// Engine-internal handler. Receives the engine as its bound target and the
/// command token for error reporting.
pub type BuiltinFn = fn(&mut Engine, &Token, &[Value]) -> Result<Value, CommandError>;

/// Host handler. Receives the target object for instance commands.
pub type HostFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

#[derive(Clone)]
pub enum Handler {
    Builtin(BuiltinFn),
    Host(HostFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(_) => write!(f, "Handler::Builtin"),
            Self::Host(_) => write!(f, "Handler::Host"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
}

/// Immutable description of one command, created at discovery time.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub hidden: bool,
    pub is_static: bool,
    /// Target type for instance commands.
    pub declaring_type: Option<TypeTag>,
    pub parameters: Vec<Parameter>,
    pub handler: Handler,
}

impl CommandDescriptor {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Non-builtin instance commands take one extra operand as their target.
    pub fn takes_target(&self) -> bool {
        !self.builtin && !self.is_static
    }

    /// Call a host handler. A handler that fails or panics is logged and
    /// yields null so the rest of the expression still evaluates.
    pub fn invoke_host(&self, handler: &HostFn, target: Option<&Value>, args: &[Value]) -> Value {
        match panic::catch_unwind(AssertUnwindSafe(|| handler(target, args))) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::error!("command '{}' failed: {e:#}", self.name);
                Value::Null
            }
            Err(payload) => {
                tracing::error!("command '{}' panicked: {}", self.name, panic_message(payload.as_ref()));
                Value::Null
            }
        }
    }

    /// `name param:type ...`, with `slot` wrapped in brackets.
    /// Slot 0 is the name, slot n the n-th parameter.
    pub fn syntax_hint(&self, slot: usize, types: &TypeTable) -> String {
        let mut parts = Vec::with_capacity(self.parameters.len() + 2);
        if self.takes_target() {
            if let Some(target) = self.declaring_type {
                parts.push(format!("<{}>", types.name(target)));
            }
        }
        parts.push(highlight(self.name.clone(), slot == 0));
        for (i, param) in self.parameters.iter().enumerate() {
            let text = format!("{}:{}", param.name, types.name(param.ty));
            parts.push(highlight(text, slot == i + 1));
        }
        parts.join(" ")
    }

    /// `name - description`
    pub fn help_text(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.description)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn highlight(text: String, on: bool) -> String {
    if on {
        format!("[{text}]")
    } else {
        text
    }
}

/// Builder for command descriptors. Defaults to a static host command with
/// no parameters.
pub struct CommandBuilder {
    name: String,
    description: String,
    hidden: bool,
    declaring_type: Option<TypeTag>,
    parameters: Vec<Parameter>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            hidden: false,
            declaring_type: None,
            parameters: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Make this an instance command on values of `target`.
    pub fn target(mut self, target: TypeTag) -> Self {
        self.declaring_type = Some(target);
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn host<F>(self, f: F) -> CommandDescriptor
    where
        F: Fn(Option<&Value>, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        CommandDescriptor {
            builtin: false,
            is_static: self.declaring_type.is_none(),
            name: self.name,
            description: self.description,
            hidden: self.hidden,
            declaring_type: self.declaring_type,
            parameters: self.parameters,
            handler: Handler::Host(Arc::new(f)),
        }
    }

    pub fn builtin(self, f: BuiltinFn) -> CommandDescriptor {
        CommandDescriptor {
            builtin: true,
            is_static: false,
            name: self.name,
            description: self.description,
            hidden: self.hidden,
            declaring_type: None,
            parameters: self.parameters,
            handler: Handler::Builtin(f),
        }
    }
}
