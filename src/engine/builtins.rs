use crate::dsl::lexer::{Lexeme, LexemeType};
use crate::dsl::postfix::{BUILTIN_CONCAT, BUILTIN_GET_PROPERTY, BUILTIN_INDEX};
use crate::dsl::token::Token;
use crate::error::CommandError;
use crate::registry::catalog;
use crate::registry::command::{BuiltinFn, CommandBuilder};
use crate::registry::types::TypeTag;
use crate::registry::Registry;
use crate::sink::LogLevel;
use crate::value::Value;

use super::Engine;

/// Built-in command: name, signature and handler in one place.
/// Adding a builtin means adding ONE entry here.
#[derive(Clone, Copy)]
pub struct BuiltinCommand {
    pub name: &'static str,
    pub params: &'static [(&'static str, TypeTag)],
    pub hidden: bool,
    pub description: &'static str,
    pub run: BuiltinFn,
}

/// All built-in commands, in registration order.
pub static BUILTINS: &[BuiltinCommand] = &[
    // ── Literals ────────────────────────────────────────────────
    BuiltinCommand {
        name: "true", params: &[], hidden: true,
        description: "Boolean true", run: literal_true,
    },
    BuiltinCommand {
        name: "false", params: &[], hidden: true,
        description: "Boolean false", run: literal_false,
    },
    BuiltinCommand {
        name: "null", params: &[], hidden: true,
        description: "No value", run: literal_null,
    },
    // ── Operators ───────────────────────────────────────────────
    BuiltinCommand {
        name: BUILTIN_CONCAT, params: &[("a", TypeTag::STRING), ("b", TypeTag::STRING)], hidden: true,
        description: "a.b", run: concat,
    },
    BuiltinCommand {
        name: BUILTIN_INDEX, params: &[("value", TypeTag::OBJECT), ("index", TypeTag::INT)], hidden: true,
        description: "value[index]", run: index,
    },
    BuiltinCommand {
        name: BUILTIN_GET_PROPERTY, params: &[("value", TypeTag::OBJECT), ("name", TypeTag::STRING)], hidden: true,
        description: "value->name", run: get_property,
    },
    // ── Console ─────────────────────────────────────────────────
    BuiltinCommand {
        name: "help", params: &[], hidden: false,
        description: "List available commands", run: help,
    },
    BuiltinCommand {
        name: "ls", params: &[], hidden: false,
        description: "List available commands", run: help,
    },
    BuiltinCommand {
        name: "usage", params: &[("topic", TypeTag::STRING)], hidden: false,
        description: "Show a command's syntax, or commands matching a pattern", run: usage,
    },
    BuiltinCommand {
        name: "echo", params: &[("value", TypeTag::OBJECT)], hidden: false,
        description: "Return a value unchanged", run: echo,
    },
    BuiltinCommand {
        name: "setvar", params: &[("name", TypeTag::STRING), ("value", TypeTag::OBJECT)], hidden: false,
        description: "Assign a session variable", run: setvar,
    },
    BuiltinCommand {
        name: "getvars", params: &[], hidden: false,
        description: "List session variables", run: getvars,
    },
    BuiltinCommand {
        name: "describe", params: &[("value", TypeTag::OBJECT)], hidden: false,
        description: "Print a detailed description of a value", run: describe,
    },
];

pub fn lookup_builtin(name: &str) -> Option<&'static BuiltinCommand> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Register every builtin. Called when a registry is created.
pub(crate) fn install(registry: &mut Registry) {
    for b in BUILTINS {
        let mut builder = CommandBuilder::new(b.name).description(b.description);
        if b.hidden {
            builder = builder.hidden();
        }
        for (name, ty) in b.params {
            builder = builder.param(*name, *ty);
        }
        if let Err(e) = registry.register_command(builder.builtin(b.run)) {
            tracing::warn!("builtin skipped: {e}");
        }
    }
}

/// Error for a rejected operand, reported against `detail` at the operator's position.
fn operation(message: &str, detail: &str, at: &Token) -> CommandError {
    CommandError::Operation {
        message: message.to_string(),
        token: Token::new(Lexeme::new(LexemeType::String, detail, at.position())),
    }
}

fn literal_true(_: &mut Engine, _: &Token, _: &[Value]) -> Result<Value, CommandError> {
    Ok(Value::Bool(true))
}

fn literal_false(_: &mut Engine, _: &Token, _: &[Value]) -> Result<Value, CommandError> {
    Ok(Value::Bool(false))
}

fn literal_null(_: &mut Engine, _: &Token, _: &[Value]) -> Result<Value, CommandError> {
    Ok(Value::Null)
}

fn concat(_: &mut Engine, _: &Token, args: &[Value]) -> Result<Value, CommandError> {
    let text = |v: &Value| if v.is_null() { String::new() } else { v.to_string() };
    Ok(Value::String(args.iter().map(text).collect()))
}

fn index(_: &mut Engine, token: &Token, args: &[Value]) -> Result<Value, CommandError> {
    let [value, index] = args else {
        return Err(CommandError::ExpectedParameters {
            expected: 2,
            token: token.clone(),
        });
    };
    let Some(i) = index.as_int() else {
        return Err(operation("Index must be an integer", &index.to_string(), token));
    };
    let element = match value {
        Value::List(items) => usize::try_from(i).ok().and_then(|i| items.get(i)).cloned(),
        Value::String(s) => usize::try_from(i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string())),
        Value::Object(obj) => obj.element(i),
        _ => return Err(operation("Value is not indexable", &value.to_string(), token)),
    };
    element.ok_or_else(|| operation("Index out of range", &i.to_string(), token))
}

fn get_property(engine: &mut Engine, token: &Token, args: &[Value]) -> Result<Value, CommandError> {
    let [value, name] = args else {
        return Err(CommandError::ExpectedParameters {
            expected: 2,
            token: token.clone(),
        });
    };
    let name = name.to_string();
    let found = match (value, name.as_str()) {
        (Value::Object(obj), _) => obj.property(&name),
        (Value::List(items), "count" | "length") => i64::try_from(items.len()).ok().map(Value::Int),
        (Value::String(s), "length") => i64::try_from(s.chars().count()).ok().map(Value::Int),
        (Value::Type(t), "name") => Some(Value::String(t.name.clone())),
        (Value::Type(t), "parent") => {
            let types = engine.registry().types();
            types
                .lineage(t.tag)
                .get(1)
                .map(|parent| Value::Type(types.type_ref(*parent)))
        }
        _ => None,
    };
    found.ok_or_else(|| operation("Unknown property", &name, token))
}

fn help(engine: &mut Engine, _: &Token, _: &[Value]) -> Result<Value, CommandError> {
    let text = catalog::help_text(engine.registry(), None);
    engine.emit(&text, LogLevel::Log);
    Ok(Value::Null)
}

fn usage(engine: &mut Engine, _: &Token, args: &[Value]) -> Result<Value, CommandError> {
    let topic = args.first().map(ToString::to_string).unwrap_or_default();
    let text = catalog::help_text(engine.registry(), Some(&topic));
    engine.emit(&text, LogLevel::Log);
    Ok(Value::Null)
}

fn echo(_: &mut Engine, _: &Token, args: &[Value]) -> Result<Value, CommandError> {
    Ok(args.first().cloned().unwrap_or_default())
}

fn setvar(engine: &mut Engine, token: &Token, args: &[Value]) -> Result<Value, CommandError> {
    let [name, value] = args else {
        return Err(CommandError::ExpectedParameters {
            expected: 2,
            token: token.clone(),
        });
    };
    let name = name.to_string();
    if name.is_empty() {
        return Err(operation("Variable name must not be empty", "", token));
    }
    engine.registry_mut().set_variable(&name, value.clone());
    Ok(value.clone())
}

fn getvars(engine: &mut Engine, _: &Token, _: &[Value]) -> Result<Value, CommandError> {
    let prefix = engine.settings().symbols.identifier;
    let lines: Vec<String> = engine
        .registry()
        .variables()
        .map(|(name, value)| format!("{prefix}{name} = {value}"))
        .collect();
    if lines.is_empty() {
        engine.emit("No variables", LogLevel::Log);
    } else {
        engine.emit(&lines.join("\n"), LogLevel::Log);
    }
    Ok(Value::Null)
}

fn describe(engine: &mut Engine, _: &Token, args: &[Value]) -> Result<Value, CommandError> {
    let value = args.first().cloned().unwrap_or_default();
    let lines = engine
        .registry()
        .presenter_for(&value)
        .map(|p| p.lines(&value, engine.registry().types()))
        .unwrap_or_default();
    if lines.is_empty() {
        let kind = engine
            .registry()
            .types()
            .tag_of(&value)
            .map_or_else(|| "null".to_string(), |t| engine.registry().types().name(t).to_string());
        engine.emit(&format!("{value} ({kind})"), LogLevel::Log);
    } else {
        engine.emit(&lines.join("\n"), LogLevel::Log);
    }
    Ok(Value::Null)
}
