use crate::dsl::lexer::LexemeType;
use crate::dsl::token::Token;
use crate::error::CommandError;
use crate::registry::command::Handler;
use crate::registry::types::TypeTag;
use crate::value::Value;

use super::Engine;

/// Run a postfix token stream on a single operand stack.
///
/// Operands are pushed left to right, so a command's arguments sit on top of
/// the stack in source order and an instance command's target sits just
/// below them. Fails on the first inconsistency; invocation errors inside
/// host handlers are not failures (they yield null).
pub fn evaluate(engine: &mut Engine, postfix: &[Token]) -> Result<Value, CommandError> {
    let mut stack: Vec<Value> = Vec::new();

    for token in postfix {
        match token.kind {
            LexemeType::String => stack.push(Value::String(token.value().to_string())),
            LexemeType::Identifier => {
                let value = engine
                    .registry()
                    .variable(token.value())
                    .cloned()
                    .ok_or_else(|| CommandError::UnknownVariable { token: token.clone() })?;
                stack.push(value);
            }
            LexemeType::SpecialIdentifier => {
                let value = engine
                    .registry()
                    .global(token.value())
                    .cloned()
                    .ok_or_else(|| CommandError::UnknownGlobal { token: token.clone() })?;
                stack.push(value);
            }
            LexemeType::Command => {
                let result = call(engine, token, &mut stack)?;
                stack.push(result);
            }
            _ => return Err(CommandError::UnexpectedToken { token: token.clone() }),
        }
    }

    if stack.len() > 1 {
        return Err(CommandError::InvalidCommand);
    }
    Ok(stack.pop().unwrap_or_default())
}

fn call(engine: &mut Engine, token: &Token, stack: &mut Vec<Value>) -> Result<Value, CommandError> {
    let command = engine
        .registry()
        .command(token.value())
        .ok_or_else(|| CommandError::UnknownCommand { token: token.clone() })?;

    let arity = command.arity();
    let Some(split) = stack.len().checked_sub(arity) else {
        return Err(CommandError::ExpectedParameters {
            expected: arity,
            token: token.clone(),
        });
    };
    let raw = stack.split_off(split);

    let mut args = Vec::with_capacity(arity);
    {
        let registry = engine.registry();
        let types = registry.types();
        for (value, param) in raw.into_iter().zip(&command.parameters) {
            let value = registry.convert(value, param.ty);
            if !types.accepts(param.ty, &value) {
                return Err(CommandError::InvalidParameter {
                    parameter: param.name.clone(),
                    expected_type: types.name(param.ty).to_string(),
                    token: token.clone(),
                });
            }
            args.push(value);
        }
    }

    match &command.handler {
        Handler::Builtin(run) => run(engine, token, &args),
        Handler::Host(handler) => {
            let target = if command.takes_target() {
                Some(pop_target(engine, token, command.declaring_type, stack)?)
            } else {
                None
            };
            tracing::debug!("invoking '{}' with {} args", command.name, args.len());
            Ok(command.invoke_host(handler, target.as_ref(), &args))
        }
    }
}

/// Pop the target of an instance command. Null is never a valid target.
fn pop_target(
    engine: &Engine,
    token: &Token,
    declaring_type: Option<TypeTag>,
    stack: &mut Vec<Value>,
) -> Result<Value, CommandError> {
    let target = match stack.pop() {
        Some(v) if !v.is_null() => v,
        _ => return Err(CommandError::ExpectedTarget { token: token.clone() }),
    };
    let expected = declaring_type.unwrap_or(TypeTag::OBJECT);
    let types = engine.registry().types();
    if types.accepts(expected, &target) {
        Ok(target)
    } else {
        Err(CommandError::InvalidTarget {
            expected_type: types.name(expected).to_string(),
            token: token.clone(),
        })
    }
}
