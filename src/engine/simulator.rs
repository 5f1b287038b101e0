use std::sync::Arc;

use crate::dsl::lexer::LexemeType;
use crate::dsl::postfix::to_postfix;
use crate::dsl::token::Token;
use crate::registry::command::CommandDescriptor;
use crate::registry::Registry;

/// Where the cursor sits: inside which command, and on which slot.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub command: Arc<CommandDescriptor>,
    /// 0 is the command name, n the n-th parameter.
    pub slot: usize,
    /// The token the cursor is in, or the nearest one before it.
    pub token: Token,
}

/// Work out which command and argument slot the cursor is in, without
/// invoking anything. Runs on every keystroke, so it never fails: anything
/// it cannot make sense of is "no hint".
///
/// An operand consumed by a hidden builtin (`.`, `[]`, `->`) is followed into
/// that builtin's result, so the hint names the visible command it feeds.
pub fn simulate(registry: &Registry, tokens: &[Token], cursor: usize) -> Option<Simulation> {
    let Located { token: located, closed } = locate(tokens, cursor)?;
    let postfix = to_postfix(tokens)?;
    let at = |command: Arc<CommandDescriptor>, slot: usize| Simulation {
        command,
        slot,
        token: located.clone(),
    };

    let mut inside: &Token = located;
    // Operands, plus pending results of commands already replayed.
    let mut stack: Vec<&Token> = Vec::new();

    for token in &postfix {
        if token.kind != LexemeType::Command {
            if !token.is_barrier() {
                stack.push(token);
            }
            continue;
        }

        let command = registry.command(token.value())?;
        if token == inside && !closed && !command.hidden {
            return Some(at(command, 0));
        }

        let needed = command.arity();
        let available = needed.min(stack.len());
        let args = stack.split_off(stack.len() - available);
        // Missing operands come later in the source, so those present fill
        // the leading parameters.
        if let Some(j) = args.iter().position(|t| *t == inside) {
            if command.builtin && command.hidden {
                inside = token;
            } else {
                return Some(at(command, j + 1));
            }
        }
        if command.takes_target() && available == needed && stack.pop().is_some_and(|t| t == inside) {
            return Some(at(command, 0));
        }
        stack.push(token);
    }

    None
}

struct Located<'a> {
    token: &'a Token,
    /// The cursor is past the end of an inline group and `token` is the
    /// group's head: the hint belongs to whatever consumes the group.
    closed: bool,
}

/// The token containing the cursor, else the nearest operand or command
/// before it. An inline open brace restarts the search.
fn locate(tokens: &[Token], cursor: usize) -> Option<Located<'_>> {
    let mut candidate = None;
    let mut closed = false;
    // First token of each open inline group.
    let mut groups: Vec<Option<&Token>> = Vec::new();
    for token in tokens {
        if token.position() > cursor {
            break;
        }
        match token.kind {
            LexemeType::OpenInline => {
                groups.push(None);
                candidate = None;
                closed = false;
            }
            LexemeType::CloseInline if token.position() < cursor => {
                if let Some(head) = groups.pop() {
                    candidate = head;
                    closed = true;
                }
            }
            LexemeType::Command
            | LexemeType::Identifier
            | LexemeType::SpecialIdentifier
            | LexemeType::String => {
                if let Some(head) = groups.last_mut() {
                    head.get_or_insert(token);
                }
                candidate = Some(token);
                closed = false;
            }
            _ => {}
        }
    }
    candidate.map(|token| Located { token, closed })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dsl::lexer::lex;
    use crate::dsl::token::tokenize;
    use crate::registry::command::CommandBuilder;
    use crate::registry::types::TypeTag;
    use crate::value::Value;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        let camera = reg.register_type("Camera", None).unwrap();
        reg.register_command(
            CommandBuilder::new("find")
                .param("type", TypeTag::TYPE)
                .param("name", TypeTag::STRING)
                .host(|_, _| Ok(Value::Null)),
        )
        .unwrap();
        reg.register_command(
            CommandBuilder::new("zoom")
                .target(camera)
                .param("factor", TypeTag::FLOAT)
                .host(|_, _| Ok(Value::Null)),
        )
        .unwrap();
        reg.set_enabled(true);
        reg
    }

    fn sim(source: &str, cursor: usize) -> Option<(String, usize)> {
        simulate(&registry(), &tokenize(lex(source)), cursor).map(|s| (s.command.name.clone(), s.slot))
    }

    #[test]
    fn cursor_at_end_of_partial_argument() {
        assert_eq!(sim("find Type 'Came", 15), Some(("find".into(), 2)));
    }

    #[test]
    fn cursor_on_each_slot() {
        assert_eq!(sim("find Type 'Came", 2), Some(("find".into(), 0)));
        assert_eq!(sim("find Type 'Came", 7), Some(("find".into(), 1)));
    }

    #[test]
    fn partial_input_fills_leading_parameters() {
        assert_eq!(sim("find Cam", 8), Some(("find".into(), 1)));
        assert_eq!(sim("find", 4), Some(("find".into(), 0)));
    }

    #[test]
    fn whitespace_uses_preceding_token() {
        assert_eq!(sim("find Type  'x'", 10), Some(("find".into(), 1)));
    }

    #[test]
    fn nested_group_restarts_context() {
        assert_eq!(sim("echo {find Type 'a'}", 12), Some(("find".into(), 1)));
        assert_eq!(sim("echo {find Type 'a'}", 1), Some(("echo".into(), 0)));
        // the inner command's pending result is echo's argument
        assert_eq!(sim("$c {zoom 2}", 9), Some(("zoom".into(), 1)));
    }

    #[test]
    fn cursor_after_closed_group_hints_its_consumer() {
        assert_eq!(sim("echo {getvars} ", 15), Some(("echo".into(), 1)));
        assert_eq!(sim("find {getvars} ", 15), Some(("find".into(), 1)));
        // just before the closing brace is still inside the group
        assert_eq!(sim("echo {getvars}", 13), Some(("getvars".into(), 0)));
        // a closed group that nothing consumes
        assert_eq!(sim("$c {zoom 2}", 11), None);
    }

    #[test]
    fn cursor_on_target_hints_instance_command() {
        assert_eq!(sim("$c {zoom 2}", 1), Some(("zoom".into(), 0)));
        assert_eq!(sim("$c {zoom 2}", 0), Some(("zoom".into(), 0)));
        // with no argument typed yet, the operand fills the first slot
        assert_eq!(sim("$c {zoom", 1), Some(("zoom".into(), 1)));
    }

    #[test]
    fn operators_hint_the_visible_command() {
        assert_eq!(sim("find Type {'Ca'.'m'}", 17), Some(("find".into(), 2)));
        assert_eq!(sim("echo {$list[0]}", 12), Some(("echo".into(), 1)));
        // the concat result is not an argument of anything
        assert_eq!(sim("echo 'a'.'b", 11), None);
    }

    #[test]
    fn no_hint_cases() {
        assert_eq!(sim("", 0), None);
        assert_eq!(sim("nothing 'x'", 9), None);
        assert_eq!(sim("$x", 1), None);
        assert_eq!(sim("echo ]", 5), None);
    }

    #[test]
    fn disabled_registry_gives_no_hint() {
        let mut reg = registry();
        reg.set_enabled(false);
        assert!(simulate(&reg, &tokenize(lex("find")), 2).is_none());
    }
}
