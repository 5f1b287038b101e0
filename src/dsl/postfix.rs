use super::lexer::LexemeType;
use super::token::Token;

/// Command that `a.b` desugars to.
pub const BUILTIN_CONCAT: &str = "__builtin_concat";
/// Command that `a[b]` desugars to.
pub const BUILTIN_INDEX: &str = "__builtin_index";
/// Command that `a->b` desugars to.
pub const BUILTIN_GET_PROPERTY: &str = "__builtin_getproperty";

/// Convert an infix token stream to postfix (shunting-yard).
///
/// Concatenation, property access and indexing become synthetic command
/// tokens, so the evaluator has a single dispatch path. Returns None for an
/// empty stream or when a closing bracket has no matching opener.
pub fn to_postfix(tokens: &[Token]) -> Option<Vec<Token>> {
    if tokens.is_empty() {
        return None;
    }

    let mut operators: Vec<Token> = Vec::new();
    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token.kind {
            LexemeType::String
            | LexemeType::Identifier
            | LexemeType::SpecialIdentifier
            | LexemeType::Invalid => output.push(token.clone()),
            LexemeType::Command => {
                pop_operators(&mut operators, &mut output, token.priority);
                operators.push(token.clone());
            }
            LexemeType::Concatenation => {
                pop_operators(&mut operators, &mut output, token.priority);
                operators.push(Token::synthetic(BUILTIN_CONCAT, token.position()));
            }
            LexemeType::GetProperty => {
                pop_operators(&mut operators, &mut output, token.priority);
                operators.push(Token::synthetic(BUILTIN_GET_PROPERTY, token.position()));
            }
            LexemeType::OpenInline | LexemeType::OpenIndex => operators.push(token.clone()),
            LexemeType::CloseInline => {
                close_group(&mut operators, &mut output, LexemeType::OpenInline)?;
            }
            LexemeType::CloseIndex => {
                let opener = close_group(&mut operators, &mut output, LexemeType::OpenIndex)?;
                output.push(Token::synthetic(BUILTIN_INDEX, opener.position()));
            }
        }
    }

    while let Some(op) = operators.pop() {
        output.push(op);
    }

    tracing::debug!(
        "postfix {:?}",
        output.iter().map(|t| (t.kind, t.value())).collect::<Vec<_>>()
    );
    Some(output)
}

/// Emit every stacked operator with priority >= `priority`, stopping at a
/// bracket barrier. Equal priorities pop, so operators associate left.
fn pop_operators(operators: &mut Vec<Token>, output: &mut Vec<Token>, priority: u8) {
    while let Some(top) = operators.last() {
        if top.is_barrier() || top.priority < priority {
            break;
        }
        if let Some(op) = operators.pop() {
            output.push(op);
        }
    }
}

/// Emit operators down to the nearest barrier and return it. The barrier
/// must be an `opener`; an empty stack or a different bracket is a mismatch.
fn close_group(
    operators: &mut Vec<Token>,
    output: &mut Vec<Token>,
    opener: LexemeType,
) -> Option<Token> {
    while let Some(top) = operators.pop() {
        if top.is_barrier() {
            return (top.kind == opener).then_some(top);
        }
        output.push(top);
    }
    None
}
