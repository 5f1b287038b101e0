use serde::Serialize;

use super::lexer::{Lexeme, LexemeType};

/// A lexeme annotated with its evaluation-time kind and operator priority.
///
/// `kind` may differ from `lexeme.kind`: barewords outside command position
/// are literals, and the postfix converter builds synthetic command tokens
/// for operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub kind: LexemeType,
    pub lexeme: Lexeme,
    pub priority: u8,
}

impl Token {
    pub fn new(lexeme: Lexeme) -> Self {
        Self::with_kind(lexeme.kind, lexeme)
    }

    fn with_kind(kind: LexemeType, lexeme: Lexeme) -> Self {
        Self {
            kind,
            priority: kind.priority(),
            lexeme,
        }
    }

    /// A command token that was not typed by the user, placed at the source
    /// position of the operator it stands for.
    pub fn synthetic(name: &str, position: usize) -> Self {
        Self::new(Lexeme::new(LexemeType::Command, name, position))
    }

    pub fn value(&self) -> &str {
        &self.lexeme.value
    }

    pub fn position(&self) -> usize {
        self.lexeme.position
    }

    /// True when `cursor` lies within the token's text, end inclusive.
    pub fn contains(&self, cursor: usize) -> bool {
        (self.lexeme.position..=self.lexeme.end()).contains(&cursor)
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, LexemeType::OpenInline | LexemeType::OpenIndex)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}: {}", self.kind, self.position(), self.value())
    }
}

/// Wrap lexemes into tokens.
///
/// A bareword is a command only in command position: the first lexeme of
/// the line or the first lexeme after an inline open brace. Elsewhere it is
/// a literal. Digit-led barewords are literals too, except directly after
/// an inline open brace.
pub fn tokenize(lexemes: Vec<Lexeme>) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(lexemes.len());
    let mut command_position = true;
    let mut after_inline = false;

    for lexeme in lexemes {
        let kind = match lexeme.kind {
            LexemeType::Command if after_inline => LexemeType::Command,
            LexemeType::Command
                if !command_position || lexeme.value.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                LexemeType::String
            }
            other => other,
        };

        after_inline = lexeme.kind == LexemeType::OpenInline;
        command_position = after_inline;
        tokens.push(Token::with_kind(kind, lexeme));
    }

    tokens
}
