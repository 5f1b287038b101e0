use std::hash::{Hash, Hasher};
use std::iter::Peekable;
use std::str::CharIndices;

use serde::Serialize;

use crate::settings::Symbols;

/// Lexeme classification. Each kind carries a fixed operator priority used
/// by the postfix converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LexemeType {
    Invalid,
    Command,
    String,
    OpenInline,
    CloseInline,
    OpenIndex,
    CloseIndex,
    Identifier,
    SpecialIdentifier,
    Concatenation,
    GetProperty,
}

impl LexemeType {
    /// Open brackets bind tighter than commands, commands tighter than leaves.
    /// Inline braces bind looser than index brackets.
    pub fn priority(self) -> u8 {
        match self {
            Self::Invalid | Self::String | Self::Identifier | Self::SpecialIdentifier => 0,
            Self::Command | Self::Concatenation | Self::GetProperty => 1,
            Self::OpenIndex | Self::CloseIndex => 2,
            Self::OpenInline | Self::CloseInline => 3,
        }
    }

    /// Leaves are pushed straight to the operand stack.
    pub fn is_operand(self) -> bool {
        matches!(self, Self::String | Self::Identifier | Self::SpecialIdentifier)
    }
}

/// Smallest classified span of input.
///
/// `prefix` and `suffix` hold the sigils and quotes that were stripped from
/// `value`, so `text()` reproduces the original span. Two lexemes are equal
/// when they share a kind and a position.
#[derive(Debug, Clone, Serialize)]
pub struct Lexeme {
    pub kind: LexemeType,
    pub value: String,
    /// Byte offset of the first character of `text()` in the source.
    pub position: usize,
    pub prefix: String,
    pub suffix: String,
}

impl Lexeme {
    pub fn new(kind: LexemeType, value: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    fn with_prefix(kind: LexemeType, prefix: char, position: usize) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::new(kind, "", position)
        }
    }

    pub fn text(&self) -> String {
        format!("{}{}{}", self.prefix, self.value, self.suffix)
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.value.is_empty() && self.suffix.is_empty()
    }

    /// Byte offset one past the last character of `text()`.
    pub fn end(&self) -> usize {
        self.position + self.prefix.len() + self.value.len() + self.suffix.len()
    }
}

impl PartialEq for Lexeme {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.position == other.position
    }
}

impl Eq for Lexeme {}

impl Hash for Lexeme {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.position.hash(state);
    }
}

/// Lex a console line with the default symbols.
pub fn lex(source: &str) -> Vec<Lexeme> {
    lex_with(source, &Symbols::default())
}

/// Lex a console line. Total: every input produces a lexeme list, unknown
/// characters become `Invalid` lexemes.
pub fn lex_with(source: &str, symbols: &Symbols) -> Vec<Lexeme> {
    let lexemes = Lexer::new(source, symbols).run();
    tracing::debug!(
        "lexed {:?}",
        lexemes.iter().map(|l| (l.kind, l.value.as_str())).collect::<Vec<_>>()
    );
    lexemes
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

struct Lexer<'a> {
    source: &'a str,
    symbols: &'a Symbols,
    lexemes: Vec<Lexeme>,
    pending: Option<Lexeme>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, symbols: &'a Symbols) -> Self {
        Self {
            source,
            symbols,
            lexemes: Vec::new(),
            pending: None,
        }
    }

    fn run(mut self) -> Vec<Lexeme> {
        let mut chars = self.source.char_indices().peekable();

        while let Some(&(pos, ch)) = chars.peek() {
            let Some(mut current) = self.pending.take() else {
                chars.next();
                if !ch.is_whitespace() {
                    self.start(pos, ch, &mut chars);
                }
                continue;
            };

            match current.kind {
                LexemeType::String => {
                    chars.next();
                    if ch == self.symbols.string {
                        current.suffix.push(ch);
                        self.lexemes.push(current);
                    } else {
                        current.value.push(ch);
                        self.pending = Some(current);
                    }
                }
                _ if is_word(ch) => {
                    chars.next();
                    current.value.push(ch);
                    self.pending = Some(current);
                }
                // Close the word and reprocess this character as a fresh lexeme.
                _ => self.lexemes.push(current),
            }
        }

        if let Some(last) = self.pending.take() {
            if !last.is_empty() {
                self.lexemes.push(last);
            }
        }
        self.lexemes
    }

    /// Begin a lexeme at `ch`, which has already been consumed.
    fn start(&mut self, pos: usize, ch: char, chars: &mut Peekable<CharIndices<'_>>) {
        let symbols = self.symbols;

        let property = symbols.property.as_str();
        if !property.is_empty() && self.source.get(pos..).is_some_and(|rest| rest.starts_with(property)) {
            for _ in 1..property.chars().count() {
                chars.next();
            }
            self.lexemes.push(Lexeme::new(LexemeType::GetProperty, property, pos));
            return;
        }

        let single = match ch {
            c if c == symbols.identifier => {
                self.pending = Some(Lexeme::with_prefix(LexemeType::Identifier, c, pos));
                return;
            }
            c if c == symbols.special_identifier => {
                self.pending = Some(Lexeme::with_prefix(LexemeType::SpecialIdentifier, c, pos));
                return;
            }
            c if c == symbols.string => {
                self.pending = Some(Lexeme::with_prefix(LexemeType::String, c, pos));
                return;
            }
            c if c == symbols.inline_start => LexemeType::OpenInline,
            c if c == symbols.inline_end => LexemeType::CloseInline,
            c if c == symbols.index_start => LexemeType::OpenIndex,
            c if c == symbols.index_end => LexemeType::CloseIndex,
            c if c == symbols.concatenate => LexemeType::Concatenation,
            c if is_word(c) => {
                self.pending = Some(Lexeme::new(LexemeType::Command, c.to_string(), pos));
                return;
            }
            _ => LexemeType::Invalid,
        };
        self.lexemes.push(Lexeme::new(single, ch.to_string(), pos));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<LexemeType> {
        lex(s).into_iter().map(|l| l.kind).collect()
    }

    fn values(s: &str) -> Vec<String> {
        lex(s).into_iter().map(|l| l.value).collect()
    }

    #[test]
    fn command_with_string_argument() {
        let lexemes = lex("echo 'hi there'");
        assert_eq!(lexemes.len(), 2);
        assert_eq!(lexemes[0].kind, LexemeType::Command);
        assert_eq!(lexemes[0].value, "echo");
        assert_eq!(lexemes[1].kind, LexemeType::String);
        assert_eq!(lexemes[1].value, "hi there");
        assert_eq!(lexemes[1].prefix, "'");
        assert_eq!(lexemes[1].suffix, "'");
        assert_eq!(lexemes[1].position, 5);
    }

    #[test]
    fn sigils_are_prefixes() {
        let lexemes = lex("$player @");
        assert_eq!(lexemes[0].kind, LexemeType::Identifier);
        assert_eq!(lexemes[0].value, "player");
        assert_eq!(lexemes[0].text(), "$player");
        assert_eq!(lexemes[1].kind, LexemeType::SpecialIdentifier);
        assert_eq!(lexemes[1].value, "");
        assert_eq!(lexemes[1].text(), "@");
    }

    #[test]
    fn brackets_close_immediately() {
        assert_eq!(
            kinds("$list[1]"),
            vec![
                LexemeType::Identifier,
                LexemeType::OpenIndex,
                LexemeType::Command,
                LexemeType::CloseIndex,
            ]
        );
        assert_eq!(
            kinds("echo {getvars}"),
            vec![
                LexemeType::Command,
                LexemeType::OpenInline,
                LexemeType::Command,
                LexemeType::CloseInline,
            ]
        );
    }

    #[test]
    fn concatenation_and_property() {
        assert_eq!(
            kinds("'a'.'b'"),
            vec![LexemeType::String, LexemeType::Concatenation, LexemeType::String]
        );
        assert_eq!(
            kinds("$cam->fov"),
            vec![LexemeType::Identifier, LexemeType::GetProperty, LexemeType::Command]
        );
        assert_eq!(values("$cam->fov"), vec!["cam", "->", "fov"]);
    }

    #[test]
    fn configured_property_symbol() {
        let symbols = Symbols {
            property: ":".to_string(),
            ..Symbols::default()
        };
        let lexemes = lex_with("$cam:fov", &symbols);
        assert_eq!(lexemes[1].kind, LexemeType::GetProperty);
        assert_eq!(lexemes[1].text(), ":");
    }

    #[test]
    fn lone_dash_is_invalid() {
        assert_eq!(kinds("a - b"), vec![LexemeType::Command, LexemeType::Invalid, LexemeType::Command]);
    }

    #[test]
    fn string_keeps_punctuation_and_spaces() {
        let lexemes = lex("'a.b [c] {d} $e'");
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].value, "a.b [c] {d} $e");
    }

    #[test]
    fn unterminated_string_is_accepted() {
        let lexemes = lex("find Type 'Came");
        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[2].kind, LexemeType::String);
        assert_eq!(lexemes[2].value, "Came");
        assert_eq!(lexemes[2].suffix, "");
        assert_eq!(lexemes[2].end(), 15);
    }

    #[test]
    fn word_stops_at_symbol_without_separator() {
        assert_eq!(values("echo{a}"), vec!["echo", "{", "a", "}"]);
        assert_eq!(values("a'b'"), vec!["a", "b"]);
    }

    #[test]
    fn equality_is_kind_and_position() {
        let mut a = Lexeme::new(LexemeType::Command, "x", 3);
        let b = Lexeme::new(LexemeType::Command, "y", 3);
        assert_eq!(a, b);
        a.kind = LexemeType::String;
        assert_ne!(a, b);
    }

    #[test]
    fn lexing_reconstructs_source() {
        let inputs = [
            "echo 'hi'",
            "  setvar 'x'   {getvars}  ",
            "$list[1].'tail'->len",
            "@ $ % ^ & 'open",
            "näme 'ü' $ß",
            "",
            "{{[]}}",
        ];
        for input in inputs {
            let mut rebuilt = String::new();
            for lexeme in lex(input) {
                assert_eq!(
                    &input[lexeme.position..lexeme.end()],
                    lexeme.text(),
                    "span mismatch in {input:?}"
                );
                while rebuilt.len() < lexeme.position {
                    rebuilt.push(' ');
                }
                rebuilt.push_str(&lexeme.text());
            }
            assert_eq!(rebuilt.trim_end(), input.trim_end().replace(char::is_whitespace, " "));
        }
    }
}
