pub mod lexer;
pub mod postfix;
pub mod token;

use crate::settings::Symbols;
use token::Token;

/// Compile a console line into a postfix token stream ready for evaluation.
///
/// This is the front half of the pipeline:
/// source → lex → tokenize → postfix. Returns None when there is nothing to
/// evaluate or the brackets do not balance.
pub fn compile(source: &str, symbols: &Symbols) -> Option<Vec<Token>> {
    let tokens = token::tokenize(lexer::lex_with(source, symbols));
    postfix::to_postfix(&tokens)
}
