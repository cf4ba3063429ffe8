//! Help text harvested from trailing comments in a handler's declaration
//!
//! ```ignore
//! fn greet(
//!     name: String,   // who to greet
//!     times: i64,     // how many times
//! ) { ... }
//! ```
//!
//! yields `name -> "who to greet"` and `times -> "how many times"`. Only the
//! outermost parameter list is scanned; nothing after the body's opening
//! brace is considered.

mod lexer;

use lexer::{tokenize, Token, TokenKind};
use std::collections::HashMap;
use tracing::trace;

/// Binding modifiers that may sit between a separator and a parameter name.
const TRANSPARENT_KEYWORDS: &[&str] = &["mut", "ref"];

/// Map each parameter name to the comment trailing it on its own line.
pub fn harvest_comments(source: &str, param_names: &[&str]) -> HashMap<String, String> {
    let tokens = tokenize(source);
    let mut comments = HashMap::new();

    let Some(start) = parameter_list_start(&tokens) else {
        return comments;
    };

    let mut paren_depth = 0usize;
    let mut angle_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut prev: Option<&TokenKind> = None;
    let mut current: Option<(&str, usize)> = None;

    for token in &tokens[start..] {
        match &token.kind {
            TokenKind::Punct('(') => paren_depth += 1,
            TokenKind::Punct(')') => paren_depth = paren_depth.saturating_sub(1),
            TokenKind::Punct('[') => bracket_depth += 1,
            TokenKind::Punct(']') => bracket_depth = bracket_depth.saturating_sub(1),
            TokenKind::Punct('<') => angle_depth += 1,
            TokenKind::Punct('>') if prev != Some(&TokenKind::Punct('-')) => {
                angle_depth = angle_depth.saturating_sub(1)
            }
            TokenKind::Punct('{') | TokenKind::Punct(';') if paren_depth == 0 => break,
            TokenKind::Ident(word) if TRANSPARENT_KEYWORDS.contains(&word.as_str()) => {
                continue;
            }
            TokenKind::Ident(word) => {
                let at_argument_start = paren_depth == 1
                    && angle_depth == 0
                    && bracket_depth == 0
                    && matches!(
                        prev,
                        Some(TokenKind::Punct('(') | TokenKind::Punct(',') | TokenKind::Newline)
                    );
                if at_argument_start {
                    if let Some(name) = param_names.iter().find(|n| **n == word.as_str()) {
                        current = Some((*name, token.line));
                    }
                }
            }
            TokenKind::Comment(text) => {
                if let Some((name, line)) = current {
                    if line == token.line && !text.is_empty() {
                        trace!(param = name, comment = %text, "harvested parameter comment");
                        comments.insert(name.to_string(), text.clone());
                    }
                }
            }
            _ => {}
        }
        prev = Some(&token.kind);
    }

    comments
}

/// Index of the `(` opening the parameter list.
///
/// Skips a `fn name<...>` generic list so `Fn(..)` bounds inside it are not
/// mistaken for the parameters.
fn parameter_list_start(tokens: &[Token]) -> Option<usize> {
    let fn_pos = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Ident("fn".to_string()));

    let mut i = fn_pos.map(|p| p + 1).unwrap_or(0);
    let mut angle_depth = 0usize;
    let mut prev: Option<&TokenKind> = None;
    while i < tokens.len() {
        match &tokens[i].kind {
            TokenKind::Punct('<') => angle_depth += 1,
            TokenKind::Punct('>') if prev != Some(&TokenKind::Punct('-')) => {
                angle_depth = angle_depth.saturating_sub(1)
            }
            TokenKind::Punct('(') if angle_depth == 0 => return Some(i),
            _ => {}
        }
        prev = Some(&tokens[i].kind);
        i += 1;
    }
    None
}
