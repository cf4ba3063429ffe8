//! Minimal lexer for Rust function declarations
//!
//! Only what the harvester needs: identifiers, single-character punctuation,
//! line comments and line breaks. String and char literals and block
//! comments are consumed and dropped.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Punct(char),
    /// `// text`, with the slashes and surrounding blanks removed
    Comment(String),
    Newline,
    /// A literal whose contents are irrelevant
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line
    pub line: usize,
}

pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line,
                });
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                let start = i + 2;
                let mut end = start;
                while end < chars.len() && chars[end] != '\n' {
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                // doc comments keep their text too
                let text = text.trim_start_matches(['/', '!']).trim().to_string();
                tokens.push(Token {
                    kind: TokenKind::Comment(text),
                    line,
                });
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let mut depth = 1;
                i += 2;
                while i < chars.len() && depth > 0 {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
                        depth += 1;
                        i += 2;
                    } else if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        depth -= 1;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }
            '"' => {
                let start_line = line;
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    if chars.get(i) == Some(&'\n') {
                        line += 1;
                    }
                    i += 1;
                }
                i += 1;
                tokens.push(Token {
                    kind: TokenKind::Literal,
                    line: start_line,
                });
            }
            '\'' => {
                // char literal ('a', '\n') or lifetime ('a)
                if let Some(end) = char_literal_end(&chars, i) {
                    tokens.push(Token {
                        kind: TokenKind::Literal,
                        line,
                    });
                    i = end;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Punct('\''),
                        line,
                    });
                    i += 1;
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let kind = if word.starts_with(|c: char| c.is_ascii_digit()) {
                    TokenKind::Literal
                } else {
                    TokenKind::Ident(word)
                };
                tokens.push(Token { kind, line });
            }
            other => {
                tokens.push(Token {
                    kind: TokenKind::Punct(other),
                    line,
                });
                i += 1;
            }
        }
    }

    tokens
}

/// Index just past a char literal starting at `start`, if there is one.
fn char_literal_end(chars: &[char], start: usize) -> Option<usize> {
    match chars.get(start + 1)? {
        '\\' => {
            let mut i = start + 2;
            while i < chars.len() && chars[i] != '\'' && chars[i] != '\n' {
                i += 1;
            }
            (chars.get(i) == Some(&'\'')).then_some(i + 1)
        }
        _ => (chars.get(start + 2) == Some(&'\'')).then_some(start + 3),
    }
}
