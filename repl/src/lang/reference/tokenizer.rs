// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Single pass, allocation light lexer. It never fails: anything it doesn't recognize
//! becomes a one character [`TokenKind::Unknown`] token, so the parser and the word motion
//! code always see the whole buffer.

use crate::{Keyword, Token, TokenKind};

const URL_SCHEME_SEPARATOR: &str = "://";

#[must_use]
pub fn is_ident_start(ch: char) -> bool { ch.is_alphabetic() || ch == '_' }

#[must_use]
pub fn is_ident_char(ch: char) -> bool { ch.is_alphanumeric() || ch == '_' || ch == '-' }

/// Characters that end a path or URL literal.
fn is_literal_terminator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ';' | ',' | ')' | ']' | '}' | '"')
}

fn scan_while(chars: &[char], mut index: usize, predicate: impl Fn(char) -> bool) -> usize {
    while index < chars.len() && predicate(chars[index]) {
        index += 1;
    }
    index
}

fn starts_with_at(chars: &[char], index: usize, needle: &str) -> bool {
    let mut offset = index;
    for expected in needle.chars() {
        if chars.get(offset) != Some(&expected) {
            return false;
        }
        offset += 1;
    }
    true
}

fn is_path_start(chars: &[char], index: usize) -> bool {
    match chars[index] {
        '/' => true,
        '.' => starts_with_at(chars, index, "./") || starts_with_at(chars, index, "../"),
        '~' => starts_with_at(chars, index, "~/"),
        _ => false,
    }
}

/// Returns the index just past the closing quote, or the end of input if the string is
/// unterminated.
fn scan_string(chars: &[char], start: usize) -> usize {
    let mut index = start + 1;
    while index < chars.len() {
        match chars[index] {
            '\\' => index += 2,
            '"' => return index + 1,
            _ => index += 1,
        }
    }
    chars.len()
}

#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    tokenize_chars(&chars)
}

#[must_use]
pub fn tokenize_chars(chars: &[char]) -> Vec<Token> {
    let mut acc = vec![];
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        let start = index;

        match ch {
            ' ' | '\t' | '\r' => {
                index += 1;
            }
            '\n' | ';' => {
                index += 1;
                acc.push(Token::new(TokenKind::Separator, start, index));
            }
            '#' => {
                index = scan_while(chars, index, |it| it != '\n');
            }
            '"' => {
                index = scan_string(chars, index);
                acc.push(Token::new(TokenKind::StringLiteral, start, index));
            }
            '$' => {
                let (kind, name_start) = if chars.get(index + 1) == Some(&'$') {
                    (TokenKind::GlobalVariable, index + 2)
                } else {
                    (TokenKind::LocalVariable, index + 1)
                };
                index = scan_while(chars, name_start, is_ident_char);
                acc.push(Token::new(kind, start, index));
            }
            '%' => {
                index = scan_while(chars, index + 1, |it| is_ident_char(it) || it == '.');
                acc.push(Token::new(TokenKind::PatternName, start, index));
            }
            _ if is_path_start(chars, index) => {
                index = scan_while(chars, index, |it| !is_literal_terminator(it));
                acc.push(Token::new(TokenKind::PathLiteral, start, index));
            }
            _ if ch.is_ascii_digit() => {
                index = scan_while(chars, index, |it| it.is_ascii_digit());
                acc.push(Token::new(TokenKind::IntLiteral, start, index));
            }
            _ if is_ident_start(ch) => {
                let word_end = scan_while(chars, index, is_ident_char);
                if starts_with_at(chars, word_end, URL_SCHEME_SEPARATOR) {
                    let authority_start = word_end + URL_SCHEME_SEPARATOR.len();
                    index = scan_while(chars, authority_start, |it| {
                        !is_literal_terminator(it)
                    });
                    let rest = &chars[authority_start..index];
                    let kind = if rest.is_empty() {
                        TokenKind::SchemeLiteral
                    } else if rest.contains(&'/') {
                        TokenKind::UrlLiteral
                    } else {
                        TokenKind::HostLiteral
                    };
                    acc.push(Token::new(kind, start, index));
                } else {
                    index = word_end;
                    let text: String = chars[start..index].iter().collect();
                    let kind = if Keyword::is_keyword(&text) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Identifier
                    };
                    acc.push(Token::new(kind, start, index));
                }
            }
            '[' | ']' | '{' | '}' | '(' | ')' | ',' | '.' | ':' => {
                index += 1;
                acc.push(Token::new(TokenKind::Delimiter, start, index));
            }
            '=' | '!' if chars.get(index + 1) == Some(&'=') => {
                index += 2;
                acc.push(Token::new(TokenKind::Operator, start, index));
            }
            '=' | '+' | '-' | '*' | '<' | '>' => {
                index += 1;
                acc.push(Token::new(TokenKind::Operator, start, index));
            }
            _ => {
                index += 1;
                acc.push(Token::new(TokenKind::Unknown, start, index));
            }
        }
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::tokenize;
    use crate::TokenKind::{self, *};

    fn kinds_and_spans(source: &str) -> Vec<(TokenKind, usize, usize)> {
        tokenize(source)
            .into_iter()
            .map(|it| (it.kind, it.span.start, it.span.end))
            .collect()
    }

    #[test]
    fn test_command_line() {
        pretty_assertions::assert_eq!(
            kinds_and_spans("cmd help build"),
            vec![(Identifier, 0, 3), (Identifier, 4, 8), (Identifier, 9, 14)]
        );
    }

    #[test]
    fn test_member_and_variables() {
        pretty_assertions::assert_eq!(
            kinds_and_spans("$x = obj.name; $$g"),
            vec![
                (LocalVariable, 0, 2),
                (Operator, 3, 4),
                (Identifier, 5, 8),
                (Delimiter, 8, 9),
                (Identifier, 9, 13),
                (Separator, 13, 14),
                (GlobalVariable, 15, 18),
            ]
        );
    }

    #[test]
    fn test_for_loop_with_block() {
        pretty_assertions::assert_eq!(
            kinds_and_spans("for []{b}"),
            vec![
                (Keyword, 0, 3),
                (Delimiter, 4, 5),
                (Delimiter, 5, 6),
                (Delimiter, 6, 7),
                (Identifier, 7, 8),
                (Delimiter, 8, 9),
            ]
        );
    }

    #[test]
    fn test_literals() {
        pretty_assertions::assert_eq!(
            kinds_and_spans(r#"print "a \" b" 42 ./src/ https:// https://host https://host/p %int"#),
            vec![
                (Identifier, 0, 5),
                (StringLiteral, 6, 14),
                (IntLiteral, 15, 17),
                (PathLiteral, 18, 24),
                (SchemeLiteral, 25, 33),
                (HostLiteral, 34, 46),
                (UrlLiteral, 47, 61),
                (PatternName, 62, 66),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        pretty_assertions::assert_eq!(kinds_and_spans(r#"print "abc"#), vec![
            (Identifier, 0, 5),
            (StringLiteral, 6, 10)
        ]);
    }

    #[test]
    fn test_comments_are_skipped_and_unknowns_kept() {
        pretty_assertions::assert_eq!(
            kinds_and_spans("a # comment\n@"),
            vec![(Identifier, 0, 1), (Separator, 11, 12), (Unknown, 12, 13)]
        );
    }
}
