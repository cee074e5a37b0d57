//! Source text to flat token stream (spec §4.1).
//!
//! Lexing is line-oriented: each source line is scanned independently and
//! terminated with a synthetic `Newline` token, so the parser never has to
//! reconstruct statement boundaries from anything but the token stream
//! itself.

use log::{error, trace};

use crate::error::{GalError, GalResult};
use crate::token::{match_keyword, Token, TokenKind};

pub fn lex(source: &str) -> GalResult<Vec<Token>> {
    let mut tokens = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        lex_line(raw_line, line_number, &mut tokens)?;
        tokens.push(Token::new(TokenKind::Newline, "\n", line_number));
    }

    trace!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

fn lex_line(line: &str, line_number: usize, tokens: &mut Vec<Token>) -> GalResult<()> {
    let bytes = line.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c == '"' {
            let start = i;
            i += 1;
            let mut value = String::new();
            let mut closed = false;

            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch == '\\' && i + 1 < bytes.len() && bytes[i + 1] as char == '"' {
                    value.push('"');
                    i += 2;
                    continue;
                }
                if ch == '"' {
                    closed = true;
                    i += 1;
                    break;
                }
                value.push(line[i..].chars().next().unwrap());
                i += line[i..].chars().next().unwrap().len_utf8();
            }

            if !closed {
                let message = format!("unterminated string starting at column {}", start + 1);
                error!("{message}");
                return Err(GalError::lex(message, line_number));
            }

            tokens.push(Token::new(TokenKind::String, value, line_number));
            continue;
        }

        if c == '`' {
            tokens.push(Token::new(TokenKind::Comment, &line[i..], line_number));
            break;
        }

        if c == ' ' || c == '\t' {
            tokens.push(Token::new(TokenKind::Whitespace, c.to_string(), line_number));
            i += 1;
            continue;
        }

        if matches!(c, '[' | ']' | '(' | ')' | '{' | '}' | ',') {
            tokens.push(Token::new(TokenKind::Punctuation, c.to_string(), line_number));
            i += 1;
            continue;
        }

        if c == ';' {
            tokens.push(Token::new(TokenKind::Newline, ";", line_number));
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            let mut seen_dot = false;
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_digit() {
                    i += 1;
                } else if ch == '.' && !seen_dot {
                    seen_dot = true;
                    i += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token::new(TokenKind::Number, &line[start..i], line_number));
            continue;
        }

        if matches!(c, '+' | '-' | '*' | '/' | '%' | '=' | '!' | '<' | '>' | '&' | '|' | '^') {
            tokens.push(Token::new(TokenKind::Operator, c.to_string(), line_number));
            i += 1;
            continue;
        }

        if let Some(keyword) = match_keyword(&line[i..]) {
            tokens.push(Token::new(TokenKind::Keyword, keyword, line_number));
            i += keyword.len();
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '.' {
            let start = i;
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                    i += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token::new(TokenKind::Identifier, &line[start..i], line_number));
            continue;
        }

        // Anything else on a line we don't otherwise recognize is skipped;
        // well-formed programs never produce one of these bytes here.
        i += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn lexes_var_declaration() {
        let tokens = lex("fax x = 1").unwrap();
        assert_eq!(
            values(&tokens),
            vec!["fax", " ", "x", " ", "=", " ", "1", "\n"]
        );
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[6].kind, TokenKind::Number);
    }

    #[test]
    fn recognizes_keyword_alternates() {
        let tokens = lex("skibidi yay").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[0].value, "skibidi");
        assert_eq!(tokens[2].value, "yay");
    }

    #[test]
    fn semicolon_is_a_newline() {
        let tokens = lex("fax x = 1; fax y = 2").unwrap();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Newline && t.value == ";"));
    }

    #[test]
    fn string_escape_unescapes_quote() {
        let tokens = lex("\"he said \\\"hi\\\"\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "he said \"hi\"");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("\"oops").unwrap_err();
        assert!(matches!(err, GalError::Lex { .. }));
    }

    #[test]
    fn backtick_comment_runs_to_end_of_line() {
        let tokens = lex("fax x = 1 `this is ignored").unwrap();
        let comment = tokens.iter().find(|t| t.kind == TokenKind::Comment).unwrap();
        assert_eq!(comment.value, "`this is ignored");
    }

    #[test]
    fn number_allows_one_embedded_dot() {
        let tokens = lex("3.14").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, "3.14");
    }

    #[test]
    fn every_line_gets_a_trailing_newline_token() {
        let tokens = lex("fax x = 1\nfax y = 2").unwrap();
        let newline_count = tokens.iter().filter(|t| t.kind == TokenKind::Newline).count();
        assert_eq!(newline_count, 2);
    }
}
