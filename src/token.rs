//! Token kinds, the reserved-keyword table, and the flat `Token` the lexer
//! produces (spec §3, §6).

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Boolean,
    Keyword,
    Operator,
    Punctuation,
    Comment,
    Whitespace,
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize) -> Self {
        Self { kind, value: value.into(), line }
    }
}

/// Every reserved keyword spelling, including the older-dialect aliases
/// (`skibidi` for `foreal`, `yap` for `durin`). Both `yay`/`nay` double as
/// the canonical text of the two boolean literals (spec §6).
pub const KEYWORD_VAR: &str = "fax";
pub const KEYWORD_IF: &str = "foreal";
pub const KEYWORD_IF_ALT: &str = "skibidi";
pub const KEYWORD_IF_YES: &str = "yeah";
pub const KEYWORD_IF_NO: &str = "nah";
pub const KEYWORD_FUNC: &str = "lowkey";
pub const KEYWORD_END: &str = "end";
pub const KEYWORD_CALL: &str = "fire";
pub const KEYWORD_WHILE: &str = "durin";
pub const KEYWORD_WHILE_ALT: &str = "yap";
pub const KEYWORD_IMPORT: &str = "gyat";
pub const KEYWORD_RETURN: &str = "rizzult";
pub const KEYWORD_TRUE: &str = "yay";
pub const KEYWORD_FALSE: &str = "nay";
pub const KEYWORD_NONE: &str = "nuthin";

/// All reserved spellings, longest first, so a longest-prefix table lookup
/// (spec §4.1 rule 8) never matches a short keyword that is itself a
/// prefix of a longer one.
pub static KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut keywords = vec![
        KEYWORD_VAR,
        KEYWORD_IF,
        KEYWORD_IF_ALT,
        KEYWORD_IF_YES,
        KEYWORD_IF_NO,
        KEYWORD_FUNC,
        KEYWORD_END,
        KEYWORD_CALL,
        KEYWORD_WHILE,
        KEYWORD_WHILE_ALT,
        KEYWORD_IMPORT,
        KEYWORD_RETURN,
        KEYWORD_TRUE,
        KEYWORD_FALSE,
        KEYWORD_NONE,
    ];
    keywords.sort_by_key(|kw| std::cmp::Reverse(kw.len()));
    keywords
});

/// If `rest` (the remainder of the current line, starting at the lexer's
/// position) begins with a reserved keyword, return it.
pub fn match_keyword(rest: &str) -> Option<&'static str> {
    KEYWORDS.iter().find(|kw| rest.starts_with(*kw)).copied()
}

pub fn is_if_keyword(value: &str) -> bool {
    value == KEYWORD_IF || value == KEYWORD_IF_ALT
}

pub fn is_while_keyword(value: &str) -> bool {
    value == KEYWORD_WHILE || value == KEYWORD_WHILE_ALT
}
