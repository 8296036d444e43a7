use std::fmt;

use super::stream::PushBackStream;
use crate::span::Pos;

/// Every reserved operator glyph and keyword. A reserved token is never an
/// identifier, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedToken {
    Ampersand,
    AngleL,
    AngleR,
    Asterisk,
    At,
    Backslash,
    Bar,
    Caret,
    Colon,
    Comma,
    CurlyL,
    CurlyR,
    Dollar,
    Equal,
    Exclamation,
    Hash,
    Hyphen,
    Percent,
    Period,
    Plus,
    Question,
    RoundL,
    RoundR,
    Semicolon,
    Slash,
    SquareL,
    SquareR,
    Tilde,

    DAmpersand,
    DAngleL,
    DAngleR,
    DAsterisk,
    DBar,
    DCaret,
    DEqual,
    DHyphen,
    DPlus,

    AmpersandEqual,
    AngleLEqual,
    AngleREqual,
    AsteriskEqual,
    BarEqual,
    CaretEqual,
    ExclamationEqual,
    HyphenEqual,
    PercentEqual,
    PlusEqual,
    SlashEqual,

    DAngleLEqual,
    DAngleREqual,
    DAsteriskEqual,

    Arrow,
    Ellipsis,

    KwBreak,
    KwCase,
    KwCatch,
    KwContinue,
    KwDefault,
    KwDo,
    KwElif,
    KwElse,
    KwFinal,
    KwFinally,
    KwFor,
    KwIf,
    KwImport,
    KwReturn,
    KwStatic,
    KwSwitch,
    KwTry,
    KwWhile,

    TypeAny,
    TypeBool,
    TypeByte,
    TypeChar,
    TypeClass,
    TypeDouble,
    TypeFloat,
    TypeFunc,
    TypeInt,
    TypeLong,
    TypeShort,
    TypeStr,
    TypeVoid,
}

/// Operator glyphs, sorted by text for the maximal-munch range scan.
pub const OPERATORS: &[(&str, ReservedToken)] = &[
    ("!", ReservedToken::Exclamation),
    ("!=", ReservedToken::ExclamationEqual),
    ("#", ReservedToken::Hash),
    ("$", ReservedToken::Dollar),
    ("%", ReservedToken::Percent),
    ("%=", ReservedToken::PercentEqual),
    ("&", ReservedToken::Ampersand),
    ("&&", ReservedToken::DAmpersand),
    ("&=", ReservedToken::AmpersandEqual),
    ("(", ReservedToken::RoundL),
    (")", ReservedToken::RoundR),
    ("*", ReservedToken::Asterisk),
    ("**", ReservedToken::DAsterisk),
    ("**=", ReservedToken::DAsteriskEqual),
    ("*=", ReservedToken::AsteriskEqual),
    ("+", ReservedToken::Plus),
    ("++", ReservedToken::DPlus),
    ("+=", ReservedToken::PlusEqual),
    (",", ReservedToken::Comma),
    ("-", ReservedToken::Hyphen),
    ("--", ReservedToken::DHyphen),
    ("-=", ReservedToken::HyphenEqual),
    ("->", ReservedToken::Arrow),
    (".", ReservedToken::Period),
    ("...", ReservedToken::Ellipsis),
    ("/", ReservedToken::Slash),
    ("/=", ReservedToken::SlashEqual),
    (":", ReservedToken::Colon),
    (";", ReservedToken::Semicolon),
    ("<", ReservedToken::AngleL),
    ("<<", ReservedToken::DAngleL),
    ("<<=", ReservedToken::DAngleLEqual),
    ("<=", ReservedToken::AngleLEqual),
    ("=", ReservedToken::Equal),
    ("==", ReservedToken::DEqual),
    (">", ReservedToken::AngleR),
    (">=", ReservedToken::AngleREqual),
    (">>", ReservedToken::DAngleR),
    (">>=", ReservedToken::DAngleREqual),
    ("?", ReservedToken::Question),
    ("@", ReservedToken::At),
    ("[", ReservedToken::SquareL),
    ("\\", ReservedToken::Backslash),
    ("]", ReservedToken::SquareR),
    ("^", ReservedToken::Caret),
    ("^=", ReservedToken::CaretEqual),
    ("^^", ReservedToken::DCaret),
    ("{", ReservedToken::CurlyL),
    ("|", ReservedToken::Bar),
    ("|=", ReservedToken::BarEqual),
    ("||", ReservedToken::DBar),
    ("}", ReservedToken::CurlyR),
    ("~", ReservedToken::Tilde),
];

/// Keywords, sorted by text.
pub const KEYWORDS: &[(&str, ReservedToken)] = &[
    ("any", ReservedToken::TypeAny),
    ("bool", ReservedToken::TypeBool),
    ("break", ReservedToken::KwBreak),
    ("byte", ReservedToken::TypeByte),
    ("case", ReservedToken::KwCase),
    ("catch", ReservedToken::KwCatch),
    ("char", ReservedToken::TypeChar),
    ("class", ReservedToken::TypeClass),
    ("continue", ReservedToken::KwContinue),
    ("default", ReservedToken::KwDefault),
    ("do", ReservedToken::KwDo),
    ("double", ReservedToken::TypeDouble),
    ("elif", ReservedToken::KwElif),
    ("else", ReservedToken::KwElse),
    ("final", ReservedToken::KwFinal),
    ("finally", ReservedToken::KwFinally),
    ("float", ReservedToken::TypeFloat),
    ("for", ReservedToken::KwFor),
    ("func", ReservedToken::TypeFunc),
    ("if", ReservedToken::KwIf),
    ("import", ReservedToken::KwImport),
    ("int", ReservedToken::TypeInt),
    ("long", ReservedToken::TypeLong),
    ("return", ReservedToken::KwReturn),
    ("short", ReservedToken::TypeShort),
    ("static", ReservedToken::KwStatic),
    ("str", ReservedToken::TypeStr),
    ("switch", ReservedToken::KwSwitch),
    ("try", ReservedToken::KwTry),
    ("void", ReservedToken::TypeVoid),
    ("while", ReservedToken::KwWhile),
];

pub fn get_keyword(word: &str) -> Option<ReservedToken> {
    KEYWORDS
        .binary_search_by_key(&word, |entry| entry.0)
        .ok()
        .map(|i| KEYWORDS[i].1)
}

/// Maximal-munch operator recognition. Extends the candidate prefix one
/// character at a time against the sorted table, remembers the longest
/// exact match, and pushes surplus characters back before returning.
pub fn get_operator(stream: &mut PushBackStream) -> Option<ReservedToken> {
    let mut consumed: Vec<char> = Vec::new();
    let mut prefix = String::new();
    let mut matched: Option<(ReservedToken, usize)> = None;

    loop {
        let Some(c) = stream.next() else {
            break;
        };
        consumed.push(c);
        prefix.push(c);

        let mut any_candidate = false;
        for (text, token) in OPERATORS {
            if text.starts_with(prefix.as_str()) {
                any_candidate = true;
                if text.len() == prefix.len() {
                    matched = Some((*token, prefix.chars().count()));
                }
            }
        }
        if !any_candidate {
            break;
        }
    }

    let keep = matched.map_or(0, |(_, len)| len);
    while consumed.len() > keep {
        if let Some(c) = consumed.pop() {
            stream.push_back(c);
        }
    }
    matched.map(|(token, _)| token)
}

/// Textual form of a reserved token, for error messages and rendering.
pub fn reserved_repr(t: ReservedToken) -> &'static str {
    OPERATORS
        .iter()
        .chain(KEYWORDS.iter())
        .find(|(_, token)| *token == t)
        .map(|(text, _)| *text)
        .unwrap_or("")
}

/// The value carried by a token: one variant per literal primitive, plus
/// reserved tokens, identifiers, and end of stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Eof,
    Reserved(ReservedToken),
    Identifier(String),
    Null,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: TokenValue,
    pub pos: Pos,
}

impl Token {
    pub fn new(value: TokenValue, pos: Pos) -> Self {
        Self { value, pos }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.value, TokenValue::Eof)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.value, TokenValue::Identifier(_))
    }

    pub fn reserved(&self) -> Option<ReservedToken> {
        match self.value {
            TokenValue::Reserved(t) => Some(t),
            _ => None,
        }
    }

    /// Whether this token is exactly the given reserved token.
    pub fn is(&self, t: ReservedToken) -> bool {
        self.reserved() == Some(t)
    }

    pub fn is_literal(&self) -> bool {
        !matches!(
            self.value,
            TokenValue::Eof | TokenValue::Reserved(_) | TokenValue::Identifier(_)
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self.value,
            TokenValue::Byte(_)
                | TokenValue::Short(_)
                | TokenValue::Int(_)
                | TokenValue::Long(_)
                | TokenValue::Bool(_)
                | TokenValue::Char(_)
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self.value, TokenValue::Float(_) | TokenValue::Double(_))
    }
}

fn write_double(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    // Keep a decimal point so the rendering re-tokenizes as a double.
    if value.fract() == 0.0 && value.is_finite() {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            TokenValue::Eof => Ok(()),
            TokenValue::Reserved(t) => write!(f, "{}", reserved_repr(*t)),
            TokenValue::Identifier(name) => write!(f, "{name}"),
            TokenValue::Null => write!(f, "null"),
            TokenValue::Byte(n) => write!(f, "{n}b"),
            TokenValue::Short(n) => write!(f, "{n}s"),
            TokenValue::Int(n) => write!(f, "{n}"),
            TokenValue::Long(n) => write!(f, "{n}l"),
            TokenValue::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{n:.1}f")
                } else {
                    write!(f, "{n}f")
                }
            }
            TokenValue::Double(n) => write_double(f, *n),
            TokenValue::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            TokenValue::Char(c) => write!(f, "'{c}'"),
            TokenValue::Str(s) => write!(f, "\"{s}\""),
        }
    }
}
