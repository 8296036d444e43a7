pub mod stream;
pub mod token;

use crate::diagnostics::Error;
use crate::span::Pos;
use stream::PushBackStream;
use token::{get_keyword, get_operator, ReservedToken, Token, TokenValue};

#[derive(PartialEq)]
enum CharClass {
    Whitespace,
    Alpha,
    Numeric,
    Other,
}

fn char_class(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_ascii_alphabetic() || c == '_' {
        CharClass::Alpha
    } else if c.is_ascii_digit() {
        CharClass::Numeric
    } else {
        CharClass::Other
    }
}

/// Longest prefix of `word` that reads as a float: digits and dots, plus a
/// digits-only exponent. A sign can never appear here since `+`/`-` end the
/// word at scan time.
fn float_prefix_len(word: &str) -> usize {
    let bytes = word.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Error for an unrecognized literal suffix, pointing at its first character.
fn suffix_error(word: &str, prefix_len: usize, pos: Pos) -> Error {
    let suffix_char = word[prefix_len..].chars().next().unwrap_or('?');
    Error::unexpected(
        suffix_char.to_string(),
        Pos::new(pos.line, pos.index + prefix_len),
        false,
    )
}

fn fetch_word(stream: &mut PushBackStream, pos: Pos, first: char) -> Result<Token, Error> {
    let mut word = String::new();
    word.push(first);
    let is_number = first.is_ascii_digit() || first == '.';
    let mut is_double = false;

    loop {
        let c = stream.next();
        if is_number && c == Some('.') {
            if is_double {
                let dot_pos = Pos::new(stream.line_number(), stream.char_index() - 1);
                return Err(Error::unexpected(".", dot_pos, true));
            }
            is_double = true;
        }
        match c {
            Some(ch)
                if ch.is_ascii_alphanumeric() || ch == '_' || (is_number && ch == '.') =>
            {
                word.push(ch);
            }
            Some(ch) => {
                stream.push_back(ch);
                break;
            }
            None => break,
        }
    }

    if let Some(t) = get_keyword(&word) {
        if t == ReservedToken::KwElif {
            // Surfaced as 'else' with 'if' re-injected so the statement
            // parser only ever sees 'else if'.
            stream.push_back('f');
            stream.push_back('i');
            return Ok(Token::new(TokenValue::Reserved(ReservedToken::KwElse), pos));
        }
        return Ok(Token::new(TokenValue::Reserved(t), pos));
    }

    let literal_len = word.chars().count();

    if is_double {
        let prefix_len = float_prefix_len(&word);
        let (number, suffix) = word.split_at(prefix_len);
        let value: f64 = number
            .parse()
            .map_err(|_| Error::syntax("malformed number literal.", pos, literal_len))?;
        return match suffix {
            "" => Ok(Token::new(TokenValue::Double(value), pos)),
            s if s.eq_ignore_ascii_case("f") => {
                Ok(Token::new(TokenValue::Float(value as f32), pos))
            }
            s if s.eq_ignore_ascii_case("d") => Ok(Token::new(TokenValue::Double(value), pos)),
            _ => Err(suffix_error(&word, prefix_len, pos)),
        };
    }

    if is_number {
        let prefix_len = word.bytes().take_while(u8::is_ascii_digit).count();
        let (digits, suffix) = word.split_at(prefix_len);
        let value: Option<i64> = digits.parse().ok();
        return match suffix {
            "" => value
                .and_then(|n| i32::try_from(n).ok())
                .map(|n| Token::new(TokenValue::Int(n), pos))
                .ok_or_else(|| {
                    Error::syntax(
                        "integer value too large for type 'int' (-2^31 to 2^31-1).",
                        pos,
                        literal_len,
                    )
                }),
            s if s.eq_ignore_ascii_case("i") => value
                .and_then(|n| i32::try_from(n).ok())
                .map(|n| Token::new(TokenValue::Int(n), pos))
                .ok_or_else(|| {
                    Error::syntax(
                        "integer value too large for type 'int' (-2^31 to 2^31-1).",
                        pos,
                        literal_len,
                    )
                }),
            s if s.eq_ignore_ascii_case("b") => value
                .and_then(|n| i8::try_from(n).ok())
                .map(|n| Token::new(TokenValue::Byte(n), pos))
                .ok_or_else(|| {
                    Error::syntax(
                        "integer value out of range for type 'byte' (-2^7 to 2^7-1).",
                        pos,
                        literal_len,
                    )
                }),
            s if s.eq_ignore_ascii_case("s") => value
                .and_then(|n| i16::try_from(n).ok())
                .map(|n| Token::new(TokenValue::Short(n), pos))
                .ok_or_else(|| {
                    Error::syntax(
                        "integer value too large for type 'short' (-2^15 to 2^15-1).",
                        pos,
                        literal_len,
                    )
                }),
            s if s.eq_ignore_ascii_case("l") => value
                .map(|n| Token::new(TokenValue::Long(n), pos))
                .ok_or_else(|| {
                    Error::syntax(
                        "integer value too large for type 'long' (-2^63 to 2^63-1).",
                        pos,
                        literal_len,
                    )
                }),
            _ => Err(suffix_error(&word, prefix_len, pos)),
        };
    }

    Ok(Token::new(TokenValue::Identifier(word), pos))
}

fn unterminated_string(stream: &PushBackStream, pos: Pos) -> Error {
    Error::syntax(
        "could not find a matching '\"'.",
        Pos::new(pos.line, pos.index - 1),
        stream.char_index() - pos.index,
    )
}

/// Called with the opening quote already consumed; `pos` is the position
/// just past it.
fn fetch_string(stream: &mut PushBackStream, pos: Pos) -> Result<Token, Error> {
    let mut value = String::new();
    let mut escaped = false;
    while let Some(c) = stream.next() {
        if c == '\\' && !escaped {
            escaped = true;
        } else if escaped {
            match c {
                't' => value.push('\t'),
                'n' => value.push('\n'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                other => value.push(other),
            }
            escaped = false;
        } else {
            match c {
                '\t' | '\n' | '\r' => {
                    stream.push_back(c);
                    return Err(unterminated_string(stream, pos));
                }
                '"' => return Ok(Token::new(TokenValue::Str(value), pos)),
                other => value.push(other),
            }
        }
    }
    Err(unterminated_string(stream, pos))
}

fn fetch_operator(stream: &mut PushBackStream, pos: Pos) -> Result<Token, Error> {
    if let Some(t) = get_operator(stream) {
        return Ok(Token::new(TokenValue::Reserved(t), pos));
    }
    let err_pos = stream.pos();
    let mut unexpected = String::new();
    while let Some(c) = stream.next() {
        if char_class(c) != CharClass::Other {
            break;
        }
        unexpected.push(c);
    }
    Err(Error::unexpected(unexpected, err_pos, false))
}

fn skip_line_comment(stream: &mut PushBackStream) {
    while let Some(c) = stream.next() {
        if c == '\n' {
            return;
        }
    }
}

/// Called with `/*` already consumed.
fn skip_block_comment(stream: &mut PushBackStream, pos: Pos) -> Result<(), Error> {
    let mut closing = false;
    while let Some(c) = stream.next() {
        if closing && c == '/' {
            return Ok(());
        }
        closing = c == '*';
    }
    Err(Error::syntax(
        "could not find a matching '*/'.",
        Pos::new(pos.line, pos.index - 1),
        2,
    ))
}

/// Produce the next token from the stream.
pub fn tokenize(stream: &mut PushBackStream) -> Result<Token, Error> {
    loop {
        let pos = stream.pos();
        let Some(c) = stream.next() else {
            return Ok(Token::new(TokenValue::Eof, pos));
        };
        match char_class(c) {
            CharClass::Whitespace => continue,
            CharClass::Alpha | CharClass::Numeric => return fetch_word(stream, pos, c),
            CharClass::Other => match c {
                '"' => return fetch_string(stream, stream.pos()),
                '/' => {
                    match stream.next() {
                        Some('/') => {
                            skip_line_comment(stream);
                            continue;
                        }
                        Some('*') => {
                            skip_block_comment(stream, stream.pos())?;
                            continue;
                        }
                        Some(c1) => stream.push_back(c1),
                        None => {}
                    }
                    stream.push_back('/');
                    return fetch_operator(stream, pos);
                }
                _ => {
                    stream.push_back(c);
                    return fetch_operator(stream, pos);
                }
            },
        }
    }
}

/// Lazy token cursor over a character stream. Holds exactly one current
/// token plus a one-slot step-back buffer for the statement parser's
/// `else` lookahead.
pub struct TokenStream<'a> {
    stream: PushBackStream<'a>,
    current: Token,
    pushed: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Result<Self, Error> {
        let mut stream = PushBackStream::new(source);
        let current = tokenize(&mut stream)?;
        Ok(Self {
            stream,
            current,
            pushed: None,
        })
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn advance(&mut self) -> Result<&Token, Error> {
        self.current = match self.pushed.take() {
            Some(token) => token,
            None => tokenize(&mut self.stream)?,
        };
        Ok(&self.current)
    }

    /// Restore `prior` as the current token; the displaced token is buffered
    /// and comes back on the next `advance`.
    pub fn step_back(&mut self, prior: Token) {
        self.pushed = Some(std::mem::replace(&mut self.current, prior));
    }
}
