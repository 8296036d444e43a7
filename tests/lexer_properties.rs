//! Property tests for the tokenizer: invariants that must hold across
//! generated inputs, not just hand-picked examples.

use proptest::prelude::*;
use valleyc::lexer::token::{ReservedToken, Token, TokenValue, KEYWORDS, OPERATORS};
use valleyc::lexer::TokenStream;
use valleyc::Error;

fn lex(source: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = TokenStream::new(source)?;
    let mut out = Vec::new();
    while !tokens.current().is_eof() {
        out.push(tokens.current().clone());
        tokens.advance()?;
    }
    Ok(out)
}

#[test]
fn prop_lexing_never_panics() {
    proptest!(|(source in "\\PC{0,400}")| {
        let _ = lex(&source);
    });
}

#[test]
fn prop_lexing_is_deterministic() {
    proptest!(|(source in "\\PC{0,300}")| {
        let first = lex(&source);
        let second = lex(&source);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "lexing was not deterministic"),
        }
    });
}

/// Every operator glyph followed by a non-operator character splits into
/// exactly two tokens: the operator, then whatever the character starts.
#[test]
fn prop_operator_then_word_splits_cleanly() {
    proptest!(|(op_index in 0..OPERATORS.len(), c in "[a-z0-9_]")| {
        let (text, expected) = OPERATORS[op_index];
        let source = format!("{text}{c}");
        let tokens = lex(&source).unwrap();
        prop_assert_eq!(tokens.len(), 2, "source {:?} => {:?}", source, tokens);
        prop_assert_eq!(&tokens[0].value, &TokenValue::Reserved(expected));
    });
}

/// Maximal munch: for every pair (A, B) in the table where A is a proper
/// prefix of B, B on its own lexes to the single token B.
#[test]
fn proper_prefix_pairs_take_the_longer_operator() {
    let mut pairs = 0;
    for (short, _) in OPERATORS {
        for (long, expected) in OPERATORS {
            if long.len() > short.len() && long.starts_with(short) {
                pairs += 1;
                let tokens = lex(long).unwrap();
                assert_eq!(tokens.len(), 1, "{long:?} should be one token");
                assert_eq!(tokens[0].value, TokenValue::Reserved(*expected));
            }
        }
    }
    assert!(pairs > 10, "the table should contain many prefix pairs");
}

/// Two operators separated by whitespace never fuse.
#[test]
fn prop_spaced_operators_stay_apart() {
    proptest!(|(a in 0..OPERATORS.len(), b in 0..OPERATORS.len())| {
        let source = format!("{} {}", OPERATORS[a].0, OPERATORS[b].0);
        let tokens = lex(&source).unwrap();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(&tokens[0].value, &TokenValue::Reserved(OPERATORS[a].1));
        prop_assert_eq!(&tokens[1].value, &TokenValue::Reserved(OPERATORS[b].1));
    });
}

/// Integer literals round-trip through their rendering, suffix included.
#[test]
fn prop_integer_literals_round_trip() {
    proptest!(|(n in 0i8..=i8::MAX)| {
        let token = &lex(&format!("{n}b")).unwrap()[0];
        prop_assert_eq!(&token.value, &TokenValue::Byte(n));
        let relexed = lex(&token.to_string()).unwrap();
        prop_assert_eq!(&relexed[0].value, &token.value);
    });
    proptest!(|(n in 0i16..=i16::MAX)| {
        let token = &lex(&format!("{n}s")).unwrap()[0];
        prop_assert_eq!(&token.value, &TokenValue::Short(n));
        let relexed = lex(&token.to_string()).unwrap();
        prop_assert_eq!(&relexed[0].value, &token.value);
    });
    proptest!(|(n in 0i32..=i32::MAX)| {
        let token = &lex(&n.to_string()).unwrap()[0];
        prop_assert_eq!(&token.value, &TokenValue::Int(n));
        let relexed = lex(&token.to_string()).unwrap();
        prop_assert_eq!(&relexed[0].value, &token.value);
    });
    proptest!(|(n in 0i64..=i64::MAX)| {
        let token = &lex(&format!("{n}l")).unwrap()[0];
        prop_assert_eq!(&token.value, &TokenValue::Long(n));
        let relexed = lex(&token.to_string()).unwrap();
        prop_assert_eq!(&relexed[0].value, &token.value);
    });
}

/// Double literals in a tame range round-trip through their rendering.
#[test]
fn prop_double_literals_round_trip() {
    proptest!(|(n in 0.0f64..1.0e9)| {
        let source = format!("{n:?}");
        prop_assume!(source.contains('.') && !source.contains('e'));
        let token = &lex(&source).unwrap()[0];
        prop_assert_eq!(&token.value, &TokenValue::Double(n));
        let relexed = lex(&token.to_string()).unwrap();
        prop_assert_eq!(&relexed[0].value, &token.value);
    });
}

/// `elif` never reaches the token stream: it surfaces as `else` followed by
/// `if`, at the `elif` position.
#[test]
fn prop_elif_is_rewritten() {
    proptest!(|(before in "[a-z]{0,6}", spaces in " {1,3}")| {
        prop_assume!(valleyc::lexer::token::get_keyword(&before).is_none());
        let source = if before.is_empty() {
            "elif".to_string()
        } else {
            format!("{before}{spaces}elif")
        };
        let tokens = lex(&source).unwrap();
        prop_assert!(tokens.iter().all(|t| !t.is(ReservedToken::KwElif)));
        let else_at = tokens
            .iter()
            .position(|t| t.is(ReservedToken::KwElse))
            .expect("an else token");
        prop_assert!(tokens[else_at + 1].is(ReservedToken::KwIf));
        prop_assert_eq!(tokens[else_at].pos.index, source.len() - 4);
    });
}

/// Keywords always lex as reserved tokens, never identifiers.
#[test]
fn keywords_are_never_identifiers() {
    for (text, expected) in KEYWORDS {
        let tokens = lex(text).unwrap();
        if *expected == ReservedToken::KwElif {
            continue; // rewritten to else + if
        }
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, TokenValue::Reserved(*expected));
    }
}

/// Identifiers that merely contain a keyword stay whole.
#[test]
fn keyword_prefixed_identifiers_stay_identifiers() {
    for word in ["iff", "intx", "elsewhere", "breaker", "do_it", "_for"] {
        let tokens = lex(word).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, TokenValue::Identifier(word.to_string()));
    }
}
