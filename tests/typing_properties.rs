//! Property tests for expression typing: unary preservation and the
//! max-precision rule for arithmetic, driven through real source text.

use proptest::prelude::*;
use valleyc::lexer::TokenStream;
use valleyc::parser::ast::Expression;
use valleyc::parser::expr::parse_checked_expression;
use valleyc::types::{TypeHandle, TypeRegistry};
use valleyc::{CompilerContext, Error};

/// Literal spellings for every numeric primitive that has one (`char` has
/// no literal form and is covered by unit tests on the node constructor).
const NUMERIC_LITERALS: &[(&str, TypeHandle)] = &[
    ("1b", TypeRegistry::BYTE),
    ("2s", TypeRegistry::SHORT),
    ("3", TypeRegistry::INT),
    ("4l", TypeRegistry::LONG),
    ("1.5f", TypeRegistry::FLOAT),
    ("2.5", TypeRegistry::DOUBLE),
    ("true", TypeRegistry::BOOL),
];

/// The precision order `double > float > long > int > short > byte > char
/// > bool`, used to compute the expected result type independently.
fn max_precision(a: TypeHandle, b: TypeHandle) -> TypeHandle {
    for candidate in [
        TypeRegistry::DOUBLE,
        TypeRegistry::FLOAT,
        TypeRegistry::LONG,
        TypeRegistry::INT,
        TypeRegistry::SHORT,
        TypeRegistry::BYTE,
        TypeRegistry::CHAR,
        TypeRegistry::BOOL,
    ] {
        if a == candidate || b == candidate {
            return candidate;
        }
    }
    TypeRegistry::VOID
}

fn parse_expr(source: &str) -> Result<Expression, Error> {
    let mut context = CompilerContext::new();
    context.create_identifier("true", TypeRegistry::BOOL, true, true);
    context.create_identifier("false", TypeRegistry::BOOL, true, true);
    let mut tokens = TokenStream::new(source)?;
    let expr = parse_checked_expression(
        &mut context,
        &mut tokens,
        TypeRegistry::VOID,
        false,
        false,
        false,
    )?;
    Ok(expr.expect("a non-empty expression"))
}

#[test]
fn prop_addition_takes_max_precision() {
    proptest!(|(a in 0..NUMERIC_LITERALS.len(), b in 0..NUMERIC_LITERALS.len())| {
        let (lhs, lhs_ty) = NUMERIC_LITERALS[a];
        let (rhs, rhs_ty) = NUMERIC_LITERALS[b];
        let expr = parse_expr(&format!("{lhs} + {rhs}")).unwrap();
        prop_assert_eq!(expr.ty(), max_precision(lhs_ty, rhs_ty));
        prop_assert!(!expr.lvalue());
    });
}

#[test]
fn prop_every_arithmetic_operator_agrees_on_the_result_type() {
    proptest!(|(a in 0..NUMERIC_LITERALS.len(),
                b in 0..NUMERIC_LITERALS.len(),
                op in proptest::sample::select(vec!["+", "-", "*", "/", "%", "**"]))| {
        let (lhs, lhs_ty) = NUMERIC_LITERALS[a];
        let (rhs, rhs_ty) = NUMERIC_LITERALS[b];
        let expr = parse_expr(&format!("{lhs} {op} {rhs}")).unwrap();
        prop_assert_eq!(expr.ty(), max_precision(lhs_ty, rhs_ty));
    });
}

#[test]
fn prop_unary_plus_preserves_double_typing() {
    proptest!(|(a in 0..NUMERIC_LITERALS.len(), b in 0..NUMERIC_LITERALS.len())| {
        let (lhs, _) = NUMERIC_LITERALS[a];
        let (rhs, _) = NUMERIC_LITERALS[b];
        let inner = parse_expr(&format!("{lhs} + {rhs}")).unwrap();
        let wrapped = parse_expr(&format!("+({lhs} + {rhs})")).unwrap();
        prop_assert_eq!(wrapped.ty(), inner.ty());
        if inner.ty() == TypeRegistry::DOUBLE {
            prop_assert_eq!(wrapped.ty(), TypeRegistry::DOUBLE);
        }
    });
}

#[test]
fn prop_logical_not_yields_bool() {
    proptest!(|(a in 0..NUMERIC_LITERALS.len())| {
        let (operand, _) = NUMERIC_LITERALS[a];
        let expr = parse_expr(&format!("!{operand}")).unwrap();
        prop_assert_eq!(expr.ty(), TypeRegistry::BOOL);
    });
}

#[test]
fn prop_comparisons_yield_bool() {
    proptest!(|(a in 0..NUMERIC_LITERALS.len(),
                b in 0..NUMERIC_LITERALS.len(),
                op in proptest::sample::select(vec!["<", ">", "<=", ">=", "==", "!="]))| {
        let (lhs, _) = NUMERIC_LITERALS[a];
        let (rhs, _) = NUMERIC_LITERALS[b];
        let expr = parse_expr(&format!("{lhs} {op} {rhs}")).unwrap();
        prop_assert_eq!(expr.ty(), TypeRegistry::BOOL);
    });
}

#[test]
fn prop_ternary_over_numeric_branches_absorbs() {
    proptest!(|(a in 0..NUMERIC_LITERALS.len(), b in 0..NUMERIC_LITERALS.len())| {
        let (then, then_ty) = NUMERIC_LITERALS[a];
        let (other, other_ty) = NUMERIC_LITERALS[b];
        let expr = parse_expr(&format!("true ? {then} : {other}"));
        // One branch must absorb the other; when neither converts the
        // parse fails with a TypeError instead.
        match expr {
            Ok(expr) => prop_assert!(expr.ty() == then_ty || expr.ty() == other_ty),
            Err(err) => prop_assert_eq!(err.name(), "TypeError"),
        }
    });
}
