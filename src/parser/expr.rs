use super::ast::{ExprValue, Expression, Operation};
use crate::context::CompilerContext;
use crate::diagnostics::Error;
use crate::lexer::token::{reserved_repr, ReservedToken, Token, TokenValue};
use crate::lexer::TokenStream;
use crate::span::Pos;
use crate::types::TypeHandle;

/// Binding strength, strongest first. The derived order backs the
/// evaluated-before relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Postfix,
    Prefix,
    Power,
    Multiplicative,
    Additive,
    Shift,
    Inequality,
    Equality,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    LogicalAnd,
    LogicalXor,
    LogicalOr,
    Assignment,
    Comma,
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Associativity {
    LeftToRight,
    RightToLeft,
}

struct OperatorInfo {
    operation: Operation,
    precedence: Precedence,
    associativity: Associativity,
    operands: usize,
    pos: Pos,
}

impl OperatorInfo {
    fn new(operation: Operation, pos: Pos) -> Self {
        let precedence = match operation {
            Operation::IncAfter | Operation::DecAfter | Operation::Subscript | Operation::Call => {
                Precedence::Postfix
            }
            Operation::IncBefore
            | Operation::DecBefore
            | Operation::Pos
            | Operation::Neg
            | Operation::BitNot
            | Operation::LogicNot => Precedence::Prefix,
            Operation::Pow => Precedence::Power,
            Operation::Mul | Operation::Div | Operation::Mod => Precedence::Multiplicative,
            Operation::Add | Operation::Sub => Precedence::Additive,
            Operation::Shl | Operation::Shr => Precedence::Shift,
            Operation::Lt | Operation::Gt | Operation::LtEq | Operation::GtEq => {
                Precedence::Inequality
            }
            Operation::Eq | Operation::Neq => Precedence::Equality,
            Operation::BitAnd => Precedence::BitwiseAnd,
            Operation::BitXor => Precedence::BitwiseXor,
            Operation::BitOr => Precedence::BitwiseOr,
            Operation::LogicAnd => Precedence::LogicalAnd,
            Operation::LogicXor => Precedence::LogicalXor,
            Operation::LogicOr => Precedence::LogicalOr,
            Operation::Assign
            | Operation::AssignAdd
            | Operation::AssignSub
            | Operation::AssignMul
            | Operation::AssignDiv
            | Operation::AssignMod
            | Operation::AssignPow
            | Operation::AssignAnd
            | Operation::AssignOr
            | Operation::AssignXor
            | Operation::AssignShl
            | Operation::AssignShr
            | Operation::Ternary => Precedence::Assignment,
            Operation::Comma => Precedence::Comma,
            Operation::Array => Precedence::Container,
        };

        let associativity = match precedence {
            Precedence::Assignment | Precedence::Prefix => Associativity::RightToLeft,
            _ => Associativity::LeftToRight,
        };

        let operands = match operation {
            Operation::IncBefore
            | Operation::IncAfter
            | Operation::DecBefore
            | Operation::DecAfter
            | Operation::Pos
            | Operation::Neg
            | Operation::BitNot
            | Operation::LogicNot
            | Operation::Call
            | Operation::Array => 1,
            Operation::Ternary => 3,
            _ => 2,
        };

        Self {
            operation,
            precedence,
            associativity,
            operands,
            pos,
        }
    }
}

/// Map a reserved token to its operation; `prefix` selects the unary
/// reading where one exists.
fn operator_info(token: ReservedToken, prefix: bool, pos: Pos) -> Result<OperatorInfo, Error> {
    let operation = match token {
        ReservedToken::DPlus => {
            if prefix {
                Operation::IncBefore
            } else {
                Operation::IncAfter
            }
        }
        ReservedToken::DHyphen => {
            if prefix {
                Operation::DecBefore
            } else {
                Operation::DecAfter
            }
        }
        ReservedToken::Plus => {
            if prefix {
                Operation::Pos
            } else {
                Operation::Add
            }
        }
        ReservedToken::Hyphen => {
            if prefix {
                Operation::Neg
            } else {
                Operation::Sub
            }
        }
        ReservedToken::Asterisk => Operation::Mul,
        ReservedToken::Slash => Operation::Div,
        ReservedToken::Percent => Operation::Mod,
        ReservedToken::DAsterisk => Operation::Pow,
        ReservedToken::Tilde => Operation::BitNot,
        ReservedToken::Exclamation => Operation::LogicNot,
        ReservedToken::Ampersand => Operation::BitAnd,
        ReservedToken::Bar => Operation::BitOr,
        ReservedToken::Caret => Operation::BitXor,
        ReservedToken::DAngleL => Operation::Shl,
        ReservedToken::DAngleR => Operation::Shr,
        ReservedToken::Equal => Operation::Assign,
        ReservedToken::PlusEqual => Operation::AssignAdd,
        ReservedToken::HyphenEqual => Operation::AssignSub,
        ReservedToken::AsteriskEqual => Operation::AssignMul,
        ReservedToken::SlashEqual => Operation::AssignDiv,
        ReservedToken::PercentEqual => Operation::AssignMod,
        ReservedToken::DAsteriskEqual => Operation::AssignPow,
        ReservedToken::AmpersandEqual => Operation::AssignAnd,
        ReservedToken::BarEqual => Operation::AssignOr,
        ReservedToken::CaretEqual => Operation::AssignXor,
        ReservedToken::DAngleLEqual => Operation::AssignShl,
        ReservedToken::DAngleREqual => Operation::AssignShr,
        ReservedToken::DEqual => Operation::Eq,
        ReservedToken::ExclamationEqual => Operation::Neq,
        ReservedToken::AngleL => Operation::Lt,
        ReservedToken::AngleR => Operation::Gt,
        ReservedToken::AngleLEqual => Operation::LtEq,
        ReservedToken::AngleREqual => Operation::GtEq,
        ReservedToken::DAmpersand => Operation::LogicAnd,
        ReservedToken::DBar => Operation::LogicOr,
        ReservedToken::DCaret => Operation::LogicXor,
        ReservedToken::Question => Operation::Ternary,
        ReservedToken::Comma => Operation::Comma,
        ReservedToken::RoundL => Operation::Call,
        ReservedToken::SquareL => Operation::Subscript,
        other => return Err(Error::unexpected(reserved_repr(other), pos, false)),
    };
    Ok(OperatorInfo::new(operation, pos))
}

/// Tokens that terminate the expression at this nesting level.
fn is_expression_end(token: &Token, allow_comma: bool) -> bool {
    match token.reserved() {
        Some(
            ReservedToken::Semicolon
            | ReservedToken::Colon
            | ReservedToken::RoundR
            | ReservedToken::SquareR
            | ReservedToken::CurlyR,
        ) => true,
        Some(ReservedToken::Comma) => !allow_comma,
        _ => token.is_eof(),
    }
}

fn is_evaluated_before(l: &OperatorInfo, r: &OperatorInfo) -> bool {
    if l.associativity == Associativity::LeftToRight {
        l.precedence <= r.precedence
    } else {
        l.precedence < r.precedence
    }
}

/// Reduce the top operator against the operand stack.
fn pop_operator(
    context: &mut CompilerContext,
    operators: &mut Vec<OperatorInfo>,
    operands: &mut Vec<Expression>,
    pos: Pos,
) -> Result<(), Error> {
    let Some(mut top) = operators.pop() else {
        return Err(Error::compile(
            "failed to parse expression. (no operator to reduce.)",
            pos,
            0,
        ));
    };
    if operands.len() < top.operands {
        return Err(Error::compile(
            format!(
                "failed to parse expression. (expected {} operands, got {}.)",
                top.operands,
                operands.len()
            ),
            pos,
            0,
        ));
    }
    if top.precedence != Precedence::Prefix {
        if let Some(last) = operands.last() {
            top.pos = last.pos();
        }
    }
    let children = operands.split_off(operands.len() - top.operands);
    let node = Expression::new(context, ExprValue::Operation(top.operation), children, top.pos)?;
    operands.push(node);
    Ok(())
}

/// The two-stack parse. Returns `Ok(None)` when no expression was present;
/// the stream is left on the terminating token.
fn shunt(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
    allow_comma: bool,
) -> Result<Option<Expression>, Error> {
    let mut operands: Vec<Expression> = Vec::new();
    let mut operators: Vec<OperatorInfo> = Vec::new();
    let mut expecting_operand = true;

    'parse: loop {
        let token = tokens.current();
        if is_expression_end(token, allow_comma) {
            break;
        }
        let pos = token.pos;

        if let Some(rt) = token.reserved() {
            let mut info = operator_info(rt, expecting_operand, pos)?;

            if info.operation == Operation::Call && expecting_operand {
                // Expression grouping: (expr)
                tokens.advance()?;
                let inner = parse_expression(context, tokens, false)?;
                if !tokens.current().is(ReservedToken::RoundR) {
                    return Err(Error::syntax("could not find a matching ')'.", info.pos, 0));
                }
                operands.push(inner);
                expecting_operand = false;
                tokens.advance()?;
                continue;
            }

            if info.operation == Operation::Subscript && expecting_operand {
                // Array literal: [item, ...]
                info.operation = Operation::Array;
                info.precedence = Precedence::Container;
                info.operands = 0;
                tokens.advance()?;
                if tokens.current().is(ReservedToken::SquareR) {
                    break 'parse;
                }
                loop {
                    let item = parse_expression(context, tokens, false)?;
                    operands.push(item);
                    info.operands += 1;
                    if tokens.current().is(ReservedToken::SquareR) {
                        break;
                    }
                    if !tokens.current().is(ReservedToken::Comma) {
                        return Err(Error::syntax("could not find a matching ']'.", info.pos, 0));
                    }
                    tokens.advance()?;
                }
                operators.push(info);
                expecting_operand = false;
                tokens.advance()?;
                continue;
            }

            if (info.precedence == Precedence::Prefix) != expecting_operand {
                return Err(Error::unexpected(tokens.current().to_string(), pos, true));
            }

            while operators
                .last()
                .is_some_and(|top| is_evaluated_before(top, &info))
            {
                pop_operator(context, &mut operators, &mut operands, pos)?;
            }

            match info.operation {
                Operation::Call => {
                    tokens.advance()?;
                    if !tokens.current().is(ReservedToken::RoundR) {
                        loop {
                            let argument = parse_expression(context, tokens, false)?;
                            operands.push(argument);
                            info.operands += 1;
                            if tokens.current().is(ReservedToken::RoundR) {
                                break;
                            }
                            if !tokens.current().is(ReservedToken::Comma) {
                                return Err(Error::syntax(
                                    "could not find a matching ')'.",
                                    tokens.current().pos,
                                    0,
                                ));
                            }
                            tokens.advance()?;
                        }
                    }
                }
                Operation::Subscript => {
                    tokens.advance()?;
                    let index = parse_expression(context, tokens, true)?;
                    operands.push(index);
                    if !tokens.current().is(ReservedToken::SquareR) {
                        return Err(Error::syntax(
                            "could not find a matching ']'.",
                            tokens.current().pos,
                            0,
                        ));
                    }
                }
                Operation::Ternary => {
                    tokens.advance()?;
                    let middle = parse_expression(context, tokens, false)?;
                    operands.push(middle);
                    if !tokens.current().is(ReservedToken::Colon) {
                        return Err(Error::syntax(
                            "expected ':' to complete ternary expression.",
                            tokens.current().pos,
                            0,
                        ));
                    }
                }
                _ => {}
            }

            expecting_operand = info.precedence != Precedence::Postfix;
            operators.push(info);
            tokens.advance()?;
        } else {
            if !expecting_operand {
                return Err(Error::unexpected(token.to_string(), pos, false));
            }
            let value = match &token.value {
                TokenValue::Null => ExprValue::Null,
                TokenValue::Byte(n) => ExprValue::Byte(*n),
                TokenValue::Short(n) => ExprValue::Short(*n),
                TokenValue::Int(n) => ExprValue::Int(*n),
                TokenValue::Long(n) => ExprValue::Long(*n),
                TokenValue::Float(n) => ExprValue::Float(*n),
                TokenValue::Double(n) => ExprValue::Double(*n),
                TokenValue::Bool(b) => ExprValue::Bool(*b),
                TokenValue::Char(c) => ExprValue::Char(*c),
                TokenValue::Str(s) => ExprValue::Str(s.clone()),
                TokenValue::Identifier(name) => ExprValue::Identifier(name.clone()),
                TokenValue::Eof | TokenValue::Reserved(_) => {
                    return Err(Error::unexpected(token.to_string(), pos, false));
                }
            };
            let node = Expression::new(context, value, Vec::new(), pos)?;
            operands.push(node);
            expecting_operand = false;
            tokens.advance()?;
        }
    }

    if expecting_operand {
        if operands.is_empty() && operators.is_empty() {
            return Ok(None);
        }
        return Err(Error::syntax(
            "expected an operand.",
            tokens.current().pos,
            0,
        ));
    }

    let end_pos = tokens.current().pos;
    while !operators.is_empty() {
        pop_operator(context, &mut operators, &mut operands, end_pos)?;
    }

    if operands.len() != 1 {
        return Err(Error::compile(
            format!(
                "failed to parse expression. (resolved to {} operands, 0 operators.)",
                operands.len()
            ),
            end_pos,
            0,
        ));
    }
    Ok(operands.pop())
}

/// Parse a non-empty expression; the stream is left on the terminator.
pub(crate) fn parse_expression(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
    allow_comma: bool,
) -> Result<Expression, Error> {
    match shunt(context, tokens, allow_comma)? {
        Some(expr) => Ok(expr),
        None => Err(Error::syntax(
            "expected an operand.",
            tokens.current().pos,
            0,
        )),
    }
}

/// Parse an expression and require it to convert to `(ty, lvalue)`.
/// With `allow_empty`, a missing expression yields `Ok(None)` unchecked.
pub fn parse_checked_expression(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
    ty: TypeHandle,
    lvalue: bool,
    allow_comma: bool,
    allow_empty: bool,
) -> Result<Option<Expression>, Error> {
    let expr = if allow_empty {
        shunt(context, tokens, allow_comma)?
    } else {
        Some(parse_expression(context, tokens, allow_comma)?)
    };
    if let Some(expr) = &expr {
        expr.check_conversion(&context.types, ty, lvalue)?;
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayType, FuncType, Type, TypeRegistry};

    fn context_with_vars() -> CompilerContext {
        let mut context = CompilerContext::new();
        context.create_identifier("true", TypeRegistry::BOOL, true, true).unwrap();
        context.create_identifier("false", TypeRegistry::BOOL, true, true).unwrap();
        context.create_identifier("a", TypeRegistry::INT, false, false).unwrap();
        context.create_identifier("b", TypeRegistry::INT, false, false).unwrap();
        context.create_identifier("d", TypeRegistry::DOUBLE, false, false).unwrap();
        let ints = context.get_handle(Type::Array(ArrayType { inner: TypeRegistry::INT }));
        context.create_identifier("arr", ints, false, false).unwrap();
        let f = context.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::INT,
            params: vec![TypeRegistry::INT, TypeRegistry::INT],
            varargs: false,
        }));
        context.create_identifier("f", f, true, false).unwrap();
        context
    }

    fn parse(context: &mut CompilerContext, source: &str) -> Result<Expression, Error> {
        let mut tokens = TokenStream::new(source).unwrap();
        parse_expression(context, &mut tokens, false)
    }

    fn op_of(expr: &Expression) -> Operation {
        expr.operation().expect("expected an operation node")
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "3 + 4 * 2").unwrap();
        assert_eq!(op_of(&expr), Operation::Add);
        assert_eq!(op_of(&expr.children()[1]), Operation::Mul);
        assert_eq!(expr.ty(), TypeRegistry::INT);
    }

    #[test]
    fn subtraction_is_left_associative() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "10 - 4 - 3").unwrap();
        assert_eq!(op_of(&expr), Operation::Sub);
        assert_eq!(op_of(&expr.children()[0]), Operation::Sub);
        assert!(matches!(expr.children()[1].value(), ExprValue::Int(3)));
    }

    #[test]
    fn assignment_is_right_associative() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "a = b = 1").unwrap();
        assert_eq!(op_of(&expr), Operation::Assign);
        assert!(matches!(
            expr.children()[0].value(),
            ExprValue::Identifier(name) if name == "a"
        ));
        assert_eq!(op_of(&expr.children()[1]), Operation::Assign);
    }

    #[test]
    fn grouping_overrides_precedence() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "(3 + 4) * 2").unwrap();
        assert_eq!(op_of(&expr), Operation::Mul);
        assert_eq!(op_of(&expr.children()[0]), Operation::Add);
    }

    #[test]
    fn prefix_and_postfix_disambiguate() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "-a + b++").unwrap();
        assert_eq!(op_of(&expr), Operation::Add);
        assert_eq!(op_of(&expr.children()[0]), Operation::Neg);
        assert_eq!(op_of(&expr.children()[1]), Operation::IncAfter);
    }

    #[test]
    fn shift_sits_between_additive_and_inequality() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "1 + 2 << 3 < 4").unwrap();
        assert_eq!(op_of(&expr), Operation::Lt);
        assert_eq!(op_of(&expr.children()[0]), Operation::Shl);
        assert_eq!(op_of(&expr.children()[0].children()[0]), Operation::Add);
    }

    #[test]
    fn logical_tower_orders_and_xor_or() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "true && false ^^ true || false").unwrap();
        assert_eq!(op_of(&expr), Operation::LogicOr);
        assert_eq!(op_of(&expr.children()[0]), Operation::LogicXor);
        assert_eq!(op_of(&expr.children()[0].children()[0]), Operation::LogicAnd);
    }

    #[test]
    fn ternary_nests_to_the_right() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "true ? 1 : false ? 2 : 3").unwrap();
        assert_eq!(op_of(&expr), Operation::Ternary);
        assert_eq!(op_of(&expr.children()[2]), Operation::Ternary);
    }

    #[test]
    fn call_arguments_and_type() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "f(1, a + 2)").unwrap();
        assert_eq!(op_of(&expr), Operation::Call);
        assert_eq!(expr.children().len(), 3);
        assert_eq!(expr.ty(), TypeRegistry::INT);
    }

    #[test]
    fn empty_argument_list() {
        let mut context = CompilerContext::new();
        let f = context.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::BOOL,
            params: vec![],
            varargs: false,
        }));
        context.create_identifier("ready", f, true, false).unwrap();
        let expr = parse(&mut context, "ready()").unwrap();
        assert_eq!(expr.children().len(), 1);
        assert_eq!(expr.ty(), TypeRegistry::BOOL);
    }

    #[test]
    fn subscript_then_call_reduce_left_to_right() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "arr[a] + 1").unwrap();
        assert_eq!(op_of(&expr), Operation::Add);
        assert_eq!(op_of(&expr.children()[0]), Operation::Subscript);
    }

    #[test]
    fn comma_is_allowed_inside_subscripts_only() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "arr[a, 1]").unwrap();
        assert_eq!(op_of(&expr), Operation::Subscript);
        assert_eq!(op_of(&expr.children()[1]), Operation::Comma);

        let mut tokens = TokenStream::new("a, 1").unwrap();
        let expr = parse_expression(&mut context, &mut tokens, false).unwrap();
        // Comma ends the expression at this level.
        assert!(matches!(expr.value(), ExprValue::Identifier(name) if name == "a"));
        assert!(tokens.current().is(ReservedToken::Comma));
    }

    #[test]
    fn array_literal_builds_container_type() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "[1, 2, 3]").unwrap();
        assert_eq!(op_of(&expr), Operation::Array);
        let ints = context.get_handle(Type::Array(ArrayType { inner: TypeRegistry::INT }));
        assert_eq!(expr.ty(), ints);
    }

    #[test]
    fn empty_array_literal_is_missing_operand() {
        let mut context = context_with_vars();
        let err = parse(&mut context, "[]").unwrap_err();
        assert_eq!(err.message(), "expected an operand.");
    }

    #[test]
    fn unterminated_group_and_brackets() {
        let mut context = context_with_vars();
        let err = parse(&mut context, "(1 + 2").unwrap_err();
        assert_eq!(err.message(), "could not find a matching ')'.");
        let err = parse(&mut context, "arr[1").unwrap_err();
        assert_eq!(err.message(), "could not find a matching ']'.");
        let err = parse(&mut context, "f(1; 2)").unwrap_err();
        assert_eq!(err.message(), "could not find a matching ')'.");
    }

    #[test]
    fn missing_ternary_colon() {
        let mut context = context_with_vars();
        let err = parse(&mut context, "true ? 1 2").unwrap_err();
        assert_eq!(err.message(), "expected ':' to complete ternary expression.");
    }

    #[test]
    fn dangling_operator_is_missing_operand() {
        let mut context = context_with_vars();
        let err = parse(&mut context, "1 +").unwrap_err();
        assert_eq!(err.message(), "expected an operand.");
    }

    #[test]
    fn adjacent_operands_are_unexpected() {
        let mut context = context_with_vars();
        let err = parse(&mut context, "1 2").unwrap_err();
        assert_eq!(err.message(), "encountered unexpected '2' while parsing.");
    }

    #[test]
    fn binary_operator_in_operand_position_is_unexpected() {
        let mut context = context_with_vars();
        let err = parse(&mut context, "* 2").unwrap_err();
        assert_eq!(err.message(), "encountered unexpected '*' while parsing.");
    }

    #[test]
    fn compound_assignment_parses() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "a += d * 2.0").unwrap();
        assert_eq!(op_of(&expr), Operation::AssignAdd);
        assert_eq!(expr.ty(), TypeRegistry::INT);
        assert!(expr.lvalue());
    }

    #[test]
    fn power_binds_tighter_than_multiplication() {
        let mut context = context_with_vars();
        let expr = parse(&mut context, "2 * 3 ** 2").unwrap();
        assert_eq!(op_of(&expr), Operation::Mul);
        assert_eq!(op_of(&expr.children()[1]), Operation::Pow);
    }

    #[test]
    fn checked_parse_enforces_target_type() {
        let mut context = context_with_vars();
        let mut tokens = TokenStream::new("1 + 2").unwrap();
        let err = parse_checked_expression(
            &mut context,
            &mut tokens,
            TypeRegistry::INT,
            true,
            false,
            false,
        )
        .unwrap_err();
        assert_eq!(err.message(), "cannot be assigned to.");

        let mut tokens = TokenStream::new("").unwrap();
        let none = parse_checked_expression(
            &mut context,
            &mut tokens,
            TypeRegistry::VOID,
            false,
            false,
            true,
        )
        .unwrap();
        assert!(none.is_none());
    }
}
