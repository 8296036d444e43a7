pub mod ast;
pub mod expr;
pub mod stmt;

use crate::context::CompilerContext;
use crate::diagnostics::Error;
use crate::lexer::token::{reserved_repr, ReservedToken, TokenValue};
use crate::lexer::TokenStream;
use crate::span::Pos;
use crate::types::{ArrayType, FuncType, Type, TypeHandle, TypeRegistry};
use expr::parse_checked_expression;
use stmt::{Statement, StatementKind};

/// The seven context flags that flow down through statement parsing. They
/// reject misplaced statements early: `return` outside a function, `break`
/// outside a loop, a block or declaration where a value is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseFlags {
    pub allow_empty: bool,
    pub allow_return: bool,
    pub allow_break: bool,
    pub allow_continue: bool,
    pub allow_switch_case: bool,
    pub allow_declare: bool,
    pub require_eval_value: bool,
}

impl ParseFlags {
    pub const NONE: ParseFlags = ParseFlags {
        allow_empty: false,
        allow_return: false,
        allow_break: false,
        allow_continue: false,
        allow_switch_case: false,
        allow_declare: false,
        require_eval_value: false,
    };
}

fn type_from_keyword(token: ReservedToken) -> Option<TypeHandle> {
    match token {
        ReservedToken::TypeAny => Some(TypeRegistry::ANY),
        ReservedToken::TypeBool => Some(TypeRegistry::BOOL),
        ReservedToken::TypeByte => Some(TypeRegistry::BYTE),
        ReservedToken::TypeChar => Some(TypeRegistry::CHAR),
        ReservedToken::TypeDouble => Some(TypeRegistry::DOUBLE),
        ReservedToken::TypeFloat => Some(TypeRegistry::FLOAT),
        ReservedToken::TypeInt => Some(TypeRegistry::INT),
        ReservedToken::TypeLong => Some(TypeRegistry::LONG),
        ReservedToken::TypeShort => Some(TypeRegistry::SHORT),
        ReservedToken::TypeStr => Some(TypeRegistry::STR),
        ReservedToken::TypeVoid => Some(TypeRegistry::VOID),
        _ => None,
    }
}

fn not_evaluable(what: &str, pos: Pos, length: usize) -> Error {
    Error::syntax(
        format!("expected an evaluable statement, got {what} instead."),
        pos,
        length,
    )
}

/// Parse one statement. On success the stream is left on the statement's
/// final token (`;`, `}`, `)` of a do-while, …); the caller advances past
/// it.
pub fn parse_statement(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
    flags: ParseFlags,
) -> Result<Statement, Error> {
    let pos = tokens.current().pos;

    let parsed = match tokens.current().reserved() {
        Some(ReservedToken::Semicolon) => {
            if !flags.allow_empty {
                return Err(Error::syntax("expected a statement at this position.", pos, 0));
            }
            Statement::new(StatementKind::Empty, pos)
        }

        Some(ReservedToken::CurlyL) => {
            if flags.require_eval_value {
                return Err(not_evaluable("code block", pos, 1));
            }
            tokens.advance()?;
            let mut contents = Vec::new();
            while !tokens.current().is(ReservedToken::CurlyR) {
                if tokens.current().is_eof() {
                    return Err(Error::syntax("could not find a matching '}'.", pos, 0));
                }
                let child = parse_statement(
                    context,
                    tokens,
                    ParseFlags {
                        allow_empty: true,
                        allow_return: flags.allow_return,
                        allow_break: flags.allow_break,
                        allow_continue: flags.allow_continue,
                        allow_declare: true,
                        ..ParseFlags::NONE
                    },
                )?;
                if !child.is_empty() {
                    contents.push(child);
                }
                tokens.advance()?;
            }
            let block = Statement::new(StatementKind::Block(contents), pos);
            block.adopt_children();
            block
        }

        Some(ReservedToken::KwReturn) => {
            if !flags.allow_return {
                return Err(Error::semantic(
                    "encountered 'return' outside function definition.",
                    pos,
                    6,
                ));
            }
            if flags.require_eval_value {
                return Err(not_evaluable("'return'", pos, 6));
            }
            tokens.advance()?;
            let value = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_empty: true,
                    allow_declare: true,
                    require_eval_value: true,
                    ..ParseFlags::NONE
                },
            )?;
            let stmt = Statement::new(StatementKind::Return(value), pos);
            stmt.adopt_children();
            stmt
        }

        Some(ReservedToken::KwBreak) => {
            if !flags.allow_break {
                return Err(Error::semantic("encountered 'break' outside loop/switch.", pos, 5));
            }
            if flags.require_eval_value {
                return Err(not_evaluable("'break'", pos, 5));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::Semicolon) {
                return Err(Error::syntax(
                    "unexpected statement within 'break'.",
                    tokens.current().pos,
                    0,
                ));
            }
            Statement::new(StatementKind::Break, pos)
        }

        Some(ReservedToken::KwContinue) => {
            if !flags.allow_continue {
                return Err(Error::semantic("encountered 'continue' outside loop.", pos, 8));
            }
            if flags.require_eval_value {
                return Err(not_evaluable("'continue'", pos, 8));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::Semicolon) {
                return Err(Error::syntax(
                    "unexpected statement within 'continue'.",
                    tokens.current().pos,
                    0,
                ));
            }
            Statement::new(StatementKind::Continue, pos)
        }

        Some(ReservedToken::KwIf) => {
            if flags.require_eval_value {
                return Err(not_evaluable("'if'", pos, 2));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::RoundL) {
                return Err(Error::syntax(
                    "expected opening '(' after 'if' keyword.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;
            let condition = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_declare: true,
                    require_eval_value: true,
                    ..ParseFlags::NONE
                },
            )?;
            if !tokens.current().is(ReservedToken::RoundR) {
                return Err(Error::syntax(
                    "expected closing ')' after 'if' condition.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;
            if tokens.current().is(ReservedToken::KwElse) {
                return Err(Error::syntax(
                    "expected statement between 'if' and 'else' clauses.",
                    tokens.current().pos,
                    0,
                ));
            }
            let branch_flags = ParseFlags {
                allow_return: flags.allow_return,
                allow_break: flags.allow_break,
                allow_continue: flags.allow_continue,
                allow_declare: true,
                ..ParseFlags::NONE
            };
            let do_if = parse_statement(context, tokens, branch_flags)?;

            // Peek one token past the then-branch; roll back when it is not
            // an 'else'.
            let saved = tokens.current().clone();
            tokens.advance()?;
            let do_else = if tokens.current().is(ReservedToken::KwElse) {
                tokens.advance()?;
                parse_statement(context, tokens, branch_flags)?
            } else {
                let empty = Statement::new(StatementKind::Empty, tokens.current().pos);
                tokens.step_back(saved);
                empty
            };

            let stmt = Statement::new(
                StatementKind::IfElse {
                    condition,
                    do_if,
                    do_else,
                },
                pos,
            );
            stmt.adopt_children();
            stmt
        }

        Some(ReservedToken::KwElse | ReservedToken::KwElif) => {
            return Err(Error::syntax(
                "encountered 'else' without supporting 'if' statement.",
                pos,
                4,
            ));
        }

        Some(ReservedToken::KwWhile) => {
            if flags.require_eval_value {
                return Err(not_evaluable("'while'", pos, 5));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::RoundL) {
                return Err(Error::syntax(
                    "expected opening '(' after 'while' keyword.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;
            let condition = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_declare: true,
                    require_eval_value: true,
                    ..ParseFlags::NONE
                },
            )?;
            if !tokens.current().is(ReservedToken::RoundR) {
                return Err(Error::syntax(
                    "expected closing ')' after while loop declaration.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;
            let looped = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_empty: true,
                    allow_return: flags.allow_return,
                    allow_break: true,
                    allow_continue: true,
                    allow_declare: true,
                    ..ParseFlags::NONE
                },
            )?;
            let stmt = Statement::new(StatementKind::While { condition, looped }, pos);
            stmt.adopt_children();
            stmt
        }

        Some(ReservedToken::KwDo) => {
            if flags.require_eval_value {
                return Err(not_evaluable("'do'", pos, 2));
            }
            tokens.advance()?;
            let looped = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_return: flags.allow_return,
                    allow_break: true,
                    allow_continue: true,
                    allow_declare: true,
                    ..ParseFlags::NONE
                },
            )?;
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::KwWhile) {
                return Err(Error::syntax(
                    "expected 'while' keyword following 'do' statement.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::RoundL) {
                return Err(Error::syntax(
                    "expected opening '(' after 'while' keyword.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;
            let condition = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_declare: true,
                    require_eval_value: true,
                    ..ParseFlags::NONE
                },
            )?;
            if !tokens.current().is(ReservedToken::RoundR) {
                return Err(Error::syntax(
                    "expected closing ')' after loop condition.",
                    tokens.current().pos,
                    0,
                ));
            }
            let stmt = Statement::new(StatementKind::DoWhile { condition, looped }, pos);
            stmt.adopt_children();
            stmt
        }

        Some(ReservedToken::KwFor) => {
            if flags.require_eval_value {
                return Err(not_evaluable("'for'", pos, 3));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::RoundL) {
                return Err(Error::syntax(
                    "expected opening '(' after 'for' keyword.",
                    tokens.current().pos,
                    0,
                ));
            }
            tokens.advance()?;

            // First clause: init for a regular loop, declaration for
            // for-each. The terminator decides which loop this is.
            let first = parse_statement(
                context,
                tokens,
                ParseFlags {
                    allow_empty: true,
                    allow_declare: true,
                    ..ParseFlags::NONE
                },
            )?;
            let is_foreach = if tokens.current().is(ReservedToken::Semicolon) {
                false
            } else if tokens.current().is(ReservedToken::Colon) {
                true
            } else {
                return Err(Error::syntax(
                    format!("expected ';' or ':', got '{}' instead.", tokens.current()),
                    tokens.current().pos,
                    0,
                ));
            };

            let body_flags = ParseFlags {
                allow_empty: true,
                allow_return: flags.allow_return,
                allow_break: true,
                allow_continue: true,
                allow_declare: true,
                ..ParseFlags::NONE
            };

            if is_foreach {
                if first.is_empty() {
                    return Err(Error::syntax(
                        "expected a declaration statement before ':' in for-each loop declaration.",
                        tokens.current().pos,
                        1,
                    ));
                }
                if !first.is_declaration() {
                    return Err(Error::syntax(
                        "an iterator variable must be declared before ':'.",
                        tokens.current().pos,
                        1,
                    ));
                }
                tokens.advance()?;
                let iter = parse_statement(
                    context,
                    tokens,
                    ParseFlags {
                        require_eval_value: true,
                        ..ParseFlags::NONE
                    },
                )?;
                if !tokens.current().is(ReservedToken::RoundR) {
                    return Err(Error::syntax(
                        "expected closing ')' after for-each loop declaration.",
                        tokens.current().pos,
                        0,
                    ));
                }
                tokens.advance()?;
                let looped = parse_statement(context, tokens, body_flags)?;
                let stmt = Statement::new(
                    StatementKind::Foreach {
                        declared: first,
                        iter,
                        looped,
                    },
                    pos,
                );
                stmt.adopt_children();
                stmt
            } else {
                tokens.advance()?;
                let condition = parse_statement(
                    context,
                    tokens,
                    ParseFlags {
                        require_eval_value: true,
                        ..ParseFlags::NONE
                    },
                )?;
                if !tokens.current().is(ReservedToken::Semicolon) {
                    return Err(Error::syntax(
                        format!("expected ';', got '{}' instead.", tokens.current()),
                        tokens.current().pos,
                        0,
                    ));
                }
                tokens.advance()?;
                let step = parse_statement(context, tokens, body_flags)?;
                if !tokens.current().is(ReservedToken::RoundR) {
                    return Err(Error::syntax(
                        "expected closing ')' after for loop declaration.",
                        tokens.current().pos,
                        0,
                    ));
                }
                tokens.advance()?;
                let looped = parse_statement(context, tokens, body_flags)?;
                let stmt = Statement::new(
                    StatementKind::For {
                        init: first,
                        condition,
                        step,
                        looped,
                    },
                    pos,
                );
                stmt.adopt_children();
                stmt
            }
        }

        Some(ReservedToken::KwCase) => {
            if !flags.allow_switch_case {
                return Err(Error::semantic(
                    "encountered 'case' outside switch statement.",
                    pos,
                    4,
                ));
            }
            tokens.advance()?;
            let test =
                parse_checked_expression(context, tokens, TypeRegistry::ANY, false, false, false)?;
            if !tokens.current().is(ReservedToken::Colon) {
                return Err(Error::syntax(
                    "expected ':' after 'case' expression.",
                    tokens.current().pos,
                    0,
                ));
            }
            Statement::new(StatementKind::SwitchCase { test }, pos)
        }

        Some(ReservedToken::KwDefault) => {
            if !flags.allow_switch_case {
                return Err(Error::semantic(
                    "encountered 'default' outside switch statement.",
                    pos,
                    7,
                ));
            }
            tokens.advance()?;
            if !tokens.current().is(ReservedToken::Colon) {
                return Err(Error::syntax(
                    "expected ':' after 'default'.",
                    tokens.current().pos,
                    0,
                ));
            }
            Statement::new(StatementKind::SwitchCase { test: None }, pos)
        }

        Some(ReservedToken::KwFinal) => {
            check_declaration_allowed(flags, ReservedToken::KwFinal, pos)?;
            tokens.advance()?;
            parse_declaration(context, tokens, None, true, false, pos)?
        }

        Some(ReservedToken::KwStatic) => {
            check_declaration_allowed(flags, ReservedToken::KwStatic, pos)?;
            tokens.advance()?;
            parse_declaration(context, tokens, None, false, true, pos)?
        }

        Some(rt) if type_from_keyword(rt).is_some() => {
            check_declaration_allowed(flags, rt, pos)?;
            let ty = type_from_keyword(rt);
            tokens.advance()?;
            parse_declaration(context, tokens, ty, false, false, pos)?
        }

        _ => {
            // Anything else is an expression statement, checked against
            // void (which accepts every type).
            let root = expr::parse_expression(context, tokens, false)?;
            root.check_conversion(&context.types, TypeRegistry::VOID, false)?;
            Statement::new(StatementKind::Expr(root), pos)
        }
    };

    if !flags.allow_empty && parsed.is_empty() {
        return Err(Error::syntax("expected a statement at this position.", pos, 0));
    }
    Ok(parsed)
}

fn check_declaration_allowed(
    flags: ParseFlags,
    keyword: ReservedToken,
    pos: Pos,
) -> Result<(), Error> {
    let text = reserved_repr(keyword);
    if flags.require_eval_value {
        return Err(not_evaluable(&format!("'{text}'"), pos, text.len()));
    }
    if !flags.allow_declare {
        return Err(Error::unexpected(text, pos, false));
    }
    Ok(())
}

/// Parse a declaration after its leading keyword was consumed. Absorbs any
/// order of `final`, `static`, the base type, and `[]` suffixes, then the
/// declared name; a following `(` makes it a function declaration.
fn parse_declaration(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
    mut ty: Option<TypeHandle>,
    mut is_final: bool,
    mut is_static: bool,
    pos: Pos,
) -> Result<Statement, Error> {
    loop {
        let current_pos = tokens.current().pos;
        match tokens.current().reserved() {
            Some(ReservedToken::KwFinal) => {
                if is_final {
                    return Err(Error::syntax(
                        "variable is already specified as final.",
                        current_pos,
                        5,
                    ));
                }
                is_final = true;
                tokens.advance()?;
            }
            Some(ReservedToken::KwStatic) => {
                if is_static {
                    return Err(Error::syntax(
                        "variable is already specified as static.",
                        current_pos,
                        6,
                    ));
                }
                is_static = true;
                tokens.advance()?;
            }
            Some(ReservedToken::SquareL) => {
                let Some(inner) = ty else {
                    return Err(Error::syntax(
                        "encountered '[]' before type in declaration.",
                        current_pos,
                        2,
                    ));
                };
                tokens.advance()?;
                if !tokens.current().is(ReservedToken::SquareR) {
                    return Err(Error::unexpected(
                        tokens.current().to_string(),
                        tokens.current().pos,
                        false,
                    ));
                }
                ty = Some(context.get_handle(Type::Array(ArrayType { inner })));
                tokens.advance()?;
            }
            Some(rt) => {
                let Some(keyword_ty) = type_from_keyword(rt) else {
                    return Err(Error::unexpected(reserved_repr(rt), current_pos, false));
                };
                if let Some(existing) = ty {
                    let repr = context.types.repr(existing);
                    let length = repr.chars().count();
                    return Err(Error::syntax(
                        format!("variable has already been specified as type '{repr}'."),
                        current_pos,
                        length,
                    ));
                }
                ty = Some(keyword_ty);
                tokens.advance()?;
            }
            None => break,
        }
    }

    let name_pos = tokens.current().pos;
    let TokenValue::Identifier(name) = &tokens.current().value else {
        return Err(Error::unexpected(
            tokens.current().to_string(),
            name_pos,
            true,
        ));
    };
    let name = name.clone();
    let Some(ty) = ty else {
        return Err(Error::syntax(
            "missing type name in variable declaration.",
            name_pos,
            0,
        ));
    };
    let already_exists = || {
        Error::semantic(
            format!("variable '{name}' already exists in the current scope."),
            name_pos,
            name.chars().count(),
        )
    };
    if context.find(&name).is_some() {
        return Err(already_exists());
    }
    tokens.advance()?;

    if tokens.current().is(ReservedToken::RoundL) {
        return parse_function_declaration(
            context, tokens, name, name_pos, ty, is_final, is_static, pos,
        );
    }

    let info = context
        .create_identifier(name.clone(), ty, is_final, is_static)
        .ok_or_else(already_exists)?;
    let value = if tokens.current().is(ReservedToken::Equal) {
        tokens.advance()?;
        parse_statement(
            context,
            tokens,
            ParseFlags {
                allow_declare: true,
                require_eval_value: true,
                ..ParseFlags::NONE
            },
        )?
    } else {
        Statement::new(StatementKind::Empty, tokens.current().pos)
    };
    if !tokens.current().is(ReservedToken::Semicolon) && !tokens.current().is(ReservedToken::Colon)
    {
        return Err(Error::unexpected(
            tokens.current().to_string(),
            tokens.current().pos,
            true,
        ));
    }
    let stmt = Statement::new(StatementKind::Declare { info, name, value }, pos);
    stmt.adopt_children();
    Ok(stmt)
}

#[allow(clippy::too_many_arguments)]
fn parse_function_declaration(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
    name: String,
    name_pos: Pos,
    returning: TypeHandle,
    is_final: bool,
    is_static: bool,
    pos: Pos,
) -> Result<Statement, Error> {
    context.enter_function();

    let mut param_infos = Vec::new();
    let mut param_names = Vec::new();
    let mut params: Vec<TypeHandle> = Vec::new();
    let mut varargs = false;

    tokens.advance()?;
    if !tokens.current().is(ReservedToken::RoundR) {
        loop {
            let Some(rt) = tokens.current().reserved() else {
                return Err(Error::syntax(
                    "expected a parameter type name.",
                    tokens.current().pos,
                    0,
                ));
            };
            let Some(mut param_ty) = type_from_keyword(rt) else {
                return Err(Error::unexpected(
                    reserved_repr(rt),
                    tokens.current().pos,
                    false,
                ));
            };
            tokens.advance()?;

            // Suffixes before the name: array brackets and the varargs
            // ellipsis.
            loop {
                if tokens.current().is(ReservedToken::SquareL) {
                    tokens.advance()?;
                    if !tokens.current().is(ReservedToken::SquareR) {
                        return Err(Error::unexpected(
                            tokens.current().to_string(),
                            tokens.current().pos,
                            false,
                        ));
                    }
                    param_ty = context.get_handle(Type::Array(ArrayType { inner: param_ty }));
                    tokens.advance()?;
                } else if tokens.current().is(ReservedToken::Ellipsis) {
                    if varargs {
                        return Err(Error::unexpected("...", tokens.current().pos, false));
                    }
                    varargs = true;
                    param_ty = context.get_handle(Type::Array(ArrayType { inner: param_ty }));
                    tokens.advance()?;
                } else {
                    break;
                }
            }

            let TokenValue::Identifier(param_name) = &tokens.current().value else {
                return Err(Error::unexpected(
                    tokens.current().to_string(),
                    tokens.current().pos,
                    true,
                ));
            };
            let param_name = param_name.clone();
            tokens.advance()?;

            // The ellipsis may also trail the name.
            if tokens.current().is(ReservedToken::Ellipsis) {
                if varargs {
                    return Err(Error::unexpected("...", tokens.current().pos, false));
                }
                varargs = true;
                param_ty = context.get_handle(Type::Array(ArrayType { inner: param_ty }));
                tokens.advance()?;
            }

            let info = context.create_param(param_name.clone(), param_ty).ok_or_else(|| {
                Error::compile("parameter declared outside function scope.", pos, 0)
            })?;
            param_infos.push(info);
            param_names.push(param_name);
            params.push(param_ty);

            if tokens.current().is(ReservedToken::RoundR) {
                break;
            }
            if !tokens.current().is(ReservedToken::Comma) {
                return Err(Error::unexpected(
                    tokens.current().to_string(),
                    tokens.current().pos,
                    true,
                ));
            }
            tokens.advance()?;
        }
    }
    tokens.advance()?;

    let body = if tokens.current().is(ReservedToken::Semicolon) {
        // Forward declaration.
        Statement::new(StatementKind::Empty, pos)
    } else if tokens.current().is(ReservedToken::CurlyL) {
        parse_statement(
            context,
            tokens,
            ParseFlags {
                allow_return: true,
                allow_declare: true,
                ..ParseFlags::NONE
            },
        )?
    } else {
        return Err(Error::unexpected(
            tokens.current().to_string(),
            tokens.current().pos,
            false,
        ));
    };
    context.leave_scope();

    let ft = context.get_handle(Type::Func(FuncType {
        returning,
        params,
        varargs,
    }));
    let info = context
        .create_identifier(name.clone(), ft, is_final, is_static)
        .ok_or_else(|| {
            Error::semantic(
                format!("variable '{name}' already exists in the current scope."),
                name_pos,
                name.chars().count(),
            )
        })?;

    let stmt = Statement::new(
        StatementKind::Decfunc {
            info,
            name,
            param_infos,
            param_names,
            body,
        },
        pos,
    );
    stmt.adopt_children();
    Ok(stmt)
}

/// Parse a whole program: top-level statements until end of input. Empty
/// statements are dropped.
pub fn parse_program(
    context: &mut CompilerContext,
    tokens: &mut TokenStream,
) -> Result<Vec<Statement>, Error> {
    let mut code = Vec::new();
    while !tokens.current().is_eof() {
        let stmt = parse_statement(
            context,
            tokens,
            ParseFlags {
                allow_empty: true,
                allow_declare: true,
                ..ParseFlags::NONE
            },
        )?;
        if !stmt.is_empty() {
            code.push(stmt);
        }
        tokens.advance()?;
    }
    Ok(code)
}
