//! Human-readable renderings of parsed trees, printed by the driver.

use crate::parser::ast::{ExprValue, Expression, Operation};
use crate::parser::stmt::{Statement, StatementKind};
use crate::types::TypeRegistry;

fn double_repr(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn binary(expr: &Expression, glyph: &str) -> String {
    format!(
        "({} {} {})",
        expression_repr(&expr.children()[0]),
        glyph,
        expression_repr(&expr.children()[1])
    )
}

/// Fully parenthesized rendering of an expression tree.
pub fn expression_repr(expr: &Expression) -> String {
    match expr.value() {
        ExprValue::Null => "null".to_string(),
        ExprValue::Byte(n) => n.to_string(),
        ExprValue::Short(n) => n.to_string(),
        ExprValue::Int(n) => n.to_string(),
        ExprValue::Long(n) => n.to_string(),
        ExprValue::Float(n) => double_repr(f64::from(*n)),
        ExprValue::Double(n) => double_repr(*n),
        ExprValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        ExprValue::Char(c) => format!("'{c}'"),
        ExprValue::Str(s) => format!("\"{s}\""),
        ExprValue::Identifier(name) => format!("${name}"),
        ExprValue::Declaration(decl) => format!(
            "({}{}${})",
            if decl.is_final { "final " } else { "" },
            if decl.is_static { "static " } else { "" },
            decl.name
        ),
        ExprValue::Operation(op) => {
            let child = |i: usize| expression_repr(&expr.children()[i]);
            match op {
                Operation::IncBefore => format!("(++{})", child(0)),
                Operation::IncAfter => format!("({}++)", child(0)),
                Operation::DecBefore => format!("(--{})", child(0)),
                Operation::DecAfter => format!("({}--)", child(0)),
                Operation::Pos => format!("(+{})", child(0)),
                Operation::Neg => format!("(-{})", child(0)),
                Operation::BitNot => format!("(~{})", child(0)),
                Operation::LogicNot => format!("(!{})", child(0)),
                Operation::Add => binary(expr, "+"),
                Operation::Sub => binary(expr, "-"),
                Operation::Mul => binary(expr, "*"),
                Operation::Div => binary(expr, "/"),
                Operation::Mod => binary(expr, "%"),
                Operation::Pow => binary(expr, "**"),
                Operation::BitAnd => binary(expr, "&"),
                Operation::BitOr => binary(expr, "|"),
                Operation::BitXor => binary(expr, "^"),
                Operation::Shl => binary(expr, "<<"),
                Operation::Shr => binary(expr, ">>"),
                Operation::Assign => binary(expr, "="),
                Operation::AssignAdd => binary(expr, "+="),
                Operation::AssignSub => binary(expr, "-="),
                Operation::AssignMul => binary(expr, "*="),
                Operation::AssignDiv => binary(expr, "/="),
                Operation::AssignMod => binary(expr, "%="),
                Operation::AssignPow => binary(expr, "**="),
                Operation::AssignAnd => binary(expr, "&="),
                Operation::AssignOr => binary(expr, "|="),
                Operation::AssignXor => binary(expr, "^="),
                Operation::AssignShl => binary(expr, "<<="),
                Operation::AssignShr => binary(expr, ">>="),
                Operation::Eq => binary(expr, "=="),
                Operation::Neq => binary(expr, "!="),
                Operation::Lt => binary(expr, "<"),
                Operation::Gt => binary(expr, ">"),
                Operation::LtEq => binary(expr, "<="),
                Operation::GtEq => binary(expr, ">="),
                Operation::LogicAnd => binary(expr, "&&"),
                Operation::LogicOr => binary(expr, "||"),
                Operation::LogicXor => binary(expr, "^^"),
                Operation::Comma => binary(expr, ","),
                Operation::Subscript => format!("({}[{}])", child(0), child(1)),
                Operation::Ternary => {
                    format!("({} ? {} : {})", child(0), child(1), child(2))
                }
                Operation::Call => {
                    let mut out = expression_repr(&expr.children()[0]);
                    out.push('(');
                    let mut separator = "";
                    for argument in &expr.children()[1..] {
                        out += separator;
                        out += &expression_repr(argument);
                        separator = ", ";
                    }
                    out + ")"
                }
                Operation::Array => {
                    let mut out = String::from("[");
                    let mut separator = "";
                    for element in expr.children() {
                        out += separator;
                        out += &expression_repr(element);
                        separator = ", ";
                    }
                    out + "]"
                }
            }
        }
    }
}

/// Bracketed tree rendering of a statement.
pub fn statement_repr(types: &TypeRegistry, stmt: &Statement) -> String {
    match stmt.kind() {
        StatementKind::Empty => "<EMPTY>".to_string(),
        StatementKind::Expr(root) => format!("<EXPR [{}]>", expression_repr(root)),
        StatementKind::Block(contents) => {
            if contents.is_empty() {
                return "{(empty)}".to_string();
            }
            let mut out = String::from("{");
            let mut separator = "";
            for child in contents {
                out += separator;
                out += &statement_repr(types, child);
                separator = "; ";
            }
            out + "}"
        }
        StatementKind::Declare { info, name, value } => {
            let mut out = String::new();
            if info.is_final {
                out += "final ";
            }
            if info.is_static {
                out += "static ";
            }
            out += &types.repr(info.ty);
            out += " ";
            out += name;
            if !value.is_empty() {
                out += " = ";
                out += &statement_repr(types, value);
            }
            out
        }
        StatementKind::Decfunc {
            info,
            name,
            param_infos,
            param_names,
            body,
        } => {
            let mut out = String::new();
            if info.is_final {
                out += "final ";
            }
            if info.is_static {
                out += "static ";
            }
            out += &types.repr(info.ty);
            out += " ";
            out += name;
            out += "(";
            let mut separator = "";
            for (param, param_name) in param_infos.iter().zip(param_names.iter()) {
                out += separator;
                out += &types.repr(param.ty);
                out += " ";
                out += param_name;
                separator = ", ";
            }
            out += ") DOES ";
            out + &statement_repr(types, body)
        }
        StatementKind::Return(value) => {
            if value.is_empty() {
                "<RETURN>".to_string()
            } else {
                format!("<RETURN {}>", statement_repr(types, value))
            }
        }
        StatementKind::Break => "<BREAK>".to_string(),
        StatementKind::Continue => "<CONTINUE>".to_string(),
        StatementKind::IfElse {
            condition,
            do_if,
            do_else,
        } => {
            let mut out = format!(
                "<IF {} THEN {}",
                statement_repr(types, condition),
                statement_repr(types, do_if)
            );
            if !do_else.is_empty() {
                out += " ELSE ";
                out += &statement_repr(types, do_else);
            }
            out + ">"
        }
        StatementKind::While { condition, looped } => format!(
            "<WHILE {} DO {}>",
            statement_repr(types, condition),
            statement_repr(types, looped)
        ),
        StatementKind::DoWhile { condition, looped } => format!(
            "<DO {} WHILE {}>",
            statement_repr(types, looped),
            statement_repr(types, condition)
        ),
        StatementKind::For {
            init,
            condition,
            step,
            looped,
        } => format!(
            "<FOR init{} test{} update{} DO {}>",
            statement_repr(types, init),
            statement_repr(types, condition),
            statement_repr(types, step),
            statement_repr(types, looped)
        ),
        StatementKind::Foreach {
            declared,
            iter,
            looped,
        } => format!(
            "<FOREACH item{} IN iter{} DO {}>",
            statement_repr(types, declared),
            statement_repr(types, iter),
            statement_repr(types, looped)
        ),
        StatementKind::Switch { tested, contents } => format!(
            "<SWITCH {} IN {}>",
            statement_repr(types, tested),
            statement_repr(types, contents)
        ),
        StatementKind::SwitchCase { test } => match test {
            Some(test) => format!("<CASE {}:>", expression_repr(test)),
            None => "<DEFAULT:>".to_string(),
        },
        StatementKind::TryCatch {
            guarded,
            catchers,
            finally,
        } => {
            let mut out = format!("<TRY {}", statement_repr(types, guarded));
            for catcher in catchers {
                out += &format!(
                    " CATCH ({} {}) {}",
                    types.repr(catcher.ty),
                    catcher.name,
                    statement_repr(types, &catcher.body)
                );
            }
            if let Some(finally) = finally {
                out += " FINALLY ";
                out += &statement_repr(types, finally);
            }
            out + ">"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilerContext;
    use crate::lexer::TokenStream;
    use crate::parser::{parse_program, stmt::CatchClause};
    use crate::span::Pos;

    fn render(source: &str) -> String {
        let mut context = CompilerContext::new();
        context.create_identifier("true", TypeRegistry::BOOL, true, true);
        context.create_identifier("false", TypeRegistry::BOOL, true, true);
        let mut tokens = TokenStream::new(source).unwrap();
        let code = parse_program(&mut context, &mut tokens).unwrap();
        code.iter()
            .map(|stmt| statement_repr(&context.types, stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_declaration_with_nested_expression() {
        assert_eq!(
            render("int x = 3 + 4 * 2;"),
            "int x = <EXPR [(3 + (4 * 2))]>"
        );
    }

    #[test]
    fn renders_if_else_and_loops() {
        assert_eq!(
            render("int x; if (true) x = 1; else while (false) { break; }"),
            "int x\n<IF <EXPR [true]> THEN <EXPR [($x = 1)]> ELSE <WHILE <EXPR [false]> DO {<BREAK>}>>"
        );
    }

    #[test]
    fn renders_function_declaration() {
        assert_eq!(
            render("int add(int a, int b) { return a + b; }"),
            "int(int, int) add(int a, int b) DOES {<RETURN <EXPR [($a + $b)]>>}"
        );
    }

    #[test]
    fn renders_calls_and_arrays() {
        assert_eq!(
            render("int f(int v...) { return 0; } f(1, 2); int[] a = [1, 2];"),
            "int(int[]...) f(int[] v) DOES {<RETURN <EXPR [0]>>}\n\
             <EXPR [$f(1, 2)]>\n\
             int[] a = <EXPR [[1, 2]]>"
        );
    }

    #[test]
    fn renders_try_catch_shape() {
        let types = TypeRegistry::new();
        let guarded = Statement::new(StatementKind::Block(Vec::new()), Pos::default());
        let body = Statement::new(StatementKind::Empty, Pos::default());
        let stmt = Statement::new(
            StatementKind::TryCatch {
                guarded,
                catchers: vec![CatchClause {
                    ty: TypeRegistry::STR,
                    name: "err".into(),
                    body,
                }],
                finally: Some(Statement::new(StatementKind::Empty, Pos::default())),
            },
            Pos::default(),
        );
        stmt.adopt_children();
        assert_eq!(
            statement_repr(&types, &stmt),
            "<TRY {(empty)} CATCH (str err) <EMPTY> FINALLY <EMPTY>>"
        );
    }
}
