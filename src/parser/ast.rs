use crate::context::CompilerContext;
use crate::diagnostics::Error;
use crate::span::Pos;
use crate::types::{ArrayType, Type, TypeHandle, TypeRegistry};

/// The closed set of expression operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    IncBefore,
    IncAfter,
    DecBefore,
    DecAfter,

    Pos,
    Neg,
    BitNot,
    LogicNot,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,

    Assign,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
    AssignPow,
    AssignAnd,
    AssignOr,
    AssignXor,
    AssignShl,
    AssignShr,

    Eq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    LogicAnd,
    LogicOr,
    LogicXor,

    Ternary,
    Comma,
    Subscript,
    Call,
    Array,
}

/// Name being introduced by a declaration statement, with its declared
/// type and modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub ty: TypeHandle,
    pub is_final: bool,
    pub is_static: bool,
}

/// Payload of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Operation(Operation),
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
    Identifier(String),
    Declaration(Declaration),
}

/// A typed expression node. Construction resolves identifiers against the
/// compiler context, infers the node's type and lvalue-ness from its
/// children, and checks every implicit conversion the operation requires;
/// a node that cannot be typed is never built.
#[derive(Debug)]
pub struct Expression {
    value: ExprValue,
    children: Vec<Expression>,
    ty: TypeHandle,
    lvalue: bool,
    pos: Pos,
}

pub(crate) fn is_numeric(handle: TypeHandle) -> bool {
    handle == TypeRegistry::DOUBLE
        || handle == TypeRegistry::FLOAT
        || handle == TypeRegistry::LONG
        || handle == TypeRegistry::INT
        || handle == TypeRegistry::SHORT
        || handle == TypeRegistry::BYTE
        || handle == TypeRegistry::CHAR
        || handle == TypeRegistry::BOOL
}

/// Widest of two numeric types in the order
/// `double > float > long > int > short > byte > char > bool`.
pub(crate) fn max_numeric_precision(t1: TypeHandle, t2: TypeHandle) -> TypeHandle {
    if !is_numeric(t1) || !is_numeric(t2) {
        return TypeRegistry::VOID;
    }
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
        if t1 == candidate || t2 == candidate {
            return candidate;
        }
    }
    TypeRegistry::VOID
}

/// The implicit-conversion predicate.
///
/// An lvalue target never widens: it requires an lvalue source of a type
/// that also converts as a plain value. `any` and `bool` accept everything;
/// arrays convert element-wise, propagating the outer lvalue flags; the
/// numeric chain only widens; everything converts to `str`.
pub(crate) fn is_convertible(
    types: &TypeRegistry,
    from: TypeHandle,
    from_lvalue: bool,
    to: TypeHandle,
    to_lvalue: bool,
) -> bool {
    if (from == to && from_lvalue == to_lvalue) || to == TypeRegistry::VOID {
        return true;
    }
    if to_lvalue {
        return from_lvalue && is_convertible(types, from, false, to, false);
    }
    if matches!(types.lookup(to), Type::Any) || to == TypeRegistry::BOOL {
        return true;
    }
    if let (Type::Array(f), Type::Array(t)) = (types.lookup(from), types.lookup(to)) {
        return is_convertible(types, f.inner, from_lvalue, t.inner, to_lvalue);
    }

    const TO_FROM_BYTE: [TypeHandle; 7] = [
        TypeRegistry::BYTE,
        TypeRegistry::SHORT,
        TypeRegistry::INT,
        TypeRegistry::LONG,
        TypeRegistry::FLOAT,
        TypeRegistry::DOUBLE,
        TypeRegistry::CHAR,
    ];
    if from == TypeRegistry::BOOL || from == TypeRegistry::BYTE || from == TypeRegistry::CHAR {
        return TO_FROM_BYTE.contains(&to);
    }
    if from == TypeRegistry::SHORT {
        return to == TypeRegistry::SHORT
            || to == TypeRegistry::INT
            || to == TypeRegistry::LONG
            || to == TypeRegistry::FLOAT
            || to == TypeRegistry::DOUBLE;
    }
    if from == TypeRegistry::INT {
        return to == TypeRegistry::INT
            || to == TypeRegistry::LONG
            || to == TypeRegistry::FLOAT
            || to == TypeRegistry::DOUBLE;
    }
    if from == TypeRegistry::LONG {
        return to == TypeRegistry::LONG || to == TypeRegistry::FLOAT || to == TypeRegistry::DOUBLE;
    }
    if from == TypeRegistry::FLOAT {
        return to == TypeRegistry::FLOAT || to == TypeRegistry::DOUBLE;
    }
    if from == TypeRegistry::DOUBLE {
        return to == TypeRegistry::DOUBLE;
    }
    to == TypeRegistry::STR
}

impl Expression {
    pub fn new(
        context: &mut CompilerContext,
        value: ExprValue,
        children: Vec<Expression>,
        pos: Pos,
    ) -> Result<Self, Error> {
        let (ty, lvalue) = Self::infer(context, &value, &children, pos)?;
        Ok(Self {
            value,
            children,
            ty,
            lvalue,
            pos,
        })
    }

    fn infer(
        context: &mut CompilerContext,
        value: &ExprValue,
        children: &[Expression],
        pos: Pos,
    ) -> Result<(TypeHandle, bool), Error> {
        let operation = match value {
            ExprValue::Null => return Ok((TypeRegistry::VOID, false)),
            ExprValue::Byte(_) => return Ok((TypeRegistry::BYTE, false)),
            ExprValue::Short(_) => return Ok((TypeRegistry::SHORT, false)),
            ExprValue::Int(_) => return Ok((TypeRegistry::INT, false)),
            ExprValue::Long(_) => return Ok((TypeRegistry::LONG, false)),
            ExprValue::Float(_) => return Ok((TypeRegistry::FLOAT, false)),
            ExprValue::Double(_) => return Ok((TypeRegistry::DOUBLE, false)),
            ExprValue::Bool(_) => return Ok((TypeRegistry::BOOL, false)),
            ExprValue::Char(_) => return Ok((TypeRegistry::CHAR, false)),
            ExprValue::Str(_) => return Ok((TypeRegistry::STR, false)),
            ExprValue::Identifier(name) => {
                return match context.find(name) {
                    Some(info) => Ok((info.ty, !info.is_final)),
                    None => Err(Error::semantic(
                        format!("Identifier '{name}' may not have been declared in this scope."),
                        pos,
                        0,
                    )),
                };
            }
            ExprValue::Declaration(decl) => {
                if context.find(&decl.name).is_some() {
                    return Err(Error::semantic(
                        format!(
                            "Identifier '{}' may already be declared in this scope.",
                            decl.name
                        ),
                        pos,
                        0,
                    ));
                }
                return Ok((decl.ty, !decl.is_final));
            }
            ExprValue::Operation(op) => *op,
        };

        let types = &context.types;
        match operation {
            Operation::IncBefore | Operation::IncAfter | Operation::DecBefore | Operation::DecAfter => {
                children[0].check_conversion(types, TypeRegistry::DOUBLE, true)?;
                Ok((children[0].ty, true))
            }
            Operation::Pos | Operation::Neg => {
                children[0].check_conversion(types, TypeRegistry::DOUBLE, false)?;
                Ok((children[0].ty, false))
            }
            Operation::BitNot => {
                children[0].check_conversion(types, TypeRegistry::LONG, false)?;
                Ok((children[0].ty, false))
            }
            Operation::LogicNot => {
                children[0].check_conversion(types, TypeRegistry::BOOL, false)?;
                Ok((TypeRegistry::BOOL, false))
            }
            Operation::Add
            | Operation::Sub
            | Operation::Mul
            | Operation::Div
            | Operation::Mod
            | Operation::Pow => {
                children[0].check_conversion(types, TypeRegistry::DOUBLE, false)?;
                children[1].check_conversion(types, TypeRegistry::DOUBLE, false)?;
                Ok((max_numeric_precision(children[0].ty, children[1].ty), false))
            }
            Operation::BitAnd | Operation::BitOr | Operation::BitXor | Operation::Shl | Operation::Shr => {
                children[0].check_conversion(types, TypeRegistry::LONG, false)?;
                children[1].check_conversion(types, TypeRegistry::LONG, false)?;
                Ok((max_numeric_precision(children[0].ty, children[1].ty), false))
            }
            Operation::LogicAnd | Operation::LogicOr | Operation::LogicXor => {
                children[0].check_conversion(types, TypeRegistry::BOOL, false)?;
                children[1].check_conversion(types, TypeRegistry::BOOL, false)?;
                Ok((TypeRegistry::BOOL, false))
            }
            Operation::Lt | Operation::Gt | Operation::LtEq | Operation::GtEq => {
                children[0].check_conversion(types, TypeRegistry::DOUBLE, false)?;
                children[1].check_conversion(types, TypeRegistry::DOUBLE, false)?;
                Ok((TypeRegistry::BOOL, false))
            }
            Operation::Eq | Operation::Neq => Ok((TypeRegistry::BOOL, false)),
            Operation::Assign => {
                let ty = children[0].ty;
                children[0].check_conversion(types, ty, true)?;
                children[1].check_conversion(types, ty, false)?;
                Ok((ty, true))
            }
            Operation::AssignAdd
            | Operation::AssignSub
            | Operation::AssignMul
            | Operation::AssignDiv
            | Operation::AssignMod
            | Operation::AssignPow => {
                children[0].check_conversion(types, TypeRegistry::DOUBLE, true)?;
                children[1].check_conversion(types, TypeRegistry::DOUBLE, false)?;
                Ok((children[0].ty, true))
            }
            Operation::AssignAnd
            | Operation::AssignOr
            | Operation::AssignXor
            | Operation::AssignShl
            | Operation::AssignShr => {
                children[0].check_conversion(types, TypeRegistry::LONG, true)?;
                children[1].check_conversion(types, TypeRegistry::LONG, false)?;
                Ok((children[0].ty, true))
            }
            Operation::Comma => {
                let last = children.last().ok_or_else(|| {
                    Error::compile("comma expression has no operands.", pos, 0)
                })?;
                Ok((last.ty, last.lvalue))
            }
            Operation::Subscript => {
                if let Some(at) = types.as_array(children[0].ty) {
                    Ok((at.inner, children[0].lvalue))
                } else if children[0].ty == TypeRegistry::STR {
                    Ok((TypeRegistry::CHAR, false))
                } else {
                    Err(Error::semantic(
                        format!("{} is not subscriptable.", types.repr(children[0].ty)),
                        pos,
                        0,
                    ))
                }
            }
            Operation::Ternary => {
                children[0].check_conversion(types, TypeRegistry::BOOL, false)?;
                let (then, other) = (&children[1], &children[2]);
                if is_convertible(types, other.ty, other.lvalue, then.ty, then.lvalue) {
                    other.check_conversion(types, then.ty, then.lvalue)?;
                    Ok((then.ty, then.lvalue))
                } else {
                    then.check_conversion(types, other.ty, other.lvalue)?;
                    Ok((other.ty, other.lvalue))
                }
            }
            Operation::Call => {
                let Some(ft) = types.as_func(children[0].ty) else {
                    return Err(Error::semantic(
                        format!("'{}' object is not callable.", types.repr(children[0].ty)),
                        pos,
                        0,
                    ));
                };
                let returning = ft.returning;
                let params = ft.params.clone();
                let varargs = ft.varargs;
                let args = &children[1..];

                if varargs {
                    let catcher = params.last().and_then(|last| types.as_array(*last));
                    let Some(catcher) = catcher else {
                        return Err(Error::compile(
                            "varargs not working properly in function signature.",
                            pos,
                            1,
                        ));
                    };
                    let inner = catcher.inner;
                    if args.len() + 1 < params.len() {
                        return Err(Error::semantic(
                            format!(
                                "expected at least {} arguments, got {} instead.",
                                params.len() - 1,
                                args.len()
                            ),
                            pos,
                            0,
                        ));
                    }
                    for (i, arg) in args.iter().enumerate() {
                        if i + 1 >= params.len() {
                            arg.check_conversion(types, inner, false)?;
                        } else {
                            arg.check_conversion(types, params[i], false)?;
                        }
                    }
                } else {
                    if params.len() != args.len() {
                        return Err(Error::semantic(
                            format!(
                                "expected {} arguments, got {} instead.",
                                params.len(),
                                args.len()
                            ),
                            pos,
                            0,
                        ));
                    }
                    for (arg, param) in args.iter().zip(params.iter()) {
                        arg.check_conversion(types, *param, false)?;
                    }
                }
                Ok((returning, false))
            }
            Operation::Array => {
                // Unified against the last element; earlier elements must
                // convert to its type.
                let last = children.last().ok_or_else(|| {
                    Error::compile("array literal has no elements.", pos, 0)
                })?;
                let inner = last.ty;
                for element in &children[..children.len() - 1] {
                    element.check_conversion(types, inner, false)?;
                }
                let handle = context.get_handle(Type::Array(ArrayType { inner }));
                Ok((handle, false))
            }
        }
    }

    /// Require this expression to convert to `(to, lvalue)`. A failed value
    /// conversion is a TypeError naming both types; a conversion that only
    /// fails because an lvalue was required is the assignment error.
    pub fn check_conversion(
        &self,
        types: &TypeRegistry,
        to: TypeHandle,
        lvalue: bool,
    ) -> Result<(), Error> {
        if !is_convertible(types, self.ty, self.lvalue, to, lvalue) {
            if !is_convertible(types, self.ty, self.lvalue, to, false) {
                return Err(Error::type_err(
                    types.repr(self.ty),
                    types.repr(to),
                    self.pos,
                    0,
                ));
            }
            return Err(Error::semantic("cannot be assigned to.", self.pos, 0));
        }
        Ok(())
    }

    pub fn value(&self) -> &ExprValue {
        &self.value
    }

    pub fn operation(&self) -> Option<Operation> {
        match self.value {
            ExprValue::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    pub fn ty(&self) -> TypeHandle {
        self.ty
    }

    pub fn lvalue(&self) -> bool {
        self.lvalue
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }
}
