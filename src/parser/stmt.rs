use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::ast::Expression;
use crate::context::IdentifierInfo;
use crate::span::Pos;
use crate::types::TypeHandle;

/// One catch arm of a try statement: the exception type, the name it binds,
/// and the handler body.
#[derive(Debug)]
pub struct CatchClause {
    pub ty: TypeHandle,
    pub name: String,
    pub body: Statement,
}

#[derive(Debug)]
pub enum StatementKind {
    Empty,
    Expr(Expression),
    Block(Vec<Statement>),
    Declare {
        info: IdentifierInfo,
        name: String,
        /// Initializer statement; `Empty` when the declaration has none.
        value: Statement,
    },
    Decfunc {
        info: IdentifierInfo,
        name: String,
        param_infos: Vec<IdentifierInfo>,
        param_names: Vec<String>,
        /// Body block, or `Empty` for a forward declaration.
        body: Statement,
    },
    Return(Statement),
    Break,
    Continue,
    IfElse {
        condition: Statement,
        do_if: Statement,
        do_else: Statement,
    },
    While {
        condition: Statement,
        looped: Statement,
    },
    DoWhile {
        condition: Statement,
        looped: Statement,
    },
    For {
        init: Statement,
        condition: Statement,
        step: Statement,
        looped: Statement,
    },
    Foreach {
        declared: Statement,
        iter: Statement,
        looped: Statement,
    },
    Switch {
        tested: Statement,
        contents: Statement,
    },
    SwitchCase {
        /// `None` for `default:`.
        test: Option<Expression>,
    },
    TryCatch {
        guarded: Statement,
        catchers: Vec<CatchClause>,
        finally: Option<Statement>,
    },
}

#[derive(Debug)]
struct StatementNode {
    kind: StatementKind,
    parent: RefCell<Weak<StatementNode>>,
    pos: Pos,
}

/// A shared handle to a statement. Children are owned through their kind;
/// the upward edge is weak and set after construction, so the tree holds no
/// reference cycles.
#[derive(Debug, Clone)]
pub struct Statement {
    node: Rc<StatementNode>,
}

impl Statement {
    pub fn new(kind: StatementKind, pos: Pos) -> Self {
        Self {
            node: Rc::new(StatementNode {
                kind,
                parent: RefCell::new(Weak::new()),
                pos,
            }),
        }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.node.kind
    }

    pub fn pos(&self) -> Pos {
        self.node.pos
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.node.kind, StatementKind::Empty)
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self.node.kind, StatementKind::Declare { .. })
    }

    pub fn parent(&self) -> Option<Statement> {
        self.node.parent.borrow().upgrade().map(|node| Statement { node })
    }

    pub fn set_parent(&self, parent: &Statement) {
        *self.node.parent.borrow_mut() = Rc::downgrade(&parent.node);
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Statement> {
        match &self.node.kind {
            StatementKind::Empty
            | StatementKind::Expr(_)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::SwitchCase { .. } => Vec::new(),
            StatementKind::Block(contents) => contents.iter().collect(),
            StatementKind::Declare { value, .. } => vec![value],
            StatementKind::Decfunc { body, .. } => vec![body],
            StatementKind::Return(value) => vec![value],
            StatementKind::IfElse {
                condition,
                do_if,
                do_else,
            } => vec![condition, do_if, do_else],
            StatementKind::While { condition, looped } => vec![condition, looped],
            StatementKind::DoWhile { condition, looped } => vec![looped, condition],
            StatementKind::For {
                init,
                condition,
                step,
                looped,
            } => vec![init, condition, step, looped],
            StatementKind::Foreach {
                declared,
                iter,
                looped,
            } => vec![declared, iter, looped],
            StatementKind::Switch { tested, contents } => vec![tested, contents],
            StatementKind::TryCatch {
                guarded,
                catchers,
                finally,
            } => {
                let mut children = vec![guarded];
                children.extend(catchers.iter().map(|c| &c.body));
                if let Some(finally) = finally {
                    children.push(finally);
                }
                children
            }
        }
    }

    /// Adopt every direct child: point their parent edges at this node.
    pub fn adopt_children(&self) {
        for child in self.children() {
            child.set_parent(self);
        }
    }
}
