use std::collections::HashMap;

use crate::types::{Type, TypeHandle, TypeRegistry};

/// Resolved binding of a name: its type, a dense slot index, and the
/// modifier flags. Globals are indexed 0, 1, 2, …; locals continue their
/// enclosing frame's counter (starting at 1); parameters count down from
/// −1. Copied by value into declaration nodes, so bindings outlive their
/// frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierInfo {
    pub ty: TypeHandle,
    pub index: isize,
    pub is_global: bool,
    pub is_final: bool,
    pub is_static: bool,
}

/// One level of the nested local-scope chain.
struct Frame {
    identifiers: HashMap<String, IdentifierInfo>,
    parent: Option<Box<Frame>>,
    next_index: isize,
    /// Set on frames installed by `enter_function`; such a frame is both
    /// the parameter frame and the outermost local frame of the body.
    function: bool,
    next_param_index: isize,
}

impl Frame {
    fn find(&self, name: &str) -> Option<IdentifierInfo> {
        if let Some(info) = self.identifiers.get(name) {
            return Some(*info);
        }
        self.parent.as_ref().and_then(|parent| parent.find(name))
    }
}

/// Scope-aware name table threaded through the whole parse: one global
/// table plus an optional chain of local frames, owning the type registry
/// the parse interns through.
pub struct CompilerContext {
    globals: HashMap<String, IdentifierInfo>,
    locals: Option<Box<Frame>>,
    pub types: TypeRegistry,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            locals: None,
            types: TypeRegistry::new(),
        }
    }

    pub fn get_handle(&mut self, t: Type) -> TypeHandle {
        self.types.get_handle(t)
    }

    /// Innermost-out lookup: the local chain first, then globals.
    pub fn find(&self, name: &str) -> Option<IdentifierInfo> {
        if let Some(locals) = &self.locals {
            if let Some(info) = locals.find(name) {
                return Some(info);
            }
        }
        self.globals.get(name).copied()
    }

    /// Bind `name` in the innermost frame (or globally when no local frame
    /// is active). Returns `None` when the name already resolves anywhere
    /// visible; callers turn that into a SemanticError at the use site.
    pub fn create_identifier(
        &mut self,
        name: impl Into<String>,
        ty: TypeHandle,
        is_final: bool,
        is_static: bool,
    ) -> Option<IdentifierInfo> {
        let name = name.into();
        if self.find(&name).is_some() {
            return None;
        }
        match self.locals.as_mut() {
            Some(frame) => {
                let info = IdentifierInfo {
                    ty,
                    index: frame.next_index,
                    is_global: false,
                    is_final,
                    is_static,
                };
                frame.next_index += 1;
                frame.identifiers.insert(name, info);
                Some(info)
            }
            None => {
                let info = IdentifierInfo {
                    ty,
                    index: self.globals.len() as isize,
                    is_global: true,
                    is_final,
                    is_static,
                };
                self.globals.insert(name, info);
                Some(info)
            }
        }
    }

    /// Bind a parameter in the innermost function frame with the next
    /// negative index. Returns `None` outside any function scope. A repeated
    /// name keeps its first binding; the index counter still advances.
    pub fn create_param(
        &mut self,
        name: impl Into<String>,
        ty: TypeHandle,
    ) -> Option<IdentifierInfo> {
        let name = name.into();
        let mut frame = self.locals.as_deref_mut();
        while let Some(f) = frame {
            if f.function {
                let info = IdentifierInfo {
                    ty,
                    index: f.next_param_index,
                    is_global: false,
                    is_final: false,
                    is_static: false,
                };
                f.next_param_index -= 1;
                return Some(*f.identifiers.entry(name).or_insert(info));
            }
            frame = f.parent.as_deref_mut();
        }
        None
    }

    /// Push a plain local frame, continuing the parent frame's index
    /// counter.
    pub fn enter_scope(&mut self) {
        let next_index = self.locals.as_ref().map_or(1, |f| f.next_index);
        self.locals = Some(Box::new(Frame {
            identifiers: HashMap::new(),
            parent: self.locals.take(),
            next_index,
            function: false,
            next_param_index: -1,
        }));
    }

    /// Push a function frame with a fresh index counter; it receives the
    /// parameters and serves as the outermost local frame of the body.
    pub fn enter_function(&mut self) {
        self.locals = Some(Box::new(Frame {
            identifiers: HashMap::new(),
            parent: self.locals.take(),
            next_index: 1,
            function: true,
            next_param_index: -1,
        }));
    }

    /// Pop the innermost local frame. Returns false when no frame is
    /// active.
    pub fn leave_scope(&mut self) -> bool {
        match self.locals.take() {
            Some(frame) => {
                self.locals = frame.parent;
                true
            }
            None => false,
        }
    }
}

impl Default for CompilerContext {
    fn default() -> Self {
        Self::new()
    }
}
