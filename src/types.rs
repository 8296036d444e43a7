use std::collections::BTreeMap;
use std::fmt;

/// The fundamental built-in types, in precision order for the widening
/// rules (`bool` narrowest, `double` widest among numerics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Primitive {
    Void,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    Str,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArrayType {
    pub inner: TypeHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FuncType {
    pub returning: TypeHandle,
    pub params: Vec<TypeHandle>,
    /// True when the last parameter absorbs surplus arguments (`...`).
    pub varargs: bool,
}

/// User-defined class. The inheritance list is in method-resolution order;
/// classes are never parsed by this front end but participate in the type
/// model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassType {
    pub name: String,
    pub inheritance: Vec<TypeHandle>,
}

/// An instance of a user-defined class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectType {
    pub class: TypeHandle,
}

/// Structural type value. The derived ordering (variant tag, then payload)
/// is the total order backing the canonical set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Type {
    Primitive(Primitive),
    Array(ArrayType),
    Func(FuncType),
    Any,
    Class(ClassType),
    Object(ObjectType),
}

/// Canonical reference to an interned type. Two handles are equal exactly
/// when the types they denote are structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeHandle(usize);

/// Interning registry. Primitives and `any` occupy fixed pre-seeded slots;
/// compound types are appended once and reused ever after, so handle
/// comparison is complete type equality.
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<Type>,
    interned: BTreeMap<Type, TypeHandle>,
}

impl TypeRegistry {
    pub const VOID: TypeHandle = TypeHandle(0);
    pub const BYTE: TypeHandle = TypeHandle(1);
    pub const SHORT: TypeHandle = TypeHandle(2);
    pub const INT: TypeHandle = TypeHandle(3);
    pub const LONG: TypeHandle = TypeHandle(4);
    pub const FLOAT: TypeHandle = TypeHandle(5);
    pub const DOUBLE: TypeHandle = TypeHandle(6);
    pub const BOOL: TypeHandle = TypeHandle(7);
    pub const CHAR: TypeHandle = TypeHandle(8);
    pub const STR: TypeHandle = TypeHandle(9);
    pub const ANY: TypeHandle = TypeHandle(10);

    pub fn new() -> Self {
        let types = vec![
            Type::Primitive(Primitive::Void),
            Type::Primitive(Primitive::Byte),
            Type::Primitive(Primitive::Short),
            Type::Primitive(Primitive::Int),
            Type::Primitive(Primitive::Long),
            Type::Primitive(Primitive::Float),
            Type::Primitive(Primitive::Double),
            Type::Primitive(Primitive::Bool),
            Type::Primitive(Primitive::Char),
            Type::Primitive(Primitive::Str),
            Type::Any,
        ];
        let interned = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), TypeHandle(i)))
            .collect();
        Self { types, interned }
    }

    pub fn primitive_handle(p: Primitive) -> TypeHandle {
        match p {
            Primitive::Void => Self::VOID,
            Primitive::Byte => Self::BYTE,
            Primitive::Short => Self::SHORT,
            Primitive::Int => Self::INT,
            Primitive::Long => Self::LONG,
            Primitive::Float => Self::FLOAT,
            Primitive::Double => Self::DOUBLE,
            Primitive::Bool => Self::BOOL,
            Primitive::Char => Self::CHAR,
            Primitive::Str => Self::STR,
        }
    }

    pub fn get_handle(&mut self, t: Type) -> TypeHandle {
        if let Type::Primitive(p) = t {
            return Self::primitive_handle(p);
        }
        if let Some(handle) = self.interned.get(&t) {
            return *handle;
        }
        let handle = TypeHandle(self.types.len());
        self.types.push(t.clone());
        self.interned.insert(t, handle);
        handle
    }

    pub fn lookup(&self, handle: TypeHandle) -> &Type {
        &self.types[handle.0]
    }

    pub fn as_array(&self, handle: TypeHandle) -> Option<&ArrayType> {
        match self.lookup(handle) {
            Type::Array(at) => Some(at),
            _ => None,
        }
    }

    pub fn as_func(&self, handle: TypeHandle) -> Option<&FuncType> {
        match self.lookup(handle) {
            Type::Func(ft) => Some(ft),
            _ => None,
        }
    }

    /// Human-readable rendering of a type.
    pub fn repr(&self, handle: TypeHandle) -> String {
        match self.lookup(handle) {
            Type::Primitive(p) => p.to_string(),
            Type::Any => "any".to_string(),
            Type::Array(at) => format!("{}[]", self.repr(at.inner)),
            Type::Func(ft) => {
                let mut out = format!("{}(", self.repr(ft.returning));
                let mut separator = "";
                for param in &ft.params {
                    out += separator;
                    out += &self.repr(*param);
                    separator = ", ";
                }
                if ft.varargs {
                    out += "...";
                }
                out + ")"
            }
            Type::Class(ct) => ct.name.clone(),
            Type::Object(ot) => match self.lookup(ot.class) {
                Type::Class(ct) => ct.name.clone(),
                _ => "(object)".to_string(),
            },
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Void => "void",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_use_fixed_handles() {
        let mut registry = TypeRegistry::new();
        assert_eq!(
            registry.get_handle(Type::Primitive(Primitive::Int)),
            TypeRegistry::INT
        );
        assert_eq!(registry.get_handle(Type::Any), TypeRegistry::ANY);
    }

    #[test]
    fn compound_types_intern_to_one_handle() {
        let mut registry = TypeRegistry::new();
        let a = registry.get_handle(Type::Array(ArrayType { inner: TypeRegistry::INT }));
        let b = registry.get_handle(Type::Array(ArrayType { inner: TypeRegistry::INT }));
        let c = registry.get_handle(Type::Array(ArrayType { inner: TypeRegistry::LONG }));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn function_equality_is_structural() {
        let mut registry = TypeRegistry::new();
        let f1 = registry.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::INT,
            params: vec![TypeRegistry::INT, TypeRegistry::STR],
            varargs: false,
        }));
        let f2 = registry.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::INT,
            params: vec![TypeRegistry::INT, TypeRegistry::STR],
            varargs: false,
        }));
        let f3 = registry.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::INT,
            params: vec![TypeRegistry::INT, TypeRegistry::STR],
            varargs: true,
        }));
        assert_eq!(f1, f2);
        assert_ne!(f1, f3);
    }

    #[test]
    fn nested_arrays_share_structure() {
        let mut registry = TypeRegistry::new();
        let inner = registry.get_handle(Type::Array(ArrayType { inner: TypeRegistry::BOOL }));
        let outer1 = registry.get_handle(Type::Array(ArrayType { inner }));
        let outer2 = registry.get_handle(Type::Array(ArrayType { inner }));
        assert_eq!(outer1, outer2);
    }

    #[test]
    fn repr_formats() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.repr(TypeRegistry::DOUBLE), "double");
        assert_eq!(registry.repr(TypeRegistry::ANY), "any");

        let ints = registry.get_handle(Type::Array(ArrayType { inner: TypeRegistry::INT }));
        assert_eq!(registry.repr(ints), "int[]");

        let f = registry.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::VOID,
            params: vec![TypeRegistry::INT, ints],
            varargs: true,
        }));
        assert_eq!(registry.repr(f), "void(int, int[]...)");

        let empty = registry.get_handle(Type::Func(FuncType {
            returning: TypeRegistry::BOOL,
            params: vec![],
            varargs: false,
        }));
        assert_eq!(registry.repr(empty), "bool()");
    }

    #[test]
    fn class_and_object_repr() {
        let mut registry = TypeRegistry::new();
        let class = registry.get_handle(Type::Class(ClassType {
            name: "Point".into(),
            inheritance: vec![],
        }));
        let object = registry.get_handle(Type::Object(ObjectType { class }));
        assert_eq!(registry.repr(class), "Point");
        assert_eq!(registry.repr(object), "Point");
    }
}
