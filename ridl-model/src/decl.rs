//! Declaration entities
//!
//! One value per declared symbol, owned by the [`Package`] that built
//! them. [`Decl`] is a closed tagged enum matched exhaustively wherever
//! declarations are handled, so adding a kind is a compile-time-checked
//! change. After the enum deriver has run its single flag-setting pass,
//! the whole model is read-only for the remainder of the run.
//!
//! [`Package`]: crate::package::Package

use serde::Serialize;

use crate::symbol::SourcePos;

/// A single modeled declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Decl {
    Const(ConstDecl),
    Typedef(TypedefDecl),
    Array(ArrayDecl),
    Struct(StructDecl),
    Map(MapDecl),
    Interface(InterfaceDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Const(d) => &d.name,
            Decl::Typedef(d) => &d.name,
            Decl::Array(d) => &d.name,
            Decl::Struct(d) => &d.name,
            Decl::Map(d) => &d.name,
            Decl::Interface(d) => &d.name,
        }
    }

    pub fn pos(&self) -> &SourcePos {
        match self {
            Decl::Const(d) => &d.pos,
            Decl::Typedef(d) => &d.pos,
            Decl::Array(d) => &d.pos,
            Decl::Struct(d) => &d.pos,
            Decl::Map(d) => &d.pos,
            Decl::Interface(d) => &d.pos,
        }
    }

    /// The declaration's type rendered in the source descriptor grammar.
    pub fn type_desc(&self) -> String {
        match self {
            Decl::Const(d) => d.typ.clone(),
            Decl::Typedef(d) => d.alias.clone(),
            Decl::Array(d) => d.type_desc(),
            Decl::Struct(d) => format!("struct {}", d.name),
            Decl::Map(d) => format!("map[{}]{}", d.key, d.value),
            Decl::Interface(d) => format!("interface {}", d.name),
        }
    }
}

/// A constant declaration. `value` is the display form, `exact` the
/// exact form; `is_enumerator` is set by the enum deriver when the
/// constant belongs to a derived enum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstDecl {
    pub name: String,
    pub pos: SourcePos,
    pub typ: String,
    pub value: String,
    pub exact: String,
    pub is_enumerator: bool,
}

/// A scalar type alias, `type Name alias`. `is_enum` is set by the enum
/// deriver; `is_pointer` marks alias-to-pointer forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedefDecl {
    pub name: String,
    pub pos: SourcePos,
    pub alias: String,
    pub is_enum: bool,
    pub is_pointer: bool,
}

/// An array or slice declaration; `len == 0` means variable length.
/// `size` is the byte size of the whole fixed array, or of one element
/// for the variable-length form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayDecl {
    pub name: String,
    pub pos: SourcePos,
    pub elem: String,
    pub len: u64,
    pub size: u64,
}

impl ArrayDecl {
    pub fn is_slice(&self) -> bool {
        self.len == 0
    }

    pub fn type_desc(&self) -> String {
        if self.len == 0 {
            format!("[]{}", self.elem)
        } else {
            format!("[{}]{}", self.len, self.elem)
        }
    }
}

/// A struct declaration with its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub pos: SourcePos,
    pub size: u64,
    pub fields: Vec<StructField>,
}

/// A field within a struct: its byte size, offset within the enclosing
/// struct, required alignment, and any key/value tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructField {
    pub name: String,
    pub typ: String,
    pub size: u64,
    pub offset: u64,
    pub align: u64,
    pub tags: Vec<FieldTag>,
}

/// One key/value tag attached to a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTag {
    pub key: String,
    pub value: String,
}

/// A keyed-collection declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDecl {
    pub name: String,
    pub pos: SourcePos,
    pub key: String,
    pub value: String,
}

/// An interface declaration: methods in source order plus the names of
/// any embedded interfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub pos: SourcePos,
    pub methods: Vec<MethodDecl>,
    pub embeds: Vec<String>,
}

/// A method declared within an interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub args: Vec<MethodArg>,
    pub results: Vec<MethodArg>,
}

/// An argument to or result from a method. Unnamed arguments and results
/// get synthesized `arg<N>` / `res<N>` names during model construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodArg {
    pub name: String,
    pub typ: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_type_desc() {
        let fixed = ArrayDecl {
            name: "Window".to_string(),
            pos: SourcePos::default(),
            elem: "int32".to_string(),
            len: 16,
            size: 64,
        };
        assert_eq!(fixed.type_desc(), "[16]int32");
        assert!(!fixed.is_slice());

        let slice = ArrayDecl {
            len: 0,
            size: 4,
            ..fixed
        };
        assert_eq!(slice.type_desc(), "[]int32");
        assert!(slice.is_slice());
    }

    #[test]
    fn decl_accessors_cover_all_kinds() {
        let map = Decl::Map(MapDecl {
            name: "Routes".to_string(),
            pos: SourcePos::new("net.ridl", 9, 1),
            key: "string".to_string(),
            value: "Endpoint".to_string(),
        });
        assert_eq!(map.name(), "Routes");
        assert_eq!(map.pos().line, 9);
        assert_eq!(map.type_desc(), "map[string]Endpoint");
    }
}
