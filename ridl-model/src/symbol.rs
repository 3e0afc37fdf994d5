//! Front-end contract types
//!
//! The front end (an external parser and type resolver) hands over one
//! [`SymbolSet`] per compilation unit: the package name, its imports, and
//! the resolved symbols in source order. Every type in this module is
//! serde-serializable so a front end written in any language can deliver
//! its scope as JSON.

use serde::{Deserialize, Serialize};

/// Position of a declaration in the original source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// One resolved, named symbol from the front end's package scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    #[serde(default)]
    pub pos: SourcePos,
    pub shape: Shape,
}

/// The structural category of a symbol's resolved type, used to dispatch
/// model construction. This is a closed set; anything the front end
/// cannot classify arrives as [`Shape::Opaque`] and is rejected by the
/// model builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Shape {
    /// A scalar alias, `type Name underlying`. `pointer` is set for
    /// aliases to a pointer-to-scalar form.
    Scalar {
        underlying: String,
        #[serde(default)]
        pointer: bool,
    },
    /// Fixed-length sequence, `len` elements of `elem`.
    FixedArray { elem: String, len: u64 },
    /// Variable-length sequence of `elem`.
    Slice { elem: String },
    /// Aggregate of named fields.
    Struct { fields: Vec<FieldSym> },
    /// Keyed collection.
    Map { key: String, value: String },
    /// Named method set.
    Interface {
        methods: Vec<MethodSym>,
        #[serde(default)]
        embeds: Vec<String>,
    },
    /// A constant. `value` is the display form, `exact` the exact form.
    /// `typ` may still carry the front end's provisional "untyped "
    /// marker for numeric literals.
    Const {
        typ: String,
        value: String,
        exact: String,
    },
    /// A shape outside the supported declaration grammar.
    Opaque { description: String },
}

/// A struct field as reported by the front end. Anonymous (embedded)
/// fields are flagged so the builder can skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSym {
    pub name: String,
    pub typ: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub tags: Vec<TagSym>,
}

/// A single key/value tag attached to a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSym {
    pub key: String,
    pub value: String,
}

/// An interface method. `line` orders methods by source position; the
/// enumeration order the front end uses is unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSym {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub args: Vec<ArgSym>,
    #[serde(default)]
    pub results: Vec<ArgSym>,
}

/// An argument to, or result from, an interface method. The name may be
/// omitted in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSym {
    #[serde(default)]
    pub name: Option<String>,
    pub typ: String,
}

/// The complete output of a front-end run over one compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSet {
    pub package: String,
    #[serde(default)]
    pub imports: Vec<String>,
    pub symbols: Vec<Symbol>,
}
