//! Package assembly — the model builder
//!
//! Consumes the front end's ordered symbol stream and produces one
//! declaration per symbol, dispatching on the symbol's underlying shape.
//! Declaration order always equals source-appearance order.

use serde::Serialize;
use tracing::debug;

use crate::abi::AbiSizer;
use crate::decl::{
    ArrayDecl, ConstDecl, Decl, FieldTag, InterfaceDecl, MapDecl, MethodArg, MethodDecl,
    StructDecl, StructField, TypedefDecl,
};
use crate::symbol::{ArgSym, MethodSym, Shape, Symbol};
use crate::ModelError;

/// Provisional type marker some front ends attach to numeric literals
/// before their type is pinned down by context.
const UNTYPED_MARKER: &str = "untyped ";

/// A single compilation unit: a named, ordered collection of
/// declarations plus the de-duplicated list of imported module paths.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Package {
    pub name: String,
    pub decls: Vec<Decl>,
    pub imports: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decls: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Builds the declaration model from the front end's symbol stream.
    ///
    /// Symbols are consumed in the order given, which the front end
    /// guarantees to be source order. A symbol whose shape falls outside
    /// the supported declaration grammar aborts construction.
    pub fn from_symbols(
        name: impl Into<String>,
        imports: &[String],
        symbols: &[Symbol],
        sizer: &dyn AbiSizer,
    ) -> Result<Package, ModelError> {
        let mut pkg = Package::new(name);
        for path in imports {
            pkg.import(path);
        }
        for sym in symbols {
            pkg.declare_symbol(sym, sizer)?;
        }
        debug!(
            package = %pkg.name,
            decls = pkg.decls.len(),
            "declaration model built"
        );
        Ok(pkg)
    }

    /// Appends a declaration to the package.
    pub fn declare(&mut self, decl: Decl) {
        self.decls.push(decl);
    }

    /// Records an imported module path, keeping the import list
    /// duplicate free while preserving first-appearance order.
    pub fn import(&mut self, path: &str) {
        if !self.imports.iter().any(|p| p == path) {
            self.imports.push(path.to_string());
        }
    }

    fn declare_symbol(&mut self, sym: &Symbol, sizer: &dyn AbiSizer) -> Result<(), ModelError> {
        match &sym.shape {
            Shape::Const { typ, value, exact } => {
                let typ = typ.strip_prefix(UNTYPED_MARKER).unwrap_or(typ);
                self.declare(Decl::Const(ConstDecl {
                    name: sym.name.clone(),
                    pos: sym.pos.clone(),
                    typ: typ.to_string(),
                    value: value.clone(),
                    exact: exact.clone(),
                    is_enumerator: false,
                }));
            }
            Shape::Scalar {
                underlying,
                pointer,
            } => {
                self.declare(Decl::Typedef(TypedefDecl {
                    name: sym.name.clone(),
                    pos: sym.pos.clone(),
                    alias: underlying.clone(),
                    is_enum: false,
                    is_pointer: *pointer,
                }));
            }
            Shape::FixedArray { elem, len } => {
                let size = sizer.size_of(&format!("[{}]{}", len, elem))?;
                self.declare(Decl::Array(ArrayDecl {
                    name: sym.name.clone(),
                    pos: sym.pos.clone(),
                    elem: elem.clone(),
                    len: *len,
                    size,
                }));
            }
            Shape::Slice { elem } => {
                let size = sizer.size_of(elem)?;
                self.declare(Decl::Array(ArrayDecl {
                    name: sym.name.clone(),
                    pos: sym.pos.clone(),
                    elem: elem.clone(),
                    len: 0,
                    size,
                }));
            }
            Shape::Map { key, value } => {
                self.declare(Decl::Map(MapDecl {
                    name: sym.name.clone(),
                    pos: sym.pos.clone(),
                    key: key.clone(),
                    value: value.clone(),
                }));
            }
            Shape::Struct { fields } => {
                let decl = self.build_struct(sym, fields, sizer)?;
                self.declare(Decl::Struct(decl));
            }
            Shape::Interface { methods, embeds } => {
                self.declare(Decl::Interface(build_interface(sym, methods, embeds)));
            }
            Shape::Opaque { description } => {
                return Err(ModelError::UnsupportedShape {
                    name: sym.name.clone(),
                    description: description.clone(),
                });
            }
        }
        Ok(())
    }

    fn build_struct(
        &self,
        sym: &Symbol,
        fields: &[crate::symbol::FieldSym],
        sizer: &dyn AbiSizer,
    ) -> Result<StructDecl, ModelError> {
        // Anonymous fields are skipped outright, including for offset
        // padding. TODO: account for embedded fields in the layout once
        // embedding is supported.
        let named: Vec<&crate::symbol::FieldSym> =
            fields.iter().filter(|f| !f.anonymous).collect();
        let types: Vec<String> = named.iter().map(|f| f.typ.clone()).collect();

        // One batched query for the whole field list; padding insertion
        // depends on neighboring fields.
        let offsets = sizer.offsets_of(&types)?;

        let mut decl = StructDecl {
            name: sym.name.clone(),
            pos: sym.pos.clone(),
            size: sizer.size_of(&sym.name)?,
            fields: Vec::with_capacity(named.len()),
        };
        for (field, offset) in named.iter().zip(offsets) {
            decl.fields.push(StructField {
                name: field.name.clone(),
                typ: field.typ.clone(),
                size: sizer.size_of(&field.typ)?,
                offset,
                align: sizer.align_of(&field.typ)?,
                tags: field
                    .tags
                    .iter()
                    .map(|t| FieldTag {
                        key: t.key.clone(),
                        value: t.value.clone(),
                    })
                    .collect(),
            });
        }
        Ok(decl)
    }
}

fn make_method_args(args: &[ArgSym], prefix: &str) -> Vec<MethodArg> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| MethodArg {
            name: match &arg.name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => format!("{}{}", prefix, i + 1),
            },
            typ: arg.typ.clone(),
        })
        .collect()
}

fn build_interface(sym: &Symbol, methods: &[MethodSym], embeds: &[String]) -> InterfaceDecl {
    // The front end's method enumeration order is unspecified; source
    // position is the order templates see.
    let mut ordered: Vec<&MethodSym> = methods.iter().collect();
    ordered.sort_by_key(|m| m.line);

    InterfaceDecl {
        name: sym.name.clone(),
        pos: sym.pos.clone(),
        methods: ordered
            .into_iter()
            .map(|m| MethodDecl {
                name: m.name.clone(),
                args: make_method_args(&m.args, "arg"),
                results: make_method_args(&m.results, "res"),
            })
            .collect(),
        embeds: embeds.to_vec(),
    }
}
