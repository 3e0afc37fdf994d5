//! Template context assembly
//!
//! Templates see one value: the [`Context`]. It carries the package's
//! full ordered declaration list, the same declarations partitioned into
//! typed buckets, the derived enums, and run metadata (timestamp, user,
//! host, sources). Assembled once per run, after enum derivation, and
//! read-only from then on.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decl::{
    ArrayDecl, ConstDecl, Decl, InterfaceDecl, MapDecl, StructDecl, TypedefDecl,
};
use crate::enums::Enum;
use crate::package::Package;

/// Everything a template can reference.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    /// Tool version string.
    pub version: String,
    /// Package (compilation unit) name.
    pub package: String,
    /// De-duplicated imported module paths, in first-appearance order.
    pub imports: Vec<String>,
    /// Directory the input unit was read from.
    pub directory: String,
    /// Names of the source files that fed the front end.
    pub filenames: Vec<String>,
    /// When this run happened.
    pub build_time: DateTime<Utc>,
    /// User invoking the run.
    pub username: String,
    /// Host the run is executing on.
    pub hostname: String,
    /// The full declaration list, in source order.
    pub decls: Vec<Decl>,
    pub typedefs: Vec<TypedefDecl>,
    pub array_types: Vec<ArrayDecl>,
    pub map_types: Vec<MapDecl>,
    pub struct_types: Vec<StructDecl>,
    pub interfaces: Vec<InterfaceDecl>,
    /// Every constant, enumerator or not.
    pub constants: Vec<ConstDecl>,
    pub enums: Vec<Enum>,
    /// Constants that belong to no derived enum.
    pub not_enums: Vec<ConstDecl>,
}

impl Context {
    /// Partitions a finished package (enum derivation already run) into
    /// the typed buckets templates iterate over.
    pub fn new(
        directory: impl Into<String>,
        filenames: Vec<String>,
        pkg: &Package,
        enums: Vec<Enum>,
    ) -> Self {
        let mut ctx = Context {
            version: crate::VERSION.to_string(),
            package: pkg.name.clone(),
            imports: pkg.imports.clone(),
            directory: directory.into(),
            filenames,
            build_time: Utc::now(),
            username: current_username(),
            hostname: current_hostname(),
            decls: pkg.decls.clone(),
            typedefs: Vec::new(),
            array_types: Vec::new(),
            map_types: Vec::new(),
            struct_types: Vec::new(),
            interfaces: Vec::new(),
            constants: Vec::new(),
            enums,
            not_enums: Vec::new(),
        };
        for decl in &pkg.decls {
            match decl {
                Decl::Const(d) => {
                    if !d.is_enumerator {
                        ctx.not_enums.push(d.clone());
                    }
                    ctx.constants.push(d.clone());
                }
                Decl::Typedef(d) => ctx.typedefs.push(d.clone()),
                Decl::Array(d) => ctx.array_types.push(d.clone()),
                Decl::Map(d) => ctx.map_types.push(d.clone()),
                Decl::Struct(d) => ctx.struct_types.push(d.clone()),
                Decl::Interface(d) => ctx.interfaces.push(d.clone()),
            }
        }
        ctx
    }
}

fn current_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn current_hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
