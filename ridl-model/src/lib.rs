//! Declaration model for the ridl interface compiler
//!
//! This crate turns the symbol stream produced by an external front end
//! into a canonical, ordered set of declaration entities, derives C-style
//! enums from the "integer typedef plus constants" idiom, and assembles
//! the read-only context that templates are rendered against.

pub mod abi;
pub mod context;
pub mod decl;
pub mod enums;
pub mod package;
pub mod symbol;

pub use abi::{AbiError, AbiSizer, HostAbi};
pub use context::Context;
pub use decl::{
    ArrayDecl, ConstDecl, Decl, FieldTag, InterfaceDecl, MapDecl, MethodArg, MethodDecl,
    StructDecl, StructField, TypedefDecl,
};
pub use enums::{derive_enums, Enum};
pub use package::Package;
pub use symbol::{ArgSym, FieldSym, MethodSym, Shape, SourcePos, Symbol, SymbolSet};

/// Tool version, exposed to templates as part of the context.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors raised while constructing the declaration model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The front end handed over a symbol whose underlying shape is
    /// outside the supported declaration grammar. This aborts model
    /// construction; partially modeled input is never emitted.
    #[error("{name}: unsupported declaration shape: {description}")]
    UnsupportedShape { name: String, description: String },

    #[error(transparent)]
    Abi(#[from] AbiError),
}
