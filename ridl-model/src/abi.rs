//! ABI-sizing oracle
//!
//! The model builder needs byte sizes, alignments and field offsets for
//! a fixed reference platform. The oracle is a trait so a front end can
//! supply its own sizing; [`HostAbi`] implements it for a 64-bit
//! reference ABI by resolving named types through the symbol set itself.

use std::collections::HashMap;

use crate::symbol::{Shape, Symbol};

/// Errors raised by ABI queries.
#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    #[error("unknown type {0:?} in ABI query")]
    UnknownType(String),

    #[error("malformed type descriptor {0:?}")]
    Malformed(String),
}

/// Byte-size, alignment and batched field-offset queries for a fixed
/// reference platform ABI.
///
/// Offsets are position dependent (padding insertion depends on the
/// neighboring fields), so a struct's field list must be laid out in one
/// `offsets_of` call, never field by field.
pub trait AbiSizer {
    fn size_of(&self, ty: &str) -> Result<u64, AbiError>;
    fn align_of(&self, ty: &str) -> Result<u64, AbiError>;
    fn offsets_of(&self, fields: &[String]) -> Result<Vec<u64>, AbiError>;
}

/// Reference 64-bit ABI: 8-byte words, 8-byte maximal alignment,
/// 16-byte strings (pointer + length), 24-byte slice headers
/// (pointer + length + capacity), 8-byte map and pointer values.
pub struct HostAbi {
    named: HashMap<String, Shape>,
}

const WORD: u64 = 8;
const STRING_SIZE: u64 = 16;
const SLICE_SIZE: u64 = 24;
const INTERFACE_SIZE: u64 = 16;

fn primitive(ty: &str) -> Option<(u64, u64)> {
    // (size, alignment)
    let size = match ty {
        "bool" | "byte" | "int8" | "uint8" => 1,
        "int16" | "uint16" => 2,
        "int32" | "uint32" | "rune" | "float32" => 4,
        "int" | "uint" | "int64" | "uint64" | "uintptr" | "float64" | "complex64" => 8,
        "complex128" => 16,
        _ => return None,
    };
    Some((size, size.min(WORD)))
}

// Anonymous fields do not participate in layout; the builder skips them
// and the layout here must agree with the builder's offsets.
fn named_field_types(fields: &[crate::symbol::FieldSym]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| !f.anonymous)
        .map(|f| f.typ.clone())
        .collect()
}

fn align_up(offset: u64, align: u64) -> u64 {
    let align = align.max(1);
    (offset + align - 1) / align * align
}

impl HostAbi {
    /// An oracle that only knows primitives and composite descriptors.
    pub fn new() -> Self {
        Self {
            named: HashMap::new(),
        }
    }

    /// Builds an oracle that can also resolve the named types declared
    /// in `symbols` (constants carry no layout and are not registered).
    pub fn for_symbols(symbols: &[Symbol]) -> Self {
        let mut named = HashMap::new();
        for sym in symbols {
            match sym.shape {
                Shape::Const { .. } | Shape::Opaque { .. } => {}
                _ => {
                    named.insert(sym.name.clone(), sym.shape.clone());
                }
            }
        }
        Self { named }
    }

    fn layout(&self, fields: &[String]) -> Result<(Vec<u64>, u64, u64), AbiError> {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut offset = 0u64;
        let mut max_align = 1u64;
        for field in fields {
            let align = self.align_of(field)?;
            let size = self.size_of(field)?;
            offset = align_up(offset, align);
            offsets.push(offset);
            offset += size;
            max_align = max_align.max(align);
        }
        Ok((offsets, align_up(offset, max_align), max_align))
    }

    fn named_size(&self, name: &str, shape: &Shape) -> Result<u64, AbiError> {
        match shape {
            Shape::Scalar {
                underlying,
                pointer,
            } => {
                if *pointer {
                    Ok(WORD)
                } else {
                    self.size_of(underlying)
                }
            }
            Shape::FixedArray { elem, len } => Ok(self.size_of(elem)? * len),
            Shape::Slice { .. } => Ok(SLICE_SIZE),
            Shape::Map { .. } => Ok(WORD),
            Shape::Interface { .. } => Ok(INTERFACE_SIZE),
            Shape::Struct { fields } => {
                let (_, size, _) = self.layout(&named_field_types(fields))?;
                Ok(size)
            }
            Shape::Const { .. } | Shape::Opaque { .. } => {
                Err(AbiError::UnknownType(name.to_string()))
            }
        }
    }

    fn named_align(&self, name: &str, shape: &Shape) -> Result<u64, AbiError> {
        match shape {
            Shape::Scalar {
                underlying,
                pointer,
            } => {
                if *pointer {
                    Ok(WORD)
                } else {
                    self.align_of(underlying)
                }
            }
            Shape::FixedArray { elem, .. } => self.align_of(elem),
            Shape::Slice { .. } | Shape::Map { .. } | Shape::Interface { .. } => Ok(WORD),
            Shape::Struct { fields } => {
                let (_, _, align) = self.layout(&named_field_types(fields))?;
                Ok(align)
            }
            Shape::Const { .. } | Shape::Opaque { .. } => {
                Err(AbiError::UnknownType(name.to_string()))
            }
        }
    }

    // Splits "[N]T" into (N, T). The bracket must close.
    fn split_array(ty: &str) -> Result<(&str, &str), AbiError> {
        let inner = &ty[1..];
        let end = inner
            .find(']')
            .ok_or_else(|| AbiError::Malformed(ty.to_string()))?;
        Ok((&inner[..end], &inner[end + 1..]))
    }
}

impl Default for HostAbi {
    fn default() -> Self {
        Self::new()
    }
}

impl AbiSizer for HostAbi {
    fn size_of(&self, ty: &str) -> Result<u64, AbiError> {
        if ty.starts_with('*') {
            return Ok(WORD);
        }
        if ty.starts_with("map[") {
            return Ok(WORD);
        }
        if let Some(rest) = ty.strip_prefix("[]") {
            // Slice of anything is one header; the element must still
            // be well formed.
            self.align_of(rest)?;
            return Ok(SLICE_SIZE);
        }
        if ty.starts_with('[') {
            let (dim, elem) = Self::split_array(ty)?;
            let len: u64 = dim
                .parse()
                .map_err(|_| AbiError::Malformed(ty.to_string()))?;
            return Ok(self.size_of(elem)? * len);
        }
        if ty == "struct{}" {
            return Ok(0);
        }
        if ty == "string" || ty == "error" {
            return Ok(STRING_SIZE);
        }
        if let Some((size, _)) = primitive(ty) {
            return Ok(size);
        }
        match self.named.get(ty) {
            Some(shape) => self.named_size(ty, shape),
            None => Err(AbiError::UnknownType(ty.to_string())),
        }
    }

    fn align_of(&self, ty: &str) -> Result<u64, AbiError> {
        if ty.starts_with('*') || ty.starts_with("map[") {
            return Ok(WORD);
        }
        if ty.strip_prefix("[]").is_some() {
            return Ok(WORD);
        }
        if ty.starts_with('[') {
            let (_, elem) = Self::split_array(ty)?;
            return self.align_of(elem);
        }
        if ty == "struct{}" {
            return Ok(1);
        }
        if ty == "string" || ty == "error" {
            return Ok(WORD);
        }
        if let Some((_, align)) = primitive(ty) {
            return Ok(align);
        }
        match self.named.get(ty) {
            Some(shape) => self.named_align(ty, shape),
            None => Err(AbiError::UnknownType(ty.to_string())),
        }
    }

    fn offsets_of(&self, fields: &[String]) -> Result<Vec<u64>, AbiError> {
        let (offsets, _, _) = self.layout(fields)?;
        Ok(offsets)
    }
}
