//! Type-translation engine
//!
//! Rewrites source type descriptors (`T`, `[N]T`, `[]T`, `map[K]V`) into
//! target-language types under the configurable base-type table.
//! Translation is pure and recurses structurally, so arbitrarily nested
//! composites resolve correctly. A descriptor that opens a bracket
//! without closing it is a malformed-input error; the front end is
//! expected to hand over only well-formed descriptors, so this surfaces
//! as an internal-consistency failure rather than being papered over.

use crate::typemap::TypeMap;

/// The value type denoting "no payload": a map of this value type is a
/// set of its keys.
pub const EMPTY_PAYLOAD: &str = "struct{}";

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("malformed type descriptor {0:?}")]
    Malformed(String),
}

/// Translates a type descriptor into its target form.
///
/// With `as_argument` set, types whose base mapping is flagged
/// pass-by-reference (and all container forms) come back const-reference
/// qualified; small scalars stay by value.
pub fn translate(desc: &str, as_argument: bool, map: &TypeMap) -> Result<String, TranslateError> {
    let desc = desc.trim();

    if let Some(rest) = desc.strip_prefix("map[") {
        let (key, value) = split_key_value(rest).ok_or_else(|| malformed(desc))?;
        let target_key = translate(key, false, map)?;
        let target = if value.trim() == EMPTY_PAYLOAD {
            format!("std::set<{}>", target_key)
        } else {
            format!("std::map<{}, {}>", target_key, translate(value, false, map)?)
        };
        return Ok(qualify(target, true, as_argument));
    }

    if let Some(rest) = desc.strip_prefix('[') {
        let end = rest.find(']').ok_or_else(|| malformed(desc))?;
        let dim = rest[..end].trim();
        let elem = translate(&rest[end + 1..], false, map)?;
        let target = if dim.is_empty() {
            format!("std::vector<{}>", elem)
        } else {
            format!("std::array<{}, {}>", elem, dim)
        };
        return Ok(qualify(target, true, as_argument));
    }

    let (target, by_ref) = map.lookup(desc);
    Ok(qualify(target, by_ref, as_argument))
}

/// Field/value-position translation.
pub fn cpp_type(desc: &str, map: &TypeMap) -> Result<String, TranslateError> {
    translate(desc, false, map)
}

/// Argument-position translation.
pub fn arg_type(desc: &str, map: &TypeMap) -> Result<String, TranslateError> {
    translate(desc, true, map)
}

/// Result-position translation: a trailing pointer form becomes a
/// dynamic sequence, so an interface method's extra unnamed results are
/// emitted as output vectors rather than output pointers.
pub fn result_type(desc: &str, map: &TypeMap) -> Result<String, TranslateError> {
    let target = translate(desc, false, map)?;
    match target.strip_suffix(" *") {
        Some(pointee) => Ok(format!("std::vector<{}>", pointee)),
        None => Ok(target),
    }
}

/// The element part of an array/slice descriptor; bare names come back
/// unchanged.
pub fn elem_type(desc: &str) -> Result<&str, TranslateError> {
    if !desc.starts_with('[') {
        return Ok(desc);
    }
    let end = desc.find(']').ok_or_else(|| malformed(desc))?;
    Ok(&desc[end + 1..])
}

/// The leading `[..]` part of an array/slice descriptor, empty for bare
/// names.
pub fn dims(desc: &str) -> Result<&str, TranslateError> {
    if !desc.starts_with('[') {
        return Ok("");
    }
    let end = desc.find(']').ok_or_else(|| malformed(desc))?;
    Ok(&desc[..end + 1])
}

/// True for variable-length sequence descriptors.
pub fn is_slice(desc: &str) -> bool {
    desc.starts_with("[]")
}

fn malformed(desc: &str) -> TranslateError {
    TranslateError::Malformed(desc.to_string())
}

fn qualify(target: String, by_ref: bool, as_argument: bool) -> String {
    if as_argument && by_ref {
        format!("const {} &", target)
    } else {
        target
    }
}

// Splits "K]V" at the bracket closing the map key, which may itself
// contain bracketed forms.
fn split_key_value(rest: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' if depth == 0 => return Some((&rest[..i], &rest[i + 1..])),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> TypeMap {
        TypeMap::default()
    }

    #[test]
    fn base_types_consult_the_table() {
        let m = map();
        assert_eq!(cpp_type("int32", &m).unwrap(), "int32_t");
        assert_eq!(cpp_type("string", &m).unwrap(), "std::string");
    }

    #[test]
    fn identity_fallthrough_is_idempotent() {
        let m = map();
        assert_eq!(cpp_type("uint32_t", &m).unwrap(), "uint32_t");
        assert_eq!(
            cpp_type(&cpp_type("uint32_t", &m).unwrap(), &m).unwrap(),
            "uint32_t"
        );
    }

    #[test]
    fn fixed_array_as_argument_and_as_field() {
        let m = map();
        // Field context: no reference qualification on the element.
        assert_eq!(
            cpp_type("[3]string", &m).unwrap(),
            "std::array<std::string, 3>"
        );
        // Argument context: the container is by-reference.
        assert_eq!(
            arg_type("[3]string", &m).unwrap(),
            "const std::array<std::string, 3> &"
        );
    }

    #[test]
    fn slice_roundtrip_value_vs_argument() {
        let m = map();
        assert_eq!(cpp_type("[]int64", &m).unwrap(), "std::vector<int64_t>");
        assert_eq!(
            arg_type("[]int64", &m).unwrap(),
            "const std::vector<int64_t> &"
        );
    }

    #[test]
    fn nested_composites_recurse() {
        let m = map();
        assert_eq!(
            cpp_type("[]map[string]int", &m).unwrap(),
            "std::vector<std::map<std::string, int>>"
        );
        assert_eq!(
            cpp_type("[2][3]uint8", &m).unwrap(),
            "std::array<std::array<uint8_t, 3>, 2>"
        );
    }

    #[test]
    fn empty_payload_map_is_a_set() {
        let m = map();
        assert_eq!(
            cpp_type("map[string]struct{}", &m).unwrap(),
            "std::set<std::string>"
        );
        assert_eq!(
            cpp_type("map[int32]bool", &m).unwrap(),
            "std::map<int32_t, bool>"
        );
    }

    #[test]
    fn bracketed_map_keys_split_correctly() {
        let m = map();
        assert_eq!(
            cpp_type("map[[4]byte]string", &m).unwrap(),
            "std::map<std::array<std::byte, 4>, std::string>"
        );
    }

    #[test]
    fn result_position_rewrites_trailing_pointers() {
        let mut m = map();
        m.insert(crate::typemap::TypeMapping::new("Blob", "Blob *", false));
        assert_eq!(result_type("Blob", &m).unwrap(), "std::vector<Blob>");
        assert_eq!(result_type("int32", &m).unwrap(), "int32_t");
    }

    #[test]
    fn unbalanced_bracket_fails_fast() {
        let m = map();
        assert!(matches!(
            cpp_type("[3string", &m),
            Err(TranslateError::Malformed(_))
        ));
        assert!(matches!(
            cpp_type("map[string int", &m),
            Err(TranslateError::Malformed(_))
        ));
        assert!(matches!(elem_type("[3int"), Err(TranslateError::Malformed(_))));
    }

    #[test]
    fn descriptor_decomposition_helpers() {
        assert_eq!(elem_type("[16]Frame").unwrap(), "Frame");
        assert_eq!(elem_type("Frame").unwrap(), "Frame");
        assert_eq!(dims("[16]Frame").unwrap(), "[16]");
        assert_eq!(dims("Frame").unwrap(), "");
        assert!(is_slice("[]Frame"));
        assert!(!is_slice("[16]Frame"));
    }
}
