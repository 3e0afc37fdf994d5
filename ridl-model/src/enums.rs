//! Enum derivation
//!
//! A C-style enumeration is emulated in the declaration source by the
//! idiom "named integer alias plus constants of that alias". This pass
//! detects the idiom after the model has been built: it groups constants
//! under their integer typedefs, flags both sides, and computes whether
//! each group's values form a dense run starting at zero.
//!
//! The grouping itself is a pure function over the declaration list; the
//! only mutation the pass performs is the one-time `is_enum` /
//! `is_enumerator` flag writes.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::decl::{ConstDecl, Decl, TypedefDecl};
use crate::package::Package;

/// Integer primitives whose typedefs are eligible to anchor an enum.
const INTEGER_PRIMITIVES: [&str; 10] = [
    "int", "uint", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
];

/// A derived enumeration: the anchoring typedef, its member constants in
/// declaration order, and whether the member values form a contiguous
/// run starting at zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub typedef: TypedefDecl,
    pub members: Vec<ConstDecl>,
    pub dense: bool,
}

/// Groups enumerator constants under their typedefs without mutating the
/// package. The result maps the typedef's declaration index to the
/// declaration indices of its member constants; iteration order is
/// typedef declaration order.
pub fn group_constants(pkg: &Package) -> BTreeMap<usize, Vec<usize>> {
    let mut typedefs: HashMap<&str, usize> = HashMap::new();
    for (i, decl) in pkg.decls.iter().enumerate() {
        if let Decl::Typedef(t) = decl {
            if INTEGER_PRIMITIVES.contains(&t.alias.as_str()) {
                typedefs.insert(t.name.as_str(), i);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, decl) in pkg.decls.iter().enumerate() {
        if let Decl::Const(c) = decl {
            if let Some(&tidx) = typedefs.get(c.typ.as_str()) {
                groups.entry(tidx).or_default().push(i);
            }
        }
    }
    groups
}

/// Runs the enum-derivation pass over a freshly built model.
///
/// Runs exactly once, between model construction and context assembly.
/// Constants left unflagged are the package's plain constants.
pub fn derive_enums(pkg: &mut Package) -> Vec<Enum> {
    let groups = group_constants(pkg);
    let mut enums = Vec::with_capacity(groups.len());

    for (tidx, member_idxs) in groups {
        if let Decl::Typedef(t) = &mut pkg.decls[tidx] {
            t.is_enum = true;
        }
        for &idx in &member_idxs {
            if let Decl::Const(c) = &mut pkg.decls[idx] {
                c.is_enumerator = true;
            }
        }

        let typedef = match &pkg.decls[tidx] {
            Decl::Typedef(t) => t.clone(),
            _ => continue,
        };
        let members: Vec<ConstDecl> = member_idxs
            .iter()
            .filter_map(|&idx| match &pkg.decls[idx] {
                Decl::Const(c) => Some(c.clone()),
                _ => None,
            })
            .collect();

        let mut values: Vec<i64> = members
            .iter()
            .map(|c| c.exact.parse::<i64>().unwrap_or(0))
            .collect();
        values.sort_unstable();
        let dense = is_dense(&values);

        debug!(
            typedef = %typedef.name,
            members = members.len(),
            dense,
            "derived enum"
        );
        enums.push(Enum {
            typedef,
            members,
            dense,
        });
    }
    enums
}

/// True iff the sorted values form a contiguous run starting at 0.
/// Empty and single-element groups are always dense.
fn is_dense(sorted: &[i64]) -> bool {
    if sorted.len() < 2 {
        return true;
    }
    if sorted[0] != 0 {
        return false;
    }
    sorted.windows(2).all(|w| w[1] - w[0] == 1)
}
