//! Compound-name splitting.
//!
//! Metabolon reports co-eluting compounds it cannot tell apart in a single
//! row, joined by a slash: `glucose/fructose`. Lipid shorthand also uses
//! slashes, but inside parentheses: `PC(16:0/18:1)`. A name is split only
//! when it has exactly one slash outside every parenthesised group.
//!
//! | Name                        | Result                                   |
//! |-----------------------------|------------------------------------------|
//! | `glucose`                   | no split                                 |
//! | `glucose/fructose`          | `glucose` + `fructose`                   |
//! | `lipid(1:2/2:1)`            | no split                                 |
//! | `lipid(1:2/2:1)/compound`   | `lipid(1:2/2:1)` + `compound`            |
//! | `A/B(1:2/2:1)`              | `A` + `B(1:2/2:1)`                       |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CompoundNameSplit;

const DIVIDER: char = '/';

/// A parenthesised group holding nothing but slashes, in the bracket skeleton.
static INNER_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(/*\)").expect("valid inner group pattern"));

/// Decide whether `name` encodes two co-reported compounds.
pub fn split_compound_name(name: &str) -> CompoundNameSplit {
    if !name.contains(DIVIDER) {
        return CompoundNameSplit::NoSplit;
    }

    if !name.contains('(') {
        return match name.split_once(DIVIDER) {
            Some((first, second)) => make_split(first, second),
            None => CompoundNameSplit::NoSplit,
        };
    }

    if reduce_skeleton(name) != DIVIDER.to_string() {
        return CompoundNameSplit::NoSplit;
    }

    match divider_position(name) {
        Some(pos) => make_split(&name[..pos], &name[pos + DIVIDER.len_utf8()..]),
        None => CompoundNameSplit::NoSplit,
    }
}

/// The `/`, `(` and `)` characters of `name`, in order, with every
/// parenthesised group that contains only slashes removed until none is left.
///
/// A name with one divider reduces to `"/"`; pure lipid notation reduces to
/// an empty string; unbalanced brackets leave brackets behind.
pub fn reduce_skeleton(name: &str) -> String {
    let mut skeleton: String = name
        .chars()
        .filter(|c| matches!(c, '/' | '(' | ')'))
        .collect();

    loop {
        let reduced = INNER_GROUP.replace_all(&skeleton, "").into_owned();
        if reduced == skeleton {
            return skeleton;
        }
        skeleton = reduced;
    }
}

/// Byte offset of the first slash outside all parentheses.
fn divider_position(name: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, c) in name.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            DIVIDER if depth == 0 => return Some(pos),
            _ => {}
        }
    }
    None
}

fn make_split(first: &str, second: &str) -> CompoundNameSplit {
    let (first, second) = (first.trim(), second.trim());
    if first.is_empty() || second.is_empty() {
        return CompoundNameSplit::NoSplit;
    }
    CompoundNameSplit::Split(first.to_string(), second.to_string())
}
