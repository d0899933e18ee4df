//! Namespace wildcard matching
//!
//! NVDL `namespace` rules carry a namespace URI pattern with at most one
//! wildcard character (`wildCard` attribute, `*` by default). This module
//! implements the recursive character-by-character comparison used both to
//! match an element or attribute namespace against a rule and to detect
//! colliding rules at compile time.

/// Match two namespace patterns, each with at most one wildcard character.
///
/// A wildcard character absorbs zero or more characters of the opposing
/// pattern, so `urn:*` with wildcard `*` matches `urn:foo`. Comparing two
/// patterns that both carry wildcards answers whether any concrete
/// namespace could satisfy both, which is how rule collisions are found.
pub fn ns_matches(n1: &str, w1: Option<char>, n2: &str, w2: Option<char>) -> bool {
    // quick check
    if n1 == n2 {
        return true;
    }
    let a: Vec<char> = n1.chars().collect();
    let b: Vec<char> = n2.chars().collect();
    matches_at(&a, 0, w1, &b, 0, w2)
}

fn matches_at(a: &[char], i: usize, wa: Option<char>, b: &[char], j: usize, wb: Option<char>) -> bool {
    if i >= a.len() && j >= b.len() {
        return true;
    }
    // An exhausted side matches iff the other side's remaining content is
    // exactly its own wildcard character.
    if i >= a.len() {
        return b.len() - j == 1 && Some(b[j]) == wb;
    }
    if j >= b.len() {
        return a.len() - i == 1 && Some(a[i]) == wa;
    }

    let (ca, cb) = (a[i], b[j]);
    if ca == cb && Some(ca) != wa && Some(cb) != wb {
        return matches_at(a, i + 1, wa, b, j + 1, wb);
    }
    // A wildcard stays in place and consumes the opposing side one
    // character per step, trying each alignment.
    if Some(ca) == wa && matches_at(a, i, wa, b, j + 1, wb) {
        return true;
    }
    if Some(cb) == wb && matches_at(a, i + 1, wa, b, j, wb) {
        return true;
    }
    false
}
