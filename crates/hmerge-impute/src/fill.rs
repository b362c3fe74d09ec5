//! Categorical gap filling within one chunk.

use std::collections::BTreeMap;

use hmerge_core::types::Scalar;

/// Most frequent non-missing value; ties go to the smallest value.
pub fn mode_of(values: &[Scalar]) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in values {
        if let Some(key) = category_key(v) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (value, n) in counts {
        match &best {
            Some((_, m)) if *m >= n => {}
            _ => best = Some((value, n)),
        }
    }
    best.map(|(v, _)| v)
}

/// Replace every missing cell with the chunk mode, or `literal` when the chunk
/// has no values at all. Returns `(filled, used_literal)`.
pub fn fill_mode(values: &mut [Scalar], literal: &str) -> (usize, bool) {
    let (fill, used_literal) = match mode_of(values) {
        Some(m) => (m, false),
        None => (literal.to_string(), true),
    };
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_null()) {
        *v = Scalar::Str(fill.clone());
        filled += 1;
    }
    (filled, used_literal && filled > 0)
}

/// Carry the last seen value forward, then the first seen value backward over
/// the leading gap. All-missing falls back to `literal`.
pub fn fill_forward(values: &mut [Scalar], literal: &str) -> (usize, bool) {
    let first = match values.iter().position(|v| !v.is_null()) {
        Some(i) => i,
        None => {
            let n = values.len();
            for v in values.iter_mut() {
                *v = Scalar::Str(literal.to_string());
            }
            return (n, n > 0);
        }
    };

    let mut filled = 0;
    let mut last = values[first].clone();
    for v in values[first..].iter_mut() {
        if v.is_null() {
            *v = last.clone();
            filled += 1;
        } else {
            last = v.clone();
        }
    }
    let head = values[first].clone();
    for v in values[..first].iter_mut() {
        *v = head.clone();
        filled += 1;
    }
    (filled, false)
}

fn category_key(v: &Scalar) -> Option<String> {
    match v {
        Scalar::Null => None,
        Scalar::Str(s) => Some(s.clone()),
        Scalar::I64(i) => Some(i.to_string()),
        Scalar::F64(f) => Some(f.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(v: &[Option<&str>]) -> Vec<Scalar> {
        v.iter()
            .map(|x| x.map(|s| Scalar::Str(s.into())).unwrap_or(Scalar::Null))
            .collect()
    }

    #[test]
    fn majority_fills_every_gap() {
        let mut v = cats(&[Some("X"), None, Some("Y"), Some("X"), None]);
        let (n, literal) = fill_mode(&mut v, "Unknown");
        assert_eq!((n, literal), (2, false));
        assert_eq!(v, cats(&[Some("X"), Some("X"), Some("Y"), Some("X"), Some("X")]));
    }

    #[test]
    fn mode_ties_pick_smallest() {
        assert_eq!(mode_of(&cats(&[Some("b"), Some("a"), Some("b"), Some("a")])).as_deref(), Some("a"));
    }

    #[test]
    fn empty_column_gets_literal() {
        let mut v = cats(&[None, None]);
        assert_eq!(fill_mode(&mut v, "Unknown"), (2, true));
        assert_eq!(v, cats(&[Some("Unknown"), Some("Unknown")]));
    }

    #[test]
    fn forward_then_backward() {
        let mut v = cats(&[None, Some("a"), None, Some("b"), None]);
        assert_eq!(fill_forward(&mut v, "Unknown"), (3, false));
        assert_eq!(v, cats(&[Some("a"), Some("a"), Some("a"), Some("b"), Some("b")]));
    }
}
