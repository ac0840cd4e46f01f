//! Structural similarity between two versions of replacement code.

use std::collections::HashSet;

/// Jaccard similarity of the token sets that lead each snippet.
///
/// Spaces are removed first, then each snippet is cut at its first `(`,
/// `=` and `)` in turn, and what remains is split on the remaining
/// whitespace (newlines and tabs). Identical normalised text scores 1.0, as
/// do two empty token sets; one empty set against a non-empty one scores 0.0.
pub fn code_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a == norm_b {
        return 1.0;
    }

    let tokens_a = leading_tokens(&norm_a);
    let tokens_b = leading_tokens(&norm_b);
    match (tokens_a.is_empty(), tokens_b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

fn normalize(code: &str) -> String {
    code.trim().replace(' ', "")
}

fn leading_tokens(normalized: &str) -> HashSet<&str> {
    let head = ['(', '=', ')']
        .iter()
        .fold(normalized, |text, delim| text.split(*delim).next().unwrap_or_default());
    head.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("step_{}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_identical_after_space_removal() {
        assert_eq!(code_similarity("return a + b", "  return a+b  "), 1.0);
    }

    #[test]
    fn test_token_overlap() {
        assert_eq!(code_similarity(&lines(20), &lines(19)), 0.95);
        assert_eq!(code_similarity("a\nb", "a\nc"), 1.0 / 3.0);
    }

    #[test]
    fn test_cut_at_first_delimiter() {
        // Only the text before `(` is compared, so both reduce to `print`.
        assert_eq!(code_similarity("print(a)", "print(b)"), 1.0);
        // `x=1` and `y=1` reduce to `x` and `y`.
        assert_eq!(code_similarity("x = 1", "y = 1"), 0.0);
    }

    #[test]
    fn test_empty_token_sets() {
        assert_eq!(code_similarity("(a)", "(b)"), 1.0);
        assert_eq!(code_similarity("(a)", "value"), 0.0);
    }
}
