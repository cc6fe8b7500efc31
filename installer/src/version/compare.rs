//! Component-wise comparison of dotted numeric version strings.
//!
//! Both operands are split on `.`, the shorter one is padded with `0`
//! components, and components are compared left to right as integers.
//! A component that is not a non-negative integer compares as `0`; no error
//! is raised, so existing manifest files with odd version strings keep
//! working.

use std::cmp::Ordering;

/// Returns true when `a` sorts before or equal to `b`.
///
/// The first differing component decides the result.
///
/// # Examples
///
/// ```
/// use kfx_installer::version::is_lower_or_equal;
///
/// assert!(is_lower_or_equal("1.2", "1.2.0.0"));
/// assert!(!is_lower_or_equal("1.10.0", "1.9.0"));
/// ```
#[must_use]
pub fn is_lower_or_equal(a: &str, b: &str) -> bool {
    for (left, right) in aligned_components(a, b) {
        match left.cmp(&right) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    true
}

/// Returns true when `a` sorts after or equal to `b`.
///
/// # Examples
///
/// ```
/// use kfx_installer::version::is_higher_or_equal;
///
/// assert!(is_higher_or_equal("1.0.0", "1.0"));
/// assert!(is_higher_or_equal("2.0.0", "1.9.9"));
/// ```
#[must_use]
pub fn is_higher_or_equal(a: &str, b: &str) -> bool {
    for (left, right) in aligned_components(a, b) {
        match left.cmp(&right) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }
    true
}

/// Returns true when any component of `a` exceeds the aligned component of
/// `b`.
///
/// Unlike [`is_lower_or_equal`], the scan does not stop at an earlier lower
/// component: `is_newer("1.9.9", "2.0.0")` is true because `9 > 0` in the
/// second position. Existing update checks rely on this behaviour.
///
/// # Examples
///
/// ```
/// use kfx_installer::version::is_newer;
///
/// assert!(is_newer("1.2.1", "1.2.0"));
/// assert!(!is_newer("1.2.0", "1.2.0"));
/// ```
#[must_use]
pub fn is_newer(a: &str, b: &str) -> bool {
    aligned_components(a, b).any(|(left, right)| left > right)
}

/// Parse one version component, degrading to `0` on anything non-numeric.
fn component(raw: &str) -> u64 {
    raw.parse().unwrap_or(0)
}

/// Pair up the components of both versions, padding the shorter with zeros.
fn aligned_components<'a>(a: &'a str, b: &'a str) -> impl Iterator<Item = (u64, u64)> + 'a {
    let left: Vec<u64> = a.split('.').map(component).collect();
    let right: Vec<u64> = b.split('.').map(component).collect();
    let len = left.len().max(right.len());
    (0..len).map(move |i| {
        (
            left.get(i).copied().unwrap_or(0),
            right.get(i).copied().unwrap_or(0),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::equal("1.2.3", "1.2.3", true)]
    #[case::lower_patch("1.2.3", "1.2.4", true)]
    #[case::higher_patch("1.2.4", "1.2.3", false)]
    #[case::padded("1.2", "1.2.0.0", true)]
    #[case::padded_reverse("1.2.0.0", "1.2", true)]
    #[case::numeric_not_lexicographic("1.10.0", "1.9.0", false)]
    #[case::earlier_component_wins("1.0.9", "1.1.0", true)]
    #[case::build_component("1.2.3.4000", "1.2.3.3999", false)]
    fn lower_or_equal_cases(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(is_lower_or_equal(a, b), expected, "{a} <= {b}");
    }

    #[rstest]
    #[case::equal("1.2.3", "1.2.3", true)]
    #[case::higher("2.0.0", "1.9.9", true)]
    #[case::lower("1.9.9", "2.0.0", false)]
    #[case::padded("1.0", "1.0.0.0", true)]
    fn higher_or_equal_cases(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(is_higher_or_equal(a, b), expected, "{a} >= {b}");
    }

    #[test]
    fn non_numeric_components_compare_as_zero() {
        assert!(is_lower_or_equal("1.x.0", "1.0.0"));
        assert!(is_lower_or_equal("1.0.0", "1.x.0"));
        assert!(is_lower_or_equal("", "0.0.0"));
        assert!(!is_newer("abc", "0"));
    }

    #[test]
    fn is_newer_detects_higher_component() {
        assert!(is_newer("1.2.1", "1.2.0"));
        assert!(is_newer("2.0.0", "1.9.9"));
        assert!(!is_newer("1.2.0", "1.2.0"));
        assert!(!is_newer("1.2", "1.2.0.0"));
    }

    #[test]
    fn is_newer_does_not_stop_on_earlier_lower_component() {
        // The major component is lower, but a later component is higher.
        assert!(is_newer("1.9.9", "2.0.0"));
        assert!(!is_lower_or_equal("2.0.0", "1.9.9"));
    }

    #[rstest]
    #[case("1.2.3", "1.2.4")]
    #[case("1.2.3", "1.2.3")]
    #[case("0.4.0", "0.3.9")]
    #[case("3.0.0", "3.0.1")]
    fn lower_or_equal_agrees_with_newer_on_monotonic_inputs(#[case] a: &str, #[case] b: &str) {
        // Holds whenever components never move in opposite directions.
        assert_eq!(is_lower_or_equal(a, b), !is_newer(a, b));
    }
}
