//! Classification of requested version strings.

/// Whether a requested version selects from a set of candidates rather than
/// naming one version: `latest.release`, `1.+`, `[1.0,2.0)`, `]1.0,2.0[`,
/// `(,2.0]`.
pub fn is_dynamic(version: &str) -> bool {
    let v = version.trim();
    v.starts_with("latest.")
        || v.starts_with('[')
        || v.starts_with(']')
        || v.starts_with('(')
        || v.ends_with('+')
}

/// A version usable as a managed version: non-empty and not dynamic.
pub fn is_concrete(version: &str) -> bool {
    !version.trim().is_empty() && !is_dynamic(version)
}
