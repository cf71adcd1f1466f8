pub mod accounts;
pub mod applications;
pub mod projects;

/// Empty and whitespace-only values count as absent.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
