//! Opaque prefixed identifiers (`ban_…`, `plc_…`, `imp_…`).

use uuid::Uuid;

/// Generate a new id with the given entity prefix.
pub fn generate(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_uniqueness() {
        let a = generate("ban");
        let b = generate("ban");
        assert!(a.starts_with("ban_"));
        assert_ne!(a, b);
    }
}
