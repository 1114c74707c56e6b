pub const NAMESPACE_SEPARATOR: char = ':';
pub const DEFAULT_NAMESPACE: &str = "default";

/// Namespace of a key: everything before the first `:`, or `"default"`.
pub fn namespace_of(key: &str) -> &str {
    match key.split_once(NAMESPACE_SEPARATOR) {
        Some((prefix, _)) => prefix,
        None => DEFAULT_NAMESPACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_before_first_separator() {
        assert_eq!(namespace_of("orders:order_00001"), "orders");
        assert_eq!(namespace_of("game:leaderboard:weekly"), "game");
    }

    #[test]
    fn test_no_separator_is_default() {
        assert_eq!(namespace_of("standalone"), "default");
        assert_eq!(namespace_of(""), "default");
    }

    #[test]
    fn test_leading_separator_gives_empty_namespace() {
        assert_eq!(namespace_of(":orphan"), "");
    }
}
