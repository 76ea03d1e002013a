//! Metric namespace templating.

/// Token replaced by the local host name.
pub const HOSTNAME_PLACEHOLDER: &str = "(HOSTNAME)";

/// Replaces every `(HOSTNAME)` in `template` with `hostname`.
///
/// Dots in the host name are kept as-is, so `web1.example.com` produces a
/// deeper metric path.
pub fn resolve_namespace(template: &str, hostname: &str) -> String {
    template.replace(HOSTNAME_PLACEHOLDER, hostname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_replaced() {
        assert_eq!(resolve_namespace("haproxy.(HOSTNAME)", "lb01"), "haproxy.lb01");
    }

    #[test]
    fn test_no_placeholder() {
        assert_eq!(resolve_namespace("haproxy", "lb01"), "haproxy");
    }

    #[test]
    fn test_multiple_placeholders() {
        assert_eq!(
            resolve_namespace("(HOSTNAME).haproxy.(HOSTNAME)", "h"),
            "h.haproxy.h"
        );
    }
}
