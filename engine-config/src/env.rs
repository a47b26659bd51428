//! Environment-variable fallback resolution (§6 "Environment variables
//! consumed"). Grounded on the teacher's `env_parser` helper, which resolves
//! a raw environment string against an expected type; this module narrows
//! that idea to the fixed handful of variables the external interfaces name.

const DEFAULT_MYSQL_HOST: &str = "localhost";
const DEFAULT_MYSQL_PORT: u16 = 3306;

/// `USER`, used to fill in a source/target URI's username when omitted.
pub fn current_user() -> Option<String> {
    std::env::var("USER").ok()
}

/// `MYSQL_PWD`, used to fill in a MySQL source URI's password when omitted.
pub fn mysql_password() -> Option<String> {
    std::env::var("MYSQL_PWD").ok()
}

/// `MYSQL_HOST`, defaulting to `localhost` when unset.
pub fn mysql_host() -> String {
    std::env::var("MYSQL_HOST").unwrap_or_else(|_| DEFAULT_MYSQL_HOST.to_string())
}

/// `MYSQL_TCP_PORT`, defaulting to `3306` when unset or unparsable.
pub fn mysql_port() -> u16 {
    std::env::var("MYSQL_TCP_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MYSQL_PORT)
}

/// An arbitrary environment variable may itself hold a complete URI rather
/// than one of its pieces (§6: "An arbitrary variable name may also be the
/// *container* of a full URI"). `source`/`target` config values of the form
/// `env:NAME` are resolved through this indirection before URI parsing.
pub fn resolve_container(value: &str) -> Option<String> {
    value.strip_prefix("env:").and_then(|name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_host_defaults_when_unset() {
        std::env::remove_var("MYSQL_HOST");
        assert_eq!(mysql_host(), "localhost");
    }

    #[test]
    fn mysql_port_defaults_when_unset() {
        std::env::remove_var("MYSQL_TCP_PORT");
        assert_eq!(mysql_port(), 3306);
    }

    #[test]
    fn non_container_value_resolves_to_none() {
        assert_eq!(resolve_container("mysql://localhost/db"), None);
    }

    #[test]
    fn container_prefix_reads_named_variable() {
        std::env::set_var("STRATUM_TEST_SOURCE_URI", "mysql://localhost/shop#orders");
        assert_eq!(
            resolve_container("env:STRATUM_TEST_SOURCE_URI"),
            Some("mysql://localhost/shop#orders".to_string())
        );
        std::env::remove_var("STRATUM_TEST_SOURCE_URI");
    }
}
