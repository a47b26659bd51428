//! Target DSN parsing (§6 Target DSN): turns the configuration document's
//! `target.dsn` string into a `ConnectionSpec`. Connection-string parsing is
//! named as an external, out-of-scope collaborator in the core design; this
//! is the minimal glue the CLI needs to actually open a session.

use model::schema::{ConnectionSpec, Host, TlsMode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DsnError {
    #[error("invalid DSN: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("DSN is missing a database name")]
    MissingDatabase,
}

/// Parses `postgresql://user:pw@host:port/dbname?sslmode=prefer`. A host of
/// the form `unix:/path/to/socket/dir` selects a local socket instead of
/// TCP, per §6; `sslmode` maps `disable` → off, `require`/`verify-full` →
/// require, anything else (including absent) → prefer.
pub fn parse_postgres_dsn(dsn: &str) -> Result<ConnectionSpec, DsnError> {
    let url = Url::parse(dsn)?;

    let dbname = url
        .path()
        .trim_start_matches('/')
        .to_string();
    if dbname.is_empty() {
        return Err(DsnError::MissingDatabase);
    }

    let user = url.username().to_string();
    let password = url.password().map(|p| p.to_string());

    let host = match url.host_str() {
        Some(h) if h.starts_with("unix:") => Host::LocalSocket {
            dir: h.trim_start_matches("unix:").to_string(),
        },
        Some(h) => Host::Tcp {
            host: h.to_string(),
            port: url.port().unwrap_or(5432),
        },
        None => Host::Tcp {
            host: "localhost".to_string(),
            port: url.port().unwrap_or(5432),
        },
    };

    let tls_mode = url
        .query_pairs()
        .find(|(key, _)| key == "sslmode")
        .map(|(_, value)| match value.as_ref() {
            "disable" => TlsMode::Off,
            "require" | "verify-ca" | "verify-full" => TlsMode::Require,
            _ => TlsMode::Prefer,
        })
        .unwrap_or(TlsMode::Prefer);

    Ok(ConnectionSpec {
        host,
        user,
        password,
        dbname,
        tls_mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_dsn_with_sslmode() {
        let spec = parse_postgres_dsn("postgresql://user:pw@host:5432/dbname?sslmode=prefer")
            .expect("valid dsn");
        assert_eq!(spec.user, "user");
        assert_eq!(spec.password.as_deref(), Some("pw"));
        assert_eq!(spec.dbname, "dbname");
        assert_eq!(spec.tls_mode, TlsMode::Prefer);
        assert!(matches!(spec.host, Host::Tcp { ref host, port: 5432 } if host == "host"));
    }

    #[test]
    fn sslmode_disable_maps_to_tls_off() {
        let spec = parse_postgres_dsn("postgresql://user@host/db?sslmode=disable").unwrap();
        assert_eq!(spec.tls_mode, TlsMode::Off);
    }

    #[test]
    fn missing_database_is_rejected() {
        assert!(matches!(
            parse_postgres_dsn("postgresql://user@host/"),
            Err(DsnError::MissingDatabase)
        ));
    }
}
