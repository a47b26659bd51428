use crate::error::Error;
use model::schema::{ConnectionSpec, Host, TlsMode};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tokio_postgres::{Client, NoTls};
use tracing::{error, warn};

/// A session's transaction state (§3 `Session`). `Aborted` may only be
/// rolled back; it must never be reused for further statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    None,
    Open,
    Aborted,
}

/// A live connection handle plus its current transaction state (§3, §4.2).
pub struct PgSession {
    client: Client,
    tx_state: TxState,
}

impl PgSession {
    /// Resolves TCP vs. local-socket from the connection spec's host form
    /// and opens the connection, honoring `tls_mode` with the same
    /// prefer-then-fall-back behavior used for every TLS-capable target.
    pub async fn open(spec: &ConnectionSpec) -> Result<Self, Error> {
        let mut config = tokio_postgres::Config::new();
        config.user(&spec.user).dbname(&spec.dbname);
        if let Some(password) = &spec.password {
            config.password(password);
        }
        match &spec.host {
            Host::Tcp { host, port } => {
                config.host(host).port(*port);
            }
            Host::LocalSocket { dir } => {
                // tokio-postgres treats a `host` value starting with `/` as
                // a unix socket directory rather than a network name.
                config.host(dir);
            }
        }

        let client = match spec.tls_mode {
            TlsMode::Off => connect_without_tls(config).await?,
            TlsMode::Require => connect_with_tls(config).await?,
            TlsMode::Prefer => match connect_with_tls(config.clone()).await {
                Ok(client) => client,
                Err(error) => {
                    warn!(%error, "postgres TLS handshake failed, retrying without TLS");
                    connect_without_tls(config).await?
                }
            },
        };

        Ok(Self {
            client,
            tx_state: TxState::None,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Stream of asynchronous `NOTIFY` payloads delivered to this session's
    /// backend connection (§4.7.1 sequence-reset notification count).
    pub fn notifications(&self) -> tokio_postgres::Notifications<'_> {
        self.client.notifications()
    }

    /// `SET [LOCAL] name TO 'value'` for each configured setting (§4.2).
    pub async fn apply_settings(
        &self,
        settings: &[(String, String)],
        local: bool,
    ) -> Result<(), Error> {
        for (name, value) in settings {
            let scope = if local { "LOCAL" } else { "" };
            let escaped = value.replace('\'', "''");
            let sql = format!("SET {scope} {name} TO '{escaped}'");
            self.client.batch_execute(&sql).await?;
        }
        Ok(())
    }

    pub async fn begin(&mut self) -> Result<(), Error> {
        if self.tx_state == TxState::Open {
            return Err(Error::NestedTxn);
        }
        self.client.batch_execute("BEGIN").await?;
        self.tx_state = TxState::Open;
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<(), Error> {
        self.client.batch_execute("COMMIT").await?;
        self.tx_state = TxState::None;
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), Error> {
        let result = self.client.batch_execute("ROLLBACK").await;
        self.tx_state = TxState::None;
        result.map_err(Error::from)
    }

    /// `exec_timed`: runs `sql`, recording wall-clock into `stats` under
    /// `label` regardless of outcome; a `Database` error still counts as an
    /// error for the label but the timing is preserved (§4.1, §4.2).
    pub async fn exec_timed(
        &self,
        label: &str,
        sql: &str,
        stats: &dyn model::progress::ProgressSink,
    ) -> Result<(), Error> {
        let start = Instant::now();
        let result = self.client.batch_execute(sql).await;
        let elapsed = start.elapsed();
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                let mapped = Error::from(err);
                error!(label, error = %mapped, elapsed_secs = elapsed.as_secs_f64(), "exec_timed failed");
                stats.inc_errs(1);
                Err(mapped)
            }
        }
    }
}

/// Scoped acquisition with release on every exit path (§4.2 `with_session`).
/// `f` receives the open session and its result is forwarded; the session
/// is always dropped (and its backing connection closed) when this returns.
pub async fn with_session<T, F>(spec: &ConnectionSpec, f: F) -> Result<T, Error>
where
    F: for<'a> FnOnce(&'a mut PgSession) -> Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>,
{
    let mut session = PgSession::open(spec).await?;
    f(&mut session).await
}

/// `BEGIN` before `f`, `COMMIT` on success, `ROLLBACK` on any failure or
/// cancellation. Nesting is rejected by `PgSession::begin`.
pub async fn with_transaction<T, F>(session: &mut PgSession, f: F) -> Result<T, Error>
where
    F: for<'a> FnOnce(&'a mut PgSession) -> Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>,
{
    session.begin().await?;
    match f(session).await {
        Ok(value) => match session.commit().await {
            Ok(()) => Ok(value),
            Err(err) => {
                let _ = session.rollback().await;
                Err(err)
            }
        },
        Err(err) => {
            let _ = session.rollback().await;
            Err(err)
        }
    }
}

async fn connect_with_tls(config: tokio_postgres::Config) -> Result<Client, Error> {
    let connector = TlsConnector::builder()
        .build()
        .map_err(|e| Error::Connect(e.to_string()))?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_without_tls(config: tokio_postgres::Config) -> Result<Client, Error> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "postgres connection error");
        }
    });
    Ok(client)
}
