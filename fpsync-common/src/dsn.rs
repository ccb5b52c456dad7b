//! Datastore DSN parsing
//!
//! Accepted forms:
//! - `mysql://` and `mariadb://` URLs (sqlx URL syntax, including `ssl-mode`)
//! - `sqlite:` URLs
//! - Go MySQL driver DSNs: `[user[:password]@][net[(addr)]]/dbname[?param=value&...]`
//!
//! Go DSNs are parsed straight into [`MySqlConnectOptions`], so the password
//! is never re-encoded and TLS or charset settings carry over. Parameters
//! without an equivalent are rejected rather than dropped.

use std::fmt;
use std::str::FromStr;

use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use sqlx::sqlite::SqliteConnectOptions;
use tracing::warn;

use crate::{Error, Result};

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_TCP_HOST: &str = "127.0.0.1";
const DEFAULT_UNIX_SOCKET: &str = "/tmp/mysql.sock";

/// Parsed connection target
#[derive(Clone)]
pub enum Datastore {
    MySql(MySqlConnectOptions),
    Sqlite {
        options: SqliteConnectOptions,
        /// `:memory:` databases live per connection
        in_memory: bool,
    },
}

impl Datastore {
    /// Backend name for logs
    pub fn backend(&self) -> &'static str {
        match self {
            Datastore::MySql(_) => "mysql",
            Datastore::Sqlite { .. } => "sqlite",
        }
    }
}

// MySqlConnectOptions' own Debug prints the password
impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datastore::MySql(options) => f
                .debug_struct("MySql")
                .field("host", &options.get_host())
                .field("port", &options.get_port())
                .field("socket", &options.get_socket())
                .field("username", &options.get_username())
                .field("database", &options.get_database())
                .field("ssl_mode", &options.get_ssl_mode())
                .field("charset", &options.get_charset())
                .finish_non_exhaustive(),
            Datastore::Sqlite { options, in_memory } => f
                .debug_struct("Sqlite")
                .field("filename", &options.get_filename())
                .field("in_memory", in_memory)
                .finish(),
        }
    }
}

/// Parse any accepted DSN form
pub fn parse_dsn(dsn: &str) -> Result<Datastore> {
    let dsn = dsn.trim();

    if dsn.starts_with("mysql://") || dsn.starts_with("mariadb://") {
        let options = MySqlConnectOptions::from_str(dsn).map_err(|e| {
            Error::Config(format!("Invalid MySQL URL {}: {}", redact_dsn(dsn), e))
        })?;
        return Ok(Datastore::MySql(options));
    }

    if dsn.starts_with("sqlite:") {
        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(|e| Error::Config(format!("Invalid SQLite URL {}: {}", dsn, e)))?;
        let in_memory = dsn.contains(":memory:") || dsn.contains("mode=memory");
        return Ok(Datastore::Sqlite { options, in_memory });
    }

    if dsn.contains("://") {
        return Err(Error::Config(format!(
            "Unsupported DSN scheme: {}",
            redact_dsn(dsn)
        )));
    }

    parse_go_dsn(dsn).map(Datastore::MySql)
}

/// Parse a Go MySQL driver DSN.
///
/// The last `/` separates the database name; `?` starts the parameters only
/// after that slash, so passwords may contain `?`, `@` and `:`.
///
/// # Examples
///
/// ```
/// use fpsync_common::dsn::parse_go_dsn;
///
/// let options = parse_go_dsn("app:pw@tcp(db.local:3307)/attendance?charset=utf8mb4").unwrap();
/// assert_eq!(options.get_host(), "db.local");
/// assert_eq!(options.get_port(), 3307);
/// assert_eq!(options.get_database(), Some("attendance"));
/// ```
pub fn parse_go_dsn(dsn: &str) -> Result<MySqlConnectOptions> {
    let slash = dsn.rfind('/').ok_or_else(|| {
        Error::Config("DSN is missing the '/' before the database name".to_string())
    })?;
    let (prefix, rest) = (&dsn[..slash], &dsn[slash + 1..]);

    let (dbname, params) = match rest.split_once('?') {
        Some((dbname, params)) => (dbname, Some(params)),
        None => (rest, None),
    };

    let mut options = MySqlConnectOptions::new();

    let net = match prefix.rfind('@') {
        Some(at) => {
            let credentials = &prefix[..at];
            options = match credentials.split_once(':') {
                Some((user, password)) => options.username(user).password(password),
                None => options.username(credentials),
            };
            &prefix[at + 1..]
        }
        None => prefix,
    };

    options = apply_net(options, net)?;

    if !dbname.is_empty() {
        options = options.database(dbname);
    }

    if let Some(params) = params {
        options = apply_params(options, params)?;
    }

    Ok(options)
}

fn apply_net(options: MySqlConnectOptions, net: &str) -> Result<MySqlConnectOptions> {
    let (kind, addr) = match net.strip_suffix(')').and_then(|s| s.split_once('(')) {
        Some((kind, addr)) => (kind, addr),
        None if !net.contains('(') => (net, ""),
        None => {
            return Err(Error::Config(format!(
                "Invalid DSN network address: {}",
                net
            )))
        }
    };

    match kind {
        "" | "tcp" | "tcp6" => {
            if addr.is_empty() {
                return Ok(options.host(DEFAULT_TCP_HOST).port(DEFAULT_MYSQL_PORT));
            }
            let (host, port) = split_host_port(addr)?;
            Ok(options.host(host).port(port))
        }
        "unix" => {
            let path = if addr.is_empty() { DEFAULT_UNIX_SOCKET } else { addr };
            Ok(options.socket(path))
        }
        other => Err(Error::Config(format!("Unsupported DSN network: {}", other))),
    }
}

/// `host`, `host:port` or `[v6]:port`
fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let (host, port) = match addr.strip_prefix('[') {
        Some(bracketed) => {
            let (host, after) = bracketed.split_once(']').ok_or_else(|| {
                Error::Config(format!("Invalid DSN address: {}", addr))
            })?;
            (host, after.strip_prefix(':'))
        }
        None => match addr.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (addr, None),
        },
    };

    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|e| Error::Config(format!("Invalid DSN port {:?}: {}", port, e)))?,
        None => DEFAULT_MYSQL_PORT,
    };

    Ok((host, port))
}

fn apply_params(mut options: MySqlConnectOptions, params: &str) -> Result<MySqlConnectOptions> {
    for pair in params.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("Invalid DSN parameter: {}", pair)))?;

        match key {
            "tls" => options = options.ssl_mode(go_tls_mode(value)?),
            // The driver accepts a fallback list; the first entry wins
            "charset" => {
                let charset = value.split(',').next().unwrap_or(value);
                options = options.charset(charset);
            }
            "collation" => options = options.collation(value),
            // Client-side time decoding only; no column read here is temporal
            "parseTime" | "loc" => {}
            "allowNativePasswords" if value == "true" => {}
            "timeout" | "readTimeout" | "writeTimeout" => {
                warn!(
                    param = key,
                    "DSN timeout parameter ignored; DB_ACQUIRE_TIMEOUT_SECS and REQUEST_TIMEOUT_SECS apply"
                );
            }
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported DSN parameter: {}",
                    pair
                )))
            }
        }
    }

    Ok(options)
}

/// Map the driver's `tls` values onto sqlx SSL modes
fn go_tls_mode(value: &str) -> Result<MySqlSslMode> {
    match value {
        "true" => Ok(MySqlSslMode::VerifyIdentity),
        "skip-verify" => Ok(MySqlSslMode::Required),
        "preferred" => Ok(MySqlSslMode::Preferred),
        "false" => Ok(MySqlSslMode::Disabled),
        other => Err(Error::Config(format!(
            "Unsupported tls value {:?}; named TLS configs are not available",
            other
        ))),
    }
}

/// Mask the password of a DSN for logging
///
/// # Examples
///
/// ```
/// use fpsync_common::dsn::redact_dsn;
///
/// assert_eq!(redact_dsn("mysql://app:pw@db:3306/att"), "mysql://app:****@db:3306/att");
/// assert_eq!(redact_dsn("app:pw@tcp(db:3306)/att"), "app:****@tcp(db:3306)/att");
/// assert_eq!(redact_dsn("sqlite:data.db"), "sqlite:data.db");
/// ```
pub fn redact_dsn(dsn: &str) -> String {
    let Some(scheme_end) = dsn.find("://") else {
        // Go form: credentials sit before the last '@' ahead of the last '/'
        let head_end = dsn.rfind('/').unwrap_or(dsn.len());
        return match dsn[..head_end].rfind('@') {
            Some(at) => match dsn[..at].split_once(':') {
                Some((user, _)) => format!("{}:****{}", user, &dsn[at..]),
                None => dsn.to_string(),
            },
            None => dsn.to_string(),
        };
    };

    let rest_start = scheme_end + 3;
    let rest = &dsn[rest_start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    match authority.rfind('@') {
        Some(at) => match authority[..at].split_once(':') {
            Some((user, _)) => format!(
                "{}{}:****{}",
                &dsn[..rest_start],
                user,
                &dsn[rest_start + at..]
            ),
            None => dsn.to_string(),
        },
        None => dsn.to_string(),
    }
}
