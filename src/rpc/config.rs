//! Node config file reader
//!
//! Reads the `key=value` file the node itself is started with, so the audit
//! connects with the same credentials. Network sections (`[main]`, `[test]`,
//! `[regtest]`) override global keys for the selected network.

use crate::params::NetworkParams;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default RPC timeout in seconds
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 600;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const COOKIE_FILE: &str = ".cookie";

/// Config file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("no rpcuser/rpcpassword in config and no cookie file at {0}")]
    MissingCredentials(PathBuf),
    #[error("malformed cookie file {0}")]
    MalformedCookie(PathBuf),
}

/// Connection settings for the node's JSON-RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

impl NodeConfig {
    /// Load settings from a node config file for the given network
    pub fn load(path: &Path, params: &NetworkParams) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let values = parse_config(&text, params.network_type.config_section());

        let default_datadir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_values(&values, params, &default_datadir)
    }

    fn from_values(
        values: &HashMap<String, String>,
        params: &NetworkParams,
        default_datadir: &Path,
    ) -> Result<Self, ConfigError> {
        let host = values
            .get("rpcconnect")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RPC_HOST.to_string());

        let port = match values.get("rpcport") {
            Some(v) => parse_value::<u16>("rpcport", v)?,
            None => params.rpc_port,
        };

        let timeout_secs = match values.get("rpctimeout") {
            Some(v) => parse_value::<u64>("rpctimeout", v)?,
            None => DEFAULT_RPC_TIMEOUT_SECS,
        };

        let (user, password) = match (values.get("rpcuser"), values.get("rpcpassword")) {
            (Some(user), Some(password)) => (user.clone(), password.clone()),
            _ => {
                let datadir = values
                    .get("datadir")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| default_datadir.to_path_buf());
                read_cookie(&datadir.join(params.data_subdir).join(COOKIE_FILE))?
            }
        };

        Ok(Self {
            host,
            port,
            user,
            password,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Flattens a config file into the keys visible to one network section.
/// The first occurrence of a key wins, section keys beat global keys.
fn parse_config(text: &str, section: &str) -> HashMap<String, String> {
    let mut global = HashMap::new();
    let mut scoped = HashMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(name.trim().to_string());
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim().to_string();

        match current.as_deref() {
            None => {
                global.entry(key).or_insert(value);
            }
            Some(name) if name == section => {
                scoped.entry(key).or_insert(value);
            }
            Some(_) => {}
        }
    }

    global.extend(scoped);
    global
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn read_cookie(path: &Path) -> Result<(String, String), ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingCredentials(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    contents
        .trim()
        .split_once(':')
        .map(|(user, password)| (user.to_string(), password.to_string()))
        .ok_or_else(|| ConfigError::MalformedCookie(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("lynx.conf");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_credentials_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "# node settings\nrpcuser=alice\nrpcpassword = secret # inline\n",
        );

        let config = NodeConfig::load(&path, &NetworkParams::mainnet()).unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.password, "secret");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9332);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS));
        assert_eq!(config.url(), "http://127.0.0.1:9332/");
    }

    #[test]
    fn test_network_section_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "rpcuser=u\nrpcpassword=p\nrpcport=1000\n[test]\nrpcport=2000\n[regtest]\nrpcport=3000\nrpcconnect=10.0.0.2\n",
        );

        let regtest = NodeConfig::load(&path, &NetworkParams::regtest()).unwrap();
        assert_eq!(regtest.port, 3000);
        assert_eq!(regtest.host, "10.0.0.2");

        let testnet = NodeConfig::load(&path, &NetworkParams::testnet()).unwrap();
        assert_eq!(testnet.port, 2000);
        assert_eq!(testnet.host, "127.0.0.1");

        let mainnet = NodeConfig::load(&path, &NetworkParams::mainnet()).unwrap();
        assert_eq!(mainnet.port, 1000);
    }

    #[test]
    fn test_cookie_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let regtest_dir = dir.path().join("regtest");
        fs::create_dir_all(&regtest_dir).unwrap();
        fs::write(regtest_dir.join(".cookie"), "__cookie__:abc123\n").unwrap();
        let path = write_config(dir.path(), &format!("datadir={}\n", dir.path().display()));

        let config = NodeConfig::load(&path, &NetworkParams::regtest()).unwrap();
        assert_eq!(config.user, "__cookie__");
        assert_eq!(config.password, "abc123");
    }

    #[test]
    fn test_missing_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "server=1\n");

        let err = NodeConfig::load(&path, &NetworkParams::regtest()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials(_)));
    }

    #[test]
    fn test_invalid_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "rpcuser=u\nrpcpassword=p\nrpcport=abc\n");

        let err = NodeConfig::load(&path, &NetworkParams::mainnet()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = NodeConfig::load(Path::new("/nonexistent/lynx.conf"), &NetworkParams::mainnet())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
