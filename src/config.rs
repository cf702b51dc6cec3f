use std::{env, fs::read_to_string, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("either JWT_SECRET or JWT_PUBLIC_KEY must be set")]
    MissingKeys,
    #[error("unable to read {path}: {source}")]
    KeyFile {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Backend selected by `STORE`. `memory` keeps everything in process and loses it on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Secret(String),
    Rsa {
        public_pem: String,
        private_pem: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    pub mongodb_uri: String,
    pub database_name: String,
    pub host: String,
    pub port: u16,
    pub files_dir: PathBuf,
    pub keys: KeyMaterial,
    pub issuer: String,
    pub cors_origin: Option<String>,
    pub currency: String,
    pub log_format: LogFormat,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| String::from(default))
}

fn read_key(path: String) -> Result<String, ConfigError> {
    read_to_string(&path).map_err(|source| ConfigError::KeyFile { path, source })
}

fn parse_store(value: &str) -> Result<StoreKind, ConfigError> {
    match value {
        "mongo" => Ok(StoreKind::Mongo),
        "memory" => Ok(StoreKind::Memory),
        other => Err(ConfigError::Invalid {
            name: "STORE",
            value: other.to_string(),
        }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: String = var_or("PORT", "8000");
        let port: u16 = port.parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port.clone(),
        })?;

        let keys: KeyMaterial = if let Ok(secret) = env::var("JWT_SECRET") {
            KeyMaterial::Secret(secret)
        } else if let Ok(public_path) = env::var("JWT_PUBLIC_KEY") {
            KeyMaterial::Rsa {
                public_pem: read_key(public_path)?,
                private_pem: env::var("JWT_PRIVATE_KEY").ok().map(read_key).transpose()?,
            }
        } else {
            return Err(ConfigError::MissingKeys);
        };

        let log_format: LogFormat = match var_or("LOG_FORMAT", "text").as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let store: StoreKind = parse_store(&var_or("STORE", "mongo"))?;

        Ok(Self {
            store,
            mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
            database_name: var_or("DATABASE_NAME", "safety"),
            host: var_or("HOST", "127.0.0.1"),
            port,
            files_dir: PathBuf::from(var_or("FILES_DIR", "./files")),
            keys,
            issuer: var_or("JWT_ISSUER", "safety-insurance"),
            cors_origin: env::var("CORS_ORIGIN").ok(),
            currency: var_or("CURRENCY", "USD"),
            log_format,
        })
    }

    /// Settings used by tests and local tooling.
    pub fn for_secret(secret: &str, files_dir: PathBuf) -> Self {
        Self {
            store: StoreKind::Memory,
            mongodb_uri: String::from("mongodb://localhost:27017"),
            database_name: String::from("safety"),
            host: String::from("127.0.0.1"),
            port: 8000,
            files_dir,
            keys: KeyMaterial::Secret(secret.to_string()),
            issuer: String::from("safety-insurance"),
            cors_origin: None,
            currency: String::from("USD"),
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_names_select_a_backend() {
        assert_eq!(parse_store("mongo").unwrap(), StoreKind::Mongo);
        assert_eq!(parse_store("memory").unwrap(), StoreKind::Memory);
        assert!(matches!(
            parse_store("postgres"),
            Err(ConfigError::Invalid { name: "STORE", .. })
        ));
    }
}
