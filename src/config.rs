use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lovewall", about = "Personal message walls, timelines and special dates")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    /// Upper bound on a whole request body, all files included.
    pub max_upload_mb: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_upload_mb: 50,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "lovewall_session".to_string(),
            session_hours: 336,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.resolve_paths(&data_dir);
        Ok(config)
    }

    /// Defaults for everything, with database and uploads placed under `data_dir`.
    pub fn for_data_dir(data_dir: &std::path::Path) -> Self {
        let mut config = Config::default();
        config.resolve_paths(data_dir);
        config
    }

    fn resolve_paths(&mut self, data_dir: &std::path::Path) {
        if self.database.path.is_none() {
            self.database.path = Some(data_dir.join("lovewall.db"));
        }
        if self.storage.path.is_none() {
            self.storage.path = Some(data_dir.join("uploads"));
        }
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".lovewall"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("lovewall.db"))
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("uploads"))
    }

    pub fn max_body_bytes(&self) -> usize {
        self.storage.max_upload_mb * 1024 * 1024
    }
}
