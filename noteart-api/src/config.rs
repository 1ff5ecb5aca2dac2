use std::sync::OnceLock;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Base used when turning blob references into fetchable URLs.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    // storage
    #[serde(default = "default_upload_url_ttl_secs")]
    pub upload_url_ttl_secs: i64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    // logging
    #[serde(default)]
    pub log_json: bool,
    #[serde(default)]
    pub tokio_console: bool,

    // image providers
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    pub openrouter_api_key: Option<String>,
    #[serde(default = "default_openrouter_base_url")]
    pub openrouter_base_url: String,
    pub site_url: Option<String>,
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_imagen_base_url")]
    pub imagen_base_url: String,
    pub imagen_project: Option<String>,
    #[serde(default = "default_imagen_location")]
    pub imagen_location: String,
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    // build
    pub app_version: Option<String>,
    #[serde(default = "default_local")]
    pub source: String,
    #[serde(default = "default_local")]
    pub git_commit: String,
    #[serde(default = "default_local")]
    pub pipeline_id: String,
    #[serde(default = "default_local")]
    pub version: String,
}

fn default_port() -> u16 {
    4000
}

fn default_database_url() -> String {
    "sqlite.db".into()
}

fn default_public_url() -> String {
    format!("http://127.0.0.1:{}", default_port())
}

fn default_upload_url_ttl_secs() -> i64 {
    60 * 60
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_imagen_base_url() -> String {
    "https://us-central1-aiplatform.googleapis.com/v1".into()
}

fn default_imagen_location() -> String {
    "us-central1".into()
}

fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_local() -> String {
    "local".into()
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(error) => panic!("invalid configuration: {error}"),
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[cfg(test)]
pub fn config_override<F>(override_config: F) -> &'static Config
where
    F: FnOnce(Config) -> Config,
{
    CONFIG.get_or_init(|| override_config(Config::from_env()))
}
