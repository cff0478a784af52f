use std::path::PathBuf;
use dotenvy;

const DEFAULT_DATABASE: &'static str = "database.json";
const DEFAULT_ADDRESS: &'static str = "0.0.0.0:5000";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// JSON file holding every post.
    pub database: PathBuf,
    pub address: String,
    /// Write an empty store at start-up when `database` does not exist.
    pub create_database: bool,
}

impl Config {
    /// Read the configuration from the process environment, after
    /// loading a `.env` file if there is one.
    pub fn from_env() -> Config {
        dotenvy::dotenv().ok();
        Config::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Config
        where F: Fn(&str) -> Option<String>
    {
        Config {
            database: lookup("BLOG_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            address: lookup("BLOG_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            create_database: lookup("BLOG_CREATE_DATABASE").map_or(false, |value| is_enabled(&value)),
        }
    }
}

fn is_enabled(value: &str) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        _ => false,
    }
}
