//! Client settings: built-in default, then `client.toml`, then environment,
//! then the command line.

use std::{env, fs};

use serde::Deserialize;

pub const DEFAULT_SERVER_URL: &str = "https://sa1-w.vercel.app";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
}

pub fn load_settings(cli_server_url: Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        apply_file(&mut settings, &raw);
    }

    if let Ok(v) = env::var("CHAT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = cli_server_url {
        settings.server_url = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    match toml::from_str::<FileSettings>(raw) {
        Ok(file) => {
            if let Some(v) = file.server_url {
                settings.server_url = v;
            }
        }
        Err(err) => tracing::warn!("config: ignoring malformed client.toml: {err}"),
    }
}
