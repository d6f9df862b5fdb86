//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! 🧠 Every section has serde defaults, and the defaults are the MinIO docker-compose setup
//! plus the World Bank CSV. An empty config file (or no file at all) peeks at exactly that.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::loader::CsvReadOptions;
use crate::previewer::ShowOptions;
use crate::resource::ResourceConfig;
use crate::session::SessionConfig;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// 🏷️ Shows up in the logs when the session opens and closes.
    pub app_name: String,
    pub session: SessionConfig,
    pub resource: ResourceConfig,
    pub load: CsvReadOptions,
    pub preview: ShowOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Read from MinIO".to_string(),
            session: SessionConfig::default(),
            resource: ResourceConfig::default(),
            load: CsvReadOptions::default(),
            preview: ShowOptions::default(),
        }
    }
}

/// 🔤 Keys whose env values are taken verbatim. Everything else goes through figment's value
/// parser, which would turn `BPK_SESSION__ACCESS_KEY=007` into the number 7.
const VERBATIM_ENV_KEYS: &[&str] = &[
    "app_name",
    "session.endpoint",
    "session.access_key",
    "session.secret_key",
    "session.region",
    "session.local_root",
    "resource.scheme",
    "resource.bucket",
    "resource.key",
    "resource.file_name",
    "load.delimiter",
    "load.quote",
    "load.null_value",
];

/// 🌱 `BPK_*` env vars as a figment layer. String-typed keys skip value parsing.
fn env_layer() -> Figment {
    let the_env = Env::prefixed("BPK_").split("__");
    let mut the_layer = Figment::new().merge(the_env.clone().ignore(VERBATIM_ENV_KEYS));
    let the_verbatim = the_env.only(VERBATIM_ENV_KEYS);
    for (key, value) in the_verbatim.iter() {
        the_layer = the_layer.merge(Serialized::default(key.as_str(), value));
    }
    the_layer
}

/// 🚀 Load the config from env vars and, optionally, a TOML file.
///
/// 📐 DESIGN NOTE (no cap, this is tribal knowledge):
///   - `config_file_name` None → env vars only (`BPK_*`, nested with `__`, e.g.
///     `BPK_SESSION__ENDPOINT=http://localhost:9000`). Text settings (keys, endpoint, bucket,
///     object key, ...) are read as written, so `007` stays `007`.
///   - `config_file_name` Some → env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 Returns an error if the merged config doesn't fit the structs.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    // 🏗️ env vars as the base layer, like a good sourdough starter
    let config = env_layer();

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (BPK_*). \
             The file exists in our hearts, but apparently not in the shape we expected.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (BPK_*). \
                 No file was provided, this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
