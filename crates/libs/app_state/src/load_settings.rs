use crate::{AppConstants, AppSettings, RawSettings};
use color_eyre::eyre::{Result, WrapErr};
use std::path::Path;
use tracing::debug;

const DEFAULT_SETTINGS_PATH: &str = "config/settings.yaml";

fn load_raw_settings(path: &Path, read_env: bool) -> Result<RawSettings> {
    let config_path = path
        .canonicalize()
        .wrap_err_with(|| format!("Cannot find settings file at {}", path.display()))?;
    debug!("Loading settings from {}", config_path.display());

    let mut builder = config::Config::builder().add_source(config::File::from(config_path));
    if read_env {
        builder = builder.add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );
    }

    Ok(builder.build()?.try_deserialize::<RawSettings>()?)
}

/// Load settings from a yaml file, optionally overlaid with `APP__`-prefixed env vars.
pub fn load_settings_from_path(path: &Path, read_env: bool) -> Result<AppSettings> {
    Ok(load_raw_settings(path, read_env)?.into())
}

/// Constants are never overridden from the environment.
pub fn load_constants_from_path(path: &Path) -> Result<AppConstants> {
    load_raw_settings(path, false)?.try_into()
}

pub fn load_app_settings() -> Result<AppSettings> {
    // Need to load from dotenv to get it to overwrite the db url from env.
    dotenv::from_path(".env").ok();
    load_settings_from_path(Path::new(DEFAULT_SETTINGS_PATH), true)
}

pub fn load_app_constants() -> Result<AppConstants> {
    load_constants_from_path(Path::new(DEFAULT_SETTINGS_PATH))
}
