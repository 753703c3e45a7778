use std::{
    collections::BTreeSet,
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{bail, ensure, Context};
use serde::Deserialize;
use trec::{
    download::{DownloadSettings, DEFAULT_OUTPUT_PATH, DEFAULT_OUTPUT_TEMPLATE},
    WatchTargets,
};

pub const CONFIG_FILE_NAME: &str = "twitch-recorder.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct TwitchConfig {
    pub client_id: String,
    /// User access token
    pub token: String,

    // A set so duplicate entries collapse
    #[serde(default)]
    pub users: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub output_template: String,
    pub output_path: PathBuf,

    /// yt-dlp executable, looked up in PATH unless it is a path
    pub yt_dlp: String,
    pub yt_dlp_args: Vec<String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            yt_dlp: "yt-dlp".to_string(),
            yt_dlp_args: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub recorder: LogLevel,
    pub twitch: LogLevel,
    pub yt_dlp: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            recorder: LogLevel::Info,
            twitch: LogLevel::Warning,
            yt_dlp: LogLevel::Info,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directives for the configured levels.
    pub fn directives(&self) -> String {
        let recorder = self.recorder.directive();
        let twitch = self.twitch.directive();
        let yt_dlp = self.yt_dlp.directive();

        format!(
            "warn,trec={recorder},twitch_recorder={recorder},trec_twitch={twitch},reqwest={twitch},yt_dlp={yt_dlp}"
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl Config {
    /// Loads `path` if given, otherwise the first config file found in the
    /// platform config directories. Returns the config with its location.
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, PathBuf)> {
        if let Some(path) = path {
            return Ok((Self::from_file(path)?, path.to_path_buf()));
        }

        let paths = platform_config_paths()?;
        match paths.iter().find(|path| path.is_file()) {
            Some(path) => Ok((Self::from_file(path)?, path.clone())),
            None => bail!(
                "Config file not found at paths: {}",
                paths
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't read config {}", path.display()))?;
        Self::from_toml(&data).with_context(|| format!("Couldn't parse config {}", path.display()))
    }

    pub fn from_toml(data: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.twitch.client_id.trim().is_empty(),
            "twitch.client_id must not be empty"
        );
        ensure!(
            !self.twitch.token.trim().is_empty(),
            "twitch.token must not be empty"
        );
        ensure!(
            !self.targets().is_empty(),
            "twitch.users must contain at least one user"
        );
        Ok(())
    }

    pub fn targets(&self) -> WatchTargets {
        WatchTargets::new(&self.twitch.users)
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            output_path: self.downloader.output_path.clone(),
            output_template: self.downloader.output_template.clone(),
            options: self.downloader.yt_dlp_args.clone(),
        }
    }
}

fn platform_config_paths() -> anyhow::Result<Vec<PathBuf>> {
    Ok(platform_config_dirs()?
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .collect())
}

#[cfg(unix)]
fn platform_config_dirs() -> anyhow::Result<Vec<PathBuf>> {
    Ok(unix_config_dirs(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    ))
}

#[cfg(windows)]
fn platform_config_dirs() -> anyhow::Result<Vec<PathBuf>> {
    match std::env::var_os("APPDATA").filter(|appdata| !appdata.is_empty()) {
        Some(appdata) => Ok(vec![PathBuf::from(appdata).join("twitch-recorder")]),
        None => bail!("APPDATA is not set, pass the config file with --config"),
    }
}

#[cfg(not(any(unix, windows)))]
fn platform_config_dirs() -> anyhow::Result<Vec<PathBuf>> {
    bail!("Unsupported system, pass the config file with --config")
}

#[cfg_attr(not(unix), allow(dead_code))]
fn unix_config_dirs(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(xdg) = xdg_config_home.filter(|xdg| !xdg.is_empty()) {
        dirs.push(PathBuf::from(xdg));
    }
    if let Some(home) = home.filter(|home| !home.is_empty()) {
        dirs.push(PathBuf::from(home).join(".config"));
    }
    dirs.push(PathBuf::from("/etc"));

    dirs
}
