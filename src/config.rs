use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::theme::{PreviewStyle, Theme};

const APP_DIR: &str = "livemark";
const LOCAL_FILE: &str = ".livemarkrc";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The concrete theme, detecting from the terminal for `Auto`.
    pub fn resolve(self) -> Theme {
        match self {
            Self::Auto => Theme::detect(),
            Self::Light => Theme::Light,
            Self::Dark => Theme::Dark,
        }
    }
}

/// Flags that can be persisted with `--save`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub no_scroll_sync: bool,
    pub static_palette: bool,
    pub perf: bool,
    pub theme: Option<ThemeMode>,
    pub preview_style: Option<PreviewStyle>,
    pub templates: Option<PathBuf>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: switches are OR'd, options from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            no_scroll_sync: self.no_scroll_sync || other.no_scroll_sync,
            static_palette: self.static_palette || other.static_palette,
            perf: self.perf || other.perf,
            theme: other.theme.or(self.theme),
            preview_style: other.preview_style.or(self.preview_style),
            templates: other.templates.clone().or_else(|| self.templates.clone()),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

/// Read flag tokens from a config file. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` to `path`, one flag per line.
///
/// # Errors
///
/// Returns an error if the parent directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# livemark defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.no_scroll_sync {
        lines.push("--no-scroll-sync".to_string());
    }
    if flags.static_palette {
        lines.push("--static-palette".to_string());
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    if let Some(style) = flags.preview_style {
        let style = match style {
            PreviewStyle::Prose => "prose",
            PreviewStyle::Plain => "plain",
        };
        lines.push(format!("--preview-style {style}"));
    }
    if let Some(path) = &flags.templates {
        lines.push(format!("--templates {}", path.display()));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove a saved config file if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the persistable flags out of raw command-line tokens. Unknown
/// tokens and positional arguments are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline_value.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" => flags.watch = true,
            "--no-scroll-sync" => flags.no_scroll_sync = true,
            "--static-palette" => flags.static_palette = true,
            "--perf" => flags.perf = true,
            "--theme" => flags.theme = value().as_deref().and_then(parse_theme),
            "--preview-style" => {
                flags.preview_style = value().and_then(|v| v.parse().ok());
            }
            "--templates" => flags.templates = value().map(PathBuf::from),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}
