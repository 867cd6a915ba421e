//! User configuration: refresh timing, layout, colours and keybindings.
//!
//! Settings are read from an optional TOML file at
//! `$XDG_CONFIG_HOME/blocktop/config.toml` (default
//! `~/.config/blocktop/config.toml`).  A missing file means defaults;
//! a malformed one is an error reported before the terminal is touched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use thiserror::Error;

use crate::core::item::NamedColor;
use crate::core::layout::LayoutOptions;
use crate::ui::theme::Theme;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown colour {0:?} (expected one of black, red, green, yellow, blue, magenta, cyan, white)")]
    UnknownColor(String),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {details}")]
    InvalidValue { key: String, details: String },
}

// ───────────────────────────────────────── actions ───────────

/// Everything a key can do on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    Top,
    Bottom,
    Quit,
}

impl Action {
    pub const ALL: &[Action] = &[
        Action::ScrollDown,
        Action::ScrollUp,
        Action::PageDown,
        Action::PageUp,
        Action::Top,
        Action::Bottom,
        Action::Quit,
    ];

    /// Key used in the `[keys]` table of the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollDown => "scroll_down",
            Action::ScrollUp => "scroll_up",
            Action::PageDown => "page_down",
            Action::PageUp => "page_up",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A key code plus its modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Only CTRL/ALT are compared.  SHIFT is already folded into the
    /// character for letters (`G` vs `g`), and terminals disagree on
    /// whether they report it.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Parse a key string like `"Ctrl+c"`, `"Down"`, `"j"`, `"PageUp"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            // Single characters keep their case: `g` and `G` differ.
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

/// Built-in bindings: arrows plus vi keys.
pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
    use KeyCode::*;
    let n = KeyModifiers::NONE;
    let mut m = HashMap::new();

    m.insert(Action::ScrollDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
    m.insert(Action::ScrollUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
    m.insert(Action::PageDown, vec![KeyBind::new(PageDown, n), KeyBind::new(Char(' '), n)]);
    m.insert(Action::PageUp, vec![KeyBind::new(PageUp, n)]);
    m.insert(Action::Top, vec![KeyBind::new(Char('g'), n), KeyBind::new(Home, n)]);
    m.insert(Action::Bottom, vec![KeyBind::new(Char('G'), n), KeyBind::new(End, n)]);
    m.insert(Action::Quit, vec![KeyBind::new(Char('q'), n), KeyBind::new(Esc, n)]);

    m
}

/// Key → action lookup.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<Action, Vec<KeyBind>>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }
}

impl KeyMap {
    /// Find the action bound to `event`.  Ctrl+C always quits.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }
        Action::ALL.iter().copied().find(|action| {
            self.bindings
                .get(action)
                .is_some_and(|binds| binds.iter().any(|b| b.matches(event)))
        })
    }

    /// Replace the bindings of every action named in `overrides`.
    fn apply(&mut self, overrides: &HashMap<String, Vec<String>>) -> Result<(), ConfigError> {
        for (key, values) in overrides {
            let action = Action::from_config_key(key).ok_or_else(|| ConfigError::InvalidValue {
                key: format!("keys.{key}"),
                details: "unknown action".into(),
            })?;
            let mut parsed = Vec::with_capacity(values.len());
            for value in values {
                let bind = KeyBind::parse(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
                    key: format!("keys.{key}"),
                    details: format!("unrecognised key {value:?}"),
                })?;
                parsed.push(bind);
            }
            self.bindings.insert(action, parsed);
        }
        Ok(())
    }
}

// ───────────────────────────────────────── file format ───────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    interval_ms: Option<u64>,
    column_gap: Option<usize>,
    label_width: Option<usize>,
    metrics_ttl_secs: Option<u64>,
    network_ttl_secs: Option<u64>,
    pool_ttl_secs: Option<u64>,
    ticker_ttl_secs: Option<u64>,
    ticker_currency: Option<String>,
    colors: ColorConfig,
    keys: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ColorConfig {
    title: Option<NamedColor>,
    label: Option<NamedColor>,
    value: Option<NamedColor>,
    good: Option<NamedColor>,
    warn: Option<NamedColor>,
    error: Option<NamedColor>,
    background: Option<NamedColor>,
}

// ───────────────────────────────────────── config ────────────

/// Per-block cache lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTtls {
    pub metrics: Duration,
    pub network: Duration,
    pub pool: Duration,
    pub ticker: Duration,
}

impl Default for BlockTtls {
    fn default() -> Self {
        Self {
            metrics: Duration::from_secs(2),
            network: Duration::from_secs(5),
            pool: Duration::from_secs(30),
            ticker: Duration::from_secs(60),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// How often every block is redrawn (and refetched if stale).
    pub interval: Duration,
    pub layout: LayoutOptions,
    pub ttls: BlockTtls,
    pub ticker_currency: String,
    pub theme: Theme,
    pub keys: KeyMap,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            layout: LayoutOptions::default(),
            ttls: BlockTtls::default(),
            ticker_currency: "usd".into(),
            theme: Theme::default(),
            keys: KeyMap::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`.
    /// A missing default file yields defaults; a missing explicit one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&contents).map_err(|err| match err {
            ParseFailure::Toml(source) => ConfigError::Parse { path, source },
            ParseFailure::Config(e) => e,
        })
    }

    fn parse(contents: &str) -> Result<Self, ParseFailure> {
        let file: FileConfig = toml::from_str(contents).map_err(ParseFailure::Toml)?;
        let mut config = Self::default();

        if let Some(ms) = file.interval_ms {
            // Keep this bounded for predictable refresh behaviour.
            config.interval = Duration::from_millis(ms.clamp(100, 60_000));
        }
        if let Some(gap) = file.column_gap {
            config.layout.gap = gap;
        }
        if let Some(width) = file.label_width {
            config.layout.prefix_width = width;
        }
        let secs = Duration::from_secs;
        if let Some(s) = file.metrics_ttl_secs {
            config.ttls.metrics = secs(s);
        }
        if let Some(s) = file.network_ttl_secs {
            config.ttls.network = secs(s);
        }
        if let Some(s) = file.pool_ttl_secs {
            config.ttls.pool = secs(s);
        }
        if let Some(s) = file.ticker_ttl_secs {
            config.ttls.ticker = secs(s);
        }
        if let Some(currency) = file.ticker_currency {
            if currency.trim().is_empty() {
                return Err(ParseFailure::Config(ConfigError::InvalidValue {
                    key: "ticker_currency".into(),
                    details: "must not be empty".into(),
                }));
            }
            config.ticker_currency = currency.trim().to_lowercase();
        }

        let c = file.colors;
        let t = &mut config.theme;
        t.title = c.title.unwrap_or(t.title);
        t.label = c.label.unwrap_or(t.label);
        t.value = c.value.unwrap_or(t.value);
        t.good = c.good.unwrap_or(t.good);
        t.warn = c.warn.unwrap_or(t.warn);
        t.error = c.error.unwrap_or(t.error);
        t.background = c.background.unwrap_or(t.background);

        config.keys.apply(&file.keys).map_err(ParseFailure::Config)?;
        Ok(config)
    }
}

enum ParseFailure {
    Toml(toml::de::Error),
    Config(ConfigError),
}

/// Return the config file path (`$XDG_CONFIG_HOME/blocktop/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("blocktop").join("config.toml")
}
