//! Card configuration for the door control card.
//!
//! TOML card profiles merged with `DOORCARD_` environment overrides, and
//! translation of a named card to `doorcard_core::WidgetConfig`. Entity ids
//! stay plain strings here until translation, so a typo is reported with
//! the exact key it came from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doorcard_core::{CoreError, EntityId, WidgetConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no card named '{name}' in config")]
    UnknownCard { name: String },

    #[error("no cards configured")]
    NoCards,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Card used when none is named on the command line.
    pub default_card: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named card profiles.
    #[serde(default)]
    pub cards: HashMap<String, Card>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

/// One card instance: the entities it watches and controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Card {
    /// Door contact sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smartlock: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,

    #[serde(
        rename = "building-door",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub building_door: Option<String>,

    /// Override of `defaults.debounce_ms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,

    #[serde(default)]
    pub helpers: HelperOverrides,

    #[serde(default)]
    pub feedback: FeedbackOverrides,
}

/// Helper entity ids. Anything left out keeps the conventional default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HelperOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_verify_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_open: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_push: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_end: Option<String>,
}

/// Values the pin-feedback entity reports, when the host uses other words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedbackOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrong: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "doorcard", "doorcard").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("doorcard");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, still merging defaults and environment.
///
/// A missing file is not an error; it simply contributes nothing.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DOORCARD_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Card resolution ─────────────────────────────────────────────────

/// Pick a card by name, falling back to `default_card`, then to the only
/// card when exactly one is configured.
pub fn resolve_card<'a>(
    config: &'a Config,
    name: Option<&str>,
) -> Result<(String, &'a Card), ConfigError> {
    if config.cards.is_empty() {
        return Err(ConfigError::NoCards);
    }

    let name = match name.or(config.default_card.as_deref()) {
        Some(name) => name.to_owned(),
        None if config.cards.len() == 1 => config
            .cards
            .keys()
            .next()
            .cloned()
            .ok_or(ConfigError::NoCards)?,
        None => {
            return Err(ConfigError::Validation {
                field: "default_card".into(),
                reason: "several cards are configured; name one".into(),
            });
        }
    };

    let card = config
        .cards
        .get(&name)
        .ok_or_else(|| ConfigError::UnknownCard { name: name.clone() })?;
    Ok((name, card))
}

/// Build a validated `WidgetConfig` from a card profile.
pub fn card_to_widget_config(
    card: &Card,
    card_name: &str,
    defaults: &Defaults,
) -> Result<WidgetConfig, ConfigError> {
    let entity = |raw: Option<&String>, key: &str| -> Result<Option<EntityId>, ConfigError> {
        raw.map(|raw| parse_entity(raw, &format!("cards.{card_name}.{key}")))
            .transpose()
    };

    let mut widget = WidgetConfig {
        sensor: entity(card.sensor.as_ref(), "sensor")?,
        smartlock: entity(card.smartlock.as_ref(), "smartlock")?,
        gate: entity(card.gate.as_ref(), "gate")?,
        building_door: entity(card.building_door.as_ref(), "building-door")?,
        debounce: Duration::from_millis(card.debounce_ms.unwrap_or(defaults.debounce_ms)),
        ..WidgetConfig::default()
    };

    let h = &card.helpers;
    let helpers = &mut widget.helpers;
    for (slot, value, key) in [
        (&mut helpers.pin_display, &h.pin_display, "pin_display"),
        (&mut helpers.pin_feedback, &h.pin_feedback, "pin_feedback"),
        (&mut helpers.pin_verify_script, &h.pin_verify_script, "pin_verify_script"),
        (&mut helpers.lock_script, &h.lock_script, "lock_script"),
        (&mut helpers.last_open, &h.last_open, "last_open"),
        (&mut helpers.snapshot_path, &h.snapshot_path, "snapshot_path"),
        (&mut helpers.clock, &h.clock, "clock"),
        (&mut helpers.date, &h.date, "date"),
        (&mut helpers.notify_telegram, &h.notify_telegram, "notify_telegram"),
        (&mut helpers.notify_push, &h.notify_push, "notify_push"),
        (&mut helpers.notify_start, &h.notify_start, "notify_start"),
        (&mut helpers.notify_end, &h.notify_end, "notify_end"),
    ] {
        if let Some(raw) = value {
            *slot = parse_entity(raw, &format!("cards.{card_name}.helpers.{key}"))?;
        }
    }

    let f = &card.feedback;
    let vocabulary = &mut widget.feedback;
    for (slot, value) in [
        (&mut vocabulary.idle, &f.idle),
        (&mut vocabulary.opened, &f.opened),
        (&mut vocabulary.locked, &f.locked),
        (&mut vocabulary.wrong, &f.wrong),
    ] {
        if let Some(value) = value {
            slot.clone_from(value);
        }
    }

    widget.validate()?;
    Ok(widget)
}

/// Resolve a card and translate it in one step.
pub fn widget_config(config: &Config, name: Option<&str>) -> Result<(String, WidgetConfig), ConfigError> {
    let (name, card) = resolve_card(config, name)?;
    let widget = card_to_widget_config(card, &name, &config.defaults)?;
    Ok((name, widget))
}

fn parse_entity(raw: &str, field: &str) -> Result<EntityId, ConfigError> {
    EntityId::parse(raw).map_err(|err| ConfigError::Validation {
        field: field.into(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FRONT: &str = r#"
default_card = "front"

[defaults]
debounce_ms = 120

[cards.front]
sensor = "binary_sensor.front_door"
smartlock = "lock.front_door"
gate = "lock.gate"
building-door = "cover.building_door"

[cards.front.helpers]
pin_feedback = "input_text.door_feedback"

[cards.front.feedback]
opened = "GEOFFNET"

[cards.garage]
gate = "switch.garage_relay"
debounce_ms = 250
"#;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_cards_from_file() {
        let (_dir, path) = write_config(FRONT);
        let config = load_config_from(&path).unwrap();

        assert_eq!(config.default_card.as_deref(), Some("front"));
        assert_eq!(config.defaults.debounce_ms, 120);
        assert_eq!(config.cards.len(), 2);
        assert_eq!(
            config.cards["front"].building_door.as_deref(),
            Some("cover.building_door")
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.cards.is_empty());
        assert_eq!(config.defaults.debounce_ms, 100);
    }

    #[test]
    fn default_card_translates_with_overrides() {
        let (_dir, path) = write_config(FRONT);
        let config = load_config_from(&path).unwrap();

        let (name, widget) = widget_config(&config, None).unwrap();
        assert_eq!(name, "front");
        assert_eq!(widget.debounce, Duration::from_millis(120));
        assert_eq!(widget.helpers.pin_feedback.as_str(), "input_text.door_feedback");
        assert_eq!(widget.helpers.pin_display.as_str(), "input_text.pin_display");
        assert_eq!(widget.feedback.opened, "GEOFFNET");
        assert_eq!(widget.feedback.wrong, "WRONG");
    }

    #[test]
    fn card_debounce_overrides_defaults() {
        let (_dir, path) = write_config(FRONT);
        let config = load_config_from(&path).unwrap();

        let (_, widget) = widget_config(&config, Some("garage")).unwrap();
        assert_eq!(widget.debounce, Duration::from_millis(250));
        assert!(widget.sensor.is_none());
    }

    #[test]
    fn unknown_card_is_reported() {
        let (_dir, path) = write_config(FRONT);
        let config = load_config_from(&path).unwrap();

        let err = resolve_card(&config, Some("back")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCard { name } if name == "back"));
    }

    #[test]
    fn empty_config_has_no_cards() {
        let err = resolve_card(&Config::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCards));
    }

    #[test]
    fn single_card_needs_no_default() {
        let mut config = Config::default();
        config.cards.insert(
            "only".into(),
            Card {
                gate: Some("lock.gate".into()),
                ..Card::default()
            },
        );
        assert_eq!(resolve_card(&config, None).unwrap().0, "only");

        config.cards.insert("other".into(), Card::default());
        assert!(matches!(
            resolve_card(&config, None).unwrap_err(),
            ConfigError::Validation { .. }
        ));
    }

    #[test]
    fn invalid_entity_names_its_key() {
        let card = Card {
            gate: Some("gate without domain".into()),
            ..Card::default()
        };
        let err = card_to_widget_config(&card, "front", &Defaults::default()).unwrap_err();
        match err {
            ConfigError::Validation { field, .. } => assert_eq!(field, "cards.front.gate"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn card_without_controls_fails_validation() {
        let card = Card {
            sensor: Some("binary_sensor.front_door".into()),
            ..Card::default()
        };
        let err = card_to_widget_config(&card, "front", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Core(CoreError::Config { .. })));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config {
            default_card: Some("front".into()),
            ..Config::default()
        };
        config.cards.insert(
            "front".into(),
            Card {
                smartlock: Some("lock.front_door".into()),
                building_door: Some("cover.building_door".into()),
                ..Card::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("building-door"));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.cards["front"], config.cards["front"]);
    }
}
