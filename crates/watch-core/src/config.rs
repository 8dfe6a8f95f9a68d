//! Account and room configuration.
//!
//! The configuration file is YAML keyed by account name:
//!
//! ```yaml
//! acme:
//!   login: me@acme.test
//!   password: hunter2
//!   ssl: true
//!   image: /usr/share/icons/acme.png
//!   rooms:
//!     Ops:
//!       sticky: "urgent|down"
//!       ignore: "^deploybot"
//!     Lounge:
//! ```
//!
//! Patterns are compiled while loading, so a malformed regex is reported
//! once at startup instead of on every message.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{Result, WatchError};
use crate::filter::RoomRules;

/// File name of the default config, relative to the home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".roomwatch.yml";

// ── On-disk shape ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AccountEntry {
    login: String,
    password: String,
    #[serde(default)]
    ssl: bool,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    rooms: Option<Ordered<Option<RoomEntry>>>,
}

#[derive(Debug, Default, Deserialize)]
struct RoomEntry {
    #[serde(default)]
    sticky: Option<String>,
    #[serde(default)]
    ignore: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

/// A YAML mapping kept in file order. Duplicate keys are rejected.
#[derive(Debug)]
struct Ordered<T>(Vec<(String, T)>);

impl<T> Default for Ordered<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ordered<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = Ordered<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, T)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate entry {key:?}")));
                    }
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

// ── Validated configuration ───────────────────────────────────────────────────

/// One watched room with its compiled rules.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub name: String,
    pub rules: RoomRules,
}

/// One chat account and the rooms to watch under it.
#[derive(Clone)]
pub struct AccountConfig {
    pub name: String,
    pub login: String,
    pub password: String,
    /// Connect over TLS.
    pub ssl: bool,
    pub image: Option<String>,
    pub rooms: Vec<RoomConfig>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("ssl", &self.ssl)
            .field("image", &self.image)
            .field("rooms", &self.rooms)
            .finish()
    }
}

/// The full set of accounts, in the order the file lists them.
#[derive(Debug, Clone, Default)]
pub struct WatchConfig {
    pub accounts: Vec<AccountConfig>,
}

impl WatchConfig {
    /// `~/.roomwatch.yml`, or `./.roomwatch.yml` when there is no home directory.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE)
    }

    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| WatchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Parse and validate YAML text. `origin` is only used in error messages.
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self> {
        // An empty file deserialises to unit; treat it as "no accounts".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: Ordered<AccountEntry> =
            serde_yaml::from_str(yaml).map_err(|source| WatchError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;

        let accounts = raw
            .0
            .into_iter()
            .map(|(name, entry)| compile_account(name, entry))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            accounts = accounts.len(),
            rooms = accounts.iter().map(|a| a.rooms.len()).sum::<usize>(),
            "configuration loaded"
        );

        Ok(Self { accounts })
    }

    /// Total number of configured rooms across all accounts.
    pub fn room_count(&self) -> usize {
        self.accounts.iter().map(|a| a.rooms.len()).sum()
    }
}

fn compile_account(name: String, entry: AccountEntry) -> Result<AccountConfig> {
    if entry.login.trim().is_empty() {
        return Err(WatchError::Config(format!("account {name} has an empty login")));
    }

    let entries = entry.rooms.unwrap_or_default().0;
    let mut rooms = Vec::with_capacity(entries.len());
    for (room_name, room) in entries {
        let room = room.unwrap_or_default();
        // Rooms without their own icon fall back to the account icon.
        let icon = room.image.or_else(|| entry.image.clone());
        let rules = RoomRules::compile(room.sticky.as_deref(), room.ignore.as_deref(), icon)
            .map_err(|(kind, source)| WatchError::InvalidPattern {
                account: name.clone(),
                room: room_name.clone(),
                kind,
                source,
            })?;
        rooms.push(RoomConfig {
            name: room_name,
            rules,
        });
    }

    Ok(AccountConfig {
        name,
        login: entry.login,
        password: entry.password,
        ssl: entry.ssl,
        image: entry.image,
        rooms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{classify, Classification};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
acme:
  login: me@acme.test
  password: hunter2
  ssl: true
  image: acme.png
  rooms:
    Ops:
      sticky: "urgent"
      ignore: "test"
    Lounge:
    Design:
      image: design.png
globex:
  login: me@globex.test
  password: pw
"#;

    fn parse(yaml: &str) -> Result<WatchConfig> {
        WatchConfig::from_yaml_str(yaml, Path::new("test.yml"))
    }

    #[test]
    fn test_accounts_and_rooms_keep_file_order() {
        let yaml = r#"
zeta:
  login: z
  password: pw
  rooms:
    Ops:
    Alpha:
    Lounge:
acme:
  login: a
  password: pw
"#;
        let cfg = parse(yaml).unwrap();
        let names: Vec<&str> = cfg.accounts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["zeta", "acme"]);
        let rooms: Vec<&str> = cfg.accounts[0].rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(rooms, ["Ops", "Alpha", "Lounge"]);
    }

    #[test]
    fn test_duplicate_room_is_parse_error() {
        let yaml = "acme:\n  login: me\n  password: pw\n  rooms:\n    Ops:\n    Ops:\n";
        assert!(matches!(parse(yaml), Err(WatchError::ConfigParse { .. })));
    }

    #[test]
    fn test_null_rooms_key_means_no_rooms() {
        let yaml = "acme:\n  login: me\n  password: pw\n  rooms:\n";
        assert!(parse(yaml).unwrap().accounts[0].rooms.is_empty());
    }

    #[test]
    fn test_account_fields() {
        let cfg = parse(SAMPLE).unwrap();
        let acme = &cfg.accounts[0];
        assert_eq!(acme.login, "me@acme.test");
        assert_eq!(acme.password, "hunter2");
        assert!(acme.ssl);
        assert_eq!(acme.image.as_deref(), Some("acme.png"));
        assert_eq!(acme.rooms.len(), 3);
        assert_eq!(cfg.room_count(), 3);
    }

    #[test]
    fn test_ssl_defaults_to_false_and_rooms_to_empty() {
        let cfg = parse(SAMPLE).unwrap();
        let globex = &cfg.accounts[1];
        assert!(!globex.ssl);
        assert!(globex.rooms.is_empty());
        assert!(globex.image.is_none());
    }

    #[test]
    fn test_room_patterns_compiled() {
        let cfg = parse(SAMPLE).unwrap();
        let ops = cfg.accounts[0].rooms.iter().find(|r| r.name == "Ops").unwrap();
        assert_eq!(classify(&ops.rules, "URGENT"), Classification::Escalated);
        assert_eq!(classify(&ops.rules, "a test"), Classification::Ignore);
    }

    #[test]
    fn test_null_room_entry_has_no_rules() {
        let cfg = parse(SAMPLE).unwrap();
        let lounge = cfg.accounts[0].rooms.iter().find(|r| r.name == "Lounge").unwrap();
        assert!(lounge.rules.sticky.is_none());
        assert!(lounge.rules.ignore.is_none());
    }

    #[test]
    fn test_room_icon_inherits_account_icon() {
        let cfg = parse(SAMPLE).unwrap();
        let rooms = &cfg.accounts[0].rooms;
        let lounge = rooms.iter().find(|r| r.name == "Lounge").unwrap();
        let design = rooms.iter().find(|r| r.name == "Design").unwrap();
        assert_eq!(lounge.rules.icon.as_deref(), Some("acme.png"));
        assert_eq!(design.rules.icon.as_deref(), Some("design.png"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let yaml = r#"
acme:
  login: me
  password: pw
  rooms:
    Ops:
      ignore: "(unclosed"
"#;
        match parse(yaml) {
            Err(WatchError::InvalidPattern {
                account,
                room,
                kind,
                ..
            }) => {
                assert_eq!(account, "acme");
                assert_eq!(room, "Ops");
                assert_eq!(kind, "ignore");
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_password_is_parse_error() {
        let yaml = "acme:\n  login: me\n";
        assert!(matches!(parse(yaml), Err(WatchError::ConfigParse { .. })));
    }

    #[test]
    fn test_empty_login_rejected() {
        let yaml = "acme:\n  login: \"\"\n  password: pw\n";
        assert!(matches!(parse(yaml), Err(WatchError::Config(_))));
    }

    #[test]
    fn test_empty_file_has_no_accounts() {
        let cfg = parse("   \n").unwrap();
        assert!(cfg.accounts.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roomwatch.yml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = WatchConfig::load(&path).unwrap();
        assert_eq!(cfg.accounts.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = WatchConfig::load(&dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, WatchError::ConfigRead { .. }));
    }

    #[test]
    fn test_debug_redacts_password() {
        let cfg = parse(SAMPLE).unwrap();
        let dbg = format!("{:?}", cfg.accounts[0]);
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
