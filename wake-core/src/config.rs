//! Persistente Konfiguration (Zeitplan + WLAN-Zugangsdaten)
//!
//! Gespeichert wird ein einzelner JSON-Datensatz mit Versionsnummer. Fehlt
//! der Datensatz, ist er kaputt oder hat er eine andere Version, werden die
//! Standardwerte benutzt und sofort gespeichert.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::schedule::{MAX_ACTIONS, Schedule};
use crate::traits::{ConfigStore, StoreError};
use crate::types::{LIGHT_COLOR_OFF, LIGHT_COLOR_ON, ScheduledAction};

/// Version des gespeicherten Datensatzes
pub const CONFIG_VERSION: u16 = 3;

/// Maximale Größe des JSON-Datensatzes in Bytes
pub const CONFIG_RECORD_LEN: usize = 1024;

/// Maximale Länge der SSID in Bytes
pub const SSID_LEN: usize = 32;
/// Maximale Länge des WLAN-Passworts in Bytes
pub const PASSWORD_LEN: usize = 64;

pub type Ssid = String<SSID_LEN>;
pub type Password = String<PASSWORD_LEN>;

/// Zeitplan beim ersten Start
pub const DEFAULT_ACTIONS: [ScheduledAction; 3] = [
    ScheduledAction::new(6, 30, rgb::RGB8 { r: 30, g: 90, b: 0 }),
    ScheduledAction::new(7, 30, LIGHT_COLOR_OFF),
    ScheduledAction::new(18, 45, LIGHT_COLOR_ON),
];

/// Laufzeit-Konfiguration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub schedule: Schedule,
    pub wifi_ssid: Ssid,
    pub wifi_password: Password,
}

impl AppConfig {
    /// Standard-Zeitplan mit den übergebenen Zugangsdaten
    ///
    /// Zu lange Zugangsdaten werden verworfen (leerer String).
    pub fn with_defaults(ssid: &str, password: &str) -> Self {
        Self {
            schedule: default_schedule(),
            wifi_ssid: String::try_from(ssid).unwrap_or_default(),
            wifi_password: String::try_from(password).unwrap_or_default(),
        }
    }

    /// Serialisiert als JSON nach `buf`, gibt die Länge zurück
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, StoreError> {
        let actions = Vec::from_slice(self.schedule.as_slice()).map_err(|_| StoreError::Encode)?;
        let record = StoredConfig {
            version: CONFIG_VERSION,
            wifi_ssid: self.wifi_ssid.clone(),
            wifi_password: self.wifi_password.clone(),
            actions,
        };
        serde_json_core::to_slice(&record, buf).map_err(|_| StoreError::TooLarge)
    }

    /// Liest einen JSON-Datensatz
    ///
    /// Escapes (`\"`, `\\`) in SSID und Passwort werden aufgelöst,
    /// der Puffer dafür muss den längsten String fassen.
    pub fn decode(record: &[u8]) -> Result<Self, StoreError> {
        let mut unescape = [0u8; PASSWORD_LEN];
        let (stored, _) =
            serde_json_core::from_slice_escaped::<StoredConfig>(record, &mut unescape)
                .map_err(|_| StoreError::Decode)?;

        if stored.version != CONFIG_VERSION {
            return Err(StoreError::VersionMismatch(stored.version));
        }

        let schedule = Schedule::from_slice(&stored.actions).ok_or(StoreError::Decode)?;
        Ok(Self {
            schedule,
            wifi_ssid: stored.wifi_ssid,
            wifi_password: stored.wifi_password,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct StoredConfig {
    version: u16,
    wifi_ssid: Ssid,
    wifi_password: Password,
    actions: Vec<ScheduledAction, MAX_ACTIONS>,
}

pub fn default_schedule() -> Schedule {
    let mut schedule = Schedule::new();
    for action in DEFAULT_ACTIONS {
        // Passt immer, DEFAULT_ACTIONS ist kleiner als MAX_ACTIONS
        let _ = schedule.insert(action);
    }
    schedule
}

/// Lädt die Konfiguration oder legt `defaults` neu an
pub fn load_or_init<S: ConfigStore>(store: &mut S, defaults: &AppConfig) -> AppConfig {
    let mut buf = [0u8; CONFIG_RECORD_LEN];

    let loaded = match store.read(&mut buf) {
        Ok(Some(len)) => AppConfig::decode(&buf[..len]).map(Some),
        Ok(None) => Ok(None),
        Err(e) => Err(e),
    };

    match loaded {
        Ok(Some(config)) if !config.schedule.is_empty() => {
            info!("Config: loaded {} actions", config.schedule.len());
            return config;
        }
        Ok(Some(_)) => info!("Config: stored schedule is empty, using defaults"),
        Ok(None) => info!("Config: nothing stored, using defaults"),
        Err(StoreError::VersionMismatch(version)) => {
            info!("Config: version {} != {}, using defaults", version, CONFIG_VERSION)
        }
        Err(e) => warn!("Config: load failed ({}), using defaults", e),
    }

    let config = defaults.clone();
    if let Err(e) = save(store, &config) {
        warn!("Config: could not persist defaults: {}", e);
    }
    config
}

/// Speichert die komplette Konfiguration
pub fn save<S: ConfigStore>(store: &mut S, config: &AppConfig) -> Result<(), StoreError> {
    let mut buf = [0u8; CONFIG_RECORD_LEN];
    let len = config.encode(&mut buf)?;
    store.write(&buf[..len])?;
    debug!("Config: saved {} bytes", len);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_sorted() {
        let schedule = default_schedule();
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.as_slice(), &DEFAULT_ACTIONS);
    }

    #[test]
    fn test_encode_decode() {
        let config = AppConfig::with_defaults("home", "secret");
        let mut buf = [0u8; CONFIG_RECORD_LEN];
        let len = config.encode(&mut buf).unwrap();

        assert_eq!(AppConfig::decode(&buf[..len]), Ok(config));
    }

    #[test]
    fn test_decode_unescapes_credentials() {
        let record = r#"{"version":3,"wifi_ssid":"a\"b","wifi_password":"c\\dä","actions":[]}"#;
        let config = AppConfig::decode(record.as_bytes()).unwrap();
        assert_eq!(config.wifi_ssid.as_str(), "a\"b");
        assert_eq!(config.wifi_password.as_str(), "c\\dä");
    }

    #[test]
    fn test_decode_rejects_other_version() {
        let record = br#"{"version":2,"wifi_ssid":"","wifi_password":"","actions":[]}"#;
        assert_eq!(
            AppConfig::decode(record),
            Err(StoreError::VersionMismatch(2))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(AppConfig::decode(b"\xff\xff\xff"), Err(StoreError::Decode));
    }

    #[test]
    fn test_with_defaults_drops_oversized_ssid() {
        let long = "0123456789012345678901234567890123456789";
        let config = AppConfig::with_defaults(long, "pw");
        assert!(config.wifi_ssid.is_empty());
        assert_eq!(config.wifi_password.as_str(), "pw");
    }
}
