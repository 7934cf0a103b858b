// Projekt-Konfiguration: Konstanten für Timing, Netzwerk und Speicher
//
// Pin-Belegung (ESP32-C6):
//   GPIO4  Taster (active-low, Pull-Up)
//   GPIO5  Power-Sense (high = Netzteil)
//   GPIO2  Batterie-Spannungsteiler (ADC1)
//   GPIO18 / GPIO19 / GPIO20  Licht R / G / B (LEDC)
//   GPIO21 / GPIO22 / GPIO23  Status-LED Daten / Takt / Versorgung

use wake_core::{ButtonConfig, ControlConfig};

// ============================================================================
// Hauptschleife
// ============================================================================

/// Takt der Hauptschleife in Millisekunden
pub const TICK_MS: u64 = 10;

/// Wartezeit zwischen Abschalten der Peripherie und dem Einschlafen
/// (WLAN-Stack fährt asynchron herunter)
pub const SLEEP_SETTLE_MS: u64 = 100;

/// Fade-Geschwindigkeit bei Zeitplan-Wechseln (ms pro Duty-Schritt)
pub const SCHEDULE_FADE_MS_PER_STEP: u32 = 20;

/// Fade-Geschwindigkeit beim Umschalten per Taster
pub const BUTTON_FADE_MS_PER_STEP: u32 = 4;

/// Schlafdauer wenn WLAN oder Zeit-Sync dauerhaft fehlschlagen
pub const ERROR_RETRY_SLEEP_MS: u64 = 5 * 60 * 1000;

/// Neuer Versuch solange die Uhr noch nicht gestellt ist
pub const TIME_RETRY_MS: u64 = 1000;

// ============================================================================
// Taster
// ============================================================================

pub const BUTTON_DEBOUNCE_MS: u32 = 20;

/// Halten für den BLE Konfigurationsmodus
pub const BUTTON_HOLD_MS: u32 = 5000;

pub const BUTTON_HOLD_REPEAT_MS: u32 = 100;

/// Zeiten der Hauptschleife aus den Konstanten oben
pub const fn control_config() -> ControlConfig {
    ControlConfig {
        button: ButtonConfig {
            debounce_ms: BUTTON_DEBOUNCE_MS,
            hold_ms: BUTTON_HOLD_MS,
            hold_repeat_ms: BUTTON_HOLD_REPEAT_MS,
        },
        schedule_fade_ms_per_step: SCHEDULE_FADE_MS_PER_STEP,
        button_fade_ms_per_step: BUTTON_FADE_MS_PER_STEP,
        error_retry_sleep_ms: ERROR_RETRY_SLEEP_MS,
        time_retry_ms: TIME_RETRY_MS,
    }
}

// ============================================================================
// Licht (LEDC)
// ============================================================================

/// PWM-Frequenz der Licht-Kanäle in kHz (8-Bit Auflösung)
pub const PWM_FREQUENCY_KHZ: u32 = 5;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// Default-SSID für die allererste Konfiguration
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen,
/// danach gilt der Wert aus dem Flash (per BLE änderbar)
pub const DEFAULT_WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};

/// Default-Passwort, analog zu [`DEFAULT_WIFI_SSID`]
pub const DEFAULT_WIFI_PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};

/// Verbindungsversuche bevor ein Fehler gemeldet wird
pub const WIFI_MAX_RETRIES: u32 = 5;

/// Pause zwischen zwei Verbindungsversuchen
pub const WIFI_RETRY_DELAY_SECS: u64 = 2;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// ============================================================================
// Zeit
// ============================================================================

/// Abstand der Ortszeit zu UTC in Sekunden (MEZ)
pub const UTC_OFFSET_SECS: i32 = 60 * 60;

/// NTP Server Hostname
pub const NTP_SERVER: &str = "pool.ntp.org";

/// Abstand zwischen zwei Synchronisationen
pub const NTP_SYNC_INTERVAL_SECS: u64 = 60 * 60;

/// Wartezeit auf die Server-Antwort
pub const NTP_TIMEOUT_SECS: u64 = 5;

/// Fehlversuche in Folge bevor ein Fehler gemeldet wird
pub const NTP_MAX_RETRIES: u32 = 3;

/// Pause nach einem Fehlversuch
pub const NTP_RETRY_DELAY_SECS: u64 = 5;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Flash
// ============================================================================

/// Offset des Konfigurations-Sektors (NVS-Partition der Standard-Tabelle)
pub const CONFIG_FLASH_OFFSET: u32 = 0x9000;
