//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! und externe Dienste ohne konkrete Implementierung.
//!
//! # Implementierungen
//! - **Production:** Adapter in `wake-firmware/src/hal` (ESP32-C6)
//! - **Testing:** Mocks in `wake-tests/tests/common`

use rgb::RGB8;

use crate::types::{LocalTime, TimeOfDay, WakeCause};

/// Fehler-Typ für Peripherie-Zugriffe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwError {
    WriteFailed,
    ReadFailed,
}

/// Fehler-Typ für den persistenten Konfigurationsspeicher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    Read,
    Write,
    Encode,
    Decode,
    /// Gespeicherter Datensatz hat eine andere Version
    VersionMismatch(u16),
    /// Datensatz passt nicht in den Puffer
    TooLarge,
}

/// Monotone Millisekunden-Uhr (läuft auch im Schlaf weiter)
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Digitaler Eingang
pub trait InputPin {
    fn is_high(&mut self) -> bool;

    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Flanke für den Pin-Interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Falling,
    Rising,
}

/// Interrupt-Konfiguration eines Eingangs
///
/// Der Interrupt-Handler selbst meldet nur über [`crate::ButtonSignal`].
pub trait EdgeInterrupt {
    fn listen(&mut self, edge: Edge);
    fn unlisten(&mut self);
}

/// Ein PWM-Kanal mit 8-Bit Duty
pub trait PwmChannel {
    fn set_duty(&mut self, duty: u8) -> Result<(), HwError>;
}

/// Status-LED (3 kleine LEDs hinter einem seriellen Treiber)
pub trait StatusIndicator {
    fn set_power(&mut self, on: bool);
    fn set_color(&mut self, color: RGB8);
}

/// Batterie-ADC, liefert die kalibrierte Spannung am ADC-Pin in mV
///
/// Die Umrechnung über den Spannungsteiler passiert in [`crate::PowerSense`].
pub trait BatteryAdc {
    fn read_millivolts(&mut self) -> Result<u32, HwError>;
}

/// Wanduhr (NTP oder manuell gestellt)
pub trait TimeSource {
    /// Aktuelle lokale Zeit, `None` solange die Uhr nicht gestellt ist
    fn local_time(&mut self) -> Option<LocalTime>;

    /// `true` genau einmal nach jeder Korrektur der Uhr
    fn poll_clock_updated(&mut self) -> bool;

    /// Dauerhafter Fehler bei Verbindung oder Zeit-Synchronisation
    fn has_error(&self) -> bool;

    /// Uhr ohne Netzwerk stellen
    fn set_offline_time(&mut self, time: TimeOfDay);
}

/// WLAN-Verbindung (Befehle sind idempotent)
pub trait Connectivity {
    fn is_connected(&self) -> bool;
    fn is_active(&self) -> bool;
    fn connect(&mut self, ssid: &str, password: &str);
    fn disconnect(&mut self);
}

/// BLE Konfigurationsmodus (Befehle sind idempotent)
pub trait BleControl {
    fn is_enabled(&self) -> bool;
    fn start(&mut self);
    fn stop(&mut self);
}

/// Persistenter Speicher für genau einen Konfigurations-Datensatz
pub trait ConfigStore {
    /// Liest den Datensatz nach `buf`, `Ok(None)` wenn nichts gespeichert ist
    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StoreError>;

    fn write(&mut self, record: &[u8]) -> Result<(), StoreError>;
}

/// Low-Power Schlaf
pub trait SleepControl {
    /// Aufweck-Quellen scharf schalten (Taster, Power-Sense, Timer) und schlafen
    ///
    /// Kehrt nach dem Aufwachen zurück.
    fn sleep(&mut self, duration_ms: u64) -> WakeCause;
}
