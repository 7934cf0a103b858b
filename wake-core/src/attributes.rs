//! Konfigurations-Attribute für den BLE Konfigurationsmodus
//!
//! Der GATT-Server selbst liegt außerhalb des Cores. Er bildet jede
//! Characteristic auf ein [`Attribute`] ab und ruft
//! [`crate::ControlLoop::read_attribute`] / [`crate::ControlLoop::write_attribute`]
//! auf. Alle Werte sind Text.

use crate::types::ParseError;

/// Anzahl der per BLE stellbaren Zeitplan-Einträge
pub const ACTION_TIME_SLOTS: u8 = 4;

/// Attribut-Kennung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    WifiSsid,
    /// Nur schreibbar
    WifiPassword,
    /// "RRR:GGG:BBB"
    LightColor,
    /// "HH:MM" des n-ten Zeitplan-Eintrags (0..4)
    ///
    /// `n` ist die Position im nach Uhrzeit sortierten Zeitplan, kein fester
    /// Eintrag: nach dem Schreiben kann Slot `n` eine andere Aktion enthalten.
    ActionTime(u8),
    /// "HH:MM", stellt die Uhr ohne Netzwerk
    Clock,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::WifiSsid,
        Attribute::WifiPassword,
        Attribute::LightColor,
        Attribute::ActionTime(0),
        Attribute::ActionTime(1),
        Attribute::ActionTime(2),
        Attribute::ActionTime(3),
        Attribute::Clock,
    ];

    /// Name für den User Description Descriptor
    pub fn name(self) -> &'static str {
        match self {
            Attribute::WifiSsid => "WiFi SSID",
            Attribute::WifiPassword => "WiFi Password",
            Attribute::LightColor => "Light Color",
            Attribute::ActionTime(0) => "Action Time 1",
            Attribute::ActionTime(1) => "Action Time 2",
            Attribute::ActionTime(2) => "Action Time 3",
            Attribute::ActionTime(_) => "Action Time 4",
            Attribute::Clock => "Clock",
        }
    }

    pub fn readable(self) -> bool {
        !matches!(self, Attribute::WifiPassword | Attribute::Clock)
    }

    pub fn writable(self) -> bool {
        true
    }

    /// Maximale Länge eines geschriebenen Werts in Bytes
    pub fn max_len(self) -> usize {
        match self {
            Attribute::WifiSsid => 32,
            Attribute::WifiPassword => 64,
            Attribute::LightColor => 11,
            Attribute::ActionTime(_) | Attribute::Clock => 5,
        }
    }
}

/// Fehler beim Lesen oder Schreiben, wird als ATT Status-Code gemeldet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttError {
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidLength,
    Unlikely,
    ValueNotAllowed,
}

impl AttError {
    /// ATT Error Code (Bluetooth Core Spec, Vol 3, Part F, 3.4.1.1)
    pub fn code(self) -> u8 {
        match self {
            AttError::ReadNotPermitted => 0x02,
            AttError::WriteNotPermitted => 0x03,
            AttError::InvalidLength => 0x0D,
            AttError::Unlikely => 0x0E,
            AttError::ValueNotAllowed => 0x13,
        }
    }
}

impl From<ParseError> for AttError {
    fn from(_: ParseError) -> Self {
        AttError::ValueNotAllowed
    }
}

/// Prüft einen geschriebenen Wert und liefert ihn als Text
///
/// Abschließende NUL-Bytes zählen nicht zur Länge.
pub fn value_text(attr: Attribute, data: &[u8]) -> Result<&str, AttError> {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let data = &data[..end];
    if data.len() > attr.max_len() {
        return Err(AttError::InvalidLength);
    }
    core::str::from_utf8(data).map_err(|_| AttError::ValueNotAllowed)
}

/// Kopiert `text` nach `buf`, gibt die Länge zurück
pub fn copy_out(text: &str, buf: &mut [u8]) -> Result<usize, AttError> {
    let bytes = text.as_bytes();
    let target = buf.get_mut(..bytes.len()).ok_or(AttError::InvalidLength)?;
    target.copy_from_slice(bytes);
    Ok(bytes.len())
}
