//! Core Types für die Lichtsteuerung
//!
//! Datenstrukturen ohne Hardware-Dependencies

use core::fmt::Write;

use heapless::String;
use rgb::RGB8;
use serde::{Deserialize, Serialize};

/// Licht aus
pub const LIGHT_COLOR_OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Warmweiß, Zielfarbe beim Einschalten per Taster
pub const LIGHT_COLOR_ON: RGB8 = RGB8 { r: 60, g: 48, b: 38 };

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Unix-Zeit für 2020-01-01 00:00:00 UTC
///
/// Alles davor gilt als "Uhr nicht gestellt".
pub const MIN_VALID_UNIX_SECS: u64 = 1_577_836_800;

/// Fehler beim Parsen von Text-Attributen ("HH:MM", "RRR:GGG:BBB")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Text hat nicht das erwartete Format
    Format,
    /// Zahl außerhalb des gültigen Bereichs
    OutOfRange,
}

/// Uhrzeit ohne Sekunden
///
/// Die Sortierung ist lexikographisch (Stunde, dann Minute).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Erstellt eine Uhrzeit, `None` bei Stunde > 23 oder Minute > 59
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub const fn minutes_since_midnight(self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    /// Parst "HH:MM" (auch "H:MM"), abschließende NUL-Bytes werden ignoriert
    ///
    /// ```
    /// # use wake_core::TimeOfDay;
    /// let t = TimeOfDay::parse_hhmm("06:30").unwrap();
    /// assert_eq!(t, TimeOfDay { hour: 6, minute: 30 });
    /// assert!(TimeOfDay::parse_hhmm("24:00").is_err());
    /// ```
    pub fn parse_hhmm(text: &str) -> Result<Self, ParseError> {
        let text = clean(text);
        let (hour, minute) = text.split_once(':').ok_or(ParseError::Format)?;
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(ParseError::Format);
        }
        let hour = parse_number(hour)?;
        let minute = parse_number(minute)?;
        if hour > 23 || minute > 59 {
            return Err(ParseError::OutOfRange);
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn format_hhmm(self) -> String<5> {
        let mut text = String::new();
        // 5 Zeichen passen immer
        let _ = write!(text, "{:02}:{:02}", self.hour, self.minute);
        text
    }
}

/// Lokale Uhrzeit mit Sekunden, wie sie die Zeitquelle liefert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Rechnet Unix-Sekunden plus festen UTC-Offset in die lokale Tageszeit um
    pub fn from_unix(unix_secs: u64, utc_offset_secs: i32) -> Self {
        let local = unix_secs as i64 + utc_offset_secs as i64;
        let second_of_day = local.rem_euclid(SECONDS_PER_DAY as i64) as u32;
        Self {
            hour: (second_of_day / 3600) as u8,
            minute: (second_of_day / 60 % 60) as u8,
            second: (second_of_day % 60) as u8,
        }
    }

    pub const fn time_of_day(self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
        }
    }

    pub const fn seconds_since_midnight(self) -> u32 {
        self.time_of_day().minutes_since_midnight() * 60 + self.second as u32
    }
}

impl From<TimeOfDay> for LocalTime {
    fn from(time: TimeOfDay) -> Self {
        Self::new(time.hour, time.minute, 0)
    }
}

/// Ein täglicher Eintrag im Zeitplan: ab `time` soll `color` leuchten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub time: TimeOfDay,
    pub color: RGB8,
}

impl ScheduledAction {
    pub const fn new(hour: u8, minute: u8, color: RGB8) -> Self {
        Self {
            time: TimeOfDay { hour, minute },
            color,
        }
    }
}

/// Ergebnis einer Zeitplan-Auflösung (abgeleitet, nie gespeichert)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleResult {
    /// Farbe, die jetzt leuchten soll
    pub color: RGB8,
    /// Sekunden bis zum nächsten Eintrag
    pub seconds_until_next: u32,
}

/// Semantische Taster-Ereignisse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Kurzer Druck wurde losgelassen
    PressRelease,
    /// Taster länger als die Haltezeit gedrückt
    HoldStart,
    /// Taster wird weiter gehalten
    HoldRepeat,
    /// Gehaltener Taster wurde losgelassen
    HoldRelease,
}

/// Grund für das letzte Aufwachen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeCause {
    /// Kaltstart oder Reset, kein Schlaf vorher
    Reset,
    /// Flanke am Taster
    Button,
    /// Ladekabel eingesteckt
    PowerSense,
    /// Schlaf-Timer abgelaufen
    Timer,
    Other,
}

/// Parst "RRR:GGG:BBB" (Dezimalwerte 0-255)
///
/// ```
/// # use rgb::RGB8;
/// # use wake_core::types::parse_color;
/// assert_eq!(parse_color("060:048:038"), Ok(RGB8 { r: 60, g: 48, b: 38 }));
/// ```
pub fn parse_color(text: &str) -> Result<RGB8, ParseError> {
    let mut parts = clean(text).split(':');
    let mut channel = || -> Result<u8, ParseError> {
        let part = parts.next().ok_or(ParseError::Format)?;
        if part.is_empty() || part.len() > 3 {
            return Err(ParseError::Format);
        }
        u8::try_from(parse_number(part)?).map_err(|_| ParseError::OutOfRange)
    };
    let color = RGB8 {
        r: channel()?,
        g: channel()?,
        b: channel()?,
    };
    if parts.next().is_some() {
        return Err(ParseError::Format);
    }
    Ok(color)
}

pub fn format_color(color: RGB8) -> String<11> {
    let mut text = String::new();
    let _ = write!(text, "{:03}:{:03}:{:03}", color.r, color.g, color.b);
    text
}

fn clean(text: &str) -> &str {
    text.trim_end_matches('\0').trim()
}

fn parse_number(digits: &str) -> Result<u16, ParseError> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Format);
    }
    digits.parse::<u16>().map_err(|_| ParseError::OutOfRange)
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for ScheduledAction {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{=u8:02}:{=u8:02} R{=u8:03}|G{=u8:03}|B{=u8:03}",
            self.time.hour,
            self.time.minute,
            self.color.r,
            self.color.g,
            self.color.b
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ScheduleResult {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "R{=u8:03}|G{=u8:03}|B{=u8:03} next: {=u32}s",
            self.color.r,
            self.color.g,
            self.color.b,
            self.seconds_until_next
        )
    }
}
