//! Power Sense - Ladekabel-Erkennung und Batteriespannung
//!
//! Der Power-Sense Pin ist high solange das Ladekabel steckt. Ein Wechsel
//! nach "unpowered" wird erst nach 1 s durchgehend low gemeldet, ein
//! Wechsel nach "powered" sofort. Das entprellt wackelnde Kabel.

use crate::traits::{BatteryAdc, InputPin};

pub const POWER_LOW_DELAY_MS: u64 = 1000;
pub const VOLTAGE_SAMPLE_INTERVAL_MS: u64 = 1000;
pub const STATE_REPORT_INTERVAL_MS: u64 = 60 * 1000;

// Spannungsteiler vor dem ADC-Pin (kOhm)
const UPPER_DIVIDER: u32 = 442;
const LOWER_DIVIDER: u32 = 160;

/// Telemetrie-Eintrag
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerReport {
    pub powered: bool,
    pub battery_volts: f32,
}

pub struct PowerSense<P: InputPin, A: BatteryAdc> {
    pin: P,
    adc: A,
    low_since_ms: Option<u64>,
    next_sample_ms: u64,
    last_volts: f32,
    next_report_ms: u64,
    last_reported: Option<bool>,
}

impl<P: InputPin, A: BatteryAdc> PowerSense<P, A> {
    pub fn new(pin: P, adc: A) -> Self {
        Self {
            pin,
            adc,
            low_since_ms: None,
            next_sample_ms: 0,
            last_volts: 0.0,
            next_report_ms: 0,
            last_reported: None,
        }
    }

    /// Entprellter Power-Status (langsam nach aus, schnell nach an)
    pub fn is_powered(&mut self, now_ms: u64) -> bool {
        if self.pin.is_high() {
            self.low_since_ms = None;
            return true;
        }

        let low_since = *self.low_since_ms.get_or_insert(now_ms);
        now_ms - low_since <= POWER_LOW_DELAY_MS
    }

    /// Batteriespannung in Volt, höchstens einmal pro Sekunde gemessen
    pub fn battery_volts(&mut self, now_ms: u64) -> f32 {
        if now_ms >= self.next_sample_ms {
            self.next_sample_ms = now_ms + VOLTAGE_SAMPLE_INTERVAL_MS;
            match self.adc.read_millivolts() {
                Ok(pin_mv) => {
                    let battery_mv = pin_mv * (LOWER_DIVIDER + UPPER_DIVIDER) / LOWER_DIVIDER;
                    self.last_volts = battery_mv as f32 / 1000.0;
                }
                Err(e) => warn!("Power: battery read failed: {}", e),
            }
        }
        self.last_volts
    }

    /// Telemetrie: einmal pro Minute oder sofort bei Statuswechsel
    pub fn report(&mut self, now_ms: u64) -> Option<PowerReport> {
        let powered = self.is_powered(now_ms);
        if self.last_reported == Some(powered) && now_ms < self.next_report_ms {
            return None;
        }

        self.last_reported = Some(powered);
        self.next_report_ms = now_ms + STATE_REPORT_INTERVAL_MS;
        Some(PowerReport {
            powered,
            battery_volts: self.battery_volts(now_ms),
        })
    }
}
