// Status-LED: einzelne APA102 ("Dotstar") per Bit-Banging
//
// Frame: 4x 0x00 (Start), 0xFF (volle globale Helligkeit), B, G, R, 0xFF (Ende).
// Die LED hat einen eigenen Versorgungs-Pin und wird vor dem Schlaf
// komplett abgeschaltet.

use esp_hal::gpio::{Level, Output};
use rgb::RGB8;
use wake_core::StatusIndicator;

pub struct StatusLed {
    data: Output<'static>,
    clock: Output<'static>,
    power: Output<'static>,
    powered: bool,
    /// Zuletzt geschriebene Farbe, `None` nach dem Einschalten
    shown: Option<RGB8>,
}

impl StatusLed {
    /// Alle Pins müssen als Ausgang mit Low-Pegel übergeben werden
    pub fn new(data: Output<'static>, clock: Output<'static>, power: Output<'static>) -> Self {
        Self {
            data,
            clock,
            power,
            powered: false,
            shown: None,
        }
    }

    fn write_frame(&mut self, color: RGB8) {
        for _ in 0..4 {
            self.write_byte(0x00);
        }
        self.write_byte(0xFF);
        self.write_byte(color.b);
        self.write_byte(color.g);
        self.write_byte(color.r);
        self.write_byte(0xFF);
    }

    fn write_byte(&mut self, byte: u8) {
        for bit in (0..8).rev() {
            self.data.set_level(Level::from(byte & (1 << bit) != 0));
            self.clock.set_high();
            self.clock.set_low();
        }
    }
}

impl StatusIndicator for StatusLed {
    fn set_power(&mut self, on: bool) {
        if on == self.powered {
            return;
        }
        self.power.set_level(Level::from(on));
        self.powered = on;
        // Nach dem Einschalten ist der Zustand der LED unbekannt
        self.shown = None;
        if !on {
            self.data.set_low();
            self.clock.set_low();
        }
    }

    fn set_color(&mut self, color: RGB8) {
        if !self.powered || self.shown == Some(color) {
            return;
        }
        self.write_frame(color);
        self.shown = Some(color);
    }
}
