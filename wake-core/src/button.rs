//! Taster-Zustandsautomat mit Entprellung und Halte-Erkennung
//!
//! Der Interrupt-Handler setzt nur Flags in [`ButtonSignal`]. Alle
//! Zustandswechsel passieren in [`Button::poll`] aus der Hauptschleife,
//! dadurch gibt es eine feste Reihenfolge aller Übergänge.
//!
//! ```text
//! Released ──fallende Flanke──▶ PressDebounce ──gedrückt──▶ Pressed ──Haltezeit──▶ Held
//!    ▲                              │ losgelassen              │ steigende Flanke      │
//!    │                              ▼                          ▼                       │
//!    └──────losgelassen────── ReleaseDebounce ◀────────────────┴───────────────────────┘
//! ```

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::traits::{Edge, EdgeInterrupt, InputPin};
use crate::types::ButtonEvent;

/// Kein Timer aktiv
const NEVER: u64 = u64::MAX;

const ARMED_NONE: u8 = 0;
const ARMED_FALLING: u8 = 1;
const ARMED_RISING: u8 = 2;

/// Zeiten für Entprellung und Halten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    pub debounce_ms: u32,
    /// 0 deaktiviert die Halte-Erkennung
    pub hold_ms: u32,
    /// 0 deaktiviert HoldRepeat
    pub hold_repeat_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 20,
            hold_ms: 5000,
            hold_repeat_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Released,
    PressDebounce,
    Pressed,
    Held,
    ReleaseDebounce,
}

/// Flags zwischen Interrupt-Kontext und Hauptschleife
///
/// Wird als `static` angelegt. Der Interrupt schreibt nur einzelne Flags,
/// gelesen und gelöscht werden sie ausschließlich in [`Button::poll`].
pub struct ButtonSignal {
    armed: AtomicU8,
    press_requested: AtomicBool,
    release_observed: AtomicBool,
}

impl ButtonSignal {
    pub const fn new() -> Self {
        Self {
            armed: AtomicU8::new(ARMED_NONE),
            press_requested: AtomicBool::new(false),
            release_observed: AtomicBool::new(false),
        }
    }

    /// Aufruf aus dem GPIO Interrupt-Handler
    ///
    /// Danach muss der Handler den Pin-Interrupt deaktivieren; die
    /// Hauptschleife schaltet ihn beim nächsten Zustandswechsel neu.
    pub fn on_interrupt(&self) {
        match self.armed.swap(ARMED_NONE, Ordering::AcqRel) {
            ARMED_FALLING => self.press_requested.store(true, Ordering::Release),
            ARMED_RISING => self.release_observed.store(true, Ordering::Release),
            _ => {}
        }
    }

    fn arm(&self, edge: Option<Edge>) {
        let armed = match edge {
            Some(Edge::Falling) => ARMED_FALLING,
            Some(Edge::Rising) => ARMED_RISING,
            None => ARMED_NONE,
        };
        self.armed.store(armed, Ordering::Release);
    }

    fn take_press(&self) -> bool {
        self.press_requested.swap(false, Ordering::AcqRel)
    }

    fn take_release(&self) -> bool {
        self.release_observed.swap(false, Ordering::AcqRel)
    }
}

impl Default for ButtonSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Active-low Taster an einem Eingang mit Flanken-Interrupt
pub struct Button<'a, P: InputPin + EdgeInterrupt> {
    pin: P,
    signal: &'a ButtonSignal,
    config: ButtonConfig,
    state: ButtonState,
    deadline_ms: u64,
}

impl<'a, P: InputPin + EdgeInterrupt> Button<'a, P> {
    /// Erstellt den Taster
    ///
    /// Mit `start_pressed` (Aufwachen durch den Taster) beginnt der Automat
    /// in `PressDebounce`, sonst in `Released`.
    pub fn new(
        pin: P,
        signal: &'a ButtonSignal,
        config: ButtonConfig,
        start_pressed: bool,
        now_ms: u64,
    ) -> Self {
        let mut button = Self {
            pin,
            signal,
            config,
            state: ButtonState::Released,
            deadline_ms: NEVER,
        };
        let initial = if start_pressed {
            ButtonState::PressDebounce
        } else {
            ButtonState::Released
        };
        button.enter(initial, now_ms);
        button
    }

    /// Wertet Interrupt-Flags und abgelaufene Timer aus
    ///
    /// Muss häufig aufgerufen werden (jeder Tick der Hauptschleife).
    pub fn poll(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        if self.signal.take_release() {
            match self.state {
                ButtonState::Pressed | ButtonState::Held => {
                    return self.enter(ButtonState::ReleaseDebounce, now_ms);
                }
                state => warn!("Button: release edge ignored in {}", state),
            }
        }

        if self.signal.take_press() {
            match self.state {
                ButtonState::Released => {
                    self.enter(ButtonState::PressDebounce, now_ms);
                }
                state => warn!("Button: press edge ignored in {}", state),
            }
        }

        if now_ms < self.deadline_ms {
            return None;
        }

        let pressed = self.pin.is_low();
        match self.state {
            ButtonState::Released => {
                warn!("Button: timer expired while released");
                self.deadline_ms = NEVER;
                None
            }
            ButtonState::PressDebounce => {
                if pressed {
                    self.enter(ButtonState::Pressed, now_ms)
                } else {
                    // Störimpuls, ignorieren
                    self.enter(ButtonState::Released, now_ms)
                }
            }
            ButtonState::Pressed => {
                if pressed {
                    self.enter(ButtonState::Held, now_ms)
                } else {
                    // Losgelassen ohne dass der Interrupt kam
                    self.enter(ButtonState::ReleaseDebounce, now_ms)
                }
            }
            ButtonState::Held => {
                if pressed {
                    self.deadline_ms = self
                        .deadline_ms
                        .saturating_add(self.config.hold_repeat_ms as u64);
                    Some(ButtonEvent::HoldRepeat)
                } else {
                    self.enter(ButtonState::ReleaseDebounce, now_ms)
                }
            }
            ButtonState::ReleaseDebounce => {
                if pressed {
                    // Erneut gedrückt: wie ein neuer Druck entprellen
                    self.enter(ButtonState::PressDebounce, now_ms)
                } else {
                    self.enter(ButtonState::Released, now_ms)
                }
            }
        }
    }

    /// Nach dem Aufwachen durch den Taster: Druck entprellen
    pub fn wake_pressed(&mut self, now_ms: u64) {
        // Die Flanke, die geweckt hat, ist damit verarbeitet
        self.signal.take_press();
        if self.state == ButtonState::Released {
            self.enter(ButtonState::PressDebounce, now_ms);
        }
    }

    /// `true` in jedem Zustand außer `Released`
    pub fn is_active(&self) -> bool {
        self.state != ButtonState::Released
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    fn enter(&mut self, state: ButtonState, now_ms: u64) -> Option<ButtonEvent> {
        let previous = self.state;
        let state = if is_valid_transition(previous, state) {
            state
        } else {
            warn!("Button: invalid transition {} -> {}", previous, state);
            ButtonState::Released
        };

        let debounce = self.config.debounce_ms as u64;
        let event = match state {
            ButtonState::Released => {
                self.deadline_ms = NEVER;
                self.arm(Some(Edge::Falling));
                None
            }
            ButtonState::PressDebounce => {
                self.arm(None);
                self.deadline_ms = now_ms + debounce;
                None
            }
            ButtonState::Pressed => {
                // Die Haltezeit zählt ab der Flanke, die Entprellung ist schon vorbei
                self.deadline_ms = match self.config.hold_ms {
                    0 => NEVER,
                    hold => now_ms + (hold as u64).saturating_sub(debounce),
                };
                self.arm(Some(Edge::Rising));
                None
            }
            ButtonState::Held => {
                self.deadline_ms = match self.config.hold_repeat_ms {
                    0 => NEVER,
                    repeat => now_ms + repeat as u64,
                };
                Some(ButtonEvent::HoldStart)
            }
            ButtonState::ReleaseDebounce => {
                self.arm(None);
                self.deadline_ms = now_ms + debounce;
                if previous == ButtonState::Held {
                    Some(ButtonEvent::HoldRelease)
                } else {
                    Some(ButtonEvent::PressRelease)
                }
            }
        };

        self.state = state;
        event
    }

    fn arm(&mut self, edge: Option<Edge>) {
        self.signal.arm(edge);
        match edge {
            Some(edge) => self.pin.listen(edge),
            None => self.pin.unlisten(),
        }
    }
}

fn is_valid_transition(from: ButtonState, to: ButtonState) -> bool {
    use ButtonState::*;
    matches!(
        (from, to),
        (_, Released)
            | (Released | ReleaseDebounce, PressDebounce)
            | (PressDebounce, Pressed)
            | (Pressed, Held)
            | (Pressed | Held, ReleaseDebounce)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_only_reports_armed_edge() {
        let signal = ButtonSignal::new();

        signal.on_interrupt();
        assert!(!signal.take_press());
        assert!(!signal.take_release());

        signal.arm(Some(Edge::Falling));
        signal.on_interrupt();
        assert!(signal.take_press());
        assert!(!signal.take_press());

        // Nach dem ersten Interrupt ist nichts mehr scharf
        signal.on_interrupt();
        assert!(!signal.take_press());

        signal.arm(Some(Edge::Rising));
        signal.on_interrupt();
        assert!(signal.take_release());
    }

    #[test]
    fn test_transition_table() {
        use ButtonState::*;
        assert!(is_valid_transition(Released, PressDebounce));
        assert!(is_valid_transition(Held, ReleaseDebounce));
        assert!(!is_valid_transition(Released, Held));
        assert!(!is_valid_transition(PressDebounce, Held));
        assert!(!is_valid_transition(Released, ReleaseDebounce));
    }
}
