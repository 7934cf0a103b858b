// Taster an GPIO4 mit Flanken-Interrupt
//
// Der Eingang liegt in einem critical-section Mutex, weil Interrupt-Handler,
// Hauptschleife und Schlaf-Logik auf ihn zugreifen. Der Handler meldet nur
// an BUTTON_SIGNAL; ausgewertet wird im wake-core Zustandsautomaten.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;
use defmt::{Debug2Format, warn};
use esp_hal::gpio::{Event, Input, WakeEvent};
use esp_hal::{handler, ram};
use wake_core::{ButtonSignal, Edge, EdgeInterrupt, InputPin};

/// Flags zwischen Interrupt und Hauptschleife
pub static BUTTON_SIGNAL: ButtonSignal = ButtonSignal::new();

static BUTTON: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));

const EDGE_NONE: u8 = 0;
const EDGE_FALLING: u8 = 1;
const EDGE_RISING: u8 = 2;

/// Zuletzt scharf geschaltete Flanke, wird nach dem Schlaf wiederhergestellt
static LISTEN_EDGE: AtomicU8 = AtomicU8::new(EDGE_NONE);

/// GPIO Interrupt-Handler (über `Io::set_interrupt_handler` registriert)
#[handler]
#[ram]
pub fn button_interrupt() {
    critical_section::with(|cs| {
        if let Some(input) = BUTTON.borrow_ref_mut(cs).as_mut() {
            if input.is_interrupt_set() {
                // Nur eine Flanke pro Zustand, die Hauptschleife schaltet neu
                input.unlisten();
                input.clear_interrupt();
                BUTTON_SIGNAL.on_interrupt();
            }
        }
    });
}

/// Zugriff auf den Taster für den wake-core `Button`
pub struct ButtonInput;

impl ButtonInput {
    /// Übernimmt den Eingang (Pull-Up, active-low)
    pub fn init(input: Input<'static>) -> Self {
        critical_section::with(|cs| BUTTON.borrow_ref_mut(cs).replace(input));
        Self
    }
}

impl InputPin for ButtonInput {
    fn is_high(&mut self) -> bool {
        !is_pressed()
    }
}

impl EdgeInterrupt for ButtonInput {
    fn listen(&mut self, edge: Edge) {
        let code = match edge {
            Edge::Falling => EDGE_FALLING,
            Edge::Rising => EDGE_RISING,
        };
        LISTEN_EDGE.store(code, Ordering::Release);
        apply_edge(code);
    }

    fn unlisten(&mut self) {
        LISTEN_EDGE.store(EDGE_NONE, Ordering::Release);
        apply_edge(EDGE_NONE);
    }
}

/// `true` solange der Taster gedrückt ist
pub fn is_pressed() -> bool {
    critical_section::with(|cs| {
        BUTTON
            .borrow_ref_mut(cs)
            .as_mut()
            .is_some_and(|input| input.is_low())
    })
}

/// Low-Pegel als Aufweck-Quelle scharf schalten bzw. wieder lösen
///
/// Pegel-Wakeup und Flanken-Interrupt teilen sich die Pin-Konfiguration.
/// Vor dem Schlaf wird der Interrupt deshalb abgeschaltet und danach die
/// zuletzt gewünschte Flanke wiederhergestellt.
pub fn enable_wakeup(enable: bool) {
    critical_section::with(|cs| {
        if let Some(input) = BUTTON.borrow_ref_mut(cs).as_mut() {
            if enable {
                input.unlisten();
            }
            if let Err(e) = input.wakeup_enable(enable, WakeEvent::LowLevel) {
                warn!("Button: wakeup config failed: {}", Debug2Format(&e));
            }
            input.clear_interrupt();
        }
    });
    if !enable {
        apply_edge(LISTEN_EDGE.load(Ordering::Acquire));
    }
}

fn apply_edge(code: u8) {
    critical_section::with(|cs| {
        if let Some(input) = BUTTON.borrow_ref_mut(cs).as_mut() {
            input.clear_interrupt();
            match code {
                EDGE_FALLING => input.listen(Event::FallingEdge),
                EDGE_RISING => input.listen(Event::RisingEdge),
                _ => input.unlisten(),
            }
        }
    });
}
