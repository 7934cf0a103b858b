// WLAN-Steuerung zwischen Hauptschleife und connection_task
//
// Die Hauptschleife ist synchron und darf nicht warten. Sie setzt nur
// Befehle ab (Signal, der letzte gewinnt) und liest den Zustand aus Atomics,
// die der connection_task pflegt.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use wake_core::{Connectivity, Password, Ssid};

/// Befehl an den connection_task
pub enum WifiCommand {
    Connect { ssid: Ssid, password: Password },
    Disconnect,
}

pub(crate) static WIFI_COMMAND: Signal<CriticalSectionRawMutex, WifiCommand> = Signal::new();

/// Verbindung gewünscht (zwischen connect und disconnect)
pub(crate) static LINK_ACTIVE: AtomicBool = AtomicBool::new(false);
/// Mit dem Access Point verbunden
pub(crate) static LINK_UP: AtomicBool = AtomicBool::new(false);
/// Alle Verbindungsversuche fehlgeschlagen
pub(crate) static LINK_FAILED: AtomicBool = AtomicBool::new(false);

/// [`Connectivity`] für den ControlLoop
pub struct WifiLink;

impl Connectivity for WifiLink {
    fn is_connected(&self) -> bool {
        LINK_UP.load(Ordering::Acquire)
    }

    fn is_active(&self) -> bool {
        LINK_ACTIVE.load(Ordering::Acquire)
    }

    fn connect(&mut self, ssid: &str, password: &str) {
        let (Ok(ssid), Ok(password)) = (Ssid::try_from(ssid), Password::try_from(password)) else {
            warn!("WiFi: credentials too long, not connecting");
            return;
        };
        if ssid.is_empty() {
            // Ohne SSID kein Versuch, das zählt als Verbindungsfehler
            LINK_FAILED.store(true, Ordering::Release);
            return;
        }
        LINK_ACTIVE.store(true, Ordering::Release);
        WIFI_COMMAND.signal(WifiCommand::Connect { ssid, password });
    }

    fn disconnect(&mut self) {
        if LINK_ACTIVE.swap(false, Ordering::AcqRel) {
            info!("WiFi: disconnect requested");
            WIFI_COMMAND.signal(WifiCommand::Disconnect);
        }
    }
}
