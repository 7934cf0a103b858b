// BLE Konfigurationsmodus
//
// Hält nur den Zustand, den die Hauptschleife für die Schlaf-Entscheidung
// braucht. Der GATT-Server liest den Zustand über `BLE_CONFIG_MODE` und
// bildet seine Characteristics auf `wake_core::Attribute` ab.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use wake_core::BleControl;

/// Konfigurationsmodus aktiv (Advertising + GATT)
pub static BLE_CONFIG_MODE: AtomicBool = AtomicBool::new(false);

pub struct BleConfigMode;

impl BleControl for BleConfigMode {
    fn is_enabled(&self) -> bool {
        BLE_CONFIG_MODE.load(Ordering::Acquire)
    }

    fn start(&mut self) {
        if !BLE_CONFIG_MODE.swap(true, Ordering::AcqRel) {
            info!("BLE: config mode enabled");
        }
    }

    fn stop(&mut self) {
        if BLE_CONFIG_MODE.swap(false, Ordering::AcqRel) {
            info!("BLE: config mode disabled");
        }
    }
}
