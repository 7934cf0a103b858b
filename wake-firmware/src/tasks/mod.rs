// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig. Die Hauptschleife (control)
// spricht mit WLAN und SNTP nur über Statics in `net` und `time`.

pub mod control;
pub mod sntp;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use control::{FirmwareControl, FirmwarePlatform, control_task};
pub use sntp::sntp_task;
pub use wifi::{connection_task, dhcp_task, net_task};
