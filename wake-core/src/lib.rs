//! Wake Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert die Traits für den Hardware-Zugriff und die komplette
//! Steuerungslogik des Lichts (Zeitplan, Fades, Taster, Power, Schlaf).

#![no_std]

// Muss als erstes Modul kommen, damit die Log-Makros überall verfügbar sind
#[macro_use]
mod fmt;

pub mod attributes;
pub mod button;
pub mod config;
pub mod control;
pub mod fade;
pub mod power;
pub mod schedule;
pub mod sntp;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use attributes::{AttError, Attribute};
pub use button::{Button, ButtonConfig, ButtonSignal, ButtonState};
pub use config::{AppConfig, CONFIG_VERSION, Password, Ssid};
pub use control::{ControlConfig, ControlLoop, Devices, Platform};
pub use fade::FadeEngine;
pub use power::{PowerReport, PowerSense};
pub use schedule::{Schedule, resolve};
pub use traits::{
    BatteryAdc, BleControl, Clock, ConfigStore, Connectivity, Edge, EdgeInterrupt, HwError,
    InputPin, PwmChannel, SleepControl, StatusIndicator, StoreError, TimeSource,
};
pub use types::{
    ButtonEvent, LIGHT_COLOR_OFF, LIGHT_COLOR_ON, LocalTime, ParseError, ScheduleResult,
    ScheduledAction, TimeOfDay, WakeCause,
};
