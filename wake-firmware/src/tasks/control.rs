// Control Task - Führt den ControlLoop im festen Takt aus
use defmt::info;
use embassy_time::{Duration, Timer};
use wake_core::{ControlLoop, Platform};

use crate::ble::BleConfigMode;
use crate::config::{SLEEP_SETTLE_MS, TICK_MS};
use crate::hal::{
    BatteryMonitor, ButtonInput, FlashConfigStore, LightChannel, LightSleep, PowerSensePin,
    RtcClock, StatusLed,
};
use crate::net::WifiLink;
use crate::time::NetworkClock;

/// Konkrete Typen der ESP32-C6 Hardware
pub struct FirmwarePlatform;

impl Platform for FirmwarePlatform {
    type Clock = RtcClock;
    type ButtonPin = ButtonInput;
    type PowerPin = PowerSensePin;
    type Battery = BatteryMonitor;
    type Pwm = LightChannel;
    type Indicator = StatusLed;
    type Time = NetworkClock;
    type Network = WifiLink;
    type Ble = BleConfigMode;
    type Store = FlashConfigStore;
    type Sleeper = LightSleep;
}

pub type FirmwareControl = ControlLoop<'static, FirmwarePlatform>;

/// Control Task
///
/// Ruft alle TICK_MS den ControlLoop auf. Liefert der Tick eine
/// Schlafdauer, werden WLAN, BLE und Status-LED abgeschaltet und nach
/// SLEEP_SETTLE_MS geschlafen. `enter_sleep` prüft vorher nochmal, ob
/// in der Zwischenzeit etwas passiert ist.
#[embassy_executor::task]
pub async fn control_task(mut control: FirmwareControl) {
    info!("Control: task started");

    loop {
        if control.tick() > 0 {
            control.prepare_sleep();
            Timer::after(Duration::from_millis(SLEEP_SETTLE_MS)).await;
            control.enter_sleep();
            continue;
        }
        Timer::after(Duration::from_millis(TICK_MS)).await;
    }
}
