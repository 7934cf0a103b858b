// Hardware Abstraction Layer (HAL) Module
//
// Adapter zwischen esp-hal Peripherie und den wake-core Traits.

pub mod button;
pub mod power;
pub mod pwm;
pub mod sleep;
pub mod status_led;
pub mod storage;

pub use button::{BUTTON_SIGNAL, ButtonInput};
pub use power::{BatteryMonitor, PowerSensePin};
pub use pwm::{LightChannel, light_channels};
pub use sleep::{LightSleep, RtcClock};
pub use status_led::StatusLed;
pub use storage::FlashConfigStore;
