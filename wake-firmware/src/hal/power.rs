// Netzteil-Erkennung (GPIO5) und Batterie-Spannung (ADC1, GPIO2)

use core::cell::RefCell;

use critical_section::Mutex;
use defmt::{Debug2Format, warn};
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcCalCurve, AdcConfig, AdcPin, Attenuation};
use esp_hal::gpio::{Input, WakeEvent};
use esp_hal::peripherals::{ADC1, GPIO2};
use wake_core::{BatteryAdc, HwError, InputPin};

static POWER_SENSE: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));

/// Power-Sense Eingang, high solange das Netzteil steckt
///
/// Liegt wie der Taster in einem Mutex, weil die Schlaf-Logik den Pin als
/// Aufweck-Quelle konfiguriert.
pub struct PowerSensePin;

impl PowerSensePin {
    pub fn init(input: Input<'static>) -> Self {
        critical_section::with(|cs| POWER_SENSE.borrow_ref_mut(cs).replace(input));
        Self
    }
}

impl InputPin for PowerSensePin {
    fn is_high(&mut self) -> bool {
        is_powered()
    }
}

pub fn is_powered() -> bool {
    critical_section::with(|cs| {
        POWER_SENSE
            .borrow_ref_mut(cs)
            .as_mut()
            .is_some_and(|input| input.is_high())
    })
}

/// Aufwachen sobald das Netzteil eingesteckt wird
pub fn enable_wakeup(enable: bool) {
    critical_section::with(|cs| {
        if let Some(input) = POWER_SENSE.borrow_ref_mut(cs).as_mut() {
            if let Err(e) = input.wakeup_enable(enable, WakeEvent::HighLevel) {
                warn!("Power: wakeup config failed: {}", Debug2Format(&e));
            }
        }
    });
}

/// Batterie-ADC mit Kurven-Kalibrierung, liefert mV am Pin
pub struct BatteryMonitor {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO2<'static>, ADC1<'static>, AdcCalCurve<ADC1<'static>>>,
}

impl BatteryMonitor {
    pub fn new(adc: ADC1<'static>, pin: GPIO2<'static>) -> Self {
        let mut config = AdcConfig::new();
        // 11 dB: Messbereich bis ca. 2.5 V hinter dem Spannungsteiler
        let pin = config.enable_pin_with_cal::<_, AdcCalCurve<ADC1<'static>>>(pin, Attenuation::_11dB);
        Self {
            adc: Adc::new(adc, config),
            pin,
        }
    }
}

impl BatteryAdc for BatteryMonitor {
    fn read_millivolts(&mut self) -> Result<u32, HwError> {
        nb::block!(self.adc.read_oneshot(&mut self.pin))
            .map(u32::from)
            .map_err(|_| HwError::ReadFailed)
    }
}
