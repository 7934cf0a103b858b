// RTC: monotone Uhr und Light Sleep
//
// Die RTC läuft im Schlaf weiter, deshalb basiert die Uhr der Hauptschleife
// auf ihr und nicht auf dem Embassy-Timer. Die Rtc liegt in einem Mutex und
// wird für die Dauer des Schlafs herausgenommen.

use core::cell::RefCell;

use critical_section::Mutex;
use defmt::{Debug2Format, debug, error};
use esp_hal::delay::Delay;
use esp_hal::rtc_cntl::sleep::{GpioWakeupSource, TimerWakeupSource};
use esp_hal::rtc_cntl::{Rtc, SleepSource, wakeup_cause};
use wake_core::{Clock, SleepControl, WakeCause};

use crate::config::TICK_MS;
use crate::hal::{button, power, pwm};

static RTC: Mutex<RefCell<Option<Rtc<'static>>>> = Mutex::new(RefCell::new(None));

/// Übernimmt die RTC, vor dem ersten Zugriff auf [`RtcClock`] aufrufen
pub fn init(rtc: Rtc<'static>) {
    critical_section::with(|cs| RTC.borrow_ref_mut(cs).replace(rtc));
}

/// Millisekunden seit dem Einschalten (läuft im Light Sleep weiter)
#[derive(Clone, Copy)]
pub struct RtcClock;

impl Clock for RtcClock {
    fn now_ms(&self) -> u64 {
        critical_section::with(|cs| {
            RTC.borrow_ref(cs)
                .as_ref()
                .map_or(0, |rtc| rtc.time_since_power_up().as_millis())
        })
    }
}

/// Startzustand nach dem Reset
///
/// Ein beim Booten gedrückter Taster zählt wie ein Aufwachen durch den
/// Taster, damit der Druck nicht verloren geht.
pub fn boot_cause() -> WakeCause {
    if button::is_pressed() {
        WakeCause::Button
    } else {
        WakeCause::Reset
    }
}

/// Light Sleep mit Taster, Power-Sense und Timer als Aufweck-Quellen
///
/// Leuchtet das Licht, bleibt die CPU wach (LEDC braucht den APB-Takt) und
/// fragt die Aufweck-Pins im Takt der Hauptschleife ab.
pub struct LightSleep;

impl SleepControl for LightSleep {
    fn sleep(&mut self, duration_ms: u64) -> WakeCause {
        if pwm::is_lit() {
            return idle(duration_ms);
        }

        let Some(mut rtc) = critical_section::with(|cs| RTC.borrow_ref_mut(cs).take()) else {
            error!("Sleep: RTC not initialized");
            return WakeCause::Other;
        };

        button::enable_wakeup(true);
        power::enable_wakeup(true);

        let timer = TimerWakeupSource::new(core::time::Duration::from_millis(duration_ms));
        let gpio = GpioWakeupSource::new();
        rtc.sleep_light(&[&timer, &gpio]);

        button::enable_wakeup(false);
        power::enable_wakeup(false);
        critical_section::with(|cs| RTC.borrow_ref_mut(cs).replace(rtc));

        let source = wakeup_cause();
        debug!("Sleep: wakeup source {}", Debug2Format(&source));
        match source {
            SleepSource::Timer => WakeCause::Timer,
            // Beide Pins teilen sich die GPIO-Quelle. Ein kurzer Druck kann
            // schon vorbei sein, deshalb zählt nur das Netzteil als Gegenprobe.
            SleepSource::Gpio if power::is_powered() && !button::is_pressed() => {
                WakeCause::PowerSense
            }
            SleepSource::Gpio => WakeCause::Button,
            _ => WakeCause::Other,
        }
    }
}

/// Wartet ohne Light Sleep bis Timer, Taster oder Netzteil
fn idle(duration_ms: u64) -> WakeCause {
    debug!("Sleep: light is on, idling instead");
    let delay = Delay::new();
    let deadline = RtcClock.now_ms() + duration_ms;
    loop {
        if button::is_pressed() {
            return WakeCause::Button;
        }
        if power::is_powered() {
            return WakeCause::PowerSense;
        }
        if RtcClock.now_ms() >= deadline {
            return WakeCause::Timer;
        }
        delay.delay_millis(TICK_MS as u32);
    }
}
