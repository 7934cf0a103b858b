// Licht-Ausgänge: drei LEDC Kanäle mit 8-Bit Duty an einem gemeinsamen Timer

use core::sync::atomic::{AtomicU8, Ordering};

use esp_hal::gpio::AnyPin;
use esp_hal::ledc::channel::{self, ChannelHW, ChannelIFace};
use esp_hal::ledc::timer::{self, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::peripherals::LEDC;
use esp_hal::time::Rate;
use static_cell::StaticCell;
use wake_core::{HwError, PwmChannel};

use crate::config::PWM_FREQUENCY_KHZ;

/// Der Timer muss die Kanäle überleben
static LIGHT_TIMER: StaticCell<timer::Timer<'static, LowSpeed>> = StaticCell::new();

/// Ein Bit pro Kanal mit Duty > 0
static LIT_CHANNELS: AtomicU8 = AtomicU8::new(0);

/// `true` solange mindestens ein Kanal leuchtet
///
/// LEDC läuft am APB-Takt und steht im Light Sleep still.
pub fn is_lit() -> bool {
    LIT_CHANNELS.load(Ordering::Acquire) != 0
}

/// Ein Farbkanal des Lichts
pub struct LightChannel {
    channel: channel::Channel<'static, LowSpeed>,
    mask: u8,
}

impl PwmChannel for LightChannel {
    fn set_duty(&mut self, duty: u8) -> Result<(), HwError> {
        // Duty8Bit: Rohwert 0..=255 direkt ins Register
        self.channel.set_duty_hw(duty as u32);
        if duty > 0 {
            LIT_CHANNELS.fetch_or(self.mask, Ordering::AcqRel);
        } else {
            LIT_CHANNELS.fetch_and(!self.mask, Ordering::AcqRel);
        }
        Ok(())
    }
}

/// Richtet LEDC ein und liefert die Kanäle R, G, B (alle aus)
pub fn light_channels(
    ledc: LEDC<'static>,
    red: AnyPin<'static>,
    green: AnyPin<'static>,
    blue: AnyPin<'static>,
) -> Result<[LightChannel; 3], HwError> {
    let mut ledc = Ledc::new(ledc);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

    let timer = LIGHT_TIMER.init(ledc.timer::<LowSpeed>(timer::Number::Timer0));
    timer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty8Bit,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_khz(PWM_FREQUENCY_KHZ),
        })
        .map_err(|_| HwError::WriteFailed)?;
    let timer: &'static timer::Timer<'static, LowSpeed> = timer;

    Ok([
        light_channel(&ledc, timer, channel::Number::Channel0, red)?,
        light_channel(&ledc, timer, channel::Number::Channel1, green)?,
        light_channel(&ledc, timer, channel::Number::Channel2, blue)?,
    ])
}

fn light_channel(
    ledc: &Ledc<'static>,
    timer: &'static timer::Timer<'static, LowSpeed>,
    number: channel::Number,
    pin: AnyPin<'static>,
) -> Result<LightChannel, HwError> {
    let mask = 1 << (number as u8);
    let mut channel = ledc.channel(number, pin);
    channel
        .configure(channel::config::Config {
            timer,
            duty_pct: 0,
            pin_config: channel::config::PinConfig::PushPull,
        })
        .map_err(|_| HwError::WriteFailed)?;
    Ok(LightChannel { channel, mask })
}
