//! Hauptschleife und Schlaf-Entscheidung
//!
//! [`ControlLoop`] besitzt alle Komponenten (Taster, Fade Engine, Power
//! Sense, Zeitplan) und die externen Dienste. Die Firmware ruft
//! [`ControlLoop::tick`] im festen Takt auf; liefert der Tick eine
//! Schlafdauer > 0, darf das Gerät schlafen.

use rgb::RGB8;

use crate::attributes::{self, ACTION_TIME_SLOTS, AttError, Attribute};
use crate::button::{Button, ButtonConfig, ButtonSignal};
use crate::config::{self, AppConfig, Password, Ssid};
use crate::fade::FadeEngine;
use crate::power::PowerSense;
use crate::schedule::Schedule;
use crate::traits::{
    BatteryAdc, BleControl, Clock, ConfigStore, Connectivity, EdgeInterrupt, InputPin,
    PwmChannel, SleepControl, StatusIndicator, StoreError, TimeSource,
};
use crate::types::{
    ButtonEvent, ScheduledAction, TimeOfDay, WakeCause, format_color, parse_color,
};

/// Status-LED: Netzteil + WLAN verbunden
pub const STATUS_CONNECTED: RGB8 = RGB8 { r: 0, g: 10, b: 0 };
/// Status-LED: Netzteil, aber keine Verbindung
pub const STATUS_POWERED: RGB8 = RGB8 { r: 0, g: 0, b: 10 };
/// Status-LED: Batteriebetrieb
pub const STATUS_UNPOWERED: RGB8 = RGB8 { r: 10, g: 0, b: 0 };

/// Bündelt die konkreten Typen einer Plattform
///
/// Production: `FirmwarePlatform` in der Firmware, Tests: `MockPlatform`.
pub trait Platform {
    type Clock: Clock;
    type ButtonPin: InputPin + EdgeInterrupt;
    type PowerPin: InputPin;
    type Battery: BatteryAdc;
    type Pwm: PwmChannel;
    type Indicator: StatusIndicator;
    type Time: TimeSource;
    type Network: Connectivity;
    type Ble: BleControl;
    type Store: ConfigStore;
    type Sleeper: SleepControl;
}

/// Alle Geräte, die der [`ControlLoop`] übernimmt
pub struct Devices<P: Platform> {
    pub clock: P::Clock,
    pub button: P::ButtonPin,
    pub power_sense: P::PowerPin,
    pub battery: P::Battery,
    /// R, G, B
    pub pwm: [P::Pwm; 3],
    pub indicator: P::Indicator,
    pub time: P::Time,
    pub network: P::Network,
    pub ble: P::Ble,
    pub store: P::Store,
    pub sleeper: P::Sleeper,
}

/// Einstellbare Zeiten der Hauptschleife
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    pub button: ButtonConfig,
    /// Fade-Geschwindigkeit bei Zeitplan-Wechseln (ms pro Duty-Schritt)
    pub schedule_fade_ms_per_step: u32,
    /// Fade-Geschwindigkeit beim Umschalten per Taster oder BLE
    pub button_fade_ms_per_step: u32,
    /// Schlafdauer wenn Verbindung oder Zeit-Sync dauerhaft fehlschlagen
    pub error_retry_sleep_ms: u64,
    /// Neuer Versuch wenn die Uhr noch nicht gestellt ist
    pub time_retry_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            button: ButtonConfig::default(),
            schedule_fade_ms_per_step: 20,
            button_fade_ms_per_step: 4,
            error_retry_sleep_ms: 5 * 60 * 1000,
            time_retry_ms: 1000,
        }
    }
}

pub struct ControlLoop<'a, P: Platform> {
    clock: P::Clock,
    time: P::Time,
    network: P::Network,
    ble: P::Ble,
    store: P::Store,
    sleeper: P::Sleeper,
    indicator: P::Indicator,
    button: Button<'a, P::ButtonPin>,
    light: FadeEngine<P::Pwm>,
    power: PowerSense<P::PowerPin, P::Battery>,
    config: AppConfig,
    settings: ControlConfig,
    /// `None` erzwingt eine Prüfung im nächsten Tick
    next_schedule_check_ms: Option<u64>,
    last_schedule_color: Option<RGB8>,
    time_valid: bool,
}

impl<'a, P: Platform> ControlLoop<'a, P> {
    /// Lädt die Konfiguration und initialisiert alle Komponenten
    ///
    /// `wake` entscheidet über den Startzustand des Tasters, `initial` ist
    /// die Farbe, die sofort ausgegeben wird.
    pub fn new(
        devices: Devices<P>,
        signal: &'a ButtonSignal,
        settings: ControlConfig,
        defaults: &AppConfig,
        wake: WakeCause,
        initial: RGB8,
    ) -> Self {
        let Devices {
            clock,
            button,
            power_sense,
            battery,
            pwm,
            indicator,
            time,
            network,
            ble,
            mut store,
            sleeper,
        } = devices;

        let now = clock.now_ms();
        let config = config::load_or_init(&mut store, defaults);
        info!("Control: started, wake cause {}", wake);

        Self {
            button: Button::new(
                button,
                signal,
                settings.button,
                wake == WakeCause::Button,
                now,
            ),
            light: FadeEngine::new(pwm, initial),
            power: PowerSense::new(power_sense, battery),
            clock,
            time,
            network,
            ble,
            store,
            sleeper,
            indicator,
            config,
            settings,
            next_schedule_check_ms: None,
            last_schedule_color: None,
            time_valid: false,
        }
    }

    /// Ein Durchlauf der Hauptschleife
    ///
    /// Gibt die erlaubte Schlafdauer in ms zurück, 0 = wach bleiben.
    pub fn tick(&mut self) -> u64 {
        let now = self.clock.now_ms();

        if let Some(report) = self.power.report(now) {
            info!(
                "Power: powered={} battery={}V",
                report.powered, report.battery_volts
            );
        }

        self.update_schedule(now);
        self.light.tick(now);

        if let Some(event) = self.button.poll(now) {
            self.handle_button(event, now);
        }

        if self.power.is_powered(now) {
            let status = if self.network.is_connected() {
                STATUS_CONNECTED
            } else {
                STATUS_POWERED
            };
            self.indicator.set_power(true);
            self.indicator.set_color(status);

            if !self.network.is_active() {
                info!("Control: starting network");
                self.network
                    .connect(&self.config.wifi_ssid, &self.config.wifi_password);
            }
            return 0;
        }

        self.indicator.set_power(true);
        self.indicator.set_color(STATUS_UNPOWERED);
        self.sleep_duration(now)
    }

    /// Wie lange darf geschlafen werden? 0 = gar nicht
    pub fn sleep_duration(&mut self, now_ms: u64) -> u64 {
        if self.power.is_powered(now_ms)
            || self.button.is_active()
            || self.light.is_fading()
            || self.ble.is_enabled()
        {
            return 0;
        }

        let Some(deadline) = self.next_schedule_check_ms else {
            return 0;
        };
        let until_next = deadline.saturating_sub(now_ms);

        if self.time.has_error() {
            if self.time_valid {
                until_next.min(self.settings.error_retry_sleep_ms)
            } else {
                self.settings.error_retry_sleep_ms
            }
        } else {
            until_next
        }
    }

    /// Stromfresser abschalten, vor [`Self::enter_sleep`] aufrufen
    pub fn prepare_sleep(&mut self) {
        self.indicator.set_power(false);
        self.ble.stop();
        self.network.disconnect();
    }

    /// Prüft nochmal und schläft dann
    ///
    /// Gibt `None` zurück wenn in der Zwischenzeit etwas passiert ist
    /// (z.B. eine späte Taster-Flanke), sonst den Aufweck-Grund.
    pub fn enter_sleep(&mut self) -> Option<WakeCause> {
        let now = self.clock.now_ms();
        if let Some(event) = self.button.poll(now) {
            self.handle_button(event, now);
        }

        let duration = self.sleep_duration(now);
        if duration == 0 {
            debug!("Sleep: aborted");
            return None;
        }

        info!("Sleep: {} ms", duration);
        let cause = self.sleeper.sleep(duration);
        info!("Sleep: woke up, cause {}", cause);
        self.on_wake(cause);
        Some(cause)
    }

    /// Zustand nach dem Aufwachen neu aufsetzen
    pub fn on_wake(&mut self, cause: WakeCause) {
        let now = self.clock.now_ms();
        if cause == WakeCause::Button {
            self.button.wake_pressed(now);
        }
        self.next_schedule_check_ms = None;
    }

    /// Tick plus Schlaf (ohne Wartezeit dazwischen)
    pub fn run_once(&mut self) -> Option<WakeCause> {
        if self.tick() == 0 {
            return None;
        }
        self.prepare_sleep();
        self.enter_sleep()
    }

    fn update_schedule(&mut self, now_ms: u64) {
        let clock_updated = self.time.poll_clock_updated();
        let due = self.next_schedule_check_ms.is_none_or(|deadline| now_ms >= deadline);
        if !due && !clock_updated {
            return;
        }

        let Some(local) = self.time.local_time() else {
            self.time_valid = false;
            self.next_schedule_check_ms = Some(now_ms + self.settings.time_retry_ms);
            return;
        };
        self.time_valid = true;

        let result = self.config.schedule.resolve(local);
        info!(
            "Schedule: {}:{} R{}|G{}|B{} next: {}",
            local.hour,
            local.minute,
            result.color.r,
            result.color.g,
            result.color.b,
            result.seconds_until_next
        );
        self.next_schedule_check_ms = Some(now_ms + result.seconds_until_next as u64 * 1000);

        if self.last_schedule_color != Some(result.color) {
            self.last_schedule_color = Some(result.color);
            self.light
                .set_color(result.color, self.settings.schedule_fade_ms_per_step, now_ms);
        }
    }

    fn handle_button(&mut self, event: ButtonEvent, now_ms: u64) {
        debug!("Button: {}", event);
        match event {
            ButtonEvent::PressRelease => {
                self.light
                    .toggle(self.settings.button_fade_ms_per_step, now_ms);
            }
            ButtonEvent::HoldStart => {
                if self.ble.is_enabled() {
                    info!("Control: leaving BLE config mode");
                    self.ble.stop();
                } else {
                    info!("Control: entering BLE config mode");
                    self.ble.start();
                }
            }
            ButtonEvent::HoldRepeat | ButtonEvent::HoldRelease => {}
        }
    }

    // ========================================================================
    // Konfiguration
    // ========================================================================

    pub fn schedule(&self) -> &Schedule {
        &self.config.schedule
    }

    /// Ersetzt den Zeitplan, speichert ihn und prüft sofort neu
    pub fn set_schedule(&mut self, schedule: Schedule) -> Result<(), StoreError> {
        self.config.schedule = schedule;
        self.next_schedule_check_ms = None;
        config::save(&mut self.store, &self.config)
    }

    pub fn wifi_ssid(&self) -> &str {
        &self.config.wifi_ssid
    }

    /// Neue Zugangsdaten speichern, eine aktive Verbindung wird neu aufgebaut
    pub fn set_credentials(&mut self, ssid: Ssid, password: Password) -> Result<(), StoreError> {
        self.config.wifi_ssid = ssid;
        self.config.wifi_password = password;
        let saved = config::save(&mut self.store, &self.config);

        if self.network.is_active() {
            info!("Control: restarting network with new credentials");
            self.network.disconnect();
            self.network
                .connect(&self.config.wifi_ssid, &self.config.wifi_password);
        }
        saved
    }

    /// Zielfarbe des Lichts
    pub fn light_color(&self) -> RGB8 {
        self.light.color()
    }

    /// Aktuell ausgegebene Farbe
    pub fn light_duty(&self) -> RGB8 {
        self.light.current_duty()
    }

    pub fn is_fading(&self) -> bool {
        self.light.is_fading()
    }

    pub fn button_active(&self) -> bool {
        self.button.is_active()
    }

    // ========================================================================
    // BLE Attribute
    // ========================================================================

    /// Schreibt den Wert von `attr` nach `buf`, gibt die Länge zurück
    pub fn read_attribute(&self, attr: Attribute, buf: &mut [u8]) -> Result<usize, AttError> {
        if !attr.readable() {
            return Err(AttError::ReadNotPermitted);
        }

        match attr {
            Attribute::WifiSsid => attributes::copy_out(&self.config.wifi_ssid, buf),
            Attribute::LightColor => attributes::copy_out(&format_color(self.light.color()), buf),
            Attribute::ActionTime(slot) => {
                let action = self.action_slot(slot)?;
                attributes::copy_out(&action.time.format_hhmm(), buf)
            }
            Attribute::WifiPassword | Attribute::Clock => Err(AttError::ReadNotPermitted),
        }
    }

    /// Übernimmt einen geschriebenen Wert
    ///
    /// Ungültige Werte ändern nichts. Schlägt nur das Speichern fehl, bleibt
    /// der neue Wert im RAM aktiv und es wird `Unlikely` gemeldet.
    pub fn write_attribute(&mut self, attr: Attribute, data: &[u8]) -> Result<(), AttError> {
        self.apply_write(attr, data)
            .inspect_err(|e| warn!("Control: write to {} rejected: {}", attr, e))
    }

    fn apply_write(&mut self, attr: Attribute, data: &[u8]) -> Result<(), AttError> {
        if !attr.writable() {
            return Err(AttError::WriteNotPermitted);
        }
        let text = attributes::value_text(attr, data)?;
        let now = self.clock.now_ms();

        let result = match attr {
            Attribute::WifiSsid => {
                let ssid = Ssid::try_from(text).map_err(|_| AttError::InvalidLength)?;
                let password = self.config.wifi_password.clone();
                self.set_credentials(ssid, password)
            }
            Attribute::WifiPassword => {
                let password = Password::try_from(text).map_err(|_| AttError::InvalidLength)?;
                let ssid = self.config.wifi_ssid.clone();
                self.set_credentials(ssid, password)
            }
            Attribute::LightColor => {
                let color = parse_color(text)?;
                self.light
                    .set_color(color, self.settings.button_fade_ms_per_step, now);
                Ok(())
            }
            Attribute::ActionTime(slot) => {
                let time = TimeOfDay::parse_hhmm(text)?;
                self.action_slot(slot)?;
                self.config.schedule.set_time(slot as usize, time);
                self.next_schedule_check_ms = None;
                config::save(&mut self.store, &self.config)
            }
            Attribute::Clock => {
                let time = TimeOfDay::parse_hhmm(text)?;
                info!("Control: clock set to {}:{}", time.hour, time.minute);
                self.time.set_offline_time(time);
                self.next_schedule_check_ms = None;
                Ok(())
            }
        };

        result.map_err(|e| {
            warn!("Control: write to {} not persisted: {}", attr, e);
            AttError::Unlikely
        })
    }

    fn action_slot(&self, slot: u8) -> Result<&ScheduledAction, AttError> {
        if slot >= ACTION_TIME_SLOTS {
            return Err(AttError::Unlikely);
        }
        self.config
            .schedule
            .get(slot as usize)
            .ok_or(AttError::Unlikely)
    }
}
