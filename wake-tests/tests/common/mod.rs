//! Mocks für die Hardware-Traits
//!
//! Alle Mocks sind `Clone` und teilen ihren Zustand über `Rc<Cell<_>>`.
//! Ein Test behält eine Kopie und kann so Eingänge setzen und Ausgänge
//! prüfen, während der Core die andere besitzt.

#![allow(dead_code)] // Jede Test-Datei nutzt nur einen Teil

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rgb::RGB8;
use wake_core::{
    AppConfig, BatteryAdc, BleControl, ButtonSignal, Clock, ConfigStore, Connectivity,
    ControlConfig, ControlLoop, Devices, Edge, EdgeInterrupt, HwError, InputPin, LocalTime,
    Platform, PwmChannel, SleepControl, StatusIndicator, StoreError, TimeOfDay, TimeSource,
    WakeCause,
};

// ============================================================================
// Clock
// ============================================================================

#[derive(Clone, Default)]
pub struct FakeClock(Rc<Cell<u64>>);

impl FakeClock {
    pub fn new(start_ms: u64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ============================================================================
// GPIO
// ============================================================================

#[derive(Clone)]
pub struct MockPin {
    high: Rc<Cell<bool>>,
    listening: Rc<Cell<Option<Edge>>>,
}

impl MockPin {
    pub fn new(high: bool) -> Self {
        Self {
            high: Rc::new(Cell::new(high)),
            listening: Rc::new(Cell::new(None)),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.high.set(high);
    }

    pub fn listening(&self) -> Option<Edge> {
        self.listening.get()
    }

    /// Taster (active-low) drücken und den Interrupt auslösen, falls scharf
    pub fn press(&self, signal: &ButtonSignal) {
        self.high.set(false);
        self.fire(Edge::Falling, signal);
    }

    pub fn release(&self, signal: &ButtonSignal) {
        self.high.set(true);
        self.fire(Edge::Rising, signal);
    }

    fn fire(&self, edge: Edge, signal: &ButtonSignal) {
        if self.listening.get() == Some(edge) {
            // Wie der echte Handler: einmal melden, dann abschalten
            self.listening.set(None);
            signal.on_interrupt();
        }
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> bool {
        self.high.get()
    }
}

impl EdgeInterrupt for MockPin {
    fn listen(&mut self, edge: Edge) {
        self.listening.set(Some(edge));
    }

    fn unlisten(&mut self) {
        self.listening.set(None);
    }
}

// ============================================================================
// PWM, ADC, Status-LED
// ============================================================================

#[derive(Clone, Default)]
pub struct MockPwm {
    duty: Rc<Cell<u8>>,
    writes: Rc<Cell<usize>>,
}

impl MockPwm {
    pub fn duty(&self) -> u8 {
        self.duty.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl PwmChannel for MockPwm {
    fn set_duty(&mut self, duty: u8) -> Result<(), HwError> {
        self.duty.set(duty);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Drei Kanäle plus eine Kopie zum Prüfen
pub fn pwm_channels() -> ([MockPwm; 3], [MockPwm; 3]) {
    let channels = [MockPwm::default(), MockPwm::default(), MockPwm::default()];
    (channels.clone(), channels)
}

pub fn duty_of(channels: &[MockPwm; 3]) -> RGB8 {
    RGB8 {
        r: channels[0].duty(),
        g: channels[1].duty(),
        b: channels[2].duty(),
    }
}

#[derive(Clone, Default)]
pub struct MockAdc {
    millivolts: Rc<Cell<u32>>,
    reads: Rc<Cell<usize>>,
    fail: Rc<Cell<bool>>,
}

impl MockAdc {
    pub fn set_millivolts(&self, mv: u32) {
        self.millivolts.set(mv);
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl BatteryAdc for MockAdc {
    fn read_millivolts(&mut self) -> Result<u32, HwError> {
        self.reads.set(self.reads.get() + 1);
        if self.fail.get() {
            return Err(HwError::ReadFailed);
        }
        Ok(self.millivolts.get())
    }
}

#[derive(Clone, Default)]
pub struct MockIndicator {
    power: Rc<Cell<bool>>,
    color: Rc<Cell<RGB8>>,
}

impl MockIndicator {
    pub fn power(&self) -> bool {
        self.power.get()
    }

    pub fn color(&self) -> RGB8 {
        self.color.get()
    }
}

impl StatusIndicator for MockIndicator {
    fn set_power(&mut self, on: bool) {
        self.power.set(on);
    }

    fn set_color(&mut self, color: RGB8) {
        self.color.set(color);
    }
}

// ============================================================================
// Externe Dienste
// ============================================================================

#[derive(Clone, Default)]
pub struct MockTime {
    now: Rc<Cell<Option<LocalTime>>>,
    updated: Rc<Cell<bool>>,
    error: Rc<Cell<bool>>,
    offline: Rc<Cell<Option<TimeOfDay>>>,
}

impl MockTime {
    pub fn set(&self, time: Option<LocalTime>) {
        self.now.set(time);
    }

    /// Uhr stellen und "clock updated" melden
    pub fn correct(&self, time: LocalTime) {
        self.now.set(Some(time));
        self.updated.set(true);
    }

    pub fn set_error(&self, error: bool) {
        self.error.set(error);
    }

    pub fn offline_time(&self) -> Option<TimeOfDay> {
        self.offline.get()
    }
}

impl TimeSource for MockTime {
    fn local_time(&mut self) -> Option<LocalTime> {
        self.now.get()
    }

    fn poll_clock_updated(&mut self) -> bool {
        self.updated.replace(false)
    }

    fn has_error(&self) -> bool {
        self.error.get()
    }

    fn set_offline_time(&mut self, time: TimeOfDay) {
        self.offline.set(Some(time));
        self.correct(LocalTime::from(time));
    }
}

#[derive(Clone, Default)]
pub struct MockNetwork {
    connected: Rc<Cell<bool>>,
    active: Rc<Cell<bool>>,
    connects: Rc<Cell<usize>>,
    disconnects: Rc<Cell<usize>>,
    last_ssid: Rc<RefCell<String>>,
}

impl MockNetwork {
    pub fn set_connected(&self, connected: bool) {
        self.connected.set(connected);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn connects(&self) -> usize {
        self.connects.get()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.get()
    }

    pub fn last_ssid(&self) -> String {
        self.last_ssid.borrow().clone()
    }
}

impl Connectivity for MockNetwork {
    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn connect(&mut self, ssid: &str, _password: &str) {
        self.active.set(true);
        self.connects.set(self.connects.get() + 1);
        *self.last_ssid.borrow_mut() = ssid.to_string();
    }

    fn disconnect(&mut self) {
        self.active.set(false);
        self.connected.set(false);
        self.disconnects.set(self.disconnects.get() + 1);
    }
}

#[derive(Clone, Default)]
pub struct MockBle {
    enabled: Rc<Cell<bool>>,
}

impl MockBle {
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl BleControl for MockBle {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn start(&mut self) {
        self.enabled.set(true);
    }

    fn stop(&mut self) {
        self.enabled.set(false);
    }
}

#[derive(Clone, Default)]
pub struct MockStore {
    record: Rc<RefCell<Option<Vec<u8>>>>,
    writes: Rc<Cell<usize>>,
    fail_reads: Rc<Cell<bool>>,
}

impl MockStore {
    pub fn with_record(record: &[u8]) -> Self {
        let store = Self::default();
        *store.record.borrow_mut() = Some(record.to_vec());
        store
    }

    pub fn record(&self) -> Option<Vec<u8>> {
        self.record.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }
}

impl ConfigStore for MockStore {
    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::Read);
        }
        let record = self.record.borrow();
        let Some(record) = record.as_ref() else {
            return Ok(None);
        };
        let target = buf.get_mut(..record.len()).ok_or(StoreError::TooLarge)?;
        target.copy_from_slice(record);
        Ok(Some(record.len()))
    }

    fn write(&mut self, record: &[u8]) -> Result<(), StoreError> {
        *self.record.borrow_mut() = Some(record.to_vec());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Schläft "sofort": die Uhr springt um die Schlafdauer weiter
#[derive(Clone)]
pub struct MockSleeper {
    clock: FakeClock,
    sleeps: Rc<RefCell<Vec<u64>>>,
    cause: Rc<Cell<WakeCause>>,
}

impl MockSleeper {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            clock,
            sleeps: Rc::new(RefCell::new(Vec::new())),
            cause: Rc::new(Cell::new(WakeCause::Timer)),
        }
    }

    pub fn sleeps(&self) -> Vec<u64> {
        self.sleeps.borrow().clone()
    }

    pub fn set_cause(&self, cause: WakeCause) {
        self.cause.set(cause);
    }
}

impl SleepControl for MockSleeper {
    fn sleep(&mut self, duration_ms: u64) -> WakeCause {
        self.sleeps.borrow_mut().push(duration_ms);
        self.clock.advance(duration_ms);
        self.cause.get()
    }
}

// ============================================================================
// Komplettes Gerät
// ============================================================================

pub struct MockPlatform;

impl Platform for MockPlatform {
    type Clock = FakeClock;
    type ButtonPin = MockPin;
    type PowerPin = MockPin;
    type Battery = MockAdc;
    type Pwm = MockPwm;
    type Indicator = MockIndicator;
    type Time = MockTime;
    type Network = MockNetwork;
    type Ble = MockBle;
    type Store = MockStore;
    type Sleeper = MockSleeper;
}

/// Test-Handles auf alle Geräte eines [`ControlLoop`]
#[derive(Clone)]
pub struct Rig {
    pub clock: FakeClock,
    pub button: MockPin,
    pub power: MockPin,
    pub battery: MockAdc,
    pub pwm: [MockPwm; 3],
    pub indicator: MockIndicator,
    pub time: MockTime,
    pub network: MockNetwork,
    pub ble: MockBle,
    pub store: MockStore,
    pub sleeper: MockSleeper,
}

impl Rig {
    /// Batteriebetrieb, Taster losgelassen, Uhr auf `time`
    pub fn new(time: Option<LocalTime>) -> Self {
        let clock = FakeClock::new(1_000);
        let rig = Self {
            sleeper: MockSleeper::new(clock.clone()),
            clock,
            button: MockPin::new(true),
            power: MockPin::new(false),
            battery: MockAdc::default(),
            pwm: pwm_channels().0,
            indicator: MockIndicator::default(),
            time: MockTime::default(),
            network: MockNetwork::default(),
            ble: MockBle::default(),
            store: MockStore::default(),
        };
        rig.time.set(time);
        rig
    }

    pub fn devices(&self) -> Devices<MockPlatform> {
        Devices {
            clock: self.clock.clone(),
            button: self.button.clone(),
            power_sense: self.power.clone(),
            battery: self.battery.clone(),
            pwm: self.pwm.clone(),
            indicator: self.indicator.clone(),
            time: self.time.clone(),
            network: self.network.clone(),
            ble: self.ble.clone(),
            store: self.store.clone(),
            sleeper: self.sleeper.clone(),
        }
    }

    pub fn control<'a>(&self, signal: &'a ButtonSignal) -> ControlLoop<'a, MockPlatform> {
        self.control_with(signal, WakeCause::Reset)
    }

    pub fn control_with<'a>(
        &self,
        signal: &'a ButtonSignal,
        wake: WakeCause,
    ) -> ControlLoop<'a, MockPlatform> {
        ControlLoop::new(
            self.devices(),
            signal,
            ControlConfig::default(),
            &AppConfig::with_defaults("home", "secret"),
            wake,
            RGB8::default(),
        )
    }

    pub fn duty(&self) -> RGB8 {
        duty_of(&self.pwm)
    }
}

/// Ruft `tick` im 10 ms Takt auf bis `ms` vergangen sind, liefert den letzten Wert
pub fn run_for(control: &mut ControlLoop<'_, MockPlatform>, clock: &FakeClock, ms: u64) -> u64 {
    let mut last = control.tick();
    let end = clock.now() + ms;
    while clock.now() < end {
        clock.advance(10);
        last = control.tick();
    }
    last
}
