// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Io, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::timer::timg::TimerGroup;
use esp_storage::FlashStorage;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use wake_core::{AppConfig, ControlLoop, Devices, LIGHT_COLOR_OFF};
use wake_light::ble::BleConfigMode;
use wake_light::config::{
    DEFAULT_WIFI_PASSWORD, DEFAULT_WIFI_SSID, EXTRA_HEAP_SIZE, WIFI_HEAP_SIZE, control_config,
};
use wake_light::hal::{
    self, BUTTON_SIGNAL, BatteryMonitor, ButtonInput, FlashConfigStore, LightSleep,
    PowerSensePin, RtcClock, StatusLed,
};
use wake_light::net::WifiLink;
use wake_light::tasks::{
    FirmwarePlatform, connection_task, control_task, dhcp_task, net_task, sntp_task,
};
use wake_light::time::NetworkClock;

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware, WiFi, startet Embassy Runtime und spawnt Tasks.
/// Danach schläft main() - alle Arbeit läuft in Tasks.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB) = 100 KB total
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // RTC: Uhr der Hauptschleife und Light Sleep
    hal::sleep::init(Rtc::new(peripherals.LPWR));

    // Taster (GPIO4, active-low) mit Interrupt-Handler
    let mut io = Io::new(peripherals.IO_MUX);
    io.set_interrupt_handler(hal::button::button_interrupt);
    let button = ButtonInput::init(Input::new(
        peripherals.GPIO4,
        InputConfig::default().with_pull(Pull::Up),
    ));
    let wake = hal::sleep::boot_cause();

    // Netzteil-Erkennung (GPIO5) und Batterie (GPIO2)
    let power_sense = PowerSensePin::init(Input::new(
        peripherals.GPIO5,
        InputConfig::default().with_pull(Pull::None),
    ));
    let battery = BatteryMonitor::new(peripherals.ADC1, peripherals.GPIO2);

    // Licht: LEDC Kanäle R (GPIO18), G (GPIO19), B (GPIO20)
    let pwm = hal::light_channels(
        peripherals.LEDC,
        peripherals.GPIO18.into(),
        peripherals.GPIO19.into(),
        peripherals.GPIO20.into(),
    )
    .expect("Failed to configure LEDC");

    // Status-LED: Daten (GPIO21), Takt (GPIO22), Versorgung (GPIO23)
    let indicator = StatusLed::new(
        Output::new(peripherals.GPIO21, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO22, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO23, Level::Low, OutputConfig::default()),
    );

    let store = FlashConfigStore::new(FlashStorage::new(peripherals.FLASH));

    // WiFi Hardware initialisieren
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Netzwerk-Stack erstellen
    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Static resources für embassy-net: DHCP + DNS + SNTP Socket
    static RESOURCES: static_cell::StaticCell<StackResources<4>> = static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    // embassy-net erstellt Stack + Runner (nutzt STA interface für Client-Modus)
    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // Stack muss 'static sein für Tasks
    static STACK: static_cell::StaticCell<Stack<'static>> = static_cell::StaticCell::new();
    let stack = &*STACK.init(stack);

    // Hauptschleife: lädt die Konfiguration aus dem Flash (oder legt sie an)
    let devices = Devices::<FirmwarePlatform> {
        clock: RtcClock,
        button,
        power_sense,
        battery,
        pwm,
        indicator,
        time: NetworkClock::new(RtcClock),
        network: WifiLink,
        ble: BleConfigMode,
        store,
        sleeper: LightSleep,
    };
    let defaults = AppConfig::with_defaults(DEFAULT_WIFI_SSID, DEFAULT_WIFI_PASSWORD);
    let control = ControlLoop::new(
        devices,
        &BUTTON_SIGNAL,
        control_config(),
        &defaults,
        wake,
        LIGHT_COLOR_OFF,
    );

    // Spawn WiFi Tasks
    spawner.spawn(connection_task(wifi_controller)).unwrap();
    spawner.spawn(net_task(runner)).unwrap();
    spawner.spawn(dhcp_task(stack)).unwrap();

    // Spawn SNTP Task (stellt die Wanduhr)
    spawner.spawn(sntp_task(stack)).unwrap();

    // Spawn Control Task (Zeitplan, Licht, Taster, Schlaf)
    spawner.spawn(control_task(control)).unwrap();

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
