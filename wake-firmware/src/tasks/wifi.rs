// WiFi Task - Verbindet auf Befehl der Hauptschleife und meldet den Zustand
use core::sync::atomic::Ordering;

use defmt::{Debug2Format, debug, error, info, warn};
use embassy_futures::select::{Either, select};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};

use crate::config::{WIFI_MAX_RETRIES, WIFI_RETRY_DELAY_SECS};
use crate::net::{LINK_ACTIVE, LINK_FAILED, LINK_UP, WIFI_COMMAND, WifiCommand};

/// WiFi Connection Task
///
/// Wartet auf Befehle vom WifiLink:
/// - Connect: Station konfigurieren, bis zu WIFI_MAX_RETRIES Versuche
/// - Disconnect: Verbindung trennen und Radio abschalten
///
/// Ein Verbindungsabbruch wird gemeldet (LINK_ACTIVE = false), die
/// Hauptschleife entscheidet dann über einen neuen Versuch.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("WiFi: Starting connection task");

    let mut command = WIFI_COMMAND.wait().await;
    loop {
        command = match command {
            WifiCommand::Connect { ssid, password } => {
                run_connection(&mut controller, &ssid, &password).await
            }
            WifiCommand::Disconnect => {
                shutdown(&mut controller).await;
                WIFI_COMMAND.wait().await
            }
        };
    }
}

/// Verbindet und hält die Verbindung bis zum nächsten Befehl
///
/// Gibt den Befehl zurück, der die Verbindung beendet hat.
async fn run_connection(
    controller: &mut WifiController<'static>,
    ssid: &str,
    password: &str,
) -> WifiCommand {
    // Laufende Verbindung mit alten Zugangsdaten zuerst trennen
    shutdown(controller).await;

    let client_config = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(ssid.into())
            .with_password(password.into()),
    );
    if let Err(e) = controller.set_config(&client_config) {
        error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
        return fail().await;
    }
    if let Err(e) = controller.start_async().await {
        error!("WiFi: Failed to start: {}", Debug2Format(&e));
        return fail().await;
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        info!("WiFi: Connecting to '{}' ({}/{})...", ssid, attempt, WIFI_MAX_RETRIES);
        match controller.connect_async().await {
            Ok(_) => break,
            Err(e) => warn!("WiFi: Connection failed: {}", Debug2Format(&e)),
        }

        if attempt >= WIFI_MAX_RETRIES {
            error!("WiFi: giving up after {} attempts", attempt);
            shutdown(controller).await;
            return fail().await;
        }
        // Neuer Befehl bricht die Versuche ab
        if let Some(command) = WIFI_COMMAND.try_take() {
            return command;
        }
        Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
    }

    info!("WiFi: Connected successfully!");
    LINK_FAILED.store(false, Ordering::Release);
    LINK_UP.store(true, Ordering::Release);

    let ended = select(
        controller.wait_for_event(WifiEvent::StaDisconnected),
        WIFI_COMMAND.wait(),
    )
    .await;
    match ended {
        Either::First(_) => {
            warn!("WiFi: Disconnected from AP");
            LINK_UP.store(false, Ordering::Release);
            LINK_ACTIVE.store(false, Ordering::Release);
            shutdown(controller).await;
            WIFI_COMMAND.wait().await
        }
        Either::Second(command) => command,
    }
}

/// Verbindung gescheitert: melden und auf den nächsten Befehl warten
async fn fail() -> WifiCommand {
    LINK_FAILED.store(true, Ordering::Release);
    WIFI_COMMAND.wait().await
}

async fn shutdown(controller: &mut WifiController<'static>) {
    LINK_UP.store(false, Ordering::Release);
    if !matches!(controller.is_started(), Ok(true)) {
        return;
    }
    if let Err(e) = controller.disconnect_async().await {
        // Nicht verbunden ist beim Trennen kein Fehler
        debug!("WiFi: disconnect: {}", Debug2Format(&e));
    }
    if let Err(e) = controller.stop_async().await {
        warn!("WiFi: Failed to stop: {}", Debug2Format(&e));
    }
    info!("WiFi: Stopped");
}

/// Network Task
///
/// Überwacht den Netzwerk-Stack:
/// - Prozessiert Netzwerk-Pakete
/// - Managed TCP/IP Stack
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// DHCP Monitor Task
///
/// Loggt die Netzwerk-Konfiguration nach jedem neuen DHCP-Lease
#[embassy_executor::task]
pub async fn dhcp_task(stack: &'static Stack<'static>) {
    loop {
        stack.wait_config_up().await;
        if let Some(config) = stack.config_v4() {
            info!("WiFi: Got IP address!");
            info!("  IP:      {}", Debug2Format(&config.address.address()));
            info!("  Gateway: {}", Debug2Format(&config.gateway));
            info!("  DNS:     {}", Debug2Format(&config.dns_servers));
        }
        stack.wait_config_down().await;
    }
}
