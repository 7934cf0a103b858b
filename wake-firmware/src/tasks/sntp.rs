// SNTP Task - Stellt die Wanduhr sobald das Netzwerk steht
use core::sync::atomic::Ordering;

use defmt::{Debug2Format, info, warn};
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack, dns::DnsQueryType};
use embassy_time::{Duration, Timer, with_timeout};
use wake_core::sntp::{self, NTP_PORT, PACKET_LEN, SntpError};

use crate::config::{
    DNS_TIMEOUT_SECS, NTP_MAX_RETRIES, NTP_RETRY_DELAY_SECS, NTP_SERVER, NTP_SYNC_INTERVAL_SECS,
    NTP_TIMEOUT_SECS,
};
use crate::time::{SYNC_FAILED, set_unix_time};

/// SNTP Task
///
/// - Wartet auf eine IP-Adresse (DHCP)
/// - Fragt NTP_SERVER ab und stellt die Wanduhr
/// - Wiederholt die Abfrage alle NTP_SYNC_INTERVAL_SECS
/// - Meldet nach NTP_MAX_RETRIES Fehlversuchen in Folge einen Fehler
#[embassy_executor::task]
pub async fn sntp_task(stack: &'static Stack<'static>) {
    info!("SNTP: Task started");
    let mut failures: u32 = 0;

    loop {
        stack.wait_config_up().await;

        match query_time(stack).await {
            Ok(unix_secs) => {
                info!("SNTP: time synchronized: {}", unix_secs);
                set_unix_time(unix_secs);
                failures = 0;
                SYNC_FAILED.store(false, Ordering::Release);
                Timer::after(Duration::from_secs(NTP_SYNC_INTERVAL_SECS)).await;
            }
            Err(e) => {
                failures += 1;
                warn!("SNTP: sync failed ({}/{}): {}", failures, NTP_MAX_RETRIES, e);
                if failures >= NTP_MAX_RETRIES {
                    SYNC_FAILED.store(true, Ordering::Release);
                }
                Timer::after(Duration::from_secs(NTP_RETRY_DELAY_SECS)).await;
            }
        }
    }
}

/// Eine SNTP-Abfrage, liefert Unix-Sekunden
async fn query_time(stack: &'static Stack<'static>) -> Result<u64, NtpError> {
    let server = resolve_hostname(stack, NTP_SERVER).await?;

    let mut rx_meta = [PacketMetadata::EMPTY; 2];
    let mut rx_buffer = [0u8; PACKET_LEN];
    let mut tx_meta = [PacketMetadata::EMPTY; 2];
    let mut tx_buffer = [0u8; PACKET_LEN];
    let mut socket = UdpSocket::new(
        *stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(0).map_err(|_| NtpError::BindFailed)?;

    let endpoint = IpEndpoint::new(server, NTP_PORT);
    socket
        .send_to(&sntp::request(), endpoint)
        .await
        .map_err(|_| NtpError::SendFailed)?;

    let mut response = [0u8; PACKET_LEN];
    let (len, _) = with_timeout(
        Duration::from_secs(NTP_TIMEOUT_SECS),
        socket.recv_from(&mut response),
    )
    .await
    .map_err(|_| NtpError::Timeout)?
    .map_err(|_| NtpError::ReceiveFailed)?;

    sntp::parse_response(&response[..len]).map_err(NtpError::InvalidResponse)
}

/// Löst Hostname zu einer IP-Adresse auf
async fn resolve_hostname(
    stack: &'static Stack<'static>,
    hostname: &str,
) -> Result<IpAddress, NtpError> {
    let result = with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(hostname, DnsQueryType::A),
    )
    .await;

    match result {
        Ok(Ok(addrs)) => addrs.first().copied().ok_or(NtpError::DnsResolutionFailed),
        Ok(Err(e)) => {
            warn!("SNTP: DNS error: {}", Debug2Format(&e));
            Err(NtpError::DnsResolutionFailed)
        }
        Err(_) => Err(NtpError::DnsTimeout),
    }
}

/// SNTP Fehler-Typen
#[derive(Debug)]
enum NtpError {
    DnsResolutionFailed,
    DnsTimeout,
    BindFailed,
    SendFailed,
    ReceiveFailed,
    Timeout,
    InvalidResponse(SntpError),
}

impl defmt::Format for NtpError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            NtpError::DnsResolutionFailed => defmt::write!(fmt, "DNS failed"),
            NtpError::DnsTimeout => defmt::write!(fmt, "DNS timeout"),
            NtpError::BindFailed => defmt::write!(fmt, "Socket bind failed"),
            NtpError::SendFailed => defmt::write!(fmt, "Send failed"),
            NtpError::ReceiveFailed => defmt::write!(fmt, "Receive failed"),
            NtpError::Timeout => defmt::write!(fmt, "No response"),
            NtpError::InvalidResponse(e) => defmt::write!(fmt, "Invalid response: {}", e),
        }
    }
}
