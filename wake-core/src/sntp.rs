//! Minimaler SNTP v4 Client (RFC 4330), nur Paket-Aufbau und -Auswertung
//!
//! Der UDP-Transport liegt in der Firmware.

/// Größe eines SNTP-Pakets ohne Extensions
pub const PACKET_LEN: usize = 48;

pub const NTP_PORT: u16 = 123;

/// Sekunden zwischen 1900-01-01 (NTP) und 1970-01-01 (Unix)
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const VERSION: u8 = 4;

const TRANSMIT_OFFSET: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SntpError {
    TooShort,
    /// Antwort kommt nicht von einem Server
    NotServer,
    /// Stratum 0, der Server will keine Anfragen mehr
    KissOfDeath,
    NoTimestamp,
}

/// Client-Anfrage (LI = 0, VN = 4, Mode = 3)
pub fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Wertet eine Server-Antwort aus und liefert Unix-Sekunden
pub fn parse_response(packet: &[u8]) -> Result<u64, SntpError> {
    if packet.len() < PACKET_LEN {
        return Err(SntpError::TooShort);
    }
    if packet[0] & 0x07 != MODE_SERVER {
        return Err(SntpError::NotServer);
    }
    if packet[1] == 0 {
        return Err(SntpError::KissOfDeath);
    }

    let mut seconds = [0u8; 4];
    seconds.copy_from_slice(&packet[TRANSMIT_OFFSET..TRANSMIT_OFFSET + 4]);
    let ntp_secs = u32::from_be_bytes(seconds) as u64;
    if ntp_secs == 0 {
        return Err(SntpError::NoTimestamp);
    }

    // Ab 2036 läuft der 32-Bit Zähler über (Era 1), das MSB ist dann 0
    let ntp_secs = if ntp_secs & 0x8000_0000 == 0 {
        ntp_secs + (1 << 32)
    } else {
        ntp_secs
    };
    Ok(ntp_secs - NTP_UNIX_OFFSET)
}
