// Wanduhr: per SNTP oder über das Clock-Attribut gestellt
//
// Gespeichert wird ein Paar (Unix-Sekunden, RTC-Millisekunden). Die aktuelle
// Zeit ergibt sich aus der seitdem vergangenen RTC-Zeit, so läuft die Uhr
// auch im Light Sleep korrekt weiter.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use defmt::debug;
use wake_core::types::{MIN_VALID_UNIX_SECS, SECONDS_PER_DAY};
use wake_core::{Clock, LocalTime, TimeOfDay, TimeSource};

use crate::config::UTC_OFFSET_SECS;
use crate::hal::RtcClock;
use crate::net::LINK_FAILED;

struct WallClock {
    /// (Unix-Sekunden, RTC-Millisekunden) beim Stellen
    reference: Option<(u64, u64)>,
    /// Uhr wurde seit der letzten Abfrage gestellt
    updated: bool,
}

static WALL_CLOCK: Mutex<RefCell<WallClock>> = Mutex::new(RefCell::new(WallClock {
    reference: None,
    updated: false,
}));

/// Zeit-Synchronisation mehrfach in Folge fehlgeschlagen
pub(crate) static SYNC_FAILED: AtomicBool = AtomicBool::new(false);

/// Stellt die Uhr (Aufruf aus dem sntp_task)
pub fn set_unix_time(unix_secs: u64) {
    let now_ms = RtcClock.now_ms();
    critical_section::with(|cs| {
        let mut clock = WALL_CLOCK.borrow_ref_mut(cs);
        clock.reference = Some((unix_secs, now_ms));
        clock.updated = true;
    });
}

fn unix_now(now_ms: u64) -> Option<u64> {
    critical_section::with(|cs| {
        WALL_CLOCK
            .borrow_ref(cs)
            .reference
            .map(|(unix, at_ms)| unix + now_ms.saturating_sub(at_ms) / 1000)
    })
}

/// [`TimeSource`] für den ControlLoop
pub struct NetworkClock {
    clock: RtcClock,
}

impl NetworkClock {
    pub fn new(clock: RtcClock) -> Self {
        Self { clock }
    }
}

impl TimeSource for NetworkClock {
    fn local_time(&mut self) -> Option<LocalTime> {
        let unix = unix_now(self.clock.now_ms())?;
        // Vor 2020 gilt die Uhr als nicht gestellt
        if unix < MIN_VALID_UNIX_SECS {
            return None;
        }
        Some(LocalTime::from_unix(unix, UTC_OFFSET_SECS))
    }

    fn poll_clock_updated(&mut self) -> bool {
        critical_section::with(|cs| {
            let mut clock = WALL_CLOCK.borrow_ref_mut(cs);
            core::mem::replace(&mut clock.updated, false)
        })
    }

    fn has_error(&self) -> bool {
        LINK_FAILED.load(Ordering::Acquire) || SYNC_FAILED.load(Ordering::Acquire)
    }

    fn set_offline_time(&mut self, time: TimeOfDay) {
        // Beliebiger gültiger Tag (2020-01-02), nur die Uhrzeit zählt
        let local_secs = LocalTime::from(time).seconds_since_midnight() as i64;
        let unix = MIN_VALID_UNIX_SECS as i64 + SECONDS_PER_DAY as i64 + local_secs
            - UTC_OFFSET_SECS as i64;
        debug!("Clock: set offline to {}:{}", time.hour, time.minute);
        set_unix_time(unix as u64);
    }
}
