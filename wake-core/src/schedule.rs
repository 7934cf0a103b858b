//! Zeitplan: Tageszeit → Zielfarbe
//!
//! Die Einträge sind immer aufsteigend nach Uhrzeit sortiert und werden
//! als Zyklus über Mitternacht behandelt.

use heapless::Vec;

use crate::types::{
    LIGHT_COLOR_OFF, LocalTime, ScheduleResult, ScheduledAction, TimeOfDay,
};

/// Maximale Anzahl Einträge im Zeitplan
pub const MAX_ACTIONS: usize = 8;

/// Sortierte Liste der täglichen Einträge
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schedule {
    actions: Vec<ScheduledAction, MAX_ACTIONS>,
}

impl Schedule {
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Übernimmt beliebig sortierte Einträge und sortiert sie
    ///
    /// Gibt `None` zurück wenn mehr als [`MAX_ACTIONS`] Einträge übergeben werden.
    pub fn from_slice(actions: &[ScheduledAction]) -> Option<Self> {
        let mut actions = Vec::from_slice(actions).ok()?;
        actions.sort_unstable_by_key(|action| action.time);
        Some(Self { actions })
    }

    /// Fügt einen Eintrag an der richtigen Stelle ein
    ///
    /// Gibt den Eintrag zurück wenn der Zeitplan voll ist.
    pub fn insert(&mut self, action: ScheduledAction) -> Result<(), ScheduledAction> {
        let index = self
            .actions
            .iter()
            .position(|existing| existing.time > action.time)
            .unwrap_or(self.actions.len());
        self.actions.insert(index, action)
    }

    /// Ändert die Uhrzeit eines Eintrags und sortiert neu
    ///
    /// Gibt `false` zurück wenn es den Index nicht gibt.
    pub fn set_time(&mut self, index: usize, time: TimeOfDay) -> bool {
        let Some(action) = self.actions.get_mut(index) else {
            return false;
        };
        action.time = time;
        self.actions.sort_unstable_by_key(|action| action.time);
        true
    }

    pub fn get(&self, index: usize) -> Option<&ScheduledAction> {
        self.actions.get(index)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn as_slice(&self) -> &[ScheduledAction] {
        &self.actions
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledAction> {
        self.actions.iter()
    }

    pub fn resolve(&self, now: LocalTime) -> ScheduleResult {
        resolve(&self.actions, now)
    }
}

/// Wann gilt welche Farbe?
///
/// Aktiv ist der letzte Eintrag mit Uhrzeit ≤ `now`; gibt es keinen, gilt
/// der letzte Eintrag der Liste (er leuchtet über Mitternacht). Der nächste
/// Wechsel ist der erste Eintrag strikt nach `now`, sonst der erste Eintrag
/// am nächsten Tag.
///
/// `actions` muss aufsteigend sortiert sein. Eine leere Liste ergibt
/// "Licht aus" mit erneuter Prüfung in einer Stunde.
///
/// ```
/// # use rgb::RGB8;
/// # use wake_core::{LocalTime, ScheduledAction, resolve};
/// let white = RGB8 { r: 255, g: 255, b: 255 };
/// let actions = [
///     ScheduledAction::new(1, 20, white),
///     ScheduledAction::new(2, 30, RGB8::default()),
/// ];
/// let result = resolve(&actions, LocalTime::new(1, 21, 0));
/// assert_eq!(result.color, white);
/// assert_eq!(result.seconds_until_next, 69 * 60);
/// ```
pub fn resolve(actions: &[ScheduledAction], now: LocalTime) -> ScheduleResult {
    let (Some(first), Some(last)) = (actions.first(), actions.last()) else {
        return ScheduleResult {
            color: LIGHT_COLOR_OFF,
            seconds_until_next: 3600,
        };
    };

    let now_hm = now.time_of_day();
    let mut current = last;
    let mut next = first;
    for action in actions {
        if action.time > now_hm {
            next = action;
            break;
        }
        current = action;
    }

    let mut hours = next.time.hour as i32 - now.hour as i32;
    if next.time <= now_hm {
        // Nächster Eintrag ist erst morgen
        hours += 24;
    }
    let minutes = hours * 60 + next.time.minute as i32 - now.minute as i32;
    let seconds = minutes * 60 - now.second as i32;

    ScheduleResult {
        color: current.color,
        seconds_until_next: seconds.max(0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGB8;

    const WHITE: RGB8 = RGB8 {
        r: 255,
        g: 255,
        b: 255,
    };
    const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

    fn actions() -> [ScheduledAction; 2] {
        [
            ScheduledAction::new(1, 20, WHITE),
            ScheduledAction::new(2, 30, BLACK),
        ]
    }

    #[test]
    fn test_resolve_reference_table() {
        let cases = [
            (LocalTime::new(0, 0, 0), BLACK, 80 * 60),
            (LocalTime::new(1, 20, 0), WHITE, 70 * 60),
            (LocalTime::new(1, 21, 0), WHITE, 69 * 60),
            (LocalTime::new(2, 30, 0), BLACK, (22 * 60 + 50) * 60),
            (LocalTime::new(2, 31, 0), BLACK, (22 * 60 + 49) * 60),
        ];

        for (now, color, seconds) in cases {
            let result = resolve(&actions(), now);
            assert_eq!(result.color, color, "at {:?}", now);
            assert_eq!(result.seconds_until_next, seconds, "at {:?}", now);
        }
    }

    #[test]
    fn test_resolve_subtracts_seconds() {
        let result = resolve(&actions(), LocalTime::new(1, 21, 30));
        assert_eq!(result.seconds_until_next, 69 * 60 - 30);
    }

    #[test]
    fn test_resolve_single_entry_is_next_day() {
        let single = [ScheduledAction::new(7, 0, WHITE)];
        let result = resolve(&single, LocalTime::new(7, 0, 0));
        assert_eq!(result.color, WHITE);
        assert_eq!(result.seconds_until_next, 24 * 3600);

        let result = resolve(&single, LocalTime::new(8, 0, 0));
        assert_eq!(result.seconds_until_next, 23 * 3600);
    }

    #[test]
    fn test_resolve_empty_is_off() {
        let result = resolve(&[], LocalTime::new(12, 0, 0));
        assert_eq!(result.color, LIGHT_COLOR_OFF);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut schedule = Schedule::from_slice(&actions()).unwrap();
        schedule
            .insert(ScheduledAction::new(2, 0, RGB8 { r: 1, g: 2, b: 3 }))
            .unwrap();
        schedule.insert(ScheduledAction::new(0, 5, WHITE)).unwrap();

        let times: [u32; 4] = core::array::from_fn(|i| {
            schedule.get(i).unwrap().time.minutes_since_midnight()
        });
        assert_eq!(times, [5, 80, 120, 150]);
    }

    #[test]
    fn test_set_time_resorts() {
        let mut schedule = Schedule::from_slice(&actions()).unwrap();
        assert!(schedule.set_time(0, TimeOfDay { hour: 3, minute: 0 }));
        assert_eq!(schedule.get(0).unwrap().color, BLACK);
        assert_eq!(schedule.get(1).unwrap().color, WHITE);
        assert!(!schedule.set_time(5, TimeOfDay::default()));
    }

    #[test]
    fn test_from_slice_sorts() {
        let mut reversed = actions();
        reversed.reverse();
        let schedule = Schedule::from_slice(&reversed).unwrap();
        assert_eq!(schedule.as_slice(), &actions());
    }
}
