//! Integration Tests für den Taster-Zustandsautomaten

mod common;

use common::MockPin;
use wake_core::{Button, ButtonConfig, ButtonEvent, ButtonSignal, ButtonState, Edge};

const CONFIG: ButtonConfig = ButtonConfig {
    debounce_ms: 20,
    hold_ms: 1000,
    hold_repeat_ms: 100,
};

/// Pollt im 10 ms Raster von `from` bis einschließlich `to`
fn poll_range(
    button: &mut Button<'_, MockPin>,
    from: u64,
    to: u64,
) -> Vec<(u64, ButtonEvent)> {
    (from..=to)
        .step_by(10)
        .filter_map(|now| button.poll(now).map(|event| (now, event)))
        .collect()
}

#[test]
fn test_starts_released_and_listens_for_press() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    assert_eq!(button.state(), ButtonState::Released);
    assert!(!button.is_active());
    assert_eq!(pin.listening(), Some(Edge::Falling));
}

#[test]
fn test_glitch_shorter_than_debounce_is_ignored() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    pin.press(&signal);
    assert_eq!(button.poll(0), None);
    assert_eq!(button.state(), ButtonState::PressDebounce);
    assert!(button.is_active());

    // Wieder offen bevor die Entprellung abläuft
    pin.set_high(true);
    assert!(poll_range(&mut button, 10, 100).is_empty());
    assert_eq!(button.state(), ButtonState::Released);
    assert_eq!(pin.listening(), Some(Edge::Falling));
}

#[test]
fn test_short_press_emits_press_release() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    pin.press(&signal);
    assert!(poll_range(&mut button, 0, 200).is_empty());
    assert_eq!(button.state(), ButtonState::Pressed);
    assert_eq!(pin.listening(), Some(Edge::Rising));

    pin.release(&signal);
    assert_eq!(button.poll(210), Some(ButtonEvent::PressRelease));
    assert_eq!(button.state(), ButtonState::ReleaseDebounce);
    assert!(button.is_active());

    assert!(poll_range(&mut button, 220, 300).is_empty());
    assert_eq!(button.state(), ButtonState::Released);
    assert!(!button.is_active());
}

#[test]
fn test_hold_emits_start_repeats_and_one_release() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    pin.press(&signal);
    let mut events = poll_range(&mut button, 0, 1540);
    pin.release(&signal);
    events.extend(poll_range(&mut button, 1550, 1700));

    assert_eq!(
        events,
        vec![
            (1000, ButtonEvent::HoldStart),
            (1100, ButtonEvent::HoldRepeat),
            (1200, ButtonEvent::HoldRepeat),
            (1300, ButtonEvent::HoldRepeat),
            (1400, ButtonEvent::HoldRepeat),
            (1500, ButtonEvent::HoldRepeat),
            (1550, ButtonEvent::HoldRelease),
        ]
    );
    assert_eq!(button.state(), ButtonState::Released);
}

#[test]
fn test_hold_disabled() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let config = ButtonConfig {
        hold_ms: 0,
        ..CONFIG
    };
    let mut button = Button::new(pin.clone(), &signal, config, false, 0);

    pin.press(&signal);
    assert!(poll_range(&mut button, 0, 10_000).is_empty());
    assert_eq!(button.state(), ButtonState::Pressed);

    pin.release(&signal);
    assert_eq!(button.poll(10_010), Some(ButtonEvent::PressRelease));
}

#[test]
fn test_no_repeat_when_repeat_disabled() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let config = ButtonConfig {
        hold_repeat_ms: 0,
        ..CONFIG
    };
    let mut button = Button::new(pin.clone(), &signal, config, false, 0);

    pin.press(&signal);
    let events = poll_range(&mut button, 0, 3000);
    assert_eq!(events, vec![(1000, ButtonEvent::HoldStart)]);
    assert_eq!(button.state(), ButtonState::Held);
}

#[test]
fn test_bounce_during_release_debounce_is_new_press() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    pin.press(&signal);
    poll_range(&mut button, 0, 100);
    pin.release(&signal);
    assert_eq!(button.poll(110), Some(ButtonEvent::PressRelease));

    // Prellt zurück auf "gedrückt", der Interrupt ist aus
    pin.set_high(false);
    assert_eq!(button.poll(130), None);
    assert_eq!(button.state(), ButtonState::PressDebounce);

    assert_eq!(button.poll(150), None);
    assert_eq!(button.state(), ButtonState::Pressed);
}

#[test]
fn test_missed_release_edge_is_caught_by_hold_timer() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    pin.press(&signal);
    poll_range(&mut button, 0, 100);

    // Pegel geht hoch, ohne dass der Interrupt kommt
    pin.set_high(true);
    let events = poll_range(&mut button, 110, 1100);
    assert_eq!(events, vec![(1000, ButtonEvent::PressRelease)]);
    assert_eq!(button.state(), ButtonState::Released);
}

#[test]
fn test_wake_by_button_starts_in_press_debounce() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(false);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, true, 500);

    assert_eq!(button.state(), ButtonState::PressDebounce);
    assert_eq!(button.poll(510), None);
    assert_eq!(button.poll(520), None);
    assert_eq!(button.state(), ButtonState::Pressed);
}

#[test]
fn test_wake_pressed_after_sleep() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let mut button = Button::new(pin.clone(), &signal, CONFIG, false, 0);

    // Der Wake-Interrupt hat das Flag schon gesetzt
    pin.press(&signal);
    button.wake_pressed(5000);
    assert_eq!(button.state(), ButtonState::PressDebounce);

    assert!(poll_range(&mut button, 5000, 5020).is_empty());
    assert_eq!(button.state(), ButtonState::Pressed);
}

#[test]
fn test_default_config_detects_hold_after_five_seconds() {
    let signal = ButtonSignal::new();
    let pin = MockPin::new(true);
    let config = ButtonConfig::default();
    assert_eq!(config, wake_core::ControlConfig::default().button);
    let mut button = Button::new(pin.clone(), &signal, config, false, 0);

    pin.press(&signal);
    let events = poll_range(&mut button, 0, 5100);
    assert_eq!(events.first(), Some(&(5000, ButtonEvent::HoldStart)));
}
