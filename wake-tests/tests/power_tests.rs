//! Integration Tests für Power Sense

mod common;

use common::{MockAdc, MockPin};
use wake_core::PowerSense;
use wake_core::power::{POWER_LOW_DELAY_MS, STATE_REPORT_INTERVAL_MS};

fn sense(powered: bool) -> (PowerSense<MockPin, MockAdc>, MockPin, MockAdc) {
    let pin = MockPin::new(powered);
    let adc = MockAdc::default();
    (PowerSense::new(pin.clone(), adc.clone()), pin, adc)
}

// ============================================================================
// Tests: Entprellung
// ============================================================================

#[test]
fn test_powered_is_reported_immediately() {
    let (mut power, pin, _) = sense(false);

    assert!(power.is_powered(0));
    assert!(!power.is_powered(5000));

    pin.set_high(true);
    assert!(power.is_powered(5001));
}

#[test]
fn test_unpowered_only_after_delay() {
    let (mut power, pin, _) = sense(true);
    assert!(power.is_powered(0));

    pin.set_high(false);
    assert!(power.is_powered(100));
    assert!(power.is_powered(100 + POWER_LOW_DELAY_MS));
    assert!(!power.is_powered(100 + POWER_LOW_DELAY_MS + 1));
}

#[test]
fn test_powered_reading_resets_deadline() {
    let (mut power, pin, _) = sense(false);

    assert!(power.is_powered(0));
    pin.set_high(true);
    assert!(power.is_powered(500));

    pin.set_high(false);
    assert!(power.is_powered(600));
    assert!(power.is_powered(1500));
    assert!(power.is_powered(1600));
    assert!(!power.is_powered(1601));
}

// ============================================================================
// Tests: Batteriespannung
// ============================================================================

#[test]
fn test_battery_voltage_uses_divider() {
    let (mut power, _, adc) = sense(true);
    adc.set_millivolts(1000);

    let volts = power.battery_volts(0);
    assert!((volts - 3.762).abs() < 0.001, "{volts}");
}

#[test]
fn test_battery_voltage_is_cached_for_one_second() {
    let (mut power, _, adc) = sense(true);
    adc.set_millivolts(1000);
    let first = power.battery_volts(0);

    adc.set_millivolts(1100);
    assert_eq!(power.battery_volts(999), first);
    assert_eq!(adc.reads(), 1);

    assert!(power.battery_volts(1000) > first);
    assert_eq!(adc.reads(), 2);
}

#[test]
fn test_failed_read_keeps_last_value() {
    let (mut power, _, adc) = sense(true);
    adc.set_millivolts(1000);
    let first = power.battery_volts(0);

    adc.set_fail(true);
    assert_eq!(power.battery_volts(2000), first);
}

// ============================================================================
// Tests: Telemetrie
// ============================================================================

#[test]
fn test_report_is_rate_limited() {
    let (mut power, pin, _) = sense(true);

    let report = power.report(0).unwrap();
    assert!(report.powered);
    assert_eq!(power.report(1000), None);

    // Kurzer Einbruch ändert nichts
    pin.set_high(false);
    assert_eq!(power.report(1500), None);

    // Nach der Entprellung sofort melden
    let report = power.report(2501).unwrap();
    assert!(!report.powered);
    assert_eq!(power.report(3000), None);

    assert!(power.report(2501 + STATE_REPORT_INTERVAL_MS).is_some());
}
