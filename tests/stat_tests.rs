//! Statistics engine tests over a fixed afternoon of observations

use chrono::TimeZone;
use proptest::prelude::*;
use tseries::aggregation::{DataItem, Stat, Window};
use tseries::LocalDateTime;

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} (+/- {}), got {}",
        expected,
        tolerance,
        actual
    );
}

fn at(day: u32, h: u32, m: u32, s: u32) -> LocalDateTime {
    chrono_tz::UTC.with_ymd_and_hms(2013, 12, day, h, m, s).unwrap()
}

fn hour(h: u32) -> LocalDateTime {
    at(2, h, 0, 0)
}

fn untimed() -> Vec<DataItem> {
    [2.0, 1.0, 5.0, 3.0, 4.0]
        .into_iter()
        .map(DataItem::untimed)
        .collect()
}

fn timed() -> Vec<DataItem> {
    [(14, 2.0), (15, 1.0), (17, 5.0), (20, 3.0), (22, 4.0)]
        .into_iter()
        .map(|(h, v)| DataItem::new(hour(h), v))
        .collect()
}

fn timed_stat() -> Stat {
    Stat::with_data(timed(), f64::NAN)
}

#[test]
fn test_integ_precipitation() {
    let mut stat = Stat::new();
    stat.add_timed(hour(12), 2.0);
    stat.add_timed(hour(13), 3.0);
    stat.add_timed(hour(14), 1.0);

    assert_eq!(stat.integ(Window::ALL), 4.5);
    assert_eq!(stat.integ(Window::between(hour(12), at(2, 13, 30, 0))), 4.0);
    assert_eq!(stat.integ(Window::between(hour(12), hour(13))), 2.5);
    assert_eq!(
        stat.integ(Window::between(at(2, 12, 15, 0), at(2, 13, 15, 0))),
        2.75
    );
    assert_eq!(
        stat.integ(Window::between(at(2, 12, 45, 0), at(2, 13, 15, 0))),
        1.5
    );
    assert_eq!(
        stat.integ(Window::between(at(2, 12, 15, 0), at(2, 12, 45, 0))),
        1.25
    );
}

#[test]
fn test_sum() {
    let mut stat = Stat::with_data(untimed(), f64::NAN);
    stat.set_weights(false);
    assert_eq!(stat.sum(Window::ALL), 15.0);

    stat.set_data(timed());
    assert_eq!(stat.sum(Window::between(hour(14), hour(22))), 15.0);
    assert_eq!(stat.sum(Window::between(at(2, 14, 5, 0), hour(20))), 9.0);
    assert_eq!(stat.sum(Window::between(hour(15), hour(21))), 9.0);
    assert_eq!(stat.sum(Window::between(hour(15), hour(15))), 1.0);
    assert_eq!(stat.sum(Window::until(hour(17))), 8.0);
    assert_eq!(stat.sum(Window::since(hour(15))), 13.0);
    assert!(stat.sum(Window::between(hour(17), hour(15))).is_nan());
}

#[test]
fn test_min_max() {
    let stat = Stat::with_data(untimed(), f64::NAN);
    assert_eq!(stat.min(Window::ALL), 1.0);
    assert_eq!(stat.max(Window::ALL), 5.0);
}

#[test]
fn test_mean() {
    let mut stat = timed_stat();
    assert_eq!(stat.mean(Window::ALL), 3.3125);

    stat.set_weights(false);
    assert_eq!(stat.mean(Window::ALL), 3.0);
}

#[test]
fn test_change() {
    let stat = timed_stat();
    assert_eq!(stat.change(Window::ALL), 2.0);
    assert_eq!(stat.change(Window::between(hour(15), hour(17))), 4.0);
    assert_eq!(stat.change(Window::until(hour(17))), 3.0);
    assert_eq!(stat.change(Window::since(hour(20))), 1.0);
}

#[test]
fn test_trend() {
    let mut stat = timed_stat();
    stat.set_weights(false);
    assert_eq!(stat.trend(Window::ALL), 0.0);
    assert_close(stat.trend(Window::until(hour(20))), -100.0 / 3.0, 1e-9);
    assert_eq!(stat.trend(Window::since(hour(20))), 100.0);
}

#[test]
fn test_count() {
    let mut stat = timed_stat();
    stat.set_weights(false);
    let (lo, hi) = (f64::MIN_POSITIVE, f64::MAX);

    assert_eq!(stat.count(lo, hi, Window::ALL), 5.0);
    assert_eq!(stat.count(lo, hi, Window::until(hour(17))), 3.0);
    assert_eq!(stat.count(lo, hi, Window::since(hour(20))), 2.0);
    assert_eq!(stat.count(2.9, 4.1, Window::ALL), 2.0);
    assert_eq!(stat.count(2.9, 4.1, Window::between(hour(15), hour(20))), 1.0);
}

#[test]
fn test_percentage() {
    let mut stat = timed_stat();
    assert_eq!(stat.percentage(4.5, 5.5, Window::ALL), 31.25);
    assert_eq!(
        stat.percentage(3.5, 5.5, Window::between(hour(17), hour(22))),
        50.0
    );

    stat.set_weights(false);
    assert_eq!(stat.percentage(4.5, 5.5, Window::ALL), 20.0);
    assert_close(
        stat.percentage(3.5, 5.5, Window::between(hour(17), hour(22))),
        200.0 / 3.0,
        1e-9,
    );
}

#[test]
fn test_median() {
    let mut stat = timed_stat();
    assert_eq!(stat.median(Window::ALL), 3.0);
    assert_eq!(stat.median(Window::between(hour(14), hour(17))), 1.5);
    assert_eq!(stat.median(Window::between(hour(14), hour(20))), 3.0);

    stat.set_weights(false);
    assert_eq!(stat.median(Window::ALL), 3.0);
    assert_eq!(stat.median(Window::between(hour(14), hour(17))), 2.0);
    assert_eq!(stat.median(Window::between(hour(14), hour(20))), 2.5);
}

#[test]
fn test_variance_and_stddev() {
    let mut stat = timed_stat();
    stat.set_weights(false);

    assert_close(stat.variance(Window::ALL), 2.5, 1e-9);
    assert_close(
        stat.variance(Window::between(hour(14), hour(17))),
        13.0 / 3.0,
        1e-9,
    );
    assert_close(stat.stddev(Window::ALL), 1.58114, 1e-5);

    let expected = ((25.0 / 9.0 + 4.0 / 9.0 + 49.0 / 9.0) / 2.0_f64).sqrt();
    assert_close(
        stat.stddev(Window::between(hour(14), hour(17))),
        expected,
        1e-9,
    );
}

#[test]
fn test_missing_value() {
    let mut stat = Stat::new();
    stat.add_timed(hour(14), 1.0);
    stat.add_timed(hour(15), 2.0);
    stat.add_timed(hour(17), 3.0);

    assert!(stat
        .percentage(1.0, 10.0, Window::between(hour(17), hour(14)))
        .is_nan());

    stat.set_missing_value(32700.0);
    stat.add_value(32700.0);
    assert_eq!(stat.percentage(1.0, 10.0, Window::ALL), 32700.0);

    // the sentinel is now an ordinary value outside the range
    stat.set_missing_value(100.0);
    assert_eq!(stat.percentage(1.0, 10.0, Window::ALL), 75.0);
}

#[test]
fn test_degrees() {
    let mut stat = Stat::new();
    stat.add_value(350.0);
    stat.add_value(90.0);
    stat.set_degrees(true);

    assert_eq!(stat.sum(Window::ALL), 80.0);
    assert_close(stat.mean(Window::ALL), 40.0, 1e-9);
    assert_close(stat.stddev(Window::ALL), 70.7107, 1e-4);
    assert_eq!(stat.trend(Window::ALL), 100.0);
    assert_eq!(stat.count(89.0, 90.0, Window::ALL), 1.0);
}

#[test]
fn test_nearest() {
    let stat = timed_stat();
    let nearest = |t| stat.nearest(t, Window::ALL);

    assert_eq!(nearest(hour(13)), 2.0);
    assert_eq!(nearest(hour(16)), 1.0);
    assert_eq!(nearest(at(2, 16, 0, 1)), 5.0);
    assert_eq!(nearest(at(2, 15, 59, 59)), 1.0);
    assert_eq!(nearest(hour(18)), 5.0);
    assert_eq!(nearest(hour(19)), 3.0);
    assert_eq!(nearest(hour(20)), 3.0);
    assert_eq!(nearest(at(2, 21, 30, 0)), 4.0);
    assert_eq!(nearest(at(3, 0, 30, 0)), 4.0);
}

#[test]
fn test_interpolate() {
    let stat = timed_stat();
    let interpolate = |t| stat.interpolate(t, Window::ALL);

    assert_close(interpolate(at(2, 10, 30, 0)), 5.5, 1e-9);
    assert_close(interpolate(hour(13)), 3.0, 1e-9);
    assert_eq!(interpolate(hour(15)), 1.0);
    assert_close(interpolate(at(2, 17, 10, 0)), 4.89, 0.005);
    assert_close(interpolate(hour(18)), 4.33, 0.005);
    assert_close(interpolate(at(2, 19, 30, 0)), 3.33, 0.005);
    assert_close(interpolate(at(2, 22, 30, 0)), 4.25, 1e-9);
    assert_close(interpolate(at(3, 2, 0, 0)), 6.0, 1e-9);
}

proptest! {
    #[test]
    fn prop_sum_ignores_weighting(values in prop::collection::vec(-1000.0f64..1000.0, 1..40)) {
        let data: Vec<DataItem> = values
            .iter()
            .enumerate()
            .map(|(i, v)| DataItem::new(hour(0) + chrono::Duration::minutes(7 * i as i64), *v))
            .collect();

        let mut stat = Stat::with_data(data, f64::NAN);
        let weighted = stat.sum(Window::ALL);
        stat.set_weights(false);
        let plain = stat.sum(Window::ALL);

        prop_assert_eq!(weighted, plain);
    }

    #[test]
    fn prop_mean_within_bounds(values in prop::collection::vec(-50.0f64..50.0, 1..30)) {
        let data: Vec<DataItem> = values
            .iter()
            .enumerate()
            .map(|(i, v)| DataItem::new(hour(0) + chrono::Duration::minutes(10 * (i as i64) * (i as i64 + 1)), *v))
            .collect();
        let stat = Stat::with_data(data, f64::NAN);

        let mean = stat.mean(Window::ALL);
        prop_assert!(mean >= stat.min(Window::ALL) - 1e-9);
        prop_assert!(mean <= stat.max(Window::ALL) + 1e-9);
    }
}
