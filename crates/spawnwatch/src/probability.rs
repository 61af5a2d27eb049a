//! Respawn probability estimation.
//!
//! A spawn is observed dead at `tod`, possibly with a window of `w` minutes
//! before `tod` during which the death actually happened. Given respawn delay
//! bounds `[min, max]`, these functions estimate the probability that the
//! entity is back up at a given instant.

use crate::types::{SpawnRule, SpawnSignal};

/// Compute the live spawn signal for an observation at `now`.
///
/// All times are minutes on the session clock.
pub fn spawn_signal(now: f64, tod: f64, rule: SpawnRule, window: f64) -> SpawnSignal {
    let min = f64::from(rule.min);
    let max = f64::from(rule.max);
    let min_time = tod + (min - window).max(0.0);
    let max_time = tod + max;

    let probability = if now >= max_time {
        1.0
    } else if now <= min_time {
        0.0
    } else if window > 0.0 && rule.min != rule.max {
        window_probability(now - tod, min, max, window)
    } else {
        (now - min_time) / (max_time - min_time)
    };

    SpawnSignal {
        min_time,
        max_time,
        probability: probability.clamp(0.0, 1.0),
    }
}

/// Probability the entity is up `time` minutes after the latest possible
/// death, when the death happened somewhere in a window of `window` minutes.
pub fn window_probability(time: f64, min: f64, max: f64, window: f64) -> f64 {
    if time <= 0.0 {
        return 0.0;
    }
    if time >= max {
        return 1.0;
    }
    if window >= max {
        return absent_probability(time, min, max);
    }

    let span = max - min;
    let late = max - window;

    if window > min {
        let mass = if time < window {
            let early = if time <= min {
                time * (window / min).ln()
            } else {
                time * (window / time).ln() + time - min
            };
            let rest = if time < late {
                time * time / (2.0 * window)
            } else {
                late * (2.0 * time - late) / (2.0 * window)
            };
            early + rest
        } else {
            let rest = if time < late {
                time - window / 2.0
            } else {
                late - (max - time).powi(2) / (2.0 * window)
            };
            (window - min) + rest
        };
        return (mass / span).clamp(0.0, 1.0);
    }

    let after_gap = time - (min - window);
    if after_gap <= 0.0 {
        return 0.0;
    }

    let probability = if time < min {
        if time < late {
            after_gap * after_gap / (2.0 * window) / span
        } else {
            (2.0 * (time + window) - max - min) / (2.0 * window)
        }
    } else if time < late {
        (window + 2.0 * (time - min)) / 2.0 / span
    } else {
        (span - (max - time).powi(2) / (2.0 * window)) / span
    };
    probability.clamp(0.0, 1.0)
}

/// Probability for an observation whose window covers the whole max delay,
/// i.e. the entity was simply noticed absent.
fn absent_probability(time: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return if time >= max { 1.0 } else { 0.0 };
    }
    let mass = if time <= min {
        time * (max / min).ln()
    } else {
        time * (max / time).ln() + time - min
    };
    (mass / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(min: u32, max: u32) -> SpawnRule {
        SpawnRule { min, max }
    }

    #[test]
    fn test_linear_without_window() {
        let signal = spawn_signal(65.0, 0.0, rule(60, 70), 0.0);
        assert_eq!(signal.min_time, 60.0);
        assert_eq!(signal.max_time, 70.0);
        assert!((signal.probability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_are_certain() {
        assert_eq!(spawn_signal(70.0, 0.0, rule(60, 70), 0.0).probability, 1.0);
        assert_eq!(spawn_signal(200.0, 0.0, rule(60, 70), 10.0).probability, 1.0);
        assert_eq!(spawn_signal(60.0, 0.0, rule(60, 70), 0.0).probability, 0.0);
        assert_eq!(spawn_signal(30.0, 0.0, rule(60, 70), 10.0).probability, 0.0);
    }

    #[test]
    fn test_window_bounds_at_min_and_max_time() {
        let at_min = spawn_signal(50.0, 0.0, rule(60, 70), 10.0);
        assert_eq!(at_min.min_time, 50.0);
        assert_eq!(at_min.probability, 0.0);
        assert_eq!(spawn_signal(70.0, 0.0, rule(60, 70), 10.0).probability, 1.0);

        // Window wider than the min delay: the earliest respawn is the death itself.
        let wide = spawn_signal(100.0, 100.0, rule(60, 70), 65.0);
        assert_eq!(wide.min_time, 100.0);
        assert_eq!(wide.probability, 0.0);
        assert!(spawn_signal(100.5, 100.0, rule(60, 70), 65.0).probability > 0.0);
        assert_eq!(spawn_signal(170.0, 100.0, rule(60, 70), 65.0).probability, 1.0);
    }

    #[test]
    fn test_window_moves_min_time_earlier() {
        let signal = spawn_signal(55.0, 0.0, rule(60, 70), 10.0);
        assert_eq!(signal.min_time, 50.0);
        assert_eq!(signal.max_time, 70.0);
        assert!((signal.probability - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_window_longer_than_min_clamps_min_time() {
        let signal = spawn_signal(10.0, 100.0, rule(60, 70), 65.0);
        assert_eq!(signal.min_time, 100.0);
    }

    #[test]
    fn test_fixed_delay_ignores_window() {
        let signal = spawn_signal(25.0, 0.0, rule(30, 30), 10.0);
        assert_eq!(signal.min_time, 20.0);
        assert!((signal.probability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_monotone_and_bounded() {
        let cases = [
            (60.0, 70.0, 5.0),
            (60.0, 70.0, 10.0),
            (60.0, 70.0, 65.0),
            (60.0, 70.0, 70.0),
            (10.0, 120.0, 30.0),
            (0.0, 30.0, 15.0),
            (45.0, 50.0, 48.0),
        ];
        for (min, max, window) in cases {
            let mut previous = 0.0;
            let mut time = 0.0;
            while time <= max + 1.0 {
                let p = window_probability(time, min, max, window);
                assert!((0.0..=1.0).contains(&p), "p={p} at t={time} for {min}/{max}/{window}");
                assert!(
                    p + 1e-9 >= previous,
                    "not monotone at t={time} for {min}/{max}/{window}"
                );
                previous = p;
                time += 0.25;
            }
            assert!((window_probability(max, min, max, window) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_continuous_across_branches() {
        for (min, max, window) in [(60.0, 70.0, 8.0), (20.0, 90.0, 40.0), (30.0, 60.0, 60.0)] {
            let mut time = 0.01;
            let mut previous = window_probability(time, min, max, window);
            while time < max {
                time += 0.01;
                let p = window_probability(time, min, max, window);
                assert!((p - previous).abs() < 0.01, "jump at t={time}");
                previous = p;
            }
        }
    }

    #[test]
    fn test_absent_observation() {
        let p = window_probability(65.0, 60.0, 70.0, 70.0);
        assert!(p > 0.0 && p < 1.0);
        assert!((window_probability(70.0, 60.0, 70.0, 70.0) - 1.0).abs() < 1e-9);
    }
}
