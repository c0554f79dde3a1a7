//! Button debouncing.
//!
//! The raw pin is sampled once per control-loop iteration. A new level is
//! accepted only after it has held, without any raw change, for at least the
//! debounce interval. Every accepted change is reported once as an edge.

use std::time::Duration;

use doorgate_hardware::PinLevel;
use tokio::time::Instant;

/// Accepted change of the debounced button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    last_raw: PinLevel,
    last_raw_change: Instant,
    stable: PinLevel,
}

impl Debouncer {
    /// Start released as of `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_raw: PinLevel::High,
            last_raw_change: now,
            stable: PinLevel::High,
        }
    }

    /// Feed one raw sample.
    pub fn sample(&mut self, level: PinLevel, now: Instant) -> Option<ButtonEdge> {
        if level != self.last_raw {
            self.last_raw = level;
            self.last_raw_change = now;
        }

        let settled = now.saturating_duration_since(self.last_raw_change) >= self.interval;
        if level == self.stable || !settled {
            return None;
        }

        self.stable = level;
        Some(if level.is_pressed() {
            ButtonEdge::Pressed
        } else {
            ButtonEdge::Released
        })
    }

    /// `true` while the debounced level is pressed.
    pub fn is_pressed(&self) -> bool {
        self.stable.is_pressed()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const INTERVAL: Duration = Duration::from_millis(50);
    const POLL: Duration = Duration::from_millis(5);

    /// Hold `level` from `start` for `hold`, sampling every 5ms.
    fn hold(
        debouncer: &mut Debouncer,
        level: PinLevel,
        start: Instant,
        hold: Duration,
    ) -> Vec<ButtonEdge> {
        let mut edges = Vec::new();
        let mut t = start;
        while t <= start + hold {
            edges.extend(debouncer.sample(level, t));
            t += POLL;
        }
        edges
    }

    #[rstest]
    #[case(Duration::from_millis(0))]
    #[case(Duration::from_millis(20))]
    #[case(Duration::from_millis(45))]
    fn test_short_low_is_rejected(#[case] duration: Duration) {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL, start);

        let edges = hold(&mut debouncer, PinLevel::Low, start, duration);
        assert!(edges.is_empty());
        assert!(!debouncer.is_pressed());
    }

    #[rstest]
    #[case(Duration::from_millis(50))]
    #[case(Duration::from_millis(80))]
    #[case(Duration::from_millis(500))]
    fn test_held_low_is_accepted_once(#[case] duration: Duration) {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL, start);

        let edges = hold(&mut debouncer, PinLevel::Low, start, duration);
        assert_eq!(edges, vec![ButtonEdge::Pressed]);
        assert!(debouncer.is_pressed());
    }

    #[test]
    fn test_accepted_exactly_at_interval() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL, start);

        assert_eq!(debouncer.sample(PinLevel::Low, start), None);
        assert_eq!(
            debouncer.sample(PinLevel::Low, start + Duration::from_millis(49)),
            None
        );
        assert_eq!(
            debouncer.sample(PinLevel::Low, start + INTERVAL),
            Some(ButtonEdge::Pressed)
        );
    }

    #[test]
    fn test_bounce_restarts_settle_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL, start);
        let ms = |n| start + Duration::from_millis(n);

        assert_eq!(debouncer.sample(PinLevel::Low, ms(0)), None);
        assert_eq!(debouncer.sample(PinLevel::High, ms(30)), None);
        assert_eq!(debouncer.sample(PinLevel::Low, ms(35)), None);
        assert_eq!(debouncer.sample(PinLevel::Low, ms(60)), None);
        assert_eq!(debouncer.sample(PinLevel::Low, ms(85)), Some(ButtonEdge::Pressed));
    }

    #[test]
    fn test_release_is_debounced_too() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL, start);
        let ms = |n| start + Duration::from_millis(n);

        debouncer.sample(PinLevel::Low, ms(0));
        assert_eq!(debouncer.sample(PinLevel::Low, ms(50)), Some(ButtonEdge::Pressed));

        assert_eq!(debouncer.sample(PinLevel::High, ms(100)), None);
        assert_eq!(debouncer.sample(PinLevel::High, ms(120)), None);
        assert_eq!(debouncer.sample(PinLevel::High, ms(150)), Some(ButtonEdge::Released));
        assert!(!debouncer.is_pressed());
    }

    #[test]
    fn test_idle_high_never_emits() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL, start);
        assert!(hold(&mut debouncer, PinLevel::High, start, Duration::from_secs(1)).is_empty());
    }
}
