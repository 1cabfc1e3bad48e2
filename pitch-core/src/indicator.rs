//! # Tuning Indicator Module
//!
//! Drives a continuously scrolling note-scale pointer. Positions are
//! unwrapped cents relative to A4. Note names repeat every 1200 cents, so
//! a jump of more than half an octave is read as wrap-around rather than
//! a real leap, and the start point is shifted by a full octave so the
//! pointer takes the short way.
//!
//! The indicator only decides the start/target pair of each animation.
//! Timing belongs to whoever renders it.

use serde::Serialize;

/// Cents in one octave.
const OCTAVE_CENTS: f64 = 1200.0;

/// Start and end of one pointer animation, in unwrapped cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorUpdate {
    pub start_cents: f64,
    pub target_cents: f64,
}

impl IndicatorUpdate {
    /// Position after `progress` (0 to 1) of the animation, eased out.
    pub fn position_at(&self, progress: f64) -> f64 {
        self.start_cents + (self.target_cents - self.start_cents) * ease_out(progress)
    }
}

/// Cubic ease-out: fast start, gentle arrival. Input is clamped to [0, 1].
pub fn ease_out(progress: f64) -> f64 {
    let t = 1.0 - progress.clamp(0.0, 1.0);
    1.0 - t * t * t
}

/// Pointer state across successive estimates.
#[derive(Debug, Clone)]
pub struct TuningIndicator {
    unwrap_threshold: f64,
    current_cents: Option<f64>,
    target_cents: Option<f64>,
}

impl TuningIndicator {
    /// Creates an indicator that unwraps jumps larger than
    /// `unwrap_threshold` cents.
    pub fn new(unwrap_threshold: f64) -> Self {
        Self {
            unwrap_threshold,
            current_cents: None,
            target_cents: None,
        }
    }

    /// Takes a new target and returns the animation to run.
    ///
    /// The first target initializes the pointer in place. Afterwards, if
    /// the target is more than the unwrap threshold away, the current
    /// position moves by one octave toward it before the animation starts.
    pub fn update(&mut self, new_cents: f64) -> IndicatorUpdate {
        let start = match self.current_cents {
            None => new_cents,
            Some(current) => {
                let diff = new_cents - current;
                if diff.abs() > self.unwrap_threshold {
                    current + OCTAVE_CENTS * diff.signum()
                } else {
                    current
                }
            }
        };
        self.current_cents = Some(start);
        self.target_cents = Some(new_cents);
        IndicatorUpdate {
            start_cents: start,
            target_cents: new_cents,
        }
    }

    /// Lets the animation write back where the pointer actually is.
    pub fn set_current(&mut self, cents: f64) {
        self.current_cents = Some(cents);
    }

    pub fn current_cents(&self) -> Option<f64> {
        self.current_cents
    }

    pub fn target_cents(&self) -> Option<f64> {
        self.target_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_initializes_in_place() {
        let mut indicator = TuningIndicator::new(600.0);
        let update = indicator.update(-320.0);
        assert_eq!(update.start_cents, -320.0);
        assert_eq!(update.target_cents, -320.0);
        assert_eq!(indicator.current_cents(), Some(-320.0));
    }

    #[test]
    fn wrap_from_b_to_c_takes_the_short_way() {
        let mut indicator = TuningIndicator::new(600.0);
        indicator.set_current(1150.0);
        let update = indicator.update(10.0);
        assert_eq!(update.start_cents, -50.0);
        assert_eq!(update.target_cents, 10.0);
        assert!((update.target_cents - update.start_cents).abs() <= 600.0);
    }

    #[test]
    fn upward_wrap_shifts_up() {
        let mut indicator = TuningIndicator::new(600.0);
        indicator.set_current(20.0);
        let update = indicator.update(1100.0);
        assert_eq!(update.start_cents, 1220.0);
    }

    #[test]
    fn small_moves_are_not_unwrapped() {
        let mut indicator = TuningIndicator::new(600.0);
        indicator.update(0.0);
        let update = indicator.update(600.0);
        assert_eq!(update.start_cents, 0.0);
        let update = indicator.update(-100.0);
        assert_eq!(update.start_cents, 0.0);
    }

    #[test]
    fn animation_write_back_feeds_next_update() {
        let mut indicator = TuningIndicator::new(600.0);
        indicator.update(0.0);
        indicator.update(200.0);
        // Animation interrupted three quarters of the way.
        indicator.set_current(150.0);
        let update = indicator.update(250.0);
        assert_eq!(update.start_cents, 150.0);
        assert_eq!(indicator.target_cents(), Some(250.0));
    }

    #[test]
    fn ease_out_curve() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert_eq!(ease_out(2.0), 1.0);
        assert_eq!(ease_out(-1.0), 0.0);
        // Past the linear midpoint at half time.
        assert!(ease_out(0.5) > 0.5);
        let update = IndicatorUpdate {
            start_cents: -50.0,
            target_cents: 10.0,
        };
        assert_eq!(update.position_at(0.0), -50.0);
        assert_eq!(update.position_at(1.0), 10.0);
    }
}
