use crate::error::{SynthError, SynthResult};

/*
Parameter Automation
====================

A ParamTimeline schedules how a single parameter (here: a voice's gain)
moves over time. Events are placed against the audio clock, not against
wall-clock or input-event time, so a curve sounds identical no matter how
late the control thread delivered it.

Event kinds
-----------

  SetValue { time, value }
      Jump to `value` at `time` and hold it.

  LinearRamp { time, value }
  ExponentialRamp { time, value }
      Ramp from the previous event's (time, value) to (time, value).

  Level
    v1 ┐            ╭──── ExponentialRamp ends here
       │          ╭─╯
       │       ╭──╯
    v0 ┼───────╯
       └──┬─────────┬──────→ t
          t0        t1

Exponential ramps follow

    v(t) = v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))

which only makes sense for strictly positive endpoints. That is why
envelopes start at a tiny floor (0.0001) instead of 0: a ramp from exactly
zero would never leave zero.

Cancelling
----------

  cancel_scheduled_values(t)   drop everything at or after t
  cancel_and_hold_at_time(t)   freeze at whatever value the curve has at t,
                               truncating a ramp that is in flight

Release envelopes use cancel_and_hold_at_time(now) followed by a ramp, so
the release always starts from the instantaneous level. Starting from the
sustain level instead would jump if the key is released mid-attack, and
that jump is an audible click.
*/

/// One scheduled automation event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    SetValue { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
    ExponentialRamp { time: f64, value: f32 },
}

impl AutomationEvent {
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            Self::SetValue { time, .. }
            | Self::LinearRamp { time, .. }
            | Self::ExponentialRamp { time, .. } => time,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        match *self {
            Self::SetValue { value, .. }
            | Self::LinearRamp { value, .. }
            | Self::ExponentialRamp { value, .. } => value,
        }
    }

    fn with_end(&self, time: f64, value: f32) -> Self {
        match self {
            Self::SetValue { .. } => Self::SetValue { time, value },
            Self::LinearRamp { .. } => Self::LinearRamp { time, value },
            Self::ExponentialRamp { .. } => Self::ExponentialRamp { time, value },
        }
    }
}

/// Sorted list of automation events for one parameter.
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    default_value: f32,
    events: Vec<AutomationEvent>,
}

impl ParamTimeline {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::with_capacity(8),
        }
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> SynthResult<()> {
        check_finite("set value", value)?;
        self.insert(AutomationEvent::SetValue { time, value });
        Ok(())
    }

    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> SynthResult<()> {
        check_finite("linear ramp", value)?;
        self.insert(AutomationEvent::LinearRamp { time, value });
        Ok(())
    }

    /// Ramp exponentially from the previous event to `value`, arriving at
    /// `time`. `value` must be strictly positive.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> SynthResult<()> {
        check_finite("exponential ramp", value)?;
        if value <= 0.0 {
            return Err(SynthError::InvalidAutomation {
                curve: "exponential ramp",
                value,
            });
        }
        self.insert(AutomationEvent::ExponentialRamp { time, value });
        Ok(())
    }

    /// Remove every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Freeze the parameter at its value at `time`, dropping later events.
    ///
    /// A ramp that spans `time` is truncated so that it ends at `time` with
    /// the held value, leaving the curve before `time` untouched.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) -> f32 {
        let held = self.value_at(time);
        let first_after = self.events.partition_point(|e| e.time() <= time);

        let truncated = self
            .events
            .get(first_after)
            .filter(|e| !matches!(e, AutomationEvent::SetValue { .. }))
            .map(|e| e.with_end(time, held));

        self.events.truncate(first_after);
        match truncated {
            Some(event) => self.events.push(event),
            None => {
                let already_there = self.events.last().is_some_and(|e| e.time() == time);
                if !already_there {
                    self.events.push(AutomationEvent::SetValue { time, value: held });
                }
            }
        }
        held
    }

    /// Evaluate the curve at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        let next = self.events.partition_point(|e| e.time() <= time);

        let (start_time, start_value) = match next.checked_sub(1) {
            Some(idx) => (self.events[idx].time(), self.events[idx].value()),
            None => (f64::NEG_INFINITY, self.default_value),
        };

        match self.events.get(next) {
            Some(AutomationEvent::LinearRamp { time: end, value }) => {
                if !start_time.is_finite() {
                    return start_value;
                }
                let progress = ((time - start_time) / (end - start_time)) as f32;
                start_value + (value - start_value) * progress
            }
            Some(AutomationEvent::ExponentialRamp { time: end, value }) => {
                // Opposite signs or a zero start hold until the ramp ends
                if !start_time.is_finite() || start_value * value <= 0.0 {
                    return start_value;
                }
                let progress = ((time - start_time) / (end - start_time)) as f32;
                start_value * (value / start_value).powf(progress)
            }
            _ => start_value,
        }
    }

    /// Fill `out` with the curve, one value per sample from `start_time`.
    pub fn render(&self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start_time + i as f64 * dt);
        }
    }

    /// Time of the last scheduled event, if any.
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(AutomationEvent::time)
    }

    fn insert(&mut self, event: AutomationEvent) {
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
    }
}

fn check_finite(curve: &'static str, value: f32) -> SynthResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SynthError::InvalidAutomation { curve, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn holds_default_without_events() {
        let timeline = ParamTimeline::new(0.25);
        assert_eq!(timeline.value_at(0.0), 0.25);
        assert_eq!(timeline.value_at(10.0), 0.25);
    }

    #[test]
    fn set_value_jumps_at_its_time() {
        let mut timeline = ParamTimeline::new(1.0);
        timeline.set_value_at_time(0.5, 1.0).unwrap();
        assert_eq!(timeline.value_at(0.99), 1.0);
        assert_eq!(timeline.value_at(1.0), 0.5);
        assert_eq!(timeline.value_at(3.0), 0.5);
    }

    #[test]
    fn linear_ramp_interpolates() {
        let mut timeline = ParamTimeline::new(0.0);
        timeline.set_value_at_time(0.0, 0.0).unwrap();
        timeline.linear_ramp_to_value_at_time(1.0, 2.0).unwrap();
        assert!(close(timeline.value_at(1.0), 0.5));
        assert!(close(timeline.value_at(2.0), 1.0));
        assert!(close(timeline.value_at(5.0), 1.0));
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut timeline = ParamTimeline::new(0.0);
        timeline.set_value_at_time(0.01, 0.0).unwrap();
        timeline.exponential_ramp_to_value_at_time(1.0, 1.0).unwrap();
        // Halfway in time is the geometric mean of the endpoints
        assert!(close(timeline.value_at(0.5), 0.1));
        assert!(close(timeline.value_at(1.0), 1.0));
    }

    #[test]
    fn exponential_ramp_rejects_non_positive_target() {
        let mut timeline = ParamTimeline::new(1.0);
        let err = timeline.exponential_ramp_to_value_at_time(0.0, 1.0);
        assert!(matches!(err, Err(SynthError::InvalidAutomation { .. })));
        assert!(timeline.events().is_empty());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut timeline = ParamTimeline::new(1.0);
        assert!(timeline.set_value_at_time(f32::NAN, 0.0).is_err());
        assert!(timeline.linear_ramp_to_value_at_time(f32::INFINITY, 1.0).is_err());
    }

    #[test]
    fn cancel_scheduled_values_drops_future_events() {
        let mut timeline = ParamTimeline::new(0.0);
        timeline.set_value_at_time(0.2, 0.0).unwrap();
        timeline.set_value_at_time(0.8, 1.0).unwrap();
        timeline.cancel_scheduled_values(0.5);
        assert_eq!(timeline.events().len(), 1);
        assert_eq!(timeline.value_at(2.0), 0.2);
    }

    #[test]
    fn cancel_and_hold_freezes_mid_ramp() {
        let mut timeline = ParamTimeline::new(0.0);
        timeline.set_value_at_time(0.0, 0.0).unwrap();
        timeline.linear_ramp_to_value_at_time(1.0, 1.0).unwrap();

        let held = timeline.cancel_and_hold_at_time(0.25);

        assert!(close(held, 0.25));
        // Curve before the hold point is untouched
        assert!(close(timeline.value_at(0.1), 0.1));
        // After the hold point the value stays frozen
        assert!(close(timeline.value_at(0.9), 0.25));
        assert!(close(timeline.value_at(7.0), 0.25));
    }

    #[test]
    fn release_after_hold_starts_from_held_level() {
        let mut timeline = ParamTimeline::new(0.0);
        timeline.set_value_at_time(0.0001, 0.0).unwrap();
        timeline.exponential_ramp_to_value_at_time(0.9, 0.01).unwrap();
        timeline.exponential_ramp_to_value_at_time(0.5, 0.2).unwrap();

        let held = timeline.cancel_and_hold_at_time(1.0);
        assert!(close(held, 0.5));

        timeline.exponential_ramp_to_value_at_time(0.0001, 2.0).unwrap();
        assert!(close(timeline.value_at(1.0), 0.5));
        assert!(timeline.value_at(1.5) < 0.5);
        assert!(close(timeline.value_at(2.0), 0.0001));
    }

    #[test]
    fn render_samples_the_curve() {
        let mut timeline = ParamTimeline::new(0.0);
        timeline.set_value_at_time(0.0, 0.0).unwrap();
        timeline.linear_ramp_to_value_at_time(1.0, 1.0).unwrap();

        let mut out = [0.0f32; 5];
        timeline.render(&mut out, 0.0, 4.0);
        for (i, v) in out.iter().enumerate() {
            assert!(close(*v, (i as f32 / 4.0).min(1.0)));
        }
    }
}
