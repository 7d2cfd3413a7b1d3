//! Minimal interruptible tween scheduler for camera choreography.
//!
//! Tweens interpolate a [`Vec3`] channel between two endpoints over a fixed
//! duration with quadratic easing. They are sampled against a
//! caller-supplied [`Instant`], which keeps choreography deterministic
//! under test: drive the timeline with a manual clock instead of waiting
//! out real durations.
//!
//! There is no cancellation token. The only way to stop a running sequence
//! is [`Timeline::clear`], called unconditionally before starting a new
//! one.

use std::time::{Duration, Instant};

use glam::Vec3;

/// Easing curves used by the camera choreography (quadratic family).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Decelerating to the endpoint.
    QuadOut,
    /// Accelerating in, decelerating out.
    QuadInOut,
}

impl Easing {
    /// Map linear progress `t` in [0, 1] to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    1.0 - u * u / 2.0
                }
            }
        }
    }
}

/// Which camera channel a tween drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Position,
    Rotation,
}

/// An in-flight interpolation of one channel.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    channel: Channel,
    from: Vec3,
    to: Vec3,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(
        channel: Channel,
        from: Vec3,
        to: Vec3,
        start: Instant,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            channel,
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    /// The channel this tween drives.
    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Value at `now`, plus whether the tween has run to completion.
    ///
    /// At or past the end the exact `to` endpoint is returned, so tween
    /// targets are always reached bit-for-bit.
    pub fn sample(&self, now: Instant) -> (Vec3, bool) {
        let elapsed = now.saturating_duration_since(self.start);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, true);
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        (self.from.lerp(self.to, self.easing.apply(t)), false)
    }
}

/// One sampled channel value out of a [`Timeline`] update.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub channel: Channel,
    pub value: Vec3,
    pub finished: bool,
}

/// The set of currently scheduled tweens.
#[derive(Debug, Default)]
pub struct Timeline {
    active: Vec<Tween>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every scheduled tween. At most one choreography is ever in
    /// flight; sequences call this before scheduling their own tweens.
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Schedule a tween.
    pub fn push(&mut self, tween: Tween) {
        self.active.push(tween);
    }

    /// Whether nothing is scheduled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Sample every active tween at `now`, removing the finished ones.
    pub fn update(&mut self, now: Instant) -> Vec<Sample> {
        let samples: Vec<Sample> = self
            .active
            .iter()
            .map(|t| {
                let (value, finished) = t.sample(now);
                Sample {
                    channel: t.channel(),
                    value,
                    finished,
                }
            })
            .collect();

        let mut i = 0;
        self.active.retain(|_| {
            let keep = !samples[i].finished;
            i += 1;
            keep
        });

        samples
    }
}
