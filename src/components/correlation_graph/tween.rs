//! Attribute transitions as pure functions of progress.
//!
//! A transition never captures mutable state: the renderer records the value
//! an attribute had when the transition started and asks the tween for the
//! value at each eased progress in `0..=1`.

/// Easing curves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Ease {
	Linear,
	/// Default for attribute transitions.
	#[default]
	CubicInOut,
	/// Used for edge layer fades.
	QuadOut,
}

impl Ease {
	pub fn apply(self, t: f64) -> f64 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Ease::Linear => t,
			Ease::CubicInOut => {
				if t < 0.5 {
					4.0 * t * t * t
				} else {
					let u = -2.0 * t + 2.0;
					1.0 - u * u * u / 2.0
				}
			}
			Ease::QuadOut => t * (2.0 - t),
		}
	}
}

/// What a transition animates and towards which value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tween {
	/// Node radius.
	Radius { to: f64 },
	/// Layer or element opacity.
	Opacity { to: f64 },
	/// Visible fraction of a line, drawn as a growing or shrinking dash.
	/// Grows towards 1 or shrinks towards 0 from the current fraction.
	Dash { grow: bool },
}

impl Tween {
	/// Value at `progress` (already eased), starting from `from`.
	pub fn sample(&self, from: f64, progress: f64) -> f64 {
		let t = progress.clamp(0.0, 1.0);
		let to = match *self {
			Tween::Radius { to } | Tween::Opacity { to } => to,
			Tween::Dash { grow } => {
				if grow {
					1.0
				} else {
					0.0
				}
			}
		};
		from * (1.0 - t) + to * t
	}

	/// Final value once the transition completes.
	pub fn end(&self, from: f64) -> f64 {
		self.sample(from, 1.0)
	}
}

/// Dash/gap pair that shows `fraction` of a line of `length`.
pub fn dash_pattern(length: f64, fraction: f64) -> (f64, f64) {
	let f = fraction.clamp(0.0, 1.0);
	(length * f, length * (1.0 - f))
}

/// A tween with its timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
	pub tween: Tween,
	pub duration_ms: f64,
	pub ease: Ease,
}

impl Transition {
	pub fn new(tween: Tween, duration_ms: f64) -> Self {
		Self {
			tween,
			duration_ms,
			ease: Ease::default(),
		}
	}

	pub fn with_ease(self, ease: Ease) -> Self {
		Self { ease, ..self }
	}

	/// Eased progress after `elapsed_ms`.
	pub fn progress(&self, elapsed_ms: f64) -> f64 {
		if self.duration_ms <= 0.0 {
			return 1.0;
		}
		self.ease.apply(elapsed_ms / self.duration_ms)
	}

	pub fn is_done(&self, elapsed_ms: f64) -> bool {
		elapsed_ms >= self.duration_ms
	}

	/// Value after `elapsed_ms`, starting from `from`.
	pub fn value_at(&self, from: f64, elapsed_ms: f64) -> f64 {
		self.tween.sample(from, self.progress(elapsed_ms))
	}
}
