#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

/// Keyframed samples of a single scalar channel (e.g. the `x` of a translation).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCurve {
    pub times: Vec<f32>,
    pub values: Vec<f32>, // For CubicSpline, length is times.len() * 3
    pub interpolation: InterpolationMode,
}

impl ChannelCurve {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<f32>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[must_use]
    pub fn linear(times: Vec<f32>, values: Vec<f32>) -> Self {
        Self::new(times, values, InterpolationMode::Linear)
    }

    /// A curve holding `value` for all time.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![0.0], vec![value], InterpolationMode::Step)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn end_time(&self) -> Option<f32> {
        self.times.last().copied()
    }

    /// Evaluates the curve at `time`, clamping outside the key range.
    ///
    /// Returns `None` for an empty curve or when the value buffer is shorter
    /// than the key times require.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<f32> {
        if self.times.is_empty() {
            return None;
        }

        // partition_point finds the first index where t > time, i.e. next_index
        let next_idx = self.times.partition_point(|&t| t <= time);
        let idx = next_idx.saturating_sub(1);

        self.sample_at_frame(idx, time)
    }

    /// For Linear/Step, the index is used directly.
    /// For CubicSpline, the value is at index * 3 + 1.
    fn value_at(&self, index: usize) -> Option<f32> {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values.get(index * 3 + 1).copied(),
            _ => self.values.get(index).copied(),
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> Option<f32> {
        let len = self.times.len();

        // No next frame available, or sampling before the first key
        if index >= len - 1 || time <= self.times[0] {
            let clamped = if time <= self.times[0] { 0 } else { len - 1 };
            return self.value_at(clamped);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.value_at(index),
            InterpolationMode::Linear => {
                let v0 = self.value_at(index)?;
                let v1 = self.value_at(next_idx)?;
                Some(v0 + (v1 - v0) * t)
            }
            InterpolationMode::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;

                let v0 = *self.values.get(i_prev + 1)?;
                let out_tangent0 = *self.values.get(i_prev + 2)?;
                let in_tangent1 = *self.values.get(i_next)?;
                let v1 = *self.values.get(i_next + 1)?;

                Some(hermite(v0, out_tangent0, in_tangent1, v1, t, dt))
            }
        }
    }
}

fn hermite(v0: f32, out_tangent0: f32, in_tangent1: f32, v1: f32, t: f32, dt: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;

    let m0 = out_tangent0 * dt;
    let m1 = in_tangent1 * dt;

    s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1
}
