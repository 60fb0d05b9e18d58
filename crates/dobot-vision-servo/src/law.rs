use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Controller gains, in millimetres of travel per pixel of error.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServoGains {
    pub kp: f64,
    pub ki: f64,
}

impl Default for ServoGains {
    fn default() -> Self {
        Self { kp: 0.05, ki: 0.01 }
    }
}

/// Accumulated pixel error for the integral term.
///
/// Owned by a single servo run and reset at its start.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlState {
    pub integral_error: Vector2<f64>,
}

impl ControlState {
    #[inline]
    pub fn reset(&mut self) {
        self.integral_error = Vector2::zeros();
    }

    #[inline]
    pub fn accumulate(&mut self, error: Vector2<f64>) {
        self.integral_error += error;
    }
}

/// Image error -> robot displacement law.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlLaw {
    P,
    #[default]
    PI,
}

/// Pixel column error drives robot `y`, pixel row error drives robot `x`.
fn image_to_robot_axes() -> Matrix2<f64> {
    Matrix2::new(
        0.0, 1.0, //
        1.0, 0.0,
    )
}

impl ControlLaw {
    /// Accumulate `error` (pixels, `(e_x, e_y)`) and return the robot XY
    /// increment `(dx, dy)`.
    pub fn increment(
        self,
        gains: &ServoGains,
        error: Vector2<f64>,
        state: &mut ControlState,
    ) -> Vector2<f64> {
        state.accumulate(error);
        let swap = image_to_robot_axes();
        let proportional = -gains.kp * (swap * error);
        match self {
            ControlLaw::P => proportional,
            ControlLaw::PI => proportional - gains.ki * (swap * state.integral_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn p_law_swaps_axes_and_negates() {
        let mut state = ControlState::default();
        let d = ControlLaw::P.increment(
            &ServoGains::default(),
            Vector2::new(40.0, -20.0),
            &mut state,
        );
        // dx = -kp * e_y, dy = -kp * e_x
        assert_relative_eq!(d.x, 1.0);
        assert_relative_eq!(d.y, -2.0);
        assert_eq!(state.integral_error, Vector2::new(40.0, -20.0));
    }

    #[test]
    fn pi_law_adds_integral_term() {
        let gains = ServoGains { kp: 0.05, ki: 0.01 };
        let mut state = ControlState::default();
        let e = Vector2::new(30.0, 50.0);
        let first = ControlLaw::PI.increment(&gains, e, &mut state);
        assert_relative_eq!(first.x, -0.05 * 50.0 - 0.01 * 50.0);
        assert_relative_eq!(first.y, -0.05 * 30.0 - 0.01 * 30.0);

        let second = ControlLaw::PI.increment(&gains, e, &mut state);
        assert_relative_eq!(second.x, -0.05 * 50.0 - 0.01 * 100.0);
        assert_relative_eq!(second.y, -0.05 * 30.0 - 0.01 * 60.0);

        state.reset();
        assert_eq!(state.integral_error, Vector2::zeros());
    }

    #[test]
    fn law_names_round_trip_through_json() {
        assert_eq!(serde_json::to_string(&ControlLaw::PI).unwrap(), "\"pi\"");
        let law: ControlLaw = serde_json::from_str("\"p\"").unwrap();
        assert_eq!(law, ControlLaw::P);
    }
}
