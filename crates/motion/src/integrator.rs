use glam::Vec3;
use serde::{Deserialize, Serialize};
use skyisle_input::MovementFlags;

/// Tuning for the movement integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Exponential damping rate, per second.
    pub damping: f32,
    /// Acceleration while a movement key is held, units per second squared.
    pub acceleration: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            damping: 10.0,
            acceleration: 400.0,
        }
    }
}

impl MotionParams {
    /// Speed approached while a single axis is held.
    pub fn terminal_speed(&self) -> f32 {
        if self.damping > 0.0 {
            self.acceleration / self.damping
        } else {
            f32::INFINITY
        }
    }
}

/// How far the rig moves this frame, along its own horizontal axes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Displacement {
    pub right: f32,
    pub forward: f32,
}

impl Displacement {
    pub fn is_zero(&self) -> bool {
        self.right == 0.0 && self.forward == 0.0
    }
}

/// Velocity and direction carried from one frame to the next.
///
/// Velocity is stored in rig space with the sign convention of a camera that
/// looks down −Z: holding forward drives `velocity.z` negative, holding right
/// drives `velocity.x` negative, and the displacement negates both back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kinematics {
    pub velocity: Vec3,
    pub direction: Vec3,
}

impl Kinematics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Advance one frame of `dt` seconds.
    pub fn step(&mut self, flags: &MovementFlags, params: &MotionParams, dt: f32) -> Displacement {
        let dt = dt.max(0.0);

        // A step longer than 1/damping would flip the sign of the velocity.
        let keep = (1.0 - params.damping * dt).max(0.0);
        self.velocity.x *= keep;
        self.velocity.z *= keep;

        self.direction = flags.direction();

        if flags.longitudinal() {
            self.velocity.z -= self.direction.z * params.acceleration * dt;
        }
        if flags.lateral() {
            self.velocity.x -= self.direction.x * params.acceleration * dt;
        }

        Displacement {
            right: -self.velocity.x * dt,
            forward: -self.velocity.z * dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn forward() -> MovementFlags {
        MovementFlags {
            forward: true,
            ..Default::default()
        }
    }

    #[test]
    fn idle_stays_idle() {
        let mut k = Kinematics::new();
        let d = k.step(&MovementFlags::new(), &MotionParams::default(), DT);
        assert!(d.is_zero());
        assert_eq!(k.velocity, Vec3::ZERO);
    }

    #[test]
    fn forward_moves_forward() {
        let mut k = Kinematics::new();
        let d = k.step(&forward(), &MotionParams::default(), DT);
        assert!(d.forward > 0.0);
        assert_eq!(d.right, 0.0);
        assert!(k.velocity.z < 0.0);
    }

    #[test]
    fn right_moves_right_and_left_moves_left() {
        let params = MotionParams::default();
        let mut k = Kinematics::new();
        let right = MovementFlags {
            right: true,
            ..Default::default()
        };
        assert!(k.step(&right, &params, DT).right > 0.0);

        let mut k = Kinematics::new();
        let left = MovementFlags {
            left: true,
            ..Default::default()
        };
        assert!(k.step(&left, &params, DT).right < 0.0);
    }

    #[test]
    fn velocity_decays_monotonically_when_released() {
        let params = MotionParams::default();
        let mut k = Kinematics::new();
        let diag = MovementFlags {
            forward: true,
            left: true,
            ..Default::default()
        };
        for _ in 0..30 {
            k.step(&diag, &params, DT);
        }
        let mut prev = k.speed();
        assert!(prev > 0.0);
        for _ in 0..300 {
            k.step(&MovementFlags::new(), &params, DT);
            let s = k.speed();
            assert!(s <= prev, "speed rose from {prev} to {s}");
            prev = s;
        }
        assert!(prev < 1e-3);
    }

    #[test]
    fn long_frames_do_not_reverse_velocity() {
        let params = MotionParams::default();
        let mut k = Kinematics {
            velocity: Vec3::new(5.0, 0.0, -20.0),
            direction: Vec3::ZERO,
        };
        k.step(&MovementFlags::new(), &params, 0.5);
        assert_eq!(k.velocity, Vec3::ZERO);
    }

    #[test]
    fn one_second_forward_matches_recurrence() {
        let params = MotionParams::default();
        let mut k = Kinematics::new();
        let mut travelled = 0.0_f64;
        for _ in 0..60 {
            travelled += k.step(&forward(), &params, DT).forward as f64;
        }

        // v_n = -(a/k)(1 - r^n), r = 1 - k*dt; distance = sum of -v_n*dt.
        let (a, kd, dt, n) = (400.0_f64, 10.0_f64, 1.0_f64 / 60.0, 60.0_f64);
        let r = 1.0 - kd * dt;
        let expected = (a / kd) * (n * dt - r * (1.0 - r.powf(n)) / kd);
        assert!(
            (travelled - expected).abs() < 1e-2,
            "travelled {travelled}, expected {expected}"
        );
        // And close to the continuous solution.
        let continuous = (a / kd) * (1.0 - (1.0 - (-kd).exp()) / kd);
        assert!((travelled - continuous).abs() < 1.0);
    }

    #[test]
    fn diagonal_speed_bounded_by_axis_speed() {
        let params = MotionParams::default();
        let mut axis = Kinematics::new();
        let mut diag = Kinematics::new();
        let both = MovementFlags {
            forward: true,
            right: true,
            ..Default::default()
        };
        for _ in 0..120 {
            axis.step(&forward(), &params, DT);
            diag.step(&both, &params, DT);
        }
        assert!(diag.speed() <= axis.speed() + 1e-3);
        assert!((axis.speed() - params.terminal_speed()).abs() < 0.5);
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut k = Kinematics::new();
        let d = k.step(&forward(), &MotionParams::default(), -1.0);
        assert!(d.is_zero());
    }
}
