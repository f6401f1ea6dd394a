//! Scalar helpers and the critically damped spring used for movement smoothing.

use glam::Vec2;

/// Sign with zero mapped to `+1`, matching how facing and patrol directions
/// treat a zero offset.
#[must_use]
pub fn sign(value: f32) -> f32 {
    if value >= 0.0 { 1.0 } else { -1.0 }
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Where `value` lies between `a` and `b`, clamped to `[0, 1]`.
#[must_use]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Step `current` toward `target` by at most `max_delta`.
#[must_use]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + sign(target - current) * max_delta
    }
}

/// Critically damped approach of `current` toward `target`.
///
/// `velocity` carries state between calls and must be kept by the caller.
/// Never overshoots the target.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }
    output
}

/// [`smooth_damp`] applied per axis.
pub fn smooth_damp_vec2(current: Vec2, target: Vec2, velocity: &mut Vec2, smooth_time: f32, dt: f32) -> Vec2 {
    let x = smooth_damp(current.x, target.x, &mut velocity.x, smooth_time, dt);
    let y = smooth_damp(current.y, target.y, &mut velocity.y, smooth_time, dt);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_maps_zero_to_positive() {
        assert_eq!(sign(0.0), 1.0);
        assert_eq!(sign(-0.1), -1.0);
        assert_eq!(sign(3.0), 1.0);
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(lerp(1.0, 150.0, 0.0), 1.0);
        assert_eq!(lerp(1.0, 150.0, 1.0), 150.0);
        assert_eq!(lerp(0.0, 1.0, 2.0), 1.0);
        assert_eq!(lerp(0.0, 1.0, -1.0), 0.0);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(0.0, 10.0, 5.0), 0.5);
        assert_eq!(inverse_lerp(2.0, 2.0, 5.0), 0.0);
    }

    #[test]
    fn test_move_towards_does_not_overshoot() {
        assert_eq!(move_towards(0.0, 1.0, 0.3), 0.3);
        assert_eq!(move_towards(0.9, 1.0, 0.3), 1.0);
        assert_eq!(move_towards(0.0, -1.0, 0.5), -0.5);
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut v = 0.0;
        let mut y = 0.0;
        for _ in 0..200 {
            y = smooth_damp(y, 2.0, &mut v, 0.2, 0.02);
            assert!(y <= 2.0 + 1e-5);
        }
        assert!((y - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_smooth_damp_moves_toward_target_each_step() {
        let mut v = 0.0;
        let first = smooth_damp(5.0, 0.0, &mut v, 0.05, 0.02);
        assert!(first < 5.0 && first > 0.0);
        assert!(v < 0.0);
    }

    #[test]
    fn test_smooth_damp_vec2() {
        let mut v = Vec2::ZERO;
        let mut p = Vec2::ZERO;
        for _ in 0..100 {
            p = smooth_damp_vec2(p, Vec2::new(8.0, -3.0), &mut v, 0.05, 0.02);
        }
        assert!((p - Vec2::new(8.0, -3.0)).length() < 1e-2);
    }
}
