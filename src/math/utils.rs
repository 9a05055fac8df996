use core::f32::consts::{FRAC_PI_2, PI, TAU};

/// Wrap an angle into [0, 2pi).
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let a = angle % TAU;
    if a < 0.0 { a + TAU } else { a }
}

/// Which axis-aligned quarter turn `angle` sits on, if any.
#[inline]
pub fn quarter_turn(angle: f32) -> Option<u8> {
    let a = wrap_angle(angle);
    let eps = 1e-6;
    [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, TAU]
        .iter()
        .position(|q| (a - q).abs() < eps)
        .map(|i| (i % 4) as u8)
}
