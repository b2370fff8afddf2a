/// Gameplay tuning for paddle kinematics and remote paddle smoothing.

#[derive(Debug, Clone, Copy)]
pub struct PaddleTuning {
    /// Maximum kinematic speed toward the target position in m/s.
    pub follow_speed: f32,

    /// Collision box half extent along the table length (X) in meters.
    pub half_depth: f32,

    /// Collision box half extent vertically (Y) in meters.
    pub half_height: f32,

    /// Collision box half extent across the table (Z) in meters.
    pub half_width: f32,

    /// Remote paddle: extrapolation error beyond which we snap to the
    /// dead-reckoned position instead of blending.
    pub snap_distance: f32,

    /// Remote paddle: speed above which we always blend (a fast paddle makes
    /// snapping visually jarring).
    pub fast_speed: f32,

    /// Remote paddle: exponential blend rate toward the extrapolated target,
    /// per second.
    pub blend_rate: f32,
}

impl Default for PaddleTuning {
    fn default() -> Self {
        Self {
            follow_speed: 6.0,
            half_depth: 0.02,
            half_height: 0.09,
            half_width: 0.08,
            snap_distance: 0.25,
            fast_speed: 3.0,
            blend_rate: 18.0,
        }
    }
}
