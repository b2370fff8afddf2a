/// Gameplay tuning for the spin model (Magnus nudge and impact torque).

#[derive(Debug, Clone, Copy)]
pub struct SpinTuning {
    /// Paddle speed below which a swing imparts no spin, in m/s.
    pub activation_speed: f32,

    /// Paddle speed at which imparted spin reaches its cap, in m/s.
    pub cap_speed: f32,

    /// Hard ceiling on imparted spin magnitude (angular-velocity proxy).
    pub max_spin: f32,

    /// Multiplicative spin decay applied once per tick while spin is active.
    pub decay_factor: f32,

    /// Spin magnitude under which the Magnus nudge stops, to avoid a ball
    /// that floats and jitters forever on residual spin.
    pub rest_band: f32,

    /// Scale of the per-tick Magnus velocity nudge.
    pub magnus_factor: f32,

    /// Impact torque scale, multiplied by the ball radius at the call site.
    pub torque_factor: f32,

    /// Ceiling on the impact torque magnitude.
    pub max_torque: f32,
}

impl Default for SpinTuning {
    fn default() -> Self {
        Self {
            activation_speed: 1.0,
            cap_speed: 8.0,
            max_spin: 30.0,
            decay_factor: 0.985,
            rest_band: 0.5,
            magnus_factor: 0.004,
            torque_factor: 1.5,
            max_torque: 12.0,
        }
    }
}
