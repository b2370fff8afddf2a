/// Gameplay tuning for serve and rally strike trajectories.
///
/// All values are expressed in the Left player's frame (+X toward the
/// opponent); the resolver mirrors the X axis for the Right player.

#[derive(Debug, Clone, Copy)]
pub struct StrikeTuning {
    /// Base forward speed of a serve strike in m/s.
    pub serve_speed: f32,

    /// How much of the paddle speed carries into the serve.
    pub serve_carry: f32,

    /// Upward component of a serve strike in m/s.
    pub serve_lift: f32,

    /// Base forward speed of a rally strike in m/s.
    pub rally_speed: f32,

    /// How much of the paddle speed carries into a rally strike.
    pub rally_carry: f32,

    /// Minimum and maximum forward speed of a rally strike.
    pub rally_speed_min: f32,
    pub rally_speed_max: f32,

    /// Base upward component of a rally strike in m/s.
    pub rally_lift: f32,

    /// Extra lift per meter of distance from the net, so deep balls arc
    /// enough to clear it.
    pub rally_lift_per_meter: f32,

    /// How much lateral paddle velocity carries into the outbound Z velocity.
    pub lateral_carry: f32,

    /// Pull of the outbound Z velocity back toward the table center line.
    pub centering: f32,
}

impl Default for StrikeTuning {
    fn default() -> Self {
        Self {
            serve_speed: 3.2,
            serve_carry: 0.4,
            serve_lift: 2.4,
            rally_speed: 4.5,
            rally_carry: 0.8,
            rally_speed_min: 3.0,
            rally_speed_max: 9.0,
            rally_lift: 1.2,
            rally_lift_per_meter: 1.0,
            lateral_carry: 0.35,
            centering: 0.4,
        }
    }
}
