/// Gameplay tuning for the ball body.

#[derive(Debug, Clone, Copy)]
pub struct BallTuning {
    /// Ball radius in meters.
    pub radius: f32,

    /// Ball mass in kilograms.
    pub mass: f32,

    /// Downward gravitational acceleration in m/s².
    pub gravity: f32,

    /// Fraction of vertical speed kept on a table bounce.
    pub table_restitution: f32,

    /// Multiplicative spin loss on a table bounce.
    pub table_spin_keep: f32,

    /// Overall velocity damping applied on a net contact.
    pub net_damping: f32,

    /// Overall velocity damping applied on a floor contact.
    pub floor_damping: f32,

    /// Upward release speed of the serve toss in m/s.
    pub toss_speed: f32,
}

impl Default for BallTuning {
    fn default() -> Self {
        Self {
            radius: 0.02,
            mass: 0.0027,
            gravity: 9.81,
            table_restitution: 0.88,
            table_spin_keep: 0.8,
            net_damping: 0.25,
            floor_damping: 0.4,
            toss_speed: 2.8,
        }
    }
}
