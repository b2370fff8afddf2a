/// Static collider dimensions, in meters. Defaults follow a regulation
/// table tennis table.

#[derive(Debug, Clone, Copy)]
pub struct TableTuning {
    /// Table length along X.
    pub length: f32,

    /// Table width along Z.
    pub width: f32,

    /// Height of the table surface above the floor.
    pub height: f32,

    /// Height of the net above the table surface.
    pub net_height: f32,

    /// Net half thickness along X.
    pub net_half_thickness: f32,

    /// Distance from the table end to a paddle's rest position along X.
    pub paddle_setback: f32,

    /// Distance behind the table end where the serve hold position sits.
    pub serve_setback: f32,

    /// Height of the serve hold position above the table surface.
    pub serve_hold_height: f32,
}

impl TableTuning {
    pub fn half_length(&self) -> f32 {
        self.length / 2.0
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }
}

impl Default for TableTuning {
    fn default() -> Self {
        Self {
            length: 2.74,
            width: 1.525,
            height: 0.76,
            net_height: 0.1525,
            net_half_thickness: 0.01,
            paddle_setback: 0.1,
            serve_setback: 0.2,
            serve_hold_height: 0.2,
        }
    }
}
