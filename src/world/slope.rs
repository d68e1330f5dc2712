/// Continuous height surfaces for a single cell.
///
/// Local coordinates (u, v) run from the cell's top corner: u along world x,
/// v along world y. Ramps are named after the diamond edge they run down to,
/// corners after the diamond vertex that holds the peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlopeKind {
    TopLeftRamp,
    TopRightRamp,
    BottomRightRamp,
    BottomLeftRamp,
    TopCorner,
    RightCorner,
    BottomCorner,
    LeftCorner,
}

impl SlopeKind {
    /// Catalogue order, which is also the frame order of the slope sheet
    pub const ALL: [SlopeKind; 8] = [
        SlopeKind::TopLeftRamp,
        SlopeKind::TopRightRamp,
        SlopeKind::BottomRightRamp,
        SlopeKind::BottomLeftRamp,
        SlopeKind::TopCorner,
        SlopeKind::RightCorner,
        SlopeKind::BottomCorner,
        SlopeKind::LeftCorner,
    ];

    /// Height contribution at local (u, v), always within [0, 1]
    pub fn height(self, u: f32, v: f32) -> f32 {
        let raw = match self {
            SlopeKind::TopLeftRamp => u,
            SlopeKind::TopRightRamp => v,
            SlopeKind::BottomRightRamp => 1.0 - u,
            SlopeKind::BottomLeftRamp => 1.0 - v,
            SlopeKind::TopCorner => corner_bump(u, v, 0.0, 0.0),
            SlopeKind::RightCorner => corner_bump(u, v, 1.0, 0.0),
            SlopeKind::BottomCorner => corner_bump(u, v, 1.0, 1.0),
            SlopeKind::LeftCorner => corner_bump(u, v, 0.0, 1.0),
        };
        // NaN from drifting inputs collapses to the floor of the cell.
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            SlopeKind::TopCorner
                | SlopeKind::RightCorner
                | SlopeKind::BottomCorner
                | SlopeKind::LeftCorner
        )
    }

    /// Local (u, v) of the highest point of the surface.
    /// Ramps report the midpoint of their high edge.
    pub fn peak(self) -> (f32, f32) {
        match self {
            SlopeKind::TopLeftRamp => (1.0, 0.5),
            SlopeKind::TopRightRamp => (0.5, 1.0),
            SlopeKind::BottomRightRamp => (0.0, 0.5),
            SlopeKind::BottomLeftRamp => (0.5, 0.0),
            SlopeKind::TopCorner => (0.0, 0.0),
            SlopeKind::RightCorner => (1.0, 0.0),
            SlopeKind::BottomCorner => (1.0, 1.0),
            SlopeKind::LeftCorner => (0.0, 1.0),
        }
    }

    /// Frame index in the slope sheet
    pub fn sheet_index(self) -> usize {
        self as usize
    }
}

#[inline]
fn corner_bump(u: f32, v: f32, peak_u: f32, peak_v: f32) -> f32 {
    let du = u - peak_u;
    let dv = v - peak_v;
    1.0 - (du * du + dv * dv).sqrt()
}
