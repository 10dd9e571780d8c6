//! Named color scales for ridge lines, as piecewise-linear ramps through
//! fixed RGB control points.

/// Scheme name the UI selects when nothing else has been chosen. Must
/// resolve through [`Colormap::from_name`]; callers check this at startup.
pub const DEFAULT_COLORMAP: &str = "viridis";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Colormap {
    #[default]
    Viridis,
    Inferno,
    Magma,
    Plasma,
    Cividis,
    Turbo,
    Greys,
}

const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 73, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [110, 206, 88],
    [253, 231, 37],
];

const INFERNO: [[u8; 3]; 8] = [
    [0, 0, 4],
    [40, 11, 84],
    [101, 21, 110],
    [159, 42, 99],
    [212, 72, 66],
    [245, 125, 21],
    [250, 193, 39],
    [252, 255, 164],
];

const MAGMA: [[u8; 3]; 8] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [252, 253, 191],
];

const PLASMA: [[u8; 3]; 8] = [
    [13, 8, 135],
    [84, 2, 163],
    [139, 10, 165],
    [185, 50, 137],
    [219, 92, 104],
    [244, 136, 73],
    [254, 188, 43],
    [240, 249, 33],
];

const CIVIDIS: [[u8; 3]; 7] = [
    [0, 32, 77],
    [42, 59, 105],
    [87, 86, 100],
    [128, 112, 92],
    [170, 139, 77],
    [214, 169, 57],
    [255, 233, 69],
];

const TURBO: [[u8; 3]; 10] = [
    [48, 18, 59],
    [70, 110, 230],
    [40, 160, 240],
    [40, 200, 180],
    [100, 230, 100],
    [190, 230, 50],
    [250, 190, 40],
    [240, 120, 30],
    [200, 50, 20],
    [122, 4, 3],
];

const GREYS: [[u8; 3]; 2] = [[250, 250, 250], [20, 20, 20]];

impl Colormap {
    pub const ALL: [Colormap; 7] = [
        Colormap::Viridis,
        Colormap::Inferno,
        Colormap::Magma,
        Colormap::Plasma,
        Colormap::Cividis,
        Colormap::Turbo,
        Colormap::Greys,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Viridis => "viridis",
            Colormap::Inferno => "inferno",
            Colormap::Magma => "magma",
            Colormap::Plasma => "plasma",
            Colormap::Cividis => "cividis",
            Colormap::Turbo => "turbo",
            Colormap::Greys => "greys",
        }
    }

    pub fn from_name(name: &str) -> Option<Colormap> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    fn stops(self) -> &'static [[u8; 3]] {
        match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Inferno => &INFERNO,
            Colormap::Magma => &MAGMA,
            Colormap::Plasma => &PLASMA,
            Colormap::Cividis => &CIVIDIS,
            Colormap::Turbo => &TURBO,
            Colormap::Greys => &GREYS,
        }
    }

    /// Sample the scale at `t` in [0, 1]; out-of-range values clamp.
    pub fn sample(self, t: f32) -> [u8; 3] {
        let stops = self.stops();
        let t = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
        let lo = (t.floor() as usize).min(stops.len() - 2);
        lerp_rgb(stops[lo], stops[lo + 1], t - lo as f32)
    }
}

#[inline]
fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
    ]
}
