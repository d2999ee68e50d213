use serde::{Serialize, Serializer};

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Wrapper that rounds f64 to 6 decimal places on serialization.
pub(crate) fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

pub(crate) fn serialize_point<S: Serializer>(p: &[f64; 2], s: S) -> Result<S::Ok, S::Error> {
    let rounded = [round_f64(p[0], 6), round_f64(p[1], 6)];
    rounded.serialize(s)
}

pub(crate) fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

// ─── Extents ─────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extents {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub min_x: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub max_x: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub min_y: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub max_y: f64,
}

impl Extents {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Box of half-size `half` around `center`.
    pub fn around(center: [f64; 2], half: [f64; 2]) -> Self {
        Self {
            min_x: center[0] - half[0],
            max_x: center[0] + half[0],
            min_y: center[1] - half[1],
            max_y: center[1] + half[1],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn is_finite(&self) -> bool {
        [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn expand_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(&mut self, other: &Extents) {
        self.expand_point(other.min_x, other.min_y);
        self.expand_point(other.max_x, other.max_y);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }
}
