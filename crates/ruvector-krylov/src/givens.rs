//! Plane rotations for the incremental QR factorization inside GMRES.

/// Rotation `[c s; -s c]` that maps `(x, y)` to `(r, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GivensRotation {
    c: f64,
    s: f64,
}

impl GivensRotation {
    /// Rotation zeroing `y` against `x`.
    ///
    /// Both components are scaled by `|x| + |y|` before squaring so large
    /// inputs do not overflow. `x = y = 0` gives the identity.
    pub fn new(x: f64, y: f64) -> Self {
        let roe = if x.abs() > y.abs() { x } else { y };
        let scale = x.abs() + y.abs();
        if scale == 0.0 {
            return Self { c: 1.0, s: 0.0 };
        }

        let xs = x / scale;
        let ys = y / scale;
        let mut r = scale * (xs * xs + ys * ys).sqrt();
        if roe < 0.0 {
            r = -r;
        }
        Self { c: x / r, s: y / r }
    }

    /// Cosine.
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Sine.
    pub fn s(&self) -> f64 {
        self.s
    }

    /// Rotate rows `i1` and `i2` of one column of a column-stored matrix.
    #[inline]
    pub fn apply_to_column(&self, h: &mut [Vec<f64>], column: usize, i1: usize, i2: usize) {
        let col = &mut h[column];
        let temp = self.c * col[i1] + self.s * col[i2];
        col[i2] = -self.s * col[i1] + self.c * col[i2];
        col[i1] = temp;
    }

    /// Rotate elements `i1` and `i2` of a vector.
    #[inline]
    pub fn apply_to_vector(&self, v: &mut [f64], i1: usize, i2: usize) {
        let temp = self.c * v[i1] + self.s * v[i2];
        v[i2] = -self.s * v[i1] + self.c * v[i2];
        v[i1] = temp;
    }
}
