//! Raster model

use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::Crs;
use geoclip_geo::Extent;

/// Per-sample storage type of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl SampleType {
    pub fn bits(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::I8 => 8,
            SampleType::U16 | SampleType::I16 => 16,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 32,
            SampleType::U64 | SampleType::I64 | SampleType::F64 => 64,
        }
    }

    /// TIFF SampleFormat: 1 = unsigned, 2 = signed, 3 = IEEE float
    pub fn sample_format(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 | SampleType::U64 => 1,
            SampleType::I8 | SampleType::I16 | SampleType::I32 | SampleType::I64 => 2,
            SampleType::F32 | SampleType::F64 => 3,
        }
    }
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleType::U8 => "uint8",
            SampleType::I8 => "int8",
            SampleType::U16 => "uint16",
            SampleType::I16 => "int16",
            SampleType::U32 => "uint32",
            SampleType::I32 => "int32",
            SampleType::U64 => "uint64",
            SampleType::I64 => "int64",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        };
        write!(f, "{}", name)
    }
}

/// Pixel to model transform: `x = a*col + b*row + c`, `y = d*col + e*row + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform anchored at the top-left corner `(left, top)`
    pub fn north_up(left: f64, top: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, left, 0.0, -pixel_height, top)
    }

    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (self.a * col + self.b * row + self.c, self.d * col + self.e * row + self.f)
    }

    /// Model to pixel transform, `None` for a singular matrix
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        Some(Affine::new(a, b, -(a * self.c + b * self.f), d, e, -(d * self.c + e * self.f)))
    }

    /// Transform of a window whose top-left pixel is `(col_off, row_off)`
    pub fn translated(&self, col_off: usize, row_off: usize) -> Affine {
        let (c, f) = self.apply(col_off as f64, row_off as f64);
        Affine { c, f, ..*self }
    }

    pub fn is_rotated(&self) -> bool {
        self.b != 0.0 || self.d != 0.0
    }
}

/// Rectangular block of pixels within a raster grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        Self { col_off, row_off, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// In-memory raster with band-interleaved samples.
///
/// Sample `(band, col, row)` lives at `(row * width + col) * bands + band`.
/// Samples are held as `f64` whatever the on-disk type; `sample_type`
/// records the type to write back.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    bands: usize,
    width: usize,
    height: usize,
    sample_type: SampleType,
    data: Vec<f64>,
    transform: Affine,
    crs: Option<Crs>,
    nodata: Option<f64>,
}

impl Raster {
    /// Build a raster, checking that the sample buffer matches the grid
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bands: usize,
        width: usize,
        height: usize,
        sample_type: SampleType,
        data: Vec<f64>,
        transform: Affine,
        crs: Option<Crs>,
        nodata: Option<f64>,
    ) -> Result<Self> {
        if bands == 0 || width == 0 || height == 0 {
            return Err(GeoclipError::processing(
                "raster",
                format!("Raster must have at least one band and pixel, got {}x{}x{}", bands, width, height),
            ));
        }

        let expected = bands * width * height;
        if data.len() != expected {
            return Err(GeoclipError::processing(
                "raster",
                format!("Expected {} samples for {}x{}x{}, got {}", expected, bands, width, height, data.len()),
            ));
        }

        Ok(Self { bands, width, height, sample_type, data, transform, crs, nodata })
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn transform(&self) -> &Affine {
        &self.transform
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, band: usize, col: usize, row: usize) -> f64 {
        self.data[(row * self.width + col) * self.bands + band]
    }

    /// Samples of one band (0-based) in row-major order
    pub fn band(&self, band: usize) -> Vec<f64> {
        self.data.iter().skip(band).step_by(self.bands).copied().collect()
    }

    /// Model-space extent covered by the whole grid
    pub fn extent(&self) -> Extent {
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [
            self.transform.apply(0.0, 0.0),
            self.transform.apply(w, 0.0),
            self.transform.apply(0.0, h),
            self.transform.apply(w, h),
        ];

        let (mut left, mut bottom) = (f64::INFINITY, f64::INFINITY);
        let (mut right, mut top) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            left = left.min(x);
            right = right.max(x);
            bottom = bottom.min(y);
            top = top.max(y);
        }

        Extent::new(left, bottom, right, top)
    }
}
