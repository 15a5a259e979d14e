use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued 2D field data (rows x columns)
pub type WindArray = Array2<f64>;

/// Mask code: cell is not usable (no data / inversion failed)
pub const MASK_INVALID: i8 = 0;
/// Mask code: cell is valid open water
pub const MASK_VALID: i8 = 1;
/// Mask code: cell is land
pub const MASK_LAND: i8 = 2;
/// Mask code: cell is covered by sea ice ("under" the valid color range)
pub const MASK_ICE: i8 = -1;

/// Polarization channels for SAR acquisitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

/// Product-level polarisation of a Sentinel-1 acquisition, as encoded in
/// SAFE product names (e.g. `S1A_EW_GRDM_1SDH_...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductPolarisation {
    /// Dual HH+HV
    HhHv,
    /// Dual VV+VH
    VvVh,
    /// Single HH
    Hh,
    /// Single VV
    Vv,
}

impl ProductPolarisation {
    /// Detect the product polarisation from a SAFE product name.
    ///
    /// Returns `None` for names that carry no recognizable polarisation tag
    /// rather than guessing a channel.
    pub fn from_product_name(name: &str) -> Option<Self> {
        if name.contains("_1SDH_") {
            Some(ProductPolarisation::HhHv)
        } else if name.contains("_1SDV_") {
            Some(ProductPolarisation::VvVh)
        } else if name.contains("_1SSH_") {
            Some(ProductPolarisation::Hh)
        } else if name.contains("_1SSV_") {
            Some(ProductPolarisation::Vv)
        } else {
            None
        }
    }

    /// True if the co-polarized channel of this product is HH
    pub fn is_hh(&self) -> bool {
        matches!(self, ProductPolarisation::HhHv | ProductPolarisation::Hh)
    }
}

/// Affine pixel-to-geographic transformation (GDAL convention)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with no rotation terms
    pub fn north_up(top_left_x: f64, top_left_y: f64, pixel_size: f64) -> Self {
        Self {
            top_left_x,
            pixel_width: pixel_size,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height: -pixel_size,
        }
    }
}

/// Georeference of a raster grid: shape plus the affine transform mapping
/// (row, col) pixel coordinates to geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// (rows, columns)
    pub shape: (usize, usize),
    pub geo_transform: GeoTransform,
}

impl GridGeometry {
    pub fn new(shape: (usize, usize), geo_transform: GeoTransform) -> Self {
        Self { shape, geo_transform }
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Geographic coordinates of a (row, col) pixel position
    pub fn pixel_to_geo(&self, row: f64, col: f64) -> (f64, f64) {
        let gt = &self.geo_transform;
        let x = gt.top_left_x + col * gt.pixel_width + row * gt.rotation_x;
        let y = gt.top_left_y + col * gt.rotation_y + row * gt.pixel_height;
        (x, y)
    }

    /// Corner coordinates in the order upper-left, lower-left, upper-right,
    /// lower-right. Returns (xs, ys).
    pub fn corners(&self) -> ([f64; 4], [f64; 4]) {
        let rows = self.shape.0 as f64;
        let cols = self.shape.1 as f64;
        let ul = self.pixel_to_geo(0.0, 0.0);
        let ll = self.pixel_to_geo(rows, 0.0);
        let ur = self.pixel_to_geo(0.0, cols);
        let lr = self.pixel_to_geo(rows, cols);
        ([ul.0, ll.0, ur.0, lr.0], [ul.1, ll.1, ur.1, lr.1])
    }

    /// Compass bearing (degrees, 0 = north, 90 = east) of the grid's "up"
    /// direction, i.e. the direction of decreasing row index.
    pub fn azimuth_up(&self) -> f64 {
        let gt = &self.geo_transform;
        // One step up in row space moves (-rotation_x, -pixel_height) in geo space
        let east = -gt.rotation_x;
        let north = -gt.pixel_height;
        let az = east.atan2(north).to_degrees();
        az.rem_euclid(360.0)
    }
}

/// A 2D field of values with its georeference and acquisition time.
///
/// Fields are immutable after construction; pipeline stages derive new
/// fields rather than editing existing ones.
#[derive(Debug, Clone)]
pub struct RasterField {
    pub data: WindArray,
    pub grid: GridGeometry,
    pub time: DateTime<Utc>,
}

impl RasterField {
    /// Create a field, checking that the data shape matches the grid shape
    pub fn new(data: WindArray, grid: GridGeometry, time: DateTime<Utc>) -> WindResult<Self> {
        if data.dim() != grid.shape {
            return Err(WindError::GridMismatch(format!(
                "data shape {:?} does not match grid shape {:?}",
                data.dim(),
                grid.shape
            )));
        }
        Ok(Self { data, grid, time })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Wind direction-from (degrees, 0 = from north, 90 = from east) and the
/// model wind speed it was derived with, if any, in geographic convention.
#[derive(Debug, Clone)]
pub struct WindVectorField {
    pub direction: RasterField,
    /// Model wind speed (m/s), available when the source provided vector
    /// components rather than a bare direction
    pub model_speed: Option<RasterField>,
    /// Identifier of the data source this field was resolved from
    pub provenance: Option<String>,
    pub time: DateTime<Utc>,
}

impl WindVectorField {
    pub fn new(direction: RasterField, model_speed: Option<RasterField>) -> Self {
        let time = direction.time;
        Self {
            direction,
            model_speed,
            provenance: None,
            time,
        }
    }

    /// Record the source identifier, unless a caller already set one
    pub fn set_provenance_if_unset(&mut self, source: &str) {
        if self.provenance.is_none() {
            self.provenance = Some(source.to_string());
        }
    }
}

/// Radar backscatter observation co-located with the SAR grid
#[derive(Debug, Clone)]
pub struct BackscatterObservation {
    /// Normalized radar cross section (linear units)
    pub sigma0: RasterField,
    pub polarization: Polarization,
    /// Incidence angle (degrees, 0-90)
    pub incidence: RasterField,
    /// Sensor look direction (degrees clockwise from north)
    pub sensor_azimuth: RasterField,
}

/// Per-pixel validity codes built up by the masking stages.
///
/// Masking is monotonic: once a cell leaves the valid state it is never
/// returned to it, except for the explicit land-to-invalid remap applied
/// when exporting the `valid` band.
#[derive(Debug, Clone)]
pub struct ValidityMask {
    pub codes: Array2<i8>,
}

impl ValidityMask {
    /// Start from an all-valid mask of the given shape
    pub fn all_valid(shape: (usize, usize)) -> Self {
        Self {
            codes: Array2::from_elem(shape, MASK_VALID),
        }
    }

    /// Number of cells carrying the given code
    pub fn count(&self, code: i8) -> usize {
        self.codes.iter().filter(|&&c| c == code).count()
    }

    /// The `valid` band for export: land cells are remapped to invalid, so
    /// all pixels not equal to 1 are invalid.
    pub fn export_valid(&self) -> Array2<i8> {
        self.codes
            .mapv(|c| if c == MASK_LAND { MASK_INVALID } else { c })
    }
}

/// Outcome of an optional masking stage, so degraded runs can be
/// introspected instead of silently falling through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskStageResult {
    /// The stage ran and flagged this many cells
    Applied { cells: usize },
    /// The stage could not run; the run is degraded, not failed
    Unavailable { reason: String },
}

impl MaskStageResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, MaskStageResult::Applied { .. })
    }
}

/// Metadata attached to a completed retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMetadata {
    /// Identifier of the wind-direction source
    pub wind_direction_source: Option<String>,
    /// Wall-clock time the retrieval was computed
    pub computed_at: DateTime<Utc>,
    /// Timestamp of the auxiliary wind field
    pub wind_direction_time: DateTime<Utc>,
    /// Absolute gap between SAR acquisition and auxiliary field (hours)
    pub aux_time_gap_hours: f64,
    /// Non-fatal conditions accumulated during the run
    pub warnings: Vec<String>,
    pub land_masking: MaskStageResult,
    pub ice_masking: MaskStageResult,
}

/// The single output artifact of a pipeline run. Created once per
/// successful run and immutable thereafter.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// Retrieved wind speed (m/s) on the SAR grid
    pub windspeed: RasterField,
    /// Wind direction-from used for the inversion (degrees)
    pub direction: RasterField,
    /// Eastward wind component (m/s)
    pub u: RasterField,
    /// Northward wind component (m/s)
    pub v: RasterField,
    /// Model wind speed, when the auxiliary source provided one
    pub model_speed: Option<RasterField>,
    pub mask: ValidityMask,
    /// Wind speed prepared for visualization: negatives clipped, land
    /// removed, ice flagged, display ceiling applied
    pub display_speed: RasterField,
    pub metadata: RetrievalMetadata,
}

impl RetrievalResult {
    /// Bands selected for numeric export, in the order the writers expect:
    /// eastward wind, northward wind, the `valid` band, and the model wind
    /// speed when available.
    pub fn export_bands(&self) -> Vec<(&'static str, WindArray)> {
        let mut bands = vec![
            ("eastward_wind", self.u.data.clone()),
            ("northward_wind", self.v.data.clone()),
            ("valid", self.mask.export_valid().mapv(f64::from)),
        ];
        if let Some(model) = &self.model_speed {
            bands.push(("model_windspeed", model.data.clone()));
        }
        bands
    }
}

/// Error types for wind retrieval
#[derive(Debug, thiserror::Error)]
pub enum WindError {
    #[error("no usable wind direction source: {0}")]
    Resolution(String),

    #[error("required band missing: {0}")]
    MissingBand(String),

    #[error("time difference is {hours:.2} hours - impossible to estimate reliable wind field")]
    TimeDiff { hours: f64 },

    #[error("grid mismatch: {0}")]
    GridMismatch(String),

    #[error("invalid data: {0}")]
    InvalidFormat(String),

    #[error("processing error: {0}")]
    Processing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wind retrieval operations
pub type WindResult<T> = Result<T, WindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_polarisation_detection() {
        let name = "S1A_EW_GRDM_1SDH_20210324T035507_20210324T035612_037135_045F42_5B4C";
        assert_eq!(
            ProductPolarisation::from_product_name(name),
            Some(ProductPolarisation::HhHv)
        );
        assert!(ProductPolarisation::from_product_name(name).unwrap().is_hh());

        let name = "S1A_IW_GRDH_1SDV_20221026T054447_20221026T054512_045609_05740C_2B2A";
        assert_eq!(
            ProductPolarisation::from_product_name(name),
            Some(ProductPolarisation::VvVh)
        );

        // A name with no polarisation tag must not classify as single-pol HH
        assert_eq!(
            ProductPolarisation::from_product_name("arome_arctic_vtk_20210324T03Z"),
            None
        );
    }

    #[test]
    fn test_azimuth_up_north_aligned() {
        let grid = GridGeometry::new((10, 10), GeoTransform::north_up(0.0, 10.0, 0.01));
        assert!(grid.azimuth_up().abs() < 1e-12);
    }

    #[test]
    fn test_corners_order() {
        let grid = GridGeometry::new((100, 200), GeoTransform::north_up(5.0, 80.0, 0.01));
        let (xs, ys) = grid.corners();
        // Upper-left is north of lower-left and west of upper-right
        assert!(ys[0] > ys[1]);
        assert!(xs[0] < xs[2]);
    }

    #[test]
    fn test_raster_field_shape_check() {
        let grid = GridGeometry::new((4, 4), GeoTransform::north_up(0.0, 0.0, 1.0));
        let bad = RasterField::new(WindArray::zeros((3, 4)), grid, chrono::Utc::now());
        assert!(matches!(bad, Err(WindError::GridMismatch(_))));
    }

    #[test]
    fn test_export_valid_remaps_land() {
        let mut mask = ValidityMask::all_valid((2, 2));
        mask.codes[[0, 0]] = MASK_LAND;
        mask.codes[[0, 1]] = MASK_ICE;
        let valid = mask.export_valid();
        assert_eq!(valid[[0, 0]], MASK_INVALID);
        assert_eq!(valid[[0, 1]], MASK_ICE);
        assert_eq!(valid[[1, 1]], MASK_VALID);
    }
}
