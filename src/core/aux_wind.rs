use crate::core::frame;
use crate::io::registry::{AdapterQuery, AuxLocator, AuxSourceProvider};
use crate::io::store::{BandMeta, RasterStore, ResampleAlg};
use crate::types::{
    GridGeometry, RasterField, WindArray, WindError, WindResult, WindVectorField,
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// CF standard name of a direct wind direction band
pub const DIRECTION_STANDARD_NAME: &str = "wind_from_direction";
/// CF standard name of a model wind speed band
pub const WIND_SPEED_STANDARD_NAME: &str = "wind_speed";
pub const EASTWARD_STANDARD_NAME: &str = "eastward_wind";
pub const NORTHWARD_STANDARD_NAME: &str = "northward_wind";

/// Grid-relative component bands, tried in this order: 10 m level name,
/// bare name, secondary height-level tag (AROME-style datasets)
pub const X_WIND_FALLBACK: [&str; 3] = ["x_wind_10m", "x_wind", "x_wind_height2"];
pub const Y_WIND_FALLBACK: [&str; 3] = ["y_wind_10m", "y_wind", "y_wind_height2"];

/// Metadata key carrying the source identifier on pre-loaded stores
pub const SOURCE_METADATA_KEY: &str = "wind_direction_source";

/// Heterogeneous specification of where the auxiliary wind direction
/// comes from
pub enum WindSource {
    /// Uniform wind direction in degrees (no speed information)
    Constant(f64),
    /// Per-pixel wind directions, already on the SAR grid
    Directions(WindArray),
    /// Name of a registered source adapter; the SAR acquisition time is
    /// appended to locate the right file
    Adapter(String),
    /// Explicit auxiliary file
    Path(PathBuf),
    /// An already-opened store with wind information
    Loaded(Box<dyn RasterStore>),
}

impl std::fmt::Debug for WindSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindSource::Constant(d) => write!(f, "Constant({})", d),
            WindSource::Directions(a) => write!(f, "Directions({:?})", a.dim()),
            WindSource::Adapter(name) => write!(f, "Adapter({})", name),
            WindSource::Path(p) => write!(f, "Path({})", p.display()),
            WindSource::Loaded(s) => write!(f, "Loaded({})", s.source_id()),
        }
    }
}

/// Resolves a [`WindSource`] into a normalized wind direction/speed field
/// in geographic convention, reprojected onto the SAR grid.
pub struct AuxWindResolver<'a> {
    provider: &'a dyn AuxSourceProvider,
    resample_alg: ResampleAlg,
}

impl<'a> AuxWindResolver<'a> {
    pub fn new(provider: &'a dyn AuxSourceProvider, resample_alg: ResampleAlg) -> Self {
        Self {
            provider,
            resample_alg,
        }
    }

    pub fn resolve(
        &self,
        source: WindSource,
        sar_time: DateTime<Utc>,
        sar_grid: &GridGeometry,
    ) -> WindResult<WindVectorField> {
        match source {
            WindSource::Constant(degrees) => {
                let normalized = frame::normalize_degrees(degrees);
                log::info!("Using constant wind direction of {} degrees", normalized);
                let direction = WindArray::from_elem(sar_grid.shape, normalized);
                let field = RasterField::new(direction, *sar_grid, sar_time)?;
                let mut wind = WindVectorField::new(field, None);
                // Provenance records the normalized value, matching the field
                wind.set_provenance_if_unset(&format!("constant:{}", normalized));
                Ok(wind)
            }
            WindSource::Directions(directions) => {
                if directions.dim() != sar_grid.shape {
                    return Err(WindError::GridMismatch(format!(
                        "direction array shape {:?} does not match SAR grid {:?}",
                        directions.dim(),
                        sar_grid.shape
                    )));
                }
                let direction = directions.mapv(frame::normalize_degrees);
                let field = RasterField::new(direction, *sar_grid, sar_time)?;
                let mut wind = WindVectorField::new(field, None);
                wind.set_provenance_if_unset("direction_array");
                Ok(wind)
            }
            WindSource::Adapter(name) => {
                let query = AdapterQuery::new(&name, sar_time);
                let source_id = query.decorated_id();
                log::info!("Resolving wind direction from source adapter {}", source_id);
                let store = self.provider.open(&AuxLocator::Adapter(query))?;
                self.from_store(store, sar_grid, Some(source_id))
            }
            WindSource::Path(path) => {
                let locator = AuxLocator::Path(path);
                let source_id = locator.source_id();
                log::info!("Resolving wind direction from file {}", source_id);
                let store = self.provider.open(&locator)?;
                self.from_store(store, sar_grid, Some(source_id))
            }
            WindSource::Loaded(store) => {
                log::info!(
                    "Resolving wind direction from pre-loaded source {}",
                    store.source_id()
                );
                self.from_store(store, sar_grid, None)
            }
        }
    }

    /// Band discovery policy: direct direction quantity first, then
    /// geographic components, then grid-relative components rotated into
    /// the geographic frame.
    fn from_store(
        &self,
        mut store: Box<dyn RasterStore>,
        sar_grid: &GridGeometry,
        source_id: Option<String>,
    ) -> WindResult<WindVectorField> {
        // Grid-relative components must be rotated on the native grid,
        // where the stored azimuth applies, before any reprojection
        if !store.has_band(DIRECTION_STANDARD_NAME) && !store.has_band(EASTWARD_STANDARD_NAME) {
            self.derive_geographic_components(store.as_mut())?;
        }

        store.reproject(sar_grid, self.resample_alg)?;
        let aux_time = store.time_coverage_start();

        let (direction, model_speed) = if store.has_band(DIRECTION_STANDARD_NAME) {
            let direction = store
                .band(DIRECTION_STANDARD_NAME)?
                .mapv(frame::normalize_degrees);
            let speed = if store.has_band(WIND_SPEED_STANDARD_NAME) {
                Some(store.band(WIND_SPEED_STANDARD_NAME)?)
            } else {
                None
            };
            (direction, speed)
        } else {
            let uu = store.band(EASTWARD_STANDARD_NAME).map_err(|_| {
                WindError::Resolution("could not read wind vectors".to_string())
            })?;
            let vv = store.band(NORTHWARD_STANDARD_NAME).map_err(|_| {
                WindError::Resolution("could not read wind vectors".to_string())
            })?;
            (frame::direction_from(&uu, &vv), Some(frame::speed_from(&uu, &vv)))
        };

        let direction = RasterField::new(direction, *sar_grid, aux_time)?;
        let model_speed = model_speed
            .map(|speed| RasterField::new(speed, *sar_grid, aux_time))
            .transpose()?;

        let mut wind = WindVectorField::new(direction, model_speed);
        // A source identifier already carried by the store wins over the
        // one derived from the locator
        if let Some(existing) = store.metadata(SOURCE_METADATA_KEY) {
            wind.set_provenance_if_unset(&existing);
        }
        if let Some(id) = source_id {
            wind.set_provenance_if_unset(&id);
        }
        wind.set_provenance_if_unset(store.source_id());
        Ok(wind)
    }

    fn derive_geographic_components(&self, store: &mut dyn RasterStore) -> WindResult<()> {
        let pair = X_WIND_FALLBACK
            .iter()
            .zip(Y_WIND_FALLBACK.iter())
            .find(|(x, y)| store.has_band(x) && store.has_band(y));
        let (x_name, y_name) = match pair {
            Some((x, y)) => (*x, *y),
            None => {
                return Err(WindError::Resolution(format!(
                    "no wind direction or component bands in '{}' (tried {}, {}/{}, {:?}/{:?})",
                    store.source_id(),
                    DIRECTION_STANDARD_NAME,
                    EASTWARD_STANDARD_NAME,
                    NORTHWARD_STANDARD_NAME,
                    X_WIND_FALLBACK,
                    Y_WIND_FALLBACK,
                )))
            }
        };
        log::debug!("Deriving geographic wind components from {}/{}", x_name, y_name);

        let x_wind = store.band(x_name)?;
        let y_wind = store.band(y_name)?;
        let azimuth = store.azimuth_up()?;
        let (uu, vv) = frame::to_geographic(&x_wind, &y_wind, &azimuth)?;
        store.add_band(
            uu,
            BandMeta::with_standard_name("eastward_wind", EASTWARD_STANDARD_NAME),
        )?;
        store.add_band(
            vv,
            BandMeta::with_standard_name("northward_wind", NORTHWARD_STANDARD_NAME),
        )?;
        Ok(())
    }
}
