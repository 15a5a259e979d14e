use crate::io::store::{BandMeta, BandSelector, RasterStore, ResampleAlg};
use crate::types::{GridGeometry, WindArray, WindError, WindResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// In-memory raster store: named bands over a single grid.
///
/// Serves callers that already hold their data as arrays, and is the store
/// used throughout the test suite. It has no resampling backend, so
/// reprojection only succeeds when the grids already agree.
pub struct MemoryRasterStore {
    source_id: String,
    grid: GridGeometry,
    time: DateTime<Utc>,
    bands: Vec<(BandMeta, WindArray)>,
    metadata: HashMap<String, String>,
    watermask: Option<WindArray>,
    azimuth_up: Option<WindArray>,
}

impl MemoryRasterStore {
    pub fn new(source_id: &str, grid: GridGeometry, time: DateTime<Utc>) -> Self {
        Self {
            source_id: source_id.to_string(),
            grid,
            time,
            bands: Vec::new(),
            metadata: HashMap::new(),
            watermask: None,
            azimuth_up: None,
        }
    }

    /// Attach a land/water classification (2 = land)
    pub fn set_watermask(&mut self, mask: WindArray) -> WindResult<()> {
        self.check_shape(&mask)?;
        self.watermask = Some(mask);
        Ok(())
    }

    /// Override the per-pixel grid azimuth (for non-affine projections)
    pub fn set_azimuth_up(&mut self, azimuth: WindArray) -> WindResult<()> {
        self.check_shape(&azimuth)?;
        self.azimuth_up = Some(azimuth);
        Ok(())
    }

    fn check_shape(&self, data: &WindArray) -> WindResult<()> {
        if data.dim() != self.grid.shape {
            return Err(WindError::GridMismatch(format!(
                "array shape {:?} does not match store grid {:?}",
                data.dim(),
                self.grid.shape
            )));
        }
        Ok(())
    }

    fn matches(meta: &BandMeta, selector: &BandSelector) -> bool {
        let name_ok = meta.standard_name.as_deref() == Some(selector.standard_name.as_str())
            || meta.name == selector.standard_name;
        let pol_ok = match selector.polarization {
            Some(pol) => meta.polarization == Some(pol),
            None => true,
        };
        name_ok && pol_ok
    }
}

impl RasterStore for MemoryRasterStore {
    fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    fn time_coverage_start(&self) -> DateTime<Utc> {
        self.time
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn has_band(&self, standard_name: &str) -> bool {
        let selector = BandSelector::standard_name(standard_name);
        self.bands.iter().any(|(meta, _)| Self::matches(meta, &selector))
    }

    fn band_sel(&self, selector: &BandSelector) -> WindResult<WindArray> {
        self.bands
            .iter()
            .find(|(meta, _)| Self::matches(meta, selector))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| match selector.polarization {
                Some(pol) => {
                    WindError::MissingBand(format!("{} ({})", selector.standard_name, pol))
                }
                None => WindError::MissingBand(selector.standard_name.clone()),
            })
    }

    fn add_band(&mut self, data: WindArray, meta: BandMeta) -> WindResult<()> {
        self.check_shape(&data)?;
        log::debug!("Adding band '{}' to {}", meta.name, self.source_id);
        self.bands.push((meta, data));
        Ok(())
    }

    fn reproject(&mut self, target: &GridGeometry, alg: ResampleAlg) -> WindResult<()> {
        if *target == self.grid {
            log::debug!("Grids already agree, reprojection is a no-op");
            return Ok(());
        }
        Err(WindError::GridMismatch(format!(
            "in-memory store has no resampling backend (requested {:?} onto {:?})",
            alg, target.shape
        )))
    }

    fn watermask(&self) -> WindResult<WindArray> {
        self.watermask
            .clone()
            .ok_or_else(|| WindError::MissingBand("watermask".to_string()))
    }

    fn azimuth_up(&self) -> WindResult<WindArray> {
        match &self.azimuth_up {
            Some(azimuth) => Ok(azimuth.clone()),
            None => Ok(WindArray::from_elem(self.grid.shape, self.grid.azimuth_up())),
        }
    }

    fn metadata(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    fn set_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, Polarization};

    fn store() -> MemoryRasterStore {
        let grid = GridGeometry::new((4, 5), GeoTransform::north_up(0.0, 70.0, 0.1));
        MemoryRasterStore::new("test", grid, Utc::now())
    }

    #[test]
    fn test_band_lookup_by_standard_name_and_name() {
        let mut s = store();
        s.add_band(
            WindArray::from_elem((4, 5), 3.0),
            BandMeta::with_standard_name("winddirection", "wind_from_direction"),
        )
        .unwrap();
        assert!(s.has_band("wind_from_direction"));
        assert!(s.has_band("winddirection"));
        assert!(!s.has_band("wind_speed"));
        assert_eq!(s.band("wind_from_direction").unwrap()[[0, 0]], 3.0);
    }

    #[test]
    fn test_polarization_narrowing() {
        let mut s = store();
        let sigma0 = "surface_backwards_scattering_coefficient_of_radar_wave";
        s.add_band(
            WindArray::from_elem((4, 5), 0.1),
            BandMeta::with_standard_name("sigma0_HH", sigma0).polarization(Polarization::HH),
        )
        .unwrap();
        let vv = BandSelector::with_polarization(sigma0, Polarization::VV);
        assert!(matches!(s.band_sel(&vv), Err(WindError::MissingBand(_))));
        let hh = BandSelector::with_polarization(sigma0, Polarization::HH);
        assert_eq!(s.band_sel(&hh).unwrap()[[0, 0]], 0.1);
    }

    #[test]
    fn test_reproject_requires_matching_grid() {
        let mut s = store();
        let same = *s.grid();
        assert!(s.reproject(&same, ResampleAlg::Bilinear).is_ok());
        let other = GridGeometry::new((8, 8), GeoTransform::north_up(0.0, 70.0, 0.05));
        assert!(s.reproject(&other, ResampleAlg::Bilinear).is_err());
    }

    #[test]
    fn test_shape_checked_on_add() {
        let mut s = store();
        let err = s.add_band(WindArray::zeros((2, 2)), BandMeta::named("x"));
        assert!(matches!(err, Err(WindError::GridMismatch(_))));
    }
}
