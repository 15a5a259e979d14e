use crate::io::store::{BandSelector, RasterStore};
use crate::types::{
    BackscatterObservation, Polarization, ProductPolarisation, RasterField, WindArray, WindError,
    WindResult,
};
use ndarray::Zip;
use std::time::Instant;

/// CF standard name of the radar cross section band
pub const SIGMA0_STANDARD_NAME: &str = "surface_backwards_scattering_coefficient_of_radar_wave";
/// CF standard name of the incidence angle band
pub const INCIDENCE_STANDARD_NAME: &str = "incidence_angle";
/// CF standard name of the sensor look direction band
pub const SENSOR_AZIMUTH_STANDARD_NAME: &str = "sensor_azimuth_angle";

/// A CMOD-class semi-empirical inversion function: backscatter, wind
/// direction relative to the radar look direction, and incidence angle to
/// wind speed at 10 m.
///
/// Implementations are pure numeric functions supplied by the caller; the
/// model physics is not part of this crate.
pub trait InversionModel {
    /// `sigma0_vv` is NRCS in linear units, VV polarization (measured or
    /// HH-corrected). `phi_deg` is direction relative to the look
    /// direction, `incidence_deg` in degrees.
    fn invert(&self, sigma0_vv: &WindArray, phi_deg: &WindArray, incidence_deg: &WindArray)
        -> WindArray;
}

/// Polarization ratio converting HH backscatter to an equivalent VV value,
/// from Lin Ren, Jingsong Yang, Alexis Mouche, et al. (2017).
pub fn polarization_ratio(incidence_deg: &WindArray) -> WindArray {
    incidence_deg.mapv(|inc| {
        let t2 = inc.to_radians().tan().powi(2);
        (1.0 + 2.0 * t2).powi(2) / (1.0 + 1.3 * t2).powi(2)
    })
}

impl BackscatterObservation {
    /// Assemble the observation from a SAR raster store: pick the
    /// co-polarized backscatter channel and the viewing-geometry bands.
    ///
    /// VV is preferred; HH is accepted and flagged for polarization-ratio
    /// correction. When the sigma0 band carries no channel tag, the product
    /// polarisation encoded in the source name decides.
    pub fn from_store(store: &dyn RasterStore) -> WindResult<Self> {
        let grid = *store.grid();
        let time = store.time_coverage_start();

        let incidence = store
            .band(INCIDENCE_STANDARD_NAME)
            .map_err(|_| WindError::MissingBand(INCIDENCE_STANDARD_NAME.to_string()))?;
        let sensor_azimuth = store
            .band(SENSOR_AZIMUTH_STANDARD_NAME)
            .map_err(|_| WindError::MissingBand(SENSOR_AZIMUTH_STANDARD_NAME.to_string()))?;

        let (sigma0, polarization) = if let Ok(data) =
            store.band_sel(&BandSelector::with_polarization(SIGMA0_STANDARD_NAME, Polarization::VV))
        {
            (data, Polarization::VV)
        } else if let Ok(data) =
            store.band_sel(&BandSelector::with_polarization(SIGMA0_STANDARD_NAME, Polarization::HH))
        {
            log::info!("Using HH backscatter, polarization ratio correction will be applied");
            (data, Polarization::HH)
        } else if let Ok(data) = store.band(SIGMA0_STANDARD_NAME) {
            let pol = match ProductPolarisation::from_product_name(store.source_id()) {
                Some(product) if product.is_hh() => Polarization::HH,
                Some(_) => Polarization::VV,
                None => {
                    log::debug!(
                        "No polarisation tag in '{}', assuming VV backscatter",
                        store.source_id()
                    );
                    Polarization::VV
                }
            };
            (data, pol)
        } else {
            return Err(WindError::MissingBand(format!(
                "{} (VV or HH)",
                SIGMA0_STANDARD_NAME
            )));
        };

        // Physical bounds check on the viewing geometry
        for &inc in incidence.iter() {
            if inc.is_finite() && !(0.0..=90.0).contains(&inc) {
                return Err(WindError::InvalidFormat(format!(
                    "incidence angle {} degrees outside [0, 90]",
                    inc
                )));
            }
        }

        Ok(BackscatterObservation {
            sigma0: RasterField::new(sigma0, grid, time)?,
            polarization,
            incidence: RasterField::new(incidence, grid, time)?,
            sensor_azimuth: RasterField::new(sensor_azimuth, grid, time)?,
        })
    }
}

/// Orchestrates the call to the external inversion function: prepares the
/// relative wind direction, corrects HH backscatter to equivalent VV, and
/// normalizes non-finite output to the NaN sentinel.
pub struct WindInversionEngine<'a> {
    model: &'a dyn InversionModel,
}

impl<'a> WindInversionEngine<'a> {
    pub fn new(model: &'a dyn InversionModel) -> Self {
        Self { model }
    }

    pub fn invert(
        &self,
        observation: &BackscatterObservation,
        wind_direction: &RasterField,
    ) -> WindResult<RasterField> {
        let shape = observation.sigma0.shape();
        if wind_direction.shape() != shape
            || observation.incidence.shape() != shape
            || observation.sensor_azimuth.shape() != shape
        {
            return Err(WindError::GridMismatch(
                "observation and wind direction fields are not co-located".to_string(),
            ));
        }

        log::info!("Calculating SAR wind with CMOD...");
        let start = Instant::now();

        // The model needs wind direction relative to the radar look direction
        let phi = Zip::from(&wind_direction.data)
            .and(&observation.sensor_azimuth.data)
            .map_collect(|&dir, &look| (dir - look).rem_euclid(360.0));

        let sigma0_vv = match observation.polarization {
            Polarization::VV => observation.sigma0.data.clone(),
            Polarization::HH => {
                log::debug!("Correcting HH backscatter to equivalent VV");
                let pr = polarization_ratio(&observation.incidence.data);
                &observation.sigma0.data * &pr
            }
            other => {
                return Err(WindError::InvalidFormat(format!(
                    "wind inversion requires co-polarized backscatter, got {}",
                    other
                )))
            }
        };

        let mut windspeed = self
            .model
            .invert(&sigma0_vv, &phi, &observation.incidence.data);

        // A single invalid sentinel downstream: never leave infinities behind
        windspeed.mapv_inplace(|w| if w.is_finite() { w } else { f64::NAN });

        log::info!("Calculation time: {:.2?}", start.elapsed());
        RasterField::new(
            windspeed,
            observation.sigma0.grid,
            observation.sigma0.time,
        )
    }
}
