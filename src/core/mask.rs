use crate::types::{
    MaskStageResult, ValidityMask, WindArray, MASK_ICE, MASK_INVALID, MASK_LAND,
};
use ndarray::Zip;

/// Everything the masking stages produced for one retrieval
#[derive(Debug, Clone)]
pub struct CompositedMask {
    pub mask: ValidityMask,
    /// Wind speed prepared for visualization: negatives clipped, land
    /// removed, ice cells set to -1, values above the ceiling set to NaN
    pub display_speed: WindArray,
    pub land: MaskStageResult,
    pub ice: MaskStageResult,
}

/// Combines invalid-data, land and sea-ice information into a single
/// validity mask, in a fixed stage order.
///
/// Land and ice inputs are optional: a missing mask degrades the run, it
/// never fails it. The outcome of each optional stage is reported so a
/// degraded run can be told apart from a clean one.
#[derive(Debug, Clone)]
pub struct MaskCompositor {
    /// Display ceiling in m/s; faster cells are blanked for visualization
    pub max_display_speed: Option<f64>,
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self {
            max_display_speed: Some(35.0),
        }
    }
}

impl MaskCompositor {
    pub fn new(max_display_speed: Option<f64>) -> Self {
        Self { max_display_speed }
    }

    /// Build the validity mask and the display raster.
    ///
    /// `land` is a watermask where the value 2 marks land; `ice` is a
    /// sea-ice area fraction. Pass `Err(reason)` for a mask that could not
    /// be obtained.
    pub fn composite(
        &self,
        windspeed: &WindArray,
        land: Result<&WindArray, String>,
        ice: Result<&WindArray, String>,
    ) -> CompositedMask {
        let mut mask = ValidityMask::all_valid(windspeed.dim());

        // Negative speeds indicate model breakdown near the low-wind
        // singularity; clamp before any masking
        let mut display = windspeed.mapv(|w| if w < 0.0 { 0.0 } else { w });

        Zip::from(&mut mask.codes).and(&display).for_each(|code, &w| {
            if w.is_nan() {
                *code = MASK_INVALID;
            }
        });

        // Land before ice, always
        let land_result = match land {
            Ok(watermask) if watermask.dim() == display.dim() => {
                let mut cells = 0usize;
                Zip::from(&mut mask.codes)
                    .and(&mut display)
                    .and(watermask)
                    .for_each(|code, w, &wm| {
                        if wm == 2.0 {
                            *code = MASK_LAND;
                            *w = f64::NAN;
                            cells += 1;
                        }
                    });
                log::debug!("Land mask applied to {} cells", cells);
                MaskStageResult::Applied { cells }
            }
            Ok(watermask) => MaskStageResult::Unavailable {
                reason: format!(
                    "watermask shape {:?} does not match windspeed {:?}",
                    watermask.dim(),
                    display.dim()
                ),
            },
            Err(reason) => {
                log::warn!("Land mask not available: {}", reason);
                MaskStageResult::Unavailable { reason }
            }
        };

        // Ice cells are flagged "under" the valid color range, not removed.
        // Cells already taken by land keep the land code.
        let ice_result = match ice {
            Ok(fraction) if fraction.dim() == display.dim() => {
                let mut cells = 0usize;
                Zip::from(&mut mask.codes)
                    .and(&mut display)
                    .and(fraction)
                    .for_each(|code, w, &f| {
                        if f > 0.0 && *code != MASK_LAND {
                            *code = MASK_ICE;
                            *w = -1.0;
                            cells += 1;
                        }
                    });
                log::debug!("Ice mask applied to {} cells", cells);
                MaskStageResult::Applied { cells }
            }
            Ok(fraction) => MaskStageResult::Unavailable {
                reason: format!(
                    "ice fraction shape {:?} does not match windspeed {:?}",
                    fraction.dim(),
                    display.dim()
                ),
            },
            Err(reason) => {
                log::warn!("Ice mask not available: {}", reason);
                MaskStageResult::Unavailable { reason }
            }
        };

        // Visualization ceiling; the exported numeric result is untouched
        if let Some(ceiling) = self.max_display_speed {
            display.mapv_inplace(|w| if w > ceiling { f64::NAN } else { w });
        }

        CompositedMask {
            mask,
            display_speed: display,
            land: land_result,
            ice: ice_result,
        }
    }
}
