use crate::types::{GridGeometry, WindArray, WindError, WindResult};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// Visualization parameters, matching the defaults of the command-line
/// plotting surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotParams {
    /// Number of wind vectors along the column axis
    pub num_vectors_x: usize,
    /// Color limits for the speed raster (m/s)
    pub clim: (f64, f64),
    /// Flip the prepared field so north is up and east is right
    pub north_up_east_right: bool,
    /// Quiver reference speed used when no model wind speed is available
    pub default_vector_speed: f64,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            num_vectors_x: 16,
            clim: (0.0, 20.0),
            north_up_east_right: true,
            default_vector_speed: 8.0,
        }
    }
}

/// A down-sampled, orientation-normalized vector field plus the speed
/// raster, ready for a renderer. No drawing happens here.
#[derive(Debug, Clone)]
pub struct PlotField {
    pub raster: WindArray,
    pub clim: (f64, f64),
    /// Column pixel coordinates of the quiver grid
    pub x: Array2<f64>,
    /// Row pixel coordinates of the quiver grid
    pub y: Array2<f64>,
    pub u: WindArray,
    pub v: WindArray,
}

/// Prepares wind fields for visualization: decimated quiver grid,
/// grid-relative bearings, and orientation normalization.
#[derive(Debug, Clone, Default)]
pub struct PlotFieldPreparer {
    pub params: PlotParams,
}

impl PlotFieldPreparer {
    pub fn new(params: PlotParams) -> Self {
        Self { params }
    }

    /// Prepare with the stride derived from `num_vectors_x`
    pub fn prepare(
        &self,
        display_speed: &WindArray,
        direction: &WindArray,
        grid: &GridGeometry,
        azimuth_up: &WindArray,
        model_speed: Option<&WindArray>,
    ) -> WindResult<PlotField> {
        let ncols = grid.ncols() as f64;
        let stride = (ncols / self.params.num_vectors_x as f64).round().max(1.0) as usize;
        self.prepare_with_stride(display_speed, direction, grid, azimuth_up, model_speed, stride)
    }

    pub fn prepare_with_stride(
        &self,
        display_speed: &WindArray,
        direction: &WindArray,
        grid: &GridGeometry,
        azimuth_up: &WindArray,
        model_speed: Option<&WindArray>,
        stride: usize,
    ) -> WindResult<PlotField> {
        if display_speed.dim() != grid.shape
            || direction.dim() != grid.shape
            || azimuth_up.dim() != grid.shape
        {
            return Err(WindError::GridMismatch(
                "plot input fields are not co-located with the grid".to_string(),
            ));
        }
        let stride = stride.max(1);
        let (nrows, ncols) = grid.shape;
        let row_idx: Vec<usize> = (0..nrows).step_by(stride).collect();
        let col_idx: Vec<usize> = (0..ncols).step_by(stride).collect();
        let (ny, nx) = (row_idx.len(), col_idx.len());

        let x = Array2::from_shape_fn((ny, nx), |(_, j)| col_idx[j] as f64);
        let y = Array2::from_shape_fn((ny, nx), |(i, _)| row_idx[i] as f64);

        // Quiver length follows the model wind speed where available
        let scale = Array2::from_shape_fn((ny, nx), |(i, j)| match model_speed {
            Some(model) => model[[row_idx[i], col_idx[j]]],
            None => self.params.default_vector_speed,
        });

        // Bearing relative to the grid's "up" direction
        let mut u = Array2::zeros((ny, nx));
        let mut v = Array2::zeros((ny, nx));
        for i in 0..ny {
            for j in 0..nx {
                let dir = direction[[row_idx[i], col_idx[j]]];
                let az = azimuth_up[[row_idx[i], col_idx[j]]];
                let relative_up = (360.0 - dir + az).to_radians();
                u[[i, j]] = relative_up.sin() * scale[[i, j]];
                v[[i, j]] = relative_up.cos() * scale[[i, j]];
            }
        }

        let mut raster = display_speed.clone();

        if self.params.north_up_east_right {
            let (xs, ys) = grid.corners();
            // Latitude increasing with row index: the image is upside down
            if ys[0] < ys[1] {
                raster = flip_ud(&raster);
                u = flip_ud(&u);
                v = flip_ud(&v).mapv(|c| -c);
            }
            // Longitude decreasing with column index: mirrored east-west
            if xs[0] > xs[2] {
                raster = flip_lr(&raster);
                u = flip_lr(&u).mapv(|c| -c);
                v = flip_lr(&v);
            }
        }

        Ok(PlotField {
            raster,
            clim: self.params.clim,
            x,
            y,
            u,
            v,
        })
    }
}

fn flip_ud(a: &WindArray) -> WindArray {
    a.slice(s![..;-1, ..]).to_owned()
}

fn flip_lr(a: &WindArray) -> WindArray {
    a.slice(s![.., ..;-1]).to_owned()
}
