//! Per-pixel denoising driver.
//!
//! The driver owns a validated configuration and the model state derived
//! from it, then maps the selected fit over every pixel of an input image.
//! Pixels are independent, so the map runs in parallel when the `parallel`
//! feature is enabled and results are folded into the output buffers in
//! index order afterwards.

use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::buffer::{ImageBuffer, NormalBuffer};
use crate::diagnostics::DenoiseReport;
use crate::error::DenoiseResult;
use crate::models::{
    BiasCorrection, CircleFit, ConicFit, FitOutcome, RenormalizationParams, SurfaceModel,
};
use crate::progress::ProgressCounter;
use crate::window::{WindowGeometry, WindowSample};

/// Configuration of a [`Denoiser`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Side length of the sampling window; odd and at least five.
    pub window_size: usize,
    /// Surface family fitted in every window.
    pub model: SurfaceModel,
    /// Iteration controls for the conic models; the circle fit ignores them.
    pub renormalization: RenormalizationParams,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            window_size: 7,
            model: SurfaceModel::default(),
            renormalization: RenormalizationParams::default(),
        }
    }
}

/// Everything one denoising run produces.
#[derive(Clone, Debug)]
pub struct DenoiseOutput {
    /// Denoised values, same dimensions as the input.
    pub image: ImageBuffer,
    /// Recovered unit surface normals.
    pub normals: NormalBuffer,
    /// Aggregate diagnostics of the run.
    pub report: DenoiseReport,
}

/// Closed set of per-window fit engines, chosen once at configuration time.
#[derive(Debug)]
enum FitEngine {
    Circle(CircleFit),
    Conic(ConicFit),
}

impl FitEngine {
    fn fit(&self, samples: &[WindowSample]) -> FitOutcome {
        match self {
            FitEngine::Circle(fit) => fit.fit(samples),
            FitEngine::Conic(fit) => fit.fit(samples),
        }
    }
}

/// Applies the configured surface fit to every pixel of an image.
#[derive(Debug)]
pub struct Denoiser {
    params: DenoiseParams,
    geometry: WindowGeometry,
    engine: FitEngine,
}

impl Denoiser {
    /// Validate `params` and precompute the per-window model state.
    pub fn new(params: DenoiseParams) -> DenoiseResult<Self> {
        let geometry = WindowGeometry::new(params.window_size)?;
        let engine = match params.model {
            SurfaceModel::Circle => FitEngine::Circle(CircleFit::new(&geometry)),
            SurfaceModel::Ellipse => FitEngine::Conic(ConicFit::new(
                &geometry,
                BiasCorrection::None,
                params.renormalization,
            )),
            SurfaceModel::HyperEllipse => FitEngine::Conic(ConicFit::new(
                &geometry,
                BiasCorrection::HyperAccurate,
                params.renormalization,
            )),
        };
        Ok(Self {
            params,
            geometry,
            engine,
        })
    }

    /// The validated configuration.
    pub fn params(&self) -> &DenoiseParams {
        &self.params
    }

    /// Denoise `image`, fitting one window per pixel.
    pub fn process(&self, image: &ImageBuffer) -> DenoiseResult<DenoiseOutput> {
        self.run(image, None)
    }

    /// Like [`process`](Self::process), incrementing `progress` once per
    /// finished pixel so another thread can watch the run.
    pub fn process_with_progress(
        &self,
        image: &ImageBuffer,
        progress: &ProgressCounter,
    ) -> DenoiseResult<DenoiseOutput> {
        self.run(image, Some(progress))
    }

    fn run(
        &self,
        image: &ImageBuffer,
        progress: Option<&ProgressCounter>,
    ) -> DenoiseResult<DenoiseOutput> {
        let start = Instant::now();
        debug!(
            "Denoiser: {:?} fit over {}x{} image, window {}",
            self.params.model,
            image.width(),
            image.height(),
            self.params.window_size
        );

        let outcomes = self.fit_all(image, progress);
        let fit_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!("Denoiser: fit pass done in {:.1} ms", fit_ms);

        let mut values = Vec::with_capacity(outcomes.len());
        let mut normals = Vec::with_capacity(outcomes.len());
        let mut error_pixels = 0usize;
        let mut total_fitting_error = 0.0;
        for outcome in &outcomes {
            values.push(outcome.value);
            normals.push(outcome.normal);
            if !outcome.converged {
                error_pixels += 1;
            }
            total_fitting_error += outcome.fitting_error;
        }
        if error_pixels == outcomes.len() {
            warn!("Denoiser: no window converged, output is the raw input");
        }

        let denoised = ImageBuffer::from_vec(image.width(), image.height(), values)?;
        let normals = NormalBuffer::from_vec(image.width(), image.height(), normals)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let report = DenoiseReport {
            width: image.width(),
            height: image.height(),
            window_size: self.params.window_size,
            model: self.params.model,
            error_pixels,
            total_fitting_error,
            mean_fitting_error: total_fitting_error / outcomes.len() as f64,
            elapsed_ms,
        };
        info!(
            "Denoiser: {} of {} pixels did not converge, mean fitting error {:.6}, {:.1} ms",
            error_pixels,
            outcomes.len(),
            report.mean_fitting_error,
            elapsed_ms
        );
        Ok(DenoiseOutput {
            image: denoised,
            normals,
            report,
        })
    }

    fn fit_all(&self, image: &ImageBuffer, progress: Option<&ProgressCounter>) -> Vec<FitOutcome> {
        let width = image.width();
        let fit_one = |scratch: &mut Vec<WindowSample>, index: usize| {
            self.geometry.fill(image, index % width, index / width, scratch);
            let outcome = self.engine.fit(scratch);
            if let Some(counter) = progress {
                counter.increment();
            }
            outcome
        };

        #[cfg(feature = "parallel")]
        {
            (0..image.pixel_count())
                .into_par_iter()
                .map_init(
                    || Vec::with_capacity(self.geometry.len()),
                    |scratch, index| fit_one(scratch, index),
                )
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = Vec::with_capacity(self.geometry.len());
            (0..image.pixel_count())
                .map(|index| fit_one(&mut scratch, index))
                .collect()
        }
    }
}
