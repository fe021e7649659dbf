//! Separable Gaussian blur kernels.

use crate::config::{gaussian_taps, BlurProblem};
use crate::error::KernelError;
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::sync::Arc;

/// A 2D blur implementation. Input and output are `(height, width)` sample
/// grids in f32; element-type conversion happens in the callers.
pub trait BlurKernel: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, problem: &BlurProblem) -> bool;
    fn run(
        &self,
        problem: &BlurProblem,
        src: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>, KernelError>;
}

pub type DynBlurKernel = Arc<dyn BlurKernel>;

fn check_shape(problem: &BlurProblem, src: &ArrayView2<'_, f32>) -> Result<(), KernelError> {
    problem.validate()?;
    if src.dim() != (problem.height, problem.width) {
        return Err(KernelError::mismatch(format!(
            "blur input is {:?}, problem expects ({}, {})",
            src.dim(),
            problem.height,
            problem.width
        )));
    }
    Ok(())
}

#[inline]
fn convolve_clamped(line: &[f32], taps: &[f32], center: usize) -> f32 {
    let radius = taps.len() / 2;
    let last = line.len() - 1;
    let mut acc = 0.0f32;
    for (t, &tap) in taps.iter().enumerate() {
        let offset = t as isize - radius as isize;
        let idx = (center as isize + offset).clamp(0, last as isize) as usize;
        acc += tap * line[idx];
    }
    acc
}

fn blur_rows_seq(src: ArrayView2<'_, f32>, taps: &[f32]) -> Array2<f32> {
    let mut out = Array2::zeros(src.dim());
    for (src_row, mut out_row) in src.outer_iter().zip(out.outer_iter_mut()) {
        // Rows of non-standard-layout views are copied out.
        let copied;
        let line = match src_row.as_slice() {
            Some(slice) => slice,
            None => {
                copied = src_row.to_vec();
                &copied
            }
        };
        for (x, value) in out_row.iter_mut().enumerate() {
            *value = convolve_clamped(line, taps, x);
        }
    }
    out
}

fn blur_rows_par(src: ArrayView2<'_, f32>, taps: &[f32]) -> Array2<f32> {
    let mut out = Array2::zeros(src.dim());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut out_row)| {
            let src_row = src.row(y);
            let copied;
            let line = match src_row.as_slice() {
                Some(slice) => slice,
                None => {
                    copied = src_row.to_vec();
                    &copied
                }
            };
            for (x, value) in out_row.iter_mut().enumerate() {
                *value = convolve_clamped(line, taps, x);
            }
        });
    out
}

/// Single-threaded two-pass blur. Transposes between passes so both run
/// over contiguous rows.
#[derive(Default)]
pub struct ReferenceBlur;

impl ReferenceBlur {
    pub fn new() -> Self {
        Self
    }
}

impl BlurKernel for ReferenceBlur {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn supports(&self, _problem: &BlurProblem) -> bool {
        true
    }

    fn run(
        &self,
        problem: &BlurProblem,
        src: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>, KernelError> {
        check_shape(problem, &src)?;

        let taps_x = gaussian_taps(problem.sigma_x);
        let taps_y = gaussian_taps(problem.sigma_y);

        let horizontal = blur_rows_seq(src, &taps_x);
        let transposed = horizontal.t().as_standard_layout().to_owned();
        let vertical = blur_rows_seq(transposed.view(), &taps_y);
        Ok(vertical.t().as_standard_layout().to_owned())
    }
}

/// Row-parallel two-pass blur.
#[derive(Default)]
pub struct ParallelBlur;

impl ParallelBlur {
    pub fn new() -> Self {
        Self
    }
}

impl BlurKernel for ParallelBlur {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn supports(&self, _problem: &BlurProblem) -> bool {
        true
    }

    fn run(
        &self,
        problem: &BlurProblem,
        src: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>, KernelError> {
        check_shape(problem, &src)?;

        let taps_x = gaussian_taps(problem.sigma_x);
        let taps_y = gaussian_taps(problem.sigma_y);

        let horizontal = blur_rows_par(src, &taps_x);
        let transposed = horizontal.t().as_standard_layout().to_owned();
        let vertical = blur_rows_par(transposed.view(), &taps_y);
        Ok(vertical.t().as_standard_layout().to_owned())
    }
}
