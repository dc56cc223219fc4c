mod common;

use common::synthetic_image::{constant_image, plane_image};
use nalgebra::Vector3;
use surface_denoise::models::{BiasCorrection, CircleFit, ConicFit, RenormalizationParams};
use surface_denoise::window::WindowGeometry;
use surface_denoise::ImageBuffer;

const F_ZERO: f64 = 5.0;

/// Parameters of the quadric used by the conic tests. The second slot is
/// zero so the generated surface and the fitted residual agree exactly.
const THETA: [f64; 7] = [0.002, 0.0, -0.001, 0.01, -0.005, 0.3, 1.0];

/// Height of the quadric at window coordinates (x, y).
fn quadric(x: f64, y: f64) -> f64 {
    (THETA[0] * x * x
        + THETA[1] * 2.0 * x * y
        + THETA[2] * y * y
        + THETA[3] * 2.0 * F_ZERO * x
        + THETA[4] * 2.0 * F_ZERO * y
        + THETA[5] * F_ZERO * F_ZERO)
        / (THETA[6] * 2.0 * F_ZERO)
}

/// Quadric heights plus a deterministic sub-1e-5 perturbation that keeps
/// the moment matrix positive definite in floating point.
fn conic_test_image() -> ImageBuffer {
    ImageBuffer::from_fn(11, 11, |x, y| {
        let jitter = 1e-6 * ((((x * 31 + y * 17) % 7) as f64) - 3.0);
        quadric(x as f64 - 5.0, y as f64 - 5.0) + jitter
    })
    .expect("valid test image dimensions")
}

#[test]
fn circle_recovers_an_exact_plane() {
    let image = plane_image(16, 12, 0.3, 0.05, -0.02);
    let expected = Vector3::new(-0.05, 0.02, 1.0).normalize();
    for size in [5, 7, 9] {
        let geometry = WindowGeometry::new(size).unwrap();
        let fit = CircleFit::new(&geometry);

        // Interior pixel, so the window never wraps.
        let outcome = fit.fit(&geometry.samples(&image, 8, 6));
        assert!(outcome.converged, "window {size}");
        assert!((outcome.value - 0.58).abs() < 1e-9, "window {size}");
        assert!(outcome.fitting_error < 1e-9, "window {size}");
        assert!((outcome.normal - expected).norm() < 1e-9, "window {size}");
    }
}

#[test]
fn circle_is_exact_on_a_constant_window() {
    let image = constant_image(9, 9, 0.5);
    let geometry = WindowGeometry::new(7).unwrap();
    let fit = CircleFit::new(&geometry);

    // Border pixel: wrapping is harmless when every value is identical.
    let outcome = fit.fit(&geometry.samples(&image, 0, 0));
    assert!(outcome.converged);
    assert!((outcome.value - 0.5).abs() < 1e-12);
    assert!(outcome.fitting_error < 1e-12);
    assert!((outcome.normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
}

#[test]
fn ellipse_recovers_a_known_conic_surface() {
    let image = conic_test_image();
    let geometry = WindowGeometry::new(5).unwrap();
    let fit = ConicFit::new(
        &geometry,
        BiasCorrection::None,
        RenormalizationParams::default(),
    );

    let outcome = fit.fit(&geometry.samples(&image, 5, 5));
    assert!(outcome.converged);
    // Height and normal at the center, both invariant to the sign of theta.
    assert!((outcome.value - 0.75).abs() < 1e-3);
    let expected = Vector3::new(-0.01, 0.005, 1.0).normalize();
    assert!((outcome.normal - expected).norm() < 1e-3);
    assert!(outcome.fitting_error < 1e-3);
}

#[test]
fn hyper_ellipse_recovers_the_same_surface() {
    let image = conic_test_image();
    let geometry = WindowGeometry::new(5).unwrap();
    let fit = ConicFit::new(
        &geometry,
        BiasCorrection::HyperAccurate,
        RenormalizationParams::default(),
    );

    let outcome = fit.fit(&geometry.samples(&image, 5, 5));
    assert!(outcome.converged);
    assert!((outcome.value - 0.75).abs() < 1e-3);
    let expected = Vector3::new(-0.01, 0.005, 1.0).normalize();
    assert!((outcome.normal - expected).norm() < 1e-3);
    assert!(outcome.fitting_error < 1e-3);
}

#[test]
fn exhausted_iteration_budget_falls_back_to_the_raw_center() {
    let image = conic_test_image();
    let geometry = WindowGeometry::new(5).unwrap();
    // One round solves but cannot pass the convergence check against the
    // zero-initialized previous parameters, so the budget runs out.
    let fit = ConicFit::new(
        &geometry,
        BiasCorrection::None,
        RenormalizationParams {
            max_iterations: 1,
            ..RenormalizationParams::default()
        },
    );

    let outcome = fit.fit(&geometry.samples(&image, 5, 5));
    assert!(!outcome.converged);
    assert_eq!(outcome.value, image.get(5, 5));
    assert_eq!(outcome.fitting_error, 0.0);
    assert_eq!(outcome.normal, Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn ellipse_falls_back_on_an_all_zero_window() {
    let image = constant_image(8, 8, 0.0);
    let geometry = WindowGeometry::new(5).unwrap();
    let fit = ConicFit::new(
        &geometry,
        BiasCorrection::None,
        RenormalizationParams::default(),
    );

    // The value column of the feature vector vanishes, the moment matrix
    // goes singular, and the fit must fail softly.
    let outcome = fit.fit(&geometry.samples(&image, 4, 4));
    assert!(!outcome.converged);
    assert_eq!(outcome.value, 0.0);
    assert_eq!(outcome.fitting_error, 0.0);
    assert_eq!(outcome.normal, Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn hyper_ellipse_falls_back_on_an_all_zero_window() {
    let image = constant_image(8, 8, 0.0);
    let geometry = WindowGeometry::new(5).unwrap();
    let fit = ConicFit::new(
        &geometry,
        BiasCorrection::HyperAccurate,
        RenormalizationParams::default(),
    );

    let outcome = fit.fit(&geometry.samples(&image, 4, 4));
    assert!(!outcome.converged);
    assert_eq!(outcome.value, 0.0);
    assert_eq!(outcome.fitting_error, 0.0);
    assert_eq!(outcome.normal, Vector3::new(0.0, 0.0, 1.0));
}
