//! Shared test utilities for the WFS workspace.
//!
//! - Fixtures: areas of interest, features and canned service bodies
//! - Scripted mocks for the transport seams
//! - Approximate comparison macros
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! The mocks implement traits from the `transport` crate, so use them from
//! integration tests (`tests/`) rather than in-crate unit tests.

pub mod fixtures;
pub mod mock;

pub use fixtures::*;
pub use mock::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that a coordinate lies inside (or on) a `(min_x, min_y, max_x, max_y)` box.
///
/// ```ignore
/// use test_utils::assert_within_bbox;
///
/// assert_within_bbox!((0.5, 0.5), (0.0, 0.0, 1.0, 1.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_within_bbox {
    (($x:expr, $y:expr), ($min_x:expr, $min_y:expr, $max_x:expr, $max_y:expr), $epsilon:expr) => {{
        let (x, y): (f64, f64) = ($x as f64, $y as f64);
        let eps: f64 = $epsilon as f64;
        if x < $min_x - eps || x > $max_x + eps || y < $min_y - eps || y > $max_y + eps {
            panic!(
                "assertion failed: ({:?}, {:?}) outside ({:?}, {:?}, {:?}, {:?})",
                x, y, $min_x, $min_y, $max_x, $max_y
            );
        }
    }};
}
