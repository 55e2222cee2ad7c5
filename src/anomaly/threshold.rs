//! The anomaly zone boundary of Degnan & Rosenberg (2006).
//!
//! For an internal edge of length `y` (coalescent units) directly below an internal
//! edge of length `x`, the most probable gene tree differs from the species tree
//! when `y <= a(x)` with
//!
//! ```text
//! a(x) = ln( 2/3 + (3e^{2x} - 2) / (18 (e^{3x} - e^{2x})) )
//! ```

use crate::phylogeny::Proximity;

/// Ancestral edges shorter than this are treated as degenerate: the denominator
/// of `a(x)` vanishes as `x -> 0+` and no finite boundary can be given.
pub const MIN_PARENT_LENGTH: Proximity = 1e-9;

/// The boundary value `a(parent)`, or `None` if it cannot be computed to a finite number.
///
/// ```
/// use anomaly_zone::anomaly::anomaly_boundary;
/// let a = anomaly_boundary(0.1).unwrap();
/// assert!((a - 0.3267).abs() < 1e-3);
/// assert!(anomaly_boundary(2.0).unwrap() < 0.0);
/// assert_eq!(anomaly_boundary(0.0), None);
/// ```
pub fn anomaly_boundary(parent: Proximity) -> Option<f64> {
    if !parent.is_finite() || parent <= MIN_PARENT_LENGTH {
        return None;
    }
    // e^{3x} - e^{2x} = e^{2x} (e^x - 1), without the cancellation for small x
    let denominator = 18.0 * (2.0 * parent).exp() * parent.exp_m1();
    if !denominator.is_finite() || denominator <= 0.0 {
        return None;
    }
    let numerator = 3.0 * (2.0 * parent).exp() - 2.0;
    let boundary = (2.0 / 3.0 + numerator / denominator).ln();
    if boundary.is_finite() {
        Some(boundary)
    } else {
        None
    }
}

/// Whether an edge pair lies in the anomaly zone.
///
/// `parent` is the length of the ancestral edge, `child` the length of the edge
/// directly below it. A missing or degenerate parent length never yields an anomaly.
///
/// ```
/// use anomaly_zone::anomaly::is_anomalous;
/// assert!(is_anomalous(Some(0.1), 0.05));
/// assert!(!is_anomalous(Some(0.1), 1.0));
/// assert!(!is_anomalous(Some(2.0), 0.05));
/// assert!(!is_anomalous(None, 0.0));
/// ```
pub fn is_anomalous(parent: Option<Proximity>, child: Proximity) -> bool {
    match parent.and_then(anomaly_boundary) {
        Some(boundary) => child.is_finite() && child <= boundary,
        None => false,
    }
}
