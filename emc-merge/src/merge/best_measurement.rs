// Best-measurement selection
//
// Concept: Pick one measurement per parameter out of a merged group
// Policy: smallest relative uncertainty wins; ties go to the provenance URL
// that sorts first, then to row order. A measurement without a central value
// or without both finite uncertainties is never selected, so a parameter whose
// rows report no usable uncertainty comes out empty.

use crate::types::{MassProvenance, Measurement, Parameters};

/// Relative uncertainty assigned to a missing mass / msini uncertainty
const MISSING_RELATIVE_UNCERTAINTY: f64 = 1e9;

/// Best measurement among candidates (empty when none is usable)
pub fn select_best<'a>(candidates: impl IntoIterator<Item = &'a Measurement>) -> Measurement {
    candidates
        .into_iter()
        .filter_map(|m| m.relative_uncertainty().map(|rel| (rel, m)))
        .min_by(|(rel_a, a), (rel_b, b)| rel_a.total_cmp(rel_b).then_with(|| a.url.cmp(&b.url)))
        .map(|(_, m)| m.clone())
        .unwrap_or_default()
}

/// Representative mass: msini when its relative uncertainty is at least as good
///
/// A parameter without a central value never wins over one with a value.
pub fn best_mass(params: &Parameters) -> (Measurement, Option<MassProvenance>) {
    let mass = &params.mass;
    let msini = &params.msini;

    match (mass.value, msini.value) {
        (None, None) => (Measurement::default(), None),
        (Some(_), None) => (mass.clone(), Some(MassProvenance::Mass)),
        (None, Some(_)) => (msini.clone(), Some(MassProvenance::Msini)),
        (Some(_), Some(_)) => {
            let rel_mass = mass
                .relative_uncertainty()
                .unwrap_or(MISSING_RELATIVE_UNCERTAINTY);
            let rel_msini = msini
                .relative_uncertainty()
                .unwrap_or(MISSING_RELATIVE_UNCERTAINTY);
            if rel_mass >= rel_msini {
                (msini.clone(), Some(MassProvenance::Msini))
            } else {
                (mass.clone(), Some(MassProvenance::Mass))
            }
        }
    }
}
