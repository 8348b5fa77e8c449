use crate::config::Policy;
use crate::methods::geo;
use crate::model::GpsPing;

// Advisory score in [0,100] for how physically plausible a location
// report is, given the previous one. This feeds UI hints and the soft
// host-range check; it is never a hard gate, so implausible input
// degrades the score instead of erroring.

const TRUST_MAX: i32 = 100;
const TRUST_AT_CEILING: i32 = 40;
const TRUST_DUPLICATE_BURST: i32 = 15;
const TRUST_TELEPORT: i32 = 5;

pub fn score(current: &GpsPing, previous: Option<&GpsPing>, policy: &Policy) -> i32 {
    let Some(previous) = previous else {
        // No movement history to validate against. Permissive neutral
        // baseline, not a high-trust claim.
        return clamp(policy.neutral_trust_score);
    };

    let elapsed_seconds = (current.time - previous.time).num_seconds();
    let moved_meters = geo::distance_meters(
        previous.latitude,
        previous.longitude,
        current.latitude,
        current.longitude,
    );

    if !moved_meters.is_finite() {
        return clamp(TRUST_TELEPORT);
    }

    if elapsed_seconds < policy.gps_min_elapsed_seconds {
        // Near-zero (or out-of-order) elapsed time. Standing still is
        // fine; claimed movement in no time is a duplicate/burst.
        if moved_meters > policy.gps_jitter_meters {
            return clamp(TRUST_DUPLICATE_BURST);
        }
        return clamp(TRUST_MAX);
    }

    let implied_speed_mps = moved_meters / elapsed_seconds as f64;
    if !implied_speed_mps.is_finite() || implied_speed_mps > policy.gps_max_speed_mps {
        return clamp(TRUST_TELEPORT);
    }

    // High trust, decaying linearly toward TRUST_AT_CEILING as the
    // implied speed approaches the plausibility ceiling.
    let ratio = implied_speed_mps / policy.gps_max_speed_mps;
    let penalty = (ratio * (TRUST_MAX - TRUST_AT_CEILING) as f64).round() as i32;
    clamp(TRUST_MAX - penalty)
}

fn clamp(score: i32) -> i32 {
    score.clamp(0, TRUST_MAX)
}
