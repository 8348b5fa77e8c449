use crate::config::Policy;
use crate::helper_model::RoveoError;
use crate::methods::{geo, gps_trust};
use crate::model::{GpsPing, GuestMessage, HandoffState, MessageCategory, Trip};
use crate::store::Store;
use chrono::Utc;
use tracing::{info, warn};

// Two-party presence verification at vehicle handoff.
//
//   NotStarted -> GuestVerified -> HandoffComplete
//
// Guest proximity is a hard gate; host proximity is advisory only. The
// asymmetry is a product decision: the guest must demonstrably be at
// the car, but a host confirming from their porch across the street
// should not be blocked by consumer GPS noise.

#[derive(Debug)]
pub struct GuestArrival {
    pub distance_meters: f64,
    pub within_range: bool,
    pub location_trust: i32,
    pub handoff_state: HandoffState,
    pub eta_message: Option<String>,
    /// Newly created approach notification, if this ping was the first
    /// to bring the guest in range. Caller dispatches it.
    pub approach_message: Option<GuestMessage>,
}

#[derive(Debug)]
pub struct HostConfirm {
    pub handoff_status: HandoffState,
    /// None when the host device reported no fix.
    pub host_distance_meters: Option<f64>,
    pub host_within_range: bool,
    /// Newly created key-instruction message, if any. Caller dispatches
    /// it; on an idempotent re-confirm this stays None.
    pub key_message: Option<GuestMessage>,
    /// False when this call observed an already-completed handoff.
    pub newly_completed: bool,
    pub trip: Trip,
}

/// Process one guest approach ping. Records the ping, scores it, and
/// fires the NotStarted -> GuestVerified transition when the guest is
/// within the handoff radius.
pub fn guest_arrival(
    store: &Store,
    trip_id: i32,
    latitude: f64,
    longitude: f64,
    policy: &Policy,
) -> Result<GuestArrival, RoveoError> {
    if geo::is_null_island(latitude, longitude) {
        return Err(RoveoError::Validation(String::from(
            "GPS unavailable: device reported a (0,0) location.",
        )));
    }

    let trip = store
        .get_trip(trip_id)
        .ok_or_else(|| RoveoError::NotFound(format!("Trip {} not found.", trip_id)))?;
    let vehicle = store.get_vehicle(trip.vehicle_id).ok_or_else(|| {
        RoveoError::Internal(format!("Vehicle {} missing for trip {}.", trip.vehicle_id, trip_id))
    })?;

    let distance_meters = geo::distance_meters(
        latitude,
        longitude,
        vehicle.parked_latitude,
        vehicle.parked_longitude,
    );
    let within_range = distance_meters <= policy.handoff_radius_meters;

    let ping = GpsPing {
        trip_id,
        latitude,
        longitude,
        time: Utc::now(),
        distance_to_vehicle_meters: distance_meters,
    };
    let (previous, current) = store.record_ping(ping);
    let location_trust = gps_trust::score(&current, previous.as_ref(), policy);

    let mut handoff_state = trip.handoff_state;
    let mut approach_message = None;

    if within_range && handoff_state == HandoffState::NotStarted {
        match store.transition_handoff(
            trip_id,
            HandoffState::NotStarted,
            HandoffState::GuestVerified,
        ) {
            Some(Ok(next)) => {
                handoff_state = next;
                info!(
                    trip_id,
                    distance_meters, location_trust, "guest verified at vehicle"
                );
                approach_message = store.insert_message_if_absent(
                    trip_id,
                    MessageCategory::Approach,
                    format!(
                        "Your guest has arrived at {} for trip {}.",
                        vehicle.name, trip.confirmation
                    ),
                );
            }
            // A racing ping already advanced the state; nothing to do.
            Some(Err(actual)) => handoff_state = actual,
            None => {
                return Err(RoveoError::NotFound(format!("Trip {} not found.", trip_id)));
            }
        }
    }

    let eta_message = if within_range {
        None
    } else {
        Some(format!(
            "You are {:.0} m from {}. Verification unlocks within {:.0} m.",
            distance_meters, vehicle.name, policy.handoff_radius_meters
        ))
    };

    Ok(GuestArrival {
        distance_meters,
        within_range,
        location_trust,
        handoff_state,
        eta_message,
        approach_message,
    })
}

/// Host confirmation: GuestVerified -> HandoffComplete. Idempotent for
/// retries after completion; a precondition error before the guest has
/// verified.
pub fn host_confirm(
    store: &Store,
    trip_id: i32,
    latitude: f64,
    longitude: f64,
    key_instructions: Option<String>,
    save_key_instructions: bool,
    policy: &Policy,
) -> Result<HostConfirm, RoveoError> {
    let trip = store
        .get_trip(trip_id)
        .ok_or_else(|| RoveoError::NotFound(format!("Trip {} not found.", trip_id)))?;
    let vehicle = store.get_vehicle(trip.vehicle_id).ok_or_else(|| {
        RoveoError::Internal(format!("Vehicle {} missing for trip {}.", trip.vehicle_id, trip_id))
    })?;

    // Soft check only. No fix means we log and carry on.
    let host_distance_meters = if geo::is_null_island(latitude, longitude) {
        warn!(trip_id, "host confirm without a GPS fix");
        None
    } else {
        Some(geo::distance_meters(
            latitude,
            longitude,
            vehicle.parked_latitude,
            vehicle.parked_longitude,
        ))
    };
    let host_within_range =
        host_distance_meters.is_some_and(|d| d <= policy.handoff_radius_meters);

    match trip.handoff_state {
        HandoffState::NotStarted => {
            return Err(RoveoError::Precondition(String::from(
                "Guest has not verified their arrival at the vehicle yet.",
            )));
        }
        HandoffState::HandoffComplete => {
            // Duplicate confirm from a flaky network. Return the
            // terminal state without re-firing side effects.
            return Ok(HostConfirm {
                handoff_status: HandoffState::HandoffComplete,
                host_distance_meters,
                host_within_range,
                key_message: None,
                newly_completed: false,
                trip,
            });
        }
        HandoffState::GuestVerified => {}
    }

    match store.transition_handoff(
        trip_id,
        HandoffState::GuestVerified,
        HandoffState::HandoffComplete,
    ) {
        Some(Ok(_)) => {}
        Some(Err(actual)) => {
            // Lost the race to a duplicate confirm.
            let trip = store
                .get_trip(trip_id)
                .ok_or_else(|| RoveoError::NotFound(format!("Trip {} not found.", trip_id)))?;
            return Ok(HostConfirm {
                handoff_status: actual,
                host_distance_meters,
                host_within_range,
                key_message: None,
                newly_completed: false,
                trip,
            });
        }
        None => return Err(RoveoError::NotFound(format!("Trip {} not found.", trip_id))),
    }

    info!(
        trip_id,
        host_distance_meters, host_within_range, "handoff complete"
    );

    let (updated_trip, _) = store
        .update_trip(trip_id, |t| {
            t.actual_pickup_time = Some(Utc::now());
            t.pickup_odometer = Some(vehicle.odometer);
            t.pickup_level = Some(vehicle.fuel_level);
        })
        .ok_or_else(|| RoveoError::NotFound(format!("Trip {} not found.", trip_id)))?;

    // Effective key instructions: text supplied with this confirm wins
    // over the vehicle's saved default.
    let supplied = key_instructions
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if save_key_instructions {
        if let Some(text) = supplied.clone() {
            store.update_vehicle(vehicle.id, |v| v.key_instructions = Some(text));
        }
    }
    let effective = supplied.or_else(|| vehicle.key_instructions.clone());

    let key_message = match effective {
        Some(body) if !body.is_empty() => {
            store.insert_message_if_absent(trip_id, MessageCategory::KeyInstructions, body)
        }
        _ => None,
    };

    Ok(HostConfirm {
        handoff_status: HandoffState::HandoffComplete,
        host_distance_meters,
        host_within_range,
        key_message,
        newly_completed: true,
        trip: updated_trip,
    })
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FuelLevel, UsageDeclaration, Vehicle};
    use chrono::{Duration, Utc};

    const VEHICLE_LAT: f64 = 40.4259;
    const VEHICLE_LON: f64 = -86.9081;

    fn seed(store: &Store) {
        store.insert_vehicle(Vehicle {
            id: 7,
            vin: String::from("1HGCM82633A004352"),
            name: String::from("Blue Civic"),
            host_id: 2,
            parked_latitude: VEHICLE_LAT,
            parked_longitude: VEHICLE_LON,
            usage_declaration: UsageDeclaration::RentalOnly,
            odometer: 42_000,
            fuel_level: FuelLevel::Full,
            last_rental_end_odometer: 41_990,
            last_rental_end_date: None,
            key_instructions: Some(String::from("Lockbox on the rear left wheel, code 4417.")),
        });
        store.insert_trip(Trip {
            id: 1,
            confirmation: String::from("RVO-88121"),
            guest_id: 10,
            host_id: 2,
            vehicle_id: 7,
            rsvp_pickup_time: Utc::now(),
            rsvp_drop_off_time: Utc::now() + Duration::days(2),
            daily_mileage_allowance: 200,
            handoff_state: HandoffState::NotStarted,
            actual_pickup_time: None,
            pickup_odometer: None,
            pickup_level: None,
            actual_drop_off_time: None,
            drop_off_odometer: None,
            drop_off_level: None,
            charge_breakdown: None,
        });
    }

    #[test]
    fn far_away_guest_is_not_verified() {
        let store = Store::new();
        seed(&store);
        let out = guest_arrival(&store, 1, 40.4400, -86.9081, &Policy::default()).unwrap();
        assert!(!out.within_range);
        assert_eq!(out.handoff_state, HandoffState::NotStarted);
        assert!(out.eta_message.unwrap().contains("Blue Civic"));
        assert!(out.approach_message.is_none());
    }

    #[test]
    fn guest_within_radius_is_verified() {
        let store = Store::new();
        seed(&store);
        let out = guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &Policy::default()).unwrap();
        assert!(out.within_range);
        assert_eq!(out.handoff_state, HandoffState::GuestVerified);
        assert!(out.eta_message.is_none());
        assert!(out.approach_message.is_some());
        assert_eq!(
            store.get_trip(1).unwrap().handoff_state,
            HandoffState::GuestVerified
        );
    }

    #[test]
    fn repeated_arrival_pings_send_one_approach_message() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        let first = guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();
        let second = guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();
        assert!(first.approach_message.is_some());
        assert!(second.approach_message.is_none());
    }

    #[test]
    fn null_island_ping_is_gps_unavailable() {
        let store = Store::new();
        seed(&store);
        let err = guest_arrival(&store, 1, 0.0, 0.0, &Policy::default()).unwrap_err();
        assert!(matches!(err, RoveoError::Validation(_)));
        assert_eq!(
            store.get_trip(1).unwrap().handoff_state,
            HandoffState::NotStarted
        );
    }

    #[test]
    fn host_confirm_before_guest_verified_is_precondition_error() {
        let store = Store::new();
        seed(&store);
        let err = host_confirm(
            &store,
            1,
            VEHICLE_LAT,
            VEHICLE_LON,
            None,
            false,
            &Policy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RoveoError::Precondition(_)));
        // No skip edge: the state did not move.
        assert_eq!(
            store.get_trip(1).unwrap().handoff_state,
            HandoffState::NotStarted
        );
    }

    #[test]
    fn full_handoff_flow() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        let out = host_confirm(&store, 1, VEHICLE_LAT, VEHICLE_LON, None, false, &policy).unwrap();
        assert_eq!(out.handoff_status, HandoffState::HandoffComplete);
        assert!(out.host_within_range);
        // Vehicle default instructions were delivered.
        let message = out.key_message.unwrap();
        assert!(message.body.contains("4417"));

        let trip = store.get_trip(1).unwrap();
        assert_eq!(trip.handoff_state, HandoffState::HandoffComplete);
        assert_eq!(trip.pickup_odometer, Some(42_000));
        assert_eq!(trip.pickup_level, Some(FuelLevel::Full));
        assert!(trip.actual_pickup_time.is_some());
    }

    #[test]
    fn out_of_range_host_does_not_block() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        // Host is kilometers away; the transition still fires.
        let out = host_confirm(&store, 1, 40.5000, -86.9081, None, false, &policy).unwrap();
        assert_eq!(out.handoff_status, HandoffState::HandoffComplete);
        assert!(!out.host_within_range);
        assert!(out.host_distance_meters.unwrap() > policy.handoff_radius_meters);
    }

    #[test]
    fn host_without_gps_fix_still_completes() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        let out = host_confirm(&store, 1, 0.0, 0.0, None, false, &policy).unwrap();
        assert_eq!(out.handoff_status, HandoffState::HandoffComplete);
        assert!(out.host_distance_meters.is_none());
        assert!(!out.host_within_range);
    }

    #[test]
    fn duplicate_confirm_is_idempotent() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        let first = host_confirm(&store, 1, VEHICLE_LAT, VEHICLE_LON, None, false, &policy).unwrap();
        let first_message = first.key_message.unwrap();

        let second =
            host_confirm(&store, 1, VEHICLE_LAT, VEHICLE_LON, None, false, &policy).unwrap();
        assert_eq!(second.handoff_status, HandoffState::HandoffComplete);
        assert!(second.key_message.is_none());

        // Still exactly the original message on file.
        let stored = store
            .get_message(1, MessageCategory::KeyInstructions)
            .unwrap();
        assert_eq!(stored.id, first_message.id);
    }

    #[test]
    fn supplied_instructions_override_saved_default() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        let out = host_confirm(
            &store,
            1,
            VEHICLE_LAT,
            VEHICLE_LON,
            Some(String::from("Keys are with the doorman today.")),
            true,
            &policy,
        )
        .unwrap();
        assert!(out.key_message.unwrap().body.contains("doorman"));
        // save_key_instructions persisted the new default.
        assert_eq!(
            store.get_vehicle(7).unwrap().key_instructions.unwrap(),
            "Keys are with the doorman today."
        );
    }

    #[test]
    fn no_instructions_anywhere_means_no_message() {
        let store = Store::new();
        seed(&store);
        store.update_vehicle(7, |v| v.key_instructions = None);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        let out = host_confirm(&store, 1, VEHICLE_LAT, VEHICLE_LON, None, false, &policy).unwrap();
        assert_eq!(out.handoff_status, HandoffState::HandoffComplete);
        assert!(out.key_message.is_none());
        assert!(store.get_message(1, MessageCategory::KeyInstructions).is_none());
    }

    #[test]
    fn blank_instructions_fall_back_to_default() {
        let store = Store::new();
        seed(&store);
        let policy = Policy::default();
        guest_arrival(&store, 1, VEHICLE_LAT, VEHICLE_LON, &policy).unwrap();

        let out = host_confirm(
            &store,
            1,
            VEHICLE_LAT,
            VEHICLE_LON,
            Some(String::from("   ")),
            false,
            &policy,
        )
        .unwrap();
        assert!(out.key_message.unwrap().body.contains("4417"));
    }
}
