use crate::config::Policy;
use crate::helper_model::RoveoError;
use crate::methods::{charges, mileage};
use crate::model::{
    ChargeBreakdown, DamageItem, FuelLevel, HandoffState, MileageAnomaly, Severity, Trip,
};
use crate::store::Store;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

// Trip-end sequencing: odometer-gap bookkeeping at trip start and the
// one-shot settlement at trip end. No calculation of its own; it wires
// the pure calculators to the store.

#[derive(Debug)]
pub struct Settlement {
    pub trip: Trip,
    pub breakdown: ChargeBreakdown,
    /// True when a prior settlement was returned instead of recomputed.
    pub already_settled: bool,
}

/// Run the odometer-gap check for a vehicle at trip start. "No anomaly"
/// is a result too, just not a persisted one: a record is written only
/// when the gap is above the declared tolerance.
pub fn record_handoff_gap_check(
    store: &Store,
    vehicle_id: i32,
    policy: &Policy,
) -> Result<Option<MileageAnomaly>, RoveoError> {
    let vehicle = store
        .get_vehicle(vehicle_id)
        .ok_or_else(|| RoveoError::NotFound(format!("Vehicle {} not found.", vehicle_id)))?;

    let gap_miles = vehicle.odometer - vehicle.last_rental_end_odometer;
    let severity = mileage::classify(vehicle.usage_declaration, gap_miles, policy);
    if severity == Severity::Normal {
        return Ok(None);
    }

    let threshold = mileage::gap_threshold_miles(vehicle.usage_declaration, policy);
    let anomaly = store.insert_anomaly(MileageAnomaly {
        id: Uuid::new_v4(),
        vehicle_id,
        gap_miles,
        severity,
        explanation: Some(format!(
            "{} mi since last rental against a {:?} tolerance of {} mi.",
            gap_miles, vehicle.usage_declaration, threshold
        )),
        detected_at: Utc::now(),
        resolved: false,
    });
    info!(vehicle_id, gap_miles, ?severity, "mileage anomaly recorded");
    Ok(Some(anomaly))
}

/// Compute and persist the trip's final bill, idempotency-keyed by trip
/// id: once a breakdown exists it is returned as-is and never silently
/// recomputed.
pub fn settle_trip(
    store: &Store,
    trip_id: i32,
    end_mileage: i32,
    fuel_level_end: FuelLevel,
    damage_items: Vec<DamageItem>,
    return_time: DateTime<Utc>,
    policy: &Policy,
) -> Result<Settlement, RoveoError> {
    let trip = store
        .get_trip(trip_id)
        .ok_or_else(|| RoveoError::NotFound(format!("Trip {} not found.", trip_id)))?;

    if let Some(existing) = trip.charge_breakdown.clone() {
        return Ok(Settlement {
            trip,
            breakdown: existing,
            already_settled: true,
        });
    }

    if trip.handoff_state != HandoffState::HandoffComplete {
        return Err(RoveoError::Precondition(String::from(
            "Trip cannot be settled before handoff is complete.",
        )));
    }
    let (Some(pickup_odometer), Some(pickup_level), Some(_)) =
        (trip.pickup_odometer, trip.pickup_level, trip.actual_pickup_time)
    else {
        return Err(RoveoError::Precondition(String::from(
            "Trip start readings were never recorded.",
        )));
    };

    let rental_days = {
        let hours = (trip.rsvp_drop_off_time - trip.rsvp_pickup_time).num_hours();
        ((hours + 23) / 24).max(1) as i32
    };

    let input = charges::ChargeInput {
        start_mileage: pickup_odometer,
        end_mileage,
        fuel_level_start: pickup_level,
        fuel_level_end,
        scheduled_end: trip.rsvp_drop_off_time,
        actual_return_time: return_time,
        rental_days,
        daily_mileage_allowance: trip.daily_mileage_allowance,
        damage_items,
    };
    let breakdown = charges::calculate(&input, policy)?;

    // Check-before-write under the store lock: a racing settle that got
    // there first wins and we hand back its record.
    let (trip, raced) = store
        .update_trip(trip_id, |t| {
            if let Some(existing) = t.charge_breakdown.clone() {
                return Some(existing);
            }
            t.actual_drop_off_time = Some(return_time);
            t.drop_off_odometer = Some(end_mileage);
            t.drop_off_level = Some(fuel_level_end);
            t.charge_breakdown = Some(breakdown.clone());
            None
        })
        .ok_or_else(|| RoveoError::NotFound(format!("Trip {} not found.", trip_id)))?;

    if let Some(existing) = raced {
        return Ok(Settlement {
            trip,
            breakdown: existing,
            already_settled: true,
        });
    }

    // Roll the vehicle's rental bookkeeping forward for the next
    // trip-start gap check.
    store.update_vehicle(trip.vehicle_id, |v| {
        v.odometer = end_mileage;
        v.fuel_level = fuel_level_end;
        v.last_rental_end_odometer = end_mileage;
        v.last_rental_end_date = Some(return_time.date_naive());
    });

    info!(trip_id, total = %breakdown.total, "trip settled");
    Ok(Settlement {
        trip,
        breakdown,
        already_settled: false,
    })
}

/// Cost-saving hints derived from the breakdown for the check-in reply.
pub fn saving_tips(breakdown: &ChargeBreakdown) -> Vec<String> {
    let mut tips = Vec::new();
    if breakdown.mileage_charge > Decimal::ZERO {
        tips.push(format!(
            "You drove {} miles over the included allowance. A larger mileage plan may cost less next time.",
            breakdown.overage_miles
        ));
    }
    if breakdown.fuel_charge > Decimal::ZERO {
        tips.push(String::from(
            "Returning with at least the pickup fuel level avoids the flat refuel fee.",
        ));
    }
    if breakdown.time_charge > Decimal::ZERO {
        tips.push(String::from(
            "Late returns bill by the started hour. Extending the trip in advance is cheaper.",
        ));
    }
    tips
}
