use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Closed enums. Persistence maps these to TEXT; unrecognized inbound
// strings fail serde deserialization, which is how "unknown fuel level"
// style validation errors surface before any computation runs.

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDeclaration {
    RentalOnly,
    MixedUse,
    Commercial,
}

/// Monotonic per-trip handoff progress. No backward transitions.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffState {
    NotStarted,
    GuestVerified,
    HandoffComplete,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
    Violation,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelLevel {
    Empty,
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl FuelLevel {
    pub fn ordinal(&self) -> i32 {
        match self {
            FuelLevel::Empty => 0,
            FuelLevel::Quarter => 1,
            FuelLevel::Half => 2,
            FuelLevel::ThreeQuarters => 3,
            FuelLevel::Full => 4,
        }
    }
}

/// Natural-key component for per-trip guest/host messages. One message
/// per (trip_id, category) ever; retries must check before writing.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    KeyInstructions,
    Approach,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: i32,
    pub confirmation: String,
    pub guest_id: i32,
    pub host_id: i32,
    pub vehicle_id: i32,
    pub rsvp_pickup_time: DateTime<Utc>,
    pub rsvp_drop_off_time: DateTime<Utc>,
    pub daily_mileage_allowance: i32,
    pub handoff_state: HandoffState,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub pickup_odometer: Option<i32>,
    pub pickup_level: Option<FuelLevel>,
    pub actual_drop_off_time: Option<DateTime<Utc>>,
    pub drop_off_odometer: Option<i32>,
    pub drop_off_level: Option<FuelLevel>,
    // Settlement record. Written once at check-in, immutable after.
    pub charge_breakdown: Option<ChargeBreakdown>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: i32,
    pub vin: String,
    pub name: String,
    pub host_id: i32,
    pub parked_latitude: f64,
    pub parked_longitude: f64,
    pub usage_declaration: UsageDeclaration,
    pub odometer: i32,
    pub fuel_level: FuelLevel,
    pub last_rental_end_odometer: i32,
    pub last_rental_end_date: Option<NaiveDate>,
    pub key_instructions: Option<String>,
}

/// One approach-phase location report. Ephemeral; only the two most
/// recent pings per trip feed any single trust computation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GpsPing {
    pub trip_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub time: DateTime<Utc>,
    pub distance_to_vehicle_meters: f64,
}

/// Audit record for an odometer-gap finding. Never deleted; `resolved`
/// is the only field that changes after creation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MileageAnomaly {
    pub id: Uuid,
    pub vehicle_id: i32,
    pub gap_miles: i32,
    pub severity: Severity,
    pub explanation: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DamageItem {
    pub note: String,
    pub cost: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChargeBreakdown {
    pub mileage_charge: Decimal,
    pub fuel_charge: Decimal,
    pub time_charge: Decimal,
    pub damage_charge: Decimal,
    pub total: Decimal,
    pub overage_miles: i32,
    pub billable_late_minutes: i64,
    pub mileage_percentage: Decimal,
    pub fuel_percentage: Decimal,
    pub time_percentage: Decimal,
    pub damage_percentage: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GuestMessage {
    pub id: Uuid,
    pub trip_id: i32,
    pub category: MessageCategory,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
