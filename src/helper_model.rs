use crate::model;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ErrorResponse {
    pub title: String,
    pub message: String,
}

/// Domain error classes. Validation and Precondition are deliberately
/// distinct: a validation failure will never succeed on retry, a
/// precondition failure might once the trip advances.
#[derive(Debug, Clone, PartialEq)]
pub enum RoveoError {
    Validation(String),
    Precondition(String),
    NotFound(String),
    Internal(String),
}

impl std::fmt::Display for RoveoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoveoError::Validation(msg) => write!(f, "validation: {}", msg),
            RoveoError::Precondition(msg) => write!(f, "precondition: {}", msg),
            RoveoError::NotFound(msg) => write!(f, "not found: {}", msg),
            RoveoError::Internal(msg) => write!(f, "internal: {}", msg),
        }
    }
}

impl std::error::Error for RoveoError {}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ApproachPingRequest {
    pub trip_id: i32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ApproachPingResponse {
    pub distance_meters: f64,
    pub within_range: bool,
    pub location_trust: i32,
    pub handoff_state: model::HandoffState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_message: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConfirmHandoffRequest {
    pub trip_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub key_instructions: Option<String>,
    pub save_key_instructions: Option<bool>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConfirmHandoffResponse {
    pub handoff_status: model::HandoffState,
    /// Null when the host device had no GPS fix; the confirm proceeds
    /// regardless (soft check).
    pub host_distance_meters: Option<f64>,
    pub host_within_range: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogAnomalyRequest {
    pub vehicle_id: i32,
    pub gap_miles: i32,
    pub severity: Option<model::Severity>,
    pub explanation: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CheckInRequest {
    pub trip_id: i32,
    pub end_mileage: i32,
    pub fuel_level_end: model::FuelLevel,
    pub damage_items: Vec<model::DamageItem>,
    pub return_time: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CheckInResponse {
    pub charges: Decimal,
    pub breakdown: model::ChargeBreakdown,
    pub tips: Vec<String>,
    pub booking_echo: model::Trip,
}

/// One row of the host's fleet integrity report.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VehicleGapReport {
    pub vehicle_id: i32,
    pub vehicle_name: String,
    pub gap_miles: i32,
    pub severity: model::Severity,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FleetMileageSummary {
    pub total_vehicles: usize,
    pub normal_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    pub violation_count: usize,
    pub compliance_rate: f64,
    pub top_issues: Vec<TopIssue>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TopIssue {
    pub vehicle_id: i32,
    pub vehicle_name: String,
    pub gap_miles: i32,
    pub severity: model::Severity,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FleetIntegrityResponse {
    pub vehicles: Vec<VehicleGapReport>,
    pub summary: FleetMileageSummary,
    pub alerts: Vec<String>,
    pub analysis: String,
}
