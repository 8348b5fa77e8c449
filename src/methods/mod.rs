pub mod charges;
pub mod geo;
pub mod gps_trust;
pub mod handoff;
pub mod mileage;
pub mod reconcile;
pub mod standard_replies;
