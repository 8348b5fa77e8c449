use dotenv::dotenv;
use rust_decimal::Decimal;
use std::env;

/// Every tunable policy constant the engine consumes, in one injectable
/// struct. Defaults match production; tests build their own via
/// `Policy::default()` and tweak fields directly.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Guest/host must be within this many meters of the parked vehicle.
    pub handoff_radius_meters: f64,
    /// Trust score when there is no movement history to validate against.
    pub neutral_trust_score: i32,
    /// Implied speeds above this are treated as teleportation/spoofing.
    /// Order-of-magnitude highway speed; empirically tuned, not physics.
    pub gps_max_speed_mps: f64,
    /// Below this elapsed time, two pings count as a duplicate burst.
    pub gps_min_elapsed_seconds: i64,
    /// Movement below this is attributed to receiver jitter.
    pub gps_jitter_meters: f64,
    pub rental_only_gap_miles: i32,
    pub mixed_use_gap_miles: i32,
    pub commercial_gap_miles: i32,
    pub per_mile_overage_rate: Decimal,
    pub refuel_flat_fee: Decimal,
    pub grace_period_minutes: i64,
    pub per_hour_late_rate: Decimal,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            handoff_radius_meters: 100.0,
            neutral_trust_score: 50,
            gps_max_speed_mps: 55.0,
            gps_min_elapsed_seconds: 2,
            gps_jitter_meters: 10.0,
            rental_only_gap_miles: 15,
            mixed_use_gap_miles: 500,
            commercial_gap_miles: 300,
            per_mile_overage_rate: Decimal::new(45, 2),
            refuel_flat_fee: Decimal::new(7500, 2),
            grace_period_minutes: 30,
            per_hour_late_rate: Decimal::new(2500, 2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub log_level: String,
    pub notify_webhook_url: Option<String>,
    pub policy: Policy,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3030".to_string())
            .parse()
            .unwrap_or(3030);
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let notify_webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok();

        let defaults = Policy::default();
        let policy = Policy {
            handoff_radius_meters: env_f64("HANDOFF_RADIUS_METERS", defaults.handoff_radius_meters),
            neutral_trust_score: env_i32("NEUTRAL_TRUST_SCORE", defaults.neutral_trust_score),
            gps_max_speed_mps: env_f64("GPS_MAX_SPEED_MPS", defaults.gps_max_speed_mps),
            gps_min_elapsed_seconds: env_i64(
                "GPS_MIN_ELAPSED_SECONDS",
                defaults.gps_min_elapsed_seconds,
            ),
            gps_jitter_meters: env_f64("GPS_JITTER_METERS", defaults.gps_jitter_meters),
            rental_only_gap_miles: env_i32("RENTAL_ONLY_GAP_MILES", defaults.rental_only_gap_miles),
            mixed_use_gap_miles: env_i32("MIXED_USE_GAP_MILES", defaults.mixed_use_gap_miles),
            commercial_gap_miles: env_i32("COMMERCIAL_GAP_MILES", defaults.commercial_gap_miles),
            per_mile_overage_rate: env_decimal(
                "PER_MILE_OVERAGE_RATE",
                defaults.per_mile_overage_rate,
            ),
            refuel_flat_fee: env_decimal("REFUEL_FLAT_FEE", defaults.refuel_flat_fee),
            grace_period_minutes: env_i64("GRACE_PERIOD_MINUTES", defaults.grace_period_minutes),
            per_hour_late_rate: env_decimal("PER_HOUR_LATE_RATE", defaults.per_hour_late_rate),
        };

        Ok(AppConfig {
            port,
            log_level,
            notify_webhook_url,
            policy,
        })
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i32(key: &str, default: i32) -> i32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
