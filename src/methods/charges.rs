use crate::config::Policy;
use crate::helper_model::RoveoError;
use crate::model::{ChargeBreakdown, DamageItem, FuelLevel};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// End-of-trip bill. Pure and deterministic: no clock reads beyond the
// explicit return time argument, so an audit recompute with the same
// inputs always reproduces the same breakdown.

#[derive(Debug, Clone)]
pub struct ChargeInput {
    pub start_mileage: i32,
    pub end_mileage: i32,
    pub fuel_level_start: FuelLevel,
    pub fuel_level_end: FuelLevel,
    pub scheduled_end: DateTime<Utc>,
    pub actual_return_time: DateTime<Utc>,
    pub rental_days: i32,
    pub daily_mileage_allowance: i32,
    pub damage_items: Vec<DamageItem>,
}

pub fn calculate(input: &ChargeInput, policy: &Policy) -> Result<ChargeBreakdown, RoveoError> {
    // All validation up front; no partial result is ever returned.
    if input.end_mileage < input.start_mileage {
        return Err(RoveoError::Validation(String::from(
            "End mileage cannot be below start mileage.",
        )));
    }
    if input.rental_days < 1 {
        return Err(RoveoError::Validation(String::from(
            "Rental must span at least one day.",
        )));
    }
    for item in &input.damage_items {
        if item.cost < Decimal::ZERO {
            return Err(RoveoError::Validation(format!(
                "Damage item '{}' has a negative cost.",
                item.note
            )));
        }
    }

    let driven_miles = input.end_mileage - input.start_mileage;
    let included_miles = input.rental_days * input.daily_mileage_allowance;
    let overage_miles = (driven_miles - included_miles).max(0);
    let mileage_charge = Decimal::from(overage_miles) * policy.per_mile_overage_rate;

    let needs_refuel = input.fuel_level_end.ordinal() < input.fuel_level_start.ordinal();
    let fuel_charge = if needs_refuel {
        policy.refuel_flat_fee
    } else {
        Decimal::ZERO
    };

    let minutes_past_schedule = (input.actual_return_time - input.scheduled_end).num_minutes();
    let billable_late_minutes = (minutes_past_schedule - policy.grace_period_minutes).max(0);
    let time_charge = if billable_late_minutes > 0 {
        // Partial hours round up: billing predictability over
        // per-minute fairness.
        let billable_hours = (billable_late_minutes + 59) / 60;
        Decimal::from(billable_hours) * policy.per_hour_late_rate
    } else {
        Decimal::ZERO
    };

    let damage_charge: Decimal = input.damage_items.iter().map(|item| item.cost).sum();

    let total = mileage_charge + fuel_charge + time_charge + damage_charge;

    Ok(ChargeBreakdown {
        mileage_charge,
        fuel_charge,
        time_charge,
        damage_charge,
        total,
        overage_miles,
        billable_late_minutes,
        mileage_percentage: percentage_of(mileage_charge, total),
        fuel_percentage: percentage_of(fuel_charge, total),
        time_percentage: percentage_of(time_charge, total),
        damage_percentage: percentage_of(damage_charge, total),
    })
}

fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total > Decimal::ZERO {
        (part / total).round_dp(4)
    } else {
        Decimal::ZERO
    }
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_input() -> ChargeInput {
        let scheduled_end = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        ChargeInput {
            start_mileage: 10_000,
            end_mileage: 10_250,
            fuel_level_start: FuelLevel::Full,
            fuel_level_end: FuelLevel::Full,
            scheduled_end,
            actual_return_time: scheduled_end,
            rental_days: 2,
            daily_mileage_allowance: 200,
            damage_items: vec![],
        }
    }

    #[test]
    fn within_allowance_bills_no_mileage() {
        // 2-day trip, 200 mi/day allowance, 250 driven: included 400.
        let policy = Policy::default();
        let breakdown = calculate(&base_input(), &policy).unwrap();
        assert_eq!(breakdown.overage_miles, 0);
        assert_eq!(breakdown.mileage_charge, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::ZERO);
    }

    #[test]
    fn overage_billed_per_mile() {
        let policy = Policy::default();
        let mut input = base_input();
        input.end_mileage = 10_650; // 650 driven, 400 included
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.overage_miles, 250);
        assert_eq!(
            breakdown.mileage_charge,
            Decimal::from(250) * policy.per_mile_overage_rate
        );
    }

    #[test]
    fn no_miles_driven_no_mileage_charge() {
        let policy = Policy::default();
        let mut input = base_input();
        input.end_mileage = input.start_mileage;
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.mileage_charge, Decimal::ZERO);
    }

    #[test]
    fn refuel_fee_only_when_fuel_dropped() {
        let policy = Policy::default();

        let mut input = base_input();
        input.fuel_level_start = FuelLevel::Half;
        input.fuel_level_end = FuelLevel::Quarter;
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.fuel_charge, policy.refuel_flat_fee);

        // Returned with the same or more fuel: no charge.
        input.fuel_level_end = FuelLevel::Half;
        assert_eq!(
            calculate(&input, &policy).unwrap().fuel_charge,
            Decimal::ZERO
        );
        input.fuel_level_end = FuelLevel::Full;
        assert_eq!(
            calculate(&input, &policy).unwrap().fuel_charge,
            Decimal::ZERO
        );
    }

    #[test]
    fn ninety_minutes_late_with_thirty_grace_is_one_hour() {
        let policy = Policy::default();
        let mut input = base_input();
        input.actual_return_time = input.scheduled_end + Duration::minutes(90);
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.billable_late_minutes, 60);
        assert_eq!(breakdown.time_charge, policy.per_hour_late_rate);
    }

    #[test]
    fn partial_late_hours_round_up() {
        let policy = Policy::default();
        let mut input = base_input();
        input.actual_return_time = input.scheduled_end + Duration::minutes(91);
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.billable_late_minutes, 61);
        assert_eq!(
            breakdown.time_charge,
            Decimal::from(2) * policy.per_hour_late_rate
        );
    }

    #[test]
    fn within_grace_period_is_free() {
        let policy = Policy::default();
        let mut input = base_input();
        input.actual_return_time = input.scheduled_end + Duration::minutes(30);
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.time_charge, Decimal::ZERO);
        // Early return is not credited either.
        input.actual_return_time = input.scheduled_end - Duration::hours(3);
        assert_eq!(
            calculate(&input, &policy).unwrap().time_charge,
            Decimal::ZERO
        );
    }

    #[test]
    fn damage_items_are_summed() {
        let policy = Policy::default();
        let mut input = base_input();
        input.damage_items = vec![
            DamageItem {
                note: String::from("door ding"),
                cost: Decimal::new(12050, 2),
            },
            DamageItem {
                note: String::from("windshield chip"),
                cost: Decimal::new(8000, 2),
            },
        ];
        let breakdown = calculate(&input, &policy).unwrap();
        assert_eq!(breakdown.damage_charge, Decimal::new(20050, 2));
    }

    #[test]
    fn total_is_exact_sum_of_parts() {
        let policy = Policy::default();
        let mut input = base_input();
        input.end_mileage = 10_777;
        input.fuel_level_end = FuelLevel::Empty;
        input.actual_return_time = input.scheduled_end + Duration::minutes(125);
        input.damage_items = vec![DamageItem {
            note: String::from("scratch"),
            cost: Decimal::new(3333, 2),
        }];
        let b = calculate(&input, &policy).unwrap();
        assert_eq!(
            b.total,
            b.mileage_charge + b.fuel_charge + b.time_charge + b.damage_charge
        );
        assert!(b.total > Decimal::ZERO);
    }

    #[test]
    fn zero_total_has_zero_percentages() {
        let policy = Policy::default();
        let breakdown = calculate(&base_input(), &policy).unwrap();
        assert_eq!(breakdown.mileage_percentage, Decimal::ZERO);
        assert_eq!(breakdown.fuel_percentage, Decimal::ZERO);
        assert_eq!(breakdown.time_percentage, Decimal::ZERO);
        assert_eq!(breakdown.damage_percentage, Decimal::ZERO);
    }

    #[test]
    fn rejects_rolled_back_odometer() {
        let policy = Policy::default();
        let mut input = base_input();
        input.end_mileage = input.start_mileage - 1;
        assert!(matches!(
            calculate(&input, &policy),
            Err(RoveoError::Validation(_))
        ));
    }

    #[test]
    fn rejects_negative_damage_cost() {
        let policy = Policy::default();
        let mut input = base_input();
        input.damage_items = vec![DamageItem {
            note: String::from("refund attempt"),
            cost: Decimal::new(-100, 2),
        }];
        assert!(matches!(
            calculate(&input, &policy),
            Err(RoveoError::Validation(_))
        ));
    }

    #[test]
    fn recompute_is_deterministic() {
        let policy = Policy::default();
        let mut input = base_input();
        input.end_mileage = 10_990;
        input.actual_return_time = input.scheduled_end + Duration::minutes(200);
        let first = calculate(&input, &policy).unwrap();
        let second = calculate(&input, &policy).unwrap();
        assert_eq!(first, second);
    }
}
