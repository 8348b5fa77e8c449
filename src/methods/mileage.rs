use crate::config::Policy;
use crate::helper_model::{FleetMileageSummary, TopIssue, VehicleGapReport};
use crate::model::{Severity, UsageDeclaration};

// Classifies odometer gaps between rentals against the owner's usage
// declaration. Pure: persisting an anomaly record is always a separate,
// explicit caller action, so the same classification serves read-only
// dashboards and the write-path anomaly log.

const TOP_ISSUES_CAP: usize = 5;

pub fn gap_threshold_miles(declaration: UsageDeclaration, policy: &Policy) -> i32 {
    match declaration {
        UsageDeclaration::RentalOnly => policy.rental_only_gap_miles,
        UsageDeclaration::MixedUse => policy.mixed_use_gap_miles,
        UsageDeclaration::Commercial => policy.commercial_gap_miles,
    }
}

pub fn classify(declaration: UsageDeclaration, gap_miles: i32, policy: &Policy) -> Severity {
    // Odometer rollback: data/hardware fault or tampering, never benign.
    if gap_miles < 0 {
        return Severity::Critical;
    }
    let threshold = gap_threshold_miles(declaration, policy);
    if declaration == UsageDeclaration::RentalOnly && gap_miles >= 3 * threshold {
        // Declared exclusive-rental use contradicted by clear
        // independent driving.
        return Severity::Violation;
    }
    if gap_miles >= 2 * threshold {
        Severity::Critical
    } else if gap_miles > threshold {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

pub fn summarize(reports: &[VehicleGapReport]) -> FleetMileageSummary {
    let normal_count = reports.iter().filter(|r| r.severity == Severity::Normal).count();
    let warning_count = reports.iter().filter(|r| r.severity == Severity::Warning).count();
    let critical_count = reports.iter().filter(|r| r.severity == Severity::Critical).count();
    let violation_count = reports
        .iter()
        .filter(|r| r.severity == Severity::Violation)
        .count();

    let compliance_rate = if reports.is_empty() {
        0.0
    } else {
        normal_count as f64 / reports.len() as f64
    };

    let mut ranked: Vec<&VehicleGapReport> = reports
        .iter()
        .filter(|r| r.severity != Severity::Normal)
        .collect();
    ranked.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.gap_miles.cmp(&a.gap_miles))
    });
    let top_issues = ranked
        .into_iter()
        .take(TOP_ISSUES_CAP)
        .map(|r| TopIssue {
            vehicle_id: r.vehicle_id,
            vehicle_name: r.vehicle_name.clone(),
            gap_miles: r.gap_miles,
            severity: r.severity,
        })
        .collect();

    FleetMileageSummary {
        total_vehicles: reports.len(),
        normal_count,
        warning_count,
        critical_count,
        violation_count,
        compliance_rate,
        top_issues,
    }
}

/// Human-readable alert lines derived from the counts. Not separately
/// stateful; recomputed on every query.
pub fn alerts(summary: &FleetMileageSummary) -> Vec<String> {
    let mut out = Vec::new();
    if summary.violation_count > 0 {
        out.push(format!(
            "{} vehicle(s) show mileage activity contradicting a rental-only declaration.",
            summary.violation_count
        ));
    }
    if summary.critical_count > 0 {
        out.push(format!(
            "{} vehicle(s) have critical undisclosed mileage gaps.",
            summary.critical_count
        ));
    }
    if summary.warning_count > 0 {
        out.push(format!(
            "{} vehicle(s) exceeded their declared usage tolerance.",
            summary.warning_count
        ));
    }
    out
}

pub fn analysis(summary: &FleetMileageSummary) -> String {
    if summary.total_vehicles == 0 {
        return String::from("No vehicles on file for this host.");
    }
    format!(
        "{} of {} vehicles are within their declared usage tolerance ({:.0}% compliance).",
        summary.normal_count,
        summary.total_vehicles,
        summary.compliance_rate * 100.0
    )
}
