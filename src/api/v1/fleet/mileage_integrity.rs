use crate::{CONFIG, STORE, helper_model, methods};
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

pub fn main() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("mileage-integrity")
        .and(warp::path::end())
        .and(warp::method())
        .and(warp::header::<i32>("auth"))
        .and_then(async move |method: Method, host_id: i32| {
            if method != Method::GET {
                return methods::standard_replies::method_not_allowed_response();
            }

            let vehicles = STORE.vehicles_for_host(host_id);
            let reports: Vec<helper_model::VehicleGapReport> = vehicles
                .iter()
                .map(|vehicle| {
                    let gap_miles = vehicle.odometer - vehicle.last_rental_end_odometer;
                    helper_model::VehicleGapReport {
                        vehicle_id: vehicle.id,
                        vehicle_name: vehicle.name.clone(),
                        gap_miles,
                        severity: methods::mileage::classify(
                            vehicle.usage_declaration,
                            gap_miles,
                            &CONFIG.policy,
                        ),
                    }
                })
                .collect();

            let summary = methods::mileage::summarize(&reports);
            let reply = helper_model::FleetIntegrityResponse {
                alerts: methods::mileage::alerts(&summary),
                analysis: methods::mileage::analysis(&summary),
                vehicles: reports,
                summary,
            };
            methods::standard_replies::response_with_obj(reply, StatusCode::OK)
        })
}
