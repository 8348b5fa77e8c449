use crate::{CONFIG, STORE, helper_model, methods, model};
use chrono::Utc;
use uuid::Uuid;
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

pub fn main() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("log-anomaly")
        .and(warp::path::end())
        .and(warp::method())
        .and(warp::body::json())
        .and(warp::header::<i32>("auth"))
        .and_then(
            async move |method: Method, body: helper_model::LogAnomalyRequest, user_id: i32| {
                // Checking method is POST
                if method != Method::POST {
                    return methods::standard_replies::method_not_allowed_response();
                }

                if body.vehicle_id <= 0 {
                    return methods::standard_replies::bad_request("Bad request: wrong parameters. ");
                }

                let Some(vehicle) = STORE.get_vehicle(body.vehicle_id) else {
                    return methods::standard_replies::not_found("Vehicle not found.");
                };
                if vehicle.host_id != user_id {
                    return methods::standard_replies::not_your_trip();
                }

                // A caller-supplied severity (e.g. from a reviewed claim)
                // wins; otherwise classify from the declaration.
                let severity = body.severity.unwrap_or_else(|| {
                    methods::mileage::classify(
                        vehicle.usage_declaration,
                        body.gap_miles,
                        &CONFIG.policy,
                    )
                });

                let anomaly = STORE.insert_anomaly(model::MileageAnomaly {
                    id: Uuid::new_v4(),
                    vehicle_id: body.vehicle_id,
                    gap_miles: body.gap_miles,
                    severity,
                    explanation: body.explanation.clone(),
                    detected_at: Utc::now(),
                    resolved: false,
                });
                methods::standard_replies::response_with_obj(anomaly, StatusCode::CREATED)
            },
        )
}
