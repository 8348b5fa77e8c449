use crate::{CONFIG, STORE, helper_model, integration, methods};
use tracing::warn;
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

pub fn main() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("confirm-handoff")
        .and(warp::path::end())
        .and(warp::method())
        .and(warp::body::json())
        .and(warp::header::<i32>("auth"))
        .and_then(
            async move |method: Method, body: helper_model::ConfirmHandoffRequest, user_id: i32| {
                // Checking method is POST
                if method != Method::POST {
                    return methods::standard_replies::method_not_allowed_response();
                }

                if body.trip_id <= 0 {
                    return methods::standard_replies::bad_request("Bad request: wrong parameters. ");
                }

                let Some(trip) = STORE.get_trip(body.trip_id) else {
                    return methods::standard_replies::not_found("Trip not found.");
                };
                if trip.host_id != user_id {
                    return methods::standard_replies::not_your_trip();
                }

                match methods::handoff::host_confirm(
                    &STORE,
                    body.trip_id,
                    body.latitude,
                    body.longitude,
                    body.key_instructions.clone(),
                    body.save_key_instructions.unwrap_or(false),
                    &CONFIG.policy,
                ) {
                    Err(err) => methods::standard_replies::domain_error_response(err),
                    Ok(confirm) => {
                        if let Some(message) = confirm.key_message.clone() {
                            integration::notify::dispatch(message);
                        }
                        if confirm.newly_completed {
                            // Trip-start odometer audit. The transition is
                            // already committed; a failure here is logged,
                            // never surfaced.
                            if let Err(err) = methods::reconcile::record_handoff_gap_check(
                                &STORE,
                                trip.vehicle_id,
                                &CONFIG.policy,
                            ) {
                                warn!(trip_id = trip.id, error = %err, "gap check failed");
                            }
                        }
                        let reply = helper_model::ConfirmHandoffResponse {
                            handoff_status: confirm.handoff_status,
                            host_distance_meters: confirm.host_distance_meters,
                            host_within_range: confirm.host_within_range,
                        };
                        methods::standard_replies::response_with_obj(reply, StatusCode::OK)
                    }
                }
            },
        )
}
