use crate::{CONFIG, STORE, helper_model, integration, methods};
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

pub fn main() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("approach-ping")
        .and(warp::path::end())
        .and(warp::method())
        .and(warp::body::json())
        .and(warp::header::<i32>("auth"))
        .and_then(
            async move |method: Method, body: helper_model::ApproachPingRequest, user_id: i32| {
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
                if trip.guest_id != user_id {
                    return methods::standard_replies::not_your_trip();
                }

                match methods::handoff::guest_arrival(
                    &STORE,
                    body.trip_id,
                    body.latitude,
                    body.longitude,
                    &CONFIG.policy,
                ) {
                    Err(err) => methods::standard_replies::domain_error_response(err),
                    Ok(arrival) => {
                        // Host gets the "guest has arrived" text once per trip.
                        if let Some(message) = arrival.approach_message.clone() {
                            integration::notify::dispatch(message);
                        }
                        let reply = helper_model::ApproachPingResponse {
                            distance_meters: arrival.distance_meters,
                            within_range: arrival.within_range,
                            location_trust: arrival.location_trust,
                            handoff_state: arrival.handoff_state,
                            eta_message: arrival.eta_message,
                        };
                        methods::standard_replies::response_with_obj(reply, StatusCode::OK)
                    }
                }
            },
        )
}
