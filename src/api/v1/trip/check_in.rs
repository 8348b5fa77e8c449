use crate::{CONFIG, STORE, helper_model, methods};
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

pub fn main() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("check-in")
        .and(warp::path::end())
        .and(warp::method())
        .and(warp::body::json())
        .and(warp::header::<i32>("auth"))
        .and_then(
            async move |method: Method, body: helper_model::CheckInRequest, user_id: i32| {
                // Checking method is POST
                if method != Method::POST {
                    return methods::standard_replies::method_not_allowed_response();
                }

                if body.trip_id <= 0 || body.end_mileage < 0 {
                    return methods::standard_replies::bad_request("Bad request: wrong parameters. ");
                }

                let Some(trip) = STORE.get_trip(body.trip_id) else {
                    return methods::standard_replies::not_found("Trip not found.");
                };
                // Either party may close the trip out.
                if trip.guest_id != user_id && trip.host_id != user_id {
                    return methods::standard_replies::not_your_trip();
                }

                match methods::reconcile::settle_trip(
                    &STORE,
                    body.trip_id,
                    body.end_mileage,
                    body.fuel_level_end,
                    body.damage_items.clone(),
                    body.return_time,
                    &CONFIG.policy,
                ) {
                    Err(err) => methods::standard_replies::domain_error_response(err),
                    Ok(settlement) => {
                        let reply = helper_model::CheckInResponse {
                            charges: settlement.breakdown.total,
                            tips: methods::reconcile::saving_tips(&settlement.breakdown),
                            breakdown: settlement.breakdown,
                            booking_echo: settlement.trip,
                        };
                        let status = if settlement.already_settled {
                            StatusCode::OK
                        } else {
                            StatusCode::CREATED
                        };
                        methods::standard_replies::response_with_obj(reply, status)
                    }
                }
            },
        )
}
