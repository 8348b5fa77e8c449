mod fleet;
mod trip;

use warp::Filter;

pub fn api_v1() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("v1")
        .and(trip::api_v1_trip().or(fleet::api_v1_fleet()))
        .and(warp::path::end())
}
