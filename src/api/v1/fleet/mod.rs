mod log_anomaly;
mod mileage_integrity;

use warp::Filter;

pub fn api_v1_fleet() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone
{
    warp::path("fleet")
        .and(mileage_integrity::main().or(log_anomaly::main()))
        .and(warp::path::end())
}
