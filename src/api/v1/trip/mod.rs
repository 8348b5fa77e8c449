mod approach_ping;
mod check_in;
mod confirm_handoff;

use warp::Filter;

pub fn api_v1_trip() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone
{
    warp::path("trip")
        .and(
            approach_ping::main()
                .or(confirm_handoff::main())
                .or(check_in::main()),
        )
        .and(warp::path::end())
}
