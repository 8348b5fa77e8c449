use crate::helper_model::{ErrorResponse, RoveoError};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

pub fn bad_request(err_msg: &str) -> Result<(warp::reply::Response,), Rejection> {
    let msg: ErrorResponse = ErrorResponse {
        title: String::from("Bad Request"),
        message: err_msg.to_string(),
    };
    Ok::<_, Rejection>((warp::reply::with_status(
        warp::reply::json(&msg),
        StatusCode::BAD_REQUEST,
    )
    .into_response(),))
}

/// Precondition failures are retryable once the trip advances, so they
/// get a distinct status from plain validation errors.
pub fn precondition_failed(err_msg: &str) -> Result<(warp::reply::Response,), Rejection> {
    let msg: ErrorResponse = ErrorResponse {
        title: String::from("Precondition Failed"),
        message: err_msg.to_string(),
    };
    Ok((warp::reply::with_status(warp::reply::json(&msg), StatusCode::CONFLICT).into_response(),))
}

pub fn not_found(err_msg: &str) -> Result<(warp::reply::Response,), Rejection> {
    let msg: ErrorResponse = ErrorResponse {
        title: String::from("Not Found"),
        message: err_msg.to_string(),
    };
    Ok((warp::reply::with_status(warp::reply::json(&msg), StatusCode::NOT_FOUND).into_response(),))
}

pub fn not_your_trip() -> Result<(warp::reply::Response,), Rejection> {
    let msg: ErrorResponse = ErrorResponse {
        title: String::from("Permission Denied"),
        message: String::from("You are not a party to this trip."),
    };
    Ok((warp::reply::with_status(warp::reply::json(&msg), StatusCode::FORBIDDEN).into_response(),))
}

pub fn method_not_allowed_response() -> Result<(warp::reply::Response,), Rejection> {
    let msg: ErrorResponse = ErrorResponse {
        title: String::from("Method Not Allowed"),
        message: String::from("Using third party applications is not encouraged. "),
    };
    Ok((warp::reply::with_status(
        warp::reply::json(&msg),
        StatusCode::METHOD_NOT_ALLOWED,
    )
    .into_response(),))
}

pub fn internal_server_error_response(msg: String) -> Result<(warp::reply::Response,), Rejection> {
    tracing::error!(detail = %msg, "internal server error");
    let msg: ErrorResponse = ErrorResponse {
        title: String::from("Internal Server Error"),
        message: String::from("Please try again later. If the issue persists, contact us at dev@roveo.rent "),
    };
    Ok::<_, Rejection>((warp::reply::with_status(
        warp::reply::json(&msg),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .into_response(),))
}

pub fn response_with_obj<T>(
    obj: T,
    status_code: StatusCode,
) -> Result<(warp::reply::Response,), Rejection>
where
    T: serde::Serialize,
{
    Ok((warp::reply::with_status(warp::reply::json(&obj), status_code).into_response(),))
}

/// Map a domain error to its reply. Keeps the three error classes
/// (validation / precondition / the rest) distinguishable to callers.
pub fn domain_error_response(err: RoveoError) -> Result<(warp::reply::Response,), Rejection> {
    match err {
        RoveoError::Validation(m) => bad_request(&m),
        RoveoError::Precondition(m) => precondition_failed(&m),
        RoveoError::NotFound(m) => not_found(&m),
        RoveoError::Internal(m) => internal_server_error_response(m),
    }
}
