use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, error};
use serde::Serialize;
use serde_json::json;
use warp::http::header::{HeaderMap, HeaderValue};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{reply, Filter, Rejection, Reply};

use super::assets;
use super::types::*;
use crate::error_handling::types::SessionError;
use crate::session_management::{default_session_id, SessionManager};

const MAX_BODY_BYTES: u64 = 64 * 1024;
pub const INVALID_ACTION: &str = "Invalid action. Available: create, pair, status, destroy, qr";

/// Status code plus JSON body, kept separate from warp so handlers can be tested directly.
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl ApiReply {
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub fn with_status<T: Serialize>(status: StatusCode, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: json!({ "success": false, "error": e.to_string() }),
                }
            }
        }
    }

    pub fn into_response(self) -> Response {
        reply::with_status(reply::json(&self.body), self.status).into_response()
    }
}

/// Runs one `/api/session` request against the manager.
pub async fn dispatch(manager: &Arc<SessionManager>, params: SessionParams) -> ApiReply {
    let action = match Action::parse(params.action.as_deref()) {
        Some(action) => action,
        None => {
            debug!("Rejected action {:?}", params.action);
            return ApiReply::with_status(StatusCode::BAD_REQUEST, &ApiError::new(INVALID_ACTION));
        }
    };
    let session_id = params
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(default_session_id);

    match action {
        Action::Create => match manager.create(&session_id).await {
            Ok(outcome) => ApiReply::ok(&CreateResponse::from(outcome)),
            Err(e) => error_reply(e),
        },
        Action::Pair => {
            let phone_number = params.phone_number.as_deref();
            match manager.pair(&session_id, phone_number).await {
                Ok(outcome) => ApiReply::ok(&PairResponse::from(outcome)),
                Err(e) => error_reply(e),
            }
        }
        Action::Status => match manager.status(&session_id).await {
            Some(report) => ApiReply::ok(&StatusResponse::from(report)),
            None => ApiReply::ok(&NotFoundResponse::new(&session_id)),
        },
        Action::Qr => match manager.qr(&session_id).await {
            Some(report) => ApiReply::ok(&QrResponse::from(report)),
            None => ApiReply::ok(&NotFoundResponse::new(&session_id)),
        },
        Action::Destroy => {
            manager.destroy(&session_id).await;
            ApiReply::ok(&DestroyResponse::new(&session_id))
        }
    }
}

fn error_reply(err: SessionError) -> ApiReply {
    let status = match &err {
        e if e.is_client_input() => StatusCode::BAD_REQUEST,
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Session error: {}", err);
    }
    ApiReply::with_status(status, &ApiError::new(err.to_string()))
}

/// A POST carries its parameters in a JSON or url-encoded body; an empty body
/// falls back to the query string.
pub fn parse_post_body(
    content_type: Option<&str>,
    body: &[u8],
    query: SessionParams,
) -> Result<SessionParams, ApiReply> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(query);
    }
    if is_form(content_type) {
        return Ok(parse_form(body));
    }
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        ApiReply::with_status(
            StatusCode::BAD_REQUEST,
            &ApiError::new("Invalid request body"),
        )
    })
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

fn parse_form(body: &[u8]) -> SessionParams {
    let mut params = SessionParams::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "action" => params.action = Some(value.into_owned()),
            "sessionId" => params.session_id = Some(value.into_owned()),
            "phoneNumber" => params.phone_number = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

#[derive(Debug)]
struct BodyTooLarge;

impl warp::reject::Reject for BodyTooLarge {}

// Bodies without a Content-Length (curl -X POST) are still accepted.
fn body_limit() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and_then(|length: Option<u64>| async move {
            match length {
                Some(length) if length > MAX_BODY_BYTES => Err(warp::reject::custom(BodyTooLarge)),
                _ => Ok(()),
            }
        })
        .untuple_one()
}

fn with_manager(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = (Arc<SessionManager>,), Error = Infallible> + Clone {
    warp::any().map(move || manager.clone())
}

/// GET|POST|OPTIONS /api/session
pub fn session_api_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let get = warp::path!("api" / "session")
        .and(warp::get())
        .and(warp::query::<SessionParams>())
        .and(with_manager(manager.clone()))
        .then(
            |params: SessionParams, manager: Arc<SessionManager>| async move {
                dispatch(&manager, params).await.into_response()
            },
        );

    let post = warp::path!("api" / "session")
        .and(warp::post())
        .and(warp::query::<SessionParams>())
        .and(body_limit())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::bytes())
        .and(with_manager(manager))
        .then(
            |query: SessionParams,
             content_type: Option<String>,
             body: Bytes,
             manager: Arc<SessionManager>| async move {
                match parse_post_body(content_type.as_deref(), &body, query) {
                    Ok(params) => dispatch(&manager, params).await.into_response(),
                    Err(rejected) => rejected.into_response(),
                }
            },
        );

    let preflight = warp::path!("api" / "session")
        .and(warp::options())
        .map(|| reply::with_status(reply(), StatusCode::OK).into_response());

    get.or(post).unify().or(preflight).unify()
}

/// GET / and the page's assets
pub fn static_files_route(
    serve_ui: bool,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::get()
        .and(warp::path::tail())
        .and_then(move |tail: warp::path::Tail| async move {
            if !serve_ui {
                return Err(warp::reject::not_found());
            }
            assets::asset_response(tail.as_str()).ok_or_else(warp::reject::not_found)
        })
}

/// Everything the server answers: the session API, the page, JSON rejections
/// and CORS headers on every response.
pub fn gateway_routes(
    manager: Arc<SessionManager>,
    serve_ui: bool,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    session_api_route(manager)
        .or(static_files_route(serve_ui))
        .unify()
        .recover(handle_rejection)
        .with(warp::reply::with::headers(cors_headers()))
}

pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<BodyTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            String::from("Request body too large"),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };
    Ok(ApiReply::with_status(status, &ApiError::new(message)).into_response())
}
