//! HTTP helpers for Lambda functions.

use lambda_http::http::response::Builder;
use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Methods the calendar endpoints answer to.
pub const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Request headers browsers may send.
pub const CORS_ALLOW_HEADERS: &str = "Content-Type,Authorization";

/// Standard error envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Builds responses carrying the CORS headers every browser-facing reply needs.
#[derive(Debug, Clone)]
pub struct Cors {
    allow_origin: String,
}

impl Cors {
    pub fn new(allow_origin: impl Into<String>) -> Self {
        Self {
            allow_origin: allow_origin.into(),
        }
    }

    fn builder(&self, status: u16) -> Builder {
        Response::builder()
            .status(status)
            .header("Access-Control-Allow-Origin", self.allow_origin.as_str())
            .header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
            .header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
    }

    /// Create a JSON response with the given status code and data.
    pub fn json<T: Serialize>(
        &self,
        status: u16,
        data: &T,
    ) -> Result<Response<Body>, lambda_http::Error> {
        Ok(self
            .builder(status)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(data)?))?)
    }

    /// Create an error response with the given status code and message.
    pub fn error(
        &self,
        status: u16,
        message: impl Into<String>,
    ) -> Result<Response<Body>, lambda_http::Error> {
        self.json(status, &ApiError::new(message))
    }

    /// Empty 204 reply to a CORS preflight.
    pub fn preflight(&self) -> Result<Response<Body>, lambda_http::Error> {
        Ok(self.builder(204).body(Body::Empty)?)
    }

    /// Parse request body as JSON, returning a 400 response on failure.
    ///
    /// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
    /// or `Err(lambda_http::Error)` on serialization failure.
    pub fn parse_json_body<T: DeserializeOwned>(
        &self,
        body: &Body,
    ) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
        match serde_json::from_slice(body.as_ref()) {
            Ok(parsed) => Ok(Ok(parsed)),
            Err(e) => {
                let response = self.error(400, format!("Invalid request body: {}", e))?;
                Ok(Err(response))
            }
        }
    }
}

/// First value of a query string parameter, already decoded by the runtime.
pub fn query_param(event: &Request, name: &str) -> Option<String> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
        .map(str::to_string)
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(cors, event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($cors:expr, $body:expr) => {
        match $cors.parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}
