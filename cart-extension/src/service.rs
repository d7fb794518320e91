use crate::errors::CartExtensionError;
use crate::handler::CartHandler;
use crate::metrics_defs::REQUEST_DURATION;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::histogram;
use shared::http::{full_body, make_error_response};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

/// Receives API extension calls and answers with the cart validation result.
///
/// The response goes out as soon as validation is done; telemetry for accepted
/// carts keeps running in its own task.
pub struct CartExtensionService {
    handler: CartHandler,
}

impl CartExtensionService {
    pub fn new(handler: CartHandler) -> Self {
        Self { handler }
    }
}

impl Service<Request<Incoming>> for CartExtensionService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = CartExtensionError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            if req.method() != Method::POST {
                tracing::warn!(method = %req.method(), path = %req.uri().path(), "Unsupported method");
                return Ok(make_error_response(StatusCode::METHOD_NOT_ALLOWED));
            }

            let start = Instant::now();
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e = CartExtensionError::RequestBodyError(e.to_string());
                    tracing::warn!(error = %e, "Dropping request");
                    return Ok(make_error_response(StatusCode::BAD_REQUEST));
                }
            };

            let response = handler.handle(&body).into_response();
            histogram!(REQUEST_DURATION).record(start.elapsed().as_secs_f64());

            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, full_body(body)))
        })
    }
}
