//! Lets HTML forms reach PUT/PATCH/DELETE routes.
//!
//! A `POST` whose query string carries `_method=PUT|PATCH|DELETE` is
//! re-dispatched with that method before routing. Any other value is ignored.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::Method;
use std::future::{Ready, ready};

pub const METHOD_OVERRIDE_PARAM: &str = "_method";

/// Method override middleware factory
pub struct MethodOverride;

impl<S, B> Transform<S, ServiceRequest> for MethodOverride
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MethodOverrideMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MethodOverrideMiddleware { service }))
    }
}

pub struct MethodOverrideMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for MethodOverrideMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        if req.method() == Method::POST {
            if let Some(method) = override_method(req.query_string()) {
                log::debug!("Method override: POST {} -> {}", req.path(), method);
                req.head_mut().method = method;
            }
        }
        self.service.call(req)
    }
}

/// Read the override target from a query string
pub fn override_method(query: &str) -> Option<Method> {
    let (_, value) = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == METHOD_OVERRIDE_PARAM)?;

    match value.trim().to_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}
