//! Fallback pages: 404 for unmatched routes, 500 for unhandled errors

use actix_web::body::EitherBody;
use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpRequest, HttpResponse, web};
use minijinja::context;

use crate::AppState;
use crate::models::FlashMessage;
use crate::session::FlashSession;
use crate::templates::TemplateEngine;

/// Default service. Pending flash messages are shown and cleared here too.
pub async fn not_found(req: HttpRequest, flash: FlashSession) -> HttpResponse {
    let url = req.uri().to_string();
    let engine = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.templates.as_ref());

    flash.finish(serve_404(&url, engine, flash.messages()))
}

pub fn serve_404(
    url: &str,
    template_engine: Option<&dyn TemplateEngine>,
    messages: &[FlashMessage],
) -> HttpResponse {
    let context = context! {
        url => url,
        messages => messages,
        has_messages => !messages.is_empty(),
    };

    let html = match template_engine {
        Some(engine) => match engine.render("error_404.html", context) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to render 404 error template: {}", e);
                fallback_404_html()
            }
        },
        None => fallback_404_html(),
    };

    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

pub fn serve_500(template_engine: Option<&dyn TemplateEngine>) -> HttpResponse {
    let context = context! {
        messages => Vec::<()>::new(),
        has_messages => false,
    };

    let html = match template_engine {
        Some(engine) => match engine.render("error_500.html", context) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to render 500 error template: {}", e);
                fallback_500_html()
            }
        },
        None => fallback_500_html(),
    };

    HttpResponse::InternalServerError()
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .body(html)
}

/// `ErrorHandlers` hook replacing the body of every 500 response with the error page
pub fn render_500<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let response = {
        let engine = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.templates.as_ref());
        serve_500(engine)
    };

    let res: ServiceResponse<EitherBody<B>> =
        ServiceResponse::new(req, response).map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}

fn fallback_404_html() -> String {
    r#"<!DOCTYPE html>
<html><head><title>404 - Not Found</title></head>
<body><h1>404 - Page Not Found</h1></body></html>"#
        .to_string()
}

fn fallback_500_html() -> String {
    r#"<!DOCTYPE html>
<html><head><title>500 - Internal Server Error</title></head>
<body><h1>500 - Internal Server Error</h1></body></html>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::MiniJinjaEngine;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;

    fn body_text(resp: HttpResponse) -> String {
        let body = resp.into_body().try_into_bytes().unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn test_404_page_names_url() {
        let engine = MiniJinjaEngine::new();
        let resp = serve_404("/nowhere", Some(&engine), &[]);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let html = body_text(resp);
        // `/` is escaped by the HTML auto-escaper
        assert!(html.contains("&#x2f;nowhere"));
        assert!(!html.contains("class=\"messages\""));
    }

    #[test]
    fn test_404_page_shows_pending_messages() {
        let engine = MiniJinjaEngine::new();
        let messages = [FlashMessage::fail("Failed to delete card")];
        let html = body_text(serve_404("/gone", Some(&engine), &messages));

        assert!(html.contains("message-fail"));
        assert!(html.contains("Failed to delete card"));
    }

    #[test]
    fn test_500_without_engine_uses_fallback() {
        let resp = serve_500(None);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = resp.into_body().try_into_bytes().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("500 - Internal Server Error"));
    }
}
