//! Per-request flash-message context.
//!
//! Extracting a `FlashSession` drains the session's pending messages exactly
//! once: they are available to the page rendered by this request, while
//! messages pushed during the request are kept for the next one.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};
use std::future::{Ready, ready};
use std::sync::Arc;

use super::SessionStore;
use crate::AppState;
use crate::models::FlashMessage;

pub struct FlashSession {
    store: Arc<SessionStore>,
    cookie_name: String,
    token: Option<String>,
    /// A new session was started during this request, so the cookie must be sent
    issued: bool,
    messages: Vec<FlashMessage>,
}

impl FlashSession {
    pub fn new(store: Arc<SessionStore>, cookie_name: &str, token: Option<String>) -> Self {
        let token = token.filter(|t| store.contains(t));
        let messages = token
            .as_deref()
            .map(|t| store.take_messages(t))
            .unwrap_or_default();

        Self {
            store,
            cookie_name: cookie_name.to_string(),
            token,
            issued: false,
            messages,
        }
    }

    /// Messages flushed from the session for this request's page
    pub fn messages(&self) -> &[FlashMessage] {
        &self.messages
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Queue a message for the next rendered page. Starts a session if needed.
    pub fn push(&mut self, message: FlashMessage) {
        let token = match &self.token {
            Some(token) if self.store.push_message(token, message.clone()) => return,
            _ => self.store.create(),
        };
        self.store.push_message(&token, message);
        self.token = Some(token);
        self.issued = true;
    }

    /// Attach the session cookie to the response when a session was started.
    pub fn finish(&self, mut response: HttpResponse) -> HttpResponse {
        if let (true, Some(token)) = (self.issued, &self.token) {
            let cookie = Cookie::build(self.cookie_name.clone(), token.clone())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish();
            if let Err(e) = response.add_cookie(&cookie) {
                log::error!("Failed to set session cookie: {}", e);
            }
        }
        response
    }
}

impl FromRequest for FlashSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            log::error!("AppState not found in app data for path: {}", req.path());
            return ready(Err(actix_web::error::ErrorInternalServerError(
                "session store unavailable",
            )));
        };

        let cookie_name = &state.config.session.cookie_name;
        let token = req.cookie(cookie_name).map(|c| c.value().to_string());

        ready(Ok(FlashSession::new(
            Arc::clone(&state.sessions),
            cookie_name,
            token,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Duration::from_secs(60), 100))
    }

    #[test]
    fn test_push_without_session_issues_cookie() {
        let store = store();
        let mut flash = FlashSession::new(Arc::clone(&store), "sid", None);
        assert!(!flash.has_messages());

        flash.push(FlashMessage::success("Card updated"));
        let response = flash.finish(HttpResponse::Found().finish());

        let cookie = response.cookies().find(|c| c.name() == "sid").expect("cookie set");
        assert!(cookie.http_only().unwrap_or(false));

        let next = FlashSession::new(Arc::clone(&store), "sid", Some(cookie.value().to_string()));
        assert_eq!(next.messages(), &[FlashMessage::success("Card updated")]);
    }

    #[test]
    fn test_existing_session_is_drained_once() {
        let store = store();
        let token = store.create();
        store.push_message(&token, FlashMessage::fail("Can't find that card"));

        let mut flash = FlashSession::new(Arc::clone(&store), "sid", Some(token.clone()));
        assert!(flash.has_messages());

        flash.push(FlashMessage::success("Card deleted"));
        let response = flash.finish(HttpResponse::Ok().finish());
        assert_eq!(response.cookies().count(), 0);

        let next = FlashSession::new(Arc::clone(&store), "sid", Some(token));
        assert_eq!(next.messages(), &[FlashMessage::success("Card deleted")]);
    }

    #[test]
    fn test_unknown_token_starts_fresh_session() {
        let store = store();
        let mut flash = FlashSession::new(Arc::clone(&store), "sid", Some("stale".to_string()));
        flash.push(FlashMessage::fail("Failed to create card"));

        let response = flash.finish(HttpResponse::Found().finish());
        let cookie = response.cookies().next().expect("cookie set");
        assert_ne!(cookie.value(), "stale");
        assert_eq!(store.len(), 1);
    }
}
