use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::users::User;

use super::state::{AppState, Flash};

pub const SESSION_COOKIE: &str = "camp_session";

/// Reuse the request's live session or mint an anonymous one. Returns the jar
/// (with the cookie added when a session was minted) and the session token.
pub fn establish(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        if state.sessions.is_live(&token) {
            return (jar, token);
        }
    }
    let token = state.sessions.create();
    let jar = jar.add(session_cookie(state, token.clone()));
    (jar, token)
}

/// Replace the session cookie after token rotation (login, register).
pub fn rotate(state: &AppState, jar: CookieJar, token: String) -> CookieJar {
    jar.add(session_cookie(state, token))
}

pub fn current_user(state: &AppState, token: &str) -> Option<User> {
    let user_id = state.sessions.user_id(token)?;
    state.users.get(user_id)
}

/// Login gate for owner-gated routes: an anonymous session is flashed and sent
/// to the login page instead of running the handler body.
pub fn require_user(state: &AppState, token: &str) -> Result<User, Redirect> {
    match current_user(state, token) {
        Some(user) => Ok(user),
        None => {
            state
                .sessions
                .push_flash(token, Flash::error("You must be signed in first"));
            Err(Redirect::to("/login"))
        }
    }
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.secure_cookies);
    cookie
}
