use std::sync::Arc;

use axum::extract::{Form, Path, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::GlobalKeyExtractor,
    GovernorLayer,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::campground::Campground;
use crate::schema::{self, CampgroundForm};

use super::error::AppError;
use super::pages;
use super::session::{current_user, establish, require_user, rotate};
use super::state::{AppState, Flash};

pub fn router(state: AppState) -> Router {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(50)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .unwrap_or_else(|| panic!("default governor config is valid")),
    );

    Router::new()
        .route("/", get(|| async { Redirect::to("/campgrounds") }))
        .route("/health", get(health))
        .route("/campgrounds", get(list).post(create))
        .route("/campgrounds/new", get(new_form))
        .route(
            "/campgrounds/{id}",
            get(show)
                .put(update)
                .delete(delete_campground)
                .post(mutate_via_form),
        )
        .route("/campgrounds/{id}/edit", get(edit_form))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .layer(GovernorLayer::new(governor_conf))
        .layer(tower_http::request_id::SetRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
            tower_http::request_id::MakeRequestUuid::default(),
        ))
        .layer(tower_http::request_id::PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Plain HTML forms can only submit GET and POST, so the edit and delete forms
/// post to the detail path with `?_method=PUT|DELETE` and this handler fans the
/// request out, matching the method-override convention of the original app.
/// A POST without a recognized override is a 405.
async fn mutate_via_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    jar: CookieJar,
    Form(form): Form<CampgroundForm>,
) -> Result<Response, AppError> {
    match override_target(&uri) {
        Some(Method::PUT) => {
            debug!(path = uri.path(), "method override applied: PUT");
            update(State(state), Path(id), jar, Form(form)).await
        }
        Some(Method::DELETE) => {
            debug!(path = uri.path(), "method override applied: DELETE");
            Ok(delete_campground(State(state), Path(id), jar).await)
        }
        _ => Ok(StatusCode::METHOD_NOT_ALLOWED.into_response()),
    }
}

fn override_target(uri: &Uri) -> Option<Method> {
    let query = uri.query()?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != "_method" {
            return None;
        }
        match value.to_ascii_uppercase().as_str() {
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        }
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    users: usize,
    campgrounds: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        users: state.users.len(),
        campgrounds: state.campgrounds.len(),
    })
}

async fn list(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = establish(&state, jar);
    let viewer = current_user(&state, &token);
    let flash = state.sessions.take_flash(&token);
    let campgrounds = state.campgrounds.all();
    debug!(campgrounds = campgrounds.len(), "campground index requested");
    (jar, Html(pages::index(&campgrounds, viewer.as_ref(), &flash))).into_response()
}

async fn new_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = establish(&state, jar);
    let viewer = match require_user(&state, &token) {
        Ok(user) => user,
        Err(redirect) => return (jar, redirect).into_response(),
    };
    let flash = state.sessions.take_flash(&token);
    (jar, Html(pages::new_form(Some(&viewer), &flash))).into_response()
}

async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CampgroundForm>,
) -> Result<Response, AppError> {
    let (jar, token) = establish(&state, jar);
    let user = match require_user(&state, &token) {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let input = schema::validate(form)?;
    let campground = state.campgrounds.insert(input, user.id);
    info!(
        campground = %campground.id,
        author = %user.username,
        "campground created"
    );
    state
        .sessions
        .push_flash(&token, Flash::success("Successfully created campground"));
    Ok((jar, redirect_to_detail(campground.id)).into_response())
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Response {
    let (jar, token) = establish(&state, jar);
    let Some(campground) = lookup(&state, &id) else {
        return (jar, not_found_redirect(&state, &token)).into_response();
    };

    let viewer = current_user(&state, &token);
    let flash = state.sessions.take_flash(&token);
    let author_name = state
        .users
        .get(campground.author)
        .map(|user| user.username)
        .unwrap_or_else(|| String::from("unknown"));
    debug!(campground = %campground.id, "campground detail requested");
    (
        jar,
        Html(pages::show(
            &campground,
            &author_name,
            viewer.as_ref(),
            &flash,
        )),
    )
        .into_response()
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Response {
    let (jar, token) = establish(&state, jar);
    let user = match require_user(&state, &token) {
        Ok(user) => user,
        Err(redirect) => return (jar, redirect).into_response(),
    };
    let Some(campground) = lookup(&state, &id) else {
        return (jar, not_found_redirect(&state, &token)).into_response();
    };
    if campground.author != user.id {
        return (jar, not_owner_redirect(&state, &token, &campground, &user.username)).into_response();
    }

    let flash = state.sessions.take_flash(&token);
    (jar, Html(pages::edit_form(&campground, Some(&user), &flash))).into_response()
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
    Form(form): Form<CampgroundForm>,
) -> Result<Response, AppError> {
    let (jar, token) = establish(&state, jar);
    let user = match require_user(&state, &token) {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let input = schema::validate(form)?;
    let Some(campground) = lookup(&state, &id) else {
        return Ok((jar, not_found_redirect(&state, &token)).into_response());
    };
    if campground.author != user.id {
        return Ok(
            (jar, not_owner_redirect(&state, &token, &campground, &user.username)).into_response(),
        );
    }

    // A concurrent delete can land between the lookup and the write.
    let Some(updated) = state.campgrounds.update(campground.id, input) else {
        return Ok((jar, not_found_redirect(&state, &token)).into_response());
    };
    info!(campground = %updated.id, author = %user.username, "campground updated");
    state
        .sessions
        .push_flash(&token, Flash::success("Campground edited successfully"));
    Ok((jar, redirect_to_detail(updated.id)).into_response())
}

async fn delete_campground(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Response {
    let (jar, token) = establish(&state, jar);
    let user = match require_user(&state, &token) {
        Ok(user) => user,
        Err(redirect) => return (jar, redirect).into_response(),
    };
    let Some(campground) = lookup(&state, &id) else {
        return (jar, not_found_redirect(&state, &token)).into_response();
    };
    if campground.author != user.id {
        return (jar, not_owner_redirect(&state, &token, &campground, &user.username)).into_response();
    }

    state.campgrounds.remove(campground.id);
    info!(campground = %campground.id, author = %user.username, "campground deleted");
    state
        .sessions
        .push_flash(&token, Flash::success("Campground deleted"));
    (jar, Redirect::to("/campgrounds")).into_response()
}

async fn register_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = establish(&state, jar);
    let flash = state.sessions.take_flash(&token);
    (jar, Html(pages::register_form(&flash))).into_response()
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<RegisterBody>,
) -> Response {
    let (jar, token) = establish(&state, jar);
    let username = body.username.unwrap_or_default();
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    match state.users.register(&username, &email, &password) {
        Ok(user) => {
            let token = state.sessions.set_user(&token, user.id);
            state
                .sessions
                .push_flash(&token, Flash::success("Welcome, you just registered"));
            info!(user = %user.username, "user registered");
            let jar = rotate(&state, jar, token);
            (jar, Redirect::to("/campgrounds")).into_response()
        }
        Err(error) => {
            debug!(username = username.trim(), error = %error, "registration rejected");
            state
                .sessions
                .push_flash(&token, Flash::error(error.to_string()));
            (jar, Redirect::to("/register")).into_response()
        }
    }
}

async fn login_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = establish(&state, jar);
    let flash = state.sessions.take_flash(&token);
    (jar, Html(pages::login_form(&flash))).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    username: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<LoginBody>,
) -> Response {
    let (jar, token) = establish(&state, jar);
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    match state.users.authenticate(username.trim(), &password) {
        Some(user) => {
            let token = state.sessions.set_user(&token, user.id);
            state
                .sessions
                .push_flash(&token, Flash::success("Welcome back"));
            info!(user = %user.username, "user logged in");
            let jar = rotate(&state, jar, token);
            (jar, Redirect::to("/campgrounds")).into_response()
        }
        None => {
            warn!(username = username.trim(), "login failed");
            state
                .sessions
                .push_flash(&token, Flash::error("Invalid username or password"));
            (jar, Redirect::to("/login")).into_response()
        }
    }
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = establish(&state, jar);
    state.sessions.clear_user(&token);
    state
        .sessions
        .push_flash(&token, Flash::success("Goodbye!"));
    (jar, Redirect::to("/campgrounds")).into_response()
}

fn lookup(state: &AppState, id: &str) -> Option<Campground> {
    let id = Uuid::parse_str(id).ok()?;
    state.campgrounds.get(id)
}

fn redirect_to_detail(id: Uuid) -> Redirect {
    Redirect::to(&format!("/campgrounds/{id}"))
}

fn not_found_redirect(state: &AppState, token: &str) -> Redirect {
    state
        .sessions
        .push_flash(token, Flash::error("Cannot find that campground"));
    Redirect::to("/campgrounds")
}

fn not_owner_redirect(
    state: &AppState,
    token: &str,
    campground: &Campground,
    username: &str,
) -> Redirect {
    warn!(
        campground = %campground.id,
        user = username,
        "mutation rejected: not the owner"
    );
    state.sessions.push_flash(
        token,
        Flash::error("You don't have permission to do that"),
    );
    redirect_to_detail(campground.id)
}
