//! Single binary web server: hosts league view sessions over a JSON API and talks to the
//! league service through the HTTP gateway.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, API_BASE_URL,
//! SESSION_FILE, VIEW_IDLE_HOURS.

use actix_web::{
    delete, get, http::StatusCode, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tennis_league_web::models::timestamp;
use tennis_league_web::{
    create_league, fetch_league_data, ActionError, Config, ErrorKind, FilterKey, FinalModePolicy,
    FinalStageMode, GatewayError, HttpGateway, JsonFileStorage, LeagueApi, LeagueView, Member,
    MemberSession, NewLeague, NewMember, ViewMode,
};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-view entry: the view session + last activity time (for auto-cleanup).
struct ViewEntry {
    view: Arc<Mutex<LeagueView>>,
    last_activity: Instant,
}

struct AppState {
    gateway: HttpGateway,
    views: RwLock<HashMap<Uuid, ViewEntry>>,
    session: RwLock<MemberSession<JsonFileStorage>>,
}

type State = Data<AppState>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateViewBody {
    league_id: String,
    #[serde(default)]
    policy: FinalModePolicy,
}

#[derive(Deserialize)]
struct NavigateBody {
    league_id: String,
}

#[derive(Deserialize)]
struct ModeBody {
    mode: ViewMode,
}

#[derive(Deserialize)]
struct FilterBody {
    filter: FilterKey,
}

#[derive(Deserialize)]
struct InputsBody {
    groups_count: u32,
    courts_count: u32,
}

#[derive(Deserialize)]
struct DialogBody {
    mode: FinalStageMode,
    num_matches: Option<u32>,
}

#[derive(Deserialize)]
struct EditBody {
    scheduled_at: Option<String>,
    court: Option<String>,
}

#[derive(Deserialize)]
struct ScoreBody {
    score_a: String,
    score_b: String,
}

#[derive(Deserialize)]
struct RankingsQuery {
    group_number: Option<u32>,
}

/// Path segment: view id (e.g. /api/views/{id})
#[derive(Deserialize)]
struct ViewPath {
    id: Uuid,
}

/// Path segments: view id and match id
#[derive(Deserialize)]
struct ViewMatchPath {
    id: Uuid,
    match_id: String,
}

/// Path segments: view id and member id
#[derive(Deserialize)]
struct ViewMemberPath {
    id: Uuid,
    member_id: String,
}

#[derive(Deserialize)]
struct LeaguePath {
    league_id: String,
}

fn error_json(status: StatusCode, message: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message.to_string() }))
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

fn no_view() -> HttpResponse {
    error_json(StatusCode::NOT_FOUND, "No league view")
}

fn gateway_error(e: &GatewayError) -> HttpResponse {
    let status = match e.kind() {
        ErrorKind::Rejected => StatusCode::BAD_REQUEST,
        ErrorKind::Network | ErrorKind::Server | ErrorKind::Decode => StatusCode::BAD_GATEWAY,
    };
    error_json(status, e)
}

fn action_error(e: &ActionError) -> HttpResponse {
    match e {
        ActionError::Gateway(g) => gateway_error(g),
        local => error_json(StatusCode::BAD_REQUEST, local),
    }
}

/// Signed-in member, cloned out of the session.
fn current_member(state: &State) -> Result<Option<Member>, HttpResponse> {
    let session = state.session.read().map_err(|_| lock_error())?;
    Ok(session.member().cloned())
}

/// Look up a view and refresh its last activity.
fn view_handle(state: &State, id: Uuid) -> Result<Arc<Mutex<LeagueView>>, HttpResponse> {
    let mut views = state.views.write().map_err(|_| lock_error())?;
    let entry = views.get_mut(&id).ok_or_else(no_view)?;
    entry.last_activity = Instant::now();
    Ok(entry.view.clone())
}

/// Load a league into a view. The view lock is released while the requests are in flight;
/// results for a league the view has since left are dropped.
async fn navigate(state: &State, handle: &Arc<Mutex<LeagueView>>, league_id: String) {
    let ticket = handle.lock().await.begin_load(league_id);
    let outcome = fetch_league_data(&state.gateway, ticket).await;
    let league_id = outcome.ticket().league_id().to_string();
    let mut view = handle.lock().await;
    if !view.apply_load(outcome) {
        log::debug!("view moved on before league {league_id} finished loading");
    }
}

/// Run `action` on a view and answer with the rendered view, or the action's error.
macro_rules! with_view {
    ($state:expr, $id:expr, |$view:ident, $member:ident| $action:expr) => {{
        let handle = match view_handle(&$state, $id) {
            Ok(h) => h,
            Err(resp) => return resp,
        };
        let $member = match current_member(&$state) {
            Ok(m) => m,
            Err(resp) => return resp,
        };
        let mut guard = handle.lock().await;
        let $view = &mut *guard;
        let result: Result<(), ActionError> = $action;
        match result {
            Ok(()) => HttpResponse::Ok().json($view.render($member.as_ref())),
            Err(e) => action_error(&e),
        }
    }};
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tennis-league-web",
    })
}

#[get("/api/session")]
async fn api_get_session(state: State) -> HttpResponse {
    match state.session.read() {
        Ok(session) => HttpResponse::Ok().json(session.state()),
        Err(_) => lock_error(),
    }
}

/// Sign in as an existing member.
#[put("/api/session")]
async fn api_set_session(state: State, body: Json<Member>) -> HttpResponse {
    let mut session = match state.session.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match session.set_member(body.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(session.state()),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Sign out.
#[delete("/api/session")]
async fn api_clear_session(state: State) -> HttpResponse {
    let mut session = match state.session.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match session.clear() {
        Ok(()) => HttpResponse::Ok().json(session.state()),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[post("/api/session/theme")]
async fn api_toggle_theme(state: State) -> HttpResponse {
    let mut session = match state.session.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match session.toggle_theme() {
        Ok(_) => HttpResponse::Ok().json(session.state()),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Sign up: create the member and make it the session member.
#[post("/api/members")]
async fn api_create_member(state: State, body: Json<NewMember>) -> HttpResponse {
    let member = match state.gateway.create_member(&body).await {
        Ok(m) => m,
        Err(e) => return gateway_error(&e),
    };
    let mut session = match state.session.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match session.set_member(member.clone()) {
        Ok(()) => HttpResponse::Ok().json(member),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[get("/api/leagues")]
async fn api_list_leagues(state: State) -> HttpResponse {
    match state.gateway.list_leagues().await {
        Ok(leagues) => HttpResponse::Ok().json(leagues),
        Err(e) => gateway_error(&e),
    }
}

/// Create a league (admin only).
#[post("/api/leagues")]
async fn api_create_league(state: State, body: Json<NewLeague>) -> HttpResponse {
    let member = match current_member(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match create_league(&state.gateway, member.as_ref(), &body).await {
        Ok(league) => HttpResponse::Ok().json(league),
        Err(e) => action_error(&e),
    }
}

#[get("/api/leagues/{league_id}/rankings")]
async fn api_rankings(
    state: State,
    path: Path<LeaguePath>,
    query: Query<RankingsQuery>,
) -> HttpResponse {
    match state.gateway.rankings(&path.league_id, query.group_number).await {
        Ok(rankings) => HttpResponse::Ok().json(rankings),
        Err(e) => gateway_error(&e),
    }
}

/// Mount a view for a league and load it (returns the view with its id).
#[post("/api/views")]
async fn api_create_view(state: State, body: Json<CreateViewBody>) -> HttpResponse {
    let id = Uuid::new_v4();
    let handle = Arc::new(Mutex::new(LeagueView::with_policy(body.policy)));
    {
        let mut views = match state.views.write() {
            Ok(guard) => guard,
            Err(_) => return lock_error(),
        };
        views.insert(
            id,
            ViewEntry {
                view: handle.clone(),
                last_activity: Instant::now(),
            },
        );
    }
    navigate(&state, &handle, body.into_inner().league_id).await;
    let member = match current_member(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let view = handle.lock().await;
    HttpResponse::Ok().json(serde_json::json!({ "id": id, "view": view.render(member.as_ref()) }))
}

#[get("/api/views/{id}")]
async fn api_get_view(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| Ok(()))
}

/// Point a view at another league (or reload the same one).
#[put("/api/views/{id}/league")]
async fn api_navigate_view(
    state: State,
    path: Path<ViewPath>,
    body: Json<NavigateBody>,
) -> HttpResponse {
    let handle = match view_handle(&state, path.id) {
        Ok(h) => h,
        Err(resp) => return resp,
    };
    navigate(&state, &handle, body.into_inner().league_id).await;
    with_view!(state, path.id, |view, member| Ok(()))
}

/// Leave a view: pending loads are dropped and the view is removed.
#[delete("/api/views/{id}")]
async fn api_leave_view(state: State, path: Path<ViewPath>) -> HttpResponse {
    let entry = match state.views.write() {
        Ok(mut views) => views.remove(&path.id),
        Err(_) => return lock_error(),
    };
    match entry {
        Some(entry) => {
            entry.view.lock().await.leave();
            HttpResponse::NoContent().finish()
        }
        None => no_view(),
    }
}

#[put("/api/views/{id}/mode")]
async fn api_set_mode(state: State, path: Path<ViewPath>, body: Json<ModeBody>) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.set_mode(body.mode);
        Ok(())
    })
}

#[put("/api/views/{id}/filter")]
async fn api_set_filter(
    state: State,
    path: Path<ViewPath>,
    body: Json<FilterBody>,
) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.set_filter(body.filter);
        Ok(())
    })
}

#[put("/api/views/{id}/inputs")]
async fn api_set_inputs(
    state: State,
    path: Path<ViewPath>,
    body: Json<InputsBody>,
) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.set_inputs(body.groups_count, body.courts_count);
        Ok(())
    })
}

/// Generate the preliminary bracket (admin, no bracket yet).
#[post("/api/views/{id}/bracket")]
async fn api_generate_bracket(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .generate_bracket(&state.gateway, member.as_ref())
        .await)
}

#[post("/api/views/{id}/final-stage/dialog")]
async fn api_open_final_stage_dialog(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.open_final_stage_dialog();
        Ok(())
    })
}

#[put("/api/views/{id}/final-stage/dialog")]
async fn api_configure_final_stage(
    state: State,
    path: Path<ViewPath>,
    body: Json<DialogBody>,
) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .configure_final_stage(body.mode, body.num_matches))
}

#[delete("/api/views/{id}/final-stage/dialog")]
async fn api_close_final_stage_dialog(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.close_final_stage_dialog();
        Ok(())
    })
}

/// Generate the final stage (admin, preliminary complete, no final stage yet).
#[post("/api/views/{id}/final-stage")]
async fn api_generate_final_stage(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .generate_final_stage(&state.gateway, member.as_ref())
        .await)
}

#[post("/api/views/{id}/matches/{match_id}/edit")]
async fn api_start_edit(state: State, path: Path<ViewMatchPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view.start_edit(&path.match_id))
}

#[put("/api/views/{id}/matches/{match_id}/edit")]
async fn api_update_edit(
    state: State,
    path: Path<ViewMatchPath>,
    body: Json<EditBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let scheduled_at = match body.scheduled_at.as_deref().map(timestamp::parse) {
        Some(None) => return error_json(StatusCode::BAD_REQUEST, "Invalid scheduled time"),
        Some(at) => at,
        None => None,
    };
    with_view!(state, path.id, |view, member| view.update_edit(
        &path.match_id,
        scheduled_at,
        body.court
    ))
}

#[delete("/api/views/{id}/matches/{match_id}/edit")]
async fn api_cancel_edit(state: State, path: Path<ViewMatchPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.cancel_edit(&path.match_id);
        Ok(())
    })
}

#[post("/api/views/{id}/matches/{match_id}/edit/save")]
async fn api_save_edit(state: State, path: Path<ViewMatchPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .save_edit(&state.gateway, member.as_ref(), &path.match_id)
        .await)
}

#[put("/api/views/{id}/matches/{match_id}/score")]
async fn api_set_score(
    state: State,
    path: Path<ViewMatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.set_score_draft(&path.match_id, &body.score_a, &body.score_b);
        Ok(())
    })
}

#[post("/api/views/{id}/matches/{match_id}/score/submit")]
async fn api_submit_score(state: State, path: Path<ViewMatchPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .submit_score(&state.gateway, &path.match_id)
        .await)
}

/// Apply to the view's league as the session member.
#[post("/api/views/{id}/applications")]
async fn api_apply(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .apply(&state.gateway, member.as_ref())
        .await)
}

#[delete("/api/views/{id}/applications/{member_id}")]
async fn api_cancel_application(state: State, path: Path<ViewMemberPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| view
        .cancel_application(&state.gateway, member.as_ref(), &path.member_id)
        .await)
}

#[delete("/api/views/{id}/alert")]
async fn api_dismiss_alert(state: State, path: Path<ViewPath>) -> HttpResponse {
    with_view!(state, path.id, |view, member| {
        view.dismiss_alert();
        Ok(())
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let gateway = HttpGateway::new(&config.api_base_url);
    log::info!("League service at {}", gateway.base_url());

    let mut session = MemberSession::new(JsonFileStorage::new(&config.session_file));
    session.init();
    log::info!("Session file {}", session.storage().path().display());

    let state = Data::new(AppState {
        gateway,
        views: RwLock::new(HashMap::new()),
        session: RwLock::new(session),
    });

    // Background task: every 30 minutes, drop views idle past the timeout
    let state_cleanup = state.clone();
    let idle_timeout = config.view_idle_timeout;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.views.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < idle_timeout);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} idle league view(s)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_get_session)
            .service(api_set_session)
            .service(api_clear_session)
            .service(api_toggle_theme)
            .service(api_create_member)
            .service(api_list_leagues)
            .service(api_create_league)
            .service(api_rankings)
            .service(api_create_view)
            .service(api_get_view)
            .service(api_navigate_view)
            .service(api_leave_view)
            .service(api_set_mode)
            .service(api_set_filter)
            .service(api_set_inputs)
            .service(api_generate_bracket)
            .service(api_open_final_stage_dialog)
            .service(api_configure_final_stage)
            .service(api_close_final_stage_dialog)
            .service(api_generate_final_stage)
            .service(api_start_edit)
            .service(api_update_edit)
            .service(api_cancel_edit)
            .service(api_save_edit)
            .service(api_set_score)
            .service(api_submit_score)
            .service(api_apply)
            .service(api_cancel_application)
            .service(api_dismiss_alert)
    })
    .bind(bind)?
    .run()
    .await
}
