use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_APP_ID: &str = "test-app";
pub const DEFAULT_API_KEY: &str = "test-key";
const DEFAULT_PER_PAGE: usize = 500;

#[derive(Deserialize)]
pub struct ThreadInput {
    pub user_id: String,
    pub email: Option<String>,
    pub body: Option<String>,
    pub current_url: Option<String>,
}

#[derive(Deserialize)]
pub struct ImpressionInput {
    pub user_id: String,
    pub email: Option<String>,
    pub user_ip: Option<String>,
    pub user_agent: Option<String>,
    pub current_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub user_id: String,
    pub event_name: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub email: Option<String>,
    pub created: Option<i64>,
}

#[derive(Deserialize)]
pub struct TagInput {
    pub name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    pub color: Option<String>,
    pub tag_or_untag: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub tagged_user_count: usize,
}

#[derive(Default)]
pub struct Store {
    pub users: Vec<Map<String, Value>>,
    pub threads: Vec<Value>,
    pub impressions: Vec<Value>,
    pub events: Vec<Event>,
    tags: HashMap<String, (Tag, BTreeSet<String>)>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    authorization: Arc<str>,
}

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "error": message })))
}

pub fn basic_auth(app_id: &str, api_key: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{app_id}:{api_key}"));
    format!("Basic {encoded}")
}

pub fn app() -> Router {
    app_with_credentials(DEFAULT_APP_ID, DEFAULT_API_KEY)
}

pub fn app_with_credentials(app_id: &str, api_key: &str) -> Router {
    let state = AppState {
        db: Db::default(),
        authorization: basic_auth(app_id, api_key).into(),
    };
    router(state)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/users", post(create_user).put(update_user))
        .route("/v1/users/", get(get_users).delete(delete_user))
        .route(
            "/v1/users/message_threads",
            get(get_threads).post(create_thread),
        )
        .route("/v1/users/impressions", post(create_impression))
        .route("/v1/tags", post(create_tag).put(update_tag))
        .route("/v1/tags/", get(get_tag))
        .route("/events/", post(create_event))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run_with(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if supplied != Some(state.authorization.as_ref()) {
        debug!(uri = %request.uri(), "rejecting request without valid credentials");
        return failure(StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    next.run(request).await
}

fn field<'a>(user: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    user.get(name).and_then(Value::as_str)
}

/// Index of the user addressed by an `email` or `user_id` pair.
fn find_user(users: &[Map<String, Value>], key: &str, value: &str) -> Option<usize> {
    users.iter().position(|u| field(u, key) == Some(value))
}

fn lookup_key(params: &HashMap<String, String>) -> Option<(&'static str, &str)> {
    if let Some(email) = params.get("email") {
        return Some(("email", email));
    }
    params.get("user_id").map(|id| ("user_id", id.as_str()))
}

fn body_key(user: &Map<String, Value>) -> Option<(&'static str, &str)> {
    if let Some(id) = field(user, "user_id") {
        return Some(("user_id", id));
    }
    field(user, "email").map(|email| ("email", email))
}

async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Failure> {
    let store = state.db.read().await;

    if let Some((key, value)) = lookup_key(&params) {
        let idx = find_user(&store.users, key, value)
            .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
        return Ok(Json(Value::Object(store.users[idx].clone())));
    }

    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
        .max(1);
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .max(1);
    let total = store.users.len();
    let users: Vec<_> = store
        .users
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    Ok(Json(json!({
        "users": users,
        "page": page,
        "total_count": total,
        "total_pages": total.div_ceil(per_page),
    })))
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, Failure> {
    let (key, value) = body_key(&input)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "user_id or email required"))?;
    let mut store = state.db.write().await;

    let user = match find_user(&store.users, key, value) {
        Some(idx) => {
            let user = &mut store.users[idx];
            user.extend(input);
            user.clone()
        }
        None => {
            let mut user = input;
            user.insert("intercom_id".to_string(), json!(Uuid::new_v4()));
            info!(key, "created user");
            store.users.push(user.clone());
            user
        }
    };
    Ok(Json(Value::Object(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, Failure> {
    let (key, value) = body_key(&input)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "user_id or email required"))?;
    let mut store = state.db.write().await;
    let idx = find_user(&store.users, key, value)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    let user = &mut store.users[idx];
    user.extend(input);
    Ok(Json(Value::Object(user.clone())))
}

async fn delete_user(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Failure> {
    let (key, value) = lookup_key(&params)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "user_id or email required"))?;
    let mut store = state.db.write().await;
    let idx = find_user(&store.users, key, value)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    info!(key, "deleted user");
    Ok(Json(Value::Object(store.users.remove(idx))))
}

async fn get_threads(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Failure> {
    let (key, value) = lookup_key(&params)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "user_id or email required"))?;
    let store = state.db.read().await;
    let threads: Vec<_> = store
        .threads
        .iter()
        .filter(|t| t[key].as_str() == Some(value))
        .cloned()
        .collect();
    Ok(Json(Value::Array(threads)))
}

async fn create_thread(
    State(state): State<AppState>,
    Json(input): Json<ThreadInput>,
) -> (StatusCode, Json<Value>) {
    let thread = json!({
        "thread_id": Uuid::new_v4(),
        "user_id": input.user_id,
        "email": input.email,
        "current_url": input.current_url,
        "messages": [{ "html": input.body.unwrap_or_default() }],
    });
    state.db.write().await.threads.push(thread.clone());
    (StatusCode::CREATED, Json(thread))
}

async fn create_impression(
    State(state): State<AppState>,
    Json(input): Json<ImpressionInput>,
) -> Json<Value> {
    let mut store = state.db.write().await;
    let unread = store
        .threads
        .iter()
        .filter(|t| t["user_id"].as_str() == Some(input.user_id.as_str()))
        .count();
    store.impressions.push(json!({
        "user_id": input.user_id,
        "email": input.email,
        "user_ip": input.user_ip,
        "user_agent": input.user_agent,
        "current_url": input.current_url,
    }));
    Json(json!({ "unread_messages": unread }))
}

/// Events are accepted without a response body.
async fn create_event(State(state): State<AppState>, Json(event): Json<Event>) -> StatusCode {
    debug!(event = %event.event_name, "recorded event");
    state.db.write().await.events.push(event);
    StatusCode::ACCEPTED
}

async fn get_tag(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Tag>, Failure> {
    let name = params
        .get("name")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "name required"))?;
    let store = state.db.read().await;
    store
        .tags
        .get(name)
        .map(|(tag, _)| Json(tag.clone()))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "tag not found"))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, Failure> {
    let mut store = state.db.write().await;
    let entry = store.tags.entry(input.name.clone()).or_insert_with(|| {
        let tag = Tag {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            color: None,
            tagged_user_count: 0,
        };
        (tag, BTreeSet::new())
    });
    apply_tag_change(entry, input).map(Json)
}

async fn update_tag(
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, Failure> {
    let mut store = state.db.write().await;
    let entry = store
        .tags
        .get_mut(&input.name)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "tag not found"))?;
    apply_tag_change(entry, input).map(Json)
}

fn apply_tag_change(
    (tag, members): &mut (Tag, BTreeSet<String>),
    input: TagInput,
) -> Result<Tag, Failure> {
    let untag = match input.tag_or_untag.as_deref() {
        None | Some("tag") => false,
        Some("untag") => true,
        Some(_) => return Err(failure(StatusCode::BAD_REQUEST, "tag_or_untag must be tag or untag")),
    };
    let targets = input.emails.into_iter().chain(input.user_ids);
    if untag {
        for target in targets {
            members.remove(&target);
        }
    } else {
        members.extend(targets);
    }
    if input.color.is_some() {
        tag.color = input.color;
    }
    tag.tagged_user_count = members.len();
    Ok(tag.clone())
}
