//! Management API handlers.
//!
//! Every handler decodes its id, locks the catalog once, and answers with the
//! entity as JSON plus its current `id`. Bodies are plain JSON objects so that
//! partial updates and `parent` references can be picked apart before the
//! entity is deserialized.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Display;

use crate::catalog::{patch, AclSet, Patch};
use crate::http::{ApiError, AppState};
use crate::keys::{CompositeKey, ConfigurationKey, ElementKey, ProxyKey, TargetKey};
use crate::model::{Configuration, Constraint, Proxy, ProxyType, Server, Target, ValidationError};
use crate::render;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAcls {
    /// Id of the owning proxy.
    pub parent: String,
    pub name: String,
    pub acls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAcls {
    pub acls: Vec<String>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

fn decode<K: CompositeKey>(id: &str) -> ApiResult<K> {
    Ok(K::decode(id)?)
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// The entity's fields plus its `id`.
fn resource<T: Serialize>(id: impl Display, entity: &T) -> ApiResult<Value> {
    let mut value = to_json(entity)?;
    if let Value::Object(object) = &mut value {
        object.insert("id".to_string(), Value::String(id.to_string()));
    }
    Ok(value)
}

fn parse<T: Serialize + serde::de::DeserializeOwned>(body: Map<String, Value>) -> ApiResult<T> {
    Ok(patch::create(body)?)
}

fn take_parent(body: &mut Map<String, Value>) -> ApiResult<String> {
    match body.remove("parent") {
        Some(Value::String(parent)) => Ok(parent),
        _ => Err(ValidationError::required("parent").into()),
    }
}

fn take_commit(patch: &mut Patch) -> ApiResult<bool> {
    match patch.remove("commit") {
        None => Ok(false),
        Some(Value::Bool(commit)) => Ok(commit),
        Some(_) => Err(ValidationError::new(
            "commit",
            Constraint::Invalid("expected a boolean".to_string()),
        )
        .into()),
    }
}

// --- Configurations ---

pub async fn list_configurations(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let catalog = state.catalog.lock().await;
    let items = catalog
        .configurations()
        .iter()
        .map(|c| resource(ConfigurationKey::of(c), c))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(items))
}

pub async fn create_configuration(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let configuration: Configuration = parse(body)?;
    let mut catalog = state.catalog.lock().await;
    let key = catalog.create_configuration(configuration)?;
    let created = resource(&key, catalog.configuration(&key)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_configuration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let key: ConfigurationKey = decode(&id)?;
    let catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.configuration(&key)?)?))
}

/// Patch a configuration; `"commit": true` renders, writes and reloads it
/// afterwards within the same request.
///
/// A failed commit leaves the update applied.
pub async fn update_configuration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut patch): Json<Patch>,
) -> ApiResult<Json<Value>> {
    let key: ConfigurationKey = decode(&id)?;
    let commit = take_commit(&mut patch)?;

    let mut catalog = state.catalog.lock().await;
    let configuration = catalog.update_configuration(&key, &patch)?;
    let mut body = resource(&key, configuration)?;
    if commit {
        let report = state.committer.commit(configuration).await?;
        body["commit"] = to_json(&report)?;
    }
    Ok(Json(body))
}

pub async fn delete_configuration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let key: ConfigurationKey = decode(&id)?;
    state.catalog.lock().await.delete_configuration(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rename_configuration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> ApiResult<Json<Value>> {
    let key: ConfigurationKey = decode(&id)?;
    let mut catalog = state.catalog.lock().await;
    let renamed = catalog.rename_configuration(&key, &request.name)?;
    Ok(Json(resource(&renamed, catalog.configuration(&renamed)?)?))
}

pub async fn render_configuration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let key: ConfigurationKey = decode(&id)?;
    let catalog = state.catalog.lock().await;
    let text = render::render(catalog.configuration(&key)?)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

// --- Frontends and backends ---

async fn list_proxies(state: &AppState, kind: ProxyType) -> ApiResult<Json<Vec<Value>>> {
    let catalog = state.catalog.lock().await;
    let items = catalog
        .proxies(kind)
        .into_iter()
        .map(|(key, proxy)| resource(&key, proxy))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(items))
}

/// The route decides the kind; a conflicting `kind` in the body is rejected.
async fn create_proxy(
    state: &AppState,
    kind: ProxyType,
    mut body: Map<String, Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let parent: ConfigurationKey = decode(&take_parent(&mut body)?)?;
    let expected = Value::String(kind.to_string());
    if let Some(given) = body.insert("kind".to_string(), expected.clone()) {
        if given != expected {
            return Err(ValidationError::new(
                "kind",
                Constraint::Invalid(format!("expected {kind}")),
            )
            .into());
        }
    }
    let proxy: Proxy = parse(body)?;

    let mut catalog = state.catalog.lock().await;
    let key = catalog.create_proxy(&parent, proxy)?;
    let created = resource(&key, catalog.proxy(&key, kind)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_proxy(state: &AppState, kind: ProxyType, id: &str) -> ApiResult<Json<Value>> {
    let key: ProxyKey = decode(id)?;
    let catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.proxy(&key, kind)?)?))
}

async fn update_proxy(
    state: &AppState,
    kind: ProxyType,
    id: &str,
    patch: &Patch,
) -> ApiResult<Json<Value>> {
    let key: ProxyKey = decode(id)?;
    let mut catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.update_proxy(&key, kind, patch)?)?))
}

async fn delete_proxy(state: &AppState, kind: ProxyType, id: &str) -> ApiResult<StatusCode> {
    let key: ProxyKey = decode(id)?;
    state.catalog.lock().await.delete_proxy(&key, kind)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rename_proxy(
    state: &AppState,
    kind: ProxyType,
    id: &str,
    name: &str,
) -> ApiResult<Json<Value>> {
    let key: ProxyKey = decode(id)?;
    let mut catalog = state.catalog.lock().await;
    let renamed = catalog.rename_proxy(&key, kind, name)?;
    Ok(Json(resource(&renamed, catalog.proxy(&renamed, kind)?)?))
}

macro_rules! proxy_handlers {
    ($kind:expr => $list:ident, $create:ident, $get:ident, $update:ident, $delete:ident, $rename:ident) => {
        pub async fn $list(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
            list_proxies(&state, $kind).await
        }

        pub async fn $create(
            State(state): State<AppState>,
            Json(body): Json<Map<String, Value>>,
        ) -> ApiResult<(StatusCode, Json<Value>)> {
            create_proxy(&state, $kind, body).await
        }

        pub async fn $get(
            State(state): State<AppState>,
            Path(id): Path<String>,
        ) -> ApiResult<Json<Value>> {
            get_proxy(&state, $kind, &id).await
        }

        pub async fn $update(
            State(state): State<AppState>,
            Path(id): Path<String>,
            Json(patch): Json<Patch>,
        ) -> ApiResult<Json<Value>> {
            update_proxy(&state, $kind, &id, &patch).await
        }

        pub async fn $delete(
            State(state): State<AppState>,
            Path(id): Path<String>,
        ) -> ApiResult<StatusCode> {
            delete_proxy(&state, $kind, &id).await
        }

        pub async fn $rename(
            State(state): State<AppState>,
            Path(id): Path<String>,
            Json(request): Json<RenameRequest>,
        ) -> ApiResult<Json<Value>> {
            rename_proxy(&state, $kind, &id, &request.name).await
        }
    };
}

proxy_handlers!(ProxyType::Frontend =>
    list_frontends, create_frontend, get_frontend, update_frontend, delete_frontend, rename_frontend);
proxy_handlers!(ProxyType::Backend =>
    list_backends, create_backend, get_backend, update_backend, delete_backend, rename_backend);

// --- Servers ---

pub async fn list_servers(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let catalog = state.catalog.lock().await;
    let items = catalog
        .servers()
        .into_iter()
        .map(|(key, server)| resource(&key, server))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(items))
}

pub async fn create_server(
    State(state): State<AppState>,
    Json(mut body): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let parent: ProxyKey = decode(&take_parent(&mut body)?)?;
    let server: Server = parse(body)?;

    let mut catalog = state.catalog.lock().await;
    let key = catalog.create_server(&parent, server)?;
    let created = resource(&key, catalog.server(&key)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let key: ElementKey = decode(&id)?;
    let catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.server(&key)?)?))
}

pub async fn update_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Patch>,
) -> ApiResult<Json<Value>> {
    let key: ElementKey = decode(&id)?;
    let mut catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.update_server(&key, &patch)?)?))
}

pub async fn delete_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let key: ElementKey = decode(&id)?;
    state.catalog.lock().await.delete_server(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Targets ---

pub async fn list_targets(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let catalog = state.catalog.lock().await;
    let items = catalog
        .targets()
        .into_iter()
        .map(|(key, target)| resource(&key, target))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(items))
}

pub async fn create_target(
    State(state): State<AppState>,
    Json(mut body): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let parent: ProxyKey = decode(&take_parent(&mut body)?)?;
    let target: Target = parse(body)?;

    let mut catalog = state.catalog.lock().await;
    let key = catalog.create_target(&parent, target)?;
    let created = resource(&key, catalog.target(&key)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let key: TargetKey = decode(&id)?;
    let catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.target(&key)?)?))
}

pub async fn update_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Patch>,
) -> ApiResult<Json<Value>> {
    let key: TargetKey = decode(&id)?;
    let mut catalog = state.catalog.lock().await;
    Ok(Json(resource(&key, catalog.update_target(&key, &patch)?)?))
}

pub async fn delete_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let key: TargetKey = decode(&id)?;
    state.catalog.lock().await.delete_target(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- ACL sets ---

pub async fn list_acls(State(state): State<AppState>) -> Json<Vec<AclSet>> {
    let sets = state.catalog.lock().await.acl_sets();
    Json(sets)
}

pub async fn create_acls(
    State(state): State<AppState>,
    Json(request): Json<CreateAcls>,
) -> ApiResult<(StatusCode, Json<AclSet>)> {
    let parent: ProxyKey = decode(&request.parent)?;
    let key = ElementKey {
        configuration: parent.configuration,
        proxy: parent.proxy,
        element: request.name,
    };
    let set = state.catalog.lock().await.create_acls(&key, &request.acls)?;
    Ok((StatusCode::CREATED, Json(set)))
}

pub async fn get_acls(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AclSet>> {
    let key: ElementKey = decode(&id)?;
    let set = state.catalog.lock().await.acl_set(&key)?;
    Ok(Json(set))
}

/// Reconcile the set; the answer lists what was added and removed.
pub async fn update_acls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAcls>,
) -> ApiResult<Json<Value>> {
    let key: ElementKey = decode(&id)?;
    let mut catalog = state.catalog.lock().await;
    let diff = catalog.update_acls(&key, &request.acls)?;
    // An empty list removes the whole set.
    let acls = catalog.acl_set(&key).map(|set| set.acls).unwrap_or_default();
    Ok(Json(json!({
        "id": key.to_string(),
        "name": key.element,
        "acls": acls,
        "added": diff.added,
        "removed": diff.removed,
    })))
}

pub async fn delete_acls(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let key: ElementKey = decode(&id)?;
    state.catalog.lock().await.delete_acls(&key)?;
    Ok(StatusCode::NO_CONTENT)
}
