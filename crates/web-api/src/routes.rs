use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;

use application::{
    AddMemberRequest, AuthenticateUserRequest, ChannelDto, CreateChannelRequest,
    DeleteMessageRequest, EditMessageRequest, JoinChannelRequest, LeaveChannelRequest,
    MessageDto, RegisterUserRequest, UserDto,
};
use domain::ChannelVisibility;

use crate::{auth::LoginResponse, error::ApiError, state::AppState, ws_connection::WsConnection};

#[derive(Debug, Deserialize, Validate)]
struct RegisterPayload {
    #[validate(length(min = 1, max = 50))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CreateChannelPayload {
    name: String,
    description: Option<String>,
    visibility: Option<ChannelVisibility>,
}

#[derive(Debug, Deserialize)]
struct AddMemberPayload {
    email: String,
}

#[derive(Debug, Deserialize)]
struct EditMessagePayload {
    content: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    search: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
        .route("/auth/users", get(list_users))
        .route("/channels", post(create_channel).get(list_channels))
        .route("/channels/{channel_id}/join", post(join_channel))
        .route("/channels/{channel_id}/leave", put(leave_channel))
        .route("/channels/{channel_id}/members", put(add_member))
        .route("/channels/{channel_id}/messages", get(get_history))
        .route(
            "/messages/{message_id}",
            put(edit_message).delete(delete_message),
        )
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    payload
        .validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let dto = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let token = state.jwt_service.generate_token(user.id)?;
    Ok(Json(LoginResponse { user, token }))
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

async fn create_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateChannelPayload>,
) -> Result<(StatusCode, Json<ChannelDto>), ApiError> {
    let creator_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let dto = state
        .channel_service
        .create_channel(CreateChannelRequest {
            name: payload.name,
            description: payload.description,
            visibility: payload.visibility.unwrap_or(ChannelVisibility::Public),
            creator_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn list_channels(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ChannelDto>>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let channels = state.channel_service.list_channels(user_id).await?;
    Ok(Json(channels))
}

async fn join_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(channel_id): Path<Uuid>,
) -> Result<Json<ChannelDto>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let dto = state
        .channel_service
        .join_channel(JoinChannelRequest {
            channel_id,
            user_id,
        })
        .await?;

    Ok(Json(dto))
}

async fn leave_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(channel_id): Path<Uuid>,
) -> Result<Json<ChannelDto>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let dto = state
        .channel_service
        .leave_channel(LeaveChannelRequest {
            channel_id,
            user_id,
        })
        .await?;

    Ok(Json(dto))
}

async fn add_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(channel_id): Path<Uuid>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<Json<ChannelDto>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let dto = state
        .channel_service
        .add_member(AddMemberRequest {
            channel_id,
            email: payload.email,
        })
        .await?;

    Ok(Json(dto))
}

async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let items = state
        .chat_service
        .get_history(channel_id, query.search)
        .await?;

    Ok(Json(items))
}

/// HTTP 侧编辑消息。落库后走与 socket 管线相同的
/// message_updated 扇出路径。
async fn edit_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
    Json(payload): Json<EditMessagePayload>,
) -> Result<Json<MessageDto>, ApiError> {
    let requester_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let dto = state
        .chat_service
        .edit_message(EditMessageRequest {
            message_id,
            requester_id,
            content: payload.content,
        })
        .await?;

    Ok(Json(dto))
}

/// HTTP 侧软删除消息，同样以 message_updated 扇出。
async fn delete_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
) -> Result<Json<MessageDto>, ApiError> {
    let requester_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let dto = state
        .chat_service
        .delete_message(DeleteMessageRequest {
            message_id,
            requester_id,
        })
        .await?;

    Ok(Json(dto))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // 连接升级前完成认证，核心只接触已验证的身份
    let claims = state.jwt_service.verify_token(&query.token)?;
    let user_id = claims.user_id;

    Ok(ws.on_upgrade(move |socket| async move {
        WsConnection::new(state, user_id.into()).run(socket).await;
    }))
}
