use std::{future::Future, sync::Arc};

use axum::{
    extract::{OriginalUri, Path, State},
    http::Method,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, on, post},
    Extension, Router,
};
use futures::Stream;
use model::{call::CallState, snapshot::TrackingSnapshot, subject::Subject};
use tokio_stream::{
    wrappers::{BroadcastStream, WatchStream},
    StreamExt as _,
};
use tower_http::trace::TraceLayer;
use ::tracking::{error::TrackingResult, TrackingHandle};
use utility::id::Id;

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, RouteResult,
        METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    sessions::{SessionError, Sessions},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/tracking{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<TrackingSnapshot>))
        .route("/:subject", get(get_snapshot).post(open).delete(close))
        .route("/:subject/call", post(request_call).delete(end_call))
        .route("/:subject/call/confirm", post(confirm_call))
        .route("/:subject/call/cancel", post(cancel_confirmation))
        .route("/:subject/call/recording", post(toggle_recording))
        .route("/:subject/events", get(events))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

fn snapshot_hateoas(
    id: &Id<Subject>,
    snapshot: TrackingSnapshot,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<TrackingSnapshot> {
    let open = snapshot.is_open;
    let state = snapshot.call_state;
    hateoas::Response::builder(snapshot, base_url)
        .link("self", resource!("/{}", id))
        .link("events", resource!("/{}/events", id))
        .link_if(
            open && state == CallState::Idle,
            "requestCall",
            resource!("/{}/call", id),
        )
        .link_if(
            open && state == CallState::AwaitingConfirmation,
            "confirmCall",
            resource!("/{}/call/confirm", id),
        )
        .link_if(
            open && state == CallState::AwaitingConfirmation,
            "cancelCall",
            resource!("/{}/call/cancel", id),
        )
        .link_if(
            open && state == CallState::Active,
            "endCall",
            resource!("/{}/call", id),
        )
        .link_if(
            open && state == CallState::Active,
            "toggleRecording",
            resource!("/{}/call/recording", id),
        )
        .build()
}

/// Runs `command` on the open session of `id` and renders the resulting
/// snapshot.
async fn run_command<F, Fut>(
    method: Method,
    uri: OriginalUri,
    id: String,
    sessions: Sessions,
    base_url: Arc<BaseUrl>,
    command: F,
) -> HateoasResult<TrackingSnapshot>
where
    F: FnOnce(TrackingHandle) -> Fut,
    Fut: Future<Output = TrackingResult<TrackingSnapshot>>,
{
    let id = Id::new(id);
    let result = match sessions.get_open(&id).await {
        Ok(handle) => command(handle).await.map_err(SessionError::from),
        Err(why) => Err(why),
    };
    result
        .map(|snapshot| snapshot_hateoas(&id, snapshot, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&method)
                .with_uri(uri.path())
        })
}

async fn open(
    method: Method,
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    let id = Id::new(id);
    sessions
        .open(&id)
        .await
        .map(|snapshot| snapshot_hateoas(&id, snapshot, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&method)
                .with_uri(original_uri.path())
        })
}

async fn get_snapshot(
    method: Method,
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    let id = Id::new(id);
    let result = match sessions.get(&id).await {
        Ok(handle) => handle.snapshot().await.map_err(SessionError::from),
        Err(why) => Err(why),
    };
    result
        .map(|snapshot| snapshot_hateoas(&id, snapshot, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&method)
                .with_uri(original_uri.path())
        })
}

async fn close(
    method: Method,
    uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    run_command(method, uri, id, sessions, base_url, |handle| async move {
        handle.close().await
    })
    .await
}

async fn request_call(
    method: Method,
    uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    run_command(method, uri, id, sessions, base_url, |handle| async move {
        handle.request_call().await
    })
    .await
}

async fn confirm_call(
    method: Method,
    uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    run_command(method, uri, id, sessions, base_url, |handle| async move {
        handle.confirm_call().await
    })
    .await
}

async fn cancel_confirmation(
    method: Method,
    uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    run_command(method, uri, id, sessions, base_url, |handle| async move {
        handle.cancel_confirmation().await
    })
    .await
}

async fn end_call(
    method: Method,
    uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    run_command(method, uri, id, sessions, base_url, |handle| async move {
        handle.end_call().await
    })
    .await
}

async fn toggle_recording(
    method: Method,
    uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<TrackingSnapshot> {
    run_command(method, uri, id, sessions, base_url, |handle| async move {
        handle.toggle_recording().await
    })
    .await
}

/// Server-sent events: a `snapshot` event whenever the tracking state
/// changes, starting with the current one, and a `notification` event for
/// every notification.
async fn events(
    method: Method,
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { sessions }): State<WebState>,
) -> RouteResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let id = Id::<Subject>::new(id);
    let handle = sessions.get(&id).await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&method)
            .with_uri(original_uri.path())
    })?;
    log::info!("client subscribed to events of {}", id);

    let snapshots = WatchStream::new(handle.snapshots())
        .map(|snapshot| Event::default().event("snapshot").json_data(snapshot));
    let notifications = BroadcastStream::new(handle.notifications())
        .filter_map(move |received| match received {
            Ok(notification) => Some(notification),
            Err(why) => {
                log::warn!("event stream of {} fell behind: {}", id, why);
                None
            }
        })
        .map(|notification| {
            Event::default()
                .event("notification")
                .json_data(notification)
        });

    Ok(Sse::new(snapshots.merge(notifications)).keep_alive(KeepAlive::default()))
}
