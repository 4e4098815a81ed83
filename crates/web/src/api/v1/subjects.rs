use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, on},
    Extension, Router,
};
use model::subject::Subject;

use crate::{
    common::{route_not_found, HateoasResult, VecResponse, METHOD_FILTER_ALL},
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(get_subjects))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_subjects(
    State(WebState { sessions }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<Subject>>> {
    let subjects = sessions
        .subjects()
        .into_iter()
        .map(|subject| subject_hateoas(subject, base_url.clone()))
        .collect();
    Ok(VecResponse::new(subjects).hateoas().json())
}

fn subject_hateoas(subject: Subject, base_url: Arc<BaseUrl>) -> hateoas::Response<Subject> {
    let id = subject.id.clone();
    hateoas::Response::builder(subject, base_url)
        .link("tracking", super::tracking::resource!("/{}", id))
        .build()
}
