use axum::{routing::on, Router};

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

mod subjects;
mod tracking;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::resource!("/v1{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .nest_service("/subjects", subjects::routes(state.clone()))
        .nest_service("/tracking", tracking::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
