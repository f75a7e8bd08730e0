use axum::{routing::on, Router};
use parking::database::Database;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

mod detections;
mod zones;

pub(crate) fn routes<D: Database + 'static>(state: WebState<D>) -> Router {
    Router::new()
        .nest_service("/parcari", zones::routes(state.clone()))
        .nest_service("/detections", detections::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
