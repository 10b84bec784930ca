mod index;
mod page;

use axum::{routing::{delete, get}, Router};

use crate::AppState;

pub use index::{AvailabilityIndex, Freetime};
pub(crate) use page::parse_time;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(page::search))
        .route(
            "/profiles/self/frees",
            get(page::own_frees)
                .post(page::create_frees)
                .put(page::update_free)
                .delete(page::remove_all_frees),
        )
        .route("/profiles/self/frees/{start}", delete(page::remove_free))
        .route("/profiles/{id}/frees", get(page::frees))
}
