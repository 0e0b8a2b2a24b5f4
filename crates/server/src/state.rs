use axum::extract::FromRef;
use service::CommentService;

use crate::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub tokens: TokenVerifier,
    pub max_page_size: u32,
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
