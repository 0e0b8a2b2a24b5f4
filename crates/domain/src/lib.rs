mod aggregate;
mod commands;
mod error;
mod models;
mod page;

pub use aggregate::{RatingDistribution, RatingSummary};
pub use commands::{CreateComment, EditComment};
pub use error::ValidationError;
pub use models::{
    Comment, CommentId, CommentText, Rating, RecipeId, UserId, MAX_COMMENT_CHARS, MAX_RATING,
    MIN_RATING,
};
pub use page::{PageRequest, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
