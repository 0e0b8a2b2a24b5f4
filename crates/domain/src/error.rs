use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Comment must be between 1 and 1000 characters (got {0})")]
    TextLength(usize),
    #[error("Rating must be an integer between 1 and 5 (got {0})")]
    RatingOutOfRange(i64),
    #[error("Nothing to update: provide a comment or a rating")]
    EmptyEdit,
}
