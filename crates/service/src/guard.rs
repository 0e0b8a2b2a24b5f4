use domain::{Comment, UserId};

use crate::error::{Action, CommentError};

pub fn ensure_owner(
    comment: &Comment,
    caller: &UserId,
    action: Action,
) -> Result<(), CommentError> {
    if comment.is_owned_by(caller) {
        Ok(())
    } else {
        tracing::info!(
            "Rejected {} of comment {} by {} (owner {})",
            action,
            comment.id,
            caller,
            comment.user_id
        );
        Err(CommentError::Forbidden(action))
    }
}
