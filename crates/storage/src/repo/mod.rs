mod comments;
mod recipes;
mod users;
