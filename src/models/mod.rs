/// Typed database rows
pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::CommentWithAuthor;
pub use follow::Follow;
pub use group::Group;
pub use post::{Post, PostWithMeta};
pub use user::User;
