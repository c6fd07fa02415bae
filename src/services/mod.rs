/// Business logic layer
pub mod accounts;
pub mod comments;
pub mod follow;
pub mod groups;
pub mod posts;

pub use accounts::{AccountService, NewAccount};
pub use comments::CommentService;
pub use follow::FollowService;
pub use groups::GroupService;
pub use posts::PostService;
