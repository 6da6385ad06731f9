mod comment;
mod follow_up;
mod view;

pub use comment::{Comment, NewComment};
pub use follow_up::{FollowUp, NewFollowUp};
pub use view::CommentView;
