use super::Comment;

/// Comment with the author's display name resolved
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author_name: String,
}
