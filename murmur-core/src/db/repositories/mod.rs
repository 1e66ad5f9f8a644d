mod follow_repository;
mod image_repository;
mod like_repository;
mod post_repository;

pub use follow_repository::FollowRepository;
pub use image_repository::ImageRepository;
pub use like_repository::LikeRepository;
pub use post_repository::PostRepository;

/// Build a `?, ?, ...` placeholder list for an `IN (...)` clause.
pub(crate) fn repeat_vars(count: usize) -> String {
    assert_ne!(count, 0);
    let mut s = "?,".repeat(count);
    s.pop();
    s
}
