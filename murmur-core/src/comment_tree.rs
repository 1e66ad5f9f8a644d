use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use murmur_types::{CommentNode, Image, Post, Profile};

use crate::db::repositories::{ImageRepository, PostRepository};
use crate::db::DbPool;
use crate::error::Result;
use crate::identity::IdentityProvider;

/// Builds the nested reply forest for a post's discussion.
///
/// All comment rows are fetched in one pass and indexed parent ->
/// children, so assembly is a single O(n) walk. Each node is consumed
/// at most once, which both prevents duplication and guarantees
/// termination on malformed input containing a parent cycle.
pub struct CommentTreeBuilder {
    posts: PostRepository,
    images: ImageRepository,
    identity: Arc<dyn IdentityProvider>,
}

struct Arena {
    posts: HashMap<i64, Post>,
    children: HashMap<i64, Vec<i64>>,
    images: HashMap<i64, Vec<Image>>,
    profiles: HashMap<String, Profile>,
}

impl CommentTreeBuilder {
    pub fn new(pool: DbPool, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            posts: PostRepository::new(pool.clone()),
            images: ImageRepository::new(pool),
            identity,
        }
    }

    /// Build the reply forest rooted at `root_post_id`. Replies keep
    /// their fetch order at every level. Comments whose parent resolves
    /// to neither the root nor another fetched comment are dropped.
    pub fn build(&self, root_post_id: i64) -> Result<Vec<CommentNode>> {
        let comments = self.posts.all_comments()?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let comment_ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        let images = self.images.for_posts(&comment_ids)?;

        let mut author_ids: Vec<String> = Vec::new();
        for comment in &comments {
            if !author_ids.contains(&comment.author_id) {
                author_ids.push(comment.author_id.clone());
            }
        }
        let resolved = self.identity.get_users(&author_ids)?;
        let mut profiles: HashMap<String, Profile> =
            resolved.into_iter().map(|p| (p.id.clone(), p)).collect();
        for author_id in &author_ids {
            if !profiles.contains_key(author_id) {
                tracing::warn!(
                    author_id = %author_id,
                    "comment author unknown to identity service, using placeholder"
                );
                profiles.insert(author_id.clone(), Profile::placeholder(author_id));
            }
        }

        // parent -> ordered children; built in fetch order
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        let known: HashSet<i64> = comment_ids.iter().copied().collect();
        for comment in &comments {
            match comment.parent_post_id {
                Some(parent) if parent == root_post_id || known.contains(&parent) => {
                    children.entry(parent).or_default().push(comment.id);
                }
                // Orphaned or parentless comment rows are dropped.
                _ => {}
            }
        }

        let mut arena = Arena {
            posts: comments.into_iter().map(|c| (c.id, c)).collect(),
            children,
            images,
            profiles,
        };

        let roots = arena.children.remove(&root_post_id).unwrap_or_default();
        Ok(roots
            .into_iter()
            .filter_map(|id| assemble(id, &mut arena))
            .collect())
    }
}

/// Consume one comment from the arena and assemble its subtree.
/// Returns `None` if the node was already consumed (a cycle or a
/// duplicate reference), which bounds the recursion.
fn assemble(id: i64, arena: &mut Arena) -> Option<CommentNode> {
    let post = arena.posts.remove(&id)?;
    let author = arena
        .profiles
        .get(&post.author_id)
        .cloned()
        .unwrap_or_else(|| Profile::placeholder(&post.author_id));
    let images = arena.images.remove(&id).unwrap_or_default();
    let child_ids = arena.children.remove(&id).unwrap_or_default();
    let replies = child_ids
        .into_iter()
        .filter_map(|child| assemble(child, arena))
        .collect();

    Some(CommentNode {
        post,
        author,
        images,
        replies,
    })
}
