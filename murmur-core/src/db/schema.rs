/// SQL schema for the murmur store
/// Creates all tables with proper constraints, foreign keys, and indexes.
///
/// Users are not stored here: profiles live in the external identity
/// service and rows reference them by opaque text id.
pub const SCHEMA: &str = r#"
-- Posts table. Comments are posts with is_comment = 1 and a parent
-- reference into this same table. The parent reference is not a
-- foreign key: a comment may outlive its parent, and the tree builder
-- drops rows whose parent no longer resolves. like_count/comment_count
-- are denormalized and maintained transactionally with the mutations
-- that change them.
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id TEXT NOT NULL,
    parent_post_id INTEGER,
    content TEXT NOT NULL,
    is_comment INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_posts_parent ON posts(parent_post_id);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);

-- Images table. Each image is owned by exactly one post and removed
-- with it.
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    storage_path TEXT NOT NULL,
    public_url TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_images_post ON images(post_id);

-- Likes table. One like per (user, post) pair.
CREATE TABLE IF NOT EXISTS likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    post_id INTEGER NOT NULL,
    UNIQUE (user_id, post_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_user ON likes(user_id);
CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id);

-- Follows table (directed edges). Duplicate edges and self-loops are
-- rejected at the schema level as well as at edge creation.
CREATE TABLE IF NOT EXISTS follows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    follower_id TEXT NOT NULL,
    following_id TEXT NOT NULL,
    UNIQUE (follower_id, following_id),
    CHECK (follower_id <> following_id)
);

CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id);
CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id);
"#;

/// Test data for development and testing
///
/// User ids refer to entries in the identity directory seeded by the
/// test fixtures. Counters are consistent with the like/comment rows
/// below; the seed-consistency test in `maintenance` relies on that.
pub const TEST_DATA: &str = r#"
-- ============================================================================
-- TOP-LEVEL POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, author_id, parent_post_id, content, is_comment, like_count, comment_count, created_at) VALUES
    (1, 'user_alice', NULL, 'First murmur! Trying out the new feed.', 0, 2, 2, '2026-01-10T10:00:00+00:00'),
    (2, 'user_bob',   NULL, 'Shipping a little terminal client for murmur.', 0, 1, 0, '2026-01-10T11:00:00+00:00'),
    (3, 'user_carol', NULL, 'Hot take: chronological feeds are underrated.', 0, 3, 1, '2026-01-11T09:30:00+00:00'),
    (4, 'user_dana',  NULL, 'Graph algorithms are everywhere once you look.', 0, 0, 0, '2026-01-12T08:15:00+00:00');

-- ============================================================================
-- COMMENTS (nested replies reference other comments)
-- ============================================================================
INSERT OR IGNORE INTO posts (id, author_id, parent_post_id, content, is_comment, like_count, comment_count, created_at) VALUES
    (5, 'user_bob',   1, 'Welcome aboard!', 1, 1, 1, '2026-01-10T10:05:00+00:00'),
    (6, 'user_carol', 1, 'Feed looks great already.', 1, 0, 0, '2026-01-10T10:10:00+00:00'),
    (7, 'user_alice', 5, 'Thanks!', 1, 0, 0, '2026-01-10T10:15:00+00:00'),
    (8, 'user_dana',  3, 'Strong agree.', 1, 0, 0, '2026-01-11T09:45:00+00:00');

-- ============================================================================
-- IMAGES
-- ============================================================================
INSERT OR IGNORE INTO images (id, post_id, storage_path, public_url) VALUES
    (1, 2, 'posts/2/c0ffee00-seed-terminal.png', 'https://cdn.murmur.dev/media/posts/2/c0ffee00-seed-terminal.png');

-- ============================================================================
-- LIKES (counts above must match these rows)
-- ============================================================================
INSERT OR IGNORE INTO likes (id, user_id, post_id) VALUES
    (1, 'user_bob',   1),
    (2, 'user_carol', 1),
    (3, 'user_alice', 2),
    (4, 'user_alice', 3),
    (5, 'user_bob',   3),
    (6, 'user_dana',  3),
    (7, 'user_alice', 5);

-- ============================================================================
-- SOCIAL CONNECTIONS (Follows)
-- ============================================================================
INSERT OR IGNORE INTO follows (id, follower_id, following_id) VALUES
    (1, 'user_alice', 'user_bob'),
    (2, 'user_alice', 'user_carol'),
    (3, 'user_bob',   'user_dana'),
    (4, 'user_carol', 'user_dana'),
    (5, 'user_carol', 'user_eli'),
    (6, 'user_dana',  'user_alice'),
    (7, 'user_eli',   'user_dana');
"#;
