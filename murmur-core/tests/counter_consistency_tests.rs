//! Property test for the counter invariant: for any sequence of
//! like/unlike attempts, `like_count` equals the number of live like
//! rows at every observation point.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use murmur_core::{Database, EngagementService, Error, MemoryObjectStore};

const USERS: [&str; 3] = ["user_a", "user_b", "user_c"];

#[derive(Debug, Clone)]
enum Op {
    Like(usize),
    Unlike(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS.len()).prop_map(Op::Like),
        (0..USERS.len()).prop_map(Op::Unlike),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_like_count_equals_live_rows(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let db = Database::in_memory().expect("in-memory database");
        db.initialize().expect("schema");
        let service = EngagementService::new(db.pool.clone(), Arc::new(MemoryObjectStore::default()));

        let post = service.create_post("user_author", "counter fodder", &[]).expect("post");

        let mut model: HashSet<usize> = HashSet::new();
        for op in &ops {
            match op {
                Op::Like(user) => match service.like(USERS[*user], post.id) {
                    Ok(()) => {
                        prop_assert!(model.insert(*user), "like succeeded but model already had it");
                    }
                    Err(Error::Conflict(_)) => {
                        prop_assert!(model.contains(user), "conflict reported but model had no like");
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
                },
                Op::Unlike(user) => match service.unlike(USERS[*user], post.id) {
                    Ok(()) => {
                        prop_assert!(model.remove(user), "unlike succeeded but model had no like");
                    }
                    Err(Error::NotFound(_)) => {
                        prop_assert!(!model.contains(user), "not-found reported but model had a like");
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
                },
            }

            // Invariant holds at every observation point, not just at the end.
            let conn = db.connection().expect("connection");
            let counter: i64 = conn
                .query_row("SELECT like_count FROM posts WHERE id = ?", [post.id], |r| r.get(0))
                .expect("counter");
            let rows: i64 = conn
                .query_row("SELECT COUNT(*) FROM likes WHERE post_id = ?", [post.id], |r| r.get(0))
                .expect("rows");
            prop_assert_eq!(counter, rows);
            prop_assert_eq!(counter, model.len() as i64);
        }
    }
}
