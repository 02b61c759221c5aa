//! The built-in scenario library. Each scenario opens with the same staged
//! prologue (four writes with a savepoint after each of the first three) and
//! differs only in what it does to the savepoints afterwards, so surviving
//! rows read directly as "which writes outlived the epilogue".

use crate::{Scenario, ScriptOp, target};

pub const COMMIT_ONLY: &str = "commit-only";
pub const ROLLBACK_TO_MIDDLE: &str = "rollback-to-middle";
pub const ROLLBACK_THEN_EARLIER: &str = "rollback-then-earlier";
pub const ROLLBACK_THEN_LATER: &str = "rollback-then-later";
pub const ROLLBACK_TWICE_SAME: &str = "rollback-twice-same";
pub const ROLLBACK_ALL_THEN_SAVEPOINT: &str = "rollback-all-then-savepoint";
pub const RELEASE_THEN_EARLIER: &str = "release-then-earlier";
pub const RELEASE_THEN_LATER: &str = "release-then-later";
pub const RELEASE_THEN_SAME: &str = "release-then-same";

/// All four writes survive; the baseline every other scenario is read
/// against.
#[must_use]
pub fn commit_only() -> Scenario {
    Scenario::new(COMMIT_ONLY, staged_prologue())
}

/// Rolling back to the middle savepoint discards the writes after it.
#[must_use]
pub fn rollback_to_middle() -> Scenario {
    with_epilogue(ROLLBACK_TO_MIDDLE, vec![rollback_to("s2")])
}

/// After rolling back to s2, an earlier savepoint is still valid.
#[must_use]
pub fn rollback_then_earlier() -> Scenario {
    with_epilogue(
        ROLLBACK_THEN_EARLIER,
        vec![rollback_to("s2"), rollback_to("s1")],
    )
}

/// After rolling back to s2, the later savepoint s3 is gone and rolling back
/// to it must fail.
#[must_use]
pub fn rollback_then_later() -> Scenario {
    with_epilogue(
        ROLLBACK_THEN_LATER,
        vec![rollback_to("s2"), rollback_to("s3")],
    )
}

/// A savepoint survives its own rollback and can be rolled back to again.
#[must_use]
pub fn rollback_twice_same() -> Scenario {
    with_epilogue(
        ROLLBACK_TWICE_SAME,
        vec![rollback_to("s2"), rollback_to("s2")],
    )
}

/// A bare ROLLBACK ends the transaction; the savepoints die with it.
#[must_use]
pub fn rollback_all_then_savepoint() -> Scenario {
    with_epilogue(
        ROLLBACK_ALL_THEN_SAVEPOINT,
        vec![ScriptOp::RollbackAll, rollback_to("s2")],
    )
}

/// Releasing s2 leaves the earlier savepoint s1 intact on every engine.
#[must_use]
pub fn release_then_earlier() -> Scenario {
    with_epilogue(RELEASE_THEN_EARLIER, vec![release("s2"), rollback_to("s1")])
}

/// Whether s3 survives the release of s2 is engine behavior; SQLite and
/// PostgreSQL destroy later savepoints together with the released one.
#[must_use]
pub fn release_then_later() -> Scenario {
    with_epilogue(RELEASE_THEN_LATER, vec![release("s2"), rollback_to("s3")])
}

/// Rolling back to a savepoint after releasing it; fails wherever the server
/// actually executes the RELEASE.
#[must_use]
pub fn release_then_same() -> Scenario {
    with_epilogue(RELEASE_THEN_SAME, vec![release("s2"), rollback_to("s2")])
}

#[must_use]
pub fn all() -> Vec<Scenario> {
    vec![
        commit_only(),
        rollback_to_middle(),
        rollback_then_earlier(),
        rollback_then_later(),
        rollback_twice_same(),
        rollback_all_then_savepoint(),
        release_then_earlier(),
        release_then_later(),
        release_then_same(),
    ]
}

#[must_use]
pub fn by_name(name: &str) -> Option<Scenario> {
    all().into_iter().find(|scenario| scenario.name == name)
}

fn with_epilogue(name: &str, epilogue: Vec<ScriptOp>) -> Scenario {
    let mut script = staged_prologue();
    script.extend(epilogue);
    Scenario::new(name, script)
}

fn staged_prologue() -> Vec<ScriptOp> {
    vec![
        write(1),
        savepoint("s1"),
        write(2),
        savepoint("s2"),
        write(3),
        savepoint("s3"),
        write(4),
    ]
}

fn write(ordinal: usize) -> ScriptOp {
    ScriptOp::Write(target::insert_customer_sql(
        &format!("Matt{ordinal}"),
        &format!("matt{ordinal}@example.com"),
    ))
}

fn savepoint(name: &str) -> ScriptOp {
    ScriptOp::Savepoint(name.to_string())
}

fn rollback_to(name: &str) -> ScriptOp {
    ScriptOp::RollbackTo(name.to_string())
}

fn release(name: &str) -> ScriptOp {
    ScriptOp::Release(name.to_string())
}
