//! Fuzz-style corpus exercising spec §8 property 1 ("safety soundness"):
//! for every text/dialect pair here, `validate` must either reject it or
//! hand back a statement that provably cannot mutate anything. Each case
//! is a distinct obfuscation trick the spec calls out by name.

use gateway_db_common::Dialect;
use gateway_sql_safety::{validate, SafetyError, SafetyPolicy};

fn default_policy() -> SafetyPolicy {
    SafetyPolicy::new(
        false,
        vec![
            "pg_sleep".to_owned(),
            "sleep".to_owned(),
            "benchmark".to_owned(),
            "pg_read_file".to_owned(),
            "load_file".to_owned(),
            "lo_import".to_owned(),
            "lo_export".to_owned(),
            "dblink".to_owned(),
            "xp_cmdshell".to_owned(),
        ],
        Vec::new(),
        100,
    )
}

/// `(label, sql, dialect)`. Every one of these must fail to validate.
fn rejected_corpus() -> Vec<(&'static str, &'static str, Dialect)> {
    vec![
        ("stacked statements", "SELECT 1; DROP TABLE users", Dialect::Postgres),
        (
            "stacked statements, trailing whitespace/comment",
            "SELECT 1; DROP TABLE users -- cleanup   \n",
            Dialect::Postgres,
        ),
        ("select into writes a table", "SELECT * INTO backup FROM users", Dialect::Postgres),
        ("select for update takes row locks", "SELECT * FROM users FOR UPDATE", Dialect::Postgres),
        ("select for share takes row locks", "SELECT * FROM users FOR SHARE", Dialect::Postgres),
        (
            "cte wrapping a dml statement",
            "WITH deleted AS (DELETE FROM users RETURNING id) SELECT * FROM deleted",
            Dialect::Postgres,
        ),
        (
            "blocked function nested three subqueries deep",
            "SELECT * FROM t WHERE id IN (SELECT id FROM t2 WHERE x IN (SELECT pg_sleep(5)::int))",
            Dialect::Postgres,
        ),
        (
            "comment-wrapped keyword does not hide a drop",
            "/* harmless */ DROP /* still a drop */ TABLE users",
            Dialect::Postgres,
        ),
        ("bare delete", "DELETE FROM posts WHERE id = 1", Dialect::Postgres),
        ("bare update", "UPDATE posts SET title = 'x'", Dialect::Postgres),
        ("bare insert", "INSERT INTO posts (title) VALUES ('x')", Dialect::Postgres),
        ("truncate", "TRUNCATE TABLE posts", Dialect::Postgres),
        ("alter table", "ALTER TABLE posts ADD COLUMN x int", Dialect::Postgres),
        ("create table", "CREATE TABLE evil (id int)", Dialect::Postgres),
        ("grant", "GRANT ALL ON users TO PUBLIC", Dialect::Postgres),
        ("begin transaction", "BEGIN", Dialect::Postgres),
        ("call a stored procedure", "CALL do_something()", Dialect::Postgres),
        ("set a server variable", "SET search_path = public", Dialect::Postgres),
        ("copy to program", "COPY users TO PROGRAM 'cat'", Dialect::Postgres),
        (
            "mysql benchmark function",
            "SELECT BENCHMARK(1000000, MD5('x'))",
            Dialect::Mysql,
        ),
        (
            "mysql load_file reads the filesystem",
            "SELECT LOAD_FILE('/etc/passwd')",
            Dialect::Mysql,
        ),
        ("mysql load data", "LOAD DATA INFILE '/tmp/x.csv' INTO TABLE t", Dialect::Mysql),
        ("mysql do statement", "DO SLEEP(5)", Dialect::Mysql),
        (
            "quoted identifier does not hide a write",
            "INSERT INTO \"users\" (\"id\") VALUES (1)",
            Dialect::Postgres,
        ),
    ]
}

#[test]
fn every_obfuscation_in_the_corpus_is_rejected() {
    let policy = default_policy();
    let mut failures = Vec::new();
    for (label, sql, dialect) in rejected_corpus() {
        if validate(sql, dialect, &policy).is_ok() {
            failures.push(label);
        }
    }
    assert!(
        failures.is_empty(),
        "expected these to be rejected but validate() accepted them: {failures:?}"
    );
}

#[test]
fn row_locking_is_reported_distinctly_from_plain_mutation() {
    let policy = default_policy();
    let err = validate("SELECT * FROM users FOR UPDATE", Dialect::Postgres, &policy).unwrap_err();
    assert!(matches!(err, SafetyError::RowLocking(_)));
}

#[test]
fn stacked_statements_with_trailing_comment_report_the_right_count() {
    let policy = default_policy();
    let err = validate("SELECT 1; SELECT 2 -- trailing\n", Dialect::Postgres, &policy).unwrap_err();
    assert!(matches!(err, SafetyError::MultipleStatements(2)));
}

/// A sanity check that the corpus isn't accidentally rejecting everything:
/// an ordinary read stays accepted for both dialects.
#[test]
fn plain_reads_still_validate_for_both_dialects() {
    let policy = default_policy();
    validate("SELECT id, name FROM users WHERE id = 1", Dialect::Postgres, &policy).unwrap();
    validate("SELECT id, name FROM users WHERE id = 1", Dialect::Mysql, &policy).unwrap();
}
