//! Property tests for classification and admission.
//!
//! Deterministic cases pin the documented rules; the randomized cases throw
//! generated statements at the classifier and check that admission stays
//! monotone in the write flags.

use legacy_mysql_mcp::tools::{
    AccessPolicy, CompatibilityPolicy, Decision, DenialReason, classify, decide,
};
use rand::Rng;
use rand::seq::SliceRandom;

/// Every combination of the three write flags.
fn all_policies() -> Vec<AccessPolicy> {
    let mut policies = Vec::new();
    for bits in 0..8u8 {
        policies.push(AccessPolicy {
            allow_insert: bits & 1 != 0,
            allow_update: bits & 2 != 0,
            allow_delete: bits & 4 != 0,
            compatibility: CompatibilityPolicy::Warn,
        });
    }
    policies
}

/// `a` permits everything `b` permits.
fn covers(a: &AccessPolicy, b: &AccessPolicy) -> bool {
    (a.allow_insert || !b.allow_insert)
        && (a.allow_update || !b.allow_update)
        && (a.allow_delete || !b.allow_delete)
}

fn admit(sql: &str, policy: &AccessPolicy) -> Decision {
    decide(&classify(sql), policy)
}

#[test]
fn test_reads_are_allowed_under_every_policy() {
    let reads = [
        "SELECT * FROM orders WHERE id = 1",
        "select name from customers",
        "SHOW TABLES",
        "SHOW COLUMNS FROM orders",
        "DESCRIBE orders",
        "DESC orders",
        "EXPLAIN SELECT * FROM orders",
        "SELECT 1;",
        "  -- leading comment\n SELECT 1",
        "/* block */ SELECT 1",
        "(SELECT 1) UNION (SELECT 2)",
    ];
    for policy in all_policies() {
        for sql in reads {
            assert!(admit(sql, &policy).is_allowed(), "{sql} under {policy:?}");
        }
    }
}

#[test]
fn test_writes_follow_their_own_flag() {
    let cases = [
        ("INSERT INTO t VALUES (1)", "MYSQL_ALLOW_INSERT"),
        ("UPDATE t SET a = 1 WHERE id = 2", "MYSQL_ALLOW_UPDATE"),
        ("DELETE FROM t WHERE id = 2", "MYSQL_ALLOW_DELETE"),
    ];
    for policy in all_policies() {
        for (sql, setting) in cases {
            let enabled = match setting {
                "MYSQL_ALLOW_INSERT" => policy.allow_insert,
                "MYSQL_ALLOW_UPDATE" => policy.allow_update,
                _ => policy.allow_delete,
            };
            let decision = admit(sql, &policy);
            assert_eq!(decision.is_allowed(), enabled, "{sql} under {policy:?}");
            if !enabled {
                assert!(matches!(
                    decision.reason(),
                    Some(DenialReason::WriteNotPermitted { setting: s, .. }) if *s == setting
                ));
            }
        }
    }
}

#[test]
fn test_drop_anywhere_is_denied() {
    let queries = [
        "SELECT 1; DROP TABLE t",
        "DROP TABLE t",
        "drop table t",
        "SELECT * FROM t WHERE id IN (SELECT id FROM u) OR 1 = 1 DROP",
        "SELECT 1 /*!50000 DROP TABLE t */",
        "INSERT INTO t SELECT * FROM u; DROP TABLE u",
    ];
    for policy in all_policies() {
        for sql in queries {
            assert!(!admit(sql, &policy).is_allowed(), "{sql} under {policy:?}");
        }
    }
}

#[test]
fn test_statement_separator_boundaries() {
    let policy = AccessPolicy::read_only();
    assert!(admit("SELECT 1;", &policy).is_allowed());
    assert!(admit("SELECT 1 ;  ", &policy).is_allowed());
    for sql in [
        "SELECT 1; SELECT 2",
        "SELECT 1;;",
        "; SELECT 1",
        "SELECT 1; -- x\nSELECT 2",
    ] {
        assert_eq!(
            admit(sql, &policy).reason(),
            Some(&DenialReason::MultipleStatements),
            "{sql}"
        );
    }
}

#[test]
fn test_window_function_warning_does_not_block() {
    let decision = admit(
        "SELECT ROW_NUMBER() OVER (ORDER BY id) FROM t",
        &AccessPolicy::read_only(),
    );
    match decision {
        Decision::Allow { warnings } => {
            assert!(!warnings.is_empty());
            assert!(
                warnings
                    .iter()
                    .all(|w| w.feature.as_str() == "window functions")
            );
        }
        Decision::Deny(reason) => panic!("unexpected denial: {reason}"),
    }
}

#[test]
fn test_classification_ignores_configuration() {
    let sql = "UPDATE t SET a = 1";
    let verdict = classify(sql);
    for _ in 0..3 {
        assert_eq!(classify(sql), verdict);
    }
}

// =========================================================================
// Randomized
// =========================================================================

const TOKENS: &[&str] = &[
    "SELECT", "select", "INSERT", "UPDATE", "DELETE", "SHOW", "DESCRIBE", "EXPLAIN", "FROM",
    "WHERE", "INTO", "VALUES", "SET", "DROP", "CREATE", "REPLACE", "CALL", "BEGIN", "t", "users",
    "id", "=", "1", "'x'", "'a;b'", "\"q\"", "`col`", ";", "(", ")", ",", "*", "--", "-- ", "#",
    "/*", "*/", "/*!", "\n", "\t", "OVER", "ROW_NUMBER()", "JSON_EXTRACT(", "->", "é", "\0",
];

fn random_statement(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(0..24);
    let mut parts = Vec::with_capacity(len);
    for _ in 0..len {
        if let Some(token) = TOKENS.choose(rng) {
            parts.push(*token);
        }
    }
    parts.join(" ")
}

#[test]
fn fuzz_classifier_never_panics() {
    let mut rng = rand::thread_rng();
    for _ in 0..5_000 {
        let sql = random_statement(&mut rng);
        let verdict = classify(&sql);
        assert_eq!(classify(&sql), verdict, "classification is deterministic");
    }
}

#[test]
fn fuzz_admission_is_monotone_in_write_flags() {
    let mut rng = rand::thread_rng();
    let policies = all_policies();

    for _ in 0..2_000 {
        let sql = random_statement(&mut rng);
        let verdict = classify(&sql);
        for stricter in &policies {
            if !decide(&verdict, stricter).is_allowed() {
                continue;
            }
            for looser in policies.iter().filter(|p| covers(p, stricter)) {
                assert!(
                    decide(&verdict, looser).is_allowed(),
                    "{sql:?} allowed under {stricter:?} but not {looser:?}"
                );
            }
        }
    }
}

#[test]
fn fuzz_disallowed_keyword_is_never_admitted() {
    let mut rng = rand::thread_rng();
    let policy = AccessPolicy::all_writes();

    for _ in 0..2_000 {
        let tail = random_statement(&mut rng);
        let keyword = ["DROP", "TRUNCATE", "GRANT", "LOCK"]
            .choose(&mut rng)
            .copied()
            .unwrap_or("DROP");
        let sql = format!("{keyword} {tail}");
        assert!(!admit(&sql, &policy).is_allowed(), "{sql:?}");
    }
}
