use std::collections::HashSet;

use gateway_db_common::Dialect as GatewayDialect;
use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, Ident, Join, JoinConstraint,
    ObjectName, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins, Value,
};
use sqlparser::dialect::{Dialect as ParserDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use crate::error::SafetyError;
use crate::policy::SafetyPolicy;

/// A coarse, best-effort cost hint derived from the shape of the validated
/// query (number of joins/subqueries encountered during the walk). Never
/// blocks validation; purely advisory, same spirit as `Confidence` (spec §3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CostClass {
    Trivial,
    Moderate,
    Expensive,
}

/// The output of a successful `validate` call (spec §3). The only way to
/// construct one is to pass every check in [`validate`]; nothing else in
/// this crate can build a `ValidatedSQL`, so its existence is itself the
/// capability-style witness spec §3 describes — `gateway-executor` accepts
/// nothing else.
#[derive(Clone, Debug)]
pub struct ValidatedSQL {
    text: String,
    dialect: GatewayDialect,
    pub row_limit_applied: bool,
    pub estimated_cost_class: Option<CostClass>,
}

impl ValidatedSQL {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> GatewayDialect {
        self.dialect
    }
}

fn parser_dialect(dialect: GatewayDialect) -> Box<dyn ParserDialect> {
    match dialect {
        GatewayDialect::Postgres => Box::new(PostgreSqlDialect {}),
        GatewayDialect::Mysql => Box::new(MySqlDialect {}),
    }
}

/// Runs the full spec §4.3 procedure: parse, single-statement check,
/// read-only verdict, function blacklist walk, identifier allowlist walk,
/// row-cap injection, and reserialization. The text that comes back out is
/// the *reserialized* AST, never the caller's original string (spec §4.3
/// step 7) — this is what keeps a syntactically-valid-but-semantically-sly
/// rewrite (e.g. a blacklisted function hidden behind whitespace tricks
/// the parser itself normalizes away) from reaching the executor verbatim.
pub fn validate(
    text: &str,
    dialect: GatewayDialect,
    policy: &SafetyPolicy,
) -> Result<ValidatedSQL, SafetyError> {
    let dialect_impl = parser_dialect(dialect);
    let mut statements =
        Parser::parse_sql(&*dialect_impl, text).map_err(|e| SafetyError::Parse(e.to_string()))?;

    if statements.is_empty() {
        return Err(SafetyError::EmptyStatement);
    }
    if statements.len() > 1 {
        return Err(SafetyError::MultipleStatements(statements.len()));
    }

    let mut statement = statements.remove(0);

    match &mut statement {
        Statement::Query(query) => {
            let mut walker = Walker::new(dialect, policy);
            walker.query(query)?;
            let row_limit_applied = apply_row_cap(query, policy.max_rows);
            Ok(ValidatedSQL {
                text: statement.to_string(),
                dialect,
                row_limit_applied,
                estimated_cost_class: Some(walker.cost_class()),
            })
        }
        Statement::Explain {
            statement: inner,
            analyze: _,
            ..
        } => {
            if !policy.allow_explain {
                return Err(SafetyError::NotReadOnly);
            }
            match inner.as_mut() {
                Statement::Query(query) => {
                    let mut walker = Walker::new(dialect, policy);
                    walker.query(query)?;
                    let row_limit_applied = apply_row_cap(query, policy.max_rows);
                    Ok(ValidatedSQL {
                        text: statement.to_string(),
                        dialect,
                        row_limit_applied,
                        estimated_cost_class: Some(walker.cost_class()),
                    })
                }
                _ => Err(SafetyError::NotReadOnly),
            }
        }
        // A bare `SHOW <setting>` (spec §4.3 step 3's third allowed kind).
        // Nothing to rewrite or walk: it reads server-side configuration,
        // never user data.
        Statement::ShowVariable { .. } => Ok(ValidatedSQL {
            text: statement.to_string(),
            dialect,
            row_limit_applied: false,
            estimated_cost_class: Some(CostClass::Trivial),
        }),
        // Every other statement kind (INSERT/UPDATE/DELETE/MERGE, DDL,
        // GRANT/REVOKE, BEGIN/COMMIT/ROLLBACK, CALL, DO, SET, LOCK, COPY,
        // LOAD, ...) is rejected by construction here: we only special-case
        // the handful of shapes spec §4.3 step 3 allows, so nothing else
        // needs to be named explicitly.
        _ => Err(SafetyError::NotReadOnly),
    }
}

/// Walks a `Query`'s AST collecting function-call and relation references,
/// checking each against `policy` as it goes. Stateful per top-level
/// `validate` call only (spec §4.3 "stateless per call" refers to the
/// public API, not this internal helper's lifetime).
struct Walker<'a> {
    dialect: GatewayDialect,
    policy: &'a SafetyPolicy,
    /// Aliases introduced by `WITH ... AS (...)`. Referencing one of these
    /// in a later `FROM` clause is not a "relation" for allowlist purposes;
    /// the allowlist constrains real tables, not a query's own CTEs.
    defined_ctes: HashSet<String>,
    joins_seen: u32,
    subqueries_seen: u32,
}

impl<'a> Walker<'a> {
    fn new(dialect: GatewayDialect, policy: &'a SafetyPolicy) -> Self {
        Self {
            dialect,
            policy,
            defined_ctes: HashSet::new(),
            joins_seen: 0,
            subqueries_seen: 0,
        }
    }

    fn cost_class(&self) -> CostClass {
        match self.joins_seen + self.subqueries_seen {
            0 => CostClass::Trivial,
            1..=2 => CostClass::Moderate,
            _ => CostClass::Expensive,
        }
    }

    fn fold(&self, ident: &Ident) -> String {
        match (self.dialect, ident.quote_style) {
            (GatewayDialect::Postgres, None) => ident.value.to_lowercase(),
            _ => ident.value.clone(),
        }
    }

    fn object_name(&self, name: &ObjectName) -> String {
        name.0
            .iter()
            .map(|part| self.fold(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn query(&mut self, query: &Query) -> Result<(), SafetyError> {
        // `SELECT ... FOR UPDATE`/`FOR SHARE` takes row locks: not
        // read-only regardless of what the statement otherwise selects
        // (spec §4.3 tie-break: "Reject SELECT FOR UPDATE/SHARE").
        if !query.locks.is_empty() {
            return Err(SafetyError::RowLocking(
                query
                    .locks
                    .iter()
                    .map(|l| format!("{:?}", l.lock_type))
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }

        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.defined_ctes.insert(self.fold(&cte.alias.name));
            }
            for cte in &with.cte_tables {
                self.subqueries_seen += 1;
                self.query(&cte.query)?;
            }
        }

        self.set_expr(&query.body)?;

        for order_by in &query.order_by {
            self.expr(&order_by.expr)?;
        }
        if let Some(limit) = &query.limit {
            self.expr(limit)?;
        }
        if let Some(offset) = &query.offset {
            self.expr(&offset.value)?;
        }

        Ok(())
    }

    fn set_expr(&mut self, set_expr: &SetExpr) -> Result<(), SafetyError> {
        match set_expr {
            SetExpr::Select(select) => self.select(select),
            SetExpr::Query(query) => {
                self.subqueries_seen += 1;
                self.query(query)
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(left)?;
                self.set_expr(right)
            }
            SetExpr::Values(values) => {
                for row in &values.rows {
                    for expr in row {
                        self.expr(expr)?;
                    }
                }
                Ok(())
            }
            // `INSERT ... SELECT` / `UPDATE ... FROM` bodies can't appear
            // under a top-level `Statement::Query`, which is the only
            // entry point into this walker (spec §4.3 step 3 already
            // rejected any statement kind that could produce these).
            _ => Ok(()),
        }
    }

    fn select(&mut self, select: &Select) -> Result<(), SafetyError> {
        if select.into.is_some() {
            // `SELECT ... INTO new_table` writes a new relation: not
            // read-only even though it parses as a `Query` (spec §4.3
            // tie-break).
            return Err(SafetyError::NotReadOnly);
        }

        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    self.expr(expr)?;
                }
                SelectItem::QualifiedWildcard(..) | SelectItem::Wildcard(..) => {}
            }
        }

        for twj in &select.from {
            self.table_with_joins(twj)?;
        }

        if let Some(selection) = &select.selection {
            self.expr(selection)?;
        }
        if let Some(having) = &select.having {
            self.expr(having)?;
        }
        if let Some(qualify) = &select.qualify {
            self.expr(qualify)?;
        }
        for expr in select
            .cluster_by
            .iter()
            .chain(select.distribute_by.iter())
            .chain(select.sort_by.iter())
        {
            self.expr(expr)?;
        }

        Ok(())
    }

    fn table_with_joins(&mut self, twj: &TableWithJoins) -> Result<(), SafetyError> {
        self.table_factor(&twj.relation)?;
        for join in &twj.joins {
            self.joins_seen += 1;
            self.join(join)?;
        }
        Ok(())
    }

    fn join(&mut self, join: &Join) -> Result<(), SafetyError> {
        self.table_factor(&join.relation)?;
        self.join_constraint(&join.join_operator)
    }

    fn join_constraint(
        &mut self,
        op: &sqlparser::ast::JoinOperator,
    ) -> Result<(), SafetyError> {
        use sqlparser::ast::JoinOperator::*;
        let constraint = match op {
            Inner(c) | LeftOuter(c) | RightOuter(c) | FullOuter(c) => Some(c),
            _ => None,
        };
        if let Some(JoinConstraint::On(expr)) = constraint {
            self.expr(expr)?;
        }
        Ok(())
    }

    fn table_factor(&mut self, factor: &TableFactor) -> Result<(), SafetyError> {
        match factor {
            TableFactor::Table { name, args, .. } => {
                if args.is_some() {
                    // A table-valued function call in `FROM`, e.g.
                    // `SELECT * FROM pg_sleep(100)`: `name` is a function,
                    // not a relation, and must clear the same blacklist an
                    // ordinary `Expr::Function` call would (spec §4.3 step
                    // 4's "any invocation" is not limited to scalar
                    // position).
                    let fname = self.object_name(name);
                    if self.policy.is_function_blocked(&fname) {
                        return Err(SafetyError::BlockedFunction(fname));
                    }
                } else {
                    let rname = self.object_name(name);
                    let bare = name
                        .0
                        .last()
                        .map(|i| self.fold(i))
                        .unwrap_or_else(|| rname.clone());
                    if !self.defined_ctes.contains(&bare) && !self.policy.is_relation_allowed(&rname)
                    {
                        return Err(SafetyError::DisallowedRelation(rname));
                    }
                }
                Ok(())
            }
            TableFactor::Derived { subquery, .. } => {
                self.subqueries_seen += 1;
                self.query(subquery)
            }
            TableFactor::TableFunction { expr, .. } => self.expr(expr),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.table_with_joins(table_with_joins),
            _ => Ok(()),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), SafetyError> {
        match expr {
            Expr::Identifier(_)
            | Expr::CompoundIdentifier(_)
            | Expr::Value(_)
            | Expr::Wildcard
            | Expr::QualifiedWildcard(_)
            | Expr::TypedString { .. } => Ok(()),

            Expr::BinaryOp { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::UnaryOp { expr, .. }
            | Expr::Nested(expr)
            | Expr::Cast { expr, .. }
            | Expr::TryCast { expr, .. }
            | Expr::SafeCast { expr, .. }
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::IsUnknown(expr)
            | Expr::IsNotUnknown(expr)
            | Expr::Collate { expr, .. }
            | Expr::Extract { expr, .. } => self.expr(expr),

            Expr::IsDistinctFrom(a, b) | Expr::IsNotDistinctFrom(a, b) => {
                self.expr(a)?;
                self.expr(b)
            }

            Expr::InList { expr, list, .. } => {
                self.expr(expr)?;
                for item in list {
                    self.expr(item)?;
                }
                Ok(())
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.expr(expr)?;
                self.subqueries_seen += 1;
                self.query(subquery)
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.expr(expr)?;
                self.expr(low)?;
                self.expr(high)
            }
            Expr::Like {
                expr, pattern, ..
            }
            | Expr::ILike {
                expr, pattern, ..
            }
            | Expr::SimilarTo {
                expr, pattern, ..
            } => {
                self.expr(expr)?;
                self.expr(pattern)
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                if let Some(op) = operand {
                    self.expr(op)?;
                }
                for c in conditions {
                    self.expr(c)?;
                }
                for r in results {
                    self.expr(r)?;
                }
                if let Some(e) = else_result {
                    self.expr(e)?;
                }
                Ok(())
            }
            Expr::Subquery(query) => {
                self.subqueries_seen += 1;
                self.query(query)
            }
            Expr::Exists { subquery, .. } => {
                self.subqueries_seen += 1;
                self.query(subquery)
            }
            Expr::Tuple(exprs) | Expr::Array(sqlparser::ast::Array { elem: exprs, .. }) => {
                for e in exprs {
                    self.expr(e)?;
                }
                Ok(())
            }
            Expr::Position { expr, r#in } => {
                self.expr(expr)?;
                self.expr(r#in)
            }
            Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                self.expr(expr)?;
                if let Some(f) = substring_from {
                    self.expr(f)?;
                }
                if let Some(f) = substring_for {
                    self.expr(f)?;
                }
                Ok(())
            }
            Expr::Trim {
                expr, trim_what, ..
            } => {
                self.expr(expr)?;
                if let Some(w) = trim_what {
                    self.expr(w)?;
                }
                Ok(())
            }
            Expr::Overlay {
                expr,
                overlay_what,
                overlay_from,
                overlay_for,
            } => {
                self.expr(expr)?;
                self.expr(overlay_what)?;
                self.expr(overlay_from)?;
                if let Some(f) = overlay_for {
                    self.expr(f)?;
                }
                Ok(())
            }
            Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::Function(func) => self.function(func),

            // Anything else (JSON/map access, window-only constructs,
            // interval literals, ...) is left unwalked: a documented,
            // best-effort limit consistent with spec §4.3's own
            // "validator is syntactic, not semantic" tie-break note. A
            // blacklisted call can only hide here inside an already-odd
            // expression shape, not a plain predicate or projection.
            _ => Ok(()),
        }
    }

    fn function(&mut self, func: &Function) -> Result<(), SafetyError> {
        let name = self.object_name(&func.name);
        if self.policy.is_function_blocked(&name) {
            return Err(SafetyError::BlockedFunction(name));
        }
        match &func.args {
            FunctionArguments::None => {}
            FunctionArguments::Subquery(query) => {
                self.subqueries_seen += 1;
                self.query(query)?;
            }
            FunctionArguments::List(list) => {
                for arg in &list.args {
                    self.function_arg(arg)?;
                }
            }
        }
        Ok(())
    }

    fn function_arg(&mut self, arg: &FunctionArg) -> Result<(), SafetyError> {
        let expr = match arg {
            FunctionArg::Named { arg, .. } | FunctionArg::Unnamed(arg) => arg,
        };
        match expr {
            FunctionArgExpr::Expr(e) => self.expr(e),
            FunctionArgExpr::QualifiedWildcard(_) | FunctionArgExpr::Wildcard => Ok(()),
        }
    }
}

/// Spec §4.3 step 6: inject or lower the outer `LIMIT`/`FETCH`. Returns
/// whether the AST was changed. The literal injected is `cap + 1`, not
/// `cap`: this is what lets `gateway-executor` fetch one row beyond the cap
/// and detect truncation (spec §4.6 step 4) instead of the SQL's own
/// `LIMIT`/`FETCH` silently swallowing the evidence that more rows existed.
/// `ValidatedSQL` never exposes `cap + 1` as `row_cap` itself — callers keep
/// using the real cap for comparison and for discarding the extra row.
///
/// `FETCH FIRST n ROWS ONLY` and `LIMIT n` are mutually exclusive ways of
/// capping the same outer query; a statement only ever carries one of them.
/// Rewriting `limit` when `fetch` is already present would serialize both
/// clauses back to back, which is a syntax error in every dialect this
/// validator supports, so `fetch` is checked first and `limit` is only
/// touched when no `fetch` clause exists.
fn apply_row_cap(query: &mut Query, cap: u32) -> bool {
    if let Some(fetch) = &mut query.fetch {
        let exceeds = match &fetch.quantity {
            // No explicit quantity means `FETCH FIRST ROW ONLY`, i.e. 1 row:
            // always within any real cap.
            None => false,
            Some(Expr::Value(Value::Number(n, _))) => {
                n.parse::<u64>().map(|v| v > cap as u64).unwrap_or(true)
            }
            Some(_) => true,
        };
        if exceeds {
            fetch.quantity = Some(Expr::Value(Value::Number((cap as u64 + 1).to_string(), false)));
        }
        return exceeds;
    }

    let needs_rewrite = match &query.limit {
        None => true,
        Some(Expr::Value(Value::Number(n, _))) => {
            n.parse::<u64>().map(|v| v > cap as u64).unwrap_or(true)
        }
        Some(_) => true,
    };
    if needs_rewrite {
        query.limit = Some(Expr::Value(Value::Number((cap as u64 + 1).to_string(), false)));
    }
    needs_rewrite
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SafetyPolicy {
        SafetyPolicy::new(
            false,
            vec!["pg_sleep".to_owned(), "sleep".to_owned(), "benchmark".to_owned()],
            Vec::new(),
            100,
        )
    }

    #[test]
    fn accepts_plain_select_and_injects_limit() {
        let v = validate(
            "SELECT id, name FROM users WHERE id = 1",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap();
        assert!(v.row_limit_applied);
        assert!(v.text().to_uppercase().contains("LIMIT 101"));
    }

    #[test]
    fn lowers_an_oversized_limit() {
        let v = validate(
            "SELECT id FROM users LIMIT 999999",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap();
        assert!(v.row_limit_applied);
        assert!(v.text().contains("LIMIT 101"));
    }

    #[test]
    fn leaves_a_smaller_limit_untouched() {
        let v = validate(
            "SELECT id FROM users LIMIT 5",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap();
        assert!(!v.row_limit_applied);
        assert!(v.text().contains("LIMIT 5"));
    }

    #[test]
    fn a_bare_fetch_clause_is_capped_in_place_instead_of_gaining_a_limit_too() {
        let v = validate(
            "SELECT id FROM users FETCH FIRST 999999 ROWS ONLY",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap();
        assert!(v.row_limit_applied);
        assert!(v.text().contains("FETCH FIRST 101 ROWS ONLY"));
        assert!(!v.text().to_uppercase().contains("LIMIT"));
    }

    #[test]
    fn a_fetch_clause_within_the_cap_is_left_untouched() {
        let v = validate(
            "SELECT id FROM users FETCH FIRST 5 ROWS ONLY",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap();
        assert!(!v.row_limit_applied);
        assert!(v.text().contains("FETCH FIRST 5 ROWS ONLY"));
        assert!(!v.text().to_uppercase().contains("LIMIT"));
    }

    #[test]
    fn rejects_compound_statements() {
        let err = validate(
            "SELECT 1; SELECT 2",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::MultipleStatements(2)));
    }

    #[test]
    fn rejects_insert() {
        let err = validate(
            "INSERT INTO users (id) VALUES (1)",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::NotReadOnly));
    }

    #[test]
    fn rejects_delete() {
        let err = validate("DELETE FROM posts", GatewayDialect::Postgres, &policy()).unwrap_err();
        assert!(matches!(err, SafetyError::NotReadOnly));
    }

    #[test]
    fn rejects_select_into() {
        let err = validate(
            "SELECT * INTO backup FROM users",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::NotReadOnly));
    }

    #[test]
    fn rejects_select_for_update() {
        let err = validate(
            "SELECT * FROM users FOR UPDATE",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::RowLocking(_)));
    }

    #[test]
    fn rejects_blocked_function_in_projection() {
        let err = validate(
            "SELECT pg_sleep(100)",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::BlockedFunction(_)));
    }

    #[test]
    fn rejects_blocked_function_in_from_clause() {
        let err = validate(
            "SELECT * FROM pg_sleep(100)",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::BlockedFunction(_)));
    }

    #[test]
    fn rejects_blocked_function_nested_in_a_cte() {
        let err = validate(
            "WITH x AS (SELECT pg_sleep(100) AS s) SELECT * FROM x",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::BlockedFunction(_)));
    }

    #[test]
    fn rejects_blocked_function_nested_in_a_subquery() {
        let err = validate(
            "SELECT * FROM users WHERE id IN (SELECT pg_sleep(1)::int)",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::BlockedFunction(_)));
    }

    #[test]
    fn mysql_benchmark_is_blocked() {
        let err = validate(
            "SELECT BENCHMARK(1000000, MD5('x'))",
            GatewayDialect::Mysql,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::BlockedFunction(_)));
    }

    #[test]
    fn enforces_identifier_allowlist_when_configured() {
        let restricted = SafetyPolicy::new(false, Vec::new(), vec!["users".to_owned()], 100);
        let err = validate(
            "SELECT * FROM secrets",
            GatewayDialect::Postgres,
            &restricted,
        )
        .unwrap_err();
        assert!(matches!(err, SafetyError::DisallowedRelation(_)));

        validate("SELECT * FROM users", GatewayDialect::Postgres, &restricted).unwrap();
    }

    #[test]
    fn cte_self_reference_does_not_require_allowlisting() {
        let restricted = SafetyPolicy::new(false, Vec::new(), vec!["users".to_owned()], 100);
        validate(
            "WITH recent AS (SELECT * FROM users) SELECT * FROM recent",
            GatewayDialect::Postgres,
            &restricted,
        )
        .unwrap();
    }

    #[test]
    fn explain_is_rejected_unless_policy_allows_it() {
        let mut allow_explain = policy();
        allow_explain.allow_explain = true;

        assert!(matches!(
            validate("EXPLAIN SELECT 1", GatewayDialect::Postgres, &policy()).unwrap_err(),
            SafetyError::NotReadOnly
        ));
        validate("EXPLAIN SELECT 1", GatewayDialect::Postgres, &allow_explain).unwrap();
    }

    #[test]
    fn round_trip_is_structurally_stable() {
        let v = validate(
            "SELECT id FROM users WHERE id = 1 LIMIT 5",
            GatewayDialect::Postgres,
            &policy(),
        )
        .unwrap();
        let reparsed = validate(v.text(), GatewayDialect::Postgres, &policy()).unwrap();
        assert_eq!(v.text(), reparsed.text());
    }
}
