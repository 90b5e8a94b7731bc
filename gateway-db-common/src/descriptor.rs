use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The SQL variant a registered database speaks. Determines parsing rules,
/// quoting, and which catalog queries the introspector runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Mysql,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
        }
    }

    /// The dialect's identifier quote character, used both by introspection
    /// (recording it on the snapshot) and by the SQL safety validator when
    /// reserializing a rewritten AST.
    pub fn quote_char(&self) -> char {
        match self {
            Dialect::Postgres => '"',
            Dialect::Mysql => '`',
        }
    }

    pub fn quote_identifier(&self, ident: &str) -> String {
        let q = self.quote_char();
        format!("{q}{}{q}", ident.replace(q, &format!("{q}{q}")))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, once-registered description of a target database. Created
/// at configuration load or by an administrative `register_database` call;
/// destroyed only by explicit `unregister_database` after its pool has
/// drained (enforced by `DatabaseRegistry`, not by this type).
#[derive(Clone, Debug)]
pub struct DatabaseDescriptor {
    /// Unique, case-sensitive logical name used to address this database
    /// from a `QueryRequest`.
    pub name: String,
    pub dialect: Dialect,
    pub connection_uri: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub statement_timeout: Duration,
    /// Per-database override of `security.max_rows`; `None` defers to the
    /// global cap.
    pub row_cap: Option<u32>,
}

impl DatabaseDescriptor {
    pub fn effective_row_cap(&self, global_max_rows: u32) -> u32 {
        self.row_cap.unwrap_or(global_max_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_quoting_doubles_embedded_quotes() {
        assert_eq!(Dialect::Postgres.quote_identifier(r#"weird"name"#), r#""weird""name""#);
    }

    #[test]
    fn mysql_uses_backticks() {
        assert_eq!(Dialect::Mysql.quote_identifier("users"), "`users`");
    }

    #[test]
    fn row_cap_falls_back_to_global() {
        let d = DatabaseDescriptor {
            name: "blog".into(),
            dialect: Dialect::Postgres,
            connection_uri: "postgres://localhost/blog".into(),
            pool_min: 1,
            pool_max: 5,
            statement_timeout: Duration::from_secs(30),
            row_cap: None,
        };
        assert_eq!(d.effective_row_cap(10_000), 10_000);
    }
}
