use std::collections::HashSet;

use gateway_db_common::{Dialect, SchemaSnapshot, TableInfo};

/// Rough tokens-per-character ratio used to estimate prompt size without
/// pulling in a real tokenizer; conservative enough that the budget is
/// never exceeded in practice (spec §4.4 "bound final size to a configured
/// token budget").
const CHARS_PER_TOKEN: usize = 4;

/// Builds the instruction payload handed to the LLM provider (spec §4.4).
/// Stateless: every call is a pure function of its inputs.
pub struct PromptAssembler;

impl PromptAssembler {
    /// `remediation_hint`, when present, is the reason the previous attempt
    /// was refused (spec's "remediation cycle") and is prepended so the
    /// next generation can avoid repeating the mistake.
    pub fn build(
        question: &str,
        schema: &SchemaSnapshot,
        dialect: Dialect,
        token_budget: u32,
        remediation_hint: Option<&str>,
    ) -> String {
        let budget_chars = (token_budget as usize).saturating_mul(CHARS_PER_TOKEN);

        let mut preamble = String::new();
        preamble.push_str("You generate a single read-only SQL statement for a ");
        preamble.push_str(dialect.as_str());
        preamble.push_str(" database.\n");
        preamble.push_str(
            "Rules: respond with exactly one SELECT statement (a WITH ... SELECT is fine). \
             Never use INSERT, UPDATE, DELETE, MERGE, CREATE, DROP, ALTER, TRUNCATE, GRANT, \
             REVOKE, or any statement that can modify data or schema. Reference only tables and \
             columns shown below. Respond with SQL only, no prose, no markdown fences.\n",
        );
        if let Some(hint) = remediation_hint {
            preamble.push_str("Your previous attempt was refused: ");
            preamble.push_str(hint);
            preamble.push_str(". Generate a corrected statement.\n");
        }
        preamble.push_str("\nSchema:\n");

        let footer = format!("\nQuestion: {question}\nSQL:");

        let reserved = preamble.len() + footer.len();
        let schema_budget = budget_chars.saturating_sub(reserved);

        let schema_text = render_schema(schema, question, schema_budget);

        format!("{preamble}{schema_text}{footer}")
    }
}

/// Renders every table if it fits under `budget` characters; otherwise
/// ranks tables by lexical overlap with the question (spec §4.4) and keeps
/// adding the highest-ranked ones until the budget is spent.
fn render_schema(schema: &SchemaSnapshot, question: &str, budget: usize) -> String {
    let full = render_all_tables(schema.all_tables().map(|(_, t)| t));
    if full.len() <= budget {
        return full;
    }

    let question_words = lexical_tokens(question);
    let mut scored: Vec<(i64, &str, &TableInfo)> = schema
        .all_tables()
        .map(|(schema_name, table)| (overlap_score(&question_words, table), schema_name, table))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = String::new();
    for (_, schema_name, table) in scored {
        let rendered = render_table(schema_name, table);
        if out.len() + rendered.len() > budget && !out.is_empty() {
            break;
        }
        out.push_str(&rendered);
    }
    out
}

fn render_all_tables<'a>(tables: impl Iterator<Item = &'a TableInfo>) -> String {
    let mut out = String::new();
    for table in tables {
        out.push_str(&render_table("", table));
    }
    out
}

fn render_table(schema_name: &str, table: &TableInfo) -> String {
    let mut out = String::new();
    if schema_name.is_empty() {
        out.push_str(&format!("- {} (", table.name));
    } else {
        out.push_str(&format!("- {}.{} (", schema_name, table.name));
    }
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            if c.primary_key {
                format!("{} {} PK", c.name, c.type_name)
            } else {
                format!("{} {}", c.name, c.type_name)
            }
        })
        .collect();
    out.push_str(&columns.join(", "));
    out.push_str(")\n");
    out
}

fn lexical_tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn overlap_score(question_words: &HashSet<String>, table: &TableInfo) -> i64 {
    let mut score = 0i64;
    let name = table.name.to_lowercase();
    if question_words.iter().any(|w| name.contains(w.as_str())) {
        score += 10;
    }
    for column in &table.columns {
        let col = column.name.to_lowercase();
        if question_words.contains(&col) {
            score += 2;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use gateway_db_common::{ColumnInfo, SchemaInfo, TableKind};

    use super::*;

    fn snapshot() -> SchemaSnapshot {
        SchemaSnapshot {
            schemas: vec![SchemaInfo {
                name: "public".into(),
                tables: vec![
                    TableInfo {
                        name: "users".into(),
                        kind: TableKind::Table,
                        columns: vec![ColumnInfo {
                            name: "id".into(),
                            type_name: "int4".into(),
                            nullable: false,
                            primary_key: true,
                            unique: true,
                            default: None,
                        }],
                        row_count: None,
                        comment: None,
                    },
                    TableInfo {
                        name: "posts".into(),
                        kind: TableKind::Table,
                        columns: vec![ColumnInfo {
                            name: "author_id".into(),
                            type_name: "int4".into(),
                            nullable: false,
                            primary_key: false,
                            unique: false,
                            default: None,
                        }],
                        row_count: None,
                        comment: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn includes_every_table_when_it_fits_the_budget() {
        let prompt = PromptAssembler::build(
            "how many users are there",
            &snapshot(),
            Dialect::Postgres,
            10_000,
            None,
        );
        assert!(prompt.contains("users"));
        assert!(prompt.contains("posts"));
    }

    #[test]
    fn prepends_the_remediation_hint_when_present() {
        let prompt = PromptAssembler::build(
            "how many users are there",
            &snapshot(),
            Dialect::Postgres,
            10_000,
            Some("attempted a DELETE"),
        );
        assert!(prompt.contains("attempted a DELETE"));
    }

    #[test]
    fn ranks_tables_by_lexical_overlap_under_a_tight_budget() {
        let prompt = PromptAssembler::build(
            "how many users signed up",
            &snapshot(),
            Dialect::Postgres,
            40,
            None,
        );
        assert!(prompt.contains("users"));
    }
}
