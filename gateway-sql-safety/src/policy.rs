use std::collections::HashSet;

/// The rules a candidate statement is checked against (spec §6
/// `security.*` settings, translated from the raw config strings into
/// lookup-friendly sets once per request rather than per AST node).
#[derive(Clone, Debug)]
pub struct SafetyPolicy {
    pub allow_explain: bool,
    pub blocked_functions: HashSet<String>,
    /// Empty means unrestricted.
    pub allowed_relations: HashSet<String>,
    pub max_rows: u32,
}

impl SafetyPolicy {
    /// `security.allow_write` (spec §6) is deliberately not a parameter
    /// here: the executor's read-only transaction is unconditional (spec
    /// §4.6 step 2 "Begin a read-only transaction", no exception clause),
    /// so a write statement passed by the gate would only ever reach the
    /// database to be rejected there. Widening the gate without also
    /// reworking the executor's transaction mode would be a no-op dressed
    /// up as a feature, so the read-only verdict stays unconditional until
    /// that executor-side work exists; `allow_write` is parsed and
    /// validated at config load (spec §6 interface) but not threaded in.
    pub fn new(
        allow_explain: bool,
        blocked_functions: impl IntoIterator<Item = String>,
        allowed_relations: impl IntoIterator<Item = String>,
        max_rows: u32,
    ) -> Self {
        Self {
            allow_explain,
            blocked_functions: blocked_functions
                .into_iter()
                .map(|f| f.to_lowercase())
                .collect(),
            allowed_relations: allowed_relations.into_iter().collect(),
            max_rows,
        }
    }

    pub fn is_function_blocked(&self, name: &str) -> bool {
        self.blocked_functions.contains(&name.to_lowercase())
    }

    pub fn is_relation_allowed(&self, name: &str) -> bool {
        self.allowed_relations.is_empty() || self.allowed_relations.contains(name)
    }
}
