use std::time::Duration;

/// Everything the orchestrator needs that isn't owned by one of its
/// collaborators: the security policy inputs C6 is built from per request,
/// the per-stage sub-budgets (spec §5), and the remediation cycle budget
/// (spec §4.7 S3, default 1).
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub allow_explain: bool,
    pub blocked_functions: Vec<String>,
    pub allowed_relations: Vec<String>,
    pub global_max_rows: u32,
    pub prompt_token_budget: u32,
    pub remediation_budget: u32,
    pub request_deadline: Duration,
    pub schema_stage_deadline: Duration,
    pub generate_stage_deadline: Duration,
    pub execute_stage_deadline: Duration,
    pub judge_stage_deadline: Duration,
    pub enable_judging: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            allow_explain: false,
            blocked_functions: Vec::new(),
            allowed_relations: Vec::new(),
            global_max_rows: 10_000,
            prompt_token_budget: 6_000,
            remediation_budget: 1,
            request_deadline: Duration::from_secs(60),
            schema_stage_deadline: Duration::from_secs(10),
            generate_stage_deadline: Duration::from_secs(15),
            execute_stage_deadline: Duration::from_secs(30),
            judge_stage_deadline: Duration::from_secs(10),
            enable_judging: true,
        }
    }
}
