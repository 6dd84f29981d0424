use crate::commands::current_thread_runtime;
use instabids_core::config::{AppConfig, LoadOptions};
use instabids_db::{connect_from_config, migrations, ping};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_readiness(&config));
            checks.push(check_a2a_readiness(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in
                ["llm_readiness", "a2a_readiness", "database_connectivity", "schema_migrations"]
            {
                checks.push(skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// The agent runtime that calls the bid card tools authenticates with these.
fn check_llm_readiness(config: &AppConfig) -> DoctorCheck {
    let llm = &config.llm;
    if llm.api_key.is_none() {
        return skipped("llm_readiness", "no llm.api_key configured for the agent runtime");
    }
    DoctorCheck {
        name: "llm_readiness",
        status: CheckStatus::Pass,
        details: format!(
            "agent runtime uses `{}` (vision `{}`, {}s timeout)",
            llm.model, llm.vision_model, llm.timeout_secs
        ),
    }
}

fn check_a2a_readiness(config: &AppConfig) -> DoctorCheck {
    match (&config.a2a.enabled, &config.a2a.agent_url) {
        (true, Some(url)) => DoctorCheck {
            name: "a2a_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "lifecycle events go to `{url}` ({} token, {}s timeout)",
                if config.a2a.auth_token.is_some() { "bearer" } else { "no" },
                config.a2a.timeout_secs
            ),
        },
        _ => skipped("a2a_readiness", "a2a publishing is disabled"),
    }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                skipped("schema_migrations", "database was not reachable"),
            ];
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let outcome = match ping(&pool).await {
            Ok(()) => Ok(migrations::pending_versions(&pool).await),
            Err(error) => Err(format!("database probe failed: {error}")),
        };
        pool.close().await;
        outcome
    });

    match result {
        Ok(pending) => vec![
            DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Pass,
                details: format!("connected using `{}`", config.database.url),
            },
            check_schema(pending),
        ],
        Err(error) => vec![
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error },
            skipped("schema_migrations", "database was not reachable"),
        ],
    }
}

fn check_schema(pending: Result<Vec<i64>, sqlx::Error>) -> DoctorCheck {
    match pending {
        Ok(pending) if pending.is_empty() => DoctorCheck {
            name: "schema_migrations",
            status: CheckStatus::Pass,
            details: "all migrations applied".to_string(),
        },
        Ok(pending) => DoctorCheck {
            name: "schema_migrations",
            status: CheckStatus::Fail,
            details: format!(
                "pending migrations {pending:?}; run `instabids migrate`"
            ),
        },
        Err(error) => DoctorCheck {
            name: "schema_migrations",
            status: CheckStatus::Fail,
            details: format!("could not read migration state: {error}"),
        },
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped: {reason}") }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
