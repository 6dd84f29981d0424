use crate::commands::{current_thread_runtime, CommandResult};
use instabids_core::config::{AppConfig, LoadOptions};
use instabids_db::{connect_from_config, ping};

/// Preflight for `instabids-server`: configuration and database reachability.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "start",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "start",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database).await.map_err(|error| error.to_string())?;
        let probe = ping(&pool).await.map_err(|error| format!("database probe failed: {error}"));
        pool.close().await;
        probe
    });

    if let Err(message) = result {
        return CommandResult::failure("start", "db_connectivity", message, 4);
    }

    let publisher = match (&config.a2a.enabled, &config.a2a.agent_url) {
        (true, Some(url)) => format!("a2a ({url})"),
        _ => "noop".to_string(),
    };
    CommandResult::success(
        "start",
        format!(
            "preflight passed: database reachable, server would bind {}:{}, event publisher {publisher}",
            config.server.bind_address, config.server.port
        ),
    )
}
