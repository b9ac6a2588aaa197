use tia_db::{connect, migrations, SeedCatalog};

use crate::commands::{self, CommandError, CommandResult};

pub fn run() -> CommandResult {
    let config = match commands::load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let outcome = commands::run_async("seed", async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| CommandError::new("db_connectivity", error.to_string(), 4))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandError::new("migration", error.to_string(), 5))?;
        let summary = SeedCatalog::load(&pool)
            .await
            .map_err(|error| CommandError::new("seed_execution", error.to_string(), 6))?;
        pool.close().await;
        Ok(summary)
    });

    match outcome {
        Ok(summary) => CommandResult::success(
            "seed",
            format!(
                "catalog loaded: {} insurers, {} plans, {} premium bands",
                summary.insurers, summary.plans, summary.premium_bands
            ),
        ),
        Err(result) => result,
    }
}
