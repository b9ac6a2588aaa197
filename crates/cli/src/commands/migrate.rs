use tia_db::{connect, migrations};

use crate::commands::{self, CommandError, CommandResult};

pub fn run() -> CommandResult {
    let config = match commands::load_config("migrate") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let outcome = commands::run_async("migrate", async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| CommandError::new("db_connectivity", error.to_string(), 4))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandError::new("migration", error.to_string(), 5))?;
        pool.close().await;
        Ok(())
    });

    match outcome {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(result) => result,
    }
}
