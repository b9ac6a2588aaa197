use tia_core::catalog::QuoteRequest;
use tia_core::ranking::parse_factors;
use tia_db::{connect, CatalogStore};

use crate::commands::{self, CommandError, CommandResult};

/// Offline recommendation: the same eligibility and ranking path the advisor
/// tools use, without any model in the loop.
pub fn run(
    age: i64,
    term: i64,
    coverage: i64,
    income: i64,
    factors: &[String],
    limit: Option<usize>,
) -> CommandResult {
    let request = match QuoteRequest::new(age, term, coverage, income) {
        Ok(request) => request,
        Err(error) => {
            let error = CommandError::new("invalid_input", error.to_string(), 2);
            return CommandResult::failure("recommend", error);
        }
    };

    let config = match commands::load_config("recommend") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let factors = parse_factors(factors);
    let limit = limit.unwrap_or(config.advisor.recommendation_limit);

    let outcome = commands::run_async("recommend", async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| CommandError::new("db_connectivity", error.to_string(), 4))?;
        let store = CatalogStore::new(pool.clone());
        let rows = store
            .recommend_plans(&request, &factors, limit)
            .await
            .map_err(|error| CommandError::new("catalog_query", error.to_string(), 5))?;
        pool.close().await;
        Ok(rows)
    });

    match outcome {
        Ok(rows) if rows.is_empty() => CommandResult::success(
            "recommend",
            "no eligible plans for the given age, term, coverage, and income",
        ),
        Ok(rows) => match serde_json::to_string_pretty(&rows) {
            Ok(rendered) => CommandResult::success("recommend", rendered),
            Err(error) => {
                let error = CommandError::new("serialization", error.to_string(), 6);
                CommandResult::failure("recommend", error)
            }
        },
        Err(result) => result,
    }
}
