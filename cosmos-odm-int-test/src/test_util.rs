use cosmos_odm::client::DocumentClient;
use cosmos_odm::cosmos_config::{ConsistencyLevel, CosmosConfig};
use cosmos_odm::cosmos_factory::CosmosFactory;
use cosmos_odm::errors::CosmosResult;
use cosmos_odm::operations::{CosmosTemplate, ReactiveCosmosTemplate};
use cosmos_odm::repository::{CosmosRepositoryFactory, ReactiveCosmosRepositoryFactory};
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs `test` between `before` and `after`.
///
/// `after` runs even when the test fails. Failures and panics are reported
/// with a backtrace and then fail the calling test.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> CosmosResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> CosmosResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> CosmosResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx).map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", err_msg), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed. Error: {}", error);
}

/// A fresh database on an in-memory client.
#[derive(Clone)]
pub struct TestContext {
    factory: CosmosFactory,
    template: CosmosTemplate,
}

impl TestContext {
    pub fn new(factory: CosmosFactory, template: CosmosTemplate) -> Self {
        Self { factory, template }
    }

    pub fn database(&self) -> &str {
        self.factory.database()
    }

    pub fn factory(&self) -> &CosmosFactory {
        &self.factory
    }

    pub fn template(&self) -> CosmosTemplate {
        self.template.clone()
    }

    pub fn reactive_template(&self) -> ReactiveCosmosTemplate {
        ReactiveCosmosTemplate::new(self.template.clone())
    }

    pub fn repositories(&self) -> CosmosRepositoryFactory {
        CosmosRepositoryFactory::new(self.template.clone())
    }

    pub fn reactive_repositories(&self) -> ReactiveCosmosRepositoryFactory {
        ReactiveCosmosRepositoryFactory::new(self.reactive_template())
    }
}

pub fn random_database() -> String {
    format!("db-{}", uuid::Uuid::new_v4())
}

pub fn create_test_context() -> CosmosResult<TestContext> {
    let config = CosmosConfig::builder()
        .uri("memory://localhost")
        .key("test-key")
        .database(&random_database())
        .consistency_level(ConsistencyLevel::Session)
        .build()?;

    let factory = CosmosFactory::in_memory(config);
    let template = factory.template()?;
    Ok(TestContext::new(factory, template))
}

pub fn cleanup(ctx: TestContext) -> CosmosResult<()> {
    ctx.factory().client().delete_database(ctx.database())
}
