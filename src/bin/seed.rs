use artcraft_store::config::AppConfig;
use artcraft_store::{create_pool, run_migrations, seed};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let report = seed::run(&pool, bcrypt::DEFAULT_COST)?;
    log::info!(
        "Database seeded: {} users, {} products. Accounts: admin@gmail.com / 123, sharad@gmail.com / 123",
        report.users,
        report.products
    );
    Ok(())
}
