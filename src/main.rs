use anyhow::Result;
use folio_core::AppError;
use folio_services::{open_store, GitHubDirectory, RefreshBridge, SyncCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    folio_core::init()?;

    // Create and initialize application
    let app = folio_core::App::new()?;
    app.initialize()?;
    let config = app.config();

    tracing::info!("Folio started");

    let store = open_store(&config.store, &config.config_dir)?;
    let directory = GitHubDirectory::new(&config.directory)?;
    let coordinator = SyncCoordinator::from_settings(
        store,
        directory,
        RefreshBridge::global().clone(),
        &config.sync,
    );

    println!("Folio - portfolio content manager");
    println!("  Config directory: {}", config.config_dir.display());

    match coordinator.config_manager().get_config().await? {
        Some(sync) if sync.sync_enabled => {
            println!("  Syncing repositories for {}", sync.account_handle);
            let report = match coordinator.sync_now().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Sync failed: {}", e);
                    println!("  Sync failed: {}", AppError::from(e).user_message());
                    app.shutdown()?;
                    return Ok(());
                }
            };
            println!(
                "  Synced {} of {} selected repositories",
                report.synced_count(),
                sync.selected_repos.len()
            );
            for failure in &report.failures {
                println!("    failed: {} ({})", failure.repo, failure.error);
            }
            for repo in &report.metadata_gaps {
                println!("    no language data: {}", repo);
            }
            for name in &report.unmatched {
                println!("    not found on GitHub: {}", name);
            }
        }
        Some(sync) => println!("  Sync disabled for {}", sync.account_handle),
        None => println!("  GitHub sync not configured"),
    }

    // Graceful shutdown
    app.shutdown()?;

    Ok(())
}
