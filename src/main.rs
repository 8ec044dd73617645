use anyhow::Context;
use clap::Parser;
use listing_scanner::utils::error::ErrorSeverity;
use listing_scanner::utils::{logger, validation::Validate};
use listing_scanner::{
    CliArgs, FileSeenStore, HttpNotifier, JsonFeedSource, ScanReport, Scanner, ScannerConfig,
    SearchStatus,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting listing scanner");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match ScannerConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(store) = &args.store {
        config.store.path = store.clone();
        tracing::info!("🔧 Seen-items file overridden to: {}", store);
    }
    if let Some(monitor) = args.monitor {
        config.scan.monitor = Some(monitor);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be fetched, notified or saved");
        return Ok(());
    }

    let notifier = HttpNotifier::new(config.notifier.clone());

    if args.test_notification {
        notifier
            .send_test_notification()
            .await
            .with_context(|| format!("test notification to {} failed", config.notifier.url))?;
        println!("✅ Test notification sent to {}", config.notifier.url);
        return Ok(());
    }

    let source = match JsonFeedSource::new(config.source.clone()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    let store = FileSeenStore::new(&config.store.path);

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let scanner = Scanner::new_with_monitoring(
        source,
        notifier,
        store,
        config.scan_options(),
        monitor_enabled,
    );

    match scanner.run(&config.searches).await {
        Ok(report) => print_report(&report),
        Err(e) => {
            tracing::error!(
                "❌ Scan failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 只有設定或持久化錯誤會走到這裡
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &ScannerConfig, args: &CliArgs) {
    println!("📋 Configuration Summary:");
    println!("  Notifier: {:?} -> {}", config.notifier.r#type, config.notifier.url);
    println!("  Source: {}", config.source.endpoint);
    println!("  Seen items: {}", config.store.path);
    println!("  Commit policy: {:?}", config.store.commit);
    println!("  Fetch timeout: {:?}", config.fetch_timeout());
    println!("  Notify timeout: {:?}", config.notify_timeout());
    println!("  Notify delay: {:?}", config.notify_delay());
    if config.first_match_only() {
        println!("  🎯 First match only: one notification per search");
    }

    println!(
        "  Searches: {} ({} runnable)",
        config.searches.len(),
        config.runnable_searches().count()
    );
    if args.dry_run || args.verbose {
        for spec in &config.searches {
            println!(
                "    - '{}' include={:?} exclude={:?} sizes={:?}",
                spec.brand, spec.include_keywords, spec.exclude_keywords, spec.sizes
            );
        }
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn print_report(report: &ScanReport) {
    println!("📋 Scan Summary:");
    for search in &report.searches {
        let line = match &search.status {
            SearchStatus::Skipped => "skipped (no brand)".to_string(),
            SearchStatus::TimedOut => "timed out".to_string(),
            SearchStatus::Failed { reason } => format!("failed: {}", reason),
            SearchStatus::Completed {
                listings,
                matches,
                notified,
                notify_failures,
            } => format!(
                "{} listings, {} new, {} notified, {} notify failures",
                listings, matches, notified, notify_failures
            ),
        };
        println!("  '{}': {}", search.brand, line);
    }
    println!(
        "✅ {} new matches this run ({} seen items total)",
        report.total_matches, report.seen_after
    );
}
