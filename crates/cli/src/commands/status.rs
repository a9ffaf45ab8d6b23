//! `mathtier status` — Show configuration and store status.

use mathtier_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(mathtier_core::Error::from)?;
    let learners = super::open_learners(&config);
    let profiles = learners.profiles().await;
    let p = &config.practice;

    println!("mathtier Status");
    println!("===============");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Data dir:      {}", config.data_dir().display());
    println!("  Learner file:  {}", learners.path().display());
    println!("  Learners:      {}", profiles.len());
    println!("  Session TTL:   {}s", config.session.ttl_secs);
    println!(
        "  Recovery:      enter at tilt {:.2}, exit below {:.2}",
        p.coach.enter_recovery, p.coach.exit_recovery
    );
    println!(
        "  Echo delay:    {}..{} questions, resolve after {} hits",
        p.echo.base_delay, p.echo.max_delay, p.echo.resolve_threshold
    );
    println!("  Word problems: {:.0}%", p.content.word_problem_rate * 100.0);
    println!("  Hint rungs:    {}", p.hints.ladder.len());

    if let Some(latest) = profiles.iter().max_by_key(|p| p.updated_at) {
        println!(
            "  Last activity: {} ({})",
            latest.user_id,
            latest.updated_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `mathtier onboard` first");
    }

    Ok(())
}
