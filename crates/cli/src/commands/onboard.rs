//! `mathtier onboard` — First-time setup.

use mathtier_config::AppConfig;

pub async fn run(user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("mathtier — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config already exists at: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load().map_err(mathtier_core::Error::from)?;
    let data_dir = config.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        println!("✅ Created data directory: {}", data_dir.display());
    }

    match user {
        Some(user) => {
            let user = super::require_user(Some(user))?;
            let learners = super::open_learners(&config);
            if learners.ensure_learner(&user).await? {
                println!("✅ Registered learner '{user}' (all operations at tier 1)");
            } else {
                println!("  Learner '{user}' already registered");
            }
            println!("\n🎉 Setup complete! Run `mathtier practice addition --user {user}`.\n");
        }
        None => {
            println!("\n  No learner registered. Re-run with --user <name> to add one.\n");
        }
    }

    Ok(())
}
