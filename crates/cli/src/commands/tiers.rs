//! `mathtier tiers` and `mathtier milestones`.

use mathtier_config::AppConfig;
use mathtier_core::progression::{all_milestones, get_mastery_test_requirements};
use mathtier_core::tier::{MAX_TIER, get_band_for_tier};
use mathtier_core::Operation;

/// Show each operation's tier, band, and what comes next.
pub async fn run(user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let user = super::require_user(user)?;
    let config = AppConfig::load().map_err(mathtier_core::Error::from)?;
    let learners = super::open_learners(&config);
    let profile = learners.profile(&user).await.ok_or_else(|| {
        format!("Unknown learner '{user}'. Run `mathtier onboard --user {user}` first.")
    })?;

    println!("Tiers for {}", profile.user_id);
    println!("─────────────────────────────────────────────────────");
    println!("{:<16} {:>5}  {:<13} {}", "Operation", "Tier", "Band", "Next milestone");

    let milestones = all_milestones();
    for operation in Operation::ALL {
        let tier = profile.math_tiers.get(operation);
        let band = get_band_for_tier(tier as i64);
        let next = milestones
            .iter()
            .find(|m| m.tier > tier)
            .map(|m| format!("{} at tier {} (+{} coins)", m.title, m.tier, m.reward.coins))
            .unwrap_or_else(|| "all done".into());
        println!("{:<16} {:>5}  {:<13} {}", operation.as_str(), tier, band.name(), next);

        if let Some(test) = get_mastery_test_requirements(tier as i64) {
            let kind = if test.crosses_band { "band promotion test" } else { "mastery test" };
            println!(
                "{:<16} {:>5}  {kind}: {} questions, {:.0}% accuracy, {} min",
                "",
                "",
                test.question_count,
                test.required_accuracy * 100.0,
                test.time_limit_secs / 60
            );
        }
    }

    println!();
    println!("  Coins: {}   XP: {}", profile.coins, profile.xp);
    Ok(())
}

/// Print the full milestone reward table.
pub fn milestones() {
    println!("Milestones (tier 1..{MAX_TIER})");
    println!("─────────────────────────────────────────────");
    println!("{:>5}  {:<24} {:>6} {:>6}", "Tier", "Title", "Coins", "XP");
    for m in all_milestones() {
        let marker = if m.completes_band { " ★" } else { "" };
        println!(
            "{:>5}  {:<24} {:>6} {:>6}{marker}",
            m.tier, m.title, m.reward.coins, m.reward.xp
        );
    }
}
