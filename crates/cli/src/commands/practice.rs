//! `mathtier practice` — an interactive practice session.
//!
//! Answers are read line by line from stdin. `h` asks for a hint on the
//! current question, `q` ends the session early.

use mathtier_config::AppConfig;
use mathtier_content::generate_anonymous;
use mathtier_core::{Error, Operation, check_answer};
use mathtier_orchestrator::{PracticeService, SelectionSource};
use mathtier_store::InMemorySessionStore;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

enum Input {
    Answer(String),
    Hint,
    Quit,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_lowercase().as_str() {
        "q" | "quit" | "exit" => Input::Quit,
        "h" | "hint" => Input::Hint,
        other => Input::Answer(other.to_string()),
    }
}

fn prompt(number: u32, text: &str, review: bool) -> std::io::Result<()> {
    let tag = if review { " (review)" } else { "" };
    println!();
    println!("  Q{number}{tag}. {text}");
    print!("  > ");
    std::io::stdout().flush()
}

pub async fn run(
    operation: Operation,
    user: Option<String>,
    questions: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(mathtier_core::Error::from)?;
    let learners = Arc::new(super::open_learners(&config));
    let ttl = Duration::from_secs(config.session.ttl_secs);
    let sessions = Arc::new(InMemorySessionStore::new(ttl));
    let service = PracticeService::new(sessions, learners, config.practice.clone());

    let start = match service.initialize_session(user.as_deref(), operation).await {
        Ok(start) => start,
        Err(Error::Unauthorized) => {
            return Err("No learner given. Pass --user or set MATHTIER_USER.".into());
        }
        Err(Error::UserNotFound(id)) => {
            return Err(
                format!("Unknown learner '{id}'. Run `mathtier onboard --user {id}` first.").into(),
            );
        }
        Err(e) => return Err(e.into()),
    };
    let session_id = start.session_id;
    let placement = start.envelope.directives.placement;

    println!();
    println!("  {} practice, starting at tier {}", operation.as_str(), placement.estimated_tier);
    println!("  Type your answer and press Enter. 'h' for a hint, 'q' to finish.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut question = start.first_question;
    let mut review = false;
    let mut number = 1;

    'session: loop {
        prompt(number, &question.prompt_text, review)?;
        let asked_at = Instant::now();
        let mut help_used = false;

        let answer = loop {
            let Some(line) = lines.next_line().await? else {
                break 'session;
            };
            match parse_input(&line) {
                Input::Quit => break 'session,
                Input::Hint => {
                    help_used = true;
                    let latency = asked_at.elapsed().as_millis() as u64;
                    match service.request_hint(&session_id, "", latency, None, None).await? {
                        Some(hint) => println!("  💡 {}", hint.text),
                        None => println!("  No hint available."),
                    }
                    print!("  > ");
                    std::io::stdout().flush()?;
                }
                Input::Answer(answer) if answer.is_empty() => {
                    print!("  > ");
                    std::io::stdout().flush()?;
                }
                Input::Answer(answer) => break answer,
            }
        };

        let latency = asked_at.elapsed().as_millis() as u64;
        let result = service
            .submit_answer(&session_id, &answer, latency, help_used)
            .await?;

        if result.is_correct {
            println!("  ✅ Correct!");
        } else {
            println!("  ❌ Not quite. {}", result.answered.explanation);
        }
        if let Some(hint) = &result.hint {
            if let Some(note) = &hint.note {
                println!("  {note}");
            }
            println!("  💡 {}", hint.text);
        }
        match &result.envelope.directives.coach.message {
            Some(message) if !result.is_correct => println!("  {message}"),
            _ => {}
        }

        if number >= questions {
            break;
        }
        number += 1;
        review = result.envelope.selection.source == SelectionSource::Echo;
        question = result.next_question;
    }

    let stats = service.aggregate_stats(&session_id).await?;
    debug!(session_id = %session_id, answered = stats.total_questions, "Ending practice session");
    let progression = service.end_session(&session_id, stats).await?;

    println!();
    println!("  ─────────────────────────────────────");
    println!(
        "  Answered {} with {:.0}% accuracy, best streak {}",
        stats.total_questions,
        stats.accuracy * 100.0,
        stats.max_streak
    );
    if progression.advanced {
        println!(
            "  🎉 Tier {} → {} ({})",
            progression.previous_tier, progression.new_tier, progression.band_name
        );
    } else {
        println!("  Staying at tier {} ({})", progression.new_tier, progression.band_name);
    }
    if progression.blocked_by_band_boundary {
        println!("  You've reached the top of the band. Pass the band promotion test to move on.");
    }
    for milestone in &progression.milestones_crossed {
        println!(
            "  🏆 {} (+{} coins, +{} xp)",
            milestone.title, milestone.reward.coins, milestone.reward.xp
        );
    }
    println!();

    Ok(())
}

/// Tier-1 questions with no profile, no session, and no adaptation.
pub async fn run_anonymous(
    operation: Operation,
    questions: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  Anonymous {} practice (tier 1). 'q' to finish.", operation.as_str());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut correct = 0;
    let mut answered = 0;

    for number in 1..=questions {
        let item = generate_anonymous(operation, &mut rand::rng());
        prompt(number, &item.prompt_text, false)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let answer = match parse_input(&line) {
            Input::Quit => break,
            Input::Hint => String::new(),
            Input::Answer(answer) => answer,
        };
        answered += 1;
        if check_answer(&item, &answer) {
            correct += 1;
            println!("  ✅ Correct!");
        } else {
            println!("  ❌ {}", item.explanation);
        }
    }

    println!();
    println!("  {correct} of {answered} correct");
    println!();
    Ok(())
}
