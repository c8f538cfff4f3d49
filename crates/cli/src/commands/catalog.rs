use ecoquest_core::{catalog, ChallengeProgress, TaskState};
use ecoquest_engine::{progress_percentage, Session};

use crate::{print_json, OutputFormat};

pub(crate) fn cmd_challenges(output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let list: Vec<serde_json::Value> = catalog::challenges()
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "id": c.id,
                        "title": c.title,
                        "description": c.description,
                        "difficulty": c.difficulty,
                        "durationDays": c.duration_days,
                        "totalPoints": c.total_points,
                        "tasks": catalog::tasks_for(c.id).len(),
                    })
                })
                .collect();
            print_json(&serde_json::Value::Array(list));
        }
        OutputFormat::Text => {
            for c in catalog::challenges() {
                println!(
                    "{:<20} {} ({} days, {} points, {:?})",
                    c.id, c.title, c.duration_days, c.total_points, c.difficulty
                );
            }
        }
    }
}

pub(crate) async fn cmd_show(
    session: &Session,
    challenge_id: &str,
    output: OutputFormat,
) -> Result<(), String> {
    let info = catalog::challenge_info(challenge_id)
        .ok_or_else(|| format!("unknown challenge: {}", challenge_id))?;
    let progress = session.load_progress(challenge_id).await;
    let status = session.challenge_status(challenge_id).await;

    match output {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "challenge": info,
                "status": status,
                "percentage": progress_percentage(&progress),
                "pointsEarned": progress.points_earned(),
                "progress": progress,
            }));
        }
        OutputFormat::Text => {
            println!("{} - {}", info.title, info.description);
            print_progress(&progress);
        }
    }
    Ok(())
}

pub(crate) fn print_progress(progress: &ChallengeProgress) {
    println!(
        "Day {} | {}/{} tasks | {}/{} points | {:.0}%",
        progress.current_day,
        progress.completed_count(),
        progress.tasks.len(),
        progress.points_earned(),
        progress.points_available(),
        progress_percentage(progress) * 100.0
    );
    if progress.water_saved > 0 {
        println!("Water saved: {}L", progress.water_saved);
    }
    for task in &progress.tasks {
        let mark = match task.state() {
            TaskState::Completed => "[x]",
            TaskState::Unlocked => "[ ]",
            TaskState::Locked => "[-]",
        };
        println!(
            "{} day {} {:<22} {:>3} pts  proof: {}",
            mark, task.day_number, task.id, task.points, task.proof_kind
        );
        if let Some(instructions) = task.visible_instructions() {
            println!("      {}", instructions);
        }
    }
}
