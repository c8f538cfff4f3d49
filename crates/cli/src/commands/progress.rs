use ecoquest_engine::{ProofSubmission, Session};

use crate::commands::catalog::print_progress;
use crate::{print_json, OutputFormat};

pub(crate) async fn cmd_start(
    session: &Session,
    challenge_id: &str,
    output: OutputFormat,
) -> Result<(), String> {
    let started = session
        .start_challenge(challenge_id)
        .await
        .map_err(|e| e.to_string())?;
    let status = session.challenge_status(challenge_id).await;
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "challengeId": challenge_id,
            "started": started,
            "status": status,
        })),
        OutputFormat::Text if started => println!("Started {}", challenge_id),
        OutputFormat::Text => println!("{} is already {:?}", challenge_id, status),
    }
    Ok(())
}

pub(crate) async fn cmd_complete(
    session: &Session,
    challenge_id: &str,
    task_id: &str,
    submission: Option<ProofSubmission>,
    output: OutputFormat,
) -> Result<(), String> {
    let report = session
        .complete_task(challenge_id, task_id, submission)
        .await
        .map_err(|e| e.to_string())?;

    for w in &report.warnings {
        tracing::warn!(%challenge_id, %task_id, "{}", w);
    }

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "challengeId": report.challenge_id,
            "taskId": report.task_id,
            "awardedPoints": report.awarded_points,
            "waterAdded": report.water_added,
            "challengeComplete": report.challenge_complete,
            "badge": report.reward.as_ref().map(|r| r.badge.clone()),
            "progress": report.progress,
            "warnings": report.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        })),
        OutputFormat::Text => {
            print_progress(&report.progress);
            if let Some(reward) = &report.reward {
                println!(
                    "Badge earned: {} (+{} kg CO2, +{} L water)",
                    reward.badge, reward.co2_saved, reward.water_saved
                );
            }
        }
    }
    Ok(())
}
