use ecoquest_engine::Session;

use crate::{print_json, OutputFormat};

pub(crate) async fn cmd_account(session: &Session, output: OutputFormat) -> Result<(), String> {
    let account = session.account().await;
    match output {
        OutputFormat::Json => print_json(
            &serde_json::to_value(&account).map_err(|e| format!("serialization error: {}", e))?,
        ),
        OutputFormat::Text => {
            println!("Level {} | {} points", account.level, account.points);
            println!(
                "Impact: {} kg CO2, {} L water, {} kWh energy",
                account.impact.co2_saved, account.impact.water_saved, account.impact.energy_saved
            );
            let join = |set: &std::collections::BTreeSet<String>| {
                if set.is_empty() {
                    "-".to_string()
                } else {
                    set.iter().cloned().collect::<Vec<_>>().join(", ")
                }
            };
            println!("Active: {}", join(&account.active_challenges));
            println!("Completed: {}", join(&account.completed_challenges));
            println!("Badges: {}", join(&account.badges));
        }
    }
    Ok(())
}

pub(crate) async fn cmd_reset(
    session: &Session,
    yes: bool,
    output: OutputFormat,
) -> Result<(), String> {
    if !yes {
        return Err("reset erases all progress; pass --yes to confirm".to_string());
    }
    session.reset_account().await.map_err(|e| e.to_string())?;
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({ "reset": true })),
        OutputFormat::Text => println!("Account reset"),
    }
    Ok(())
}
