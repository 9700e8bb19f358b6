//! Non-serving CLI commands

use pitch_engine::config::Config;
use pitch_engine::persona::{scoring_weights, PersonaCatalog};
use pitch_engine::secrets::{CredentialKey, Credentials};
use serde_json::json;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Print the judge catalog
pub fn handle_judges(catalog: &PersonaCatalog, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for persona in catalog.all() {
                println!(
                    "{:<8} {:<18} {:<13} {}",
                    persona.id,
                    persona.name,
                    persona.investment_style,
                    persona.specialties.join(", ")
                );
            }
        }
        OutputFormat::Json => {
            let judges: Vec<_> = catalog
                .all()
                .iter()
                .map(|persona| {
                    json!({
                        "id": persona.id,
                        "name": persona.name,
                        "investmentStyle": persona.investment_style,
                        "specialties": persona.specialties,
                        "scoringWeights": scoring_weights(persona.investment_style),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "judges": judges }))?);
        }
    }
    Ok(())
}

/// Result of a diagnostics run
#[derive(Debug, Default)]
pub struct DoctorReport {
    pub checks: Vec<(String, String)>,
    pub issues: Vec<String>,
}

impl DoctorReport {
    pub fn healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Inspect configuration and credential presence without revealing values
pub fn diagnose(config: &Config, credentials: &Credentials) -> DoctorReport {
    let mut report = DoctorReport::default();

    match config.validate() {
        Ok(()) => report
            .checks
            .push(("Configuration".to_string(), "Valid".to_string())),
        Err(e) => {
            report
                .checks
                .push(("Configuration".to_string(), "Invalid".to_string()));
            report.issues.push(e.to_string());
        }
    }
    report
        .checks
        .push(("Bind address".to_string(), config.server.bind.clone()));
    report
        .checks
        .push(("LLM model".to_string(), config.llm.model.clone()));

    for key in CredentialKey::ALL {
        let status = if credentials.is_present(key) {
            "Configured"
        } else if key.is_optional() {
            "Default"
        } else {
            report.issues.push(format!(
                "{} is not set ({})",
                key.primary_var(),
                key.env_vars().join(" or ")
            ));
            "Not configured"
        };
        report
            .checks
            .push((key.primary_var().to_string(), status.to_string()));
    }

    report
}

/// Run system diagnostics
pub fn handle_doctor(
    config: &Config,
    credentials: &Credentials,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let report = diagnose(config, credentials);

    match format {
        OutputFormat::Text => {
            println!("pitchd Diagnostics");
            println!("============================");
            println!();

            println!("Checks:");
            for (check, status) in &report.checks {
                println!("  {:<30} {}", format!("{}:", check), status);
            }

            println!();

            if report.healthy() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in report.issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": report.checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": report.issues,
                "healthy": report.healthy()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
