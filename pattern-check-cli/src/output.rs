use colored::*;
use pattern_check_engine::SessionReport;
use pattern_check_protocol::metadata::PluginMetadata;
use pattern_check_protocol::step::{StepStatus, StepUpdate};

fn status_label(status: Option<StepStatus>) -> ColoredString {
    match status {
        Some(StepStatus::Running) => "running".cyan(),
        Some(StepStatus::Success) => "success".green().bold(),
        Some(StepStatus::Canceled) => "canceled".yellow(),
        Some(StepStatus::NoPatternMatch) => "noPatternMatch".red().bold(),
        None => "-".dimmed(),
    }
}

pub fn print_step_history(updates: &[StepUpdate]) {
    println!("{}", "Step history".bold());
    for update in updates {
        for line in update.lines() {
            println!("  [{:>14}] {}", status_label(update.status), line);
        }
    }
}

pub fn print_report(report: &SessionReport) {
    for outcome in &report.outcomes {
        let marker = if outcome.matched {
            "✔".green()
        } else {
            "✘".red()
        };
        let located = if outcome.field_present {
            format!("\"{}\"", outcome.resolved_value)
        } else {
            "absent".to_string()
        };
        println!("  {} {} (value: {})", marker, outcome.description, located);
    }

    if report.result.success {
        println!("{}", "✔ All patterns matched".green().bold());
    } else {
        println!(
            "{} {} of {}",
            "✘ Patterns mismatched:".red().bold(),
            report.mismatch_count,
            report.outcomes.len()
        );
    }
}

pub fn print_metadata(metadata: &PluginMetadata) {
    println!(
        "{} {} v{}",
        "Plugin:".bold(),
        metadata.name.bold(),
        metadata.version
    );
    println!("  Type: {}", metadata.kind);
    println!("  Author: {}", metadata.author);
    println!("  Action: {} ({})", metadata.action.name, metadata.action.plugin);
    println!("  Description: {}", metadata.action.description);
    println!("  Category: {}", metadata.action.category);
    println!("  Icon: {}", metadata.action.icon);
}
