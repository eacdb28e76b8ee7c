//! Console output formatter for dispatch results, agents and jobs

use colored::Colorize;
use relay_application::{FireOutcome, PollReport};
use relay_domain::{
    AgentDescriptor, AgentStatus, ConfigIssue, DispatchResult, DoneEvent, Severity, StreamEvent,
};

use crate::server::types::{deactivation_str, skip_reason_str};

/// Formats relay output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Response text followed by a routing footer.
    pub fn format(result: &DispatchResult) -> String {
        match result {
            DispatchResult::Done(done) => {
                format!("{}\n\n{}", done.text, Self::format_footer(done))
            }
            DispatchResult::Failed { error } => {
                format!("{} {}\n", "Error:".red().bold(), error)
            }
        }
    }

    /// Routing summary: agent, rationale, candidates, timing.
    pub fn format_footer(done: &DoneEvent) -> String {
        let mut output = format!("{}\n", "-".repeat(40).dimmed());
        output.push_str(&format!("{} {}\n", "Agent:".cyan().bold(), done.agent));
        output.push_str(&format!("{} {}\n", "Why:".cyan().bold(), done.rationale));
        if done.candidates.len() > 1 {
            output.push_str(&format!(
                "{} {}\n",
                "Candidates:".dimmed(),
                done.candidates.join(", ")
            ));
        }
        if let Some(elapsed) = done.metadata.elapsed_ms {
            let mut line = format!("{} ms", elapsed);
            if let Some(total) = done.metadata.usage.total_tokens {
                line.push_str(&format!(", {} tokens", total));
            }
            output.push_str(&format!("{}\n", line.dimmed()));
        }
        output
    }

    /// Only the response text, or the error.
    pub fn format_text(result: &DispatchResult) -> String {
        match result {
            DispatchResult::Done(done) => format!("{}\n", done.text),
            DispatchResult::Failed { error } => format!("{} {}\n", "Error:".red().bold(), error),
        }
    }

    /// Format as JSON
    pub fn format_json(result: &DispatchResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Inline rendering of a progress event while streaming.
    ///
    /// Content deltas are returned verbatim so they concatenate; terminal
    /// events return `None` and are rendered with [`format`](Self::format).
    pub fn format_event(event: &StreamEvent) -> Option<String> {
        match event {
            StreamEvent::ContentDelta { text } => Some(text.clone()),
            StreamEvent::ToolInvoked { tool } => {
                Some(format!("\n{}\n", format!("[{}]", tool).yellow()))
            }
            StreamEvent::ToolResult { tool, summary } => Some(format!(
                "{}\n",
                format!("[{}] {}", tool, summary).dimmed()
            )),
            StreamEvent::SynthesisComplete => None,
            StreamEvent::Done(_) | StreamEvent::Failed { .. } => None,
        }
    }

    /// Table of agents, name-sorted.
    pub fn format_agents(agents: &[AgentDescriptor]) -> String {
        if agents.is_empty() {
            return format!("{}\n", "No agents available".yellow());
        }
        let mut sorted: Vec<&AgentDescriptor> = agents.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let width = sorted.iter().map(|a| a.name.len()).max().unwrap_or(0);
        let mut output = String::new();
        for agent in sorted {
            let name = format!("{:<width$}", agent.name, width = width);
            let name = match agent.status {
                AgentStatus::Available => name.green().bold(),
                AgentStatus::Degraded => name.yellow().bold(),
                AgentStatus::Unavailable => name.red().bold(),
            };
            output.push_str(&format!("{}  {}", name, agent.description));
            if !agent.capabilities.is_empty() {
                output.push_str(&format!(" [{}]", agent.capabilities.join(", ")));
            }
            output.push_str(&format!(" {}", format!("({})", agent.origin.as_str()).dimmed()));
            if let Some(command) = &agent.command {
                output.push_str(&format!(" {}", format!("/{}", command).cyan()));
            }
            output.push('\n');
        }
        output
    }

    /// Config validation issues, one per line.
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                let label = match issue.severity {
                    Severity::Error => "error:".red().bold(),
                    Severity::Warning => "warning:".yellow().bold(),
                };
                format!("{} {}\n", label, issue.message)
            })
            .collect()
    }

    pub fn format_fire(job_id: &str, outcome: &FireOutcome) -> String {
        match outcome {
            FireOutcome::Delivered(delivery) => {
                let source = if delivery.from_batch {
                    "batch".to_string()
                } else {
                    delivery.agent.clone().unwrap_or_else(|| "agent".to_string())
                };
                let mut output = format!(
                    "{} {} (run {}, {})\n{}\n",
                    "Delivered".green().bold(),
                    job_id,
                    delivery.run_count,
                    source,
                    delivery.text
                );
                match (delivery.deactivated, delivery.next_fire) {
                    (Some(reason), _) => output.push_str(&format!(
                        "{}\n",
                        format!("Job deactivated: {}", deactivation_str(reason)).dimmed()
                    )),
                    (None, Some(next)) => output.push_str(&format!(
                        "{}\n",
                        format!("Next fire: {}", next.to_rfc3339()).dimmed()
                    )),
                    (None, None) => {}
                }
                output
            }
            FireOutcome::Skipped(reason) => format!(
                "{} {} ({})\n",
                "Skipped".yellow().bold(),
                job_id,
                skip_reason_str(*reason)
            ),
            FireOutcome::Failed { error, retry_at } => {
                let mut output = format!("{} {}: {}\n", "Failed".red().bold(), job_id, error);
                if let Some(retry) = retry_at {
                    output.push_str(&format!("Retry at {}\n", retry.to_rfc3339()));
                }
                output
            }
        }
    }

    /// One-line poll cycle summary.
    pub fn format_poll(report: &PollReport) -> String {
        format!(
            "{} due, {} delivered, {} skipped, {} failed",
            report.due,
            report.delivered.len(),
            report.skipped.len(),
            report.failed.len()
        )
    }
}
