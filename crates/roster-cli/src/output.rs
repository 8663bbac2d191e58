//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use roster_analysis::{CentralitySummary, RankedMember};
use roster_domain::{GroupId, MemberId, Run, RunRecord};
use roster_pipeline::{AllocationResult, AnalysisResult, ReallocationResult};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
    Table,
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the results of one or more allocations.
    pub fn format_allocations(&self, results: &[AllocationResult]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let runs: Vec<Value> = results.iter().map(allocation_json).collect();
                Ok(serde_json::to_string_pretty(&runs)?)
            }
            OutputFormat::Quiet => Ok(results
                .iter()
                .map(|r| r.run_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut sections = Vec::new();
                for result in results {
                    let header = format!(
                        "Run {} | cohort {} | {} members in {} groups | policy {} | objective {:.2}",
                        result.run_id,
                        result.cohort,
                        result.total_members,
                        result.total_groups,
                        result.policy,
                        result.objective
                    );
                    let mut section = self.colorize(&header, "cyan");
                    section.push('\n');
                    section.push_str(&groups_table(&result.groups, &result.group_averages));
                    section.push('\n');
                    section.push_str(&format!(
                        "search: {} nodes, {} moves, {} swaps, {} restarts, {:.2?}{}{}",
                        result.stats.nodes_explored,
                        result.stats.improving_moves,
                        result.stats.improving_swaps,
                        result.stats.restarts,
                        result.stats.elapsed,
                        if result.stats.proven_optimal { ", proven optimal" } else { "" },
                        if result.stats.timed_out { ", time budget reached" } else { "" },
                    ));
                    sections.push(section);
                }
                Ok(sections.join("\n\n"))
            }
        }
    }

    /// Format the result of a manual move.
    pub fn format_reallocation(&self, result: &ReallocationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "run_id": result.new_run_id.to_string(),
                "parent_run_id": result.parent_run_id.to_string(),
                "balanced": result.balanced,
                "groups": groups_json(&result.groups),
                "diagnostics": result.diagnostics.messages(),
            }))?),
            OutputFormat::Quiet => Ok(result.new_run_id.to_string()),
            OutputFormat::Table => {
                let mut out = self.success(&format!(
                    "Run {} created from {}",
                    result.new_run_id, result.parent_run_id
                ));
                out.push('\n');
                out.push_str(&groups_table(&result.groups, &BTreeMap::new()));
                if !result.balanced {
                    out.push('\n');
                    out.push_str(&self.warning("Group sizes now differ by more than one"));
                }
                for message in result.diagnostics.messages() {
                    out.push('\n');
                    out.push_str(&self.warning(&message));
                }
                Ok(out)
            }
        }
    }

    /// Format preservation, centrality and group profiles.
    pub fn format_analysis(&self, analysis: &AnalysisResult) -> Result<String> {
        let report = &analysis.report;
        match self.format {
            OutputFormat::Json => {
                let relations: Vec<Value> = report
                    .relations
                    .iter()
                    .map(|r| {
                        json!({
                            "relation": r.relation.as_str(),
                            "preserved": r.preserved,
                            "total": r.total,
                            "percentage": r.percentage(),
                        })
                    })
                    .collect();
                let groups: Vec<Value> = analysis
                    .profiles
                    .iter()
                    .map(|p| {
                        let centrality: BTreeMap<&str, Value> = report
                            .group_centrality
                            .get(&p.group)
                            .map(|by_relation| {
                                by_relation
                                    .iter()
                                    .map(|(rel, summary)| (rel.as_str(), centrality_json(summary)))
                                    .collect()
                            })
                            .unwrap_or_default();
                        json!({
                            "group": p.group.value(),
                            "size": p.size,
                            "averages": p.averages,
                            "normalized_averages": p.normalized_averages,
                            "positive_ties": p.positive_ties,
                            "negative_ties": p.negative_ties,
                            "net_score": p.net_score,
                            "preservation": report
                                .records
                                .iter()
                                .filter(|r| r.group == p.group)
                                .map(|r| json!({
                                    "relation": r.relation.as_str(),
                                    "preserved": r.preserved,
                                    "total": r.total,
                                    "percentage": r.percentage(),
                                }))
                                .collect::<Vec<_>>(),
                            "centrality": centrality,
                        })
                    })
                    .collect();
                let global: BTreeMap<&str, Value> = report
                    .global_centrality
                    .iter()
                    .map(|(rel, summary)| (rel.as_str(), centrality_json(summary)))
                    .collect();

                Ok(serde_json::to_string_pretty(&json!({
                    "run": run_json(&analysis.run),
                    "relations": relations,
                    "centrality": global,
                    "groups": groups,
                    "diagnostics": analysis.diagnostics.messages(),
                }))?)
            }
            OutputFormat::Quiet => Ok(analysis.run.id.to_string()),
            OutputFormat::Table => {
                let mut out = self.colorize(
                    &format!(
                        "Run {} | cohort {} | {} groups",
                        analysis.run.id, analysis.run.cohort, analysis.run.group_count
                    ),
                    "cyan",
                );

                let mut builder = Builder::default();
                builder.push_record(["Relation", "Preserved", "Total", "%"]);
                for r in &report.relations {
                    builder.push_record([
                        r.relation.to_string(),
                        r.preserved.to_string(),
                        r.total.to_string(),
                        format!("{:.1}", r.percentage()),
                    ]);
                }
                out.push('\n');
                out.push_str(&styled(builder.build()));

                let attributes: Vec<String> = analysis
                    .profiles
                    .first()
                    .map(|p| p.averages.keys().cloned().collect())
                    .unwrap_or_default();
                let mut builder = Builder::default();
                let mut header = vec!["Group".to_string(), "Size".to_string()];
                header.extend(attributes.iter().map(|a| format!("avg {} (scaled)", a)));
                header.extend(["+ ties", "- ties", "Net"].map(String::from));
                builder.push_record(header);
                for p in &analysis.profiles {
                    let mut row = vec![group_label(p.group), p.size.to_string()];
                    row.extend(
                        attributes
                            .iter()
                            .map(|a| {
                                format!(
                                    "{:.1} ({:.2})",
                                    p.averages.get(a).copied().unwrap_or(0.0),
                                    p.normalized_averages.get(a).copied().unwrap_or(0.0)
                                )
                            }),
                    );
                    row.push(p.positive_ties.to_string());
                    row.push(p.negative_ties.to_string());
                    row.push(format!("{:.1}", p.net_score));
                    builder.push_record(row);
                }
                out.push('\n');
                out.push_str(&styled(builder.build()));

                let mut builder = Builder::default();
                builder.push_record(["Relation", "Nodes", "Edges", "Top in-degree", "Top betweenness"]);
                for (relation, summary) in &report.global_centrality {
                    builder.push_record([
                        relation.to_string(),
                        summary.nodes.to_string(),
                        summary.edges.to_string(),
                        ranking(&summary.top_in_degree),
                        ranking(&summary.top_betweenness),
                    ]);
                }
                out.push('\n');
                out.push_str(&styled(builder.build()));

                for message in analysis.diagnostics.messages() {
                    out.push('\n');
                    out.push_str(&self.warning(&message));
                }
                Ok(out)
            }
        }
    }

    /// Format a list of runs.
    pub fn format_runs(&self, runs: &[Run]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let runs: Vec<Value> = runs.iter().map(run_json).collect();
                Ok(serde_json::to_string_pretty(&runs)?)
            }
            OutputFormat::Quiet => Ok(runs
                .iter()
                .map(|r| r.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if runs.is_empty() {
                    return Ok(self.colorize("No runs found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Cohort", "Groups", "Policy", "Parent", "Created (ms)"]);
                for run in runs {
                    builder.push_record([
                        run.id.to_string(),
                        run.cohort.clone(),
                        run.group_count.to_string(),
                        run.policy.clone(),
                        run.parent.map(|p| p.to_string()).unwrap_or_default(),
                        run.created_at.to_string(),
                    ]);
                }
                Ok(styled(builder.build()))
            }
        }
    }

    /// Format a stored run with its assignment and preservation rows.
    pub fn format_record(&self, record: &RunRecord) -> Result<String> {
        let groups = record.assignment.groups();
        match self.format {
            OutputFormat::Json => {
                let mut run = run_json(&record.run);
                run["groups"] = groups_json(&groups);
                run["group_averages"] = json!(record
                    .group_averages
                    .iter()
                    .map(|(g, averages)| (g.value().to_string(), averages))
                    .collect::<BTreeMap<_, _>>());
                run["preservation"] = json!(record
                    .preservation
                    .iter()
                    .map(|r| json!({
                        "group": r.group.value(),
                        "relation": r.relation.as_str(),
                        "preserved": r.preserved,
                        "total": r.total,
                        "percentage": r.percentage(),
                    }))
                    .collect::<Vec<_>>());
                run["intra_group_edges"] = json!(record.intra_group_edges.len());
                Ok(serde_json::to_string_pretty(&run)?)
            }
            OutputFormat::Quiet => Ok(record
                .assignment
                .iter()
                .map(|(member, group)| format!("{} {}", member, group))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut out = self.colorize(
                    &format!(
                        "Run {} | cohort {} | policy {}{}",
                        record.run.id,
                        record.run.cohort,
                        record.run.policy,
                        record
                            .run
                            .parent
                            .map(|p| format!(" | parent {}", p))
                            .unwrap_or_default()
                    ),
                    "cyan",
                );
                out.push('\n');
                out.push_str(&groups_table(&groups, &record.group_averages));

                let mut builder = Builder::default();
                builder.push_record(["Group", "Relation", "Preserved", "Total", "%"]);
                for r in &record.preservation {
                    builder.push_record([
                        group_label(r.group),
                        r.relation.to_string(),
                        r.preserved.to_string(),
                        r.total.to_string(),
                        format!("{:.1}", r.percentage()),
                    ]);
                }
                out.push('\n');
                out.push_str(&styled(builder.build()));
                Ok(out)
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Boundary label for a group
pub fn group_label(group: GroupId) -> String {
    format!("Group {}", group)
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn groups_table(
    groups: &BTreeMap<GroupId, Vec<MemberId>>,
    averages: &BTreeMap<GroupId, BTreeMap<String, f64>>,
) -> String {
    let attributes: Vec<String> = averages
        .values()
        .next()
        .map(|a| a.keys().cloned().collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    let mut header = vec!["Group".to_string(), "Size".to_string()];
    header.extend(attributes.iter().map(|a| format!("avg {}", a)));
    header.push("Members".to_string());
    builder.push_record(header);

    for (group, members) in groups {
        let mut row = vec![group_label(*group), members.len().to_string()];
        row.extend(attributes.iter().map(|a| {
            averages
                .get(group)
                .and_then(|avg| avg.get(a))
                .map(|v| format!("{:.1}", v))
                .unwrap_or_default()
        }));
        row.push(
            members
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
        builder.push_record(row);
    }
    styled(builder.build())
}

fn ranking(members: &[RankedMember]) -> String {
    members
        .iter()
        .map(|r| format!("{} ({:.2})", r.member, r.value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_json(run: &Run) -> Value {
    json!({
        "id": run.id.to_string(),
        "cohort": run.cohort,
        "group_count": run.group_count,
        "policy": run.policy,
        "parent": run.parent.map(|p| p.to_string()),
        "created_at": run.created_at,
    })
}

fn groups_json(groups: &BTreeMap<GroupId, Vec<MemberId>>) -> Value {
    json!(groups
        .iter()
        .map(|(g, members)| (
            g.value().to_string(),
            members.iter().map(|m| m.value()).collect::<Vec<_>>()
        ))
        .collect::<BTreeMap<_, _>>())
}

fn centrality_json(summary: &CentralitySummary) -> Value {
    let ranked = |members: &[RankedMember]| -> Vec<Value> {
        members
            .iter()
            .map(|r| json!({ "member": r.member.value(), "value": r.value }))
            .collect()
    };
    json!({
        "nodes": summary.nodes,
        "edges": summary.edges,
        "top_in_degree": ranked(&summary.top_in_degree),
        "top_out_degree": ranked(&summary.top_out_degree),
        "top_betweenness": ranked(&summary.top_betweenness),
    })
}

fn allocation_json(result: &AllocationResult) -> Value {
    json!({
        "run_id": result.run_id.to_string(),
        "cohort": result.cohort,
        "total_members": result.total_members,
        "total_groups": result.total_groups,
        "policy": result.policy,
        "objective": result.objective,
        "groups": groups_json(&result.groups),
        "group_averages": result
            .group_averages
            .iter()
            .map(|(g, averages)| (g.value().to_string(), averages))
            .collect::<BTreeMap<_, _>>(),
        "search": {
            "nodes_explored": result.stats.nodes_explored,
            "improving_moves": result.stats.improving_moves,
            "improving_swaps": result.stats.improving_swaps,
            "restarts": result.stats.restarts,
            "elapsed_ms": result.stats.elapsed.as_millis() as u64,
            "proven_optimal": result.stats.proven_optimal,
            "timed_out": result.stats.timed_out,
        },
        "diagnostics": result.diagnostics.messages(),
    })
}
