//! Import command implementation.

use crate::cli::ImportArgs;
use crate::commands::open_store;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use roster_domain::{AttributeValue, Member, MemberId, RelationType, RelationshipEdge};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};

/// Execute the import command.
pub fn execute_import(args: ImportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    // Read the snapshot from file or stdin
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = args.file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either a file or --stdin".to_string(),
        ));
    };

    let snapshot: SnapshotDefinition = serde_json::from_str(&json_data)?;
    let (members, edges) = snapshot.to_domain()?;

    let mut store = open_store(config)?;
    store.import_cohort(&snapshot.cohort, &members, &edges)?;

    println!(
        "{}",
        formatter.success(&format!(
            "Imported {} member(s) and {} edge(s) into cohort {}",
            members.len(),
            edges.len(),
            snapshot.cohort
        ))
    );
    Ok(())
}

/// Cohort snapshot as accepted on input.
#[derive(Debug, Deserialize)]
struct SnapshotDefinition {
    cohort: String,
    members: Vec<MemberDefinition>,
    #[serde(default)]
    edges: Vec<EdgeDefinition>,
}

#[derive(Debug, Deserialize)]
struct MemberDefinition {
    id: u64,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EdgeDefinition {
    source: u64,
    target: u64,
    relation: String,
}

impl SnapshotDefinition {
    fn to_domain(&self) -> Result<(Vec<Member>, Vec<RelationshipEdge>)> {
        if self.members.is_empty() {
            return Err(CliError::InvalidInput(format!(
                "Cohort '{}' has no members",
                self.cohort
            )));
        }

        let members = self
            .members
            .iter()
            .map(|def| {
                def.attributes.iter().fold(
                    Member::new(MemberId::new(def.id), self.cohort.as_str()),
                    |member, (name, value)| member.with_attribute(name.as_str(), attribute_value(value)),
                )
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|def| {
                let relation = RelationType::parse(&def.relation).ok_or_else(|| {
                    CliError::InvalidInput(format!("Unknown relation type '{}'", def.relation))
                })?;
                Ok(RelationshipEdge::new(
                    MemberId::new(def.source),
                    MemberId::new(def.target),
                    relation,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((members, edges))
    }
}

fn attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Number(n) => n.as_f64().map(AttributeValue::Number).unwrap_or(AttributeValue::Missing),
        Value::String(s) => AttributeValue::Text(s.clone()),
        Value::Null => AttributeValue::Missing,
        other => AttributeValue::Text(other.to_string()),
    }
}
