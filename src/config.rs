use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::error::MetricsError;

/// One team entry from the configuration file. Child teams are referenced
/// by name and contribute their members and repositories to the parent.
#[derive(Debug, Default, Deserialize)]
pub struct TeamEntry {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TeamsFile {
    teams: HashMap<String, TeamEntry>,
}

/// Flattened view of one team and its descendants: the only shape the rest
/// of the tool consumes.
#[derive(Debug, Clone, Default)]
pub struct TeamMembership {
    pub logins: HashSet<String>,
    /// `"org/repo"` names.
    pub repositories: HashSet<String>,
}

impl TeamMembership {
    /// Distinct organizations owning the team's repositories, in a stable
    /// order for sequential per-org querying.
    pub fn organizations(&self) -> BTreeSet<String> {
        self.repositories
            .iter()
            .filter_map(|r| r.split_once('/'))
            .map(|(org, _)| org.to_string())
            .collect()
    }
}

/// Load the configuration file and flatten `team` with all its descendants.
pub fn load_team(path: &Path, team: &str) -> Result<TeamMembership> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading team configuration {}", path.display()))?;
    let file: TeamsFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing team configuration {}", path.display()))?;

    if !file.teams.contains_key(team) {
        return Err(MetricsError::MissingTeamConfiguration(team.to_string()).into());
    }

    let mut membership = TeamMembership::default();
    let mut visited = HashSet::new();
    flatten(&file.teams, team, &mut visited, &mut membership);
    Ok(membership)
}

fn flatten(
    teams: &HashMap<String, TeamEntry>,
    name: &str,
    visited: &mut HashSet<String>,
    out: &mut TeamMembership,
) {
    if !visited.insert(name.to_string()) {
        return;
    }
    let Some(entry) = teams.get(name) else {
        warn!(team = name, "child team is not defined, skipping");
        return;
    };
    out.logins.extend(entry.members.iter().cloned());
    out.repositories.extend(entry.repositories.iter().cloned());
    for child in &entry.children {
        flatten(teams, child, visited, out);
    }
}
