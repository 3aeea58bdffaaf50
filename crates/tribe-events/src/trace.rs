//! Behavior Tree Trace Records
//!
//! Flat, depth-tagged records of one tree evaluation, in the order nodes were
//! visited. An external visualizer can rebuild the indented view from the
//! depth alone.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Status as seen by a trace consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Success,
    Failure,
    Running,
}

impl TraceStatus {
    fn symbol(self) -> &'static str {
        match self {
            TraceStatus::Success => "+",
            TraceStatus::Failure => "-",
            TraceStatus::Running => "~",
        }
    }
}

/// One node evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub depth: usize,
    pub name: String,
    pub status: TraceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Trace of a whole evaluation for one agent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeTrace {
    pub agent_id: u64,
    pub tick: u64,
    pub entries: Vec<TraceEntry>,
}

impl TreeTrace {
    pub fn new(agent_id: u64, tick: u64) -> Self {
        Self {
            agent_id,
            tick,
            entries: Vec::new(),
        }
    }

    /// Renders the trace as indented text, two spaces per depth level.
    ///
    /// Entries are recorded post-order (children finish before their parent),
    /// so the rendering re-orders each parent in front of its subtree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in preorder(&self.entries) {
            let _ = write!(
                out,
                "{}[{}] {}",
                "  ".repeat(entry.depth),
                entry.status.symbol(),
                entry.name
            );
            if let Some(reason) = &entry.reason {
                let _ = write!(out, " ({})", reason);
            }
            out.push('\n');
        }
        out
    }
}

/// Converts post-order entries into pre-order for display.
fn preorder(entries: &[TraceEntry]) -> Vec<&TraceEntry> {
    // A node's subtree is the run of deeper entries directly before it.
    fn emit<'a>(entries: &'a [TraceEntry], out: &mut Vec<&'a TraceEntry>) {
        let mut end = entries.len();
        let mut groups = Vec::new();
        while end > 0 {
            let root = &entries[end - 1];
            let mut start = end - 1;
            while start > 0 && entries[start - 1].depth > root.depth {
                start -= 1;
            }
            groups.push((start, end));
            end = start;
        }
        for (start, end) in groups.into_iter().rev() {
            out.push(&entries[end - 1]);
            emit(&entries[start..end - 1], out);
        }
    }

    let mut out = Vec::with_capacity(entries.len());
    emit(entries, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(depth: usize, name: &str, status: TraceStatus) -> TraceEntry {
        TraceEntry {
            depth,
            name: name.to_string(),
            status,
            reason: None,
        }
    }

    #[test]
    fn test_render_reorders_parents_first() {
        let mut trace = TreeTrace::new(1, 10);
        trace.entries = vec![
            entry(2, "IsHungry", TraceStatus::Failure),
            entry(1, "Eat", TraceStatus::Failure),
            entry(2, "PickPoint", TraceStatus::Success),
            entry(2, "WalkTo", TraceStatus::Running),
            entry(1, "Patrol", TraceStatus::Running),
            entry(0, "Root", TraceStatus::Running),
        ];

        let rendered = trace.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[~] Root",
                "  [-] Eat",
                "    [-] IsHungry",
                "  [~] Patrol",
                "    [+] PickPoint",
                "    [~] WalkTo",
            ]
        );
    }

    #[test]
    fn test_render_includes_reason() {
        let mut trace = TreeTrace::new(1, 0);
        trace.entries.push(TraceEntry {
            depth: 0,
            name: "Flee".into(),
            status: TraceStatus::Failure,
            reason: Some("no aggressor".into()),
        });
        assert_eq!(trace.render(), "[-] Flee (no aggressor)\n");
    }
}
