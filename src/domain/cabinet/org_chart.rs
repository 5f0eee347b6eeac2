use crate::domain::cabinet::{Collaborator, collection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub const PERSON_DEFAULT_POSITION: Position = Position { x: 300.0, y: 350.0 };
pub const JUNCTION_DEFAULT_POSITION: Position = Position { x: 500.0, y: 250.0 };

const JUNCTION_PREFIX: &str = "junction:";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Saved screen positions keyed by node id.
pub type PositionMap = HashMap<String, Position>;

/// The distinct managers of a collaborator, ordered by id. Two collaborators reporting to the
/// same managers share one junction node whatever order their managers were listed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerSet(BTreeSet<String>);

impl ManagerSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            ids.into_iter()
                .map(Into::into)
                .filter(|id| !id.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Sorted manager ids joined by `,`.
    pub fn key(&self) -> String {
        self.0.iter().cloned().collect::<Vec<_>>().join(",")
    }

    pub fn junction_id(&self) -> String {
        format!("{JUNCTION_PREFIX}{}", self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonData {
    pub collaborator_id: String,
    pub name: String,
    pub role: String,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrgNode {
    Person {
        id: String,
        position: Position,
        data: PersonData,
    },
    Junction {
        id: String,
        position: Position,
    },
}

impl OrgNode {
    pub fn id(&self) -> &str {
        match self {
            OrgNode::Person { id, .. } | OrgNode::Junction { id, .. } => id,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            OrgNode::Person { position, .. } | OrgNode::Junction { position, .. } => *position,
        }
    }

    pub fn is_junction(&self) -> bool {
        matches!(self, OrgNode::Junction { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OrgEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl OrgEdge {
    fn new(source: &str, target: &str) -> Self {
        Self {
            id: format!("e{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrgGraph {
    pub nodes: Vec<OrgNode>,
    pub edges: Vec<OrgEdge>,
}

impl OrgGraph {
    pub fn junctions(&self) -> impl Iterator<Item = &OrgNode> {
        self.nodes.iter().filter(|node| node.is_junction())
    }

    pub fn node(&self, id: &str) -> Option<&OrgNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }
}

/// Builds the org chart from the raw upstream collaborator payload. A payload that is not a
/// list gives an empty graph.
pub fn build_org_graph(payload: &Value, positions: &PositionMap) -> OrgGraph {
    let collaborators: Vec<Collaborator> = collection(payload, "collaborators");

    org_graph(&collaborators, positions)
}

pub fn org_graph(collaborators: &[Collaborator], positions: &PositionMap) -> OrgGraph {
    let position_of = |id: &str, fallback: Position| positions.get(id).copied().unwrap_or(fallback);

    let mut nodes = Vec::with_capacity(collaborators.len());
    let mut junctions: BTreeMap<String, ManagerSet> = BTreeMap::new();
    let mut edges = Vec::new();
    let mut seen_edges: HashSet<(String, String)> = HashSet::new();
    let mut push_edge = |source: &str, target: &str| {
        if seen_edges.insert((source.to_string(), target.to_string())) {
            edges.push(OrgEdge::new(source, target));
        }
    };

    for collaborator in collaborators {
        nodes.push(OrgNode::Person {
            id: collaborator.id.clone(),
            position: position_of(&collaborator.id, PERSON_DEFAULT_POSITION),
            data: PersonData {
                collaborator_id: collaborator.id.clone(),
                name: collaborator.full_name(),
                role: collaborator.role.clone(),
                gender: collaborator.gender.clone(),
            },
        });

        let managers = ManagerSet::new(collaborator.manager_refs.iter().cloned());
        match managers.len() {
            0 => {}
            1 => {
                for manager in managers.iter() {
                    push_edge(manager, &collaborator.id);
                }
            }
            _ => {
                let junction_id = managers.junction_id();
                for manager in managers.iter() {
                    push_edge(manager, &junction_id);
                }
                push_edge(&junction_id, &collaborator.id);
                junctions.entry(junction_id).or_insert(managers);
            }
        }
    }

    nodes.extend(junctions.into_keys().map(|id| OrgNode::Junction {
        position: position_of(&id, JUNCTION_DEFAULT_POSITION),
        id,
    }));

    OrgGraph { nodes, edges }
}
