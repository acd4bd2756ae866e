//! Strategic → tactical → operational tree built from flat link rows.

use crate::link::{Link, LinkConvention};
use crate::objective::Objective;
use crate::types::ObjectiveType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How to pick a parent when several links name a parent for the same child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentPolicy {
    /// The link seen last in storage order wins.
    #[default]
    LastWins,
    /// The link seen first in storage order wins.
    FirstWins,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticalNode {
    pub tactical: Objective,
    pub children: Vec<Objective>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicGroup {
    pub strategic: Objective,
    pub children: Vec<TacticalNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hierarchy {
    pub groups: Vec<StrategicGroup>,
    pub unlinked: Vec<Objective>,
}

impl Hierarchy {
    /// Ids of every objective placed somewhere in the tree.
    pub fn placed_ids(&self) -> HashSet<&str> {
        let mut ids = HashSet::new();
        for g in &self.groups {
            ids.insert(g.strategic.id.as_str());
            for t in &g.children {
                ids.insert(t.tactical.id.as_str());
                ids.extend(t.children.iter().map(|o| o.id.as_str()));
            }
        }
        ids
    }
}

/// Map each child id to its recorded parent id.
pub fn parent_map(
    links: &[Link],
    convention: LinkConvention,
    policy: ParentPolicy,
) -> HashMap<&str, &str> {
    let mut parents = HashMap::new();
    for link in links {
        let (parent, child) = convention.parent_child(link);
        match policy {
            ParentPolicy::LastWins => {
                parents.insert(child, parent);
            }
            ParentPolicy::FirstWins => {
                parents.entry(child).or_insert(parent);
            }
        }
    }
    parents
}

/// Build the three-level tree.
///
/// A tactical objective is attached only when its recorded parent is a
/// strategic objective; an operational one only when its recorded parent is a
/// tactical objective already placed in the tree. Anything else is left out of
/// the groups and reported in `unlinked`. Never fails: broken or dangling links
/// only shrink the tree.
pub fn build_hierarchy(
    objectives: &[Objective],
    links: &[Link],
    convention: LinkConvention,
    policy: ParentPolicy,
) -> Hierarchy {
    let parents = parent_map(links, convention, policy);
    let by_id: HashMap<&str, &Objective> =
        objectives.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut groups: Vec<StrategicGroup> = Vec::new();
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    for o in objectives
        .iter()
        .filter(|o| o.objective_type == ObjectiveType::Strategic)
    {
        group_of.insert(o.id.as_str(), groups.len());
        groups.push(StrategicGroup {
            strategic: o.clone(),
            children: Vec::new(),
        });
    }

    let mut node_of: HashMap<&str, (usize, usize)> = HashMap::new();
    for o in objectives
        .iter()
        .filter(|o| o.objective_type == ObjectiveType::Tactical)
    {
        let Some(parent) = parents.get(o.id.as_str()) else {
            continue;
        };
        let Some(&g) = by_id
            .get(parent)
            .filter(|p| p.objective_type == ObjectiveType::Strategic)
            .and_then(|p| group_of.get(p.id.as_str()))
        else {
            continue;
        };
        node_of.insert(o.id.as_str(), (g, groups[g].children.len()));
        groups[g].children.push(TacticalNode {
            tactical: o.clone(),
            children: Vec::new(),
        });
    }

    for o in objectives
        .iter()
        .filter(|o| o.objective_type == ObjectiveType::Operational)
    {
        let Some(parent) = parents.get(o.id.as_str()) else {
            continue;
        };
        if let Some(&(g, t)) = node_of.get(parent) {
            groups[g].children[t].children.push(o.clone());
        }
    }

    let mut hierarchy = Hierarchy {
        groups,
        unlinked: Vec::new(),
    };
    hierarchy.unlinked = unlinked(objectives, &hierarchy);
    hierarchy
}

/// Objectives that do not appear anywhere in `hierarchy`, in input order.
pub fn unlinked(objectives: &[Objective], hierarchy: &Hierarchy) -> Vec<Objective> {
    let placed = hierarchy.placed_ids();
    objectives
        .iter()
        .filter(|o| !placed.contains(o.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkType;
    use crate::types::ObjectiveType::*;

    fn obj(id: &str, t: ObjectiveType) -> Objective {
        Objective::new(id, id.to_uppercase(), t, "q1")
    }

    fn link(source: &str, target: &str) -> Link {
        // Link type is irrelevant to tree building.
        Link::new(source, target, LinkType::TacticalToStrategic)
    }

    fn ids(objs: &[Objective]) -> Vec<&str> {
        objs.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn three_level_tree_child_to_parent() {
        let objectives = vec![obj("s1", Strategic), obj("t1", Tactical), obj("o1", Operational)];
        let links = vec![link("t1", "s1"), link("o1", "t1")];
        let h = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ChildToParent,
            ParentPolicy::LastWins,
        );

        assert_eq!(h.groups.len(), 1);
        assert_eq!(h.groups[0].strategic.id, "s1");
        assert_eq!(h.groups[0].children.len(), 1);
        assert_eq!(h.groups[0].children[0].tactical.id, "t1");
        assert_eq!(ids(&h.groups[0].children[0].children), vec!["o1"]);
        assert!(h.unlinked.is_empty());
    }

    #[test]
    fn three_level_tree_parent_to_child() {
        let objectives = vec![obj("s1", Strategic), obj("t1", Tactical), obj("o1", Operational)];
        let links = vec![link("s1", "t1"), link("t1", "o1")];
        let h = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ParentToChild,
            ParentPolicy::LastWins,
        );
        assert_eq!(ids(&h.groups[0].children[0].children), vec!["o1"]);
        assert!(h.unlinked.is_empty());
    }

    #[test]
    fn skip_level_operational_is_dropped() {
        let objectives = vec![obj("s1", Strategic), obj("o1", Operational)];
        let links = vec![link("o1", "s1")];
        let h = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ChildToParent,
            ParentPolicy::LastWins,
        );
        assert_eq!(h.groups.len(), 1);
        assert!(h.groups[0].children.is_empty());
        assert_eq!(ids(&h.unlinked), vec!["o1"]);
    }

    #[test]
    fn operational_under_orphan_tactical_is_dropped() {
        let objectives = vec![obj("t1", Tactical), obj("o1", Operational)];
        let links = vec![link("o1", "t1")];
        let h = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ChildToParent,
            ParentPolicy::LastWins,
        );
        assert!(h.groups.is_empty());
        assert_eq!(ids(&h.unlinked), vec!["t1", "o1"]);
    }

    #[test]
    fn duplicate_parent_policy() {
        let objectives = vec![obj("s1", Strategic), obj("s2", Strategic), obj("t1", Tactical)];
        let links = vec![link("t1", "s1"), link("t1", "s2")];

        let last = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ChildToParent,
            ParentPolicy::LastWins,
        );
        assert!(last.groups[0].children.is_empty());
        assert_eq!(last.groups[1].children[0].tactical.id, "t1");

        let first = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ChildToParent,
            ParentPolicy::FirstWins,
        );
        assert_eq!(first.groups[0].children[0].tactical.id, "t1");
        assert!(first.groups[1].children.is_empty());
    }

    #[test]
    fn dangling_links_are_ignored() {
        let objectives = vec![obj("s1", Strategic), obj("t1", Tactical)];
        let links = vec![link("t1", "ghost"), link("ghost", "s1")];
        let h = build_hierarchy(
            &objectives,
            &links,
            LinkConvention::ChildToParent,
            ParentPolicy::LastWins,
        );
        assert!(h.groups[0].children.is_empty());
        assert_eq!(ids(&h.unlinked), vec!["t1"]);
    }

    #[test]
    fn empty_input() {
        let h = build_hierarchy(&[], &[], LinkConvention::ChildToParent, ParentPolicy::LastWins);
        assert!(h.groups.is_empty());
        assert!(h.unlinked.is_empty());
    }
}
