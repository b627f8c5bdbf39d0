//! Aggregate figures over the flattened forest.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::domain::entities::Status;
use crate::domain::flatten::FlatEntry;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrgStats {
    pub total: usize,
    pub roots: usize,
    pub active: usize,
    pub disabled: usize,
    pub total_members: u64,
    /// Mean member count per department, 0 for an empty forest
    pub average_members: f64,
    /// Department count per level
    pub per_level: BTreeMap<u8, usize>,
}

impl OrgStats {
    pub fn from_flat(entries: &[FlatEntry<'_>]) -> Self {
        let total = entries.len();
        let total_members: u64 = entries.iter().map(|e| u64::from(e.node.member_count)).sum();
        let active = entries
            .iter()
            .filter(|e| e.node.status == Status::Active)
            .count();
        let per_level: BTreeMap<u8, usize> = entries
            .iter()
            .map(|e| e.node.level)
            .counts()
            .into_iter()
            .collect();

        Self {
            total,
            roots: per_level.get(&1).copied().unwrap_or(0),
            active,
            disabled: total - active,
            total_members,
            average_members: if total == 0 {
                0.0
            } else {
                total_members as f64 / total as f64
            },
            per_level,
        }
    }

    pub fn at_level(&self, level: u8) -> usize {
        self.per_level.get(&level).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DepartmentFields, DepartmentPatch};
    use crate::domain::flatten::flatten;
    use crate::domain::mutation::MutationEngine;

    #[test]
    fn given_empty_forest_when_computing_stats_then_all_zero() {
        let stats = OrgStats::from_flat(&[]);
        assert_eq!(stats, OrgStats::default());
    }

    #[test]
    fn given_forest_when_computing_stats_then_counts_levels_and_members() {
        let mut engine = MutationEngine::sequential();
        let tech = engine
            .insert(None, DepartmentFields::new("技术部", "TECH").with_members(45))
            .unwrap();
        engine
            .insert(Some(&tech), DepartmentFields::new("前端开发组", "FE").with_members(15))
            .unwrap();
        let sales = engine
            .insert(None, DepartmentFields::new("销售部", "SALES").with_members(30))
            .unwrap();
        engine
            .update(
                &sales,
                DepartmentPatch {
                    status: Some(Status::Disabled),
                    ..DepartmentPatch::default()
                },
            )
            .unwrap();

        let stats = OrgStats::from_flat(&flatten(engine.arena()));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.roots, 2);
        assert_eq!(stats.at_level(2), 1);
        assert_eq!(stats.at_level(6), 0);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.disabled, 1);
        assert_eq!(stats.total_members, 90);
        assert!((stats.average_members - 30.0).abs() < f64::EPSILON);
    }
}
