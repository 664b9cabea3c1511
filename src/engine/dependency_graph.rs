// ==========================================
// 学校入驻数据加载器 - 实体依赖图
// ==========================================
// 职责: 显式 DAG + 拓扑排序（Kahn）
// 规则: 同时可执行的种类按声明顺序优先
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::error::{LoadError, LoadResult};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// 种类 → 其依赖的种类
    dependencies: BTreeMap<EntityKind, BTreeSet<EntityKind>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部 17 种实体及其外键依赖
    pub fn standard() -> Self {
        let mut graph = Self::new();
        for kind in EntityKind::ALL {
            graph.add_kind(kind);
            for dependency in kind.dependencies() {
                graph.add_dependency(kind, *dependency);
            }
        }
        graph
    }

    pub fn add_kind(&mut self, kind: EntityKind) {
        self.dependencies.entry(kind).or_default();
    }

    /// kind 必须在 depends_on 之后执行
    pub fn add_dependency(&mut self, kind: EntityKind, depends_on: EntityKind) {
        self.add_kind(depends_on);
        self.dependencies.entry(kind).or_default().insert(depends_on);
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn dependencies_of(&self, kind: EntityKind) -> impl Iterator<Item = EntityKind> + '_ {
        self.dependencies
            .get(&kind)
            .into_iter()
            .flat_map(|deps| deps.iter().copied())
    }

    /// 拓扑排序
    ///
    /// # 返回
    /// - Ok(Vec<EntityKind>): 每个种类都排在其全部依赖之后
    /// - Err(DependencyCycle): 存在环,附带无法排序的种类
    pub fn topological_order(&self) -> LoadResult<Vec<EntityKind>> {
        let mut remaining: BTreeMap<EntityKind, usize> = self
            .dependencies
            .iter()
            .map(|(kind, deps)| (*kind, deps.len()))
            .collect();

        let mut dependents: BTreeMap<EntityKind, Vec<EntityKind>> = BTreeMap::new();
        for (kind, deps) in &self.dependencies {
            for dependency in deps {
                dependents.entry(*dependency).or_default().push(*kind);
            }
        }

        let mut ready: BTreeSet<EntityKind> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(kind, _)| *kind)
            .collect();

        let mut order = Vec::with_capacity(self.dependencies.len());
        while let Some(kind) = ready.pop_first() {
            remaining.remove(&kind);
            order.push(kind);

            for dependent in dependents.get(&kind).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            return Err(LoadError::DependencyCycle(remaining.into_keys().collect()));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EntityKind::*;

    #[test]
    fn test_standard_order_matches_documented_sequence() {
        let order = DependencyGraph::standard().topological_order().unwrap();
        assert_eq!(
            order,
            vec![
                School,
                Grade,
                Section,
                Subject,
                Teacher,
                Student,
                TeacherSubject,
                TeacherGradeSection,
                Timeslot,
                TimetableEntry,
                AttendanceRecord,
                HomeworkAssignment,
                ClassDiaryEntry,
                FeeSummary,
                Installment,
                SalaryStructure,
                SalaryPayslip,
            ]
        );
    }

    #[test]
    fn test_every_edge_is_respected() {
        let graph = DependencyGraph::standard();
        let order = graph.topological_order().unwrap();
        let position = |kind: EntityKind| order.iter().position(|k| *k == kind).unwrap();

        for kind in EntityKind::ALL {
            for dependency in graph.dependencies_of(kind) {
                assert!(
                    position(dependency) < position(kind),
                    "{dependency} must precede {kind}"
                );
            }
        }
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(Grade, School);
        graph.add_dependency(Section, Grade);
        graph.add_dependency(Grade, Section);

        let err = graph.topological_order().unwrap_err();
        match err {
            LoadError::DependencyCycle(kinds) => assert_eq!(kinds, vec![Grade, Section]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
