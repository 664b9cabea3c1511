// ==========================================
// 学校入驻数据加载器 - 标识符映射
// ==========================================
// 职责: 两级映射抽象
// - NaturalKeyMap: 实体种类 × 自然键 → 标识符
// - HintMap:       实体种类 × 提示号 → 标识符
// 红线: 映射一经发布即不可变,后续阶段只读
// ==========================================

use crate::domain::types::{EntityKind, Hint, Identifier};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

// ==========================================
// IdentifierMap - 按实体种类标记的只读映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMap<K: Eq + Hash> {
    kind: EntityKind,
    entries: HashMap<K, Identifier>,
}

/// 自然键 → 标识符（年级名、科目名、教师邮箱、学生邮箱…）
pub type NaturalKeyMap = IdentifierMap<String>;

/// 提示号 → 标识符
pub type HintMap = IdentifierMap<Hint>;

/// 所属实体标识符 → 标识符（student_id → fee_id）
pub type OwnerMap = IdentifierMap<Identifier>;

impl<K: Eq + Hash> IdentifierMap<K> {
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// 由 (键, 标识符) 构造; 重复键以后出现者为准
    pub fn from_entries(kind: EntityKind, entries: impl IntoIterator<Item = (K, Identifier)>) -> Self {
        Self {
            kind,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Identifier>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key).copied()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Identifier)> {
        self.entries.iter()
    }
}

// ==========================================
// ScopedKeyMap - 带作用域的自然键映射
// ==========================================
// 用途: 班级名只在所属年级内唯一（年级名 → 班级名 → section_id）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedKeyMap {
    kind: EntityKind,
    scopes: HashMap<String, NaturalKeyMap>,
}

impl ScopedKeyMap {
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            scopes: HashMap::new(),
        }
    }

    pub fn from_scopes(kind: EntityKind, scopes: impl IntoIterator<Item = (String, NaturalKeyMap)>) -> Self {
        Self {
            kind,
            scopes: scopes.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn scope(&self, scope: &str) -> Option<&NaturalKeyMap> {
        self.scopes.get(scope)
    }

    pub fn get(&self, scope: &str, key: &str) -> Option<Identifier> {
        self.scopes.get(scope).and_then(|m| m.get(key))
    }

    /// 所有作用域内的条目总数
    pub fn len(&self) -> usize {
        self.scopes.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// Publication - 阶段发布物
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    /// 本次加载的主学校（schools 表首行）
    PrimarySchool(Identifier),
    Natural(NaturalKeyMap),
    Scoped(ScopedKeyMap),
    Hint(HintMap),
    Owner(OwnerMap),
}

/// 重复发布同一映射
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("映射已发布,不可覆盖: {slot} ({kind})")]
pub struct AlreadyPublished {
    pub kind: EntityKind,
    pub slot: &'static str,
}

// ==========================================
// PublishedMaps - 已发布映射集合
// ==========================================
// 由编排器在阶段之间扩展,阶段内部只读引用
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedMaps {
    primary_school: Option<Identifier>,
    natural: HashMap<EntityKind, NaturalKeyMap>,
    scoped: HashMap<EntityKind, ScopedKeyMap>,
    hints: HashMap<EntityKind, HintMap>,
    owners: HashMap<EntityKind, OwnerMap>,
}

impl PublishedMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发布一个映射,返回扩展后的集合
    pub fn publish(mut self, publication: Publication) -> Result<Self, AlreadyPublished> {
        match publication {
            Publication::PrimarySchool(id) => {
                if self.primary_school.is_some() {
                    return Err(AlreadyPublished {
                        kind: EntityKind::School,
                        slot: "primary_school",
                    });
                }
                self.primary_school = Some(id);
            }
            Publication::Natural(map) => insert_once(&mut self.natural, map.kind(), map, "natural")?,
            Publication::Scoped(map) => insert_once(&mut self.scoped, map.kind(), map, "scoped")?,
            Publication::Hint(map) => insert_once(&mut self.hints, map.kind(), map, "hint")?,
            Publication::Owner(map) => insert_once(&mut self.owners, map.kind(), map, "owner")?,
        }
        Ok(self)
    }

    pub fn primary_school(&self) -> Option<Identifier> {
        self.primary_school
    }

    pub fn natural(&self, kind: EntityKind) -> Option<&NaturalKeyMap> {
        self.natural.get(&kind)
    }

    pub fn scoped(&self, kind: EntityKind) -> Option<&ScopedKeyMap> {
        self.scoped.get(&kind)
    }

    pub fn hints(&self, kind: EntityKind) -> Option<&HintMap> {
        self.hints.get(&kind)
    }

    pub fn owners(&self, kind: EntityKind) -> Option<&OwnerMap> {
        self.owners.get(&kind)
    }

    pub fn resolve_name(&self, kind: EntityKind, key: &str) -> Option<Identifier> {
        self.natural(kind).and_then(|m| m.get(key))
    }

    pub fn resolve_scoped(&self, kind: EntityKind, scope: &str, key: &str) -> Option<Identifier> {
        self.scoped(kind).and_then(|m| m.get(scope, key))
    }

    pub fn resolve_hint(&self, kind: EntityKind, hint: Hint) -> Option<Identifier> {
        self.hints(kind).and_then(|m| m.get(&hint))
    }

    pub fn resolve_owner(&self, kind: EntityKind, owner: Identifier) -> Option<Identifier> {
        self.owners(kind).and_then(|m| m.get(&owner))
    }
}

fn insert_once<V>(
    slots: &mut HashMap<EntityKind, V>,
    kind: EntityKind,
    value: V,
    slot: &'static str,
) -> Result<(), AlreadyPublished> {
    if slots.contains_key(&kind) {
        return Err(AlreadyPublished { kind, slot });
    }
    slots.insert(kind, value);
    Ok(())
}
