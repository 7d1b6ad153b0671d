//! タグ差分の適用
//!
//! 計画（追加集合・削除集合）をhfへ反映する。追加と削除は独立した操作で、
//! 片方が失敗してももう片方は実行する。部分適用は巻き戻さない。

use crate::gateway::CatalogGateway;
use hf_serve_common::{join_tags, ReconciliationPlan, TagSet};
use log::warn;
use serde::Serialize;
use std::fmt;

/// 片側（追加または削除）の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// 対象タグが無く、hfを呼ばなかった
    Skipped,
    Applied { tags: TagSet },
    Failed { tags: TagSet, error: String },
}

impl StepOutcome {
    pub fn ran(&self) -> bool {
        !matches!(self, StepOutcome::Skipped)
    }

    pub fn failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    /// 成功して反映されたタグ
    pub fn applied_tags(&self) -> Option<&TagSet> {
        match self {
            StepOutcome::Applied { tags } => Some(tags),
            _ => None,
        }
    }
}

/// 計画の適用結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub add: StepOutcome,
    pub delete: StepOutcome,
}

impl Outcome {
    /// 何も実行しなかった（空の計画）
    pub fn noop() -> Self {
        Self {
            add: StepOutcome::Skipped,
            delete: StepOutcome::Skipped,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.add.ran() && !self.delete.ran()
    }

    pub fn is_complete(&self) -> bool {
        !self.add.failed() && !self.delete.failed()
    }

    /// 成功した側だけを現在のタグに反映した結果（hfを呼ばない）
    pub fn project(&self, current: &TagSet) -> TagSet {
        let mut tags = current.clone();
        if let Some(deleted) = self.delete.applied_tags() {
            tags.retain(|t| !deleted.contains(t));
        }
        if let Some(added) = self.add.applied_tags() {
            tags.extend(added.iter().cloned());
        }
        tags
    }

    /// 片方だけ成功した状態
    pub fn is_partial(&self) -> bool {
        let succeeded = self.add.applied_tags().is_some() || self.delete.applied_tags().is_some();
        succeeded && !self.is_complete()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return write!(f, "変更なし");
        }
        let mut parts = Vec::new();
        for (label, step) in [("add", &self.add), ("del", &self.delete)] {
            match step {
                StepOutcome::Skipped => {}
                StepOutcome::Applied { tags } => parts.push(format!("{} {{{}}}", label, join_tags(tags))),
                StepOutcome::Failed { tags, error } => {
                    parts.push(format!("{} {{{}}} 失敗: {}", label, join_tags(tags), error))
                }
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// 計画をhfへ適用（追加 → 削除の順）
pub fn apply_plan<G: CatalogGateway + ?Sized>(
    gateway: &G,
    id: u64,
    plan: &ReconciliationPlan,
) -> Outcome {
    let add = run_step(&plan.to_add, |tags| gateway.apply_add(id, tags));
    if add.failed() {
        warn!("add_tags failed for id {}, continuing with del_tags", id);
    }
    let delete = run_step(&plan.to_delete, |tags| gateway.apply_delete(id, tags));
    Outcome { add, delete }
}

fn run_step<F>(tags: &TagSet, apply: F) -> StepOutcome
where
    F: FnOnce(&TagSet) -> crate::error::Result<()>,
{
    if tags.is_empty() {
        return StepOutcome::Skipped;
    }
    match apply(tags) {
        Ok(()) => StepOutcome::Applied { tags: tags.clone() },
        Err(e) => StepOutcome::Failed {
            tags: tags.clone(),
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_serve_common::Tag;

    fn tags(names: &[&str]) -> TagSet {
        names.iter().map(|n| Tag::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome {
            add: StepOutcome::Applied { tags: tags(&["blue"]) },
            delete: StepOutcome::Failed { tags: tags(&["cat"]), error: "boom".into() },
        };
        assert_eq!(outcome.to_string(), "add {blue}, del {cat} 失敗: boom");
        assert!(outcome.is_partial());
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_noop_outcome() {
        let outcome = Outcome::noop();
        assert!(outcome.is_noop());
        assert!(outcome.is_complete());
        assert!(!outcome.is_partial());
        assert_eq!(outcome.to_string(), "変更なし");
    }

    #[test]
    fn test_project_applies_only_successful_steps() {
        let outcome = Outcome {
            add: StepOutcome::Failed { tags: tags(&["blue"]), error: "boom".into() },
            delete: StepOutcome::Applied { tags: tags(&["cat"]) },
        };
        assert_eq!(outcome.project(&tags(&["cat", "red"])), tags(&["red"]));
        assert_eq!(Outcome::noop().project(&tags(&["x"])), tags(&["x"]));
    }

    #[test]
    fn test_outcome_serializes_status() {
        let outcome = Outcome {
            add: StepOutcome::Skipped,
            delete: StepOutcome::Applied { tags: tags(&["x"]) },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["add"]["status"], "skipped");
        assert_eq!(json["delete"]["status"], "applied");
        assert_eq!(json["delete"]["tags"][0], "x");
    }
}
