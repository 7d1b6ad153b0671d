//! 統合テスト用のメモリ上のhf
//!
//! 呼び出しを記録し、失敗を注入できる。

#![allow(dead_code)]

use hf_serve::{CatalogGateway, HfServeError, Result};
use hf_serve_common::{ImageRecord, Tag, TagSet};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTags,
    Search(Vec<String>),
    ListAll,
    Detail(String),
    Add(u64, Vec<String>),
    Delete(u64, Vec<String>),
    Remove(String),
}

#[derive(Default)]
pub struct FakeGateway {
    images: RefCell<BTreeMap<String, ImageRecord>>,
    calls: RefCell<Vec<Call>>,
    pub fail_add: Cell<bool>,
    pub fail_delete: Cell<bool>,
    pub fail_search: Cell<bool>,
    /// 変更系の呼び出し後は詳細取得を失敗させる
    pub fail_refetch: Cell<bool>,
}

pub fn tags(names: &[&str]) -> TagSet {
    names.iter().map(|n| Tag::new(*n).unwrap()).collect()
}

fn names(tags: &TagSet) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, reference: &str, id: u64, tag_names: &[&str]) -> Self {
        self.images.borrow_mut().insert(
            reference.to_string(),
            ImageRecord {
                id,
                location: reference.to_string(),
                tags: tags(tag_names),
                ..Default::default()
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count<F: Fn(&Call) -> bool>(&self, predicate: F) -> usize {
        self.calls.borrow().iter().filter(|c| predicate(*c)).count()
    }

    /// 変更系の呼び出し回数
    pub fn mutation_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Add(..) | Call::Delete(..) | Call::Remove(_)))
    }

    pub fn tags_of(&self, reference: &str) -> TagSet {
        self.images
            .borrow()
            .get(reference)
            .map(|r| r.tags.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn update_by_id<F: FnOnce(&mut ImageRecord)>(&self, id: u64, update: F) -> Result<()> {
        let mut images = self.images.borrow_mut();
        match images.values_mut().find(|r| r.id == id) {
            Some(record) => {
                update(record);
                Ok(())
            }
            None => Err(HfServeError::Gateway(format!("unknown id {}", id))),
        }
    }
}

impl CatalogGateway for FakeGateway {
    fn list_all_tags(&self) -> Result<Vec<Tag>> {
        self.record(Call::ListTags);
        let all: TagSet = self
            .images
            .borrow()
            .values()
            .flat_map(|r| r.tags.iter().cloned())
            .collect();
        Ok(all.into_iter().collect())
    }

    fn search_by_tags(&self, filter: &[Tag]) -> Result<Vec<String>> {
        self.record(Call::Search(filter.iter().map(|t| t.to_string()).collect()));
        if self.fail_search.get() {
            return Err(HfServeError::Gateway("grep failed".into()));
        }
        Ok(self
            .images
            .borrow()
            .iter()
            .filter(|(_, r)| filter.iter().all(|t| r.tags.contains(t)))
            .map(|(reference, _)| reference.clone())
            .collect())
    }

    fn list_all_images(&self) -> Result<Vec<String>> {
        self.record(Call::ListAll);
        Ok(self.images.borrow().keys().cloned().collect())
    }

    fn get_detail(&self, reference: &str) -> Result<Option<ImageRecord>> {
        self.record(Call::Detail(reference.to_string()));
        if self.fail_refetch.get() && self.mutation_count() > 0 {
            return Err(HfServeError::GatewayTimeout { command: "hf show".into(), seconds: 10 });
        }
        Ok(self.images.borrow().get(reference).cloned())
    }

    fn apply_add(&self, id: u64, tags: &TagSet) -> Result<()> {
        self.record(Call::Add(id, names(tags)));
        if self.fail_add.get() {
            return Err(HfServeError::Gateway("add failed".into()));
        }
        self.update_by_id(id, |r| r.tags.extend(tags.iter().cloned()))
    }

    fn apply_delete(&self, id: u64, tags: &TagSet) -> Result<()> {
        self.record(Call::Delete(id, names(tags)));
        if self.fail_delete.get() {
            return Err(HfServeError::Gateway("del failed".into()));
        }
        self.update_by_id(id, |r| r.tags.retain(|t| !tags.contains(t)))
    }

    fn delete_image(&self, reference: &str) -> Result<()> {
        self.record(Call::Remove(reference.to_string()));
        match self.images.borrow_mut().remove(reference) {
            Some(_) => Ok(()),
            None => Err(HfServeError::Gateway(format!("unknown object: {}", reference))),
        }
    }
}
