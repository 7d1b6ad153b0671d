//! hf-serve Common Library
//!
//! 外部プロセスに依存しない型とロジック（タグ差分・出力パース・表示位置）

pub mod error;
pub mod parser;
pub mod reconcile;
pub mod types;
pub mod view;

pub use error::{Error, Result};
pub use parser::{parse_detail, parse_reference_lines, parse_tag_list, reports_unknown_object};
pub use reconcile::{
    new_tags, parse_tag_input, parse_tag_input_for, plan, removal_plan, ReconciliationPlan, REMOVED_TAG,
};
pub use types::{join_tags, parse_tags, validate_reference, Filter, ImageRecord, Tag, TagSet};
pub use view::{clamp_index, display_position};
