//! 対話式ブラウザ
//!
//! タグで絞り込み、1枚ずつ詳細を表示してタグを編集する。
//! エラーは警告として表示し、セッションは継続する。

use crate::catalog::{Catalog, ReconcileReport};
use crate::error::Result;
use crate::gateway::CatalogGateway;
use crate::session::Session;
use dialoguer::{Confirm, Input, Select};
use hf_serve_common::{join_tags, parse_tag_input_for, Filter, ImageRecord};
use log::warn;

/// 全画像を対象にする入力
const ALL_IMAGES_INPUT: &str = "*";

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseAction {
    Next,
    Prev,
    Jump,
    EditTags,
    Remove,
    Delete,
    ToggleShuffle,
    ChangeFilter,
    Quit,
}

impl BrowseAction {
    pub const ALL: [BrowseAction; 9] = [
        BrowseAction::Next,
        BrowseAction::Prev,
        BrowseAction::Jump,
        BrowseAction::EditTags,
        BrowseAction::Remove,
        BrowseAction::Delete,
        BrowseAction::ToggleShuffle,
        BrowseAction::ChangeFilter,
        BrowseAction::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BrowseAction::Next => "次へ",
            BrowseAction::Prev => "前へ",
            BrowseAction::Jump => "番号を指定",
            BrowseAction::EditTags => "タグを編集",
            BrowseAction::Remove => "removed にする（論理削除）",
            BrowseAction::Delete => "完全に削除",
            BrowseAction::ToggleShuffle => "シャッフル切替",
            BrowseAction::ChangeFilter => "検索条件を変更",
            BrowseAction::Quit => "終了",
        }
    }
}

/// 検索条件の入力を解釈
///
/// 空欄は `None`（終了）、`*` は全画像シャッフル。
pub fn parse_filter_input(input: &str, shuffle: bool) -> Result<Option<Filter>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed == ALL_IMAGES_INPUT {
        return Ok(Some(Filter::new(Vec::new(), true)));
    }
    Ok(Some(Filter::parse(trimmed, shuffle)?))
}

/// 詳細を表示用に整形
pub fn format_detail(record: &ImageRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|_| format!("{:?}", record))
}

/// タグ編集結果を表示用に整形
pub fn format_report(report: &ReconcileReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.new_tags.is_empty() {
        lines.push(format!("新規タグ: {}", join_tags(&report.new_tags)));
    }
    lines.push(report.outcome.to_string());
    if let Some(warning) = &report.warning {
        lines.push(format!("⚠ {}", warning));
    }
    lines
}

/// 対話式ブラウズを実行
pub fn run_browse<G: CatalogGateway>(catalog: &Catalog<G>, initial: Filter) -> Result<()> {
    let mut session = Session::new();
    session.set_filter(initial);

    loop {
        // 検索条件
        let Some(filter) = session.state().filter().cloned() else {
            match prompt_filter(catalog, false)? {
                Some(filter) => session.set_filter(filter),
                None => break,
            }
            continue;
        };

        // 検索結果
        let count = match session.refresh(catalog) {
            Ok(results) => results.len(),
            Err(e) => {
                println!("⚠ {}", e);
                session.set_filter(Filter::default());
                continue;
            }
        };
        if count == 0 {
            println!("⚠ `{}` の画像はありません", filter);
            session.set_filter(Filter::default());
            continue;
        }

        // 詳細
        if session.state().index().is_none() {
            if let Err(e) = session.select(1, catalog) {
                println!("⚠ {}", e);
            }
        }
        if session.take_dirty() {
            render(&session, &filter, count);
        }

        let action = prompt_action()?;
        if let Err(e) = handle_action(action, &mut session, catalog, &filter, count) {
            warn!("{:?} failed: {}", action, e);
            println!("⚠ {}", e);
        }
        if action == BrowseAction::Quit {
            break;
        }
    }

    println!("終了します");
    Ok(())
}

fn handle_action<G: CatalogGateway>(
    action: BrowseAction,
    session: &mut Session,
    catalog: &Catalog<G>,
    filter: &Filter,
    count: usize,
) -> Result<()> {
    match action {
        BrowseAction::Next => {
            session.next(catalog)?;
        }
        BrowseAction::Prev => {
            session.prev(catalog)?;
        }
        BrowseAction::Jump => {
            let index: usize = Input::new()
                .with_prompt(format!("番号 [1-{}]", count))
                .default(session.state().index().unwrap_or(1))
                .interact_text()?;
            if index > count {
                println!("⚠ Out of Index");
            }
            session.select(index, catalog)?;
        }
        BrowseAction::EditTags => {
            let current = session
                .state()
                .detail()
                .map(|d| d.tags.clone())
                .unwrap_or_default();
            let input: String = Input::new()
                .with_prompt("tags")
                .with_initial_text(join_tags(&current))
                .allow_empty(true)
                .interact_text()?;
            let proposed = parse_tag_input_for(&input, &current)?;
            let report = session.edit_tags(&proposed, catalog)?;
            for line in format_report(&report) {
                println!("  → {}", line);
            }
        }
        BrowseAction::Remove => {
            let report = session.remove_current(catalog)?;
            for line in format_report(&report) {
                println!("  → {}", line);
            }
        }
        BrowseAction::Delete => {
            let reference = session.state().reference().unwrap_or_default().to_string();
            let confirmed = Confirm::new()
                .with_prompt(format!("{} を完全に削除しますか?", reference))
                .default(false)
                .interact()?;
            if confirmed {
                let index = session.state().index().unwrap_or(1);
                session.delete_current(catalog)?;
                println!("  → 削除しました: {}", reference);
                if !session.state().has_no_results() {
                    session.select(index, catalog)?;
                }
            }
        }
        BrowseAction::ToggleShuffle => {
            let mut toggled = filter.clone();
            toggled.shuffle = !toggled.shuffle;
            if toggled.is_empty() {
                // タグ無しの全画像表示はシャッフルのみ
                println!("⚠ 全画像表示ではシャッフルを解除できません");
            } else {
                println!("  → シャッフル: {}", if toggled.shuffle { "ON" } else { "OFF" });
                session.set_filter(toggled);
            }
        }
        BrowseAction::ChangeFilter => {
            match prompt_filter(catalog, filter.shuffle)? {
                Some(filter) => session.set_filter(filter),
                None => session.set_filter(Filter::default()),
            }
        }
        BrowseAction::Quit => {}
    }
    Ok(())
}

fn render(session: &Session, filter: &Filter, count: usize) {
    let state = session.state();
    println!("\n{} Images for `{}`", count, filter);
    if let (Some(index), Some(reference)) = (state.index(), state.reference()) {
        println!("[{}/{}] {}", index, count, reference);
        match state.detail() {
            Some(detail) => println!("{}", format_detail(detail)),
            None => println!("⚠ 詳細が見つかりません"),
        }
    }
}

fn prompt_filter<G: CatalogGateway>(catalog: &Catalog<G>, shuffle: bool) -> Result<Option<Filter>> {
    // 既存タグを候補として表示
    match catalog.list_tags() {
        Ok(tags) if !tags.is_empty() => println!("  候補: {}", join_tags(&tags)),
        Ok(_) => {}
        Err(e) => println!("⚠ タグ一覧を取得できません: {}", e),
    }

    loop {
        let input: String = Input::new()
            .with_prompt("Filtering by Tags (*: 全画像, 空欄: 終了)")
            .allow_empty(true)
            .interact_text()?;
        match parse_filter_input(&input, shuffle) {
            Ok(filter) => return Ok(filter),
            Err(e) => println!("⚠ {}", e),
        }
    }
}

fn prompt_action() -> Result<BrowseAction> {
    let labels: Vec<&str> = BrowseAction::ALL.iter().map(BrowseAction::label).collect();
    let selected = Select::new()
        .with_prompt("操作")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(BrowseAction::ALL[selected])
}
