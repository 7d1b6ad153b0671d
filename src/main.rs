use clap::Parser;
use hf_serve::{browse, cli, config, error};
use hf_serve::{Catalog, HfCli};
use cli::{Cli, Commands};
use config::Config;
use dialoguer::Confirm;
use error::Result;
use hf_serve_common::{display_position, join_tags, parse_tag_input_for, Filter, ReconciliationPlan, Tag};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let mut config = Config::load()?;

    // --timeout はこの実行だけに適用（保存しない）
    let mut runtime = config.clone();
    if let Some(seconds) = cli.timeout {
        runtime.timeout_seconds = seconds;
    }
    let gateway = HfCli::from_config(&runtime);
    let catalog = Catalog::new(gateway, runtime.cache_ttl()).with_removed_tag(runtime.removed_tag()?);

    match cli.command {
        Commands::Tags => {
            for tag in catalog.list_tags()? {
                println!("{}", tag);
            }
        }

        Commands::Search { tags, random } => {
            let filter = Filter::parse(&tags.join(" "), random)?;
            if filter.is_empty() {
                return Err(error::HfServeError::EmptyFilter);
            }
            let images = catalog.search(&filter)?;
            if images.is_empty() {
                println!("⚠ No Images for `{}`", filter);
                return Ok(());
            }
            println!("{} Images for `{}`", images.len(), filter);
            for index in 1..=images.len() {
                if let Some(position) = display_position(index, images.len(), filter.shuffle) {
                    println!("{}", images[position]);
                }
            }
        }

        Commands::Show { reference } => match catalog.get_detail(&reference) {
            Ok(detail) => println!("{}", browse::format_detail(&detail)),
            Err(e) if e.is_not_found() => println!("⚠ {}", e),
            Err(e) => return Err(e),
        },

        Commands::Tag { reference, tags, add, del, dry_run } => {
            let current = match catalog.get_detail(&reference) {
                Ok(detail) => detail,
                Err(e) if e.is_not_found() => {
                    println!("⚠ {}", e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            let mut proposed = if tags.is_empty() {
                current.tags.clone()
            } else {
                parse_tag_input_for(&tags.join(" "), &current.tags)?
            };
            for tag in add {
                proposed.insert(Tag::new(tag)?);
            }
            for tag in &del {
                proposed.remove(tag.as_str());
            }

            if dry_run {
                let plan = ReconciliationPlan::for_image(&current, &proposed);
                println!("add: {}", join_tags(&plan.to_add));
                println!("del: {}", join_tags(&plan.to_delete));
                return Ok(());
            }

            let report = catalog.reconcile_and_apply(&reference, &proposed)?;
            for line in browse::format_report(&report) {
                println!("{}", line);
            }
            if let Some(detail) = &report.detail {
                println!("{}", browse::format_detail(detail));
            }
        }

        Commands::Remove { reference } => {
            let report = catalog.remove(&reference)?;
            for line in browse::format_report(&report) {
                println!("{}", line);
            }
        }

        Commands::Delete { reference, yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("{} を完全に削除しますか?", reference))
                    .default(false)
                    .interact()?;
            if !confirmed {
                println!("中止しました");
                return Ok(());
            }
            // 削除済みでも失敗扱いにせず警告だけ表示
            match catalog.delete(&reference) {
                Ok(()) => println!("✔ 削除しました: {}", reference),
                Err(e) => println!("⚠ {}", e),
            }
        }

        Commands::Browse { tags, random } => {
            let filter = Filter::parse(&tags.join(" "), random)?;
            browse::run_browse(&catalog, filter)?;
        }

        Commands::Config { set_hf, set_timeout, set_ttl, show } => {
            if let Some(command) = set_hf {
                config.set_hf_command(command)?;
                println!("✔ hfコマンドを設定しました");
            }
            if let Some(seconds) = set_timeout {
                config.set_timeout(seconds)?;
                println!("✔ タイムアウトを設定しました");
            }
            if let Some(seconds) = set_ttl {
                config.set_cache_ttl(seconds)?;
                println!("✔ キャッシュTTLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  hfコマンド: {} {}", config.hf_command(), config.hf_args.join(" "));
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  キャッシュTTL: {}秒", config.cache_ttl_seconds);
                println!("  論理削除タグ: {}", config.removed_tag);
            }
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
