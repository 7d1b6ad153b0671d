use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hf-serve")]
#[command(about = "hf画像カタログのタグ付けブラウザ", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// hfコマンドのタイムアウト秒（設定より優先）
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 全タグを表示
    Tags,

    /// タグで画像を検索
    Search {
        /// 検索タグ（AND条件）
        tags: Vec<String>,

        /// シャッフル順で表示（タグ省略時は全画像）
        #[arg(short, long)]
        random: bool,
    },

    /// 画像の詳細を表示
    Show {
        /// 画像参照（パス/URL）
        #[arg(required = true)]
        reference: String,
    },

    /// 画像のタグを編集（差分だけ追加/削除）
    Tag {
        /// 画像参照（パス/URL）
        #[arg(required = true)]
        reference: String,

        /// 編集後のタグ（省略時は現在のタグ）
        tags: Vec<String>,

        /// 追加するタグ
        #[arg(short, long = "add")]
        add: Vec<String>,

        /// 削除するタグ
        #[arg(short, long = "del")]
        del: Vec<String>,

        /// ドライラン（差分を表示するだけ）
        #[arg(long)]
        dry_run: bool,
    },

    /// 画像を論理削除（タグを removed のみにする）
    Remove {
        #[arg(required = true)]
        reference: String,
    },

    /// 画像をカタログから完全に削除
    Delete {
        #[arg(required = true)]
        reference: String,

        /// 確認せずに削除
        #[arg(short, long)]
        yes: bool,
    },

    /// 対話式でブラウズ・タグ編集
    Browse {
        /// 初期の検索タグ
        tags: Vec<String>,

        /// シャッフル順で表示
        #[arg(short, long)]
        random: bool,
    },

    /// 設定を表示/編集
    Config {
        /// hfコマンドを設定
        #[arg(long)]
        set_hf: Option<String>,

        /// タイムアウト秒を設定
        #[arg(long)]
        set_timeout: Option<u64>,

        /// キャッシュTTL秒を設定
        #[arg(long)]
        set_ttl: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_command() {
        let cli = Cli::try_parse_from([
            "hf-serve", "tag", "/a.jpg", "red", "blue", "-a", "sky", "--del", "cat", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Tag { reference, tags, add, del, dry_run } => {
                assert_eq!(reference, "/a.jpg");
                assert_eq!(tags, vec!["red", "blue"]);
                assert_eq!(add, vec!["sky"]);
                assert_eq!(del, vec!["cat"]);
                assert!(dry_run);
            }
            _ => panic!("tag command expected"),
        }
    }

    #[test]
    fn test_parse_search_random_without_tags() {
        let cli = Cli::try_parse_from(["hf-serve", "--timeout", "3", "search", "-r"]).unwrap();
        assert_eq!(cli.timeout, Some(3));
        match cli.command {
            Commands::Search { tags, random } => {
                assert!(tags.is_empty());
                assert!(random);
            }
            _ => panic!("search command expected"),
        }
    }

    #[test]
    fn test_show_requires_reference() {
        assert!(Cli::try_parse_from(["hf-serve", "show"]).is_err());
    }
}
