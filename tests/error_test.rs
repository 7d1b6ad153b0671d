//! エラーケーステスト
//!
//! 不正な入力・hfの失敗に対するエラーハンドリングを検証

mod common;

use common::FakeGateway;
use hf_serve::error::HfServeError;
use hf_serve::{Catalog, Session};
use hf_serve_common::{Filter, Tag};
use std::time::Duration;

/// HfServeErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        HfServeError::Config("テスト設定エラー".to_string()),
        HfServeError::Gateway("exit status 2".to_string()),
        HfServeError::GatewayTimeout { command: "hf tags".to_string(), seconds: 10 },
        HfServeError::NotFound("/a.jpg".to_string()),
        HfServeError::EmptyFilter,
        HfServeError::Prompt("not a terminal".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// タイムアウトのメッセージにコマンドと秒数が含まれる
#[test]
fn test_timeout_message() {
    let err = HfServeError::GatewayTimeout { command: "hf grep cat".to_string(), seconds: 3 };
    let display = format!("{}", err);

    assert!(display.contains("hf grep cat"));
    assert!(display.contains('3'));
    assert!(err.is_gateway());
    assert!(!err.is_not_found());
}

/// エラーのDebug実装確認
#[test]
fn test_error_debug() {
    let err = HfServeError::NotFound("テスト.jpg".to_string());
    let debug = format!("{:?}", err);

    assert!(debug.contains("NotFound"));
    assert!(debug.contains("テスト.jpg"));
}

/// エラー分類
#[test]
fn test_error_classification() {
    assert!(HfServeError::Gateway("x".into()).is_gateway());
    assert!(HfServeError::NotFound("x".into()).is_not_found());
    assert!(!HfServeError::NotFound("x".into()).is_gateway());
    assert!(!HfServeError::EmptyFilter.is_gateway());
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: HfServeError = io_err.into();

    assert!(matches!(err, HfServeError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: HfServeError = json_err.into();

    assert!(matches!(err, HfServeError::JsonParse(_)));
}

/// common::Errorからの変換（透過的エラー）
#[test]
fn test_common_error_conversion() {
    let common_err = Tag::new("two words").unwrap_err();
    let err: HfServeError = common_err.into();

    assert!(matches!(err, HfServeError::Common(_)));
    assert!(format!("{}", err).contains("two words"));
}

/// `-` 始まりの参照はhfを呼ばずに拒否
#[test]
fn test_option_like_reference_rejected() {
    let catalog = Catalog::new(FakeGateway::new(), Duration::from_secs(300));

    let err = catalog.get_detail("--all").unwrap_err();
    assert!(matches!(err, HfServeError::Common(_)));
    assert!(catalog.gateway().calls().is_empty());
}

/// 検索失敗はキャッシュされず、次回は再度呼び出す
#[test]
fn test_search_failure_not_cached() {
    let gateway = FakeGateway::new().with_image("/a.jpg", 1, &["cat"]);
    gateway.fail_search.set(true);
    let catalog = Catalog::new(gateway, Duration::from_secs(300));
    let filter = Filter::parse("cat", false).unwrap();

    assert!(catalog.search(&filter).unwrap_err().is_gateway());

    catalog.gateway().fail_search.set(false);
    assert_eq!(catalog.search(&filter).unwrap(), vec!["/a.jpg"]);
}

/// 検索条件が無い状態での再読み込み
#[test]
fn test_refresh_without_filter() {
    let catalog = Catalog::new(FakeGateway::new(), Duration::from_secs(300));
    let mut session = Session::new();

    let err = session.refresh(&catalog).unwrap_err();
    assert!(matches!(err, HfServeError::EmptyFilter));
}
