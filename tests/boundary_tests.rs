use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

fn storefront(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin!("storefront"));
    cmd.env("STOREFRONT_SESSION_FILE", dir.path().join("chat-session"));
    cmd.env_remove("CHAT_ENDPOINT");
    cmd.env_remove("STOREFRONT_BACKEND_URL");
    cmd.env_remove("STOREFRONT_ANON_KEY");
    cmd
}

#[test]
fn test_chat_trigger_lists_the_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.csv");
    common::write_catalog_csv(
        &catalog,
        &[("p1", "무지 토트백", "49.99"), ("p2", "숄더 스트랩", "10.00")],
    )
    .unwrap();

    storefront(&dir)
        .arg("--catalog")
        .arg(&catalog)
        .args(["chat", "테스트"])
        .assert()
        .success()
        .stdout(predicate::str::contains("무지 토트백"))
        .stdout(predicate::str::contains("숄더 스트랩"));
}

#[test]
fn test_chat_trigger_on_an_empty_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.csv");
    common::write_catalog_csv(&catalog, &[]).unwrap();

    storefront(&dir)
        .arg("--catalog")
        .arg(&catalog)
        .args(["chat", "테스트"])
        .assert()
        .success()
        .stdout(predicate::str::contains("등록된 상품이 없습니다."));
}

#[test]
fn test_checkout_settles_through_the_simulated_redirect() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.csv");
    common::write_catalog_csv(
        &catalog,
        &[("p1", "무지 토트백", "49.99"), ("p2", "숄더 스트랩", "10.00")],
    )
    .unwrap();

    storefront(&dir)
        .arg("--catalog")
        .arg(&catalog)
        .args(["checkout", "--item", "p1:2", "--item", "p2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("결제완료"))
        .stdout(predicate::str::contains("외 1건"))
        .stdout(predicate::str::contains("110"));
}

#[test]
fn test_cancelled_checkout_reports_a_failed_order() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.csv");
    common::write_catalog_csv(&catalog, &[("p1", "무지 토트백", "49.99")]).unwrap();

    storefront(&dir)
        .arg("--catalog")
        .arg(&catalog)
        .args(["checkout", "--item", "p1", "--outcome", "cancel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("결제가 취소되었습니다."))
        .stdout(predicate::str::contains("결제실패"));
}

#[test]
fn test_reconcile_refuses_a_return_url_without_an_order_id() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.csv");
    common::write_catalog_csv(&catalog, &[("p1", "무지 토트백", "49.99")]).unwrap();

    storefront(&dir)
        .arg("--catalog")
        .arg(&catalog)
        .args(["reconcile", "/payment/success?paymentKey=pay_k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("유효하지 않은 결제 요청입니다."));
}
