use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_cart_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let db_path = dir.path().join("state");

    Command::new(cargo_bin!("storefront"))
        .args(["cart", "add", "p1", "Mug", "12.50", "--quantity", "2", "--db-path"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "cart_id,product_id,name,price,quantity,line_total",
        ))
        .stdout(predicate::str::contains(",p1,Mug,12.5,2,25"));

    Command::new(cargo_bin!("storefront"))
        .args(["cart", "add", "p1", "Mug", "12.50", "--db-path"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains(",p1,Mug,12.5,3,37.5"));

    Command::new(cargo_bin!("storefront"))
        .args(["cart", "clear", "--db-path"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("p1").not());

    Ok(())
}

#[test]
fn test_cli_business_view_refuses_add() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state");

    Command::new(cargo_bin!("storefront"))
        .args(["session", "login", "--token", "t", "--view", "business", "--db-path"])
        .arg(&db_path)
        .assert()
        .success();

    Command::new(cargo_bin!("storefront"))
        .args(["cart", "add", "p1", "Mug", "3", "--db-path"])
        .arg(&db_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("business view"));
}

#[test]
fn test_cli_notifications_logged_out() {
    Command::new(cargo_bin!("storefront"))
        .args(["notifications", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 unread"))
        .stderr(predicate::str::contains("notifications unavailable").not());
}

#[test]
fn test_cli_notifications_backend_down() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state");

    Command::new(cargo_bin!("storefront"))
        .args(["session", "login", "--token", "t", "--db-path"])
        .arg(&db_path)
        .assert()
        .success();

    Command::new(cargo_bin!("storefront"))
        .args(["notifications", "list", "--api-url", "http://127.0.0.1:9", "--db-path"])
        .arg(&db_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("notifications unavailable"));
}
