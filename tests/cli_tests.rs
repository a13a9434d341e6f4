use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn quickbill_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("quickbill"))
}

fn init_config(config_path: &std::path::Path) {
    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
}

fn write_customers(config_path: &std::path::Path) {
    fs::write(
        config_path.join("customers.toml"),
        r#"[[customers]]
id = "4a6f1c1e-7a2b-4e61-9d3f-8b1c5e2a9f00"
name = "Acme Corp"
email = "billing@acme.com"
phone = "+1-555-123-4567"
address = "456 Client Avenue, Los Angeles CA"
created_at = "2026-01-01"
"#,
    )
    .unwrap();
}

fn write_coupons(config_path: &std::path::Path, coupons: &str) {
    fs::write(config_path.join("coupons.toml"), coupons).unwrap();
}

fn write_invoices(config_path: &std::path::Path, invoices: &str) {
    fs::write(config_path.join("invoices.toml"), invoices).unwrap();
}

/// One pending 100 USD invoice, no tax, no discount.
const SINGLE_INVOICE: &str = r#"[[invoices]]
id = "11111111-1111-1111-1111-111111111111"
invoice_number = "INV-0001"
project_number = "PRJ-0001"
date = "2026-01-10"
due_date = "2026-02-09"
client_name = "Acme Corp"
currency = "USD"
tax_enabled = false
tax_rate = "0"
discount_amount = "0"
payment_status = "pending"
amount_paid = "0"
created_at = "2026-01-10"
updated_at = "2026-01-10"

[[invoices.items]]
id = "aaaaaaaa-1111-1111-1111-111111111111"
description = "Design work"
kind = "service"
quantity = 1
unit_price = "100"
"#;

const ACTIVE_COUPON: &str = r#"[[coupons]]
id = "22222222-2222-2222-2222-222222222222"
code = "SAVE20"
discount_kind = "percentage"
discount_value = "20"
is_active = true
usage_count = 0
created_at = "2026-01-01"
"#;

#[test]
fn test_help() {
    quickbill_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Small-business invoicing with coupons",
        ));
}

#[test]
fn test_version() {
    quickbill_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quickbill"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized quickbill config"));

    // Check files were created
    assert!(config_path.join("settings.toml").exists());
    assert!(config_path.join("customers.toml").exists());
    assert!(config_path.join("output").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);

    // Second init should fail
    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status_previews_next_numbers() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next invoice:     INV-0001"))
        .stdout(predicate::str::contains("Next project:     PRJ-0001"));

    // Preview must not consume the counter
    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-0001"));
}

#[test]
fn test_new_missing_customer() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "nonexistent",
            "--item",
            "Design work:1:100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Customer 'nonexistent' not found"));
}

#[test]
fn test_new_no_items() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_customers(&config_path);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "Acme Corp",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one line item"));
}

#[test]
fn test_new_invalid_item_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_customers(&config_path);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "Acme Corp",
            "--item",
            "just-a-description",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Expected 'description:quantity:price",
        ));
}

#[test]
fn test_new_reserves_sequential_numbers() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_customers(&config_path);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "Acme Corp",
            "--item",
            "Design work:1:100",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created INV-0001"));

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "Acme Corp",
            "--item",
            "Support:2:75",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created INV-0002"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next invoice:     INV-0003"));
}

#[test]
fn test_failed_draft_does_not_consume_a_number() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_customers(&config_path);

    // Invalid quantity aborts before any counter is touched
    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "Acme Corp",
            "--item",
            "Design work:0:100",
        ])
        .assert()
        .failure();

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next invoice:     INV-0001"));
}

#[test]
fn test_new_with_coupon_applies_discount() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_customers(&config_path);
    write_coupons(&config_path, ACTIVE_COUPON);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "new",
            "--customer",
            "Acme Corp",
            "--item",
            "Design work:1:100",
            "--coupon",
            "save20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coupon:  SAVE20 (-$20.00)"))
        .stdout(predicate::str::contains("Total:   $80.00"));
}

#[test]
fn test_list_shows_status_column() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STATUS"))
        .stdout(predicate::str::contains("INV-0001"))
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("$100.00"));
}

#[test]
fn test_show_by_index_and_by_number() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-0001"))
        .stdout(predicate::str::contains("Total:     $100.00"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show", "inv-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Balance:   $100.00"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid invoice reference"));
}

#[test]
fn test_set_paid_derives_status() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "set-paid", "1", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("partial"))
        .stdout(predicate::str::contains("balance $60.00"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "set-paid", "1", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("paid"))
        .stdout(predicate::str::contains("balance $0.00"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "set-paid", "1", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be negative"));
}

#[test]
fn test_set_status_manual_override_survives_until_next_payment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-status",
            "INV-0001",
            "overdue",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set INV-0001 to overdue"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("overdue"));

    // Recording a payment re-derives the status
    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "set-paid", "1", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("paid"));
}

#[test]
fn test_mark_paid() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "mark-paid", "INV-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked INV-0001 as paid ($100.00)"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show", "INV-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Balance:   $0.00"));
}

#[test]
fn test_apply_and_remove_coupon() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);
    write_coupons(&config_path, ACTIVE_COUPON);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "apply-coupon",
            "1",
            "SAVE20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Applied SAVE20 to INV-0001: -$20.00 (new total $80.00)",
        ));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "remove-coupon", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed coupon from INV-0001"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total:     $100.00"));
}

#[test]
fn test_apply_inactive_coupon_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);
    write_coupons(
        &config_path,
        r#"[[coupons]]
id = "22222222-2222-2222-2222-222222222222"
code = "SAVE20"
discount_kind = "percentage"
discount_value = "20"
is_active = false
usage_count = 3
created_at = "2026-01-01"
"#,
    );

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "apply-coupon",
            "1",
            "SAVE20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid or inactive coupon"));
}

#[test]
fn test_redeem_retires_code_and_issues_replacement() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_coupons(&config_path, ACTIVE_COUPON);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "redeem-coupon",
            "save20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Redeemed SAVE20. Replacement code: SAVE20-0001",
        ));

    // The retired code stays in the list, deactivated
    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "coupons"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SAVE20"))
        .stdout(predicate::str::contains("SAVE20-0001"));

    // The retired code can no longer be redeemed
    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "redeem-coupon",
            "SAVE20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid or inactive coupon"));
}

#[test]
fn test_create_toggle_delete_coupon() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "create-coupon",
            "save20",
            "20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created coupon SAVE20"));

    // Codes are unique case-insensitively
    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "create-coupon",
            "SAVE20",
            "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "toggle-coupon",
            "SAVE20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("SAVE20 is now inactive"));

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "delete-coupon",
            "SAVE20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted coupon SAVE20"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "coupons"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No coupons yet"));
}

#[test]
fn test_convert_falls_back_to_static_rate() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    // Point the rate API somewhere unreachable to force the static table
    quickbill_cmd()
        .env("QUICKBILL_RATE_API", "http://127.0.0.1:1")
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "convert",
            "1",
            "--to",
            "EUR",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("from USD to EUR at rate 0.92"))
        .stdout(predicate::str::contains("approximate static rate"))
        .stdout(predicate::str::contains("New total: \u{20ac}92.00"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "convert", "1", "--to", "EUR"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in EUR"));
}

#[test]
fn test_convert_unknown_currency() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "convert",
            "1",
            "--to",
            "XYZ",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown currency 'XYZ'"));
}

#[test]
fn test_delete_invoice() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);
    write_invoices(&config_path, SINGLE_INVOICE);

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "delete", "INV-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted INV-0001"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No invoices yet"));
}

#[test]
fn test_customers_add_list_delete() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quickbill-config");

    init_config(&config_path);

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-customer",
            "Acme Corp",
            "--email",
            "billing@acme.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added customer 'Acme Corp'"));

    quickbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "customers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Corp"))
        .stdout(predicate::str::contains("billing@acme.com"));

    quickbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "delete-customer",
            "acme corp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed customer 'Acme Corp'"));
}
