//! End-to-end checks of the `lopt` commands that need no live store.
mod common;

use common::{stderr, stdout, Workspace};
use serde_json::{json, Value};

#[test]
fn init_writes_stub_and_refuses_to_clobber() {
    let ws = Workspace::new();

    let first = ws.lopt(&["init"]);
    assert!(first.status.success(), "{}", stderr(&first));
    assert!(stdout(&first).contains("LOPT_STORE_KEY"));

    let stub = ws.read_json("lopt.json");
    assert_eq!(stub["schema_version"], 1);
    assert_eq!(stub["rewrite"]["models"], json!(["gemini-1.5-flash"]));
    assert_eq!(stub["state"]["pages_file"], "pages.json");

    let second = ws.lopt(&["init"]);
    assert!(!second.status.success());
    assert!(stderr(&second).contains("--force"), "{}", stderr(&second));

    let forced = ws.lopt(&["init", "--force"]);
    assert!(forced.status.success(), "{}", stderr(&forced));
}

#[test]
fn status_reads_state_without_credentials() {
    let ws = Workspace::new();
    assert!(ws.lopt(&["init"]).status.success());
    ws.write_json("pages.json", &json!({ "page_ids": [1, 2] }));
    ws.write_json("products.json", &json!({ "product_ids": [101] }));
    ws.write_json(
        "logs.json",
        &json!([
            {
                "timestamp": "2026-01-01T00:00:00.000000+00:00",
                "message": "7 >> update failed: HTTP 500"
            },
            {
                "timestamp": "2026-01-02T00:00:00.000000+00:00",
                "message": "8 >> schema failed: missing"
            }
        ]),
    );

    let output = ws.lopt(&["status", "--json", "--recent", "1"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let summary: Value = serde_json::from_str(&stdout(&output)).expect("status JSON");
    assert_eq!(summary["processed_pages"], json!([1, 2]));
    assert_eq!(summary["processed_products"], json!([101]));
    assert_eq!(summary["error_count"], 2);
    assert_eq!(
        summary["recent_errors"][0]["message"],
        "8 >> schema failed: missing"
    );

    let text = ws.lopt(&["status"]);
    assert!(text.status.success(), "{}", stderr(&text));
    assert!(stdout(&text).contains("pages processed: 2 (1, 2)"));
}

#[test]
fn processed_page_is_skipped_without_contacting_the_store() {
    let ws = Workspace::new();
    ws.write_config("ck_test");
    ws.write_json("pages.json", &json!({ "page_ids": [1] }));

    let output = ws.lopt(&["run", "--page", "1", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("Product page 1 was already processed"));

    let report: Value = serde_json::from_str(&stdout(&output)).expect("report JSON");
    assert_eq!(report, json!({ "page": 1, "status": "already_processed" }));
    assert_eq!(ws.read_json("pages.json"), json!({ "page_ids": [1] }));
    assert!(!ws.root().join("logs.json").exists());
}

#[test]
fn processed_product_is_skipped_without_contacting_the_store() {
    let ws = Workspace::new();
    ws.write_config("ck_test");
    ws.write_json("products.json", &json!({ "product_ids": [42] }));

    let output = ws.lopt(&["product", "--id", "42"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("product 42: already processed"));
}

#[test]
fn unknown_model_is_rejected_before_any_call() {
    let ws = Workspace::new();
    ws.write_config("ck_test");

    let output = ws.lopt(&["run", "--page", "1", "--model", "gpt-4"]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("not in rewrite.models"),
        "{}",
        stderr(&output)
    );
    assert!(!ws.root().join("pages.json").exists());
}

#[test]
fn missing_credentials_fail_for_store_commands() {
    let ws = Workspace::new();
    ws.write_config("");

    let output = ws.lopt(&["run", "--page", "1"]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("store.consumer_key"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn page_zero_is_rejected_by_the_parser() {
    let ws = Workspace::new();
    ws.write_config("ck_test");

    let output = ws.lopt(&["run", "--page", "0"]);
    assert!(!output.status.success());
}
