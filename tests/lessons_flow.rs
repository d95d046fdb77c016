mod test_support;

use serde_json::json;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

// 2026-03-16 is a Monday.
const MONDAY: &str = "2026-03-16";

fn create(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    name: &str,
    start: &str,
    amount: serde_json::Value,
) -> String {
    let res = request_ok(
        stdin,
        reader,
        id,
        "sessions.create",
        json!({ "input": {
            "name": name,
            "phone": "555-0100",
            "day": "Monday",
            "startTime": start,
            "endTime": "23:00",
            "paymentAmount": amount
        }}),
    );
    res["sessionId"].as_str().expect("sessionId").to_string()
}

#[test]
fn taught_then_paid_moves_one_record_through_the_views() {
    let workspace = temp_dir("clientpay-lessons");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    let ada = create(&mut stdin, &mut reader, "1", "Ada", "16:00", json!("40"));
    let bob = create(&mut stdin, &mut reader, "2", "Bob", "09:30", json!("25.5"));

    let today = request_ok(&mut stdin, &mut reader, "3", "today.view", json!({ "today": MONDAY }));
    let upcoming: Vec<&str> = today["upcoming"]
        .as_array()
        .expect("upcoming")
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(upcoming, vec!["Bob", "Ada"]);
    assert_eq!(today["totalPending"], json!(0.0));

    let taught = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "lessons.markTaught",
        json!({ "sessionId": ada, "today": MONDAY }),
    );
    assert_eq!(taught["date"], json!(MONDAY));
    assert_eq!(taught["alreadyRecorded"], json!(false));
    let record_id = taught["recordId"].as_str().expect("recordId").to_string();

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "lessons.markTaught",
        json!({ "sessionId": ada, "date": MONDAY }),
    );
    assert_eq!(again["alreadyRecorded"], json!(true));
    assert_eq!(again["recordId"], json!(record_id));

    let today = request_ok(&mut stdin, &mut reader, "6", "today.view", json!({ "today": MONDAY }));
    assert_eq!(today["upcoming"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(today["upcoming"][0]["id"], json!(bob));
    let awaiting = today["awaitingPayment"].as_array().expect("awaiting");
    assert_eq!(awaiting.len(), 1);
    assert_eq!(awaiting[0]["clientName"], json!("Ada"));
    assert_eq!(awaiting[0]["status"], json!("taught"));
    assert_eq!(today["totalPending"], json!(40.0));

    let paid = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "lessons.markPaid",
        json!({ "recordId": record_id }),
    );
    assert_eq!(paid["changed"], json!(true));
    let paid = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "lessons.markPaid",
        json!({ "recordId": record_id }),
    );
    assert_eq!(paid["changed"], json!(false));

    let history = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "history.view",
        json!({ "today": MONDAY }),
    );
    let rows = history["paidHistory"].as_array().expect("paid");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(record_id));
    assert_eq!(history["totalEarned"], json!(40.0));

    let stats = request_ok(&mut stdin, &mut reader, "10", "stats.get", json!({ "today": MONDAY }));
    assert_eq!(stats["totalClients"], json!(2));
    assert_eq!(stats["totalPending"], json!(0.0));
    assert_eq!(stats["totalEarned"], json!(40.0));

    // Still processed today, so it does not come back to upcoming.
    let today = request_ok(&mut stdin, &mut reader, "11", "today.view", json!({ "today": MONDAY }));
    assert_eq!(today["upcoming"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(today["awaitingPayment"], json!([]));
}

#[test]
fn history_delete_needs_confirmation_and_survives_session_delete() {
    let workspace = temp_dir("clientpay-history-delete");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    let ada = create(&mut stdin, &mut reader, "1", "Ada", "10:00", json!(30));

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "lessons.markTaught",
        json!({ "sessionId": ada, "date": "2026-03-09" }),
    );
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "lessons.markTaught",
        json!({ "sessionId": ada, "date": MONDAY }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "sessions.delete",
        json!({ "sessionId": ada, "confirmed": true }),
    );

    // History outlives the session and still counts.
    let stats = request_ok(&mut stdin, &mut reader, "5", "stats.get", json!({ "today": MONDAY }));
    assert_eq!(stats["totalClients"], json!(0));
    assert_eq!(stats["totalPending"], json!(60.0));

    let first_id = first["recordId"].as_str().expect("recordId");
    let resp = request(
        &mut stdin,
        &mut reader,
        "6",
        "history.delete",
        json!({ "recordId": first_id }),
    );
    assert_eq!(error_code(&resp), "confirmation_required");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "history.delete",
        json!({ "recordId": first_id, "confirmed": true }),
    );
    let today = request_ok(&mut stdin, &mut reader, "8", "today.view", json!({ "today": MONDAY }));
    let awaiting = today["awaitingPayment"].as_array().expect("awaiting");
    assert_eq!(awaiting.len(), 1);
    assert_eq!(awaiting[0]["id"], second["recordId"]);
    assert_eq!(today["totalPending"], json!(30.0));
}

#[test]
fn marking_unknown_ids_reports_not_found() {
    let workspace = temp_dir("clientpay-lessons-missing");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "lessons.markTaught",
        json!({ "sessionId": "ghost", "today": MONDAY }),
    );
    assert_eq!(error_code(&resp), "not_found");
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "lessons.markPaid",
        json!({ "recordId": "ghost" }),
    );
    assert_eq!(error_code(&resp), "not_found");
    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "lessons.markTaught",
        json!({ "sessionId": "ghost", "date": "16/03/2026" }),
    );
    assert_eq!(error_code(&resp), "bad_params");
}
