use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;

use ledgerdesk::{
    dataset::Dataset,
    grn::{GrnField, GrnForm},
    listing::ListPage,
    repo::{InMemory, Repository},
    route::Route,
};

fn ledgerdesk(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ledgerdesk"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("\n Can't execute ledgerdesk")
}

fn json(args: &[&str]) -> Value {
    let mut args = args.to_vec();
    args.extend(["--fmt", "json"]);
    let out = ledgerdesk(&args);
    assert!(
        out.status.success(),
        "ledgerdesk {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is not json")
}

#[test]
fn grn_list_first_page() {
    let v = json(&["grns"]);
    assert_eq!(v["summary"], "Showing 1 to 10 of 15 entries");
    assert_eq!(v["page"]["total"], 15);
    assert_eq!(v["page"]["rows"].as_array().unwrap().len(), 10);
    assert_eq!(v["page"]["rows"][0]["grnNumber"], "GRN001");
    assert_eq!(v["notice"], Value::Null);
}

#[test]
fn grn_list_delete_needs_confirmation() {
    let v = json(&["grns", "--delete", "2"]);
    assert_eq!(v["page"]["total"], 15);
    assert_eq!(v["notice"], Value::Null);

    let v = json(&["grns", "--delete", "2", "--yes", "--per-page", "25"]);
    assert_eq!(v["page"]["total"], 14);
    assert_eq!(v["notice"]["title"], "GRN Deleted");
    assert_eq!(v["notice"]["description"], "GRN GRN002 has been deleted successfully.");
    assert_eq!(v["notice"]["variant"], "destructive");
}

#[test]
fn open_route_in_view_mode() {
    let v = json(&["open", "/grn?id=3&mode=view"]);
    assert_eq!(v["title"], "View GRN - GRN003 (Read-only mode)");
    assert_eq!(v["mode"], "view");

    let out = ledgerdesk(&["grn", "--id", "3", "--mode", "view", "--set", "invoice=X"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("read-only"));
}

#[test]
fn open_rejects_bad_routes() {
    for route in ["/grn?mode=edit", "/nowhere", "grn"] {
        let out = ledgerdesk(&["open", route]);
        assert!(!out.status.success(), "{route} should fail");
    }
    let out = ledgerdesk(&["open", "/grn?id=99&mode=edit"]);
    assert!(String::from_utf8_lossy(&out.stderr).contains("no record with id 99"));
}

#[test]
fn new_grn_is_saved() {
    let v = json(&[
        "grn",
        "--set",
        "grn-no=GRN100",
        "--line",
        "1:description=Router",
        "--line",
        "2:qty=2",
        "--save",
    ]);
    assert_eq!(v["title"], "New GRN");
    assert_eq!(v["lines"].as_array().unwrap().len(), 2);
    assert_eq!(v["lines"][1]["line"]["id"], "2");
    assert_eq!(v["notice"]["title"], "GRN Saved");
    assert_eq!(v["notice"]["description"], "GRN GRN100 has been saved successfully.");
}

#[test]
fn bill_rejects_bad_amounts() {
    let v = json(&["bill", "--line", "1:memo=rent", "--line", "2:memo=fuel", "--remove", "1"]);
    assert_eq!(v["lines"].as_array().unwrap().len(), 1);
    assert_eq!(v["lines"][0]["line"]["memo"], "fuel");

    let out = ledgerdesk(&["bill", "--line", "1:amount=12a"]);
    assert!(!out.status.success());

    let out = ledgerdesk(&["bill", "--line", "1:account=11"]);
    assert!(!out.status.success(), "income accounts take no bills");
}

#[test]
fn inventory_expands_one_row() {
    let v = json(&["inventory"]);
    assert_eq!(v.as_array().unwrap().len(), 5);

    let v = json(&["inventory", "--toggle", "3"]);
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[3]["id"], "3-1");
    assert_eq!(rows[3]["depth"], 1);
    assert_eq!(rows[2]["expanded"], true);
}

#[test]
fn list_to_form_round_trip() {
    let data = Dataset::mock();
    let mut list = ListPage::new(InMemory::from_records(data.grns).unwrap());
    list.filter.set_quick("INV2024007");

    let route = {
        let page = list.page();
        assert_eq!(page.total, 1);
        Route::edit("/grn", &page.rows[0].id)
    };
    let record = list.repo().get(route.id.as_ref().unwrap()).unwrap().clone();

    let mut form: GrnForm = GrnForm::open(&record, route.mode);
    let id = form.add_line().unwrap();
    form.set_line(&id, GrnField::SerialNo, "SN-1").unwrap();
    let (saved, notice) = form.save().unwrap();

    assert_eq!(saved, record);
    assert_eq!(notice.title, "GRN Updated");
    assert_eq!(form.title(), "Edit GRN - GRN007");
}

#[test]
fn accounts_grouped_by_type() {
    let v = json(&["accounts"]);
    let groups = v["groups"].as_array().unwrap();
    let kinds: Vec<_> = groups.iter().map(|g| g["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds[..3], ["Bank", "Cash", "Accounts Receivable"]);
    assert_eq!(groups[0]["count"], 3);
    assert_eq!(groups[1]["count"], 2);
    assert_eq!(groups[2]["count"], 1);
    // Bank mixes LKR and USD accounts
    assert_eq!(groups[0]["total"], Value::Null);
    assert_eq!(groups[1]["total"]["currency"], "LKR");

    let open: Vec<_> = groups.iter().map(|g| g["expanded"] == true).collect();
    assert_eq!(open[..3], [true, true, true]);
    assert!(open[3..].iter().all(|e| !e));

    let v = json(&["accounts", "--toggle", "Bank"]);
    assert_eq!(v["groups"][0]["expanded"], false);
}

#[test]
fn accounts_tree_follows_parents() {
    let v = json(&["accounts", "--tree"]);
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 15);
    let at = |id: &str| {
        rows.iter()
            .position(|r| r["account"]["id"] == id)
            .unwrap_or_else(|| panic!("account {id} not shown"))
    };
    assert_eq!(at("5"), at("4") + 1);
    assert_eq!(rows[at("4")]["depth"], 0);
    assert_eq!(rows[at("4")]["has_children"], true);
    assert_eq!(rows[at("5")]["depth"], 1);
    assert_eq!(rows[at("15")]["depth"], 1);

    let v = json(&["accounts", "--tree", "--collapse-all"]);
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 13);
    assert!(rows.iter().all(|r| r["depth"] == 0));
    assert!(rows.iter().all(|r| r["expanded"] == false));

    let out = ledgerdesk(&["accounts", "--tree", "--toggle", "Bank"]);
    assert!(!out.status.success());
}

#[test]
fn suppliers_payable_per_currency() {
    let v = json(&["suppliers"]);
    assert_eq!(v["total_suppliers"], 4);
    assert_eq!(v["summary"], "Showing 1 to 4 of 4 entries");
    let payable = v["payable"].as_array().unwrap();
    let currencies: Vec<_> = payable.iter().map(|m| m["currency"].as_str().unwrap()).collect();
    assert_eq!(currencies, ["LKR", "USD"]);
}

#[test]
fn grn_number_must_be_unique() {
    let out = ledgerdesk(&["grn", "--set", "grn-no=GRN001", "--save"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already exists"));

    let v = json(&["grn", "--id", "3", "--mode", "edit", "--set", "invoice=INV9", "--save"]);
    assert_eq!(v["notice"]["title"], "GRN Updated");
}
