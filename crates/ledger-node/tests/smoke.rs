//! End-to-end smoke test for ledger-node.
//!
//! Starts a real node process against a pre-seeded store, drives it over
//! HTTP with HMAC validation disabled, and asserts the resulting account
//! balance.
//!
//! Run with:
//!   cargo test -p ledger-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use ledger_core::{CurrencyService, CurrencyUnit};
use ledger_store::Store;

const SERVICE_NAME: &str = "smoke-service";

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

async fn wait_for_ready(client: &reqwest::Client, base_url: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client
            .get(format!("{base_url}/holders/"))
            .header("X-SERVICE", SERVICE_NAME)
            .send()
            .await
        {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    false
}

#[tokio::test]
async fn smoke_create_and_confirm_adjustment() {
    let data_dir = std::env::temp_dir().join(format!("ledger_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    // Seed a service and currency unit before the node opens the store —
    // sled only permits one process to hold the lock at a time.
    {
        let store = Store::open(&data_dir).unwrap();
        let mut service = CurrencyService::new(SERVICE_NAME);
        service.permissions = serde_json::json!({ "root": true });
        store.put_service(&service).unwrap();
        store.put_currency_unit(&CurrencyUnit::new("GLD", "gold", 4).unwrap()).unwrap();
        store.flush().unwrap();
    }

    let port = free_port();
    let base_url = format!("http://127.0.0.1:{port}");
    let node_bin = env!("CARGO_BIN_EXE_ledger-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--bind-addr",
            &format!("127.0.0.1:{port}"),
            "--enable-hmac-validation",
            "false",
            "--background-interval-seconds",
            "3600",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn ledger-node");

    let _guard = NodeGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(
        wait_for_ready(&http, &base_url, Duration::from_secs(10)).await,
        "ledger-node did not become ready within 10 seconds"
    );

    let create_holder = http
        .post(format!("{base_url}/holders/create/"))
        .header("X-SERVICE", SERVICE_NAME)
        .json(&serde_json::json!({ "holder_id": "p1" }))
        .send()
        .await
        .expect("create holder request");
    assert!(create_holder.status().is_success(), "create holder failed: {:?}", create_holder.status());

    let create_adjustment = http
        .post(format!("{base_url}/adjustments/create/"))
        .header("X-SERVICE", SERVICE_NAME)
        .json(&serde_json::json!({
            "holder_id": "p1",
            "currency_unit": "GLD",
            "amount": "100",
            "description": "smoke test credit",
        }))
        .send()
        .await
        .expect("create adjustment request");
    assert_eq!(create_adjustment.status(), reqwest::StatusCode::CREATED);
    let adjustment: serde_json::Value = create_adjustment.json().await.unwrap();
    let uuid = adjustment["header"]["uuid"].as_str().expect("adjustment uuid").to_string();

    let confirm = http
        .post(format!("{base_url}/adjustments/confirm/"))
        .header("X-SERVICE", SERVICE_NAME)
        .json(&serde_json::json!({ "uuid": uuid, "status_description": "ok" }))
        .send()
        .await
        .expect("confirm adjustment request");
    assert!(confirm.status().is_success(), "confirm failed: {:?}", confirm.status());

    let account = http
        .get(format!("{base_url}/accounts/detail/"))
        .header("X-SERVICE", SERVICE_NAME)
        .query(&[("holder_id", "p1"), ("currency_unit", "GLD")])
        .send()
        .await
        .expect("account lookup request");
    assert!(account.status().is_success());
    let account: serde_json::Value = account.json().await.unwrap();
    assert_eq!(account["amount"], serde_json::json!("100"), "balance should reflect the confirmed adjustment");
}
