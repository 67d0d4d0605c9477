//! Live-broker round-trip, gated behind `TELESYNC_INTEGRATION=1`.

use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use telesync_adapter_mqtt::{MqttTransport, MqttTransportConfig};
use telesync_core::{Payload, SharedState};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

fn parse_mqtt_url(url: &str) -> (String, u16) {
    let url = url
        .strip_prefix("tcp://")
        .or_else(|| url.strip_prefix("mqtt://"))
        .unwrap_or(url);

    let parts: Vec<&str> = url.split(':').collect();

    let host = parts.first().copied().unwrap_or("localhost").to_string();
    let port = parts.get(1).and_then(|p| p.parse().ok()).unwrap_or(1883);

    (host, port)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mqtt_update_roundtrip() {
    if std::env::var("TELESYNC_INTEGRATION").is_err() {
        eprintln!("Skipping integration test; set TELESYNC_INTEGRATION=1 to run");
        return;
    }

    let broker =
        std::env::var("TELESYNC_MQTT_BROKER").unwrap_or_else(|_| "tcp://localhost:1883".to_string());

    let topic = format!("telesync/test/{}", Uuid::new_v4().simple());
    let config = MqttTransportConfig {
        broker_url: broker.clone(),
        topics: vec![topic.clone()],
        retry_delay: Duration::from_millis(500),
        ..Default::default()
    };

    let shared = Arc::new(SharedState::new(16));
    let (tx, mut rx) = mpsc::channel(16);
    let mut transport = MqttTransport::spawn(config, Arc::clone(&shared), tx).unwrap();

    // Give the subscription time to land before publishing.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let (host, port) = parse_mqtt_url(&broker);
    let mut pub_opts = MqttOptions::new(format!("pub-{}", Uuid::new_v4()), host, port);
    pub_opts.set_keep_alive(Duration::from_secs(5));
    let (pub_client, mut pub_eventloop) = AsyncClient::new(pub_opts, 10);
    tokio::spawn(async move {
        loop {
            if pub_eventloop.poll().await.is_err() {
                break;
            }
        }
    });

    pub_client
        .publish(&topic, QoS::AtLeastOnce, false, r#"{"power":120}"#)
        .await
        .unwrap();

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for MQTT message")
        .expect("events channel closed");
    assert_eq!(event.topic(), topic);

    let snapshot = shared.snapshot().await;
    assert!(snapshot.connected);
    assert_eq!(
        snapshot.data.get(&topic).and_then(Payload::as_json),
        Some(&serde_json::json!({"power": 120}))
    );

    transport.disconnect().await;
}
