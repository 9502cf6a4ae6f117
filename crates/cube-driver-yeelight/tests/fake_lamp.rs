//! Drives the driver against a local TCP listener that speaks the lamp's
//! line protocol.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cube_core::{Color, DeviceLink, Matrix};
use cube_driver_yeelight::{YeelightClient, YeelightConfig, YeelightCube};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

type Reply = fn(&Value) -> Vec<String>;

struct FakeLamp {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    connections: Arc<AtomicUsize>,
}

impl FakeLamp {
    async fn spawn(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let (log, count) = (requests.clone(), connections.clone());
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                count.fetch_add(1, Ordering::SeqCst);
                let log = log.clone();
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut lines = BufReader::new(read).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let request: Value = serde_json::from_str(&line).unwrap();
                        log.lock().unwrap().push(request.clone());
                        for out in reply(&request) {
                            write.write_all(out.as_bytes()).await.unwrap();
                            write.write_all(b"\r\n").await.unwrap();
                        }
                    }
                });
            }
        });

        Self {
            addr,
            requests,
            connections,
        }
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["method"].as_str().unwrap().to_string())
            .collect()
    }

    fn cube(&self, persistent: bool) -> YeelightCube {
        YeelightCube::from_config(&YeelightConfig {
            address: self.addr.to_string(),
            response_timeout_ms: 150,
            persistent,
            ..Default::default()
        })
        .unwrap()
    }
}

fn answer_ok(request: &Value) -> Vec<String> {
    vec![json!({"id": request["id"], "result": ["ok"]}).to_string()]
}

fn answer_props(request: &Value) -> Vec<String> {
    let values: Vec<Value> = request["params"]
        .as_array()
        .unwrap()
        .iter()
        .map(|name| match name.as_str().unwrap() {
            "power" => json!("on"),
            "bright" => json!("80"),
            "rgb" => json!("16753920"),
            _ => json!(""),
        })
        .collect();
    vec![
        json!({"method": "props", "params": {"power": "on"}}).to_string(),
        json!({"id": request["id"], "result": values}).to_string(),
    ]
}

fn answer_error(request: &Value) -> Vec<String> {
    vec![json!({
        "id": request["id"],
        "error": {"code": -1, "message": "unsupported method"}
    })
    .to_string()]
}

fn stay_silent(_: &Value) -> Vec<String> {
    Vec::new()
}

#[tokio::test]
async fn playback_sequence_reaches_the_lamp() {
    let lamp = FakeLamp::spawn(answer_ok).await;
    let cube = lamp.cube(false);
    let link: &dyn DeviceLink = &cube;
    let frame = Matrix::make(Color::RED);

    link.set_power(true).await.unwrap();
    link.enter_direct_mode().await.unwrap();
    link.show(&frame).await.unwrap();
    link.set_power(false).await.unwrap();

    let requests = lamp.requests();
    assert_eq!(
        lamp.methods(),
        ["set_power", "activate_fx_mode", "update_leds", "set_power"]
    );
    assert_eq!(requests[0]["params"], json!(["on", "smooth", 200]));
    assert_eq!(requests[1]["params"], json!([{"mode": "direct"}]));
    assert_eq!(requests[2]["params"], json!([frame.to_wire_encoding()]));
    assert_eq!(requests[3]["params"], json!(["off", "smooth", 200]));
    assert!(requests.iter().all(|r| r["id"].as_i64().unwrap() > 0));
}

#[tokio::test]
async fn non_persistent_mode_connects_per_request() {
    let lamp = FakeLamp::spawn(answer_ok).await;
    let cube = lamp.cube(false);
    cube.toggle().await.unwrap();
    cube.toggle().await.unwrap();
    cube.toggle().await.unwrap();
    assert_eq!(lamp.connections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn persistent_mode_reuses_one_connection() {
    let lamp = FakeLamp::spawn(answer_ok).await;
    let cube = lamp.cube(true);
    cube.toggle().await.unwrap();
    cube.set_name("desk").await.unwrap();
    cube.stop_color_flow().await.unwrap();
    assert_eq!(lamp.connections.load(Ordering::SeqCst), 1);
    assert_eq!(lamp.methods(), ["toggle", "set_name", "stop_cf"]);
}

#[tokio::test]
async fn silence_is_treated_as_success() {
    let lamp = FakeLamp::spawn(stay_silent).await;
    let cube = lamp.cube(false);
    cube.send_frame(&Matrix::black().to_wire_encoding())
        .await
        .unwrap();

    let client = YeelightClient::new(&lamp.addr.to_string())
        .with_timeouts(Duration::from_secs(1), Duration::from_millis(100));
    let reply = client
        .send(&cube_driver_yeelight::LampCommand::Toggle)
        .await
        .unwrap();
    assert!(reply.is_none());
}

#[tokio::test]
async fn queries_fail_without_a_reply() {
    let lamp = FakeLamp::spawn(stay_silent).await;
    assert!(lamp.cube(false).power_state().await.is_err());
}

#[tokio::test]
async fn lamp_errors_are_surfaced() {
    let lamp = FakeLamp::spawn(answer_error).await;
    let err = lamp.cube(false).set_power(true).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("unsupported method"), "{}", message);
    assert!(message.contains("set_power"), "{}", message);
}

#[tokio::test]
async fn property_queries_skip_notifications() {
    let lamp = FakeLamp::spawn(answer_props).await;
    let cube = lamp.cube(true);

    assert!(cube.power_state().await.unwrap());
    assert_eq!(cube.brightness().await.unwrap(), 80);
    assert_eq!(cube.rgb().await.unwrap(), Color::from_rgb(0xFF, 0xA5, 0x00));
    assert_eq!(
        cube.get_props(&["power", "bright"]).await.unwrap(),
        vec!["on", "80"]
    );
}
