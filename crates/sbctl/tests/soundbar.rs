use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;
use sbctl::frame::{cipher, decode, encode_frame, HEADER_SIZE};
use sbctl::session::{Session, SessionConfig};
use sbctl::transport::{Connector, TransportError};
use sbctl::{CatalogError, Setting, Soundbar, SoundbarError, VolumeChange};
use serde_json::{json, Value};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

type Log = Arc<Mutex<Vec<Value>>>;

/// In-memory soundbar: answers every command from a fixed state document,
/// echoing sets back as the new state of that category.
#[derive(Clone)]
struct FakeSoundbar {
    state: Arc<Mutex<Value>>,
    log: Log,
}

impl FakeSoundbar {
    fn new(state: Value) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            log: Arc::default(),
        }
    }

    fn received(&self) -> Vec<Value> {
        self.log.lock().unwrap().clone()
    }

    async fn serve(self, mut stream: DuplexStream) {
        loop {
            let mut header = [0u8; HEADER_SIZE];
            if stream.read_exact(&mut header).await.is_err() {
                return;
            }
            let mut frame = header.to_vec();
            frame.resize(HEADER_SIZE + header[4] as usize, 0);
            if stream.read_exact(&mut frame[HEADER_SIZE..]).await.is_err() {
                return;
            }
            let command = decode(&frame).unwrap().into_value();
            self.log.lock().unwrap().push(command.clone());

            let reply = self.answer(&command);
            let mut out = BytesMut::new();
            encode_frame(&cipher::encrypt(reply.to_string().as_bytes()), &mut out);
            if stream.write_all(&out).await.is_err() {
                return;
            }
        }
    }

    fn answer(&self, command: &Value) -> Value {
        let msg = command["msg"].as_str().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        if let Some(data) = command.get("data").and_then(Value::as_object) {
            let entry = state
                .as_object_mut()
                .unwrap()
                .entry(msg.clone())
                .or_insert_with(|| json!({}));
            for (key, value) in data {
                entry[key] = value.clone();
            }
        }
        json!({"msg": msg, "data": state.get(&msg).cloned().unwrap_or(json!({}))})
    }
}

impl Connector for FakeSoundbar {
    type Stream = DuplexStream;

    fn connect(&self) -> impl Future<Output = sbctl::transport::Result<DuplexStream>> + Send {
        let device = self.clone();
        async move {
            let (client, server) = duplex(4096);
            tokio::spawn(device.serve(server));
            Ok::<_, TransportError>(client)
        }
    }

    fn endpoint(&self) -> String {
        "fake-soundbar".to_string()
    }
}

fn soundbar(device: &FakeSoundbar) -> Soundbar {
    let session = Session::with_connector(device.clone(), SessionConfig::default());
    Soundbar::new(session).with_timeout(Duration::from_secs(2))
}

fn living_room() -> Value {
    json!({
        "SPK_LIST_VIEW_INFO": {"i_vol": 12, "i_vol_min": 0, "i_vol_max": 40, "b_mute": false},
        "SETTING_VIEW_INFO": {
            "s_user_name": "Living Room",
            "s_ipv4_addr": "192.168.1.50",
            "b_night_time": true
        },
        "FUNC_VIEW_INFO": {"i_curr_func": 6},
        "EQ_VIEW_INFO": {"i_curr_eq": 0},
        "PRODUCT_INFO": {"s_model_name": "SP8YA"}
    })
}

#[tokio::test(start_paused = true)]
async fn typed_getters() {
    let device = FakeSoundbar::new(living_room());
    let bar = soundbar(&device);

    assert_eq!(bar.volume().await.unwrap(), 12);
    assert!(!bar.mute().await.unwrap());
    assert!(bar.night_mode().await.unwrap());
    assert_eq!(bar.name().await.unwrap(), "Living Room");
    assert_eq!(bar.product().await.unwrap(), "SP8YA");
    assert_eq!(bar.input().await.unwrap(), "HDMI");
    assert_eq!(bar.equalizer().await.unwrap(), "Standard");
}

#[tokio::test(start_paused = true)]
async fn basic_info_combines_three_queries() {
    let device = FakeSoundbar::new(living_room());
    let info = soundbar(&device).basic_info().await.unwrap();

    assert_eq!(info.name.as_deref(), Some("Living Room"));
    assert_eq!(info.ip.as_deref(), Some("192.168.1.50"));
    assert_eq!(info.volume, Some(12));
    assert_eq!(info.volume_max, Some(40));
    assert_eq!(info.muted, Some(false));
    assert_eq!(info.input, "HDMI");

    let targets: Vec<_> = device
        .received()
        .iter()
        .map(|command| command["msg"].clone())
        .collect();
    assert_eq!(
        targets,
        vec![
            json!("SETTING_VIEW_INFO"),
            json!("SPK_LIST_VIEW_INFO"),
            json!("FUNC_VIEW_INFO")
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn relative_volume_reads_current_level() {
    let device = FakeSoundbar::new(living_room());
    let bar = soundbar(&device);

    assert_eq!(bar.set_volume(VolumeChange::Relative(3)).await.unwrap(), 15);
    assert_eq!(bar.set_volume(VolumeChange::Relative(-20)).await.unwrap(), 0);
    assert_eq!(bar.set_volume(VolumeChange::Absolute(8)).await.unwrap(), 8);
    assert_eq!(bar.volume().await.unwrap(), 8);

    let sets: Vec<_> = device
        .received()
        .into_iter()
        .filter(|command| command["cmd"] == "set")
        .map(|command| command["data"]["i_vol"].clone())
        .collect();
    assert_eq!(sets, vec![json!(15), json!(0), json!(8)]);
}

#[tokio::test(start_paused = true)]
async fn unknown_names_never_reach_the_device() {
    let device = FakeSoundbar::new(living_room());
    let bar = soundbar(&device);

    let err = bar.set_input("Cassette").await.unwrap_err();
    assert!(matches!(
        err,
        SoundbarError::Catalog(CatalogError::UnknownInput(_))
    ));
    assert!(bar.set_equalizer("Loudness").await.is_err());
    assert!(device.received().is_empty());
}

#[tokio::test(start_paused = true)]
async fn setters_write_expected_fields() {
    let device = FakeSoundbar::new(living_room());
    let bar = soundbar(&device);

    bar.set_input("optical").await.unwrap();
    bar.set_equalizer("cinema").await.unwrap();
    bar.set_mute(true).await.unwrap();
    bar.set_setting(Setting::Woofer, json!(-2)).await.unwrap();
    bar.test_tone().await.unwrap();

    assert_eq!(
        device.received(),
        vec![
            json!({"cmd": "set", "msg": "FUNC_VIEW_INFO", "data": {"i_curr_func": 4}}),
            json!({"cmd": "set", "msg": "EQ_VIEW_INFO", "data": {"i_curr_eq": 7}}),
            json!({"cmd": "set", "msg": "SPK_LIST_VIEW_INFO", "data": {"b_mute": true}}),
            json!({"cmd": "set", "msg": "SETTING_VIEW_INFO", "data": {"i_woofer_level": -2}}),
            json!({"cmd": "set", "msg": "TEST_TONE_REQ"}),
        ]
    );
    assert!(bar.mute().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn missing_field_is_reported() {
    let device = FakeSoundbar::new(json!({"PRODUCT_INFO": {}}));
    let err = soundbar(&device).product().await.unwrap_err();
    assert!(matches!(
        err,
        SoundbarError::MissingField {
            field: "s_model_name",
            ..
        }
    ));
}
