//! Typed operations on top of a [`Session`].

use std::time::Duration;

use sbctl_frame::{Command, Response};
use sbctl_session::{Session, SessionError};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::catalog::{
    self, CatalogError, Setting, VolumeChange, EQ_VIEW_INFO, FACTORY_SET_REQ, FUNC_VIEW_INFO,
    PRODUCT_INFO, SETTING_VIEW_INFO, SPK_LIST_VIEW_INFO, TEST_TONE_REQ,
};

/// Default time to wait for a single response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SoundbarError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The request was abandoned or the reply could not be decoded.
    #[error("no response to {0}")]
    NoResponse(String),

    #[error("{category} response has no usable {field}")]
    MissingField {
        category: &'static str,
        field: &'static str,
    },
}

impl SoundbarError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Session(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, SoundbarError>;

/// Summary gathered from settings, speaker and input queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicInfo {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub night_mode: Option<bool>,
    pub volume: Option<u64>,
    pub volume_min: Option<u64>,
    pub volume_max: Option<u64>,
    pub muted: Option<bool>,
    pub input: String,
}

/// High-level soundbar client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Soundbar {
    session: Session,
    timeout: Duration,
}

impl Soundbar {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a command, returning whatever the device answered.
    pub async fn send(&self, command: Command) -> Result<Option<Response>> {
        debug!(%command, "sending");
        Ok(self
            .session
            .request_with_timeout(command, self.timeout)
            .await?)
    }

    /// Read a whole category.
    pub async fn get(&self, category: &str) -> Result<Response> {
        self.send(Command::get(category))
            .await?
            .ok_or_else(|| SoundbarError::NoResponse(category.to_string()))
    }

    /// Write fields of a category.
    pub async fn set(&self, category: &str, data: Map<String, Value>) -> Result<Option<Response>> {
        self.send(Command::set(category, data)).await
    }

    async fn set_field(
        &self,
        category: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Response>> {
        self.send(Command::set_field(category, field, value)).await
    }

    async fn field(&self, category: &'static str, field: &'static str) -> Result<Value> {
        self.get(category)
            .await?
            .field(field)
            .cloned()
            .ok_or(SoundbarError::MissingField { category, field })
    }

    pub async fn volume(&self) -> Result<u64> {
        self.field(SPK_LIST_VIEW_INFO, "i_vol")
            .await?
            .as_u64()
            .ok_or(SoundbarError::MissingField {
                category: SPK_LIST_VIEW_INFO,
                field: "i_vol",
            })
    }

    pub async fn mute(&self) -> Result<bool> {
        self.field(SPK_LIST_VIEW_INFO, "b_mute")
            .await?
            .as_bool()
            .ok_or(SoundbarError::MissingField {
                category: SPK_LIST_VIEW_INFO,
                field: "b_mute",
            })
    }

    pub async fn night_mode(&self) -> Result<bool> {
        self.field(SETTING_VIEW_INFO, "b_night_time")
            .await?
            .as_bool()
            .ok_or(SoundbarError::MissingField {
                category: SETTING_VIEW_INFO,
                field: "b_night_time",
            })
    }

    /// User-assigned device name.
    pub async fn name(&self) -> Result<String> {
        text(self.field(SETTING_VIEW_INFO, "s_user_name").await?).ok_or(
            SoundbarError::MissingField {
                category: SETTING_VIEW_INFO,
                field: "s_user_name",
            },
        )
    }

    /// Model name, e.g. `SP8YA`.
    pub async fn product(&self) -> Result<String> {
        text(self.field(PRODUCT_INFO, "s_model_name").await?).ok_or(
            SoundbarError::MissingField {
                category: PRODUCT_INFO,
                field: "s_model_name",
            },
        )
    }

    /// Current input name, `Unknown` for indices outside the table.
    pub async fn input(&self) -> Result<&'static str> {
        let index = self
            .field(FUNC_VIEW_INFO, "i_curr_func")
            .await?
            .as_u64()
            .ok_or(SoundbarError::MissingField {
                category: FUNC_VIEW_INFO,
                field: "i_curr_func",
            })?;
        Ok(catalog::input_name(index))
    }

    /// Current sound mode name, `Unknown` for indices outside the table.
    pub async fn equalizer(&self) -> Result<&'static str> {
        let index = self
            .field(EQ_VIEW_INFO, "i_curr_eq")
            .await?
            .as_u64()
            .ok_or(SoundbarError::MissingField {
                category: EQ_VIEW_INFO,
                field: "i_curr_eq",
            })?;
        Ok(catalog::equalizer_name(index).unwrap_or(catalog::UNKNOWN))
    }

    pub async fn basic_info(&self) -> Result<BasicInfo> {
        let settings = self.get(SETTING_VIEW_INFO).await?;
        let speaker = self.get(SPK_LIST_VIEW_INFO).await?;
        let input = self.input().await?;

        Ok(BasicInfo {
            name: settings.field("s_user_name").cloned().and_then(text),
            ip: settings.field("s_ipv4_addr").cloned().and_then(text),
            night_mode: settings.field("b_night_time").and_then(Value::as_bool),
            volume: speaker.field("i_vol").and_then(Value::as_u64),
            volume_min: speaker.field("i_vol_min").and_then(Value::as_u64),
            volume_max: speaker.field("i_vol_max").and_then(Value::as_u64),
            muted: speaker.field("b_mute").and_then(Value::as_bool),
            input: input.to_string(),
        })
    }

    /// Change the volume and return the level that was requested.
    ///
    /// Relative changes read the current level first and never go below 0.
    pub async fn set_volume(&self, change: VolumeChange) -> Result<u32> {
        let target = match change {
            VolumeChange::Absolute(level) => level,
            VolumeChange::Relative(_) => {
                let current = u32::try_from(self.volume().await?).unwrap_or(u32::MAX);
                change.apply(current)
            }
        };
        info!(%change, target, "setting volume");
        self.set_field(SPK_LIST_VIEW_INFO, "i_vol", target).await?;
        Ok(target)
    }

    pub async fn set_mute(&self, muted: bool) -> Result<Option<Response>> {
        self.set_field(SPK_LIST_VIEW_INFO, "b_mute", muted).await
    }

    /// Select an input by name. Unknown names fail before anything is sent.
    pub async fn set_input(&self, name: &str) -> Result<Option<Response>> {
        let index = catalog::input_index(name)?;
        info!(input = catalog::INPUTS[index], index, "setting input");
        self.set_field(FUNC_VIEW_INFO, "i_curr_func", index).await
    }

    /// Select a sound mode by name. Unknown names fail before anything is sent.
    pub async fn set_equalizer(&self, name: &str) -> Result<Option<Response>> {
        let index = catalog::equalizer_index(name)?;
        info!(equalizer = catalog::EQUALIZERS[index], index, "setting equalizer");
        self.set_field(EQ_VIEW_INFO, "i_curr_eq", index).await
    }

    pub async fn set_setting(&self, setting: Setting, value: Value) -> Result<Option<Response>> {
        self.set_field(SETTING_VIEW_INFO, setting.field(), value)
            .await
    }

    pub async fn test_tone(&self) -> Result<Option<Response>> {
        self.send(Command::trigger(TEST_TONE_REQ)).await
    }

    pub async fn factory_reset(&self) -> Result<Option<Response>> {
        info!("factory reset requested");
        self.send(Command::trigger(FACTORY_SET_REQ)).await
    }
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        _ => None,
    }
}
