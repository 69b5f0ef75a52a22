pub mod bridge_model {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::catalog::TrackKind;
    use crate::player::EmbedOptions;

    #[derive(Serialize, Debug)]
    #[serde(tag = "type", rename_all = "lowercase")]
    pub enum Outgoing<'a> {
        Mount {
            slot: TrackKind,
            generation: u64,
            #[serde(rename = "videoId")]
            video_id: &'a str,
            #[serde(rename = "playerVars")]
            player_vars: EmbedOptions,
        },
        Call {
            slot: TrackKind,
            method: &'static str,
            args: Vec<Value>,
            #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
            request_id: Option<u64>,
        },
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(tag = "type", rename_all = "lowercase")]
    pub enum Incoming {
        Ready {
            slot: TrackKind,
            generation: u64,
        },
        Result {
            #[serde(rename = "requestId")]
            request_id: u64,
            #[serde(default)]
            value: Option<f64>,
        },
        Error {
            message: String,
        },
    }

}
