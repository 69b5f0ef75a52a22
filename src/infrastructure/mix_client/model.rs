pub mod mix_model {
    use serde::{Deserialize, Deserializer, Serialize};

    /// One row of `GET /sources`.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct CatalogEntry {
        pub id: i64,
        pub youtube_link: String,
        #[serde(default)]
        pub title: Option<String>,
        #[serde(default)]
        pub artist: Option<String>,
        #[serde(default, deserialize_with = "whole_seconds")]
        pub duration_sec: u32,
        #[serde(default)]
        pub is_video: bool,
    }

    /// `null`, negative or non-finite durations count as 0; fractions are
    /// floored.
    fn whole_seconds<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
        if !seconds.is_finite() || seconds <= 0.0 {
            return Ok(0);
        }
        Ok(seconds.floor().min(u32::MAX as f64) as u32)
    }

    /// Body of `GET /random`, and both request and response of `POST /custom`.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    pub struct Mix {
        pub audio_id: String,
        pub video_id: String,
    }

}
