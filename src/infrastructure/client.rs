pub mod mix_client {
    use async_trait::async_trait;
    use log::debug;
    use reqwest::header::CONTENT_TYPE;
    use serde::de::DeserializeOwned;
    use url::Url;

    use crate::config::Config;
    use crate::error::{Error, Result};
    use crate::infrastructure::mix_client::model::mix_model::{CatalogEntry, Mix};

    #[async_trait]
    pub trait MixApi: Sync + Send {
        async fn sources(&self) -> Result<Vec<CatalogEntry>>;
        async fn random_mix(&self) -> Result<Mix>;
        async fn custom_mix(&self, mix: &Mix) -> Result<Mix>;
    }

    /// HTTP client for the `/api/mix` backend.
    #[derive(Clone)]
    pub struct MixClient {
        base_url: Url,
        http: reqwest::Client,
    }

    impl MixClient {
        pub fn new(config: &Config) -> Result<Self> {
            let http = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .build()
                .map_err(|source| Error::Http {
                    url: config.api_base_url.to_string(),
                    source,
                })?;

            Ok(MixClient {
                base_url: config.api_base_url.clone(),
                http,
            })
        }

        pub fn base_url(&self) -> &Url {
            &self.base_url
        }

        fn endpoint(&self, path: &str) -> Result<Url> {
            Ok(self.base_url.join(path)?)
        }

        async fn read_json<T: DeserializeOwned>(
            url: &Url,
            request: reqwest::RequestBuilder,
        ) -> Result<T> {
            let http_err = |source| Error::Http {
                url: url.to_string(),
                source,
            };

            let response = request.send().await.map_err(http_err)?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    status,
                    url: url.to_string(),
                });
            }

            response.json::<T>().await.map_err(http_err)
        }
    }

    #[async_trait]
    impl MixApi for MixClient {
        async fn sources(&self) -> Result<Vec<CatalogEntry>> {
            let url = self.endpoint("sources")?;
            debug!("GET {}", url);
            let entries: Vec<CatalogEntry> =
                Self::read_json(&url, self.http.get(url.clone())).await?;
            debug!("Fetched {} catalog entries", entries.len());
            Ok(entries)
        }

        async fn random_mix(&self) -> Result<Mix> {
            let url = self.endpoint("random")?;
            debug!("GET {}", url);
            Self::read_json(&url, self.http.get(url.clone())).await
        }

        async fn custom_mix(&self, mix: &Mix) -> Result<Mix> {
            let url = self.endpoint("custom")?;
            debug!("POST {} {:?}", url, mix);
            let request = self
                .http
                .post(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(mix)?);
            Self::read_json(&url, request).await
        }
    }
}
