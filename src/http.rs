use anyhow::Result;
use reqwest::Client;
use serde::Serialize;

use crate::config::Config;

const CONTRACT_PREFIX: &str = "tinkoff.public.invest.api.contract.v1";

/// Build the gateway URL for a unary method, e.g. `MarketDataService/GetCandles`
pub fn method_url(endpoint: &str, method: &str) -> String {
    format!(
        "{}/{}.{}",
        endpoint.trim_end_matches('/'),
        CONTRACT_PREFIX,
        method
    )
}

/// Call a unary method of the REST gateway and return the raw response body
pub async fn invest_post<B>(
    client: &Client,
    config: &Config,
    method: &str,
    body: &B
) -> Result<String>
where
    B: Serialize + ?Sized
{
    if config.token.is_empty() {
        anyhow::bail!("API token is not configured");
    }
    let url = method_url(&config.endpoint, method);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", config.token))
        .header("Accept", "application/json")
        .header("x-app-name", &config.app_name)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    let response_text = response.text().await?;

    if !status.is_success() {
        anyhow::bail!(
            "API request failed with status {}: {}",
            status,
            response_text
        );
    }

    Ok(response_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_url() {
        assert_eq!(
            method_url(
                "https://invest-public-api.tinkoff.ru/rest/",
                "MarketDataService/GetCandles"
            ),
            concat!(
                "https://invest-public-api.tinkoff.ru/rest/",
                "tinkoff.public.invest.api.contract.v1.MarketDataService/GetCandles"
            )
        );
    }

    #[tokio::test]
    async fn test_invest_post_requires_token() {
        let mut config = Config::new("");
        config.endpoint = "http://127.0.0.1:9".to_string();
        let result = invest_post(
            &Client::new(),
            &config,
            "MarketDataService/GetCandles",
            &json!({})
        )
        .await;

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "API token is not configured");
    }
}
