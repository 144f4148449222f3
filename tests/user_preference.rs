//! User preference endpoint against a mock HTTP server.

use mockito::Server;
use schwab_streamer::client::SchwabClient;
use schwab_streamer::credentials::StreamerInfoProvider;
use schwab_streamer::error::SchwabError;
use serde_json::json;

fn preference_body() -> serde_json::Value {
    json!({
        "accounts": [{
            "accountNumber": "12345678",
            "primaryAccount": true,
            "type": "BROKERAGE",
            "nickName": "Individual",
            "displayAcctId": "...678",
            "autoPositionEffect": false,
            "accountColor": "Green"
        }],
        "streamerInfo": [{
            "streamerSocketUrl": "wss://streamer-api.schwab.com/ws",
            "schwabClientCustomerId": "customer-1",
            "schwabClientCorrelId": "correl-1",
            "schwabClientChannel": "N9",
            "schwabClientFunctionId": "APIAPP"
        }],
        "offers": [{"level2Permissions": true, "mktDataPermission": "NP"}]
    })
}

#[tokio::test]
async fn test_fetch_caches_streamer_info() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/trader/v1/userPreference")
        .match_header("authorization", "Bearer token-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(preference_body().to_string())
        .create_async()
        .await;

    let client = SchwabClient::with_base_url("token-123", server.url()).unwrap();
    assert!(client.cached_streamer_info().is_none());
    assert!(matches!(
        client.streamer_info().await,
        Err(SchwabError::CredentialsUnavailable)
    ));

    let prefs = client.get_user_preference().await.unwrap();
    assert_eq!(prefs.accounts.len(), 1);
    assert_eq!(prefs.accounts[0].account_number.as_deref(), Some("12345678"));
    assert_eq!(prefs.streamer_info.len(), 1);

    let info = client.streamer_info().await.unwrap();
    assert_eq!(info.streamer_socket_url, "wss://streamer-api.schwab.com/ws");
    assert_eq!(info.schwab_client_customer_id, "customer-1");
    assert_eq!(info.schwab_client_function_id, "APIAPP");
    assert_eq!(client.cached_streamer_info(), Some(info));

    assert_eq!(
        StreamerInfoProvider::access_token(&client).await.unwrap(),
        "token-123"
    );
}

#[tokio::test]
async fn test_api_error_body() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/trader/v1/userPreference")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"message": "Unauthorized", "errors": ["access token expired"]}).to_string(),
        )
        .create_async()
        .await;

    let client = SchwabClient::with_base_url("stale", server.url()).unwrap();
    match client.get_user_preference().await {
        Err(SchwabError::Api(body)) => {
            assert_eq!(body.message.as_deref(), Some("Unauthorized"));
            assert_eq!(body.to_string(), "Unauthorized (access token expired)");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(client.cached_streamer_info().is_none());
}

#[tokio::test]
async fn test_plain_http_error() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/trader/v1/userPreference")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let client = SchwabClient::with_base_url("token", server.url()).unwrap();
    match client.get_user_preference().await {
        Err(SchwabError::HttpStatus { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[test]
fn test_rejects_bad_base_url() {
    assert!(matches!(
        SchwabClient::with_base_url("token", "not a url"),
        Err(SchwabError::Url(_))
    ));
}
