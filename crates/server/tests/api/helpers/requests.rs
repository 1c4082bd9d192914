use crate::helpers::TestApp;
use serde::de::DeserializeOwned;
use serde_json::Value;
use vcloud_server::web::types::Response;

pub async fn get_response(app: &TestApp, endpoint: &str, bearer: &str) -> reqwest::Response {
    app.client
        .get(endpoint)
        .bearer_auth(bearer)
        .send()
        .await
        .unwrap()
}

pub async fn post_response(
    app: &TestApp,
    endpoint: &str,
    bearer: &str,
    payload: &Value,
) -> reqwest::Response {
    app.client
        .post(endpoint)
        .bearer_auth(bearer)
        .json(&payload)
        .send()
        .await
        .unwrap()
}

pub async fn delete_response(app: &TestApp, endpoint: &str, bearer: &str) -> reqwest::Response {
    app.client
        .delete(endpoint)
        .bearer_auth(bearer)
        .send()
        .await
        .unwrap()
}

pub async fn get_result<T>(app: &TestApp, endpoint: &str, bearer: &str) -> T
where
    T: DeserializeOwned,
{
    get_response(app, endpoint, bearer)
        .await
        .json::<Response<T>>()
        .await
        .unwrap()
        .result
}
