use serde_json::Value;

/// POSTs a JSON body and returns the status with the decoded response body
/// (`Null` when the body is not JSON).
#[cfg(target_arch = "wasm32")]
pub async fn post_json(url: &str, body: &Value) -> anyhow::Result<(u16, Value)> {
    use spin_sdk::http::{Method, Request, Response};

    let req = Request::builder()
        .method(Method::Post)
        .uri(url)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(body)?)
        .build();
    let resp: Response = spin_sdk::http::send(req).await?;
    let value = serde_json::from_slice(resp.body()).unwrap_or(Value::Null);
    Ok((*resp.status(), value))
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn post_json(url: &str, body: &Value) -> anyhow::Result<(u16, Value)> {
    let resp = reqwest::Client::new().post(url).json(body).send().await?;
    let status = resp.status().as_u16();
    let value = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, value))
}
