use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::ChateryClient;
use crate::dispatch::build_request;
use crate::error::{ChateryError, Result};
use crate::params::NodeParameters;
use crate::resource::{Operation, Resource};

/// Index of the input item an output record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One output record of the action node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionItem {
    pub json: Value,
    #[serde(rename = "pairedItem")]
    pub paired_item: PairedItem,
}

impl ExecutionItem {
    fn new(json: Value, item: usize) -> Self {
        Self {
            json,
            paired_item: PairedItem { item },
        }
    }
}

/// The action node: runs one operation for every input item.
pub struct ActionNode {
    client: ChateryClient,
    continue_on_fail: bool,
}

impl ActionNode {
    pub fn new(client: ChateryClient, continue_on_fail: bool) -> Self {
        Self {
            client,
            continue_on_fail,
        }
    }

    /// Execute `resource.operation` once per item, in order.
    ///
    /// With `continue_on_fail`, a failing item yields `{"error": message}` and
    /// the batch carries on; otherwise the first failure is returned. An
    /// unknown resource or operation fails every item before any request.
    pub async fn execute(
        &self,
        resource: &str,
        operation: &str,
        items: &[NodeParameters],
    ) -> Result<Vec<ExecutionItem>> {
        let operation = match resolve(resource, operation) {
            Ok(operation) => operation,
            Err(e) if self.continue_on_fail => {
                warn!("{}, recording an error for {} item(s)", e, items.len());
                return Ok((0..items.len()).map(|index| error_item(&e, index)).collect());
            }
            Err(e) => return Err(e),
        };

        info!(
            "Executing {:?} for {} item(s) against {}",
            operation,
            items.len(),
            self.client.credentials().url
        );

        let mut output = Vec::new();
        for (index, params) in items.iter().enumerate() {
            match self.run_item(operation, params).await {
                Ok(response) => output.extend(into_items(response, index)),
                Err(e) if self.continue_on_fail => {
                    warn!("Item {} failed, continuing: {}", index, e);
                    output.push(error_item(&e, index));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(output)
    }

    async fn run_item(&self, operation: Operation, params: &NodeParameters) -> Result<Value> {
        let spec = build_request(operation, params)?;
        self.client.execute(&spec).await
    }
}

fn resolve(resource: &str, operation: &str) -> Result<Operation> {
    let resource: Resource = resource.parse()?;
    Operation::parse(resource, operation)
}

fn error_item(error: &ChateryError, index: usize) -> ExecutionItem {
    ExecutionItem::new(json!({ "error": error.to_string() }), index)
}

/// Array responses fan out into one record per element.
fn into_items(response: Value, index: usize) -> Vec<ExecutionItem> {
    match response {
        Value::Array(values) => values
            .into_iter()
            .map(|v| ExecutionItem::new(v, index))
            .collect(),
        other => vec![ExecutionItem::new(other, index)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn node_for(server: &MockServer, continue_on_fail: bool) -> ActionNode {
        let client = ChateryClient::new(Credentials::new(server.uri(), None));
        ActionNode::new(client, continue_on_fail)
    }

    fn text_item(chat_id: &str) -> NodeParameters {
        NodeParameters::new()
            .with("sessionId", "s1")
            .with("chatId", chat_id)
            .with("message", "hello")
    }

    async fn mount_send_text(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/whatsapp/chats/send-text"))
            .and(body_partial_json(json!({"chatId": "bad@c.us"})))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid chat"))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/whatsapp/chats/send-text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_executes_every_item() {
        let server = MockServer::start().await;
        mount_send_text(&server).await;

        let items = vec![text_item("1@c.us"), text_item("2@c.us")];
        let output = node_for(&server, false)
            .execute("chat", "sendText", &items)
            .await
            .unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output[1].paired_item.item, 1);
        assert_eq!(output[0].json, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_continue_on_fail_records_error() {
        let server = MockServer::start().await;
        mount_send_text(&server).await;

        let items = vec![text_item("bad@c.us"), text_item("2@c.us")];
        let output = node_for(&server, true)
            .execute("chat", "sendText", &items)
            .await
            .unwrap();

        assert_eq!(output.len(), 2);
        let error = output[0].json["error"].as_str().unwrap();
        assert!(error.contains("invalid chat"));
        assert_eq!(output[0].paired_item.item, 0);
        assert_eq!(output[1].json, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_failure_aborts_without_continue_on_fail() {
        let server = MockServer::start().await;
        mount_send_text(&server).await;

        let items = vec![text_item("bad@c.us"), text_item("2@c.us")];
        let err = node_for(&server, false)
            .execute("chat", "sendText", &items)
            .await
            .unwrap_err();

        assert!(matches!(err, ChateryError::Api { .. }));
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
    }

    #[tokio::test]
    async fn test_array_response_fans_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/whatsapp/sessions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}, {"id": "b"}])),
            )
            .mount(&server)
            .await;

        let output = node_for(&server, false)
            .execute("session", "list", &[NodeParameters::new()])
            .await
            .unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output[1].json, json!({"id": "b"}));
        assert_eq!(output[1].paired_item.item, 0);
    }

    #[tokio::test]
    async fn test_unknown_operation_fails_without_continue_on_fail() {
        let server = MockServer::start().await;

        let err = node_for(&server, false)
            .execute("chat", "sendFax", &[text_item("1@c.us")])
            .await
            .unwrap_err();

        assert!(matches!(err, ChateryError::UnknownOperation { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_operation_is_error_per_item_with_continue_on_fail() {
        let server = MockServer::start().await;

        let items = vec![text_item("1@c.us"), text_item("2@c.us")];
        let output = node_for(&server, true)
            .execute("chat", "sendFax", &items)
            .await
            .unwrap();

        assert_eq!(output.len(), 2);
        for (index, item) in output.iter().enumerate() {
            assert_eq!(item.paired_item.item, index);
            assert_eq!(
                item.json,
                json!({"error": "Unknown operation: sendFax (resource: chat)"})
            );
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_resource_is_error_per_item_with_continue_on_fail() {
        let server = MockServer::start().await;

        let output = node_for(&server, true)
            .execute("calendar", "list", &[NodeParameters::new()])
            .await
            .unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(output[0].paired_item.item, 0);
        assert_eq!(output[0].json, json!({"error": "Unknown resource: calendar"}));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_parameter_is_item_error() {
        let server = MockServer::start().await;
        mount_send_text(&server).await;

        let items = vec![NodeParameters::new().with("sessionId", "s1")];
        let output = node_for(&server, true)
            .execute("chat", "sendText", &items)
            .await
            .unwrap();

        assert_eq!(output[0].json, json!({"error": "Missing parameter: chatId"}));
    }

    #[test]
    fn test_execution_item_serializes_like_host_items() {
        let item = ExecutionItem::new(json!({"ok": true}), 3);
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"json": {"ok": true}, "pairedItem": {"item": 3}})
        );
    }
}
