use crate::engine::assets::networks::NetworkCatalog;
use crate::engine::camera::framing::FrameView;
use crate::engine::core::params::{ControlOption, ViewerParams, control_specs};
use crate::engine::error::ParamError;
use crate::engine::loading::pack_loader::{LoadPack, PackEvent};
use crate::engine::loading::pack_session::PackSession;
use crate::engine::systems::snapshot::{SnapshotRequest, SnapshotSaved};
use crate::tools::picking::hit_test::HoverState;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication with the host page.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the control interface for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    publish_notifications,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Ownership moves to JS; the listener lives as long as the page.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
pub struct MessageQueue(pub std::sync::Arc<std::sync::Mutex<Vec<String>>>);

#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// Side effects requested by a handled call, applied by the calling system.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcAction {
    ApplyParameters(ViewerParams),
    LoadPack(String),
    FrameView,
    Snapshot,
}

/// Read-only state a handler may consult.
pub struct RpcContext<'a> {
    pub params: &'a ViewerParams,
    pub session: &'a PackSession,
    pub catalog: Option<&'a NetworkCatalog>,
}

#[allow(clippy::too_many_arguments)]
fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut params: ResMut<ViewerParams>,
    session: Res<PackSession>,
    catalog: Option<Res<NetworkCatalog>>,
    mut load_requests: EventWriter<LoadPack>,
    mut frame_requests: EventWriter<FrameView>,
    mut snapshot_requests: EventWriter<SnapshotRequest>,
) {
    for event in events.read() {
        let request = match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => request,
            Err(parse_error) => {
                warn!("Ignoring malformed RPC message: {}", parse_error);
                continue;
            }
        };
        debug!("RPC {}", request.method);

        let mut actions = Vec::new();
        let response = {
            let context = RpcContext {
                params: &params,
                session: &session,
                catalog: catalog.as_deref(),
            };
            handle_rpc_request(&request, &context, &mut actions)
        };

        for action in actions {
            match action {
                RpcAction::ApplyParameters(next) => {
                    if *params != next {
                        *params = next;
                    }
                }
                RpcAction::LoadPack(tag) => {
                    load_requests.write(LoadPack { tag });
                }
                RpcAction::FrameView => {
                    frame_requests.write(FrameView);
                }
                RpcAction::Snapshot => {
                    snapshot_requests.write(SnapshotRequest);
                }
            }
        }

        if let Some(response) = response {
            rpc_interface.queue_response(response);
        }
    }
}

/// Dispatch one request. Requests without an id are handled but not answered.
pub fn handle_rpc_request(
    request: &RpcRequest,
    context: &RpcContext,
    actions: &mut Vec<RpcAction>,
) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "get_parameters" => handle_get_parameters(context.params),
        "set_parameter" => handle_set_parameter(&request.params, context.params, actions),
        "list_controls" => handle_list_controls(context),
        "load_pack" => handle_load_pack(&request.params, context.params, actions),
        "reload_pack" => {
            actions.push(RpcAction::LoadPack(context.params.pack_tag.clone()));
            Ok(json!({ "success": true, "tag": context.params.pack_tag }))
        }
        "frame_view" => {
            actions.push(RpcAction::FrameView);
            Ok(json!({ "success": true }))
        }
        "snapshot" => {
            actions.push(RpcAction::Snapshot);
            Ok(json!({ "success": true }))
        }
        "get_pack_info" => Ok(context.session.pack_info()),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return request.id.clone().map(|id| {
                create_error_response(
                    id,
                    -32601,
                    "Method not found",
                    Some(json!({"method": request.method})),
                )
            });
        }
    };

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn handle_get_parameters(params: &ViewerParams) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(params).map_err(|e| RpcError::internal_error(&e.to_string()))
}

fn handle_set_parameter(
    request_params: &serde_json::Value,
    params: &ViewerParams,
    actions: &mut Vec<RpcAction>,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct SetParameterParams {
        name: String,
        value: serde_json::Value,
    }

    let parsed = serde_json::from_value::<SetParameterParams>(request_params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'name' and 'value' parameters"))?;

    let next = params.with_parameter(&parsed.name, &parsed.value)?;
    let result = json!({
        "success": true,
        "parameters": handle_get_parameters(&next)?,
    });
    actions.push(RpcAction::ApplyParameters(next));
    Ok(result)
}

fn handle_list_controls(context: &RpcContext) -> Result<serde_json::Value, RpcError> {
    let bundles = context
        .session
        .manifest()
        .map(|m| {
            m.bundles
                .iter()
                .map(|b| ControlOption {
                    id: b.id.clone(),
                    label: b.name.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    let networks = context
        .catalog
        .map(|c| {
            c.networks
                .iter()
                .map(|n| ControlOption {
                    id: n.id.clone(),
                    label: n.name.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    serde_json::to_value(control_specs(bundles, networks))
        .map(|controls| json!({ "controls": controls }))
        .map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// A new tag goes through the parameter diff; the current tag reloads.
fn handle_load_pack(
    request_params: &serde_json::Value,
    params: &ViewerParams,
    actions: &mut Vec<RpcAction>,
) -> Result<serde_json::Value, RpcError> {
    let tag = request_params
        .get("tag")
        .cloned()
        .ok_or_else(|| RpcError::invalid_params("Expected 'tag' parameter"))?;
    let next = params.with_parameter("pack", &tag)?;

    if next.pack_tag == params.pack_tag {
        actions.push(RpcAction::LoadPack(next.pack_tag.clone()));
    } else {
        info!("Pack change requested: {} -> {}", params.pack_tag, next.pack_tag);
    }
    let result = json!({ "success": true, "tag": next.pack_tag });
    actions.push(RpcAction::ApplyParameters(next));
    Ok(result)
}

/// Push state changes to the host page.
fn publish_notifications(
    mut rpc_interface: ResMut<WebRpcInterface>,
    session: Res<PackSession>,
    hover: Res<HoverState>,
    mut pack_events: EventReader<PackEvent>,
    mut snapshots: EventReader<SnapshotSaved>,
) {
    if session.is_changed() {
        rpc_interface.send_notification(
            "status_changed",
            json!({ "status": session.status_text(), "tag": session.tag() }),
        );
    }

    for event in pack_events.read() {
        if let PackEvent::ManifestAccepted {
            generation,
            tag,
            bundle_count,
        } = event
        {
            rpc_interface.send_notification(
                "pack_loaded",
                json!({
                    "tag": tag,
                    "generation": generation,
                    "bundleCount": bundle_count,
                    "info": session.pack_info(),
                }),
            );
        }
    }

    if hover.is_changed() && !hover.is_added() {
        rpc_interface.send_notification("hover_label", json!({ "label": hover.label }));
    }

    for saved in snapshots.read() {
        rpc_interface.send_notification("snapshot_saved", json!({ "path": saved.path }));
    }
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}

impl From<ParamError> for RpcError {
    fn from(err: ParamError) -> Self {
        let name = match &err {
            ParamError::Unknown(name) | ParamError::InvalidValue { name, .. } => name.clone(),
        };
        Self {
            code: -32602,
            message: err.to_string(),
            data: Some(json!({ "name": name })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, params: serde_json::Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id: Some(json!(7)),
        }
    }

    fn call(
        method: &str,
        params: serde_json::Value,
        viewer: &ViewerParams,
    ) -> (RpcResponse, Vec<RpcAction>) {
        let session = PackSession::default();
        let context = RpcContext {
            params: viewer,
            session: &session,
            catalog: None,
        };
        let mut actions = Vec::new();
        let response = handle_rpc_request(&request(method, params), &context, &mut actions).unwrap();
        (response, actions)
    }

    #[test]
    fn set_parameter_returns_new_snapshot() {
        let viewer = ViewerParams::default();
        let (response, actions) =
            call("set_parameter", json!({"name": "bundleOpacity", "value": 0.4}), &viewer);
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert!((result["parameters"]["bundleOpacity"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert!(matches!(&actions[..], [RpcAction::ApplyParameters(p)] if (p.bundle_opacity - 0.4).abs() < 1e-6));
    }

    #[test]
    fn invalid_parameter_is_invalid_params_error() {
        let viewer = ViewerParams::default();
        let (response, actions) =
            call("set_parameter", json!({"name": "cutaway", "value": 2.0}), &viewer);
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.data, Some(json!({"name": "cutaway"})));
        assert!(actions.is_empty());
    }

    #[test]
    fn load_pack_same_tag_reloads() {
        let viewer = ViewerParams::for_pack("v0.1");
        let (_, actions) = call("load_pack", json!({"tag": "v0.1"}), &viewer);
        assert!(actions.contains(&RpcAction::LoadPack("v0.1".into())));

        let (_, actions) = call("load_pack", json!({"tag": "v0.2"}), &viewer);
        assert!(!actions.iter().any(|a| matches!(a, RpcAction::LoadPack(_))));
        assert!(matches!(&actions[..], [RpcAction::ApplyParameters(p)] if p.pack_tag == "v0.2"));
    }

    #[test]
    fn list_controls_covers_every_parameter() {
        let viewer = ViewerParams::default();
        let (response, _) = call("list_controls", json!({}), &viewer);
        let controls = response.result.unwrap()["controls"].as_array().unwrap().len();
        assert_eq!(controls, control_specs(Vec::new(), Vec::new()).len());
    }

    #[test]
    fn unknown_method_is_not_found() {
        let (response, _) = call("tool_selection", json!({}), &ViewerParams::default());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn notifications_get_no_response_but_still_act() {
        let viewer = ViewerParams::default();
        let session = PackSession::default();
        let context = RpcContext {
            params: &viewer,
            session: &session,
            catalog: None,
        };
        let mut actions = Vec::new();
        let mut notification = request("frame_view", json!(null));
        notification.id = None;
        assert!(handle_rpc_request(&notification, &context, &mut actions).is_none());
        assert_eq!(actions, vec![RpcAction::FrameView]);
    }
}
