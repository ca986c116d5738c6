//! IPC module for communication with the renderer document
//!
//! The renderer posts JSON envelopes to a WebKit script message handler;
//! pushes go back through a bridge object injected before the page loads.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Name of the script message handler the renderer posts to.
pub const HANDLER_NAME: &str = "sharkle";

/// DOM `MouseEvent.button` value of the secondary button.
pub const SECONDARY_BUTTON: i32 = 2;

/// Installed at document start. Gives the renderer `sharkle.send`,
/// `sharkle.on` and the `sharkle.receive` entry point used for pushes.
pub const BRIDGE_SCRIPT: &str = r#"(() => {
  const listeners = {};
  window.sharkle = {
    send(channel, payload) {
      window.webkit.messageHandlers.sharkle.postMessage({ channel, payload });
    },
    on(channel, listener) {
      (listeners[channel] = listeners[channel] || []).push(listener);
    },
    receive(message) {
      (listeners[message.channel] || []).forEach((listener) => listener(message.payload));
    },
  };
})();"#;

/// Messages sent from the renderer to the shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum RendererMessage {
    /// Pointer pressed inside the document
    MouseDown(MouseDown),
    /// Drag start: ask for the current window position
    GetWindowPosition,
    /// Drag update: move the window
    SetWindowPosition(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseDown {
    pub button: i32,
    pub x: i32,
    pub y: i32,
}

/// Pushes sent from the shell to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum RendererPush {
    /// Full settings snapshot
    LoadSettings(SettingsSnapshot),
    /// New window side length
    WindowResize(u32),
    /// New inverted flag
    InvertSharkie(bool),
    /// Reply to `get-window-position`
    WindowPosition(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub inverted: bool,
    pub size: u32,
    pub sleep_check_interval: u64,
}

pub fn parse_message(json: &str) -> Result<RendererMessage, serde_json::Error> {
    serde_json::from_str(json)
}

/// JavaScript statement delivering `push` to the renderer.
pub fn push_script(push: &RendererPush) -> Result<String, serde_json::Error> {
    let envelope = serde_json::to_string(push)?;
    Ok(format!("window.sharkle && window.sharkle.receive({envelope});"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_right_click() {
        let msg = parse_message(r#"{"channel":"mouse-down","payload":{"button":2,"x":31,"y":12}}"#)
            .unwrap();
        assert_eq!(
            msg,
            RendererMessage::MouseDown(MouseDown {
                button: SECONDARY_BUTTON,
                x: 31,
                y: 12
            })
        );
    }

    #[test]
    fn parses_position_query_without_payload() {
        let msg = parse_message(r#"{"channel":"get-window-position"}"#).unwrap();
        assert_eq!(msg, RendererMessage::GetWindowPosition);
    }

    #[test]
    fn parses_position_update() {
        let msg =
            parse_message(r#"{"channel":"set-window-position","payload":{"x":-20,"y":400}}"#)
                .unwrap();
        assert_eq!(msg, RendererMessage::SetWindowPosition(Point::new(-20, 400)));
    }

    #[test]
    fn rejects_unknown_channel() {
        assert!(parse_message(r#"{"channel":"feed-sharkle","payload":1}"#).is_err());
    }

    #[test]
    fn load_settings_uses_renderer_field_names() {
        let push = RendererPush::LoadSettings(SettingsSnapshot {
            inverted: true,
            size: 140,
            sleep_check_interval: 60_000,
        });
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({
                "channel": "load-settings",
                "payload": { "inverted": true, "size": 140, "sleepCheckInterval": 60000 }
            })
        );
    }

    #[test]
    fn scalar_pushes_keep_channel_names() {
        assert_eq!(
            serde_json::to_value(RendererPush::WindowResize(80)).unwrap(),
            json!({ "channel": "window-resize", "payload": 80 })
        );
        assert_eq!(
            serde_json::to_value(RendererPush::InvertSharkie(false)).unwrap(),
            json!({ "channel": "invert-sharkie", "payload": false })
        );
    }

    #[test]
    fn push_script_calls_bridge() {
        let script = push_script(&RendererPush::WindowResize(240)).unwrap();
        assert_eq!(
            script,
            r#"window.sharkle && window.sharkle.receive({"channel":"window-resize","payload":240});"#
        );
    }
}
