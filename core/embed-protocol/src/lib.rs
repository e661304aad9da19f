//! Embed protocol types and validation for the Flowdeck guest app.
//!
//! This crate is shared by the guest engine and anything that plays the host
//! (the vendor SDK shim, the simulator, tests) to prevent schema drift. The
//! engine remains the authority on behavior, but hosts can reuse the same
//! types to construct valid events.
//!
//! Wire format matches the JS SDK: every message is an envelope
//! `{"type": "<EVENT_NAME>", "data": {...}}` with camelCase payload fields.
//! Unknown fields are accepted — vendor SDKs add fields over time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events the host posts into the guest frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum VendorEvent {
    #[serde(rename = "VENDOR_INIT")]
    Init(VendorInit),
    #[serde(rename = "VENDOR_ROUTE_CHANGED")]
    RouteChanged(VendorRouteChanged),
}

/// Events the guest posts back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "CLIENT_INIT")]
    Init {},
    #[serde(rename = "CLIENT_ROUTE_CHANGED")]
    RouteChanged(ClientRouteChanged),
    #[serde(rename = "CLIENT_AUTHENTICATION_SUCCESS")]
    AuthenticationSuccess {},
    #[serde(rename = "CLIENT_AUTHENTICATION_FAILED")]
    AuthenticationFailed(Value),
    #[serde(rename = "CLIENT_CONFIGURATION_FINISHED")]
    ConfigurationFinished {},
}

impl VendorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VendorEvent::Init(_) => "VENDOR_INIT",
            VendorEvent::RouteChanged(_) => "VENDOR_ROUTE_CHANGED",
        }
    }
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Init {} => "CLIENT_INIT",
            ClientEvent::RouteChanged(_) => "CLIENT_ROUTE_CHANGED",
            ClientEvent::AuthenticationSuccess {} => "CLIENT_AUTHENTICATION_SUCCESS",
            ClientEvent::AuthenticationFailed(_) => "CLIENT_AUTHENTICATION_FAILED",
            ClientEvent::ConfigurationFinished {} => "CLIENT_CONFIGURATION_FINISHED",
        }
    }
}

/// Payload of `VENDOR_INIT`.
///
/// Only `jwtToken` is required by the schema; an empty token is still
/// rejected by the engine (silent no-op, logged locally).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorInit {
    #[serde(default)]
    pub jwt_token: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub mode: Option<ThemeMode>,
    #[serde(default)]
    pub hide_sidebar: Option<bool>,
    #[serde(default)]
    pub hide_flow_name_in_builder: Option<bool>,
    #[serde(default)]
    pub disable_navigation_in_builder: Option<NavigationOverride>,
    #[serde(default)]
    pub hide_folders: Option<bool>,
    #[serde(default)]
    pub sdk_version: Option<String>,
    #[serde(default)]
    pub font_url: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub initial_route: Option<String>,
    #[serde(default)]
    pub hide_export_and_import_flow: Option<bool>,
    #[serde(default)]
    pub emit_home_button_clicked_event: Option<bool>,
    #[serde(default)]
    pub home_button_icon: Option<HomeButtonIcon>,
    #[serde(default)]
    pub hide_duplicate_flow: Option<bool>,
    #[serde(default)]
    pub hide_flows_page_navbar: Option<bool>,
    #[serde(default)]
    pub hide_project_settings: Option<bool>,
}

impl VendorInit {
    /// True when the external token is present and non-empty.
    pub fn has_token(&self) -> bool {
        !self.jwt_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRouteChanged {
    pub vendor_route: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRouteChanged {
    pub route: String,
}

/// Tri-state builder-navigation override.
///
/// The wire value is either a boolean or the literal string
/// `"keep_home_button_only"`; the sentinel maps to a flag combination
/// distinct from both booleans (see `embed-core`'s per-path defaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavigationOverride {
    Toggle(bool),
    Keyword(NavigationKeyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKeyword {
    KeepHomeButtonOnly,
}

impl NavigationOverride {
    pub fn is_keep_home_button_only(&self) -> bool {
        matches!(self, NavigationOverride::Keyword(NavigationKeyword::KeepHomeButtonOnly))
    }

    /// The boolean value, if this is not the sentinel.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NavigationOverride::Toggle(value) => Some(*value),
            NavigationOverride::Keyword(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HomeButtonIcon {
    Back,
    #[default]
    Logo,
}

impl HomeButtonIcon {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "back" => Some(HomeButtonIcon::Back),
            "logo" => Some(HomeButtonIcon::Logo),
            _ => None,
        }
    }
}

/// Identity of the browsing context a message arrived from.
///
/// The origin check is source identity (the message must come from the known
/// parent context), not an origin-string comparison. Anything else is
/// ignored as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Parent,
    Other,
}
