//! URL-parameter initialization channel.
//!
//! Vendors that cannot load the SDK pass everything through the iframe query
//! string instead. Parsing follows the SDK's JS semantics exactly: boolean
//! parameters accept only the literal strings `"true"`, `"1"`, and `"yes"`
//! (case-sensitive, no trimming), token presence is truthiness (an empty
//! `externalToken=` does not select this channel), and `locale`/`route`
//! defaults apply only when the parameter is missing entirely.

use std::collections::HashMap;

use flowdeck_embed_protocol::{HomeButtonIcon, NavigationKeyword, NavigationOverride, ThemeMode};
use url::form_urlencoded;

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_INITIAL_ROUTE: &str = "/flows";

const NAVIGATION_SENTINEL: &str = "keep_home_button_only";

/// Parses a boolean-like query value.
///
/// True iff the value is exactly `"true"`, `"1"`, or `"yes"`. Everything
/// else — including `"TRUE"`, `""`, and a missing parameter — is false.
pub fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1") | Some("yes"))
}

/// Everything the URL-parameter channel can carry, decoded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInit {
    /// Raw `externalToken` value; may be present but empty.
    pub external_token: Option<String>,
    /// Raw `apToken` value; may be present but empty.
    pub ap_token: Option<String>,
    pub locale: String,
    pub initial_route: String,
    pub mode: Option<ThemeMode>,
    pub hide_sidebar: bool,
    pub hide_flows_page_navbar: bool,
    pub hide_folders: bool,
    pub hide_export_and_import_flow: bool,
    pub hide_duplicate_flow: bool,
    pub hide_project_settings: bool,
    pub hide_flow_name_in_builder: bool,
    /// `None` when the parameter is unset or parsed false, so the per-path
    /// default (navigation disabled) applies downstream.
    pub disable_navigation_in_builder: Option<NavigationOverride>,
    pub emit_home_button_clicked_event: bool,
    pub home_button_icon: HomeButtonIcon,
    pub font_url: Option<String>,
    pub font_family: Option<String>,
    pub hide_tutorials: bool,
    pub hide_logo: bool,
    pub primary_color: Option<String>,
    pub primary_color_light: Option<String>,
    pub primary_color_dark: Option<String>,
    /// The original search string, normalized to start with `?` when
    /// non-empty. Re-appended to the initial navigation so embed flags
    /// survive the first route change.
    pub raw_search: String,
}

impl QueryInit {
    /// Decodes a search string (with or without the leading `?`).
    ///
    /// Repeated parameters keep the first occurrence, matching
    /// `URLSearchParams.get`.
    pub fn parse(search: &str) -> Self {
        let trimmed = search.strip_prefix('?').unwrap_or(search);
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in form_urlencoded::parse(trimmed.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        let get = |name: &str| params.get(name).map(String::as_str);

        let mode = match get("mode") {
            None | Some("") => None,
            Some(raw) => {
                let parsed = ThemeMode::from_str(raw);
                if parsed.is_none() {
                    tracing::debug!(mode = raw, "Ignoring unrecognized mode parameter");
                }
                parsed
            }
        };

        let disable_navigation_in_builder = match get("disableNavigationInBuilder") {
            Some(NAVIGATION_SENTINEL) => {
                Some(NavigationOverride::Keyword(NavigationKeyword::KeepHomeButtonOnly))
            }
            raw if parse_bool(raw) => Some(NavigationOverride::Toggle(true)),
            _ => None,
        };

        let home_button_icon = get("homeButtonIcon")
            .and_then(HomeButtonIcon::from_str)
            .unwrap_or_default();

        let raw_search = if trimmed.is_empty() {
            String::new()
        } else {
            format!("?{}", trimmed)
        };

        QueryInit {
            external_token: params.get("externalToken").cloned(),
            ap_token: params.get("apToken").cloned(),
            locale: params
                .get("locale")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            initial_route: params
                .get("route")
                .cloned()
                .unwrap_or_else(|| DEFAULT_INITIAL_ROUTE.to_string()),
            mode,
            hide_sidebar: parse_bool(get("hideSidebar")),
            hide_flows_page_navbar: parse_bool(get("hideFlowsPageNavbar")),
            hide_folders: parse_bool(get("hideFolders")),
            hide_export_and_import_flow: parse_bool(get("hideExportAndImportFlow")),
            hide_duplicate_flow: parse_bool(get("hideDuplicateFlow")),
            hide_project_settings: parse_bool(get("hideProjectSettings")),
            hide_flow_name_in_builder: parse_bool(get("hideFlowNameInBuilder")),
            disable_navigation_in_builder,
            emit_home_button_clicked_event: parse_bool(get("emitHomeButtonClickedEvent")),
            home_button_icon,
            font_url: params.get("fontUrl").cloned(),
            font_family: params.get("fontFamily").cloned(),
            hide_tutorials: parse_bool(get("hideTutorials")),
            hide_logo: parse_bool(get("hideLogo")),
            primary_color: params.get("primaryColor").cloned(),
            primary_color_light: params.get("primaryColorLight").cloned(),
            primary_color_dark: params.get("primaryColorDark").cloned(),
            raw_search,
        }
    }

    /// The external token, if present and non-empty.
    pub fn external_token(&self) -> Option<&str> {
        self.external_token.as_deref().filter(|t| !t.is_empty())
    }

    /// The pre-exchanged internal token, if present and non-empty.
    pub fn ap_token(&self) -> Option<&str> {
        self.ap_token.as_deref().filter(|t| !t.is_empty())
    }

    /// True when either token selects URL-parameter initialization.
    pub fn wants_url_init(&self) -> bool {
        self.external_token().is_some() || self.ap_token().is_some()
    }
}
