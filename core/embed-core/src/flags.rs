//! Embed UI flags and the process-wide state holder.
//!
//! `EmbedState` is built once per initialization and replaced wholesale —
//! never merged — so the rendering layer always sees one coherent
//! configuration. The two constructors encode the per-path defaults, which
//! differ on purpose: the SDK payload distinguishes "absent" from `false`,
//! while the query channel collapses a false parse into "absent".

use serde::{Deserialize, Serialize};

use flowdeck_embed_protocol::{HomeButtonIcon, NavigationOverride, VendorInit};

use crate::query::QueryInit;

/// Initial routes under this prefix render on the dark connection picker.
const DARK_BACKGROUND_ROUTE_PREFIX: &str = "/embed/connections";

/// Visibility and behavior flags consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmbedState {
    pub is_embedded: bool,
    pub hide_side_nav: bool,
    pub hide_flow_name_in_builder: bool,
    pub disable_navigation_in_builder: bool,
    pub hide_folders: bool,
    pub sdk_version: Option<String>,
    pub font_url: Option<String>,
    pub font_family: Option<String>,
    pub use_dark_background: bool,
    pub hide_export_and_import_flow: bool,
    pub hide_home_button_in_builder: bool,
    pub emit_home_button_clicked_event: bool,
    pub home_button_icon: HomeButtonIcon,
    pub hide_duplicate_flow: bool,
    pub hide_flows_page_navbar: bool,
    pub hide_project_settings: bool,
    pub hide_tutorials: bool,
    pub hide_logo: bool,
}

impl EmbedState {
    /// Flags for an SDK (`VENDOR_INIT`) initialization.
    ///
    /// `initial_route` is the resolved route (the payload's `initialRoute`
    /// or `/`), needed here because the dark background is derived from it.
    pub fn from_vendor_init(init: &VendorInit, initial_route: &str) -> Self {
        // Navigation is disabled unless the vendor explicitly sent `false`;
        // the sentinel keeps navigation disabled but shows the home button.
        let disable_navigation_in_builder = !matches!(
            init.disable_navigation_in_builder,
            Some(NavigationOverride::Toggle(false))
        );
        let hide_home_button_in_builder = match init.disable_navigation_in_builder {
            Some(nav) if nav.is_keep_home_button_only() => false,
            Some(nav) => nav.as_bool().unwrap_or(false),
            None => false,
        };

        EmbedState {
            is_embedded: true,
            hide_side_nav: init.hide_sidebar.unwrap_or(false),
            hide_flow_name_in_builder: init.hide_flow_name_in_builder.unwrap_or(false),
            disable_navigation_in_builder,
            hide_folders: init.hide_folders.unwrap_or(false),
            sdk_version: init.sdk_version.clone(),
            font_url: init.font_url.clone(),
            font_family: init.font_family.clone(),
            use_dark_background: initial_route.starts_with(DARK_BACKGROUND_ROUTE_PREFIX),
            hide_export_and_import_flow: init.hide_export_and_import_flow.unwrap_or(false),
            hide_home_button_in_builder,
            emit_home_button_clicked_event: init.emit_home_button_clicked_event.unwrap_or(false),
            home_button_icon: init.home_button_icon.unwrap_or_default(),
            hide_duplicate_flow: init.hide_duplicate_flow.unwrap_or(false),
            hide_flows_page_navbar: init.hide_flows_page_navbar.unwrap_or(false),
            hide_project_settings: init.hide_project_settings.unwrap_or(false),
            // Not settable through the SDK payload.
            hide_tutorials: false,
            hide_logo: false,
        }
    }

    /// Flags for a URL-parameter initialization.
    ///
    /// Here an unset navigation override defaults to `true` for both the
    /// navigation and home-button flags; the sentinel forces both to
    /// `false`, distinct from either boolean input.
    pub fn from_query(query: &QueryInit) -> Self {
        let (disable_navigation_in_builder, hide_home_button_in_builder) =
            match query.disable_navigation_in_builder {
                Some(nav) if nav.is_keep_home_button_only() => (false, false),
                Some(nav) => {
                    let value = nav.as_bool().unwrap_or(true);
                    (value, value)
                }
                None => (true, true),
            };

        EmbedState {
            is_embedded: true,
            hide_side_nav: query.hide_sidebar,
            hide_flow_name_in_builder: query.hide_flow_name_in_builder,
            disable_navigation_in_builder,
            hide_folders: query.hide_folders,
            sdk_version: None,
            font_url: query.font_url.clone(),
            font_family: query.font_family.clone(),
            use_dark_background: query.initial_route.starts_with(DARK_BACKGROUND_ROUTE_PREFIX),
            hide_export_and_import_flow: query.hide_export_and_import_flow,
            hide_home_button_in_builder,
            emit_home_button_clicked_event: query.emit_home_button_clicked_event,
            home_button_icon: query.home_button_icon,
            hide_duplicate_flow: query.hide_duplicate_flow,
            hide_flows_page_navbar: query.hide_flows_page_navbar,
            hide_project_settings: query.hide_project_settings,
            hide_tutorials: query.hide_tutorials,
            hide_logo: query.hide_logo,
        }
    }
}

/// Process-wide holder for the active `EmbedState`.
///
/// `apply` is a full overwrite. The generation counter increments on every
/// apply so the embedding runtime can assert that a state write landed
/// before the navigation that follows it was executed.
#[derive(Debug, Default)]
pub struct EmbedStateStore {
    current: EmbedState,
    generation: u64,
}

impl EmbedStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, state: EmbedState) {
        self.current = state;
        self.generation += 1;
    }

    pub fn state(&self) -> &EmbedState {
        &self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
