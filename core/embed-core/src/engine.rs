//! The guest embedding engine.
//!
//! Sans-IO orchestrator for the handshake: inbound signals (the startup
//! query string, host messages, exchange completions, guest navigations) go
//! in, an ordered list of [`Action`]s comes out. The embedding runtime owns
//! the transports — it posts `Send` actions to the parent context, runs the
//! token exchange, writes the session store, applies the embed state, and
//! drives the router.
//!
//! # Ordering guarantee
//!
//! Within one transition's actions, `ApplyState` always precedes `Navigate`:
//! the navigation must observe the new state, never a stale one. Runtimes
//! must execute actions in list order.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use flowdeck_embed_protocol::{
    ClientEvent, ClientRouteChanged, MessageSource, ThemeMode, VendorEvent, VendorInit,
};

use crate::flags::EmbedState;
use crate::lifecycle::{next_phase, EmbedPhase, PhaseSignal};
use crate::query::QueryInit;
use crate::routes;
use crate::session::{ExchangeError, Session};
use crate::theme::{self, CssVarWrite};

/// Default initial route for SDK-path initialization.
const SDK_DEFAULT_ROUTE: &str = "/";

/// An effect the embedding runtime must execute, in list order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Post an event to the parent context.
    Send { event: ClientEvent },
    /// Drive the guest router to this target.
    Navigate { to: String },
    /// Replace the process-wide embed state wholesale.
    ApplyState { state: EmbedState },
    /// Persist the session to durable client storage.
    StoreSession { session: Session, long_lived: bool },
    /// Switch the color scheme.
    SetTheme { mode: ThemeMode },
    /// Write CSS custom properties with override priority.
    WriteCssVars { vars: Vec<CssVarWrite> },
    /// Run the token exchange and feed the result back through
    /// [`EmbedEngine::on_exchange_result`].
    ExchangeToken { external_token: String, locale: String },
}

#[derive(Debug, Clone)]
enum PendingInit {
    Sdk(VendorInit),
    Url(QueryInit),
}

impl PendingInit {
    fn is_sdk(&self) -> bool {
        matches!(self, PendingInit::Sdk(_))
    }
}

/// The guest-side handshake state machine.
#[derive(Debug, Default)]
pub struct EmbedEngine {
    phase: Option<EmbedPhase>,
    init_listener_active: bool,
    host_nav_enabled: bool,
    client_nav_enabled: bool,
    /// Set when the initial navigation has been emitted but not yet reported
    /// back; the report arms the mirror without being mirrored itself.
    nav_subscription_pending: bool,
    project_id: Option<String>,
    pending: Option<PendingInit>,
}

impl EmbedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> EmbedPhase {
        self.phase.unwrap_or(EmbedPhase::Uninitialized)
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    fn advance(&mut self, signal: PhaseSignal) {
        self.phase = Some(next_phase(self.phase(), signal));
    }

    /// Startup entry point; runs exactly once per engine.
    ///
    /// Chooses between the two mutually exclusive initialization paths from
    /// the page's search string.
    pub fn start(&mut self, search: &str) -> Vec<Action> {
        if self.phase.is_some() {
            warn!("Embed engine already started; ignoring repeat start");
            return Vec::new();
        }
        self.phase = Some(EmbedPhase::Uninitialized);

        let query = QueryInit::parse(search);
        if !query.wants_url_init() {
            // SDK path: announce ourselves and wait for VENDOR_INIT.
            self.init_listener_active = true;
            self.advance(PhaseSignal::SdkHelloSent);
            return vec![Action::Send {
                event: ClientEvent::Init {},
            }];
        }

        let mut actions = Vec::new();
        if let Some(mode) = query.mode {
            actions.push(Action::SetTheme { mode });
        }
        if let Some(primary) = query.primary_color.as_deref().filter(|c| !c.is_empty()) {
            match theme::primary_color_overrides(
                primary,
                query.primary_color_light.as_deref().filter(|c| !c.is_empty()),
                query.primary_color_dark.as_deref().filter(|c| !c.is_empty()),
            ) {
                Ok(vars) => actions.push(Action::WriteCssVars { vars }),
                Err(err) => warn!(error = %err, "Failed to apply primary color overrides"),
            }
        }

        if let Some(token) = query.external_token() {
            actions.push(Action::ExchangeToken {
                external_token: token.to_string(),
                locale: query.locale.clone(),
            });
            self.advance(PhaseSignal::UrlInitStarted);
            self.pending = Some(PendingInit::Url(query));
        } else if let Some(token) = query.ap_token() {
            // Pre-exchanged token: no network round-trip, empty project scope.
            let session = Session::from_pre_exchanged(token);
            self.project_id = Some(session.project_id.clone());
            actions.push(Action::StoreSession {
                session,
                long_lived: true,
            });
            actions.push(Action::ApplyState {
                state: EmbedState::from_query(&query),
            });
            actions.push(Action::Navigate {
                to: format!("{}{}", query.initial_route, query.raw_search),
            });
            self.nav_subscription_pending = true;
            self.advance(PhaseSignal::UrlInitStarted);
            self.advance(PhaseSignal::SessionEstablished);
        }
        actions
    }

    /// Handles a message posted into the guest frame.
    ///
    /// Messages from anything but the parent context are ignored.
    pub fn on_host_message(&mut self, source: MessageSource, event: VendorEvent) -> Vec<Action> {
        if source != MessageSource::Parent {
            debug!(event = event.name(), "Ignoring message from non-parent source");
            return Vec::new();
        }

        match event {
            VendorEvent::Init(init) => self.on_vendor_init(init),
            VendorEvent::RouteChanged(changed) => {
                if !self.host_nav_enabled {
                    return Vec::new();
                }
                let project_id = self.project_id.as_deref().unwrap_or("");
                vec![Action::Navigate {
                    to: routes::guest_target_for_host_route(&changed.vendor_route, project_id),
                }]
            }
        }
    }

    fn on_vendor_init(&mut self, init: VendorInit) -> Vec<Action> {
        if !self.init_listener_active {
            return Vec::new();
        }
        if !init.has_token() {
            // Silent from the host's perspective: no event is surfaced.
            error!("Token sent via the SDK is empty");
            return Vec::new();
        }

        let mut actions = Vec::new();
        if let Some(mode) = init.mode {
            actions.push(Action::SetTheme { mode });
        }
        let locale = init.locale.clone().unwrap_or_else(|| "en".to_string());
        actions.push(Action::ExchangeToken {
            external_token: init.jwt_token.clone(),
            locale,
        });
        self.advance(PhaseSignal::VendorInitAccepted);
        // Last init wins if a second VENDOR_INIT arrives mid-exchange.
        self.pending = Some(PendingInit::Sdk(init));
        actions
    }

    /// Completion of the single-flight token exchange.
    pub fn on_exchange_result(
        &mut self,
        result: Result<Session, ExchangeError>,
    ) -> Vec<Action> {
        if self.phase() != EmbedPhase::Authenticating {
            warn!(phase = self.phase().as_str(), "Ignoring exchange completion outside authentication");
            return Vec::new();
        }
        let Some(pending) = self.pending.take() else {
            warn!("Exchange completed with no pending initialization");
            return Vec::new();
        };

        match result {
            Ok(session) => self.finish_init(pending, session),
            Err(err) => {
                let sdk_path = pending.is_sdk();
                self.advance(PhaseSignal::ExchangeFailed { sdk_path });
                if sdk_path {
                    let payload = serde_json::to_value(&err).unwrap_or(Value::Null);
                    vec![Action::Send {
                        event: ClientEvent::AuthenticationFailed(payload),
                    }]
                } else {
                    // Not surfaced to the host on this path; see DESIGN.md.
                    error!(error = %err, "Token exchange failed during URL-parameter initialization");
                    Vec::new()
                }
            }
        }
    }

    fn finish_init(&mut self, pending: PendingInit, session: Session) -> Vec<Action> {
        self.project_id = Some(session.project_id.clone());
        let mut actions = vec![Action::StoreSession {
            session,
            long_lived: true,
        }];

        match &pending {
            PendingInit::Sdk(init) => {
                let initial_route = init
                    .initial_route
                    .clone()
                    .unwrap_or_else(|| SDK_DEFAULT_ROUTE.to_string());
                actions.push(Action::ApplyState {
                    state: EmbedState::from_vendor_init(init, &initial_route),
                });
                actions.push(Action::Navigate { to: initial_route });
                self.host_nav_enabled = true;
                self.nav_subscription_pending = true;
                actions.push(Action::Send {
                    event: ClientEvent::AuthenticationSuccess {},
                });
                actions.push(Action::Send {
                    event: ClientEvent::ConfigurationFinished {},
                });
            }
            PendingInit::Url(query) => {
                actions.push(Action::ApplyState {
                    state: EmbedState::from_query(query),
                });
                actions.push(Action::Navigate {
                    to: format!("{}{}", query.initial_route, query.raw_search),
                });
                self.nav_subscription_pending = true;
            }
        }

        self.advance(PhaseSignal::SessionEstablished);
        actions
    }

    /// Mirrors a guest navigation to the host, project scope stripped.
    ///
    /// The runtime must report every navigation, including ones it executed
    /// for a `Navigate` action. The report of the initial navigation arms
    /// the mirror — the subscription registers after the first navigate, so
    /// that navigation itself is never forwarded.
    pub fn on_guest_navigation(&mut self, pathname: &str, search: &str) -> Vec<Action> {
        if self.nav_subscription_pending {
            self.nav_subscription_pending = false;
            self.client_nav_enabled = true;
            return Vec::new();
        }
        if !self.client_nav_enabled {
            return Vec::new();
        }
        vec![Action::Send {
            event: ClientEvent::RouteChanged(ClientRouteChanged {
                route: routes::host_route_for_guest_location(pathname, search),
            }),
        }]
    }

    /// Component teardown: deregisters the SDK init listener.
    ///
    /// The route subscriptions deliberately survive — they have no teardown
    /// path for the page's lifetime.
    pub fn teardown(&mut self) {
        self.init_listener_active = false;
    }
}
