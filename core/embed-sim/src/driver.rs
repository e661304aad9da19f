//! The reference embedding runtime: executes engine actions in list order.
//!
//! Plays the roles the browser shim would — runs the token exchange, writes
//! the session store, applies the embed state, drives the "router" (a
//! tracked location whose changes feed back into the engine), and forwards
//! outbound events to the host (stdout).

use tracing::{debug, info};

use embed_core::engine::{Action, EmbedEngine};
use embed_core::flags::EmbedStateStore;
use embed_core::session::{ExchangeError, Session, SessionStore, TokenExchanger};
use flowdeck_embed_protocol::{MessageSource, VendorEvent};

/// Stand-in for the managed-auth endpoint.
pub struct StubExchanger {
    pub project_id: String,
    pub fail: bool,
}

impl TokenExchanger for StubExchanger {
    fn exchange(&self, external_token: &str, locale: &str) -> Result<Session, ExchangeError> {
        debug!(locale, "Simulated token exchange");
        if self.fail {
            return Err(ExchangeError::new(
                "invalid_token",
                "simulated exchange failure",
            ));
        }
        Ok(Session::new(
            format!("internal-{}", external_token),
            self.project_id.clone(),
        ))
    }
}

/// What the driver prints for each action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only outbound client events (the host's view of the handshake).
    OutboundOnly,
    /// Every action, as executed.
    AllActions,
}

pub struct ScriptedHost<S: SessionStore> {
    engine: EmbedEngine,
    exchanger: StubExchanger,
    sessions: S,
    state: EmbedStateStore,
    location: Option<String>,
    verbosity: Verbosity,
    lines: Vec<String>,
}

impl<S: SessionStore> ScriptedHost<S> {
    pub fn new(exchanger: StubExchanger, sessions: S, verbosity: Verbosity) -> Self {
        ScriptedHost {
            engine: EmbedEngine::new(),
            exchanger,
            sessions,
            state: EmbedStateStore::new(),
            location: None,
            verbosity,
            lines: Vec::new(),
        }
    }

    pub fn start(&mut self, search: &str) -> Result<(), String> {
        let actions = self.engine.start(search);
        self.execute(actions)
    }

    pub fn deliver(&mut self, event: VendorEvent) -> Result<(), String> {
        let actions = self.engine.on_host_message(MessageSource::Parent, event);
        self.execute(actions)
    }

    pub fn engine(&self) -> &EmbedEngine {
        &self.engine
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn state(&self) -> &EmbedStateStore {
        &self.state
    }

    /// Drains the accumulated output lines.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    fn execute(&mut self, actions: Vec<Action>) -> Result<(), String> {
        for action in actions {
            if self.verbosity == Verbosity::AllActions {
                self.push_json(&action)?;
            }
            match action {
                Action::Send { event } => {
                    if self.verbosity == Verbosity::OutboundOnly {
                        self.push_json(&event)?;
                    } else {
                        info!(event = event.name(), "Outbound client event");
                    }
                }
                Action::Navigate { to } => {
                    info!(to = %to, "Guest navigation");
                    self.location = Some(to.clone());
                    let (pathname, search) = split_location(&to);
                    let mirrored = self.engine.on_guest_navigation(pathname, search);
                    self.execute(mirrored)?;
                }
                Action::ApplyState { state } => self.state.apply(state),
                Action::StoreSession { session, long_lived } => self
                    .sessions
                    .save(&session, long_lived)
                    .map_err(|e| e.to_string())?,
                Action::SetTheme { mode } => info!(mode = mode.as_str(), "Theme switched"),
                Action::WriteCssVars { vars } => {
                    debug!(count = vars.len(), "CSS variable overrides written");
                }
                Action::ExchangeToken { external_token, locale } => {
                    let result = self.exchanger.exchange(&external_token, &locale);
                    let actions = self.engine.on_exchange_result(result);
                    self.execute(actions)?;
                }
            }
        }
        Ok(())
    }

    fn push_json<T: serde::Serialize>(&mut self, value: &T) -> Result<(), String> {
        let line = serde_json::to_string(value).map_err(|e| e.to_string())?;
        self.lines.push(line);
        Ok(())
    }
}

fn split_location(location: &str) -> (&str, &str) {
    match location.find('?') {
        Some(index) => location.split_at(index),
        None => (location, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_core::lifecycle::EmbedPhase;
    use embed_core::session::MemorySessionStore;
    use flowdeck_embed_protocol::{ClientEvent, VendorInit, VendorRouteChanged};

    fn parse_client_event(line: &str) -> Option<ClientEvent> {
        serde_json::from_str(line).ok()
    }

    fn host(fail: bool) -> ScriptedHost<MemorySessionStore> {
        ScriptedHost::new(
            StubExchanger {
                project_id: "proj-sim".to_string(),
                fail,
            },
            MemorySessionStore::new(),
            Verbosity::OutboundOnly,
        )
    }

    #[test]
    fn sdk_script_runs_to_ready() {
        let mut sim = host(false);
        sim.start("").unwrap();
        sim.deliver(VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            ..VendorInit::default()
        }))
        .unwrap();

        assert_eq!(sim.engine().phase(), EmbedPhase::Ready);
        let names: Vec<String> = sim
            .take_lines()
            .iter()
            .map(|line| parse_client_event(line).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "CLIENT_INIT",
                "CLIENT_AUTHENTICATION_SUCCESS",
                "CLIENT_CONFIGURATION_FINISHED",
            ]
        );
    }

    #[test]
    fn failed_exchange_emits_failure_event() {
        let mut sim = host(true);
        sim.start("").unwrap();
        sim.deliver(VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            ..VendorInit::default()
        }))
        .unwrap();

        let lines = sim.take_lines();
        let last = parse_client_event(lines.last().unwrap()).unwrap();
        assert_eq!(last.name(), "CLIENT_AUTHENTICATION_FAILED");
    }

    #[test]
    fn vendor_route_change_moves_the_location() {
        let mut sim = host(false);
        sim.start("").unwrap();
        sim.deliver(VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            ..VendorInit::default()
        }))
        .unwrap();
        sim.deliver(VendorEvent::RouteChanged(VendorRouteChanged {
            vendor_route: "/connections".to_string(),
        }))
        .unwrap();

        assert_eq!(sim.location(), Some("/projects/proj-sim/connections"));
    }

    #[test]
    fn url_script_skips_notifications() {
        let mut sim = host(false);
        sim.start("?apToken=tok&hideSidebar=true").unwrap();

        assert_eq!(sim.engine().phase(), EmbedPhase::Ready);
        assert!(sim.state().state().hide_side_nav);
        assert!(sim.take_lines().is_empty());
    }
}
