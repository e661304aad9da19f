//! End-to-end handshake scenarios: a minimal embedding runtime drives the
//! engine the way the browser shim would, executing actions in list order.

use embed_core::engine::{Action, EmbedEngine};
use embed_core::flags::EmbedStateStore;
use embed_core::lifecycle::EmbedPhase;
use embed_core::session::{
    ExchangeError, MemorySessionStore, Session, SessionStore, TokenExchanger,
};
use flowdeck_embed_protocol::{ClientEvent, MessageSource, VendorEvent, VendorInit};

/// Stub exchange endpoint: accepts everything unless told to fail.
struct StubExchanger {
    project_id: String,
    fail: bool,
}

impl TokenExchanger for StubExchanger {
    fn exchange(&self, external_token: &str, _locale: &str) -> Result<Session, ExchangeError> {
        if self.fail {
            return Err(ExchangeError::new("invalid_token", "upstream rejected the token"));
        }
        Ok(Session::new(
            format!("internal-{}", external_token),
            self.project_id.clone(),
        ))
    }
}

/// Executes engine actions the way a host runtime must: in order, feeding
/// exchange completions and navigations back into the engine.
struct Harness {
    engine: EmbedEngine,
    exchanger: StubExchanger,
    sessions: MemorySessionStore,
    state: EmbedStateStore,
    outbound: Vec<ClientEvent>,
    location: Option<String>,
    /// Store generation observed at each navigation, for ordering asserts.
    generation_at_navigation: Vec<u64>,
}

impl Harness {
    fn new(exchanger: StubExchanger) -> Self {
        Harness {
            engine: EmbedEngine::new(),
            exchanger,
            sessions: MemorySessionStore::new(),
            state: EmbedStateStore::new(),
            outbound: Vec::new(),
            location: None,
            generation_at_navigation: Vec::new(),
        }
    }

    fn start(&mut self, search: &str) {
        let actions = self.engine.start(search);
        self.execute(actions);
    }

    fn deliver(&mut self, source: MessageSource, event: VendorEvent) {
        let actions = self.engine.on_host_message(source, event);
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Send { event } => self.outbound.push(event),
                Action::Navigate { to } => {
                    self.generation_at_navigation.push(self.state.generation());
                    self.location = Some(to.clone());
                    // The router subscription fires on every navigation.
                    let (pathname, search) = split_location(&to);
                    let mirrored = self.engine.on_guest_navigation(pathname, search);
                    self.execute(mirrored);
                }
                Action::ApplyState { state } => self.state.apply(state),
                Action::StoreSession { session, long_lived } => {
                    self.sessions.save(&session, long_lived).unwrap();
                }
                Action::SetTheme { .. } | Action::WriteCssVars { .. } => {}
                Action::ExchangeToken { external_token, locale } => {
                    let result = self.exchanger.exchange(&external_token, &locale);
                    let actions = self.engine.on_exchange_result(result);
                    self.execute(actions);
                }
            }
        }
    }

    fn outbound_names(&self) -> Vec<&'static str> {
        self.outbound.iter().map(|e| e.name()).collect()
    }
}

fn split_location(location: &str) -> (&str, &str) {
    match location.find('?') {
        Some(index) => location.split_at(index),
        None => (location, ""),
    }
}

#[test]
fn ap_token_query_initializes_end_to_end() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "unused".to_string(),
        fail: false,
    });
    harness.start("?apToken=xyz&route=/flows&hideSidebar=true");

    let (session, long_lived) = harness.sessions.saved().expect("session must be persisted");
    assert_eq!(session.token, "xyz");
    assert_eq!(session.project_id, "");
    assert!(*long_lived);

    assert!(harness.state.state().hide_side_nav);
    assert_eq!(
        harness.location.as_deref(),
        Some("/flows?apToken=xyz&route=/flows&hideSidebar=true")
    );
    // URL path: no post-auth notifications, and the initial navigation is
    // not mirrored (the subscription registers after it).
    assert!(harness.outbound.is_empty());
    assert_eq!(harness.engine.phase(), EmbedPhase::Ready);
}

#[test]
fn sdk_handshake_completes_in_order() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "proj-9".to_string(),
        fail: false,
    });
    harness.start("");
    assert_eq!(harness.outbound_names(), vec!["CLIENT_INIT"]);

    harness.deliver(
        MessageSource::Parent,
        VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            initial_route: Some("/flows/42".to_string()),
            hide_sidebar: Some(true),
            ..VendorInit::default()
        }),
    );

    assert_eq!(
        harness.outbound_names(),
        vec![
            "CLIENT_INIT",
            "CLIENT_AUTHENTICATION_SUCCESS",
            "CLIENT_CONFIGURATION_FINISHED",
        ]
    );
    assert_eq!(harness.location.as_deref(), Some("/flows/42"));
    assert!(harness.state.state().hide_side_nav);
    assert_eq!(harness.engine.project_id(), Some("proj-9"));
    assert_eq!(harness.engine.phase(), EmbedPhase::Ready);
}

#[test]
fn state_is_applied_before_every_init_navigation() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "proj".to_string(),
        fail: false,
    });
    harness.start("?externalToken=ext&route=/runs");

    // The navigation observed generation 1: the state write landed first.
    assert_eq!(harness.generation_at_navigation, vec![1]);
    assert_eq!(harness.location.as_deref(), Some("/runs?externalToken=ext&route=/runs"));
}

#[test]
fn empty_sdk_token_produces_no_outbound_message_and_no_state_change() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "proj".to_string(),
        fail: false,
    });
    harness.start("");
    let generation_before = harness.state.generation();

    harness.deliver(
        MessageSource::Parent,
        VendorEvent::Init(VendorInit::default()),
    );

    assert_eq!(harness.outbound_names(), vec!["CLIENT_INIT"]);
    assert_eq!(harness.state.generation(), generation_before);
    assert!(harness.sessions.saved().is_none());
}

#[test]
fn sdk_exchange_failure_reaches_the_host() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "proj".to_string(),
        fail: true,
    });
    harness.start("");
    harness.deliver(
        MessageSource::Parent,
        VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            ..VendorInit::default()
        }),
    );

    assert_eq!(
        harness.outbound_names(),
        vec!["CLIENT_INIT", "CLIENT_AUTHENTICATION_FAILED"]
    );
    assert!(harness.sessions.saved().is_none());
    assert_eq!(harness.engine.phase(), EmbedPhase::AwaitingHostReply);
}

#[test]
fn url_exchange_failure_stays_silent() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "proj".to_string(),
        fail: true,
    });
    harness.start("?externalToken=ext");

    assert!(harness.outbound.is_empty());
    assert!(harness.sessions.saved().is_none());
    assert!(harness.location.is_none());
    assert_eq!(harness.engine.phase(), EmbedPhase::Uninitialized);
}

#[test]
fn host_navigation_round_trips_through_the_project_scope() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "abc".to_string(),
        fail: false,
    });
    harness.start("");
    harness.deliver(
        MessageSource::Parent,
        VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            ..VendorInit::default()
        }),
    );
    let mirrored_before = harness.outbound.len();

    harness.deliver(
        MessageSource::Parent,
        VendorEvent::RouteChanged(flowdeck_embed_protocol::VendorRouteChanged {
            vendor_route: "/flows/123".to_string(),
        }),
    );

    // Guest navigated to the scoped route...
    assert_eq!(harness.location.as_deref(), Some("/projects/abc/flows/123"));
    // ...and mirrored it back with the scope stripped.
    let ClientEvent::RouteChanged(mirrored) = &harness.outbound[mirrored_before] else {
        panic!("expected CLIENT_ROUTE_CHANGED, got {:?}", harness.outbound[mirrored_before]);
    };
    assert_eq!(mirrored.route, "/flows/123");
}

#[test]
fn messages_from_unknown_sources_are_dropped() {
    let mut harness = Harness::new(StubExchanger {
        project_id: "proj".to_string(),
        fail: false,
    });
    harness.start("");
    harness.deliver(
        MessageSource::Other,
        VendorEvent::Init(VendorInit {
            jwt_token: "jwt".to_string(),
            ..VendorInit::default()
        }),
    );
    assert_eq!(harness.outbound_names(), vec!["CLIENT_INIT"]);
    assert_eq!(harness.engine.phase(), EmbedPhase::AwaitingHostReply);
}
