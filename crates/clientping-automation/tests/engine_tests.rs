// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end automation behaviour through the message pipeline.

use std::sync::Arc;
use std::time::Duration;

use clientping_automation::{ActionEffect, DEFAULT_WELCOME_FLOW_ID, SkipReason};
use clientping_core::{
    ActionKind, Channel, ClientPingError, ContextStore, FlowAction, FlowPatch, FlowStore,
    FlowTrigger, NewFlow,
};
use clientping_test_utils::TestHarness;

fn keyword_flow(id: &str, priority: i32, keywords: &[&str], actions: Vec<FlowAction>) -> NewFlow {
    NewFlow {
        id: Some(id.into()),
        name: format!("{id} flow"),
        description: String::new(),
        enabled: true,
        priority,
        triggers: vec![FlowTrigger::Keyword {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            case_sensitive: false,
        }],
        actions,
    }
}

fn say(text: &str) -> FlowAction {
    FlowAction::now(ActionKind::SendMessage { text: text.into() })
}

#[tokio::test]
async fn welcome_fires_on_first_message_only() {
    let harness = TestHarness::builder()
        .with_welcome_message("Welcome {{first_name}}!")
        .with_flows(vec![keyword_flow("help", 1, &["help"], vec![say("How can we help?")])])
        .build()
        .await
        .unwrap();

    // The first message contains a keyword, but only the welcome flow fires.
    let first = harness.send_message("100", "help").await.unwrap();
    let first = first.automation.unwrap();
    assert!(first.is_new_contact);
    assert_eq!(first.flow_id.as_deref(), Some(DEFAULT_WELCOME_FLOW_ID));

    let second = harness.send_message("100", "help").await.unwrap();
    let second = second.automation.unwrap();
    assert!(!second.is_new_contact);
    assert_eq!(second.flow_id.as_deref(), Some("help"));

    let third = harness.send_message("100", "thanks").await.unwrap();
    assert!(!third.automation.unwrap().fired());

    assert_eq!(
        harness.telegram.texts_for("100").await,
        vec!["Welcome User!", "How can we help?"]
    );
}

#[tokio::test]
async fn operator_welcome_flow_beats_default() {
    let custom = NewFlow {
        id: Some("custom-welcome".into()),
        name: "Custom welcome".into(),
        description: String::new(),
        enabled: true,
        priority: 0,
        triggers: vec![FlowTrigger::Welcome],
        actions: vec![say("Hey there")],
    };
    let harness = TestHarness::builder()
        .with_flows(vec![custom])
        .build()
        .await
        .unwrap();

    let handled = harness.send_message("1", "hi").await.unwrap();
    assert_eq!(
        handled.automation.unwrap().flow_id.as_deref(),
        Some("custom-welcome")
    );
}

#[tokio::test]
async fn no_welcome_flow_means_silent_first_message() {
    let harness = TestHarness::builder()
        .with_default_welcome(false)
        .with_flows(vec![keyword_flow("help", 1, &["help"], vec![say("ok")])])
        .build()
        .await
        .unwrap();

    let handled = harness.send_message("1", "help").await.unwrap();
    let outcome = handled.automation.unwrap();
    assert!(outcome.is_new_contact);
    assert!(!outcome.fired());
    assert_eq!(harness.telegram.sent_count().await, 0);
}

#[tokio::test]
async fn highest_priority_keyword_flow_fires_exactly_once() {
    let harness = TestHarness::builder()
        .with_flows(vec![
            keyword_flow("generic", 1, &["price"], vec![say("generic")]),
            keyword_flow("specific", 10, &["price", "cost"], vec![say("specific")]),
            keyword_flow("unrelated", 50, &["refund"], vec![say("unrelated")]),
        ])
        .build()
        .await
        .unwrap();

    harness.send_message("7", "hello").await.unwrap();
    harness.telegram.clear_sent().await;

    let handled = harness.send_message("7", "What's the PRICE?").await.unwrap();
    assert_eq!(
        handled.automation.unwrap().flow_id.as_deref(),
        Some("specific")
    );
    assert_eq!(harness.telegram.texts_for("7").await, vec!["specific"]);

    let specific = harness.engine.get_flow("specific").await.unwrap();
    assert_eq!(specific.stats.triggered, 1);
    assert_eq!(specific.stats.completed, 1);
    let generic = harness.engine.get_flow("generic").await.unwrap();
    assert_eq!(generic.stats.triggered, 0);
}

#[tokio::test]
async fn disabling_a_flow_hands_over_to_the_next() {
    let harness = TestHarness::builder()
        .with_flows(vec![
            keyword_flow("low", 1, &["help"], vec![say("low")]),
            keyword_flow("high", 5, &["help"], vec![say("high")]),
        ])
        .build()
        .await
        .unwrap();
    harness.send_message("7", "hello").await.unwrap();

    harness
        .engine
        .update_flow(
            "high",
            FlowPatch {
                enabled: Some(false),
                ..FlowPatch::default()
            },
        )
        .await
        .unwrap();

    let handled = harness.send_message("7", "help").await.unwrap();
    assert_eq!(handled.automation.unwrap().flow_id.as_deref(), Some("low"));
}

#[tokio::test]
async fn failed_action_keeps_partial_effects_and_sends_fallback() {
    let harness = TestHarness::builder()
        .with_fallback_message("Sorry!")
        .with_flows(vec![keyword_flow(
            "onboard",
            1,
            &["start"],
            vec![
                FlowAction::now(ActionKind::AddTag { tag: "lead".into() }),
                say("step one BROKEN"),
                FlowAction::now(ActionKind::AddTag {
                    tag: "never".into(),
                }),
            ],
        )])
        .build()
        .await
        .unwrap();
    harness.send_message("3", "hi").await.unwrap();
    harness.telegram.fail_when_contains("BROKEN").await;

    let handled = harness.send_message("3", "start").await.unwrap();
    let outcome = handled.automation.unwrap();
    assert!(outcome.failed());
    assert_eq!(
        outcome.actions,
        vec![ActionEffect::TagAdded { tag: "lead".into() }]
    );
    assert!(handled.fallback_sent);
    assert!(harness.telegram.texts_for("3").await.ends_with(&["Sorry!".to_string()]));

    let ctx = harness.engine.get_context("3").await.unwrap();
    assert!(ctx.tags.contains("lead"));
    assert!(!ctx.tags.contains("never"));
    assert_eq!(ctx.message_history.len(), 2);

    let contact = harness.contacts.get_contact("3").await.unwrap();
    assert!(contact.tags.contains("lead"));

    let flow = harness.engine.get_flow("onboard").await.unwrap();
    assert_eq!(flow.stats.triggered, 1);
    assert_eq!(flow.stats.completed, 0);
}

#[tokio::test]
async fn variables_render_and_mirror_into_contact_fields() {
    let harness = TestHarness::builder()
        .with_flows(vec![keyword_flow(
            "plan",
            1,
            &["pro"],
            vec![
                FlowAction::now(ActionKind::SetVariable {
                    key: "plan".into(),
                    value: "pro".into(),
                }),
                FlowAction::now(ActionKind::SetSegment {
                    segment: "paying".into(),
                }),
                say("{{first_name}} is on {{var.plan}}"),
            ],
        )])
        .build()
        .await
        .unwrap();
    harness.send_message("5", "hi").await.unwrap();
    harness.telegram.clear_sent().await;

    harness.send_message("5", "I want PRO").await.unwrap();
    assert_eq!(harness.telegram.texts_for("5").await, vec!["User is on pro"]);

    let ctx = harness.engine.get_context("5").await.unwrap();
    assert_eq!(ctx.segment.as_deref(), Some("paying"));
    assert_eq!(ctx.last_flow_id.as_deref(), Some("plan"));

    let contact = harness.contacts.get_contact("5").await.unwrap();
    assert_eq!(
        contact.custom_fields.get("plan").map(String::as_str),
        Some("pro")
    );
}

#[tokio::test]
async fn blocked_contacts_skip_automation() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send_message("9", "hi").await.unwrap();
    harness.contacts.set_blocked("9", true).await.unwrap();
    harness.telegram.clear_sent().await;

    let handled = harness.send_message("9", "hello?").await.unwrap();
    assert_eq!(handled.skipped, Some(SkipReason::Blocked));
    assert!(handled.automation.is_none());
    assert_eq!(harness.telegram.sent_count().await, 0);

    // Still counted in the contact book.
    let contact = harness.contacts.get_contact("9").await.unwrap();
    assert_eq!(contact.message_count, 2);
}

#[tokio::test]
async fn reset_context_makes_next_message_a_first_contact() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send_message("4", "hi").await.unwrap();
    harness.engine.reset_context("4").await.unwrap();

    let handled = harness.send_message("4", "hi again").await.unwrap();
    assert!(handled.automation.unwrap().is_new_contact);

    let err = harness.engine.reset_context("nobody").await.unwrap_err();
    assert!(matches!(err, ClientPingError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_flow_id_is_a_conflict() {
    let harness = TestHarness::builder()
        .with_flows(vec![keyword_flow("dup", 1, &["x"], vec![say("x")])])
        .build()
        .await
        .unwrap();
    let err = harness
        .engine
        .add_flow(keyword_flow("dup", 1, &["y"], vec![say("y")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientPingError::Conflict(_)));
}

#[tokio::test]
async fn invalid_flow_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let err = harness
        .engine
        .add_flow(keyword_flow("empty", 1, &["x"], vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientPingError::Validation(_)));
}

#[tokio::test]
async fn flows_list_in_firing_order() {
    let harness = TestHarness::builder()
        .with_flows(vec![
            keyword_flow("b", 1, &["x"], vec![say("x")]),
            keyword_flow("a", 9, &["x"], vec![say("x")]),
        ])
        .build()
        .await
        .unwrap();
    let ids: Vec<_> = harness
        .engine
        .list_flows()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec!["a", "b", DEFAULT_WELCOME_FLOW_ID]);
}

#[tokio::test]
async fn history_is_bounded_by_config() {
    let mut config = clientping_config::ClientPingConfig::default();
    config.automation.max_history = 3;
    let harness = TestHarness::builder()
        .with_config(config)
        .build()
        .await
        .unwrap();
    for i in 0..6 {
        harness.send_message("h", &format!("m{i}")).await.unwrap();
    }
    let ctx = harness.engine.get_context("h").await.unwrap();
    let texts: Vec<_> = ctx.message_history.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["m3", "m4", "m5"]);
}

#[tokio::test(start_paused = true)]
async fn action_delays_are_capped() {
    let mut config = clientping_config::ClientPingConfig::default();
    config.automation.max_action_delay_ms = 500;
    let harness = TestHarness::builder()
        .with_config(config)
        .with_flows(vec![keyword_flow(
            "slow",
            1,
            &["wait"],
            vec![
                say("first"),
                FlowAction::delayed(60_000, ActionKind::SendMessage {
                    text: "second".into(),
                }),
            ],
        )])
        .build()
        .await
        .unwrap();
    harness.send_message("d", "hi").await.unwrap();

    let started = tokio::time::Instant::now();
    harness.send_message("d", "wait").await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(5));
    assert!(harness.telegram.texts_for("d").await.ends_with(&[
        "first".to_string(),
        "second".to_string()
    ]));
}

#[tokio::test]
async fn concurrent_first_messages_welcome_once() {
    let harness = Arc::new(TestHarness::builder().build().await.unwrap());
    let mut handles = Vec::new();
    for i in 0..10 {
        let harness = Arc::clone(&harness);
        handles.push(tokio::spawn(async move {
            harness
                .send_message("race", &format!("msg {i}"))
                .await
                .unwrap()
        }));
    }
    let mut new_contacts = 0;
    for h in handles {
        if h.await.unwrap().automation.unwrap().is_new_contact {
            new_contacts += 1;
        }
    }
    assert_eq!(new_contacts, 1);
    assert_eq!(harness.telegram.texts_for("race").await.len(), 1);
    assert_eq!(
        harness.contacts.get_contact("race").await.unwrap().message_count,
        10
    );
}

#[tokio::test]
async fn whatsapp_replies_go_to_whatsapp() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .send_on(Channel::Whatsapp, "15550001", "hola")
        .await
        .unwrap();
    assert_eq!(harness.whatsapp.sent_count().await, 1);
    assert_eq!(harness.telegram.sent_count().await, 0);
}

#[tokio::test]
async fn state_and_stats_persist_in_sqlite() {
    let harness = TestHarness::builder()
        .with_sqlite()
        .with_flows(vec![keyword_flow("help", 1, &["help"], vec![say("ok")])])
        .build()
        .await
        .unwrap();
    harness.send_message("s", "hi").await.unwrap();
    harness.send_message("s", "help").await.unwrap();

    let flow = harness.store.get_flow("help").await.unwrap().unwrap();
    assert_eq!(flow.stats.completed, 1);
    let ctx = harness.store.get_context("s").await.unwrap().unwrap();
    assert_eq!(ctx.message_history.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_out_welcome_is_not_replayed() {
    let mut config = clientping_config::ClientPingConfig::default();
    config.server.request_timeout_secs = 2;
    config.automation.max_action_delay_ms = 1_500;
    config.automation.fallback_message = "sorry".into();
    let welcome = NewFlow {
        id: Some("greet".into()),
        name: "Greeting".into(),
        description: String::new(),
        enabled: true,
        priority: 10,
        triggers: vec![FlowTrigger::Welcome],
        actions: vec![
            say("hello"),
            FlowAction::delayed(1_500, ActionKind::SendMessage {
                text: "step2".into(),
            }),
            FlowAction::delayed(1_500, ActionKind::SendMessage {
                text: "step3".into(),
            }),
        ],
    };
    let harness = TestHarness::builder()
        .with_config(config)
        .with_default_welcome(false)
        .with_flows(vec![welcome])
        .build()
        .await
        .unwrap();

    let err = harness.send_message("t", "hi").await.unwrap_err();
    assert!(matches!(err, ClientPingError::Timeout { .. }));
    assert_eq!(
        harness.telegram.texts_for("t").await,
        vec!["hello", "step2", "sorry"]
    );

    let second = harness.send_message("t", "anyone there?").await.unwrap();
    let second = second.automation.unwrap();
    assert!(!second.is_new_contact);
    assert!(!second.fired());
    assert_eq!(harness.telegram.texts_for("t").await.len(), 3);

    let ctx = harness.engine.get_context("t").await.unwrap();
    assert_eq!(ctx.last_flow_id.as_deref(), Some("greet"));
    assert_eq!(ctx.message_history.len(), 2);

    let stats = harness.engine.get_flow("greet").await.unwrap().stats;
    assert_eq!(stats.triggered, 1);
    assert_eq!(stats.completed, 0);
}

#[tokio::test]
async fn tag_actions_store_trimmed_tags() {
    let harness = TestHarness::builder()
        .with_flows(vec![keyword_flow(
            "vip",
            1,
            &["upgrade"],
            vec![FlowAction::now(ActionKind::AddTag {
                tag: "  vip ".into(),
            })],
        )])
        .build()
        .await
        .unwrap();
    harness.send_message("p", "hi").await.unwrap();
    harness.send_message("p", "upgrade me").await.unwrap();

    let ctx = harness.engine.get_context("p").await.unwrap();
    assert!(ctx.tags.contains("vip"));
    let contact = harness.contacts.get_contact("p").await.unwrap();
    assert_eq!(contact.tags.iter().collect::<Vec<_>>(), vec!["vip"]);

    harness.contacts.remove_tag("p", " vip").await.unwrap();
    assert!(harness.contacts.get_contact("p").await.unwrap().tags.is_empty());
}
