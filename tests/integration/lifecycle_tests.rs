//! Integration tests for the event → FSM → port pipeline.
//!
//! Each test drives `AppService` with the same events the WiFi task, the
//! MQTT task and the wake path would post, and checks the resulting port
//! calls on a recording mock.

use super::mock_hw::{MockDevice, PortCall, RecordingSink};

use doorsense::app::events::AppEvent;
use doorsense::app::identity::DeviceIdentity;
use doorsense::app::ports::{Qos, RadioMode, SessionError, WakeEdge};
use doorsense::app::service::AppService;
use doorsense::config::SystemConfig;
use doorsense::error::Error;
use doorsense::events::{Event, LinkStatus};
use doorsense::fsm::DeviceState;
use doorsense::fsm::context::{Command, DoorLevel, Phase};

const CHIP_ID: u32 = 0x00CA_FE01;

fn make_app(door: DoorLevel) -> (AppService, MockDevice, RecordingSink) {
    let config = SystemConfig::default();
    let identity = DeviceIdentity::new(CHIP_ID, &config);
    let mut app = AppService::new(config, identity);
    let mut dev = MockDevice::new(door);
    let mut sink = RecordingSink::default();
    app.start(&mut dev, &mut sink);
    (app, dev, sink)
}

/// Bring the link and the session up on whatever path the app is on.
fn connect(app: &mut AppService, dev: &mut MockDevice, sink: &mut RecordingSink) {
    app.handle_event(Event::LinkStatusChanged(LinkStatus::GotIp), dev, sink);
    app.handle_event(Event::SessionConnected, dev, sink);
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_latches_power_then_associates() {
    let (app, dev, sink) = make_app(DoorLevel::Open);

    assert_eq!(app.state(), DeviceState::Associating);
    assert_eq!(dev.calls, vec![PortCall::HoldRail(true), PortCall::LinkConnect]);
    assert_eq!(sink.events[0], AppEvent::Started(DeviceState::Booting));
    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: DeviceState::Booting,
        to: DeviceState::Associating,
    }));
}

#[test]
fn got_ip_opens_the_session() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    dev.clear();

    app.handle_event(
        Event::LinkStatusChanged(LinkStatus::GotIp),
        &mut dev,
        &mut sink,
    );

    assert_eq!(app.state(), DeviceState::SessionOpening);
    assert_eq!(dev.calls, vec![PortCall::SessionConnect]);
}

#[test]
fn link_loss_while_associating_closes_the_session() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    dev.clear();

    app.handle_event(
        Event::LinkStatusChanged(LinkStatus::Other),
        &mut dev,
        &mut sink,
    );

    assert_eq!(app.state(), DeviceState::Associating);
    assert_eq!(dev.calls, vec![PortCall::SessionDisconnect]);
}

// ── Door opened, closes later (full two-phase cycle) ──────────

#[test]
fn open_then_sleep_then_close_then_power_cut() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);

    connect(&mut app, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::PublishingOpen);
    assert_eq!(dev.published(), vec!["open"]);

    // "open" acknowledged → radio down, wake armed, asleep.
    dev.clear();
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::Sleeping);
    assert_eq!(
        dev.calls,
        vec![
            PortCall::LinkDisconnect,
            PortCall::Radio(RadioMode::Off),
            PortCall::ArmWake(WakeEdge::Falling),
            PortCall::Sleep,
        ]
    );
    assert!(!dev.power_cut());

    // Door closes → detect line pulled low → wake.
    dev.door = DoorLevel::Closed;
    dev.clear();
    app.handle_event(Event::WakeInterrupt, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::ReassociatingAfterWake);
    assert_eq!(app.phase(), Phase::PostWake);
    assert_eq!(
        dev.calls,
        vec![PortCall::Radio(RadioMode::Station), PortCall::LinkConnect]
    );

    connect(&mut app, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::PublishingClosed);
    assert_eq!(dev.published(), vec!["closed"]);
    assert!(app.closed_sent());

    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::ShuttingDown);
    assert!(dev.power_cut());
    assert_eq!(dev.calls.last(), Some(&PortCall::HoldRail(false)));
    assert!(sink.events.contains(&AppEvent::PowerCut));
}

// ── Door already closed when the session comes up ─────────────

#[test]
fn already_closed_sends_both_and_skips_sleep() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);

    connect(&mut app, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::AwaitingCloseOrShutdown);
    assert_eq!(dev.published(), vec!["open", "closed"]);
    assert!(app.closed_sent());

    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::ShuttingDown);
    assert!(dev.power_cut());
    assert!(!dev.slept());
}

#[test]
fn no_power_cut_while_outbound_queue_not_empty() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    connect(&mut app, &mut dev, &mut sink);

    // First ack arrives with "closed" still in flight.
    dev.queue_empty = false;
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::AwaitingCloseOrShutdown);
    assert!(!dev.power_cut());

    dev.queue_empty = true;
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::ShuttingDown);
    assert!(dev.power_cut());
}

#[test]
fn closed_after_wake_waits_for_empty_queue() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    dev.door = DoorLevel::Closed;
    app.handle_event(Event::WakeInterrupt, &mut dev, &mut sink);
    connect(&mut app, &mut dev, &mut sink);

    dev.queue_empty = false;
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::PublishingClosed);
    assert!(!dev.power_cut());
}

// ── Robustness ────────────────────────────────────────────────

#[test]
fn wake_outside_sleeping_is_ignored() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);
    dev.clear();

    app.handle_event(Event::WakeInterrupt, &mut dev, &mut sink);

    assert_eq!(app.state(), DeviceState::PublishingOpen);
    assert_eq!(app.phase(), Phase::PreSleep);
    assert!(dev.calls.is_empty());
}

#[test]
fn ack_before_any_publish_is_ignored() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    dev.clear();

    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);

    assert_eq!(app.state(), DeviceState::Associating);
    assert!(dev.calls.is_empty());
    assert!(!dev.power_cut());
}

#[test]
fn duplicate_session_connected_does_not_republish() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);

    app.handle_event(Event::SessionConnected, &mut dev, &mut sink);
    app.handle_event(Event::SessionConnected, &mut dev, &mut sink);

    assert_eq!(dev.published(), vec!["open"]);
}

#[test]
fn at_most_one_report_of_each_kind_per_phase() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    connect(&mut app, &mut dev, &mut sink);
    connect(&mut app, &mut dev, &mut sink);
    dev.queue_empty = false;
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    connect(&mut app, &mut dev, &mut sink);

    let published = dev.published();
    assert_eq!(published.iter().filter(|p| **p == "open").count(), 1);
    assert_eq!(published.iter().filter(|p| **p == "closed").count(), 1);
}

#[test]
fn link_flap_in_publishing_open_reopens_session_without_republishing() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);
    dev.clear();

    app.handle_event(
        Event::LinkStatusChanged(LinkStatus::Other),
        &mut dev,
        &mut sink,
    );
    app.handle_event(
        Event::LinkStatusChanged(LinkStatus::GotIp),
        &mut dev,
        &mut sink,
    );

    assert_eq!(app.state(), DeviceState::PublishingOpen);
    assert_eq!(
        dev.calls,
        vec![PortCall::SessionDisconnect, PortCall::SessionConnect]
    );
}

#[test]
fn shutting_down_ignores_everything() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    connect(&mut app, &mut dev, &mut sink);
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    dev.clear();

    for event in [
        Event::LinkStatusChanged(LinkStatus::GotIp),
        Event::SessionConnected,
        Event::PublishAcknowledged,
        Event::WakeInterrupt,
    ] {
        app.handle_event(event, &mut dev, &mut sink);
    }

    assert_eq!(app.state(), DeviceState::ShuttingDown);
    assert!(dev.calls.is_empty());
}

// ── Wire format ───────────────────────────────────────────────

#[test]
fn payloads_and_topic_are_exact() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    connect(&mut app, &mut dev, &mut sink);

    let topic = format!("sensor/{}/door", CHIP_ID);
    assert_eq!(app.topic(), topic);
    assert_eq!(app.client_id(), format!("door_{}", CHIP_ID));

    let publishes: Vec<_> = dev
        .calls
        .iter()
        .filter(|c| matches!(c, PortCall::Publish { .. }))
        .cloned()
        .collect();
    assert_eq!(
        publishes,
        vec![
            PortCall::Publish {
                topic: topic.clone(),
                payload: b"open".to_vec(),
                qos: Qos::AtLeastOnce,
                retain: false,
            },
            PortCall::Publish {
                topic,
                payload: b"closed".to_vec(),
                qos: Qos::AtLeastOnce,
                retain: false,
            },
        ]
    );
}

#[test]
fn published_events_follow_publish_calls() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);

    assert!(sink.events.contains(&AppEvent::Published(DoorLevel::Open)));
    assert!(!sink.events.contains(&AppEvent::Published(DoorLevel::Closed)));
}

#[test]
fn publish_failure_is_reported_not_retried() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    dev.publish_error = Some(SessionError::PublishFailed(-1));

    connect(&mut app, &mut dev, &mut sink);

    assert_eq!(app.state(), DeviceState::PublishingOpen);
    assert!(dev.published().is_empty());
    assert!(sink.events.contains(&AppEvent::CommandFailed {
        command: Command::Publish(DoorLevel::Open),
        error: Error::Session(SessionError::PublishFailed(-1)),
    }));
    assert!(!sink.events.contains(&AppEvent::Published(DoorLevel::Open)));
}

#[test]
fn rejected_closed_report_keeps_power_on() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    dev.publish_error = Some(SessionError::PublishFailed(-1));
    dev.reject_only = Some(&b"closed"[..]);

    connect(&mut app, &mut dev, &mut sink);
    assert_eq!(dev.published(), vec!["open"]);
    assert!(!app.closed_sent());
    assert!(sink.events.contains(&AppEvent::CommandFailed {
        command: Command::Publish(DoorLevel::Closed),
        error: Error::Session(SessionError::PublishFailed(-1)),
    }));

    // "open" confirmed and nothing left queued: still no power cut.
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::AwaitingCloseOrShutdown);
    assert!(!dev.power_cut());
}

#[test]
fn closed_report_resent_when_session_returns() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Closed);
    dev.publish_error = Some(SessionError::NotConnected);
    dev.reject_only = Some(&b"closed"[..]);
    connect(&mut app, &mut dev, &mut sink);
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);

    dev.publish_error = None;
    app.handle_event(Event::SessionConnected, &mut dev, &mut sink);
    assert_eq!(dev.published(), vec!["open", "closed"]);
    assert!(app.closed_sent());

    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::ShuttingDown);
    assert!(dev.power_cut());
}

#[test]
fn rejected_closed_after_wake_keeps_power_on() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    dev.door = DoorLevel::Closed;
    app.handle_event(Event::WakeInterrupt, &mut dev, &mut sink);

    dev.publish_error = Some(SessionError::PublishFailed(-1));
    connect(&mut app, &mut dev, &mut sink);
    assert_eq!(app.state(), DeviceState::PublishingClosed);
    assert!(!app.closed_sent());

    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);
    assert!(!dev.power_cut());
}

#[test]
fn sleep_is_bracketed_by_entered_and_woke_events() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);
    app.handle_event(Event::PublishAcknowledged, &mut dev, &mut sink);

    let entered = sink
        .events
        .iter()
        .position(|e| *e == AppEvent::SleepEntered)
        .expect("sleep entered");
    assert!(matches!(sink.events[entered + 1], AppEvent::Woke(_)));
}

#[test]
fn dispatched_counts_every_event() {
    let (mut app, mut dev, mut sink) = make_app(DoorLevel::Open);
    connect(&mut app, &mut dev, &mut sink);
    app.handle_event(Event::WakeInterrupt, &mut dev, &mut sink);
    assert_eq!(app.dispatched(), 3);
}
