//! End-to-end flow on the host: PIR edges → classifier → telemetry queue →
//! radio scheduler → mock radio, and gateway commands back again.

use pirlink::adapters::telemetry_sink::TelemetrySink;
use pirlink::app::classifier::Classification;
use pirlink::app::events::AppEvent;
use pirlink::app::ports::TimePort;
use pirlink::app::service::NodeService;
use pirlink::config::{CommMode, RadioScheduleConfig};
use pirlink::fsm::states::{EventId, StateId};
use pirlink::queue::{InboundQueue, OutboundQueue};
use pirlink::radio::{SharedRadio, transmit_once};
use pirlink::scheduler::RadioScheduler;

use crate::mock_radio::{MockRadio, RadioCall, RecordingSink, SimClock};

use EventId::{ArriveFalling, ArriveRising, DepartFalling, DepartRising};

fn feed(service: &mut NodeService, sink: &mut impl pirlink::app::ports::EventSink, edges: &[EventId]) {
    for &e in edges {
        service.handle_edge(e, sink);
    }
}

#[test]
fn arrival_reaches_the_air_on_next_tick() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let radio = MockRadio::new(clock.clone());
    let log = radio.log();
    let mut scheduler = RadioScheduler::new(
        radio,
        clock.clone(),
        RadioScheduleConfig::default(),
        &outbound,
        &inbound,
    );

    let mut service = NodeService::new().unwrap();
    let mut sink = (RecordingSink::default(), TelemetrySink::new("MBX", &outbound));
    service.start(&mut sink);
    feed(&mut service, &mut sink, &[ArriveRising, DepartRising, ArriveFalling, DepartFalling]);

    assert_eq!(service.state(), StateId::Default);
    assert!(sink.0.events.iter().any(|e| matches!(
        e,
        AppEvent::Classified {
            outcome: Classification::Arrived,
            ..
        }
    )));

    let report = scheduler.run_cycle();
    assert!(report.transmitted);
    assert_eq!(report.batched, 2);
    assert_eq!(log.frames(), ["MBX-ONLINE|Arrived"]);

    // Default receive window is 5 s in 1 s listens, then one transmit.
    let calls = log.calls();
    assert_eq!(calls.first(), Some(&RadioCall::PowerOn));
    assert_eq!(calls.iter().filter(|c| **c == RadioCall::Receive).count(), 5);
    assert_eq!(calls.last(), Some(&RadioCall::PowerOff));
    assert!(clock.now_ms() >= 5_000);
}

#[test]
fn status_command_round_trip() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let radio = MockRadio::new(clock.clone());
    let log = radio.log();
    radio.air().borrow_mut().push_back(b"STATUS");
    let mut scheduler = RadioScheduler::new(
        radio,
        clock,
        RadioScheduleConfig::default(),
        &outbound,
        &inbound,
    );

    let mut service = NodeService::new().unwrap();
    let mut sink = TelemetrySink::new("MBX", &outbound).without_start_announcement();
    feed(&mut service, &mut sink, &[DepartRising, ArriveRising]);

    // Tick 1 carries the departure and picks up the command.
    let first = scheduler.run_cycle();
    assert_eq!(first.received, 1);
    assert_eq!(log.frames(), ["Departed"]);

    for packet in inbound.drain() {
        service.handle_packet(&packet, &mut sink);
    }

    // Tick 2 answers it.
    log.clear();
    scheduler.run_cycle();
    let frames = log.frames();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].starts_with("MBX-STATUS "), "{}", frames[0]);
    assert!(frames[0].contains(" P=1 "), "{}", frames[0]);
}

#[test]
fn reset_command_clears_counters_and_acknowledges() {
    let outbound = OutboundQueue::new();
    let mut service = NodeService::new().unwrap();
    let mut sink = TelemetrySink::new("GATE", &outbound);
    feed(&mut service, &mut sink, &[ArriveRising, ArriveFalling, ArriveRising, ArriveRising]);
    assert_eq!(service.counts().false_alarm, 1);
    assert_eq!(service.counts().error, 1);

    service.handle_packet(b"reset\n", &mut sink);
    assert_eq!(service.counts().total(), 0);

    let queued: Vec<_> = outbound.drain().collect();
    assert_eq!(queued, ["FalseAlarm", "Error", "GATE-RESET"]);
}

#[test]
fn unknown_payload_is_ignored() {
    let outbound = OutboundQueue::new();
    let mut service = NodeService::new().unwrap();
    let mut sink = TelemetrySink::new("MBX", &outbound);
    assert_eq!(service.handle_packet(b"REBOOT", &mut sink), None);
    assert!(outbound.is_empty());
}

#[test]
fn tx_only_stays_dark_until_something_is_queued() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let radio = MockRadio::new(clock.clone());
    let log = radio.log();
    radio.air().borrow_mut().push_back(b"RESET");
    let config = RadioScheduleConfig {
        mode: CommMode::TxOnly,
        ..RadioScheduleConfig::default()
    };
    let mut scheduler = RadioScheduler::new(radio, clock, config, &outbound, &inbound);

    assert!(scheduler.run_cycle().skipped());
    assert!(log.calls().is_empty());

    let mut service = NodeService::new().unwrap();
    let mut sink = TelemetrySink::new("MBX", &outbound);
    feed(&mut service, &mut sink, &[ArriveRising, ArriveFalling]);

    let report = scheduler.run_cycle();
    assert!(report.transmitted);
    assert_eq!(
        log.calls(),
        [
            RadioCall::PowerOn,
            RadioCall::Transmit("FalseAlarm".into()),
            RadioCall::PowerOff
        ]
    );
    // Nothing was heard: TxOnly never listens.
    assert!(inbound.is_empty());
}

#[test]
fn boot_announcement_shares_the_radio_with_the_scheduler() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let radio = MockRadio::new(clock.clone());
    let log = radio.log();
    let shared = SharedRadio::new(radio);

    transmit_once(&mut shared.handle(), b"MBX-ONLINE", 5000).unwrap();
    assert_eq!(shared.power_users(), 0);

    let config = RadioScheduleConfig {
        mode: CommMode::TxOnly,
        ..RadioScheduleConfig::default()
    };
    let mut scheduler = RadioScheduler::new(shared.handle(), clock, config, &outbound, &inbound);
    let mut service = NodeService::new().unwrap();
    let mut sink = TelemetrySink::new("MBX", &outbound).without_start_announcement();
    service.start(&mut sink);
    feed(&mut service, &mut sink, &[ArriveRising, DepartRising]);
    scheduler.run_cycle();

    assert_eq!(log.frames(), ["MBX-ONLINE", "Arrived"]);
    assert_eq!(shared.power_users(), 0);
}

#[test]
fn heartbeat_is_batched_with_classifications() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let radio = MockRadio::new(clock.clone());
    let log = radio.log();
    let config = RadioScheduleConfig {
        mode: CommMode::TxOnly,
        ..RadioScheduleConfig::default()
    };
    let mut scheduler = RadioScheduler::new(radio, clock, config, &outbound, &inbound);

    let mut service = NodeService::new().unwrap();
    let mut sink = TelemetrySink::new("MBX", &outbound);
    feed(&mut service, &mut sink, &[DepartRising, DepartFalling]);
    service.heartbeat(60, &mut sink);
    feed(&mut service, &mut sink, &[ArriveRising, DepartRising]);

    scheduler.run_cycle();
    assert_eq!(log.frames(), ["FalseAlarm|MBX-HEARTBEAT|Arrived"]);
    assert!(outbound.is_empty());
}
