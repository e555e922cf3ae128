//! Property tests for the classifier, the telemetry queue and the modem
//! line parser.
//!
//! Host only: proptest does not build for the ESP32 targets.

#![cfg(not(target_os = "espidf"))]

use pirlink::adapters::lora_modem::{ModemLine, hex_decode, parse_line, tx_command};
use pirlink::app::classifier::{Classification, Classifier};
use pirlink::app::commands::AppCommand;
use pirlink::fsm::states::{EventId, StateId};
use pirlink::queue::{BoundedQueue, DELIMITER, MAX_MESSAGE_LEN, Message, message};
use pirlink::scheduler::batch_frame;
use proptest::prelude::*;

fn any_event() -> impl Strategy<Value = EventId> {
    prop_oneof![
        Just(EventId::ArriveRising),
        Just(EventId::ArriveFalling),
        Just(EventId::DepartRising),
        Just(EventId::DepartFalling),
        Just(EventId::Reset),
    ]
}

// ── Classifier ───────────────────────────────────────────────

proptest! {
    /// Between edges the machine only ever rests in a waiting state.
    #[test]
    fn classifier_rests_in_a_waiting_state(events in prop::collection::vec(any_event(), 0..200)) {
        let mut c = Classifier::new().unwrap();
        for e in events {
            c.submit(e);
            prop_assert!(matches!(
                c.state(),
                StateId::Default | StateId::Arriving | StateId::Departing
            ));
        }
    }

    /// Every edge moves the counters forward, never back.
    #[test]
    fn counter_total_strictly_grows(events in prop::collection::vec(any_event(), 0..200)) {
        let mut c = Classifier::new().unwrap();
        let mut last = c.counts().total();
        for e in events {
            c.submit(e);
            let now = c.counts().total();
            prop_assert!(now > last, "{e:?} left the total at {now}");
            last = now;
        }
    }

    /// Outcomes reported match the counters kept.
    #[test]
    fn reported_outcomes_match_counters(events in prop::collection::vec(any_event(), 0..200)) {
        let mut c = Classifier::new().unwrap();
        let mut seen = [0u32; 4];
        for e in events {
            match c.submit(e) {
                Some(Classification::Arrived) => seen[0] += 1,
                Some(Classification::Departed) => seen[1] += 1,
                Some(Classification::FalseAlarm) => seen[2] += 1,
                Some(Classification::Error) => seen[3] += 1,
                None => {}
            }
        }
        let counts = c.counts();
        prop_assert_eq!(
            seen,
            [counts.arrived, counts.departed, counts.false_alarm, counts.error]
        );
    }
}

// ── Queue and batching ───────────────────────────────────────

proptest! {
    /// A batch frame splits back into exactly the messages that built it.
    #[test]
    fn batch_frame_splits_back(texts in prop::collection::vec("[A-Za-z0-9 =-]{1,40}", 1..20)) {
        let msgs: Vec<Message> = texts.iter().filter_map(|t| message(t)).collect();
        prop_assert_eq!(msgs.len(), texts.len());
        let frame = batch_frame(&msgs);
        let parts: Vec<&str> = frame.split(DELIMITER).collect();
        prop_assert_eq!(parts, texts.iter().map(String::as_str).collect::<Vec<_>>());
    }

    /// Text carrying the delimiter or over length never becomes a message.
    #[test]
    fn message_rejects_what_would_break_a_frame(text in ".{0,200}") {
        let accepted = message(&text).is_some();
        let valid = !text.is_empty()
            && !text.contains(DELIMITER)
            && text.len() <= MAX_MESSAGE_LEN;
        prop_assert_eq!(accepted, valid);
    }

    /// Pushes beyond capacity are counted as drops and never stored.
    #[test]
    fn queue_never_exceeds_capacity(
        capacity in 1usize..=16,
        ops in prop::collection::vec(any::<bool>(), 0..100),
    ) {
        let q: BoundedQueue<u32, 16> = BoundedQueue::new();
        q.set_capacity(capacity);
        let mut model = std::collections::VecDeque::new();
        let mut drops = 0u32;
        for (i, push) in ops.into_iter().enumerate() {
            if push {
                let accepted = q.try_push(i as u32);
                if model.len() < capacity {
                    prop_assert!(accepted);
                    model.push_back(i as u32);
                } else {
                    prop_assert!(!accepted);
                    drops += 1;
                }
            } else {
                prop_assert_eq!(q.try_pop(), model.pop_front());
            }
            prop_assert!(q.len() <= capacity);
        }
        prop_assert_eq!(q.dropped(), drops);
        prop_assert_eq!(q.drain().collect::<Vec<_>>(), Vec::from(model));
    }
}

// ── Modem line parsing ───────────────────────────────────────

proptest! {
    #[test]
    fn parse_line_never_panics(line in ".{0,600}") {
        let _ = parse_line(&line);
    }

    #[test]
    fn hex_decode_never_panics(hex in "[0-9a-fA-FxX ]{0,600}") {
        let _ = hex_decode(&hex);
    }

    /// What the driver transmits, a peer modem reports back intact.
    #[test]
    fn transmitted_hex_is_received_intact(payload in prop::collection::vec(any::<u8>(), 1..=255)) {
        let cmd = tx_command(&payload);
        let quoted = cmd
            .trim_end()
            .strip_prefix("AT+TEST=TXLRPKT,")
            .unwrap();
        match parse_line(&format!("+TEST: RX {quoted}")) {
            ModemLine::Received(p) => prop_assert_eq!(&p[..], &payload[..]),
            other => prop_assert!(false, "unexpected {other:?}"),
        }
    }

    #[test]
    fn command_parse_never_panics(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = AppCommand::parse(&payload);
    }
}
