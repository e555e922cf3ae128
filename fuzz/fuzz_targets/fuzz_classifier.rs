//! Fuzz target: `NodeService` edge and command handling
//!
//! Each input byte is either a sensor edge or a gateway command.  The
//! machine must always come back to a waiting state and the outbound
//! queue must stay within its capacity.
//!
//! cargo fuzz run fuzz_classifier

#![no_main]

use libfuzzer_sys::fuzz_target;
use pirlink::adapters::telemetry_sink::TelemetrySink;
use pirlink::app::service::NodeService;
use pirlink::fsm::states::{EventId, StateId};
use pirlink::queue::OutboundQueue;

fuzz_target!(|data: &[u8]| {
    let outbound = OutboundQueue::new();
    outbound.set_capacity(8);
    let Ok(mut service) = NodeService::new() else {
        return;
    };
    let mut sink = TelemetrySink::new("FUZZ", &outbound);
    service.start(&mut sink);

    for &b in data {
        match b % 8 {
            0..=3 => {
                service.handle_edge(EventId::EDGES[usize::from(b % 4)], &mut sink);
            }
            4 => {
                service.handle_packet(b"RESET", &mut sink);
            }
            5 => {
                service.handle_packet(b"STATUS", &mut sink);
            }
            6 => service.heartbeat(u64::from(b), &mut sink),
            _ => {
                let _ = outbound.try_pop();
            }
        }
        assert!(matches!(
            service.state(),
            StateId::Default | StateId::Arriving | StateId::Departing
        ));
        assert!(outbound.len() <= 8);
    }
});
