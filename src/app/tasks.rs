//! Node task group: everything that touches the classifier.
//!
//! Runs in one dedicated thread using `edge-executor` for cooperative
//! scheduling and `async-io-mini` for reactor-driven timers.  Three
//! concurrent futures share the [`NodeService`] through an `Rc<RefCell>`;
//! because they never hold the borrow across an `.await`, at most one
//! event is in flight at any time.
//!
//! 1. **Edges**: truly async via `EdgeChannel::next().await`; wakes as soon
//!    as a PIR ISR pushes an edge.
//! 2. **Commands**: polls the inbound queue filled by the radio scheduler.
//! 3. **Heartbeat**: fires every `heartbeat_interval`.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  Node thread                                             │
//!  │  ┌────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                      │  │
//!  │  │  ┌──────────┐  ┌─────────────┐  ┌──────────────┐   │  │
//!  │  │  │  Edges   │  │  Commands   │  │  Heartbeat   │   │  │
//!  │  │  │ wake-on- │  │  250ms ⏱    │  │  interval ⏱  │   │  │
//!  │  │  │  push    │  │             │  │              │   │  │
//!  │  │  └──────────┘  └─────────────┘  └──────────────┘   │  │
//!  │  └────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────┘
//! ```

use core::cell::RefCell;
use core::time::Duration;
use std::rc::Rc;

use log::info;

use crate::events::{EdgeChannel, consume_edges};
use crate::queue::InboundQueue;

use super::ports::{EventSink, TimePort};
use super::service::NodeService;

/// How often the inbound queue is checked for commands.
pub const COMMAND_POLL: Duration = Duration::from_millis(250);

struct Node<S> {
    service: NodeService,
    sink: S,
}

type SharedNode<S> = Rc<RefCell<Node<S>>>;

/// Edge task: one edge at a time, in arrival order.
async fn edge_loop<S: EventSink>(edges: &EdgeChannel, node: SharedNode<S>) {
    consume_edges(edges, |event| {
        let mut guard = node.borrow_mut();
        let Node { service, sink } = &mut *guard;
        service.handle_edge(event, sink);
    })
    .await
}

/// Command task: act on every payload the radio scheduler received.
async fn command_loop<S: EventSink>(inbound: &InboundQueue, node: SharedNode<S>) {
    loop {
        for packet in inbound.drain() {
            let mut guard = node.borrow_mut();
            let Node { service, sink } = &mut *guard;
            service.handle_packet(&packet, sink);
        }
        async_io_mini::Timer::after(COMMAND_POLL).await;
    }
}

/// Heartbeat task.
async fn heartbeat_loop<S: EventSink, T: TimePort>(
    node: SharedNode<S>,
    clock: &T,
    interval: Duration,
) {
    loop {
        async_io_mini::Timer::after(interval).await;
        let mut guard = node.borrow_mut();
        let Node { service, sink } = &mut *guard;
        service.heartbeat(clock.now_ms() / 1000, sink);
    }
}

/// Start the service and drive the three node tasks forever.
///
/// Never returns.  Call from a dedicated thread.
pub fn run_node_tasks<S: EventSink, T: TimePort>(
    mut service: NodeService,
    mut sink: S,
    edges: &EdgeChannel,
    inbound: &InboundQueue,
    clock: &T,
    heartbeat_interval: Duration,
) {
    service.start(&mut sink);

    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    let node: SharedNode<S> = Rc::new(RefCell::new(Node { service, sink }));

    executor.spawn(edge_loop(edges, node.clone())).detach();
    executor.spawn(command_loop(inbound, node.clone())).detach();
    executor
        .spawn(heartbeat_loop(node, clock, heartbeat_interval))
        .detach();

    info!(
        "node tasks started (heartbeat every {}s)",
        heartbeat_interval.as_secs()
    );

    block_on(executor.run(core::future::pending::<()>()));
}

// ESP-IDF's block_on parks on a FreeRTOS task notification, which an ISR
// waking the edge task may signal.  The host has no ISRs.
#[cfg(target_os = "espidf")]
fn block_on<F: core::future::Future>(fut: F) -> F::Output {
    esp_idf_hal::task::block_on(fut)
}

#[cfg(not(target_os = "espidf"))]
fn block_on<F: core::future::Future>(fut: F) -> F::Output {
    futures_lite::future::block_on(fut)
}
