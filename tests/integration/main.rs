//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a slice of the node
//! against mock adapters.  All tests run on the host with no real hardware
//! required.

mod mock_radio;
mod modem_stack_tests;
mod node_flow_tests;
