// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Execution Contexts
//!
//! The firmware runs two contexts that only meet through [`SharedState`](crate::shared::SharedState)
//! and the runtime configuration lock:
//!
//! | Context | Cadence | Work |
//! | ------- | ------- | ---- |
//! | [`ControlTask`] | fixed 50 Hz tick | pad acquisition, safety supervision, PI loops, motor drive |
//! | [`IoTask`] | polled as fast as possible | servo sweep, host commands, telemetry |

pub mod control;
pub mod io;

pub use control::ControlTask;
pub use io::IoTask;
