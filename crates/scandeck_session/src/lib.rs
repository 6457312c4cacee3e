//! Scan-session coordinator.
//!
//! Brings a handheld scan engine up, listens for its scan and failure events,
//! and keeps a live view of the session: status, last scan and a bounded
//! history.
//!
//! # Usage
//!
//! ```rust,ignore
//! use scandeck_session::{Coordinator, EventBridge, SimulatedScanEngine};
//! use scandeck_protocol::SessionConfig;
//! use std::sync::Arc;
//!
//! let bridge = EventBridge::new();
//! let engine = Arc::new(SimulatedScanEngine::new(bridge.clone()));
//! let (session, mut notifications) =
//!     Coordinator::spawn(engine.clone(), bridge, SessionConfig::default())?;
//!
//! session.start().await?;
//! engine.trigger_scan("12345", "CODE128");
//!
//! let mut state = session.state();
//! state.wait_for(|s| s.last_scan().is_some()).await?;
//! session.stop().await;
//! ```

pub mod bridge;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod history;
pub mod metrics;
pub mod notify;
pub mod state;

pub use bridge::{EventBridge, ListenerId, Subscription};
pub use coordinator::{Coordinator, SessionHandle};
pub use engine::{CallCounts, FaultPlan, ReaderState, SimulatedScanEngine};
pub use error::{InitStage, Result, SessionError};
pub use gateway::ScanEngineGateway;
pub use history::ScanHistory;
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use notify::{Notification, RetryAction};
pub use state::CoordinatorState;
