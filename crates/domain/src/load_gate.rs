//! Readiness gate for views that depend on several asynchronous fetches.
//!
//! The gate is a join: it reports `Ready` only once every tracked fetch has
//! settled successfully. Faults do not go through the join; they are caught
//! by the enclosing [`FaultBoundary`], which replaces the whole view with a
//! fallback until the view is remounted.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An asynchronous input a view waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// Global variable list.
    GlobalVariables,
    /// Project variable list.
    ProjectVariables,
    /// Datasource inventory.
    Datasources,
    /// Query-execution plugin capability.
    Plugins,
}

impl FetchKind {
    /// Every fetch kind, in a fixed order.
    pub const ALL: [Self; 4] = [
        Self::GlobalVariables,
        Self::ProjectVariables,
        Self::Datasources,
        Self::Plugins,
    ];

    /// Returns a human-readable name for the fetch.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::GlobalVariables => "global variables",
            Self::ProjectVariables => "project variables",
            Self::Datasources => "datasources",
            Self::Plugins => "plugins",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", content = "fetch", rename_all = "snake_case")]
pub enum FaultOrigin {
    /// A tracked fetch was rejected.
    Fetch(FetchKind),
    /// The resolution context could not be composed.
    Resolution,
    /// A descendant failed while rendering or evaluating.
    Render,
}

/// A fault caught by a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Where the fault came from.
    pub origin: FaultOrigin,
    /// Human-readable message for the fallback display.
    pub message: String,
}

impl Fault {
    /// Creates a fetch fault.
    #[must_use]
    pub fn fetch(kind: FetchKind, message: impl Into<String>) -> Self {
        Self {
            origin: FaultOrigin::Fetch(kind),
            message: message.into(),
        }
    }

    /// Creates a resolution fault.
    #[must_use]
    pub fn resolution(message: impl Into<String>) -> Self {
        Self {
            origin: FaultOrigin::Resolution,
            message: message.into(),
        }
    }

    /// Creates a render fault.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self {
            origin: FaultOrigin::Render,
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            FaultOrigin::Fetch(kind) => write!(f, "failed to load {kind}: {}", self.message),
            FaultOrigin::Resolution => write!(f, "failed to resolve context: {}", self.message),
            FaultOrigin::Render => write!(f, "{}", self.message),
        }
    }
}

/// Catches faults raised anywhere below it and holds the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultBoundary {
    fault: Option<Fault>,
}

impl FaultBoundary {
    /// Creates a boundary with no fault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catches a fault. Only the first fault is kept.
    pub fn catch(&mut self, fault: Fault) {
        if self.fault.is_none() {
            self.fault = Some(fault);
        }
    }

    /// Returns the caught fault, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Returns true if a fault was caught.
    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Clears the boundary, as when the view is remounted.
    pub fn reset(&mut self) {
        self.fault = None;
    }
}

/// Observable state of a gated view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// At least one tracked fetch is outstanding.
    Loading {
        /// Fetches still outstanding.
        pending: Vec<FetchKind>,
    },
    /// Every tracked fetch settled successfully.
    Ready,
    /// A fault replaced the view with a fallback.
    Faulted {
        /// The fault shown by the fallback.
        fault: Fault,
    },
}

impl GateState {
    /// Returns true if the view may render its content.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if fetches are outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Returns true if the fallback is shown.
    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted { .. })
    }
}

/// All-or-nothing readiness join wrapped in a fault boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadGate {
    tracked: BTreeSet<FetchKind>,
    settled: BTreeSet<FetchKind>,
    boundary: FaultBoundary,
}

impl LoadGate {
    /// Creates a gate waiting for `tracked` fetches.
    #[must_use]
    pub fn new(tracked: impl IntoIterator<Item = FetchKind>) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
            settled: BTreeSet::new(),
            boundary: FaultBoundary::new(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> GateState {
        if let Some(fault) = self.boundary.fault() {
            return GateState::Faulted {
                fault: fault.clone(),
            };
        }
        let pending = self.pending();
        if pending.is_empty() {
            GateState::Ready
        } else {
            GateState::Loading { pending }
        }
    }

    /// Returns the tracked fetches not yet settled.
    #[must_use]
    pub fn pending(&self) -> Vec<FetchKind> {
        self.tracked.difference(&self.settled).copied().collect()
    }

    /// Returns true if every tracked fetch settled and no fault was caught.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Records the settlement of a fetch.
    ///
    /// Untracked fetches are ignored. A rejection is handed to the fault
    /// boundary. Settlements after a fault change nothing.
    pub fn settle(&mut self, kind: FetchKind, outcome: Result<(), String>) -> GateState {
        if !self.tracked.contains(&kind) || self.boundary.is_faulted() {
            return self.state();
        }
        match outcome {
            Ok(()) => {
                self.settled.insert(kind);
            }
            Err(message) => self.boundary.catch(Fault::fetch(kind, message)),
        }
        self.state()
    }

    /// Raises a fault from a descendant of the gated view.
    pub fn raise(&mut self, fault: Fault) -> GateState {
        self.boundary.catch(fault);
        self.state()
    }

    /// Marks `kind` as outstanding again because it is being re-fetched.
    ///
    /// A faulted gate stays faulted.
    pub fn refetch(&mut self, kind: FetchKind) -> GateState {
        if !self.boundary.is_faulted() && self.tracked.contains(&kind) {
            self.settled.remove(&kind);
        }
        self.state()
    }

    /// Resets the gate as if the view were mounted again.
    pub fn remount(&mut self) -> GateState {
        self.settled.clear();
        self.boundary.reset();
        self.state()
    }
}
