// ============================================================================
// Shared ID Types
// ============================================================================

/// Unique identifier for a pane
pub type PaneId = u64;

/// Unique identifier for a tab
pub type TabId = u64;
