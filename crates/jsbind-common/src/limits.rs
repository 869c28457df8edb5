//! Centralized limits and thresholds for the lookup engine.
//!
//! Hierarchy cycles are prevented structurally (visited sets and the
//! begin/end hierarchy-check markers), never by these numbers. The limits
//! below only bound situations that cannot make forward progress, such as a
//! name environment that keeps answering a type request with a unit that asks
//! for the same type again.

// =============================================================================
// Reentrancy Limits
// =============================================================================

/// Maximum number of nested `ask_for_type` requests in flight.
///
/// Every request pushes the requested compound name onto the
/// environment's request stack. A request for a name already on the stack
/// answers "not found" immediately; this constant bounds the stack depth when
/// each request names a different type (e.g. a long chain of binary types
/// whose superclasses are each loaded on demand). Exceeding it raises an
/// abort for the unit that triggered the chain.
pub const MAX_TYPE_REQUEST_DEPTH: usize = 256;

/// Maximum superclass hops followed when walking a hierarchy.
///
/// Source hierarchies are cycle-checked before they are walked, but binary
/// and metadata descriptors arrive from outside and may be corrupt. Walks
/// stop after this many hops instead of looping.
pub const MAX_HIERARCHY_WALK: usize = 1024;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Initial capacity of the pending-unit queue.
pub const INITIAL_UNIT_QUEUE_CAPACITY: usize = 4;

/// Initial capacity of per-scope local variable storage.
pub const INITIAL_LOCALS_CAPACITY: usize = 5;
