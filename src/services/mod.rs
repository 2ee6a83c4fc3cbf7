/// OpenAPI document assembly.
pub mod documentation;
/// Health status reporting.
pub mod health_service;
/// Match lifecycle: bootstrap, restore, finalize, abandon.
pub mod match_service;
/// Action dispatch into the rally state machine.
pub mod rally_service;
/// SSE plumbing shared by the stream routes.
pub mod sse_service;
/// Typed broadcast helpers for the public stream.
pub mod sse_events;
/// Replay-based statistics projections.
pub mod stats_service;
/// Storage connection supervision and degraded-mode handling.
pub mod storage_supervisor;
