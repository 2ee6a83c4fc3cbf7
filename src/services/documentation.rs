use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Sideout Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::matches::setup_match,
        crate::routes::matches::get_match,
        crate::routes::matches::abandon_match,
        crate::routes::matches::dispatch_action,
        crate::routes::matches::finalize_set,
        crate::routes::matches::match_stats,
        crate::routes::sets::list_sets,
        crate::routes::sets::get_set,
        crate::routes::sets::set_stats,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::actions::SetupMatchRequest,
            crate::dto::actions::RosterInput,
            crate::dto::actions::PlayerInput,
            crate::dto::actions::ActionRequest,
            crate::dto::actions::ActionResponse,
            crate::dto::actions::FinalizeSetRequest,
            crate::dto::actions::FinalizeSetResponse,
            crate::dto::actions::ServeTypeDto,
            crate::dto::actions::ServeResultDto,
            crate::dto::actions::SetTypeDto,
            crate::dto::actions::AttackTypeDto,
            crate::dto::actions::AttackResultDto,
            crate::dto::actions::BlockOutcomeDto,
            crate::dto::common::SideDto,
            crate::dto::common::PlayerSnapshot,
            crate::dto::common::ScoreSnapshot,
            crate::dto::common::TeamSnapshot,
            crate::dto::common::LiberoOriginalSnapshot,
            crate::dto::common::LogLevelDto,
            crate::dto::common::LogEntrySummary,
            crate::dto::phase::VisiblePhase,
            crate::dto::match_view::MatchSummary,
            crate::dto::match_view::RallySummary,
            crate::dto::match_view::ExchangeSnapshot,
            crate::dto::match_view::TimeoutSnapshot,
            crate::dto::sets::SetListItem,
            crate::dto::sets::SetDetail,
            crate::dto::stats::StatsReport,
            crate::dto::stats::TeamStatsSummary,
            crate::dto::stats::PlayerStatsSummary,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::PointScoredEvent,
            crate::dto::sse::LogAppendedEvent,
            crate::dto::sse::TimeoutStartedEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "match", description = "Live match lifecycle"),
        (name = "actions", description = "Rally action dispatch"),
        (name = "sets", description = "Archive of completed sets"),
        (name = "stats", description = "Replay-based statistics"),
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
