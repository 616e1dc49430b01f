//! OpenAPI document for the prowhey HTTP surface.
//!
//! Schema-only for now: none of the handlers carry `#[utoipa::path]`
//! annotations yet, so `paths()` is empty and this exists to publish the
//! wire types at `/openapi.json` for client codegen.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use prowhey_core::{
    AnnouncementPayload, BundlePayload, CommentPayload, EntityPayload, EntityType, HeroPayload,
    HomePayload, HomeSection, MessagePayload, NotificationPayload, PricePayload, ProductPayload,
    ProductVariant, StockPayload, TargetSet, UserPayload, ViewPayload,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Prowhey Sync API",
        version = "0.1.0",
        description = "Transformed-entity cache, change journal, and incremental sync protocol between the mobile app and the ERP."
    ),
    tags(
        (name = "Sync", description = "Incremental sync cursor protocol"),
        (name = "Ingest", description = "ERP webhook intake"),
        (name = "Resource", description = "Read-through resource access"),
        (name = "Health", description = "Liveness and diagnostics")
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        EntityType,
        EntityPayload,
        ProductPayload,
        ProductVariant,
        PricePayload,
        StockPayload,
        HeroPayload,
        BundlePayload,
        HomePayload,
        HomeSection,
        ViewPayload,
        CommentPayload,
        UserPayload,
        NotificationPayload,
        AnnouncementPayload,
        MessagePayload,
        TargetSet,
    ))
)]
pub struct ApiDoc;
