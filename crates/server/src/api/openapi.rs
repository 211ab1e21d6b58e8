use iam_core::{AccessRequest, AuthzResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "IAM Authorization Server API",
        version = "0.1.0",
        description = "Authorization decision endpoint backed by an in-memory, hot-reloaded policy cache.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Authorization", description = "Access decision evaluation"),
    ),
    paths(super::authz::authorize),
    components(schemas(AccessRequest, AuthzResponse))
)]
pub struct ApiDoc;
