use utoipa::{
    openapi::{
        security::{Http, HttpAuthScheme, SecurityScheme},
        Components,
    },
    Modify, OpenApi,
};

pub use utoipa::openapi::OpenApi as OpenApiSpec;

use crate::errors::ErrorResponse;

pub const BEARER: &str = "bearer";

#[derive(OpenApi)]
#[openapi(
    info(title = "NoteArt API", description = "Notes, tags, attachments and AI images"),
    components(schemas(ErrorResponse)),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut OpenApiSpec) {
        openapi
            .components
            .get_or_insert(Components::new())
            .add_security_scheme(BEARER, SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
