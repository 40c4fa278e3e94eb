use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    Booking, BookingStatus, Class, ClassBooking, ClassStatus, CreateBookingRequest,
    CreateClassRequest, Role, UpdateClassRequest,
};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::classes::list_classes,
        crate::handlers::classes::my_classes,
        crate::handlers::classes::get_class,
        crate::handlers::classes::create_class,
        crate::handlers::classes::update_class,
        crate::handlers::classes::cancel_class,
        crate::handlers::classes::delete_class,
        crate::handlers::classes::classes_ical,
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::cancel_booking,
        crate::handlers::bookings::my_bookings,
        crate::handlers::bookings::class_bookings,
        crate::handlers::bookings::list_bookings
    ),
    components(schemas(
        Class,
        ClassStatus,
        Booking,
        BookingStatus,
        ClassBooking,
        CreateClassRequest,
        UpdateClassRequest,
        CreateBookingRequest,
        Role
    )),
    tags(
        (name = "classes", description = "Class scheduling"),
        (name = "bookings", description = "Class bookings"),
        (name = "health", description = "Service health")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/classes"));
        assert!(doc.paths.paths.contains_key("/bookings/{id}/cancel"));
        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
