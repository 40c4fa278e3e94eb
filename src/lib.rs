pub mod auth;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod scheduling;
pub mod settings;
pub mod store;
pub mod sweeper;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use handlers::{bookings, classes, healthz_live, healthz_ready, root};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::gateway::{
    AuthServiceClient, GatewayError, IdentityProvider, PaymentServiceClient, SubscriptionGate,
    UserDirectory, build_client,
};
use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::scheduling::{BookingManager, ClassManager};
use crate::settings::Settings;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub classes: Arc<ClassManager>,
    pub bookings: Arc<BookingManager>,
    pub identity: Arc<dyn IdentityProvider>,
    pub exporter: Arc<ICalExporter>,
}

impl AppState {
    /// Wires the state against the auth and payment services named in the
    /// settings.
    pub fn new(settings: Settings) -> Result<Self, GatewayError> {
        let client = build_client(settings.collaborator_timeout())?;
        let auth = Arc::new(AuthServiceClient::new(
            client.clone(),
            settings.auth_service_url.clone(),
            settings.identity_cache_ttl(),
        ));
        let payments = Arc::new(PaymentServiceClient::new(
            client,
            settings.payment_service_url.clone(),
        ));
        Ok(Self::with_collaborators(settings, auth.clone(), payments, auth))
    }

    pub fn with_collaborators(
        settings: Settings,
        identity: Arc<dyn IdentityProvider>,
        subscriptions: Arc<dyn SubscriptionGate>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let store = Arc::new(Store::new());
        let classes = Arc::new(ClassManager::new(store.clone()));
        let bookings = Arc::new(BookingManager::new(
            store,
            classes.clone(),
            subscriptions,
            directory,
        ));
        Self {
            exporter: Arc::new(ICalExporter::new(settings.calendar_name.clone())),
            settings,
            classes,
            bookings,
            identity,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::new(settings)?;

    if let Some(every) = state.settings.completion_sweep_interval() {
        tokio::spawn(sweeper::run_completion_sweep(state.classes.clone(), every));
    }

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Gym Classes API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route(
            "/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route("/classes.ical", get(classes::classes_ical))
        .route("/classes/my-classes", get(classes::my_classes))
        .route(
            "/classes/{id}",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
        .route("/classes/{id}/cancel", put(classes::cancel_class))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/my-bookings", get(bookings::my_bookings))
        .route("/bookings/class/{class_id}", get(bookings::class_bookings))
        .route("/bookings/{id}/cancel", put(bookings::cancel_booking))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(CorsLayer::permissive()).layer(trace_layer)
}
