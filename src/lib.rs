use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

use handlers::{
    auth as auth_handlers, dashboard, favorites, files, folders, health, images, links,
    metrics as metrics_handlers, notes, pdfs, AppState,
};

// Headroom for the multipart framing around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn api_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::detailed))
        // Auth
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route(
            "/auth/profile",
            get(auth_handlers::profile).put(auth_handlers::update_profile),
        )
        .route("/auth/change-password", post(auth_handlers::change_password))
        .route("/auth/account", delete(auth_handlers::delete_account))
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        // Images
        .route("/images", get(images::list_images))
        .route(
            "/images/upload",
            post(images::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/images/:id",
            get(images::get_image).delete(images::delete_image),
        )
        // PDFs
        .route("/pdfs", get(pdfs::list_pdfs))
        .route(
            "/pdfs/upload",
            post(pdfs::upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/pdfs/:id", get(pdfs::get_pdf).delete(pdfs::delete_pdf))
        // Links
        .route("/links", get(links::list_links).post(links::create_link))
        .route("/links/:id", delete(links::delete_link))
        // Folders
        .route(
            "/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/folders/:id",
            get(folders::get_folder)
                .put(folders::rename_folder)
                .delete(folders::delete_folder),
        )
        .route("/folders/:id/files", get(folders::folder_files))
        // Files
        .route("/files", get(files::list_files))
        .route("/files/:id", get(files::get_file).delete(files::delete_file))
        // Favorites
        .route("/favorites", get(favorites::list_favorites))
        .route(
            "/favorites/:item_id",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route("/favorites/:item_id/toggle", patch(favorites::toggle_favorite))
        // Dashboard
        .route("/dashboard/summary", get(dashboard::summary))
        .route("/dashboard/recent", get(dashboard::recent))
        .route("/dashboard/search", get(dashboard::search))
}

pub fn create_app(state: AppState) -> Router {
    let config = &state.config;

    let cors = if config.cors_allow_any {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let mut app = Router::new()
        .nest(
            &config.api_prefix(),
            api_routes(config.max_file_size + MULTIPART_OVERHEAD),
        )
        .route("/metrics", get(metrics_handlers::metrics_handler));

    // Only local paths can be served; an absolute CDN URL is served elsewhere.
    if config.public_upload_url.starts_with('/') && config.public_upload_url.len() > 1 {
        app = app.nest_service(
            config.public_upload_url.trim_end_matches('/'),
            ServeDir::new(&config.upload_dir),
        );
    }

    // Outermost first; CORS must wrap a service whose body has a default.
    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(from_fn_with_state(
                state.clone(),
                crate::middleware::metrics_middleware,
            )),
    )
    .with_state(state)
}
