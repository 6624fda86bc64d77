//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::{AppSettings, ServerConfig, SettingsError};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use postboard::Trace;
use postboard::inbound::http;
use postboard::inbound::http::health::{HealthState, live, ready};
use postboard::inbound::http::session_config::SessionSettings;
use postboard::inbound::http::state::HttpState;
use state_builders::build_http_state;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(http::error::viewer_error_pages())
        .wrap(session.middleware())
        .wrap(Trace)
        .service(ready)
        .service(live)
        .configure(http::configure)
}

/// Construct the HTTP server for `config`.
///
/// The returned [`Server`] must be awaited to drive the listener; readiness is
/// flagged once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when the media root, metrics or socket
/// binding fail.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config)?);
    let session = config.session.clone();
    let server_health_state = health_state.clone();

    #[cfg(feature = "metrics")]
    let request_metrics = metrics::request_metrics()?;

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session: session.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(request_metrics.clone());

        app
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::{Key, SameSite};
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use postboard::domain::TRACE_ID_HEADER;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Harness {
        _media: TempDir,
        config: ServerConfig,
    }

    #[fixture]
    fn harness() -> Harness {
        let media = tempfile::tempdir().expect("media dir");
        let settings = AppSettings {
            bind_addr: Some("127.0.0.1:0".to_owned()),
            database_url: None,
            db_max_connections: None,
            media_root: Some(media.path().to_path_buf()),
            posts_per_page: None,
            index_cache_ttl_secs: None,
        };
        let session = SessionSettings {
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        };
        let config = ServerConfig::new(&settings, session).expect("valid settings");
        Harness {
            _media: media,
            config,
        }
    }

    #[rstest]
    #[actix_rt::test]
    async fn create_server_marks_ready(harness: Harness) {
        let health = web::Data::new(HealthState::new());
        assert!(!health.is_ready(), "state should start unready");
        let _server = create_server(health.clone(), harness.config).expect("server starts");
        assert!(health.is_ready(), "server creation should mark readiness");
    }

    #[rstest]
    #[actix_web::test]
    async fn app_serves_pages_with_trace_ids(harness: Harness) {
        let state = build_http_state(&harness.config).expect("state");
        let app = test::init_service(build_app(AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(state),
            session: harness.config.session.clone(),
        }))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(TRACE_ID_HEADER));
        assert!(
            res.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("text/html"))
        );

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/no/such/page/").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/live").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
