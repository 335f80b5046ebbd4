use crate::{
    api::{attendance, employee, whatsapp},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(build_limiter(config.rate_login_per_min))
                .route(web::post().to(handlers::login)),
        ),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/attendance")
                    // Device-facing endpoints: scan terminals carry no
                    // credentials, so these stay public behind a limiter.
                    .service(
                        web::resource("/mark")
                            .wrap(build_limiter(config.rate_scan_per_min))
                            .route(web::post().to(attendance::mark)),
                    )
                    .service(
                        web::resource("/markByFace")
                            .wrap(build_limiter(config.rate_scan_per_min))
                            .route(web::post().to(attendance::mark_by_face)),
                    )
                    .service(
                        web::resource("/records")
                            .wrap(from_fn(auth_middleware))
                            .route(web::get().to(attendance::records)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .wrap(from_fn(auth_middleware))
                    .wrap(build_limiter(config.rate_protected_per_min))
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/next-fingerprint")
                            .route(web::get().to(employee::next_fingerprint)),
                    )
                    .service(
                        web::resource("/fingerprint/{tag}")
                            .route(web::get().to(employee::get_employee_by_fingerprint)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/ex-employees")
                    .wrap(from_fn(auth_middleware))
                    .wrap(build_limiter(config.rate_protected_per_min))
                    .service(web::resource("").route(web::get().to(employee::list_ex_employees)))
                    .service(
                        web::resource("/restore/{id}")
                            .route(web::post().to(employee::restore_ex_employee)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(employee::delete_ex_employee)),
                    ),
            )
            .service(
                web::scope("/whatsapp")
                    .wrap(from_fn(auth_middleware))
                    .wrap(build_limiter(config.rate_protected_per_min))
                    .service(
                        web::resource("/send-daily-report")
                            .route(web::post().to(whatsapp::send_daily_report)),
                    )
                    .service(
                        web::resource("/send-absent-alerts")
                            .route(web::post().to(whatsapp::send_absent_alerts)),
                    )
                    .service(
                        web::resource("/test-connection")
                            .route(web::get().to(whatsapp::test_connection)),
                    )
                    .service(web::resource("/debug").route(web::get().to(whatsapp::debug_info))),
            ),
    );
}
