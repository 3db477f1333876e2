use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

use crate::{
    api::{attendance, clock, department, department_schedule, employee},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/clock")
                    .service(web::resource("/time-in").route(web::post().to(clock::time_in)))
                    .service(web::resource("/time-out").route(web::post().to(clock::time_out)))
                    .service(web::resource("/lunch-in").route(web::post().to(clock::lunch_in)))
                    .service(web::resource("/lunch-out").route(web::post().to(clock::lunch_out)))
                    .service(
                        web::resource("/today/{id}")
                            .route(web::get().to(clock::attendance_today)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::create_attendance)),
                    )
                    // /attendance/employee/{id}
                    .service(
                        web::resource("/employee/{id}")
                            .route(web::get().to(attendance::list_attendance_by_employee)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/team-leaders")
                            .route(web::get().to(employee::list_team_leaders)),
                    )
                    .service(
                        web::resource("/members")
                            .route(web::get().to(employee::list_plain_employees)),
                    )
                    .service(web::resource("/admins").route(web::get().to(employee::list_admins)))
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/department")
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    )
                    .service(
                        web::resource("/{id}/employees")
                            .route(web::get().to(department::get_department_employees)),
                    )
                    .service(
                        web::resource("/{id}/employee")
                            .route(web::put().to(department::assign_employee)),
                    )
                    .service(
                        web::resource("/{id}/employee/remove")
                            .route(web::put().to(department::remove_employee)),
                    )
                    .service(
                        web::resource("/{id}/leader")
                            .route(web::get().to(department::get_department_leader))
                            .route(web::put().to(department::assign_leader)),
                    )
                    .service(
                        web::resource("/{id}/leader/remove")
                            .route(web::put().to(department::remove_leader)),
                    )
                    .service(
                        web::resource("/{id}/schedules")
                            .route(web::get().to(department::get_department_schedules)),
                    )
                    .service(
                        web::resource("/{id}/attendance")
                            .route(web::get().to(department::get_department_attendance)),
                    )
                    .service(
                        web::resource("/{id}/attendance/today")
                            .route(web::get().to(department::get_department_attendance_today)),
                    ),
            )
            .service(
                web::scope("/department-schedule")
                    .service(
                        web::resource("")
                            .route(web::get().to(department_schedule::list_department_schedules))
                            .route(
                                web::post().to(department_schedule::create_department_schedule),
                            ),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department_schedule::get_department_schedule))
                            .route(web::put().to(department_schedule::update_department_schedule))
                            .route(
                                web::delete()
                                    .to(department_schedule::delete_department_schedule),
                            ),
                    ),
            ),
    );
}
