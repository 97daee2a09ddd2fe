use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::Role;
use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::logger::RequestLogger;
use crate::middleware::RoleGuard;
use crate::routes::{
    change_password, change_user_status, create_availability, create_review, create_session,
    create_skill, delete_availability, delete_review, delete_session, delete_skill, delete_user,
    forgot_password, get_availability, get_my_profile, get_review, get_session, get_skill,
    health_check, list_availability, list_reviews, list_sessions, list_skills, list_teachers,
    list_users, refresh_token, reset_password, signin, signup, update_availability, update_my_profile,
    update_review, update_session, update_skill, update_user, vendor_signup,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    settings: Settings,
    email_client: EmailClient,
) -> Result<Server, std::io::Error> {
    let jwt = settings.jwt.clone();

    let connection = web::Data::new(connection);
    let jwt_data = web::Data::new(settings.jwt.clone());
    let email_settings = web::Data::new(settings.email.clone());
    let email_client = web::Data::new(email_client);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_data.clone())
            .app_data(email_settings.clone())
            .app_data(email_client.clone())

            .route("/health_check", web::get().to(health_check))

            // Auth: public endpoints plus the guarded password change
            .route("/api/auth/signup", web::post().to(signup))
            .route("/api/auth/vendor-signup", web::post().to(vendor_signup))
            .route("/api/auth/signin", web::post().to(signin))
            .route("/api/auth/refresh-token", web::post().to(refresh_token))
            .route("/api/auth/forget-password", web::post().to(forgot_password))
            .route("/api/auth/reset-password", web::post().to(reset_password))
            .service(
                web::resource("/api/auth/change-password")
                    .wrap(RoleGuard::any_authenticated(jwt.clone()))
                    .route(web::post().to(change_password)),
            )

            // Users: literal paths registered before the parameterized ones
            .service(web::resource("/api/users/teachers").route(web::get().to(list_teachers)))
            .service(
                web::resource("/api/users/me")
                    .wrap(RoleGuard::any_authenticated(jwt.clone()))
                    .route(web::get().to(get_my_profile))
                    .route(web::put().to(update_my_profile)),
            )
            .service(
                web::resource("/api/users")
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Admin]))
                    .route(web::get().to(list_users)),
            )
            .service(
                web::resource("/api/users/{id}/status")
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Admin]))
                    .route(web::patch().to(change_user_status)),
            )
            .service(
                web::resource("/api/users/{id}")
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Admin]))
                    .route(web::patch().to(update_user))
                    .route(web::delete().to(delete_user)),
            )

            // Skills. Middleware only composes at resource level, so paths
            // whose verbs carry different role lists (or a public read next
            // to guarded writes) are registered once per method guard; a
            // guard miss falls through to the next registration.
            .service(
                web::resource("/api/skills")
                    .guard(guard::Get())
                    .wrap(RoleGuard::new(
                        jwt.clone(),
                        &[Role::Teacher, Role::Learner, Role::Admin],
                    ))
                    .route(web::get().to(list_skills)),
            )
            .service(
                web::resource("/api/skills")
                    .guard(guard::Post())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Teacher]))
                    .route(web::post().to(create_skill)),
            )
            .service(
                web::resource("/api/skills/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_skill)),
            )
            .service(
                web::resource("/api/skills/{id}")
                    .guard(guard::Any(guard::Patch()).or(guard::Delete()))
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Teacher]))
                    .route(web::patch().to(update_skill))
                    .route(web::delete().to(delete_skill)),
            )

            // Sessions
            .service(
                web::resource("/api/sessions")
                    .guard(guard::Get())
                    .wrap(RoleGuard::new(
                        jwt.clone(),
                        &[Role::Teacher, Role::Learner, Role::Admin],
                    ))
                    .route(web::get().to(list_sessions)),
            )
            .service(
                web::resource("/api/sessions")
                    .guard(guard::Post())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Learner, Role::Teacher]))
                    .route(web::post().to(create_session)),
            )
            .service(
                web::resource("/api/sessions/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_session)),
            )
            .service(
                web::resource("/api/sessions/{id}")
                    .guard(guard::Patch())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Teacher, Role::Learner]))
                    .route(web::patch().to(update_session)),
            )
            .service(
                web::resource("/api/sessions/{id}")
                    .guard(guard::Delete())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Admin]))
                    .route(web::delete().to(delete_session)),
            )

            // Availability
            .service(
                web::resource("/api/availability")
                    .guard(guard::Get())
                    .wrap(RoleGuard::new(
                        jwt.clone(),
                        &[Role::Teacher, Role::Learner, Role::Admin],
                    ))
                    .route(web::get().to(list_availability)),
            )
            .service(
                web::resource("/api/availability")
                    .guard(guard::Post())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Teacher]))
                    .route(web::post().to(create_availability)),
            )
            .service(
                web::resource("/api/availability/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_availability)),
            )
            .service(
                web::resource("/api/availability/{id}")
                    .guard(guard::Any(guard::Patch()).or(guard::Delete()))
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Teacher]))
                    .route(web::patch().to(update_availability))
                    .route(web::delete().to(delete_availability)),
            )

            // Reviews
            .service(
                web::resource("/api/reviews")
                    .guard(guard::Get())
                    .wrap(RoleGuard::new(
                        jwt.clone(),
                        &[Role::Teacher, Role::Learner, Role::Admin],
                    ))
                    .route(web::get().to(list_reviews)),
            )
            .service(
                web::resource("/api/reviews")
                    .guard(guard::Post())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Learner]))
                    .route(web::post().to(create_review)),
            )
            .service(
                web::resource("/api/reviews/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_review)),
            )
            .service(
                web::resource("/api/reviews/{id}")
                    .guard(guard::Patch())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Learner]))
                    .route(web::patch().to(update_review)),
            )
            .service(
                web::resource("/api/reviews/{id}")
                    .guard(guard::Delete())
                    .wrap(RoleGuard::new(jwt.clone(), &[Role::Learner, Role::Admin]))
                    .route(web::delete().to(delete_review)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
