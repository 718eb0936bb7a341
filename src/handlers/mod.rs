use actix_web::web;

pub mod auth_handler;
pub mod course_handler;
pub mod gamification_handler;
pub mod health_handler;
pub mod learning_path_handler;
pub mod user_handler;

/// Register every route. Static segments such as `/api/courses/manage` are
/// registered before the `{id}` routes they would otherwise collide with.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_handler::health_check)
        .service(health_handler::health_check_ready)
        .service(auth_handler::sign_in)
        .service(auth_handler::sign_up)
        .service(auth_handler::sign_out)
        .service(auth_handler::request_password_reset)
        .service(auth_handler::verify_reset_token)
        .service(auth_handler::confirm_password_reset)
        .service(user_handler::me)
        .service(user_handler::my_courses)
        .service(user_handler::my_certificates)
        .service(user_handler::list_users)
        .service(user_handler::add_user)
        .service(user_handler::import_users)
        .service(course_handler::catalog)
        .service(course_handler::management_list)
        .service(course_handler::create_course)
        .service(course_handler::get_course)
        .service(course_handler::update_course)
        .service(course_handler::delete_course)
        .service(course_handler::enroll)
        .service(course_handler::get_progress)
        .service(course_handler::enrollments)
        .service(course_handler::complete_lesson)
        .service(course_handler::submit_quiz)
        .service(course_handler::organization_courses)
        .service(learning_path_handler::list_paths)
        .service(learning_path_handler::create_path)
        .service(learning_path_handler::get_path)
        .service(learning_path_handler::organization_paths)
        .service(gamification_handler::my_state)
        .service(gamification_handler::extend_streak)
        .service(gamification_handler::award_points)
        .service(gamification_handler::leaderboard)
        .service(gamification_handler::my_achievements);
}
