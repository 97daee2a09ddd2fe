/// Route handlers, one module per resource.

mod auth;
mod availability;
mod health_check;
mod reviews;
mod sessions;
mod skills;
mod users;

pub use auth::{
    change_password, forgot_password, refresh_token, reset_password, signin, signup, vendor_signup,
};
pub use availability::{
    create_availability, delete_availability, get_availability, list_availability,
    update_availability,
};
pub use health_check::health_check;
pub use reviews::{create_review, delete_review, get_review, list_reviews, update_review};
pub use sessions::{
    create_session, delete_session, get_session, list_sessions, update_session,
};
pub use skills::{create_skill, delete_skill, get_skill, list_skills, update_skill};
pub use users::{
    change_user_status, delete_user, get_my_profile, list_teachers, list_users, update_my_profile,
    update_user,
};
