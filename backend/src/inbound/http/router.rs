//! Route table shared by the server and the integration tests.

use actix_web::web;

use super::admin::stats;
use super::auth::{login, me, register};
use super::health::{health, live, ready};
use super::issues::{
    add_comment, create_issue, delete_issue, get_issue, list_issues, toggle_upvote, update_status,
};
use super::uploads::get_upload;
use super::users::{my_issues, profile};

/// Register the REST endpoints. Mount under `/api`.
pub fn api(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(me)
        .service(list_issues)
        .service(create_issue)
        .service(get_issue)
        .service(toggle_upvote)
        .service(update_status)
        .service(add_comment)
        .service(delete_issue)
        .service(profile)
        .service(my_issues)
        .service(stats)
        .service(health);
}

/// Register the probes and the upload file server at the root.
pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(ready).service(live).service(get_upload);
}
