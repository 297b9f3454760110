use crate::server::ServerRouter;

mod comments;
mod posts;
mod users;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(users::routes())
        .merge(posts::routes())
        .merge(comments::routes())
}
