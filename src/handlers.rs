use std::fmt;
use std::io::Read;
use std::sync::Arc;
use iron::{Handler, status, IronResult, Response, Request, AfterMiddleware, Chain};
use iron::headers::ContentType;
use iron::modifiers::RedirectRaw;
use router::Router;
use database::{self, Database};
use model::{Post, PostForm};
use views::Views;

/// Match a `Result` into its inner value or log the error
/// and return `500 Internal Server Error`.
macro_rules! try_handler {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => {
                error!("{}", e);
                return Ok(Response::with((status::InternalServerError, "Internal Server Error")));
            }
        }
    }
}

/// Get the post id from the URI.
/// Anything that is not a run of ASCII digits does not name a post,
/// so it is answered like an unknown route: `404 Not Found`.
macro_rules! get_post_id {
    ( $r:expr ) => {
        match $r.extensions.get::<Router>().and_then(|params| params.find("id")).and_then(parse_post_id) {
            Some(id) => id,
            None => return Ok(Response::with(status::NotFound)),
        }
    }
}

/// Id taken from the URI. A run of digits too large for a stored id is
/// still an id, it just matches no post.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PostId(Option<i64>);

impl PostId {
    fn matches(&self, post: &Post) -> bool {
        self.0 == Some(post.id)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "<out of range>"),
        }
    }
}

fn parse_post_id(raw: &str) -> Option<PostId> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(PostId(raw.parse().ok()))
}

fn read_form(req: &mut Request) -> ::std::io::Result<PostForm> {
    let mut payload = Vec::new();
    req.body.read_to_end(&mut payload)?;
    Ok(PostForm::from_urlencoded(&payload))
}

fn redirect_to_index() -> IronResult<Response> {
    Ok(Response::with((status::Found, RedirectRaw("/".to_string()))))
}

fn post_not_found() -> IronResult<Response> {
    let mut response = Response::with((status::NotFound, "Post not found"));
    response.headers.set(ContentType::plaintext());
    Ok(response)
}

pub struct Handlers {
    pub list: ListHandler,
    pub add_form: AddFormHandler,
    pub add_post: AddPostHandler,
    pub delete: DeleteHandler,
    pub update_form: UpdateFormHandler,
    pub update_post: UpdatePostHandler,
}

impl Handlers {
    pub fn new(database: Database, views: Views) -> Handlers {
        let views = Arc::new(views);
        Handlers {
            list: ListHandler::new(database.clone(), views.clone()),
            add_form: AddFormHandler::new(views.clone()),
            add_post: AddPostHandler::new(database.clone()),
            delete: DeleteHandler::new(database.clone()),
            update_form: UpdateFormHandler::new(database.clone(), views.clone()),
            update_post: UpdatePostHandler::new(database),
        }
    }

    /// Mount every handler on its route and wrap the router in a chain
    /// that marks rendered pages as HTML.
    pub fn chain(self) -> Chain {
        let mut router = Router::new();
        router.get("/", self.list, "index");
        router.get("/add", self.add_form, "add_form");
        router.post("/add", self.add_post, "add");
        router.get("/delete/:id", self.delete.clone(), "delete");
        router.post("/delete/:id", self.delete, "delete_form");
        router.get("/update/:id", self.update_form, "update_form");
        router.post("/update/:id", self.update_post, "update");

        let mut chain = Chain::new(router);
        chain.link_after(HtmlAfterMiddleware);
        chain
    }
}

pub struct ListHandler {
    database: Database,
    views: Arc<Views>,
}

impl ListHandler {
    fn new(database: Database, views: Arc<Views>) -> ListHandler {
        ListHandler {
            database: database,
            views: views,
        }
    }
}

impl Handler for ListHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        let posts = try_handler!(self.database.load());
        let page = try_handler!(self.views.index(&posts));
        Ok(Response::with((status::Ok, page)))
    }
}

pub struct AddFormHandler {
    views: Arc<Views>,
}

impl AddFormHandler {
    fn new(views: Arc<Views>) -> AddFormHandler {
        AddFormHandler { views: views }
    }
}

impl Handler for AddFormHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        let page = try_handler!(self.views.add());
        Ok(Response::with((status::Ok, page)))
    }
}

pub struct AddPostHandler {
    database: Database,
}

impl AddPostHandler {
    fn new(database: Database) -> AddPostHandler {
        AddPostHandler { database: database }
    }
}

impl Handler for AddPostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let form = try_handler!(read_form(req));

        let mut posts = try_handler!(self.database.load());
        let id = database::next_id(&posts);
        posts.push(Post::new(id, form));
        try_handler!(self.database.save(&posts));

        info!("created post {}", id);
        redirect_to_index()
    }
}

/// Removes the first post with the requested id.
/// An unknown id leaves the store as it was and still redirects.
#[derive(Clone)]
pub struct DeleteHandler {
    database: Database,
}

impl DeleteHandler {
    fn new(database: Database) -> DeleteHandler {
        DeleteHandler { database: database }
    }
}

impl Handler for DeleteHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let mut posts = try_handler!(self.database.load());
        match posts.iter().position(|post| id.matches(post)) {
            Some(index) => {
                posts.remove(index);
                info!("deleted post {}", id);
            }
            None => debug!("no post {} to delete", id),
        }
        try_handler!(self.database.save(&posts));

        redirect_to_index()
    }
}

pub struct UpdateFormHandler {
    database: Database,
    views: Arc<Views>,
}

impl UpdateFormHandler {
    fn new(database: Database, views: Arc<Views>) -> UpdateFormHandler {
        UpdateFormHandler {
            database: database,
            views: views,
        }
    }
}

impl Handler for UpdateFormHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let posts = try_handler!(self.database.load());
        if let Some(post) = posts.iter().find(|post| id.matches(post)) {
            let page = try_handler!(self.views.update(post));
            Ok(Response::with((status::Ok, page)))
        } else {
            post_not_found()
        }
    }
}

pub struct UpdatePostHandler {
    database: Database,
}

impl UpdatePostHandler {
    fn new(database: Database) -> UpdatePostHandler {
        UpdatePostHandler { database: database }
    }
}

impl Handler for UpdatePostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let mut posts = try_handler!(self.database.load());
        match posts.iter().position(|post| id.matches(post)) {
            Some(index) => {
                let form = try_handler!(read_form(req));
                posts[index].apply(form);
                try_handler!(self.database.save(&posts));

                info!("updated post {}", id);
                redirect_to_index()
            }
            None => post_not_found(),
        }
    }
}

/// Marks successful responses without an explicit content type as HTML.
pub struct HtmlAfterMiddleware;

impl AfterMiddleware for HtmlAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        if res.status == Some(status::Ok) && !res.headers.has::<ContentType>() {
            res.headers.set(ContentType::html());
        }
        Ok(res)
    }
}
