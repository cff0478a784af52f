extern crate iron;
extern crate router;
extern crate logger;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate handlebars;
extern crate url;
extern crate dotenvy;
extern crate thiserror;

#[cfg(test)]
extern crate iron_test;
#[cfg(test)]
extern crate pretty_assertions;
#[cfg(test)]
extern crate tempfile;

mod config;
mod model;
mod database;
mod views;
mod handlers;

use std::error::Error;

use config::Config;
use database::Database;
use handlers::Handlers;
use views::Views;

use iron::Iron;
use logger::Logger;

// BLOG_DATABASE=posts.json RUST_LOG=logger=info hermes_blog > logs 2>&1 &
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let (logger_before, logger_after) = Logger::new(None);

    let config = Config::from_env();
    let database = Database::new(config.database.clone());
    if config.create_database && database.create_if_missing()? {
        info!("created empty post store at {}", database.path().display());
    }

    let handlers = Handlers::new(database, Views::new()?);

    let mut chain = handlers.chain();
    chain.link_before(logger_before); // Should be first!
    chain.link_after(logger_after); // Should be last!

    info!("serving posts from {} on {}",
          config.database.display(),
          config.address);
    let _listening = Iron::new(chain).http(config.address.as_str())?;
    Ok(())
}
