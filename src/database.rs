use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json;
use thiserror::Error;

use model::Post;

/// The backing file could not be read, written or parsed.
#[derive(Debug, Error)]
pub enum StorageUnavailable {
    #[error("cannot read post store {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write post store {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("post store {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Flat-file post store.
///
/// The whole collection is read on every `load` and rewritten on every
/// `save`. Nothing is cached and nothing is locked: two requests that
/// load, modify and save concurrently will lose one of the updates.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new<P: Into<PathBuf>>(path: P) -> Database {
        Database { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Post>, StorageUnavailable> {
        let bytes = fs::read(&self.path).map_err(|source| {
                StorageUnavailable::Read {
                    path: self.path.clone(),
                    source: source,
                }
            })?;

        let posts: Vec<Post> = serde_json::from_slice(&bytes).map_err(|source| {
                StorageUnavailable::Malformed {
                    path: self.path.clone(),
                    source: source,
                }
            })?;

        debug!("loaded {} posts from {}", posts.len(), self.path.display());
        Ok(posts)
    }

    /// Overwrite the store with `posts`.
    ///
    /// The file is truncated and written in place, so a crash part way
    /// through leaves it truncated.
    pub fn save(&self, posts: &[Post]) -> Result<(), StorageUnavailable> {
        let bytes = serde_json::to_vec(posts).map_err(|source| {
                StorageUnavailable::Malformed {
                    path: self.path.clone(),
                    source: source,
                }
            })?;

        fs::write(&self.path, bytes).map_err(|source| {
                StorageUnavailable::Write {
                    path: self.path.clone(),
                    source: source,
                }
            })?;

        debug!("saved {} posts to {}", posts.len(), self.path.display());
        Ok(())
    }

    /// Write an empty collection if the store file does not exist yet.
    /// Returns whether a file was created.
    pub fn create_if_missing(&self) -> Result<bool, StorageUnavailable> {
        if self.path.exists() {
            return Ok(false);
        }

        self.save(&[])?;
        Ok(true)
    }
}

/// Id for the next created post.
///
/// This is the collection size plus one. Once a post has been deleted it
/// can hand out an id that is still in use.
pub fn next_id(posts: &[Post]) -> i64 {
    posts.len() as i64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::PostForm;
    use tempfile::TempDir;

    fn post(id: i64, title: &str) -> Post {
        Post::new(id,
                  PostForm {
                      author: "author".to_string(),
                      title: title.to_string(),
                      content: format!("content of {}", title),
                  })
    }

    fn database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("database.json"))
    }

    #[test]
    fn save_then_load_keeps_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        let posts = vec![post(3, "third"), post(1, "first"), post(2, "second")];

        database.save(&posts).unwrap();

        assert_eq!(database.load().unwrap(), posts);
    }

    #[test]
    fn save_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);

        database.save(&[post(1, "a"), post(2, "b")]).unwrap();
        database.save(&[post(9, "z")]).unwrap();

        assert_eq!(database.load().unwrap(), vec![post(9, "z")]);
    }

    #[test]
    fn load_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();

        match database(&dir).load() {
            Err(StorageUnavailable::Read { ref source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unavailable_names_store_and_keeps_cause() {
        use std::error::Error;

        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        let error = database.load().unwrap_err();

        assert!(error.to_string()
            .starts_with(&format!("cannot read post store {}: ", database.path().display())));
        let cause = error.source().and_then(|source| source.downcast_ref::<io::Error>());
        assert_eq!(cause.map(|cause| cause.kind()), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn load_malformed_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        fs::write(database.path(), "{\"id\": 1}").unwrap();

        match database.load() {
            Err(StorageUnavailable::Malformed { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn load_reads_spaced_file_with_null_fields() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        fs::write(database.path(),
                  r#"[{"id": 1, "author": "A", "title": "T", "content": "C"}, {"id": 2, "author": null, "title": null, "content": null}]"#)
            .unwrap();

        let posts = database.load().unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].author, "A");
        assert_eq!(posts[1].title, "");
    }

    #[test]
    fn create_if_missing_only_creates_once() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);

        assert!(database.create_if_missing().unwrap());
        database.save(&[post(1, "kept")]).unwrap();
        assert!(!database.create_if_missing().unwrap());

        assert_eq!(database.load().unwrap(), vec![post(1, "kept")]);
    }

    #[test]
    fn next_id_is_size_plus_one() {
        assert_eq!(next_id(&[]), 1);
        assert_eq!(next_id(&[post(1, "a"), post(2, "b")]), 3);
    }

    #[test]
    fn next_id_collides_after_delete() {
        let mut posts = vec![post(1, "a"), post(2, "b"), post(3, "c")];
        posts.retain(|post| post.id != 2);

        assert_eq!(next_id(&posts), 3);
        assert!(posts.iter().any(|post| post.id == 3));
    }
}
