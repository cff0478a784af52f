use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use url::form_urlencoded;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    /// Keys the application does not use, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    pub fn new(id: i64, form: PostForm) -> Post {
        Post {
            id: id,
            author: form.author,
            title: form.title,
            content: form.content,
            extra: Map::new(),
        }
    }

    /// Overwrite every editable field with the submitted values.
    pub fn apply(&mut self, form: PostForm) {
        self.author = form.author;
        self.title = form.title;
        self.content = form.content;
    }
}

/// Fields accepted from the add and update forms.
///
/// Missing fields are kept as empty strings rather than rejected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostForm {
    pub author: String,
    pub title: String,
    pub content: String,
}

impl PostForm {
    pub fn from_urlencoded(body: &[u8]) -> PostForm {
        let mut form = PostForm::default();
        let (mut author, mut title, mut content) = (false, false, false);

        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                "author" if !author => {
                    form.author = value.into_owned();
                    author = true;
                }
                "title" if !title => {
                    form.title = value.into_owned();
                    title = true;
                }
                "content" if !content => {
                    form.content = value.into_owned();
                    content = true;
                }
                _ => {}
            }
        }

        form
    }
}

// Stores written by older versions hold `null` for fields that were never submitted.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where D: Deserializer<'de>
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
