use serde::Deserialize;

/// Body for creating or replacing a blog post; every field is required.
#[derive(Debug, Deserialize)]
pub struct BlogBody {
    pub title: String,
    pub image: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
}

impl BlogBody {
    pub fn is_complete(&self) -> bool {
        !(self.title.trim().is_empty()
            || self.image.trim().is_empty()
            || self.content.trim().is_empty()
            || self.kind.trim().is_empty()
            || self.link.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_accepts_type_field() {
        let body: BlogBody = serde_json::from_str(
            r#"{"title":"t","image":"i","content":"c","type":"news","link":"l"}"#,
        )
        .unwrap();
        assert_eq!(body.kind, "news");
        assert!(body.is_complete());
    }

    #[test]
    fn blank_field_is_incomplete() {
        let body: BlogBody = serde_json::from_str(
            r#"{"title":" ","image":"i","content":"c","type":"news","link":"l"}"#,
        )
        .unwrap();
        assert!(!body.is_complete());
    }
}
