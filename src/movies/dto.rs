use serde::Deserialize;

use super::repo_types::{MovieFields, PageRequest};

/// Body of create and update. Any `userId` the client sends is ignored.
#[derive(Debug, Deserialize)]
pub struct MovieRequest {
    pub title: String,
    pub description: String,
    pub poster: String,
    pub trailer: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
}

impl MovieRequest {
    pub fn into_fields(self) -> Result<MovieFields, Vec<String>> {
        let errors: Vec<String> = [
            ("title", &self.title),
            ("description", &self.description),
            ("poster", &self.poster),
            ("trailer", &self.trailer),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| format!("{name} is required"))
        .collect();

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(MovieFields {
            title: self.title,
            description: self.description,
            poster: self.poster,
            trailer: self.trailer,
            actors: self.actors,
            genres: self.genres,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl From<Pagination> for PageRequest {
    fn from(p: Pagination) -> Self {
        PageRequest::new(p.page, p.size)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_reported_by_name() {
        let req: MovieRequest = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "description": "d",
            "poster": "",
            "trailer": "t",
            "actors": [],
            "genres": [],
            "userId": "ignored"
        }))
        .unwrap();
        assert_eq!(
            req.into_fields().unwrap_err(),
            vec!["title is required".to_string(), "poster is required".to_string()]
        );
    }

    #[test]
    fn accepted_fields_are_stored_as_sent() {
        let req: MovieRequest = serde_json::from_value(serde_json::json!({
            "title": " The Matrix ",
            "description": "d ",
            "poster": " p",
            "trailer": "t",
            "actors": [],
            "genres": []
        }))
        .unwrap();
        let fields = req.into_fields().unwrap();
        assert_eq!(fields.title, " The Matrix ");
        assert_eq!(fields.description, "d ");
        assert_eq!(fields.poster, " p");
    }

    #[test]
    fn missing_lists_fail_to_parse() {
        let res: Result<MovieRequest, _> = serde_json::from_value(serde_json::json!({
            "title": "t", "description": "d", "poster": "p", "trailer": "t"
        }));
        assert!(res.is_err());
    }
}
