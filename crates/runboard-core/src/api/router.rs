use super::{heatmap, project, projects, results, ApiResponse};
use crate::query::{QueryFacade, ResultsQuery};
use tracing::debug;
use url::Url;

// Request targets are relative; any base works for resolving them.
const BASE: &str = "http://runboard.invalid/";

/// Bad request input, rendered as a 400.
#[derive(Debug)]
struct BadRequest(String);

impl From<BadRequest> for ApiResponse {
    fn from(err: BadRequest) -> Self {
        ApiResponse::error(400, err.0)
    }
}

/// Query string view. Blank values count as absent.
struct Params(Vec<(String, String)>);

impl Params {
    fn parse(url: &Url) -> Self {
        Self(
            url.query_pairs()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn flag(&self, key: &str) -> Result<bool, BadRequest> {
        match self.get(key) {
            None => Ok(false),
            Some(v) => parse_bool(v).ok_or_else(|| {
                BadRequest(format!("invalid value for '{}': expected a boolean, got '{}'", key, v))
            }),
        }
    }

    fn weeks(&self, key: &str) -> Result<Option<u32>, BadRequest> {
        self.get(key)
            .map(|v| {
                v.parse::<u32>().map_err(|_| {
                    BadRequest(format!(
                        "invalid value for '{}': expected a non-negative integer, got '{}'",
                        key, v
                    ))
                })
            })
            .transpose()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn segments(url: &Url) -> Result<Vec<String>, BadRequest> {
    let Some(raw) = url.path_segments() else {
        return Ok(Vec::new());
    };
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .map_err(|_| BadRequest(format!("path segment is not valid UTF-8: '{}'", s)))
        })
        .collect()
}

/// Dispatch a request (`method`, `target` = path plus optional query) to its handler.
///
/// Trailing slashes are optional. Path parameters take precedence over the
/// equivalent query parameters.
pub fn route(facade: &QueryFacade, method: &str, target: &str) -> ApiResponse {
    debug!(method = %method, target = %target, "routing request");

    if !method.eq_ignore_ascii_case("GET") {
        return ApiResponse::error(405, format!("method {} not allowed", method))
            .with_header("Allow", "GET");
    }

    match dispatch(facade, target) {
        Ok(resp) => resp,
        Err(bad) => bad.into(),
    }
}

fn dispatch(facade: &QueryFacade, target: &str) -> Result<ApiResponse, BadRequest> {
    let url = Url::parse(BASE)
        .and_then(|base| base.join(target))
        .map_err(|e| BadRequest(format!("invalid request target '{}': {}", target, e)))?;
    let params = Params::parse(&url);
    let segments = segments(&url)?;
    let path: Vec<&str> = segments.iter().map(String::as_str).collect();

    let resp = match path.as_slice() {
        ["results", rest @ ..] if rest.len() <= 2 => {
            let query = ResultsQuery {
                project: rest
                    .first()
                    .copied()
                    .or_else(|| params.get("project"))
                    .map(str::to_string),
                repo: rest
                    .get(1)
                    .copied()
                    .or_else(|| params.get("repo"))
                    .map(str::to_string),
                latest: params.flag("latest")?,
                weeks_ago: params.weeks("weeks_ago")?,
            };
            results(facade, &query)
        }
        ["heatmap"] => heatmap(facade, params.get("project")),
        ["heatmap", name] => heatmap(facade, Some(*name)),
        ["projects"] => projects(facade),
        ["projects", name] => project(facade, name),
        _ => ApiResponse::error(404, format!("no route for {}", url.path())),
    };
    Ok(resp)
}
