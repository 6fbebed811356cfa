use bytes::Bytes;
use hyper::Request as HRequest;
use std::collections::HashMap;

/// Aliased request type. The body is collected before dispatch.
pub type Request = HRequest<Bytes>;

/// Wrapper type for route parameters.
#[derive(Debug, Clone, Default)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    /// Returns a parameter by key as `Option<&str>`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if the specified key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of stored parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Converts to the underlying `HashMap`.
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

/// Path as seen by the router currently dispatching the request.
///
/// Mounted routers only see the part of the path below their mount point,
/// the consumed prefix accumulates in `base_url`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RoutingPath {
    pub(crate) base_url: String,
    pub(crate) path: String,
}

/// Public extension trait for accessing routing data on a request.
pub trait RequestExt {
    /// Route parameters of the most recently matched layer.
    fn params(&self) -> Option<&RouteParams>;

    /// Single route parameter.
    fn param(&self, key: &str) -> Option<&str>;

    /// Prefix consumed by the routers mounted above the current handler.
    fn base_url(&self) -> &str;

    /// Path relative to the current router's mount point.
    fn route_path(&self) -> &str;
}

/// Internal-only trait for setting routing data.
pub(crate) trait RequestExtInternal {
    fn set_params(&mut self, params: HashMap<String, String>);

    /// Replaces the routing path, returning the previous one for restoration.
    fn replace_routing_path(&mut self, routing: Option<RoutingPath>) -> Option<RoutingPath>;
}

impl RequestExt for Request {
    fn params(&self) -> Option<&RouteParams> {
        self.extensions().get::<RouteParams>()
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params().and_then(|params| params.get(key))
    }

    fn base_url(&self) -> &str {
        self.extensions()
            .get::<RoutingPath>()
            .map(|routing| routing.base_url.as_str())
            .unwrap_or("")
    }

    fn route_path(&self) -> &str {
        self.extensions()
            .get::<RoutingPath>()
            .map(|routing| routing.path.as_str())
            .unwrap_or_else(|| self.uri().path())
    }
}

impl RequestExtInternal for Request {
    fn set_params(&mut self, params: HashMap<String, String>) {
        self.extensions_mut().insert(RouteParams(params));
    }

    fn replace_routing_path(&mut self, routing: Option<RoutingPath>) -> Option<RoutingPath> {
        match routing {
            Some(routing) => self.extensions_mut().insert(routing),
            None => self.extensions_mut().remove::<RoutingPath>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_path_defaults_to_the_uri() {
        let mut req: Request = HRequest::builder()
            .uri("/api/users?page=2")
            .body(Bytes::new())
            .unwrap();

        assert_eq!(req.route_path(), "/api/users");
        assert_eq!(req.base_url(), "");

        let previous = req.replace_routing_path(Some(RoutingPath {
            base_url: "/api".into(),
            path: "/users".into(),
        }));

        assert!(previous.is_none());
        assert_eq!(req.route_path(), "/users");
        assert_eq!(req.base_url(), "/api");

        req.replace_routing_path(previous);
        assert_eq!(req.route_path(), "/api/users");
    }

    #[test]
    fn params_are_read_from_extensions() {
        let mut req: Request = HRequest::builder().uri("/").body(Bytes::new()).unwrap();
        assert!(req.params().is_none());

        req.set_params(HashMap::from([("id".to_string(), "7".to_string())]));
        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.params().map(RouteParams::len), Some(1));
    }
}
