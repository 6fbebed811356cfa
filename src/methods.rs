use hyper::Method;
use std::fmt;
use std::str::FromStr;

/// Registration methods exposed by [`App`](crate::App) and [`Router`](crate::Router).
///
/// `Use` mounts middleware and sub-routers by path prefix. The verbs
/// register end-point routes that also match on the HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Use,
    All,
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl RouteMethod {
    pub const ALL: [RouteMethod; 9] = [
        RouteMethod::Use,
        RouteMethod::All,
        RouteMethod::Get,
        RouteMethod::Post,
        RouteMethod::Put,
        RouteMethod::Delete,
        RouteMethod::Patch,
        RouteMethod::Head,
        RouteMethod::Options,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RouteMethod::Use => "use",
            RouteMethod::All => "all",
            RouteMethod::Get => "get",
            RouteMethod::Post => "post",
            RouteMethod::Put => "put",
            RouteMethod::Delete => "delete",
            RouteMethod::Patch => "patch",
            RouteMethod::Head => "head",
            RouteMethod::Options => "options",
        }
    }

    /// `true` for registrations that mount by prefix instead of matching the full path.
    pub fn is_mount(&self) -> bool {
        matches!(self, RouteMethod::Use)
    }

    /// Whether a request with `method` may reach a layer registered through `self`.
    ///
    /// `GET` routes also answer `HEAD` requests.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            RouteMethod::Use | RouteMethod::All => true,
            RouteMethod::Get => method == Method::GET || method == Method::HEAD,
            RouteMethod::Post => method == Method::POST,
            RouteMethod::Put => method == Method::PUT,
            RouteMethod::Delete => method == Method::DELETE,
            RouteMethod::Patch => method == Method::PATCH,
            RouteMethod::Head => method == Method::HEAD,
            RouteMethod::Options => method == Method::OPTIONS,
        }
    }
}

impl FromStr for RouteMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "use" => Ok(RouteMethod::Use),
            "all" => Ok(RouteMethod::All),
            "get" => Ok(RouteMethod::Get),
            "post" => Ok(RouteMethod::Post),
            "put" => Ok(RouteMethod::Put),
            "delete" => Ok(RouteMethod::Delete),
            "patch" => Ok(RouteMethod::Patch),
            "head" => Ok(RouteMethod::Head),
            "options" => Ok(RouteMethod::Options),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for method in RouteMethod::ALL {
            assert_eq!(method.name().parse::<RouteMethod>(), Ok(method));
        }
        assert_eq!(" GET ".parse::<RouteMethod>(), Ok(RouteMethod::Get));
        assert!("trace".parse::<RouteMethod>().is_err());
    }

    #[test]
    fn get_routes_answer_head_requests() {
        assert!(RouteMethod::Get.accepts(&Method::HEAD));
        assert!(!RouteMethod::Post.accepts(&Method::GET));
        assert!(RouteMethod::Use.accepts(&Method::DELETE));
    }
}
